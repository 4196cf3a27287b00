use rand::seq::IndexedRandom;
use rand::RngExt;

use crate::photo::Photo;
use crate::scoring::{self, BlockTarget, PageContext};

/// Candidates scoring at least this share of the best score are ties.
pub const TIE_THRESHOLD: f64 = 0.95;

/// Index of the queued photo that best fits `target`, `None` for an empty
/// queue. Near-ties are broken uniformly at random.
pub fn select<R: RngExt + ?Sized>(
    queue: &[Photo],
    target: &BlockTarget,
    context: &PageContext,
    rng: &mut R,
) -> Option<usize> {
    let scores: Vec<f64> = queue
        .iter()
        .map(|photo| scoring::score(photo, target, context))
        .collect();

    let best = scores.iter().copied().reduce(f64::max)?;

    let contenders: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|&(_, &score)| score >= best * TIE_THRESHOLD)
        .map(|(index, _)| index)
        .collect();

    contenders.choose(rng).copied()
}
