use log::{debug, warn};
use rand::RngExt;
use std::ops::ControlFlow;

use super::shapes::ShapePlacer;
use super::validator::{self, ValidationResult};
use super::{Block, LayoutConstraints};

pub const DEFAULT_MAX_ATTEMPTS: usize = 100;
/// A non-validating candidate is still used when it scores above this.
pub const BEST_EFFORT_MIN_SCORE: i32 = 50;
pub const MAX_GRID_DIMENSION: usize = 10;
pub const DIMENSION_SEARCH_ATTEMPTS: usize = 50;

/// How a layout was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSource {
    /// First candidate that passed validation
    Validated { attempt: usize, score: i32 },
    /// Highest scoring candidate after all attempts failed validation
    BestEffort { score: i32 },
    /// Every cell as its own 1x1 block
    UniformFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedLayout {
    pub rows: usize,
    pub cols: usize,
    pub blocks: Vec<Block>,
    pub source: LayoutSource,
}

/// Deterministic layout with one 1x1 block per cell, indexed row-major.
pub fn uniform_grid(rows: usize, cols: usize) -> Vec<Block> {
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (col, row)))
        .enumerate()
        .map(|(index, (col, row))| Block::new(col, row, 1, 1, index))
        .collect()
}

/// Starting `(rows, cols)` for a page that must hold `photo_count` photos.
pub fn dimensions_for_count(photo_count: usize) -> (usize, usize) {
    let (rows, cols) = match photo_count {
        0 | 1 => (1, 1),
        2 => (1, 2),
        3..=4 => (2, 2),
        5..=6 => (2, 3),
        n => {
            let side = (n as f64).sqrt().ceil() as usize;
            (side, side)
        }
    };
    (
        rows.clamp(1, MAX_GRID_DIMENSION),
        cols.clamp(1, MAX_GRID_DIMENSION),
    )
}

/// Pick the outcome of a sequence of attempts: the first valid candidate wins,
/// otherwise the best scorer above [`BEST_EFFORT_MIN_SCORE`], otherwise the
/// uniform grid.
fn settle<I>(rows: usize, cols: usize, candidates: I) -> GeneratedLayout
where
    I: Iterator<Item = (Vec<Block>, ValidationResult)>,
{
    let outcome = candidates.enumerate().try_fold(
        None::<(Vec<Block>, i32)>,
        |best, (attempt, (blocks, result))| {
            if result.is_valid {
                return ControlFlow::Break((blocks, attempt, result.score));
            }
            let keep_best = matches!(&best, Some((_, best_score)) if *best_score >= result.score);
            ControlFlow::Continue(if keep_best {
                best
            } else {
                Some((blocks, result.score))
            })
        },
    );

    let (blocks, source) = match outcome {
        ControlFlow::Break((blocks, attempt, score)) => {
            (blocks, LayoutSource::Validated { attempt, score })
        }
        ControlFlow::Continue(Some((blocks, score))) if score > BEST_EFFORT_MIN_SCORE => {
            debug!(
                "No valid {}x{} layout, using best candidate with score {}",
                cols, rows, score
            );
            (blocks, LayoutSource::BestEffort { score })
        }
        ControlFlow::Continue(_) => {
            debug!("No acceptable {}x{} layout, using uniform grid", cols, rows);
            (uniform_grid(rows, cols), LayoutSource::UniformFallback)
        }
    };

    GeneratedLayout {
        rows,
        cols,
        blocks,
        source,
    }
}

/// Produces validated layouts by retrying the shape placer.
#[derive(Debug, Clone)]
pub struct LayoutGenerator {
    constraints: LayoutConstraints,
    max_attempts: usize,
}

impl LayoutGenerator {
    pub fn new(constraints: LayoutConstraints, max_attempts: usize) -> Self {
        Self {
            constraints,
            max_attempts,
        }
    }

    pub fn constraints(&self) -> &LayoutConstraints {
        &self.constraints
    }

    pub fn with_constraints(&self, constraints: LayoutConstraints) -> Self {
        Self {
            constraints,
            max_attempts: self.max_attempts,
        }
    }

    pub fn generate_validated<R: RngExt + ?Sized>(
        &self,
        rows: usize,
        cols: usize,
        rng: &mut R,
    ) -> GeneratedLayout {
        let constraints = &self.constraints;
        let candidates = (0..self.max_attempts).map(|_| {
            let blocks = ShapePlacer::place(rows, cols, &mut *rng);
            let result = validator::validate(&blocks, constraints);
            (blocks, result)
        });
        settle(rows, cols, candidates)
    }

    /// Search grid dimensions until a layout holds exactly `photo_count`
    /// blocks. Too few blocks grows the grid one unit, too many shrinks it back
    /// toward the starting size. When attempts run out the smallest oversupply
    /// wins, then the largest undersupply.
    pub fn generate_for_photo_count<R: RngExt + ?Sized>(
        &self,
        photo_count: usize,
        rng: &mut R,
    ) -> GeneratedLayout {
        let (base_rows, base_cols) = dimensions_for_count(photo_count);

        let search = (0..DIMENSION_SEARCH_ATTEMPTS).try_fold(
            DimensionSearch::new(base_rows, base_cols),
            |mut search, _| {
                let layout = self.generate_validated(search.rows, search.cols, &mut *rng);
                let produced = layout.blocks.len();

                if produced == photo_count {
                    return ControlFlow::Break(layout);
                }

                if produced > photo_count {
                    search.shrink(base_rows, base_cols);
                } else {
                    search.grow();
                }
                search.record(layout, photo_count);
                ControlFlow::Continue(search)
            },
        );

        match search {
            ControlFlow::Break(layout) => layout,
            ControlFlow::Continue(search) => search.finish(photo_count, base_rows, base_cols),
        }
    }
}

/// Fold state for [`LayoutGenerator::generate_for_photo_count`].
struct DimensionSearch {
    rows: usize,
    cols: usize,
    oversupplied: Option<GeneratedLayout>,
    undersupplied: Option<GeneratedLayout>,
}

impl DimensionSearch {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            oversupplied: None,
            undersupplied: None,
        }
    }

    fn grow(&mut self) {
        if self.cols <= self.rows && self.cols < MAX_GRID_DIMENSION {
            self.cols += 1;
        } else if self.rows < MAX_GRID_DIMENSION {
            self.rows += 1;
        } else if self.cols < MAX_GRID_DIMENSION {
            self.cols += 1;
        }
    }

    fn shrink(&mut self, base_rows: usize, base_cols: usize) {
        if self.rows > base_rows && self.rows >= self.cols {
            self.rows -= 1;
        } else if self.cols > base_cols {
            self.cols -= 1;
        } else if self.rows > base_rows {
            self.rows -= 1;
        }
    }

    fn record(&mut self, layout: GeneratedLayout, photo_count: usize) {
        let produced = layout.blocks.len();
        if produced > photo_count {
            let better = self
                .oversupplied
                .as_ref()
                .is_none_or(|current| produced < current.blocks.len());
            if better {
                self.oversupplied = Some(layout);
            }
        } else {
            let better = self
                .undersupplied
                .as_ref()
                .is_none_or(|current| produced > current.blocks.len());
            if better {
                self.undersupplied = Some(layout);
            }
        }
    }

    fn finish(self, photo_count: usize, base_rows: usize, base_cols: usize) -> GeneratedLayout {
        if let Some(layout) = self.oversupplied {
            warn!(
                "No layout with exactly {} blocks, accepting {} blocks",
                photo_count,
                layout.blocks.len()
            );
            return layout;
        }
        if let Some(layout) = self.undersupplied {
            warn!(
                "No layout with {} blocks, accepting {} blocks",
                photo_count,
                layout.blocks.len()
            );
            return layout;
        }
        GeneratedLayout {
            rows: base_rows,
            cols: base_cols,
            blocks: uniform_grid(base_rows, base_cols),
            source: LayoutSource::UniformFallback,
        }
    }
}
