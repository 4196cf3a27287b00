//! Compatibility score between one photo and one block, in 0..=100.

use crate::hue::circular_hue_distance;
use crate::layout::{Block, GridConfig};
use crate::photo::Photo;

pub const ASPECT_WEIGHT: f64 = 0.4;
pub const IMPORTANCE_WEIGHT: f64 = 0.3;
pub const ORIENTATION_WEIGHT: f64 = 0.2;
pub const HARMONY_WEIGHT: f64 = 0.1;

/// Harmony sub-score when harmony is off or no hue is known.
pub const NEUTRAL_HARMONY: f64 = 50.0;

/// What a photo is scored against: the block's shape on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockTarget {
    pub aspect: f64,
    /// Area in cells
    pub area: usize,
}

impl BlockTarget {
    pub fn new(aspect: f64, area: usize) -> Self {
        Self { aspect, area }
    }

    /// Shape in pixels, so non-square cells are accounted for.
    pub fn from_block(block: &Block, grid: &GridConfig) -> Self {
        let width = (block.w as u32 * grid.cell_width) as f64;
        let height = (block.h as u32 * grid.cell_height).max(1) as f64;
        Self::new(width / height, block.area())
    }
}

/// Per-page state the harmony sub-score reads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageContext {
    pub harmony: bool,
    pub average_hue: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Landscape,
    Portrait,
    Square,
}

fn classify(aspect: f64) -> Shape {
    if aspect > 1.1 {
        Shape::Landscape
    } else if aspect < 0.9 {
        Shape::Portrait
    } else {
        Shape::Square
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub aspect: f64,
    pub importance: f64,
    pub orientation: f64,
    pub harmony: f64,
    pub total: f64,
}

/// Linear falloff, zero once the ratios differ by 2.0 or more.
pub fn aspect_score(photo_aspect: f64, block_aspect: f64) -> f64 {
    (100.0 - (block_aspect - photo_aspect).abs() * 50.0).max(0.0)
}

pub fn importance_score(importance: u8, block_area: usize) -> f64 {
    let importance = importance as f64;
    let area = block_area as f64;

    if importance >= 3.0 && area >= 4.0 {
        100.0
    } else if importance <= 1.0 && area <= 2.0 {
        90.0
    } else if importance >= 2.0 && (2.0..=4.0).contains(&area) {
        80.0
    } else if area >= 6.0 {
        if importance >= 4.0 {
            100.0
        } else {
            (60.0 - (4.0 - importance) * 15.0).max(0.0)
        }
    } else {
        (70.0 - (area - importance).abs() * 10.0).max(30.0)
    }
}

pub fn orientation_score(photo_aspect: f64, block_aspect: f64) -> f64 {
    match (classify(photo_aspect), classify(block_aspect)) {
        (Shape::Square, Shape::Square) => 100.0,
        (Shape::Landscape, Shape::Landscape) | (Shape::Portrait, Shape::Portrait) => 90.0,
        (Shape::Square, _) => 70.0,
        (_, Shape::Square) => 60.0,
        _ => 30.0,
    }
}

pub fn harmony_score(photo_hue: Option<f64>, context: &PageContext) -> f64 {
    match (context.harmony, photo_hue, context.average_hue) {
        (true, Some(hue), Some(average)) => {
            (100.0 - (circular_hue_distance(hue, average) / 180.0) * 80.0).max(20.0)
        }
        _ => NEUTRAL_HARMONY,
    }
}

pub fn score_breakdown(photo: &Photo, target: &BlockTarget, context: &PageContext) -> ScoreBreakdown {
    let photo_aspect = photo.aspect();
    let aspect = aspect_score(photo_aspect, target.aspect);
    let importance = importance_score(photo.importance, target.area);
    let orientation = orientation_score(photo_aspect, target.aspect);
    let harmony = harmony_score(photo.hue, context);

    ScoreBreakdown {
        aspect,
        importance,
        orientation,
        harmony,
        total: ASPECT_WEIGHT * aspect
            + IMPORTANCE_WEIGHT * importance
            + ORIENTATION_WEIGHT * orientation
            + HARMONY_WEIGHT * harmony,
    }
}

pub fn score(photo: &Photo, target: &BlockTarget, context: &PageContext) -> f64 {
    score_breakdown(photo, target, context).total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_aspect_score_falloff() {
        assert_eq!(aspect_score(1.5, 1.5), 100.0);
        assert!(approx(aspect_score(1.0, 1.5), 75.0));
        assert_eq!(aspect_score(0.5, 2.5), 0.0);
        assert_eq!(aspect_score(0.5, 3.0), 0.0);
    }

    #[test]
    fn test_importance_tiers() {
        assert_eq!(importance_score(3, 4), 100.0);
        assert_eq!(importance_score(0, 1), 90.0);
        assert_eq!(importance_score(1, 2), 90.0);
        assert_eq!(importance_score(2, 3), 80.0);
        assert_eq!(importance_score(4, 12), 100.0);
        assert_eq!(importance_score(2, 6), 30.0);
        assert_eq!(importance_score(0, 6), 0.0);
        assert_eq!(importance_score(5, 1), 30.0);
        assert_eq!(importance_score(1, 3), 50.0);
    }

    #[test]
    fn test_orientation_pairs() {
        assert_eq!(orientation_score(1.0, 1.05), 100.0);
        assert_eq!(orientation_score(1.5, 2.0), 90.0);
        assert_eq!(orientation_score(0.6, 0.5), 90.0);
        assert_eq!(orientation_score(1.0, 1.5), 70.0);
        assert_eq!(orientation_score(1.5, 1.0), 60.0);
        assert_eq!(orientation_score(1.5, 0.5), 30.0);
    }

    #[test]
    fn test_harmony_requires_mode_and_hues() {
        let off = PageContext {
            harmony: false,
            average_hue: Some(0.0),
        };
        assert_eq!(harmony_score(Some(0.0), &off), NEUTRAL_HARMONY);

        let on = PageContext {
            harmony: true,
            average_hue: Some(350.0),
        };
        assert_eq!(harmony_score(None, &on), NEUTRAL_HARMONY);
        assert!(approx(harmony_score(Some(10.0), &on), 100.0 - (20.0 / 180.0) * 80.0));
        assert_eq!(harmony_score(Some(170.0), &on), 20.0);

        let no_average = PageContext {
            harmony: true,
            average_hue: None,
        };
        assert_eq!(harmony_score(Some(10.0), &no_average), NEUTRAL_HARMONY);
    }

    #[test]
    fn test_weighted_total() {
        let photo = Photo::new("square.jpg", 100, 100).with_importance(0);
        let target = BlockTarget::new(1.0, 1);
        let breakdown = score_breakdown(&photo, &target, &PageContext::default());
        // 0.4*100 + 0.3*90 + 0.2*100 + 0.1*50
        assert!(approx(breakdown.total, 92.0));
    }

    #[test]
    fn test_target_from_block_uses_pixels() {
        let grid = GridConfig {
            cols: 2,
            rows: 2,
            cell_width: 400,
            cell_height: 200,
            padding: 0,
            bleed: 0,
        };
        let target = BlockTarget::from_block(&Block::new(0, 0, 1, 1, 0), &grid);
        assert_eq!(target.aspect, 2.0);
        assert_eq!(target.area, 1);
    }
}
