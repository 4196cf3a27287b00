use std::collections::HashSet;

use super::{Block, LayoutConstraints, ValidationMode};

/// Width/height ratios a block may have under strict validation.
pub const ALLOWED_RATIOS: [f64; 7] = [1.0, 0.5, 2.0, 2.0 / 3.0, 1.5, 0.75, 4.0 / 3.0];
pub const ASPECT_TOLERANCE: f64 = 0.01;

/// Photo-friendly range used by legacy validation.
pub const LEGACY_RATIO_RANGE: (f64, f64) = (0.6, 2.5);
pub const LEGACY_MAX_EXTREME_FRACTION: f64 = 0.2;

pub const MAX_SCORE: i32 = 100;
pub const PASSING_SCORE: i32 = 70;
const ILLEGAL_ASPECT_PENALTY: i32 = 20;
const VARIETY_PENALTY: i32 = 15;
const SINGLE_CELL_PENALTY: i32 = 10;
const LARGE_BLOCK_PENALTY: i32 = 10;

/// Minimum block count before the large-block rule applies.
const LARGE_BLOCK_RULE_MIN_BLOCKS: usize = 4;

pub fn is_allowed_ratio(aspect: f64) -> bool {
    ALLOWED_RATIOS
        .iter()
        .any(|ratio| (aspect - ratio).abs() <= ASPECT_TOLERANCE)
}

fn is_extreme_ratio(aspect: f64) -> bool {
    aspect < LEGACY_RATIO_RANGE.0 || aspect > LEGACY_RATIO_RANGE.1
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutMetrics {
    pub block_count: usize,
    pub distinct_sizes: usize,
    pub single_cell_count: usize,
    pub single_cell_fraction: f64,
    pub large_block_count: usize,
    pub illegal_aspect_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub score: i32,
    pub issues: Vec<String>,
    pub metrics: LayoutMetrics,
}

/// Score a layout against aspect legality and the quality thresholds.
pub fn validate(blocks: &[Block], constraints: &LayoutConstraints) -> ValidationResult {
    if blocks.is_empty() {
        return ValidationResult {
            is_valid: false,
            score: 0,
            issues: vec!["Layout has no blocks".to_string()],
            metrics: LayoutMetrics::default(),
        };
    }

    let mut score = MAX_SCORE;
    let mut issues = Vec::new();

    let illegal_aspect_count = match constraints.mode {
        ValidationMode::Strict => strict_aspect_check(blocks, &mut issues),
        ValidationMode::Legacy => legacy_aspect_check(blocks, &mut issues),
    };
    score -= ILLEGAL_ASPECT_PENALTY * illegal_aspect_count as i32;

    let block_count = blocks.len();
    let distinct_sizes = blocks
        .iter()
        .map(|block| (block.w, block.h))
        .collect::<HashSet<_>>()
        .len();
    let single_cell_count = blocks.iter().filter(|block| block.is_single_cell()).count();
    let single_cell_fraction = single_cell_count as f64 / block_count as f64;
    let large_block_count = blocks.iter().filter(|block| block.is_large()).count();

    if block_count >= constraints.min_block_variety && distinct_sizes < constraints.min_block_variety
    {
        issues.push(format!(
            "Only {} distinct block sizes, need {}",
            distinct_sizes, constraints.min_block_variety
        ));
        score -= VARIETY_PENALTY;
    }

    if single_cell_fraction > constraints.max_single_cell_percent {
        issues.push(format!(
            "{:.0}% of blocks are 1x1, limit is {:.0}%",
            single_cell_fraction * 100.0,
            constraints.max_single_cell_percent * 100.0
        ));
        score -= SINGLE_CELL_PENALTY;
    }

    if block_count >= LARGE_BLOCK_RULE_MIN_BLOCKS && large_block_count < constraints.min_large_blocks
    {
        issues.push(format!(
            "Only {} large blocks, need {}",
            large_block_count, constraints.min_large_blocks
        ));
        score -= LARGE_BLOCK_PENALTY;
    }

    let score = score.max(0);

    ValidationResult {
        is_valid: illegal_aspect_count == 0 && score >= PASSING_SCORE,
        score,
        issues,
        metrics: LayoutMetrics {
            block_count,
            distinct_sizes,
            single_cell_count,
            single_cell_fraction,
            large_block_count,
            illegal_aspect_count,
        },
    }
}

/// Every block must match one of the allowed ratios.
fn strict_aspect_check(blocks: &[Block], issues: &mut Vec<String>) -> usize {
    blocks
        .iter()
        .filter(|block| !is_allowed_ratio(block.aspect()))
        .inspect(|block| {
            issues.push(format!(
                "Block {} ({}x{}) has illegal aspect ratio {:.2}",
                block.index,
                block.w,
                block.h,
                block.aspect()
            ))
        })
        .count()
}

/// Extreme blocks are tolerated up to a fraction of the layout.
fn legacy_aspect_check(blocks: &[Block], issues: &mut Vec<String>) -> usize {
    let extreme = blocks
        .iter()
        .filter(|block| is_extreme_ratio(block.aspect()))
        .count();
    let fraction = extreme as f64 / blocks.len() as f64;

    if fraction > LEGACY_MAX_EXTREME_FRACTION {
        issues.push(format!(
            "{:.0}% of blocks fall outside the {}-{} ratio range",
            fraction * 100.0,
            LEGACY_RATIO_RANGE.0,
            LEGACY_RATIO_RANGE.1
        ));
        extreme
    } else {
        0
    }
}
