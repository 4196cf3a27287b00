use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod generator;
pub mod positions;
pub mod shapes;
pub mod validator;

pub use generator::{GeneratedLayout, LayoutGenerator, LayoutSource};
pub use positions::{calculate_positions, create_grid_config, GridConfig, PositionResult};
pub use shapes::{OccupancyGrid, ShapePlacer};
pub use validator::{LayoutMetrics, ValidationResult};

/// Rectangular region of the grid in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    /// Column of the top-left cell
    pub x: usize,
    /// Row of the top-left cell
    pub y: usize,
    /// Column span
    pub w: usize,
    /// Row span
    pub h: usize,
    /// Placement order within one layout
    pub index: usize,
}

impl Block {
    pub fn new(x: usize, y: usize, w: usize, h: usize, index: usize) -> Self {
        Self { x, y, w, h, index }
    }

    /// Width over height, in cell units.
    pub fn aspect(&self) -> f64 {
        self.w as f64 / self.h as f64
    }

    pub fn area(&self) -> usize {
        self.w * self.h
    }

    pub fn is_single_cell(&self) -> bool {
        self.w == 1 && self.h == 1
    }

    pub fn is_large(&self) -> bool {
        self.w > 2 || self.h > 2
    }

    /// All `(col, row)` cells covered by this block.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.y..self.y + self.h)
            .flat_map(move |row| (self.x..self.x + self.w).map(move |col| (col, row)))
    }
}

/// Which rule-set the validator applies to block aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationMode {
    /// Per-block ratio matching with scored penalties
    #[default]
    Strict,
    /// Percentage of blocks outside a photo-friendly ratio range
    Legacy,
}

impl ValidationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Legacy => "legacy",
        }
    }
}

impl FromStr for ValidationMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(ValidationMode::Strict),
            "legacy" => Ok(ValidationMode::Legacy),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quality thresholds a layout is scored against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConstraints {
    pub min_block_variety: usize,
    pub max_single_cell_percent: f64,
    pub min_large_blocks: usize,
    pub mode: ValidationMode,
}

impl Default for LayoutConstraints {
    fn default() -> Self {
        Self {
            min_block_variety: 3,
            max_single_cell_percent: 0.4,
            min_large_blocks: 1,
            mode: ValidationMode::Strict,
        }
    }
}

impl LayoutConstraints {
    /// Thresholds that any single-block layout satisfies with a full score.
    pub fn relaxed(mode: ValidationMode) -> Self {
        Self {
            min_block_variety: 1,
            max_single_cell_percent: 1.0,
            min_large_blocks: 0,
            mode,
        }
    }
}
