use log::info;

use crate::error::{CollageError, CollageResult};
use crate::layout::LayoutConstraints;
use crate::photo::{Orientation, Photo};

/// Queue conditions that change how the next page is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeCase {
    SinglePhoto,
    FewPhotos { remaining: usize, capacity: usize },
    AllLandscape,
    AllPortrait,
}

/// Grid sizing for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPlan {
    Fixed { rows: usize, cols: usize },
    /// Search dimensions until the block count matches the photo count
    PhotoCount(usize),
}

/// What an edge case changes for the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Adjustment {
    pub grid: Option<GridPlan>,
    pub relax_constraints: bool,
}

impl EdgeCase {
    pub fn adjustment(&self) -> Adjustment {
        match *self {
            EdgeCase::SinglePhoto => Adjustment {
                grid: Some(GridPlan::Fixed { rows: 1, cols: 1 }),
                relax_constraints: true,
            },
            EdgeCase::FewPhotos { remaining, .. } => Adjustment {
                grid: Some(GridPlan::PhotoCount(remaining)),
                relax_constraints: false,
            },
            // Detected and reported only; the shape palette stays the same.
            EdgeCase::AllLandscape | EdgeCase::AllPortrait => Adjustment::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub grid: GridPlan,
    pub constraints: LayoutConstraints,
    pub edge_cases: Vec<EdgeCase>,
}

/// Inspect the remaining queue. An empty queue is fatal.
pub fn detect_edge_cases(queue: &[Photo], grid_size: usize) -> CollageResult<Vec<EdgeCase>> {
    if queue.is_empty() {
        return Err(CollageError::EmptyQueue);
    }

    let remaining = queue.len();
    let capacity = grid_size * grid_size;
    let mut cases = Vec::new();

    if remaining == 1 {
        cases.push(EdgeCase::SinglePhoto);
    } else if remaining < capacity {
        cases.push(EdgeCase::FewPhotos {
            remaining,
            capacity,
        });
    }

    if remaining > 1 {
        if queue.iter().all(|p| p.orientation == Orientation::Landscape) {
            cases.push(EdgeCase::AllLandscape);
        } else if queue.iter().all(|p| p.orientation == Orientation::Portrait) {
            cases.push(EdgeCase::AllPortrait);
        }
    }

    Ok(cases)
}

/// Decide grid sizing and constraints for the next page.
pub fn plan_page(
    queue: &[Photo],
    grid_size: usize,
    constraints: &LayoutConstraints,
) -> CollageResult<PagePlan> {
    let edge_cases = detect_edge_cases(queue, grid_size)?;

    let mut plan = PagePlan {
        grid: GridPlan::Fixed {
            rows: grid_size,
            cols: grid_size,
        },
        constraints: *constraints,
        edge_cases: Vec::with_capacity(edge_cases.len()),
    };

    for case in edge_cases {
        match case {
            EdgeCase::AllLandscape | EdgeCase::AllPortrait => {
                info!("All {} remaining photos share one orientation ({:?})", queue.len(), case)
            }
            EdgeCase::FewPhotos {
                remaining,
                capacity,
            } => info!(
                "{} photos left for a grid of {}, shrinking page grid",
                remaining, capacity
            ),
            EdgeCase::SinglePhoto => info!("Single photo left, using a full-page block"),
        }

        let adjustment = case.adjustment();
        if let Some(grid) = adjustment.grid {
            plan.grid = grid;
        }
        if adjustment.relax_constraints {
            plan.constraints = LayoutConstraints::relaxed(constraints.mode);
        }
        plan.edge_cases.push(case);
    }

    Ok(plan)
}
