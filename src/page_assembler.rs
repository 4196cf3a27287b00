use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use std::time::{Duration, Instant};

use crate::error::{CollageError, CollageResult};
use crate::hue;
use crate::layout::generator::{DEFAULT_MAX_ATTEMPTS, MAX_GRID_DIMENSION};
use crate::layout::{
    calculate_positions, create_grid_config, Block, GridConfig, LayoutConstraints,
    LayoutGenerator, LayoutSource, PositionResult,
};
use crate::photo::{Photo, PhotoQueue};
use crate::planner::{self, GridPlan, PagePlan};
use crate::scoring::{BlockTarget, PageContext};
use crate::selector;

/// Advisory per-page time target.
pub const PAGE_TIME_BUDGET: Duration = Duration::from_secs(2);
/// Photo and rectangle aspects closer than this are letterboxed, not cropped.
pub const ASPECT_MATCH_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblerConfig {
    pub page_width: u32,
    pub page_height: u32,
    /// N for the N x N starting grid
    pub grid_size: usize,
    pub padding: u32,
    pub bleed: u32,
    pub harmony: bool,
    pub constraints: LayoutConstraints,
    pub max_attempts: usize,
    pub memory_warn_bytes: u64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            page_width: 2400,
            page_height: 2400,
            grid_size: 4,
            padding: 10,
            bleed: 0,
            harmony: false,
            constraints: LayoutConstraints::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            memory_warn_bytes: 1024 * 1024 * 1024,
        }
    }
}

impl AssemblerConfig {
    pub fn validate(&self) -> CollageResult<()> {
        if self.grid_size == 0 || self.grid_size > MAX_GRID_DIMENSION {
            return Err(CollageError::InvalidConfig(format!(
                "grid size must be between 1 and {}, got {}",
                MAX_GRID_DIMENSION,
                self.grid_size
            )));
        }
        if self.page_width == 0 || self.page_height == 0 {
            return Err(CollageError::InvalidConfig(format!(
                "page size must be positive, got {}x{}",
                self.page_width, self.page_height
            )));
        }
        let margins = self
            .padding
            .checked_add(self.bleed)
            .and_then(|margin| margin.checked_mul(2));
        if !margins.is_some_and(|margins| margins < self.page_width.min(self.page_height)) {
            return Err(CollageError::InvalidConfig(format!(
                "padding {} and bleed {} leave no room on a {}x{} page",
                self.padding, self.bleed, self.page_width, self.page_height
            )));
        }
        if !(0.0..=1.0).contains(&self.constraints.max_single_cell_percent) {
            return Err(CollageError::InvalidConfig(format!(
                "max single cell percent must be within 0..=1, got {}",
                self.constraints.max_single_cell_percent
            )));
        }
        // The densest page must still have drawable cells.
        create_grid_config(
            self.page_width,
            self.page_height,
            self.grid_size,
            self.grid_size,
            self.padding,
            self.bleed,
        )
        .map(|_| ())
    }
}

/// One photo placed into one block's drawable rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub photo: Photo,
    pub block_index: usize,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Letterbox instead of crop
    pub aspect_match: bool,
}

#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based
    pub number: usize,
    pub width: u32,
    pub height: u32,
    pub grid: GridConfig,
    pub blocks: Vec<Block>,
    pub positions: Vec<PositionResult>,
    pub placements: Vec<Placement>,
    /// `None` for the emergency full-page layout
    pub layout_source: Option<LayoutSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPhoto {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct AssemblyReport {
    pub pages: usize,
    pub placed: usize,
    pub skipped: Vec<SkippedPhoto>,
}

/// Receives each finished page.
pub trait PageSink {
    fn accept(&mut self, page: Page) -> CollageResult<()>;
}

impl PageSink for Vec<Page> {
    fn accept(&mut self, page: Page) -> CollageResult<()> {
        self.push(page);
        Ok(())
    }
}

struct LaidOutPage {
    grid: GridConfig,
    blocks: Vec<Block>,
    positions: Vec<PositionResult>,
    source: Option<LayoutSource>,
}

enum AssemblyState {
    Planning,
    LayingOut(PagePlan),
    Assigning(LaidOutPage),
    Rendering(Page),
    Done,
}

/// Drives pages until the queue is empty.
pub struct PageAssembler<R> {
    config: AssemblerConfig,
    generator: LayoutGenerator,
    rng: R,
}

impl PageAssembler<StdRng> {
    /// Assembler with a reproducible source when `seed` is given.
    pub fn seeded(config: AssemblerConfig, seed: Option<u64>) -> CollageResult<Self> {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        debug!("Page assembler seed: {}", seed);
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: RngExt> PageAssembler<R> {
    pub fn new(config: AssemblerConfig, rng: R) -> CollageResult<Self> {
        config.validate()?;
        let generator = LayoutGenerator::new(config.constraints, config.max_attempts);
        Ok(Self {
            config,
            generator,
            rng,
        })
    }

    /// Lay out and fill pages until `queue` is empty, handing each page to
    /// `sink`. Every photo ends up in exactly one placement or in the
    /// report's skipped list.
    pub fn run<S: PageSink>(
        &mut self,
        mut queue: PhotoQueue,
        sink: &mut S,
    ) -> CollageResult<AssemblyReport> {
        if queue.is_empty() {
            return Err(CollageError::EmptyQueue);
        }

        let total = queue.len();
        let mut report = AssemblyReport::default();
        let mut state = AssemblyState::Planning;
        let mut page_number = 0;
        let mut page_started = Instant::now();
        let mut queued_at_start = total;

        loop {
            state = match state {
                AssemblyState::Planning => {
                    if queue.is_empty() {
                        AssemblyState::Done
                    } else {
                        page_number += 1;
                        page_started = Instant::now();
                        queued_at_start = queue.len();
                        let plan = planner::plan_page(
                            queue.photos(),
                            self.config.grid_size,
                            &self.config.constraints,
                        )?;
                        AssemblyState::LayingOut(plan)
                    }
                }
                AssemblyState::LayingOut(plan) => AssemblyState::Assigning(self.lay_out(&plan)?),
                AssemblyState::Assigning(laid_out) => {
                    let placements = self.assign_photos(
                        &laid_out.grid,
                        &laid_out.blocks,
                        &laid_out.positions,
                        &mut queue,
                        &mut report.skipped,
                    );
                    AssemblyState::Rendering(Page {
                        number: page_number,
                        width: self.config.page_width,
                        height: self.config.page_height,
                        grid: laid_out.grid,
                        blocks: laid_out.blocks,
                        positions: laid_out.positions,
                        placements,
                        layout_source: laid_out.source,
                    })
                }
                AssemblyState::Rendering(page) => {
                    if queue.len() == queued_at_start {
                        return Err(CollageError::NoProgress(page_number));
                    }

                    let done = total - queue.len();
                    info!(
                        "Page {}: placed {} photos ({:.0}% complete)",
                        page.number,
                        page.placements.len(),
                        done as f64 / total as f64 * 100.0
                    );
                    self.check_page_budget(&page, page_started.elapsed());

                    report.pages += 1;
                    report.placed += page.placements.len();
                    sink.accept(page)?;
                    AssemblyState::Planning
                }
                AssemblyState::Done => break,
            };
        }

        info!(
            "Assembly complete: {} photos on {} pages, {} skipped",
            report.placed,
            report.pages,
            report.skipped.len()
        );
        Ok(report)
    }

    fn lay_out(&mut self, plan: &PagePlan) -> CollageResult<LaidOutPage> {
        let generator = self.generator.with_constraints(plan.constraints);
        let layout = match plan.grid {
            GridPlan::Fixed { rows, cols } => generator.generate_validated(rows, cols, &mut self.rng),
            GridPlan::PhotoCount(count) => generator.generate_for_photo_count(count, &mut self.rng),
        };

        match &layout.source {
            LayoutSource::Validated { attempt, score } => debug!(
                "Layout {}x{} validated on attempt {} with score {}",
                layout.cols,
                layout.rows,
                attempt + 1,
                score
            ),
            LayoutSource::BestEffort { score } => warn!(
                "Layout {}x{} did not validate, using best score {}",
                layout.cols, layout.rows, score
            ),
            LayoutSource::UniformFallback => warn!(
                "Layout {}x{} fell back to a uniform grid",
                layout.cols, layout.rows
            ),
        }

        match self.position(layout.rows, layout.cols, &layout.blocks) {
            Ok((grid, positions)) => Ok(LaidOutPage {
                grid,
                blocks: layout.blocks,
                positions,
                source: Some(layout.source),
            }),
            Err(e) => {
                warn!("Layout could not be positioned ({}), using a full-page block", e);
                self.emergency_layout()
            }
        }
    }

    fn position(
        &self,
        rows: usize,
        cols: usize,
        blocks: &[Block],
    ) -> CollageResult<(GridConfig, Vec<PositionResult>)> {
        let grid = create_grid_config(
            self.config.page_width,
            self.config.page_height,
            cols,
            rows,
            self.config.padding,
            self.config.bleed,
        )?;
        let positions = calculate_positions(blocks, &grid)?;
        Ok((grid, positions))
    }

    fn emergency_layout(&self) -> CollageResult<LaidOutPage> {
        let blocks = vec![Block::new(0, 0, 1, 1, 0)];
        let (grid, positions) = self.position(1, 1, &blocks)?;
        Ok(LaidOutPage {
            grid,
            blocks,
            positions,
            source: None,
        })
    }

    /// Fill blocks in placement order from the current queue. Chosen photos
    /// leave the queue immediately; photos without usable dimensions are
    /// skipped and the block is offered to the next candidate.
    pub fn assign_photos(
        &mut self,
        grid: &GridConfig,
        blocks: &[Block],
        positions: &[PositionResult],
        queue: &mut PhotoQueue,
        skipped: &mut Vec<SkippedPhoto>,
    ) -> Vec<Placement> {
        let mut order: Vec<usize> = (0..blocks.len()).collect();
        order.sort_by_key(|&i| blocks[i].index);

        let mut placements = Vec::with_capacity(blocks.len());
        let mut placed_hues: Vec<f64> = Vec::new();

        for i in order {
            let block = &blocks[i];
            let Some(position) = positions.iter().find(|p| p.index == block.index) else {
                warn!("Block {} has no position, leaving it empty", block.index);
                continue;
            };
            let target = BlockTarget::from_block(block, grid);

            loop {
                let context = PageContext {
                    harmony: self.config.harmony,
                    average_hue: hue::circular_mean(placed_hues.iter().copied()),
                };

                let Some(index) = selector::select(queue.photos(), &target, &context, &mut self.rng)
                else {
                    debug!("No photos left for block {}", block.index);
                    break;
                };

                let expected_id = queue.photos()[index].id.clone();
                let Some(photo) = queue.take(index, &expected_id) else {
                    warn!("Photo {} vanished before block {}", expected_id, block.index);
                    break;
                };

                if !photo.has_dimensions() {
                    warn!("Skipping {}: image has no dimensions", photo.id);
                    skipped.push(SkippedPhoto {
                        id: photo.id,
                        reason: "image has no dimensions".to_string(),
                    });
                    continue;
                }

                let aspect_match =
                    (photo.aspect() - position.render_aspect()).abs() <= ASPECT_MATCH_TOLERANCE;
                if let Some(hue) = photo.hue {
                    placed_hues.push(hue);
                }

                placements.push(Placement {
                    photo,
                    block_index: block.index,
                    x: position.x,
                    y: position.y,
                    w: position.render_width.max(0) as u32,
                    h: position.render_height.max(0) as u32,
                    aspect_match,
                });
                break;
            }
        }

        placements
    }

    fn check_page_budget(&self, page: &Page, elapsed: Duration) {
        if elapsed > PAGE_TIME_BUDGET {
            warn!(
                "Page {} took {:.2?}, above the {:?} target",
                page.number, elapsed, PAGE_TIME_BUDGET
            );
        }

        let decoded_bytes: u64 = page
            .placements
            .iter()
            .map(|placement| placement.photo.estimated_decoded_bytes())
            .sum();
        if decoded_bytes > self.config.memory_warn_bytes {
            warn!(
                "Page {} needs about {} MB of decoded pixels, above the {} MB threshold",
                page.number,
                decoded_bytes / (1024 * 1024),
                self.config.memory_warn_bytes / (1024 * 1024)
            );
        }
    }
}

/// Run a whole queue through a freshly seeded assembler.
pub fn assemble(
    queue: PhotoQueue,
    config: AssemblerConfig,
    seed: Option<u64>,
) -> CollageResult<(Vec<Page>, AssemblyReport)> {
    let mut assembler = PageAssembler::seeded(config, seed)?;
    let mut pages = Vec::new();
    let report = assembler.run(queue, &mut pages)?;
    Ok((pages, report))
}
