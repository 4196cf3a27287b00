use log::warn;
use serde::Serialize;

use super::Block;
use crate::error::{CollageError, CollageResult};

/// Cell geometry of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridConfig {
    pub cols: usize,
    pub rows: usize,
    pub cell_width: u32,
    pub cell_height: u32,
    pub padding: u32,
    pub bleed: u32,
}

/// Pixel rectangle for one block. `width`/`height` include padding,
/// `render_width`/`render_height` do not and may be non-positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionResult {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub render_width: i64,
    pub render_height: i64,
    pub index: usize,
}

impl PositionResult {
    pub fn is_renderable(&self) -> bool {
        self.render_width > 0 && self.render_height > 0
    }

    /// Aspect of the drawable area, falling back to the padded cell.
    pub fn render_aspect(&self) -> f64 {
        if self.is_renderable() {
            self.render_width as f64 / self.render_height as f64
        } else {
            self.width as f64 / self.height.max(1) as f64
        }
    }
}

/// Derive the cell size for a page split into `cols x rows` cells.
///
/// Cell sizes are truncated; leftover pixels stay unused at the page edge.
pub fn create_grid_config(
    page_width: u32,
    page_height: u32,
    cols: usize,
    rows: usize,
    padding: u32,
    bleed: u32,
) -> CollageResult<GridConfig> {
    if cols == 0 || rows == 0 {
        return Err(CollageError::InvalidConfig(format!(
            "grid must have at least one column and row, got {}x{}",
            cols, rows
        )));
    }

    let both_bleeds = bleed.checked_mul(2).ok_or_else(|| {
        CollageError::InvalidConfig(format!("bleed of {} px overflows the page", bleed))
    })?;
    let usable_width = page_width.saturating_sub(both_bleeds);
    let usable_height = page_height.saturating_sub(both_bleeds);

    let config = GridConfig {
        cols,
        rows,
        cell_width: usable_width / cols as u32,
        cell_height: usable_height / rows as u32,
        padding,
        bleed,
    };
    check_grid_config(&config)?;
    Ok(config)
}

fn check_grid_config(config: &GridConfig) -> CollageResult<()> {
    if config.cols == 0 || config.rows == 0 || config.cell_width == 0 || config.cell_height == 0 {
        return Err(CollageError::InvalidConfig(format!(
            "grid {}x{} yields cells of {}x{} px",
            config.cols, config.rows, config.cell_width, config.cell_height
        )));
    }
    Ok(())
}

/// `cells * cell_size + padding + bleed`, `None` on `u32` overflow.
fn pixel_offset(cells: usize, cell_size: u32, padding: u32, bleed: u32) -> Option<u32> {
    u32::try_from(cells)
        .ok()?
        .checked_mul(cell_size)?
        .checked_add(padding)?
        .checked_add(bleed)
}

/// Convert grid blocks into pixel rectangles, one per block, same order.
pub fn calculate_positions(
    blocks: &[Block],
    config: &GridConfig,
) -> CollageResult<Vec<PositionResult>> {
    check_grid_config(config)?;

    blocks
        .iter()
        .map(|block| {
            if block.w == 0
                || block.h == 0
                || block.x + block.w > config.cols
                || block.y + block.h > config.rows
            {
                return Err(CollageError::BlockOutOfBounds {
                    index: block.index,
                    x: block.x,
                    y: block.y,
                    w: block.w,
                    h: block.h,
                    cols: config.cols,
                    rows: config.rows,
                });
            }

            let overflow = || {
                CollageError::InvalidConfig(format!(
                    "block {} does not fit in pixel space with padding {} and bleed {}",
                    block.index, config.padding, config.bleed
                ))
            };
            let width = pixel_offset(block.w, config.cell_width, 0, 0).ok_or_else(overflow)?;
            let height = pixel_offset(block.h, config.cell_height, 0, 0).ok_or_else(overflow)?;
            let position = PositionResult {
                x: pixel_offset(block.x, config.cell_width, config.padding, config.bleed)
                    .ok_or_else(overflow)?,
                y: pixel_offset(block.y, config.cell_height, config.padding, config.bleed)
                    .ok_or_else(overflow)?,
                width,
                height,
                render_width: width as i64 - 2 * config.padding as i64,
                render_height: height as i64 - 2 * config.padding as i64,
                index: block.index,
            };

            if !position.is_renderable() {
                warn!(
                    "Block {} has no drawable area ({}x{} px after padding)",
                    block.index, position.render_width, position.render_height
                );
            }

            Ok(position)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_by_two_block_on_four_by_four_grid() {
        let config = create_grid_config(1200, 1200, 4, 4, 10, 0).unwrap();
        assert_eq!(config.cell_width, 300);
        assert_eq!(config.cell_height, 300);

        let positions = calculate_positions(&[Block::new(0, 0, 2, 2, 0)], &config).unwrap();
        let position = positions[0];
        assert_eq!((position.x, position.y), (10, 10));
        assert_eq!((position.width, position.height), (600, 600));
        assert_eq!((position.render_width, position.render_height), (580, 580));
        assert_eq!(position.index, 0);
    }

    #[test]
    fn test_bleed_shifts_and_shrinks_cells() {
        let config = create_grid_config(1000, 700, 3, 2, 5, 50).unwrap();
        assert_eq!(config.cell_width, 300);
        assert_eq!(config.cell_height, 300);

        let positions = calculate_positions(&[Block::new(2, 1, 1, 1, 4)], &config).unwrap();
        assert_eq!((positions[0].x, positions[0].y), (655, 355));
        assert_eq!(positions[0].index, 4);
    }

    #[test]
    fn test_cell_size_truncates() {
        let config = create_grid_config(1000, 1000, 3, 3, 0, 0).unwrap();
        assert_eq!(config.cell_width, 333);
    }

    #[test]
    fn test_block_outside_grid_is_rejected() {
        let config = create_grid_config(1200, 1200, 4, 4, 10, 0).unwrap();
        let err = calculate_positions(&[Block::new(3, 0, 2, 1, 7)], &config).unwrap_err();
        assert!(matches!(err, CollageError::BlockOutOfBounds { index: 7, .. }));
    }

    #[test]
    fn test_invalid_grid_config_is_rejected() {
        assert!(create_grid_config(1200, 1200, 0, 4, 0, 0).is_err());
        assert!(create_grid_config(100, 100, 4, 4, 0, 50).is_err());
        assert!(create_grid_config(3, 100, 4, 4, 0, 0).is_err());
    }

    #[test]
    fn test_pixel_overflow_is_a_config_error() {
        assert!(matches!(
            create_grid_config(2400, 2400, 4, 4, 10, 3_000_000_000),
            Err(CollageError::InvalidConfig(_))
        ));

        let config = GridConfig {
            cols: 4,
            rows: 4,
            cell_width: 600,
            cell_height: 600,
            padding: u32::MAX - 10,
            bleed: 0,
        };
        assert!(matches!(
            calculate_positions(&[Block::new(1, 1, 1, 1, 0)], &config),
            Err(CollageError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_oversized_padding_still_emits_block() {
        let config = create_grid_config(400, 400, 4, 4, 60, 0).unwrap();
        let positions = calculate_positions(&[Block::new(0, 0, 1, 1, 0)], &config).unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].render_width, -20);
        assert!(!positions[0].is_renderable());
    }
}
