//! Render pages from a previously exported `layout.json`.
//!
//! Usage: `render-json <layout.json>`. The page canvas is the bounding box of
//! each page's rectangles plus `TURBO_COLLAGE_PADDING` and `TURBO_COLLAGE_BLEED`
//! on the right and bottom.

use anyhow::{bail, Context};
use image::DynamicImage;
use log::{info, warn};
use std::env;
use std::path::PathBuf;

use turbo_collage::config::Config;
use turbo_collage::json_export::{self, PageLayout};
use turbo_collage::renderer;

fn render_page(
    layout: &PageLayout,
    padding: u32,
    bleed: u32,
    background: [u8; 3],
) -> anyhow::Result<PathBuf> {
    let (width, height) = layout.page_bounds();
    if width == 0 || height == 0 {
        bail!("Page {} has no drawable rectangles", layout.output);
    }

    let (width, height) = layout.canvas_size(padding, bleed);
    let canvas = renderer::compose(width, height, &layout.canvas_items(), background);

    let output = PathBuf::from(&layout.output);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create {}", parent.display()))?;
    }
    DynamicImage::ImageRgb8(canvas)
        .save(&output)
        .with_context(|| format!("Cannot save {}", output.display()))?;
    Ok(output)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Some(layout_path) = env::args().nth(1).map(PathBuf::from) else {
        bail!("Usage: render-json <layout.json>");
    };

    let config = Config::from_env().context("Failed to load configuration")?;

    let layouts = json_export::load_layout(&layout_path)
        .with_context(|| format!("Cannot read {}", layout_path.display()))?;
    info!("Rendering {} pages from {}", layouts.len(), layout_path.display());

    let mut rendered = 0;
    for layout in &layouts {
        match render_page(layout, config.padding, config.bleed, config.background) {
            Ok(output) => {
                info!("Saved {}", output.display());
                rendered += 1;
            }
            Err(e) => warn!("{:#}", e),
        }
    }

    info!("Rendered {} of {} pages", rendered, layouts.len());
    Ok(())
}
