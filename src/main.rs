use anyhow::{bail, Context};
use log::{info, warn};

use turbo_collage::config::Config;
use turbo_collage::file_scanner::FileScanner;
use turbo_collage::json_export::{self, LAYOUT_FILE_NAME};
use turbo_collage::page_assembler;
use turbo_collage::photo_loader::PhotoLoader;
use turbo_collage::renderer::{self, OutputFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Starting TurboCollage");
    config.log_summary();

    let scan_config = config.clone();
    let (queue, mut skipped) = tokio::task::spawn_blocking(move || {
        let files = FileScanner::new(scan_config.input_paths.clone()).scan();
        PhotoLoader::new(scan_config.harmony).load(&files)
    })
    .await
    .context("Photo loading task failed")?;

    info!(
        "Scan complete: {} photos queued, {} skipped",
        queue.len(),
        skipped.len()
    );
    if queue.is_empty() {
        bail!("No readable photos found in {:?}", config.input_paths);
    }

    let assembler_config = config.assembler_config();
    let seed = config.seed;
    let (pages, report) =
        tokio::task::spawn_blocking(move || page_assembler::assemble(queue, assembler_config, seed))
            .await
            .context("Page assembly task failed")?
            .context("Page assembly failed")?;

    tokio::fs::create_dir_all(&config.output_path)
        .await
        .with_context(|| format!("Cannot create {}", config.output_path.display()))?;

    match config.output_format {
        OutputFormat::Json => {
            let layouts = json_export::to_layouts(&pages, &config.output_path, OutputFormat::Jpeg);
            let json = json_export::to_json(&layouts)?;
            let layout_path = config.output_path.join(LAYOUT_FILE_NAME);
            tokio::fs::write(&layout_path, json)
                .await
                .with_context(|| format!("Cannot write {}", layout_path.display()))?;
            info!("Wrote {} page layouts to {}", layouts.len(), layout_path.display());
        }
        format => {
            let out_dir = config.output_path.clone();
            let background = config.background;
            let written = tokio::task::spawn_blocking(move || {
                renderer::render_pages(&pages, &out_dir, format, background)
            })
            .await
            .context("Rendering task failed")?
            .context("Rendering failed")?;
            info!("Rendered {} pages", written.len());
        }
    }

    skipped.extend(report.skipped);
    for photo in &skipped {
        warn!("Skipped {}: {}", photo.id, photo.reason);
    }
    info!(
        "Done: {} photos on {} pages, {} skipped",
        report.placed,
        report.pages,
        skipped.len()
    );

    Ok(())
}
