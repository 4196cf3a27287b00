use log::info;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{CollageError, CollageResult};
use crate::layout::{LayoutConstraints, ValidationMode};
use crate::page_assembler::AssemblerConfig;
use crate::renderer::OutputFormat;

const ENV_PREFIX: &str = "TURBO_COLLAGE_";

#[derive(Debug, Clone)]
pub struct Config {
    pub input_paths: Vec<PathBuf>,
    pub output_path: PathBuf,
    pub output_format: OutputFormat,
    pub grid_size: usize,
    pub page_width: u32,
    pub page_height: u32,
    pub padding: u32,
    pub bleed: u32,
    pub harmony: bool,
    pub min_block_variety: usize,
    pub max_single_cell_percent: f64,
    pub min_large_blocks: usize,
    pub validation_mode: ValidationMode,
    pub max_layout_attempts: usize,
    pub seed: Option<u64>,
    pub background: [u8; 3],
    pub memory_warn_mb: u64,
}

impl Config {
    pub fn from_env() -> CollageResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source; `lookup` gets the full variable name.
    pub fn from_lookup<F>(lookup: F) -> CollageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name)).unwrap_or_else(|| default.to_string())
        };

        let config = Config {
            input_paths: var("INPUT_PATHS", "./photos")
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect(),
            output_path: PathBuf::from(var("OUTPUT_PATH", "./output")),
            output_format: parse_value("OUTPUT_FORMAT", &var("OUTPUT_FORMAT", "jpeg"))?,
            grid_size: parse_value("GRID_SIZE", &var("GRID_SIZE", "4"))?,
            page_width: parse_value("PAGE_WIDTH", &var("PAGE_WIDTH", "2400"))?,
            page_height: parse_value("PAGE_HEIGHT", &var("PAGE_HEIGHT", "2400"))?,
            padding: parse_value("PADDING", &var("PADDING", "10"))?,
            bleed: parse_value("BLEED", &var("BLEED", "0"))?,
            harmony: parse_value("HARMONY", &var("HARMONY", "false"))?,
            min_block_variety: parse_value("MIN_BLOCK_VARIETY", &var("MIN_BLOCK_VARIETY", "3"))?,
            max_single_cell_percent: parse_value(
                "MAX_SINGLE_CELL_PERCENT",
                &var("MAX_SINGLE_CELL_PERCENT", "0.4"),
            )?,
            min_large_blocks: parse_value("MIN_LARGE_BLOCKS", &var("MIN_LARGE_BLOCKS", "1"))?,
            validation_mode: parse_value("VALIDATION_MODE", &var("VALIDATION_MODE", "strict"))?,
            max_layout_attempts: parse_value(
                "MAX_LAYOUT_ATTEMPTS",
                &var("MAX_LAYOUT_ATTEMPTS", "100"),
            )?,
            seed: match lookup(&format!("{}SEED", ENV_PREFIX)) {
                Some(seed) if !seed.trim().is_empty() => Some(parse_value("SEED", &seed)?),
                _ => None,
            },
            background: parse_rgb(&var("BACKGROUND", "255,255,255"))?,
            memory_warn_mb: parse_value("MEMORY_WARN_MB", &var("MEMORY_WARN_MB", "1024"))?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CollageResult<()> {
        if self.input_paths.is_empty() {
            return Err(CollageError::InvalidConfig(
                "at least one input path is required".to_string(),
            ));
        }
        if self.max_layout_attempts == 0 {
            return Err(CollageError::InvalidConfig(
                "max layout attempts must be positive".to_string(),
            ));
        }
        self.assembler_config().validate()
    }

    pub fn constraints(&self) -> LayoutConstraints {
        LayoutConstraints {
            min_block_variety: self.min_block_variety,
            max_single_cell_percent: self.max_single_cell_percent,
            min_large_blocks: self.min_large_blocks,
            mode: self.validation_mode,
        }
    }

    pub fn assembler_config(&self) -> AssemblerConfig {
        AssemblerConfig {
            page_width: self.page_width,
            page_height: self.page_height,
            grid_size: self.grid_size,
            padding: self.padding,
            bleed: self.bleed,
            harmony: self.harmony,
            constraints: self.constraints(),
            max_attempts: self.max_layout_attempts,
            memory_warn_bytes: self.memory_warn_mb.saturating_mul(1024 * 1024),
        }
    }

    pub fn log_summary(&self) {
        info!("Input paths: {:?}", self.input_paths);
        info!(
            "Output: {} ({})",
            self.output_path.display(),
            self.output_format
        );
        info!(
            "Page {}x{}, grid {}x{}, padding {}, bleed {}",
            self.page_width,
            self.page_height,
            self.grid_size,
            self.grid_size,
            self.padding,
            self.bleed
        );
        info!(
            "Validation {} (variety {}, single cells {:.0}%, large blocks {}), {} attempts",
            self.validation_mode,
            self.min_block_variety,
            self.max_single_cell_percent * 100.0,
            self.min_large_blocks,
            self.max_layout_attempts
        );
        info!(
            "Harmony: {}, seed: {}",
            self.harmony,
            self.seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "random".to_string())
        );
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> CollageResult<T> {
    raw.trim().parse().map_err(|_| {
        CollageError::InvalidConfig(format!("{}{}: cannot parse '{}'", ENV_PREFIX, name, raw))
    })
}

/// `"r,g,b"` with each channel in 0..=255.
pub fn parse_rgb(raw: &str) -> CollageResult<[u8; 3]> {
    let channels = raw
        .split(',')
        .map(|part| parse_value::<u8>("BACKGROUND", part))
        .collect::<CollageResult<Vec<u8>>>()?;

    match channels.as_slice() {
        &[r, g, b] => Ok([r, g, b]),
        _ => Err(CollageError::InvalidConfig(format!(
            "{}BACKGROUND: expected three channels, got '{}'",
            ENV_PREFIX, raw
        ))),
    }
}
