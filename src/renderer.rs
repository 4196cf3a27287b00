use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use log::{error, info, warn};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{CollageError, CollageResult};
use crate::page_assembler::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    /// Layout description only, no pixels
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Json => "json",
        }
    }

    /// Extension of the page image files.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg | OutputFormat::Json => "jpg",
            OutputFormat::Png => "png",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg | OutputFormat::Json => ImageFormat::Jpeg,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "json" => Ok(OutputFormat::Json),
            _ => Err(()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `page_001.jpg`, `page_002.jpg`, ...
pub fn page_file_name(number: usize, format: OutputFormat) -> String {
    format!("page_{:03}.{}", number, format.extension())
}

/// One image to draw onto a page canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasItem {
    pub path: PathBuf,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Fit inside the rectangle and center instead of cropping to fill it
    pub contain: bool,
    pub exif_orientation: Option<u32>,
}

impl CanvasItem {
    pub fn from_page(page: &Page) -> Vec<CanvasItem> {
        page.placements
            .iter()
            .map(|placement| CanvasItem {
                path: placement.photo.path.clone(),
                x: placement.x,
                y: placement.y,
                w: placement.w,
                h: placement.h,
                contain: placement.aspect_match,
                exif_orientation: placement.photo.exif_orientation,
            })
            .collect()
    }
}

pub fn apply_orientation(img: DynamicImage, orientation: Option<u32>) -> DynamicImage {
    match orientation {
        Some(2) => img.fliph(),
        Some(3) => img.rotate180(),
        Some(4) => img.flipv(),
        Some(5) => img.fliph().rotate270(),
        Some(6) => img.rotate90(),
        Some(7) => img.fliph().rotate90(),
        Some(8) => img.rotate270(),
        _ => img,
    }
}

/// Scale `img` into a `w` x `h` rectangle. Returns the scaled image and its
/// offset inside the rectangle.
fn fit_into(img: &DynamicImage, w: u32, h: u32, contain: bool) -> (RgbImage, u32, u32) {
    if contain {
        let scaled = img.resize(w, h, FilterType::Lanczos3).to_rgb8();
        let dx = w.saturating_sub(scaled.width()) / 2;
        let dy = h.saturating_sub(scaled.height()) / 2;
        (scaled, dx, dy)
    } else {
        (img.resize_to_fill(w, h, FilterType::Lanczos3).to_rgb8(), 0, 0)
    }
}

/// Draw every item onto a fresh canvas. Items that cannot be opened are
/// logged and left blank.
pub fn compose(width: u32, height: u32, items: &[CanvasItem], background: [u8; 3]) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(width, height, Rgb(background));

    for item in items {
        if item.w == 0 || item.h == 0 {
            continue;
        }

        let img = match image::open(&item.path) {
            Ok(img) => apply_orientation(img, item.exif_orientation),
            Err(e) => {
                error!("Failed to load image {}: {}", item.path.display(), e);
                continue;
            }
        };

        let (scaled, dx, dy) = fit_into(&img, item.w, item.h, item.contain);
        imageops::overlay(
            &mut canvas,
            &scaled,
            (item.x + dx) as i64,
            (item.y + dy) as i64,
        );
    }

    canvas
}

/// Render and save pages in parallel. Returns the written paths in page order.
pub fn render_pages(
    pages: &[Page],
    out_dir: &Path,
    format: OutputFormat,
    background: [u8; 3],
) -> CollageResult<Vec<PathBuf>> {
    if format == OutputFormat::Json {
        return Err(CollageError::InvalidConfig(
            "json output has no page images to render".to_string(),
        ));
    }
    std::fs::create_dir_all(out_dir)?;

    let written: Vec<CollageResult<PathBuf>> = pages
        .par_iter()
        .map(|page| {
            let canvas = compose(page.width, page.height, &CanvasItem::from_page(page), background);
            let file_path = out_dir.join(page_file_name(page.number, format));
            DynamicImage::ImageRgb8(canvas).save_with_format(&file_path, format.image_format())?;
            info!("Saved page {} to {}", page.number, file_path.display());
            Ok(file_path)
        })
        .collect();

    let failures = written.iter().filter(|result| result.is_err()).count();
    if failures > 0 {
        warn!("{} of {} pages failed to save", failures, pages.len());
    }
    written.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn assert_close(pixel: &Rgb<u8>, expected: [u8; 3]) {
        for (got, want) in pixel.0.iter().zip(expected) {
            assert!((*got as i16 - want as i16).abs() <= 2, "{:?} vs {:?}", pixel, expected);
        }
    }

    fn solid(dir: &TempDir, name: &str, w: u32, h: u32, color: [u8; 3]) -> PathBuf {
        let path = dir.path().join(name);
        RgbImage::from_pixel(w, h, Rgb(color)).save(&path).unwrap();
        path
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JPG".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!("png".parse::<OutputFormat>(), Ok(OutputFormat::Png));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("pdf".parse::<OutputFormat>().is_err());
        assert_eq!(page_file_name(7, OutputFormat::Png), "page_007.png");
    }

    #[test]
    fn test_apply_orientation_swaps_axes() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(40, 20));
        let rotated = apply_orientation(img.clone(), Some(6));
        assert_eq!((rotated.width(), rotated.height()), (20, 40));
        let same = apply_orientation(img, Some(3));
        assert_eq!((same.width(), same.height()), (40, 20));
    }

    #[test]
    fn test_compose_cover_fills_rectangle() {
        let temp_dir = TempDir::new().unwrap();
        let path = solid(&temp_dir, "red.png", 300, 100, [255, 0, 0]);
        let items = vec![CanvasItem {
            path,
            x: 10,
            y: 10,
            w: 50,
            h: 50,
            contain: false,
            exif_orientation: None,
        }];

        let canvas = compose(100, 100, &items, [255, 255, 255]);
        assert_close(canvas.get_pixel(10, 10), [255, 0, 0]);
        assert_close(canvas.get_pixel(59, 59), [255, 0, 0]);
        assert_eq!(canvas.get_pixel(5, 5), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_compose_contain_letterboxes() {
        let temp_dir = TempDir::new().unwrap();
        let path = solid(&temp_dir, "blue.png", 200, 100, [0, 0, 255]);
        let items = vec![CanvasItem {
            path,
            x: 0,
            y: 0,
            w: 100,
            h: 100,
            contain: true,
            exif_orientation: None,
        }];

        let canvas = compose(100, 100, &items, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(50, 5), &Rgb([0, 0, 0]));
        assert_close(canvas.get_pixel(50, 50), [0, 0, 255]);
    }

    #[test]
    fn test_compose_skips_missing_files() {
        let items = vec![CanvasItem {
            path: PathBuf::from("/nonexistent/photo.jpg"),
            x: 0,
            y: 0,
            w: 10,
            h: 10,
            contain: false,
            exif_orientation: None,
        }];
        let canvas = compose(20, 20, &items, [1, 2, 3]);
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([1, 2, 3]));
    }
}
