use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CollageResult;
use crate::metadata_extractor::MetadataExtractor;
use crate::page_assembler::Page;
use crate::renderer::{page_file_name, CanvasItem, OutputFormat};

pub const LAYOUT_FILE_NAME: &str = "layout.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedFile {
    pub file: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub aspect_match: bool,
}

/// One page as written to `layout.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// Where the rendered page is expected to go
    pub output: String,
    pub files: Vec<PlacedFile>,
}

impl PageLayout {
    pub fn from_page(page: &Page, out_dir: &Path, format: OutputFormat) -> Self {
        Self {
            output: out_dir
                .join(page_file_name(page.number, format))
                .display()
                .to_string(),
            files: page
                .placements
                .iter()
                .map(|placement| PlacedFile {
                    file: placement.photo.path.display().to_string(),
                    x: placement.x,
                    y: placement.y,
                    w: placement.w,
                    h: placement.h,
                    aspect_match: placement.aspect_match,
                })
                .collect(),
        }
    }

    /// Smallest canvas that holds every rectangle, as `(width, height)`.
    pub fn page_bounds(&self) -> (u32, u32) {
        self.files.iter().fold((0, 0), |(width, height), file| {
            (
                width.max(file.x.saturating_add(file.w)),
                height.max(file.y.saturating_add(file.h)),
            )
        })
    }

    /// Page size for re-rendering: the bounds plus the right and bottom
    /// margins that the rectangles themselves do not cover.
    pub fn canvas_size(&self, padding: u32, bleed: u32) -> (u32, u32) {
        let (width, height) = self.page_bounds();
        let margin = padding.saturating_add(bleed);
        (width.saturating_add(margin), height.saturating_add(margin))
    }

    /// Rectangles are laid out for the displayed orientation, so the EXIF
    /// orientation is read back from each file.
    pub fn canvas_items(&self) -> Vec<CanvasItem> {
        self.files
            .iter()
            .map(|file| {
                let path = PathBuf::from(&file.file);
                CanvasItem {
                    exif_orientation: MetadataExtractor::read_orientation(&path),
                    path,
                    x: file.x,
                    y: file.y,
                    w: file.w,
                    h: file.h,
                    contain: file.aspect_match,
                }
            })
            .collect()
    }
}

pub fn to_layouts(pages: &[Page], out_dir: &Path, format: OutputFormat) -> Vec<PageLayout> {
    pages
        .iter()
        .map(|page| PageLayout::from_page(page, out_dir, format))
        .collect()
}

pub fn to_json(layouts: &[PageLayout]) -> CollageResult<String> {
    Ok(serde_json::to_string_pretty(layouts)?)
}

pub fn parse_layout(json: &str) -> CollageResult<Vec<PageLayout>> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_layout(path: &Path) -> CollageResult<Vec<PageLayout>> {
    parse_layout(&fs::read_to_string(path)?)
}
