use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

pub const MAX_IMPORTANCE: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    /// Square photos count as landscape.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width >= height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read importance from a file stem ending in `@N`, e.g. `beach@4.jpg`.
/// Values above 5 are clamped, anything else means 0.
pub fn importance_from_filename(path: &Path) -> u8 {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit_once('@'))
        .and_then(|(_, tag)| tag.parse::<u32>().ok())
        .map(|value| value.min(MAX_IMPORTANCE as u32) as u8)
        .unwrap_or(0)
}

/// One queued photo. `width`/`height` are the displayed dimensions, i.e.
/// after EXIF rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub id: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub importance: u8,
    pub orientation: Orientation,
    pub hue: Option<f64>,
    pub taken_at: Option<DateTime<Utc>>,
    pub exif_orientation: Option<u32>,
}

impl Photo {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        let path = path.into();
        Self {
            id: path.display().to_string(),
            importance: importance_from_filename(&path),
            orientation: Orientation::from_dimensions(width, height),
            path,
            width,
            height,
            hue: None,
            taken_at: None,
            exif_orientation: None,
        }
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = importance.min(MAX_IMPORTANCE);
        self
    }

    pub fn with_hue(mut self, hue: Option<f64>) -> Self {
        self.hue = hue;
        self
    }

    pub fn with_taken_at(mut self, taken_at: Option<DateTime<Utc>>) -> Self {
        self.taken_at = taken_at;
        self
    }

    pub fn with_exif_orientation(mut self, exif_orientation: Option<u32>) -> Self {
        self.exif_orientation = exif_orientation;
        self
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }

    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// RGBA bytes needed to hold the decoded image.
    pub fn estimated_decoded_bytes(&self) -> u64 {
        self.width as u64 * self.height as u64 * 4
    }
}

/// Photos waiting for a block. Owns every unassigned photo; a photo leaves
/// the queue exactly once through [`PhotoQueue::take`].
#[derive(Debug, Clone, Default)]
pub struct PhotoQueue {
    photos: Vec<Photo>,
}

impl PhotoQueue {
    pub fn new(photos: Vec<Photo>) -> Self {
        Self { photos }
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    /// Remove the photo at `index` if it is still the one with `expected_id`.
    pub fn take(&mut self, index: usize, expected_id: &str) -> Option<Photo> {
        match self.photos.get(index) {
            Some(photo) if photo.id == expected_id => Some(self.photos.remove(index)),
            _ => None,
        }
    }

    /// Oldest first; undated photos last, ties by path.
    pub fn sort_by_capture_date(&mut self) {
        self.photos.sort_by(|a, b| match (a.taken_at, b.taken_at) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.path.cmp(&b.path)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.path.cmp(&b.path),
        });
    }

    /// Ascending hue; photos without a hue last, in their current order.
    pub fn sort_by_hue(&mut self) {
        self.photos.sort_by(|a, b| match (a.hue, b.hue) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
}
