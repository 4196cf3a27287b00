use log::{info, warn};
use rayon::prelude::*;

use crate::error::CollageResult;
use crate::file_scanner::ImageFile;
use crate::hue;
use crate::metadata_extractor::MetadataExtractor;
use crate::page_assembler::SkippedPhoto;
use crate::photo::{Photo, PhotoQueue};

/// Turns scanned files into a sorted photo queue.
pub struct PhotoLoader {
    harmony: bool,
}

impl PhotoLoader {
    pub fn new(harmony: bool) -> Self {
        Self { harmony }
    }

    /// Read metadata for every file in parallel. Files whose header cannot be
    /// read end up in the skipped list. The queue is ordered by capture date,
    /// or by dominant hue when harmony is on.
    pub fn load(&self, files: &[ImageFile]) -> (PhotoQueue, Vec<SkippedPhoto>) {
        let results: Vec<Result<Photo, SkippedPhoto>> = files
            .par_iter()
            .map(|file| {
                self.load_photo(file).map_err(|e| {
                    warn!("Skipping {}: {}", file.path.display(), e);
                    SkippedPhoto {
                        id: file.path.display().to_string(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect();

        let mut photos = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for result in results {
            match result {
                Ok(photo) => photos.push(photo),
                Err(skip) => skipped.push(skip),
            }
        }

        let mut queue = PhotoQueue::new(photos);
        queue.sort_by_capture_date();
        if self.harmony {
            queue.sort_by_hue();
        }

        info!(
            "Loaded {} photos ({} unreadable)",
            queue.len(),
            skipped.len()
        );
        (queue, skipped)
    }

    fn load_photo(&self, file: &ImageFile) -> CollageResult<Photo> {
        let metadata = MetadataExtractor::extract(&file.path, file.modified)?;

        let hue = if self.harmony {
            hue::dominant_hue_from_path(&file.path).unwrap_or_else(|e| {
                warn!("No hue for {}: {}", file.path.display(), e);
                None
            })
        } else {
            None
        };

        Ok(Photo::new(&file.path, metadata.width, metadata.height)
            .with_taken_at(metadata.taken_at)
            .with_exif_orientation(metadata.orientation)
            .with_hue(hue))
    }
}
