use chrono::{DateTime, Utc};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ImageFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

pub struct FileScanner {
    input_paths: Vec<PathBuf>,
}

impl FileScanner {
    pub fn new(input_paths: Vec<PathBuf>) -> Self {
        Self { input_paths }
    }

    pub fn scan(&self) -> Vec<ImageFile> {
        let mut files = Vec::new();

        for root_path in &self.input_paths {
            if !root_path.exists() {
                warn!("Input directory does not exist: {}", root_path.display());
                continue;
            }

            info!("Scanning directory: {}", root_path.display());

            Self::walk_directory(root_path, &mut files);
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        info!("Found {} images", files.len());
        files
    }

    /// Recursively walk a directory and collect image files
    fn walk_directory(dir: &Path, files: &mut Vec<ImageFile>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read directory {}: {}", dir.display(), e);
                return;
            }
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();

            if path.is_dir() {
                Self::walk_directory(&path, files);
            } else if path.is_file() && Self::is_supported_file(&path) {
                if let Ok(metadata) = fs::metadata(&path) {
                    files.push(ImageFile {
                        size: metadata.len(),
                        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                        path,
                    });
                }
            }
        }
    }

    fn is_supported_file(path: &Path) -> bool {
        let supported_extensions = ["jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff", "gif"];

        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| supported_extensions.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}
