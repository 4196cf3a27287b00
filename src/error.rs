#[derive(Debug, thiserror::Error)]
pub enum CollageError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Block {index} at ({x},{y}) spanning {w}x{h} does not fit a {cols}x{rows} grid")]
    BlockOutOfBounds {
        index: usize,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        cols: usize,
        rows: usize,
    },
    #[error("No photos to arrange")]
    EmptyQueue,
    #[error("Page {0} did not consume any photo")]
    NoProgress(usize),
    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type CollageResult<T> = Result<T, CollageError>;
