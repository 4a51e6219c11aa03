use std::path::PathBuf;

use thiserror::Error;

/// Errors building the image library.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The configured library path is missing or not a directory.
    #[error("invalid image library directory: {}", .0.display())]
    BadDir(PathBuf),

    /// The scan completed but found no images.
    #[error("no images found in {}", .0.display())]
    EmptyScan(PathBuf),

    /// Neither an explicit list nor a library path yielded any images.
    #[error("image library is empty")]
    Empty,
}

/// Errors loading a single cover image.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("image file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to decode {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
