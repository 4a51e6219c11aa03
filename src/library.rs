//! The navigable set of cover images.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::Configuration;
use crate::error::{LibraryError, LoadError};

const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Return `true` if `path` has a decodable image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.iter().any(|e| *e == ext)
        })
}

/// Recursively collects supported images below `root`, sorted by path.
///
/// # Errors
/// Returns [`LibraryError::BadDir`] if `root` is missing or not a directory.
pub fn scan_directory(root: &Path) -> Result<Vec<PathBuf>, LibraryError> {
    if !root.is_dir() {
        return Err(LibraryError::BadDir(root.to_path_buf()));
    }

    let mut out: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !should_skip_dir(e))
        .flatten()
        .filter(|entry| entry.file_type().is_file() && is_supported_image(entry.path()))
        .map(DirEntry::into_path)
        .collect();
    out.sort();
    debug!(root = %root.display(), found = out.len(), "scanned image library");
    Ok(out)
}

fn should_skip_dir(entry: &DirEntry) -> bool {
    // The root itself may be a dot-dir (temp dirs often are).
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// Display name, the file stem.
    pub name: String,
    pub path: PathBuf,
}

impl ImageEntry {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }
}

/// Ordered images plus the index of the one on screen.
///
/// Navigation wraps in both directions and is a no-op on an empty library.
#[derive(Debug, Clone, Default)]
pub struct ImageLibrary {
    entries: Vec<ImageEntry>,
    index: usize,
}

impl ImageLibrary {
    pub fn new(entries: Vec<ImageEntry>) -> Self {
        Self { entries, index: 0 }
    }

    pub fn from_paths<I: IntoIterator<Item = PathBuf>>(paths: I) -> Self {
        Self::new(paths.into_iter().map(ImageEntry::new).collect())
    }

    /// Uses the explicit `images` list if present, otherwise scans the library path.
    pub fn from_config(cfg: &Configuration) -> Result<Self, LibraryError> {
        let paths = if !cfg.images.is_empty() {
            cfg.images.clone()
        } else if let Some(root) = cfg.image_library_path.as_deref() {
            let found = scan_directory(root)?;
            if found.is_empty() {
                return Err(LibraryError::EmptyScan(root.to_path_buf()));
            }
            found
        } else {
            return Err(LibraryError::Empty);
        };

        let mut library = Self::from_paths(paths);
        library.set_index(cfg.start_index);
        info!(images = library.len(), start = library.index(), "image library ready");
        Ok(library)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    pub fn current(&self) -> Option<&ImageEntry> {
        self.entries.get(self.index)
    }

    /// Sets the index modulo the library length.
    pub fn set_index(&mut self, index: usize) {
        if !self.is_empty() {
            self.index = index % self.len();
        }
    }

    pub fn forward(&mut self) -> usize {
        if !self.is_empty() {
            self.index = (self.index + 1) % self.len();
        }
        self.index
    }

    pub fn backward(&mut self) -> usize {
        if !self.is_empty() {
            self.index = (self.index + self.len() - 1) % self.len();
        }
        self.index
    }

    /// Decodes the current image, or a 1×1 transparent placeholder on failure.
    pub fn load_current(&self) -> RgbaImage {
        match self.current() {
            Some(entry) => load_or_placeholder(&entry.path),
            None => placeholder(),
        }
    }
}

/// Decodes `path` into sRGB RGBA8.
pub fn load_image(path: &Path) -> Result<RgbaImage, LoadError> {
    if !path.is_file() {
        return Err(LoadError::Missing(path.to_path_buf()));
    }
    let decoded = image::open(path).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.to_rgba8())
}

pub fn load_or_placeholder(path: &Path) -> RgbaImage {
    match load_image(path) {
        Ok(image) => image,
        Err(err) => {
            warn!(error = %err, "image unavailable; using placeholder");
            placeholder()
        }
    }
}

pub fn placeholder() -> RgbaImage {
    RgbaImage::new(1, 1)
}
