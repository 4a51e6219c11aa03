//! The palette grid model: the current image's dominant colors as swatches.

use image::RgbaImage;
use palette::Srgb;

use tracing::{debug, warn};

use crate::extract::{ColorExtractor, DominantColor, Quality};

/// Upper bound on palette entries shown in the grid.
pub const MAX_PALETTE_ENTRIES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteEntry {
    /// Position within the current palette; reassigned on every recompute.
    pub id: usize,
    pub color: Srgb<u8>,
    pub frequency: f32,
}

#[derive(Debug, Clone)]
pub struct PaletteModel {
    entries: Vec<PaletteEntry>,
    capacity: usize,
}

impl Default for PaletteModel {
    fn default() -> Self {
        Self::new(MAX_PALETTE_ENTRIES)
    }
}

impl PaletteModel {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.clamp(1, MAX_PALETTE_ENTRIES),
        }
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn colors(&self) -> Vec<Srgb<u8>> {
        self.entries.iter().map(|entry| entry.color).collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Re-extracts the palette from `image`.
    ///
    /// On failure the previous palette is kept and `None` is returned.
    pub fn recompute<E>(
        &mut self,
        image: &RgbaImage,
        quality: Quality,
        extractor: &E,
    ) -> Option<&[PaletteEntry]>
    where
        E: ColorExtractor + ?Sized,
    {
        match extractor.dominant_colors(image, quality) {
            Ok(dominant) => {
                self.replace(dominant);
                debug!(entries = self.entries.len(), %quality, "palette recomputed");
                Some(&self.entries)
            }
            Err(err) => {
                warn!(error = %err, "color extraction failed; keeping previous palette");
                None
            }
        }
    }

    fn replace(&mut self, dominant: Vec<DominantColor>) {
        self.entries = dominant
            .into_iter()
            .take(self.capacity)
            .enumerate()
            .map(|(id, color)| PaletteEntry {
                id,
                color: color.color,
                frequency: color.frequency,
            })
            .collect();
    }
}
