use std::ops::{Range, RangeInclusive};

use rand::Rng;

use super::tween::Lerp;

pub const DEFAULT_BLOB_COUNT: usize = 3;

pub const SIZE_DELTA_RANGE: RangeInclusive<f32> = -100.0..=300.0;
pub const SCALE_RANGE: RangeInclusive<f32> = 1.0..=2.5;
pub const ROTATION_RANGE: Range<f32> = 0.0..360.0;
pub const OFFSET_RANGE: RangeInclusive<f32> = -300.0..=300.0;
pub const SATURATION_RANGE: RangeInclusive<f32> = 0.4..=1.4;

/// Geometry and tint of one decorative capsule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    /// Added to the square base size derived from the viewport.
    pub size_delta: (f32, f32),
    pub scale: f32,
    pub rotation_degrees: f32,
    pub offset: (f32, f32),
    pub saturation: f32,
}

impl Blob {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            size_delta: (
                rng.random_range(SIZE_DELTA_RANGE),
                rng.random_range(SIZE_DELTA_RANGE),
            ),
            scale: rng.random_range(SCALE_RANGE),
            rotation_degrees: rng.random_range(ROTATION_RANGE),
            offset: (
                rng.random_range(OFFSET_RANGE),
                rng.random_range(OFFSET_RANGE),
            ),
            saturation: rng.random_range(SATURATION_RANGE),
        }
    }
}

impl Lerp for Blob {
    fn lerp(self, to: Self, t: f32) -> Self {
        Self {
            size_delta: self.size_delta.lerp(to.size_delta, t),
            scale: self.scale.lerp(to.scale, t),
            rotation_degrees: self.rotation_degrees.lerp(to.rotation_degrees, t),
            offset: self.offset.lerp(to.offset, t),
            saturation: self.saturation.lerp(to.saturation, t),
        }
    }
}

/// A full set of blobs; always regenerated as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobLayout {
    blobs: Vec<Blob>,
}

impl BlobLayout {
    pub fn random<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Self {
        Self {
            blobs: (0..count).map(|_| Blob::random(rng)).collect(),
        }
    }

    pub fn blobs(&self) -> &[Blob] {
        &self.blobs
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn layout_has_requested_count() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(BlobLayout::random(&mut rng, DEFAULT_BLOB_COUNT).len(), 3);
        assert!(BlobLayout::random(&mut rng, 0).is_empty());
    }

    #[test]
    fn same_seed_same_layout() {
        let a = BlobLayout::random(&mut StdRng::seed_from_u64(11), 3);
        let b = BlobLayout::random(&mut StdRng::seed_from_u64(11), 3);
        assert_eq!(a, b);
    }

    #[test]
    fn consecutive_layouts_differ() {
        let mut rng = StdRng::seed_from_u64(5);
        let a = BlobLayout::random(&mut rng, 3);
        let b = BlobLayout::random(&mut rng, 3);
        assert_ne!(a, b);
    }

    #[test]
    fn lerp_halfway() {
        let a = Blob {
            size_delta: (0.0, 0.0),
            scale: 1.0,
            rotation_degrees: 0.0,
            offset: (-100.0, 100.0),
            saturation: 0.4,
        };
        let b = Blob {
            size_delta: (200.0, 100.0),
            scale: 2.0,
            rotation_degrees: 90.0,
            offset: (100.0, -100.0),
            saturation: 1.4,
        };
        let mid = a.lerp(b, 0.5);
        assert_eq!(mid.size_delta, (100.0, 50.0));
        assert!((mid.scale - 1.5).abs() < 1e-6);
        assert!((mid.rotation_degrees - 45.0).abs() < 1e-6);
        assert_eq!(mid.offset, (0.0, 0.0));
        assert!((mid.saturation - 0.9).abs() < 1e-6);
    }
}
