//! Dominant-color extraction.
//!
//! The rest of the crate only talks to [`ColorExtractor`]; the bundled
//! [`HistogramExtractor`] is a quantized-bucket counter, good enough to drive
//! the palette grid and the background gradient.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use image::{RgbaImage, imageops};
use palette::Srgb;
use serde::Deserialize;
use thiserror::Error;

/// Pixels with less alpha than this are ignored when counting.
const MIN_ALPHA: u8 = 16;

/// Trades extraction accuracy for latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Quality {
    Low,
    Fair,
    #[default]
    High,
    Best,
}

impl Quality {
    /// Longest edge the bitmap is downscaled to before sampling; `None` samples every pixel.
    pub const fn sample_edge(self) -> Option<u32> {
        match self {
            Self::Low => Some(50),
            Self::Fair => Some(100),
            Self::High => Some(250),
            Self::Best => None,
        }
    }

    /// Bits kept per channel when bucketing colors.
    pub const fn bucket_bits(self) -> u8 {
        match self {
            Self::Low | Self::Fair => 4,
            Self::High | Self::Best => 5,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Fair => "fair",
            Self::High => "high",
            Self::Best => "best",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted color and the fraction of sampled pixels it represents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DominantColor {
    pub color: Srgb<u8>,
    pub frequency: f32,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    #[error("image has no pixels")]
    EmptyImage,
    #[error("image has no opaque pixels")]
    NoOpaquePixels,
}

/// Returns the dominant colors of an sRGB bitmap, most frequent first.
///
/// Frequencies sum to at most 1.0. Callers decide how many entries to keep.
pub trait ColorExtractor {
    fn dominant_colors(
        &self,
        image: &RgbaImage,
        quality: Quality,
    ) -> Result<Vec<DominantColor>, ExtractError>;
}

impl<E: ColorExtractor + ?Sized> ColorExtractor for &E {
    fn dominant_colors(
        &self,
        image: &RgbaImage,
        quality: Quality,
    ) -> Result<Vec<DominantColor>, ExtractError> {
        (**self).dominant_colors(image, quality)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HistogramExtractor;

#[derive(Debug, Default)]
struct Bucket {
    count: u64,
    sum: [u64; 3],
}

impl Bucket {
    fn mean(&self) -> Srgb<u8> {
        let n = self.count.max(1);
        let channel = |sum: u64| ((sum + n / 2) / n).min(255) as u8;
        Srgb::new(channel(self.sum[0]), channel(self.sum[1]), channel(self.sum[2]))
    }
}

impl ColorExtractor for HistogramExtractor {
    fn dominant_colors(
        &self,
        image: &RgbaImage,
        quality: Quality,
    ) -> Result<Vec<DominantColor>, ExtractError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ExtractError::EmptyImage);
        }

        let sampled = downsample(image, quality.sample_edge());
        let bits = quality.bucket_bits();
        let shift = 8 - bits;

        let mut buckets: HashMap<u32, Bucket> = HashMap::new();
        let mut total = 0u64;
        for pixel in sampled.pixels() {
            let [r, g, b, a] = pixel.0;
            if a < MIN_ALPHA {
                continue;
            }
            let key = (u32::from(r >> shift) << (2 * bits))
                | (u32::from(g >> shift) << bits)
                | u32::from(b >> shift);
            let bucket = buckets.entry(key).or_default();
            bucket.count += 1;
            bucket.sum[0] += u64::from(r);
            bucket.sum[1] += u64::from(g);
            bucket.sum[2] += u64::from(b);
            total += 1;
        }

        if total == 0 {
            return Err(ExtractError::NoOpaquePixels);
        }

        let mut ranked: Vec<(u32, Bucket)> = buckets.into_iter().collect();
        ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count).then(a.0.cmp(&b.0)));

        Ok(ranked
            .into_iter()
            .map(|(_, bucket)| DominantColor {
                color: bucket.mean(),
                frequency: bucket.count as f32 / total as f32,
            })
            .collect())
    }
}

fn downsample(image: &RgbaImage, max_edge: Option<u32>) -> Cow<'_, RgbaImage> {
    let Some(max_edge) = max_edge else {
        return Cow::Borrowed(image);
    };
    let (w, h) = image.dimensions();
    let longest = w.max(h);
    if longest <= max_edge {
        return Cow::Borrowed(image);
    }
    let scale = max_edge as f32 / longest as f32;
    let new_w = ((w as f32) * scale).round().max(1.0) as u32;
    let new_h = ((h as f32) * scale).round().max(1.0) as u32;
    Cow::Owned(imageops::resize(
        image,
        new_w,
        new_h,
        imageops::FilterType::Triangle,
    ))
}
