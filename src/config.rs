use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::background::blobs::DEFAULT_BLOB_COUNT;
use crate::background::tween::{Easing, Motion};
use crate::extract::Quality;
use crate::swatch::MAX_PALETTE_ENTRIES;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Directory scanned for cover art when `images` is empty.
    pub image_library_path: Option<PathBuf>,
    /// Explicit, ordered list of images. Takes precedence over the library path.
    pub images: Vec<PathBuf>,
    /// Extraction quality for the dominant colors.
    pub quality: Quality,
    /// Number of palette entries shown and fed to the gradient.
    pub palette_size: usize,
    /// Index of the image shown at startup; wraps around the library.
    pub start_index: usize,
    pub background: BackgroundConfig,
    pub window: WindowConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            image_library_path: None,
            images: Vec::new(),
            quality: Quality::default(),
            palette_size: MAX_PALETTE_ENTRIES,
            start_index: 0,
            background: BackgroundConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct BackgroundConfig {
    /// Period of the timer that re-randomizes the blobs and the backdrop angle.
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    /// Playback speed of the blob transition; 0.1 stretches it tenfold.
    pub tick_speed: f32,
    /// Base duration of the palette crossfade.
    #[serde(with = "humantime_serde")]
    pub crossfade_duration: Duration,
    /// Playback speed of the palette crossfade.
    pub crossfade_speed: f32,
    pub blob_count: usize,
    /// Background raster resolution relative to the window (1.0 = native).
    pub render_scale: f32,
    /// Minimum time between background redraws while animating.
    #[serde(with = "humantime_serde")]
    pub frame_interval: Duration,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            tick_speed: 0.1,
            crossfade_duration: Duration::from_millis(350),
            crossfade_speed: 0.2,
            blob_count: DEFAULT_BLOB_COUNT,
            render_scale: 0.25,
            frame_interval: Duration::from_millis(33),
        }
    }
}

impl BackgroundConfig {
    /// Blob and angle transitions last one tick period, eased and slowed down.
    pub fn layout_motion(&self) -> Motion {
        Motion {
            duration: self.tick_interval,
            easing: Easing::EaseInOut,
            speed: self.tick_speed,
        }
    }

    pub fn crossfade_motion(&self) -> Motion {
        Motion {
            duration: self.crossfade_duration,
            easing: Easing::Linear,
            speed: self.crossfade_speed,
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.tick_interval.is_zero(),
            "background.tick-interval must be greater than zero"
        );
        ensure!(
            self.tick_speed.is_finite() && self.tick_speed > 0.0,
            "background.tick-speed must be positive"
        );
        ensure!(
            self.crossfade_speed.is_finite() && self.crossfade_speed > 0.0,
            "background.crossfade-speed must be positive"
        );
        ensure!(self.blob_count >= 1, "background.blob-count must be at least 1");
        ensure!(
            self.render_scale.is_finite() && self.render_scale > 0.0 && self.render_scale <= 1.0,
            "background.render-scale must be in (0, 1]"
        );
        ensure!(
            !self.frame_interval.is_zero(),
            "background.frame-interval must be greater than zero"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Cover Glow".to_string(),
            width: 430,
            height: 860,
            fullscreen: false,
        }
    }
}

impl Configuration {
    /// Reads a YAML file; relative image paths are resolved against its directory.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut cfg: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if let Some(base) = path.parent() {
            cfg.rebase_paths(base);
        }
        Ok(cfg)
    }

    pub fn validated(self) -> Result<Self> {
        ensure!(
            (1..=MAX_PALETTE_ENTRIES).contains(&self.palette_size),
            "palette-size must be between 1 and {MAX_PALETTE_ENTRIES}"
        );
        ensure!(
            !self.images.is_empty() || self.image_library_path.is_some(),
            "either images or image-library-path must be configured"
        );
        ensure!(
            self.window.width > 0 && self.window.height > 0,
            "window size must be non-zero"
        );
        self.background.validate()?;
        Ok(self)
    }

    fn rebase_paths(&mut self, base: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(library) = self.image_library_path.as_mut() {
            rebase(library);
        }
        self.images.iter_mut().for_each(rebase);
    }
}
