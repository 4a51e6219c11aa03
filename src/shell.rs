//! Ties image navigation, the palette grid and the animated background together.

use std::time::Instant;

use image::RgbaImage;
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::background::{BackgroundComposer, CrossfadeGradient, Scene, Viewport};
use crate::config::Configuration;
use crate::extract::{ColorExtractor, HistogramExtractor, Quality};
use crate::library::ImageLibrary;
use crate::swatch::{PaletteEntry, PaletteModel};

/// Which way the user navigated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Backward,
    Forward,
}

pub struct AppShell<E = HistogramExtractor, R = StdRng> {
    library: ImageLibrary,
    extractor: E,
    quality: Quality,
    palette: PaletteModel,
    gradient: CrossfadeGradient,
    composer: BackgroundComposer<R>,
    cover: RgbaImage,
}

impl<E: ColorExtractor, R: Rng> AppShell<E, R> {
    pub fn new(
        cfg: &Configuration,
        library: ImageLibrary,
        extractor: E,
        rng: R,
        now: Instant,
    ) -> Self {
        let mut shell = Self {
            library,
            extractor,
            quality: cfg.quality,
            palette: PaletteModel::new(cfg.palette_size),
            gradient: CrossfadeGradient::default(),
            composer: BackgroundComposer::new(&cfg.background, rng, now),
            cover: RgbaImage::new(1, 1),
        };
        shell.show_current(now);
        shell
    }

    /// Starts the background animation clock.
    pub fn mount(&mut self, now: Instant) {
        self.composer.mount(&self.gradient, now);
    }

    /// Stops the background timer; the blobs freeze where they are.
    pub fn unmount(&mut self, now: Instant) {
        self.composer.unmount(now);
    }

    pub fn navigate(&mut self, direction: Navigation, now: Instant) {
        let index = match direction {
            Navigation::Backward => self.library.backward(),
            Navigation::Forward => self.library.forward(),
        };
        debug!(?direction, index, "navigated");
        self.show_current(now);
    }

    pub fn forward(&mut self, now: Instant) {
        self.navigate(Navigation::Forward, now);
    }

    pub fn backward(&mut self, now: Instant) {
        self.navigate(Navigation::Backward, now);
    }

    /// Advances the background timer; returns whether it fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.composer.tick(now)
    }

    /// Fires every timer tick due up to `until`, in order. Used for headless rendering.
    pub fn advance(&mut self, until: Instant) -> usize {
        let mut fired = 0;
        while let Some(due) = self.composer.next_tick()
            && due <= until
        {
            self.composer.tick(due);
            fired += 1;
        }
        fired
    }

    pub fn compose(&self, viewport: Viewport, now: Instant) -> Scene {
        self.composer.compose(&self.gradient, viewport, now)
    }

    fn show_current(&mut self, now: Instant) {
        self.cover = self.library.load_current();
        let name = self.library.current().map(|entry| entry.name.as_str());
        match self
            .palette
            .recompute(&self.cover, self.quality, &self.extractor)
        {
            Some(entries) => {
                info!(image = name, colors = entries.len(), "palette updated");
                self.gradient.set_colors(self.palette.colors());
                self.composer.observe_gradient(&self.gradient, now);
            }
            None => debug!(image = name, "palette left unchanged"),
        }
    }

    pub fn library(&self) -> &ImageLibrary {
        &self.library
    }

    pub fn palette(&self) -> &[PaletteEntry] {
        self.palette.entries()
    }

    pub fn gradient(&self) -> &CrossfadeGradient {
        &self.gradient
    }

    pub fn composer(&self) -> &BackgroundComposer<R> {
        &self.composer
    }

    pub fn cover(&self) -> &RgbaImage {
        &self.cover
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::composer::AnimationPhase;
    use crate::extract::{DominantColor, ExtractError};
    use palette::Srgb;
    use rand::SeedableRng;
    use std::path::PathBuf;

    /// Returns a color derived from the image width so every image differs.
    struct ByWidth;

    impl ColorExtractor for ByWidth {
        fn dominant_colors(
            &self,
            image: &RgbaImage,
            _quality: Quality,
        ) -> Result<Vec<DominantColor>, ExtractError> {
            Ok(vec![DominantColor {
                color: Srgb::new(image.width() as u8, 0, 0),
                frequency: 1.0,
            }])
        }
    }

    fn shell() -> AppShell<ByWidth, StdRng> {
        let library = ImageLibrary::from_paths([PathBuf::from("a.png"), PathBuf::from("b.png")]);
        AppShell::new(
            &Configuration::default(),
            library,
            ByWidth,
            StdRng::seed_from_u64(9),
            Instant::now(),
        )
    }

    #[test]
    fn startup_extracts_first_palette() {
        let shell = shell();
        assert_eq!(shell.palette().len(), 1);
        assert!(!shell.gradient().first_visible());
        assert_eq!(shell.composer().phase(), AnimationPhase::Idle);
    }

    #[test]
    fn each_navigation_flips_the_gradient() {
        let mut shell = shell();
        let now = Instant::now();
        shell.mount(now);
        let before = shell.gradient().first_visible();
        shell.forward(now);
        assert_eq!(shell.library().index(), 1);
        assert_ne!(shell.gradient().first_visible(), before);
        shell.backward(now);
        assert_eq!(shell.library().index(), 0);
        assert_eq!(shell.gradient().first_visible(), before);
    }

    #[test]
    fn unmount_pauses_until_mounted_again() {
        let mut shell = shell();
        let t0 = Instant::now();
        shell.mount(t0);
        shell.unmount(t0 + std::time::Duration::from_secs(1));
        assert_eq!(shell.composer().phase(), AnimationPhase::Idle);
        assert_eq!(shell.advance(t0 + std::time::Duration::from_secs(60)), 0);

        let t1 = t0 + std::time::Duration::from_secs(60);
        shell.mount(t1);
        assert_eq!(shell.composer().next_tick(), Some(t1 + std::time::Duration::from_secs(5)));
    }

    #[test]
    fn advance_fires_each_period() {
        let mut shell = shell();
        let t0 = Instant::now();
        assert_eq!(shell.advance(t0 + std::time::Duration::from_secs(60)), 0);
        shell.mount(t0);
        assert_eq!(shell.advance(t0 + std::time::Duration::from_secs(16)), 3);
        assert_eq!(shell.advance(t0 + std::time::Duration::from_secs(16)), 0);
    }
}
