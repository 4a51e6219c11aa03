use std::cell::Cell;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use cover_glow::background::CrossfadeGradient;
use cover_glow::config::Configuration;
use cover_glow::extract::{ColorExtractor, DominantColor, ExtractError, HistogramExtractor, Quality};
use cover_glow::library::ImageLibrary;
use cover_glow::shell::AppShell;
use cover_glow::swatch::PaletteModel;
use image::{Rgba, RgbaImage};
use palette::Srgb;
use rand::SeedableRng;
use rand::rngs::StdRng;

const SEVEN: [f32; 7] = [0.3, 0.25, 0.2, 0.1, 0.08, 0.05, 0.02];

struct Scripted(Vec<DominantColor>);

impl ColorExtractor for Scripted {
    fn dominant_colors(
        &self,
        _image: &RgbaImage,
        _quality: Quality,
    ) -> Result<Vec<DominantColor>, ExtractError> {
        Ok(self.0.clone())
    }
}

/// Succeeds on the first call only.
struct FailsAfterFirst {
    calls: Cell<usize>,
}

impl ColorExtractor for FailsAfterFirst {
    fn dominant_colors(
        &self,
        _image: &RgbaImage,
        _quality: Quality,
    ) -> Result<Vec<DominantColor>, ExtractError> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if call == 0 {
            Ok(vec![DominantColor {
                color: Srgb::new(200, 40, 40),
                frequency: 1.0,
            }])
        } else {
            Err(ExtractError::NoOpaquePixels)
        }
    }
}

fn seven_colors() -> Vec<DominantColor> {
    SEVEN
        .iter()
        .enumerate()
        .map(|(i, &frequency)| DominantColor {
            color: Srgb::new(i as u8 * 30, 0, 0),
            frequency,
        })
        .collect()
}

#[test]
fn keeps_first_five_of_seven() {
    let mut model = PaletteModel::default();
    let entries = model
        .recompute(&RgbaImage::new(4, 4), Quality::High, &Scripted(seven_colors()))
        .unwrap();

    let ids: Vec<usize> = entries.iter().map(|e| e.id).collect();
    let freqs: Vec<f32> = entries.iter().map(|e| e.frequency).collect();
    assert_eq!(ids, [0, 1, 2, 3, 4]);
    assert_eq!(freqs, [0.3, 0.25, 0.2, 0.1, 0.08]);
}

#[test]
fn truncation_is_min_of_count_and_five() {
    for m in 0..=8 {
        let colors: Vec<DominantColor> = (0..m)
            .map(|i| DominantColor {
                color: Srgb::new(i as u8, i as u8, 0),
                frequency: 1.0 / 8.0,
            })
            .collect();
        let mut model = PaletteModel::default();
        let entries = model
            .recompute(&RgbaImage::new(1, 1), Quality::Low, &Scripted(colors.clone()))
            .unwrap();
        assert_eq!(entries.len(), m.min(5));
        for (entry, color) in entries.iter().zip(&colors) {
            assert_eq!(entry.color, color.color);
        }
    }
}

#[test]
fn failing_extractor_leaves_palette_and_gradient_alone() {
    let lib = ImageLibrary::from_paths([PathBuf::from("a.png"), PathBuf::from("b.png")]);
    let t0 = Instant::now();
    let mut shell = AppShell::new(
        &Configuration::default(),
        lib,
        FailsAfterFirst { calls: Cell::new(0) },
        StdRng::seed_from_u64(1),
        t0,
    );
    shell.mount(t0);
    let palette_before = shell.palette().to_vec();
    let gradient_before = shell.gradient().clone();
    let later = t0 + Duration::from_secs(10);
    let opacity_before = shell.composer().first_opacity(later);

    shell.forward(t0 + Duration::from_secs(1));

    assert_eq!(shell.library().index(), 1);
    assert_eq!(shell.palette(), palette_before.as_slice());
    assert_eq!(shell.gradient(), &gradient_before);
    assert_eq!(shell.composer().first_opacity(later), opacity_before);
}

#[test]
fn crossfade_never_touches_the_visible_slot() {
    let mut gradient = CrossfadeGradient::new(vec![Srgb::new(1, 2, 3)]);
    for round in 0..6u8 {
        let visible = gradient.colors().to_vec();
        let was_first = gradient.first_visible();
        gradient.set_colors(vec![Srgb::new(round, round, round)]);

        assert_ne!(gradient.first_visible(), was_first);
        let outgoing = if was_first { gradient.first() } else { gradient.second() };
        assert_eq!(outgoing, visible.as_slice());
        assert_eq!(gradient.colors(), &[Srgb::new(round, round, round)]);
    }
}

#[test]
fn histogram_extractor_feeds_the_palette() {
    let image = RgbaImage::from_fn(10, 10, |x, _| {
        if x < 7 {
            Rgba([250, 250, 250, 255])
        } else {
            Rgba([5, 5, 5, 255])
        }
    });
    let mut model = PaletteModel::default();
    let entries = model
        .recompute(&image, Quality::Best, &HistogramExtractor)
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].color, Srgb::new(250, 250, 250));
    assert!((entries[0].frequency - 0.7).abs() < 1e-6);
    assert!((entries[1].frequency - 0.3).abs() < 1e-6);
}
