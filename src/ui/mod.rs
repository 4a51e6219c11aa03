//! Frame composition: rasterized background plus the cover, buttons and palette grid.

pub mod draw;
pub mod font;
pub mod layout;

use std::time::Instant;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::RgbaImage;
use rand::Rng;
use tracing::debug;

use crate::background::Viewport;
use crate::background::raster::{Rasterizer, to_rgba8};
use crate::extract::ColorExtractor;
use crate::shell::AppShell;
use crate::swatch::PaletteEntry;
use draw::{Color, Frame, Rect, fit_image, fit_size, measure_text};
use layout::{
    COVER_CORNER_RADIUS, FREQUENCY_TEXT_SIZE, Layout, STROKE_WIDTH, SWATCH_CORNER_RADIUS,
};

const COVER_BACKGROUND: Color = Color::from_rgb(0xD1D1D6);
const STROKE: Color = Color::from_rgb(0xC7C7CC);
const FREQUENCY_LABEL: Color = Color::from_rgb(0x34C759);
const BUTTON_ICON: Color = Color::from_rgb(0x000000);

/// The cover resampled for the current layout, reused until the image or size changes.
struct FittedCover {
    index: usize,
    source: (u32, u32),
    image: RgbaImage,
}

pub struct Renderer {
    font: Option<FontArc>,
    render_scale: f32,
    cover: Option<FittedCover>,
}

impl Renderer {
    /// Without a font the frequency labels are skipped.
    pub fn new(font: Option<FontArc>, render_scale: f32) -> Self {
        Self {
            font,
            render_scale,
            cover: None,
        }
    }

    /// Renders one complete frame of `width` × `height` physical pixels.
    pub fn render<E: ColorExtractor, R: Rng>(
        &mut self,
        shell: &AppShell<E, R>,
        width: u32,
        height: u32,
        scale_factor: f32,
        now: Instant,
    ) -> Frame {
        let layout = Layout::for_surface(width, scale_factor);
        let viewport = Viewport::new(width as f32 / layout.scale, height as f32 / layout.scale);
        let scene = shell.compose(viewport, now);
        let canvas = Rasterizer::new(self.render_scale * layout.scale).render(&scene);

        let mut frame = Frame::new(width, height);
        frame.fill_with_image(&to_rgba8(&canvas));
        self.draw_cover(&mut frame, &layout, shell.library().index(), shell.cover());
        draw_buttons(&mut frame, &layout);
        self.draw_palette(&mut frame, &layout, shell.palette());
        frame
    }

    fn draw_cover(&mut self, frame: &mut Frame, layout: &Layout, index: usize, cover: &RgbaImage) {
        let radius = COVER_CORNER_RADIUS * layout.scale;
        frame.fill_rounded_rect(layout.cover, radius, COVER_BACKGROUND);
        if let Some(fitted) = self.fitted_cover(index, cover, layout.cover) {
            frame.draw_image_centered(fitted, layout.cover, radius);
        }
        frame.stroke_rounded_rect(layout.cover, radius, STROKE_WIDTH * layout.scale, STROKE);
    }

    fn fitted_cover(&mut self, index: usize, cover: &RgbaImage, rect: Rect) -> Option<&RgbaImage> {
        let source = cover.dimensions();
        let size = fit_size(source, rect)?;
        let stale = self.cover.as_ref().is_none_or(|cached| {
            cached.index != index || cached.source != source || cached.image.dimensions() != size
        });
        if stale {
            debug!(index, width = size.0, height = size.1, "resampling cover");
            self.cover = fit_image(cover, rect).map(|image| FittedCover {
                index,
                source,
                image,
            });
        }
        self.cover.as_ref().map(|cached| &cached.image)
    }

    fn draw_palette(&self, frame: &mut Frame, layout: &Layout, palette: &[PaletteEntry]) {
        let radius = SWATCH_CORNER_RADIUS * layout.scale;
        for entry in palette {
            let rect = layout.swatch(entry.id);
            frame.fill_rounded_rect(rect, radius, Color::from_srgb(entry.color));
            frame.stroke_rounded_rect(rect, radius, STROKE_WIDTH * layout.scale, STROKE);
            if let Some(font) = self.font.as_ref() {
                draw_centered_label(frame, font, &frequency_label(entry.frequency), rect, layout.scale);
            }
        }
    }
}

pub fn frequency_label(frequency: f32) -> String {
    format!("{frequency:.3}")
}

fn draw_centered_label(frame: &mut Frame, font: &FontArc, text: &str, rect: Rect, scale: f32) {
    let px = PxScale::from(FREQUENCY_TEXT_SIZE * scale);
    let scaled = font.as_scaled(px);
    let (cx, cy) = rect.center();
    let left = cx - measure_text(text, font, px) * 0.5;
    let baseline = cy + (scaled.ascent() + scaled.descent()) * 0.5;
    frame.draw_text(font, text, FREQUENCY_LABEL, left, baseline, px);
}

/// Two filled triangles per button, pointing the way the button navigates.
fn draw_buttons(frame: &mut Frame, layout: &Layout) {
    for (rect, direction) in [(layout.backward, -1.0f32), (layout.forward, 1.0f32)] {
        let (cx, cy) = rect.center();
        let tri_w = rect.width() * 0.36;
        let half_h = rect.height() * 0.22;
        for step in [-1.0f32, 0.0] {
            let base = cx + direction * step * tri_w;
            let tip = base + direction * tri_w;
            frame.fill_triangle(
                [(base, cy - half_h), (tip, cy), (base, cy + half_h)],
                BUTTON_ICON,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::extract::HistogramExtractor;
    use crate::library::ImageLibrary;
    use image::Rgba;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn labels_show_three_decimals() {
        assert_eq!(frequency_label(0.3), "0.300");
        assert_eq!(frequency_label(0.08125), "0.081");
    }

    #[test]
    fn cover_is_resampled_once_per_image_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let large = dir.path().join("large.png");
        let wide = dir.path().join("wide.png");
        RgbaImage::from_pixel(600, 600, Rgba([200, 30, 30, 255]))
            .save(&large)
            .unwrap();
        RgbaImage::from_pixel(400, 200, Rgba([30, 30, 200, 255]))
            .save(&wide)
            .unwrap();
        let now = Instant::now();
        let mut shell = AppShell::new(
            &Configuration::default(),
            ImageLibrary::from_paths([large, wide]),
            HistogramExtractor,
            StdRng::seed_from_u64(3),
            now,
        );
        let mut renderer = Renderer::new(None, 0.1);
        let cached = |r: &Renderer| r.cover.as_ref().map(|c| (c.index, c.image.dimensions(), c.image.as_raw().as_ptr()));

        renderer.render(&shell, 430, 520, 1.0, now);
        let first = cached(&renderer).unwrap();
        assert_eq!((first.0, first.1), (0, (200, 200)));

        renderer.render(&shell, 430, 520, 1.0, now);
        assert_eq!(cached(&renderer), Some(first));

        shell.forward(now);
        renderer.render(&shell, 430, 520, 1.0, now);
        let (index, size, _) = cached(&renderer).unwrap();
        assert_eq!((index, size), (1, (200, 100)));

        renderer.render(&shell, 860, 1040, 2.0, now);
        assert_eq!(cached(&renderer).unwrap().1, (400, 200));
    }

    #[test]
    fn buttons_are_drawn_inside_their_rects() {
        let layout = Layout::for_surface(430, 1.0);
        let mut frame = Frame::new(430, 500);
        frame.fill_rect(Rect::from_origin(0.0, 0.0, 430.0, 500.0), Color::from_rgb(0xFFFFFF));
        draw_buttons(&mut frame, &layout);
        let (cx, cy) = layout.forward.center();
        assert_eq!(frame.pixel(cx as u32, cy as u32), Some(0xFF00_0000));
        assert_eq!(frame.pixel(5, 5), Some(0xFFFF_FFFF));
    }
}
