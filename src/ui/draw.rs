//! Software drawing into a `0RGB` `u32` buffer, the format `softbuffer` presents.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::{RgbaImage, imageops};
use palette::Srgb;

use crate::background::raster::rounded_rect_distance;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn from_rgb(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self { r, g, b, a: 1.0 }
    }

    pub fn from_srgb(color: Srgb<u8>) -> Self {
        Self::from_rgb(
            (u32::from(color.red) << 16) | (u32::from(color.green) << 8) | u32::from(color.blue),
        )
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha.clamp(0.0, 1.0);
        self
    }

    fn rgb(self) -> (f32, f32, f32) {
        (self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn from_origin(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// An owned frame of packed pixels.
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Frame {
    /// An opaque black frame.
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            pixels: vec![0xFF00_0000; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Stretches a straight-alpha image over the whole frame, composited over black.
    pub fn fill_with_image(&mut self, image: &RgbaImage) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let scaled;
        let source = if image.dimensions() == (self.width, self.height) {
            image
        } else {
            scaled = imageops::resize(image, self.width, self.height, imageops::FilterType::Triangle);
            &scaled
        };
        for (dst, px) in self.pixels.iter_mut().zip(source.pixels()) {
            let [r, g, b, a] = px.0;
            let a = f32::from(a) / 255.0;
            let channel = |c: u8| f32::from(c) / 255.0 * a;
            *dst = pack_color((channel(r), channel(g), channel(b)));
        }
    }

    /// Draws an already fitted `image` centered in `rect`, clipped to rounded corners.
    pub fn draw_image_centered(&mut self, image: &RgbaImage, rect: Rect, radius: f32) {
        let (iw, ih) = image.dimensions();
        if iw == 0 || ih == 0 || rect.width() < 1.0 || rect.height() < 1.0 {
            return;
        }
        let left = rect.left + (rect.width() - iw as f32) * 0.5;
        let top = rect.top + (rect.height() - ih as f32) * 0.5;

        for (x, y, px) in image.enumerate_pixels() {
            let fx = left + x as f32;
            let fy = top + y as f32;
            let clip = rounded_rect_coverage(rect, radius, fx + 0.5, fy + 0.5);
            let [r, g, b, a] = px.0;
            let color = Color::from_rgb((u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b))
                .with_alpha(f32::from(a) / 255.0);
            self.blend_pixel(fx, fy, color, clip);
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let (x0, y0, x1, y1) = self.clamp_bounds(rect);
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_pixel(x as f32, y as f32, color, 1.0);
            }
        }
    }

    pub fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        let (x0, y0, x1, y1) = self.clamp_bounds(rect);
        for y in y0..y1 {
            for x in x0..x1 {
                let coverage = rounded_rect_coverage(rect, radius, x as f32 + 0.5, y as f32 + 0.5);
                self.blend_pixel(x as f32, y as f32, color, coverage);
            }
        }
    }

    /// Strokes the outline of a rounded rect, centered on its edge.
    pub fn stroke_rounded_rect(&mut self, rect: Rect, radius: f32, line_width: f32, color: Color) {
        let half = line_width * 0.5;
        let outer = Rect {
            left: rect.left - half - 1.0,
            top: rect.top - half - 1.0,
            right: rect.right + half + 1.0,
            bottom: rect.bottom + half + 1.0,
        };
        let (x0, y0, x1, y1) = self.clamp_bounds(outer);
        for y in y0..y1 {
            for x in x0..x1 {
                let dist = rect_distance(rect, radius, x as f32 + 0.5, y as f32 + 0.5);
                let coverage = (half + 0.5 - dist.abs()).clamp(0.0, 1.0);
                self.blend_pixel(x as f32, y as f32, color, coverage);
            }
        }
    }

    pub fn fill_triangle(&mut self, points: [(f32, f32); 3], color: Color) {
        let [a, b, c] = points;
        let bounds = Rect {
            left: a.0.min(b.0).min(c.0),
            top: a.1.min(b.1).min(c.1),
            right: a.0.max(b.0).max(c.0),
            bottom: a.1.max(b.1).max(c.1),
        };
        let edge = |p: (f32, f32), q: (f32, f32), x: f32, y: f32| {
            (q.0 - p.0) * (y - p.1) - (q.1 - p.1) * (x - p.0)
        };
        let area = edge(a, b, c.0, c.1);
        if area.abs() <= f32::EPSILON {
            return;
        }
        let (x0, y0, x1, y1) = self.clamp_bounds(bounds);
        for y in y0..y1 {
            for x in x0..x1 {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b, c, px, py) * area.signum();
                let w1 = edge(c, a, px, py) * area.signum();
                let w2 = edge(a, b, px, py) * area.signum();
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.blend_pixel(x as f32, y as f32, color, 1.0);
                }
            }
        }
    }

    pub fn draw_text(
        &mut self,
        font: &FontArc,
        text: &str,
        color: Color,
        left: f32,
        baseline: f32,
        scale: PxScale,
    ) {
        let scaled = font.as_scaled(scale);
        let mut cursor_x = left;
        let mut previous = None;
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let glyph = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                cursor_x += scaled.kern(prev, glyph);
            }
            let advance = scaled.h_advance(glyph);
            let mut positioned = scaled.scaled_glyph(ch);
            positioned.position = point(cursor_x, baseline);
            if let Some(outline) = font.outline_glyph(positioned) {
                let bounds = outline.px_bounds();
                outline.draw(|x, y, coverage| {
                    self.blend_pixel(
                        bounds.min.x + x as f32,
                        bounds.min.y + y as f32,
                        color,
                        coverage,
                    );
                });
            }
            cursor_x += advance;
            previous = Some(glyph);
        }
    }

    /// Converts to an RGBA image, e.g. for writing a PNG.
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let value = self.pixels[(y * self.width + x) as usize];
            image::Rgba([
                ((value >> 16) & 0xFF) as u8,
                ((value >> 8) & 0xFF) as u8,
                (value & 0xFF) as u8,
                0xFF,
            ])
        })
    }

    fn clamp_bounds(&self, rect: Rect) -> (u32, u32, u32, u32) {
        let x0 = rect.left.max(0.0).floor() as u32;
        let y0 = rect.top.max(0.0).floor() as u32;
        let x1 = (rect.right.max(0.0).ceil() as u32).min(self.width);
        let y1 = (rect.bottom.max(0.0).ceil() as u32).min(self.height);
        (x0, y0, x1, y1)
    }

    fn blend_pixel(&mut self, x: f32, y: f32, color: Color, coverage: f32) {
        if coverage <= 0.0 {
            return;
        }
        let xi = x.floor() as i32;
        let yi = y.floor() as i32;
        if xi < 0 || yi < 0 || xi >= self.width as i32 || yi >= self.height as i32 {
            return;
        }
        let idx = (yi as u32 * self.width + xi as u32) as usize;
        let src_a = (color.a * coverage).clamp(0.0, 1.0);
        let dst = unpack_color(self.pixels[idx]);
        self.pixels[idx] = pack_color(blend(color.rgb(), dst, src_a));
    }
}

pub fn measure_text(text: &str, font: &FontArc, scale: PxScale) -> f32 {
    let scaled_font = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut previous = None;
    for ch in text.chars() {
        if ch == '\n' {
            continue;
        }
        let glyph_id = scaled_font.glyph_id(ch);
        if let Some(prev) = previous {
            width += scaled_font.kern(prev, glyph_id);
        }
        width += scaled_font.h_advance(glyph_id);
        previous = Some(glyph_id);
    }
    width.max(0.0)
}

/// Pixel size of `image` scaled uniformly to fit inside `rect`.
pub fn fit_size((iw, ih): (u32, u32), rect: Rect) -> Option<(u32, u32)> {
    if iw == 0 || ih == 0 || rect.width() < 1.0 || rect.height() < 1.0 {
        return None;
    }
    let fit = (rect.width() / iw as f32).min(rect.height() / ih as f32);
    let tw = ((iw as f32) * fit).round().max(1.0) as u32;
    let th = ((ih as f32) * fit).round().max(1.0) as u32;
    Some((tw, th))
}

/// Resamples `image` to fit inside `rect`; `None` when either is empty.
pub fn fit_image(image: &RgbaImage, rect: Rect) -> Option<RgbaImage> {
    let (tw, th) = fit_size(image.dimensions(), rect)?;
    if image.dimensions() == (tw, th) {
        return Some(image.clone());
    }
    Some(imageops::resize(image, tw, th, imageops::FilterType::Triangle))
}

fn rect_distance(rect: Rect, radius: f32, x: f32, y: f32) -> f32 {
    let (cx, cy) = rect.center();
    let radius = radius.clamp(0.0, rect.width().min(rect.height()) * 0.5);
    let inner = (rect.width() * 0.5 - radius, rect.height() * 0.5 - radius);
    rounded_rect_distance(x - cx, y - cy, inner, radius)
}

fn rounded_rect_coverage(rect: Rect, radius: f32, x: f32, y: f32) -> f32 {
    (0.5 - rect_distance(rect, radius, x, y)).clamp(0.0, 1.0)
}

fn blend(src: (f32, f32, f32), dst: (f32, f32, f32), alpha: f32) -> (f32, f32, f32) {
    (
        src.0 * alpha + dst.0 * (1.0 - alpha),
        src.1 * alpha + dst.1 * (1.0 - alpha),
        src.2 * alpha + dst.2 * (1.0 - alpha),
    )
}

fn unpack_color(value: u32) -> (f32, f32, f32) {
    let r = ((value >> 16) & 0xFF) as f32 / 255.0;
    let g = ((value >> 8) & 0xFF) as f32 / 255.0;
    let b = (value & 0xFF) as f32 / 255.0;
    (r, g, b)
}

fn pack_color(color: (f32, f32, f32)) -> u32 {
    let r = (color.0.clamp(0.0, 1.0) * 255.0).round() as u32;
    let g = (color.1.clamp(0.0, 1.0) * 255.0).round() as u32;
    let b = (color.2.clamp(0.0, 1.0) * 255.0).round() as u32;
    0xFF00_0000 | (r << 16) | (g << 8) | b
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Color = Color::from_rgb(0xFFFFFF);

    #[test]
    fn fill_rect_clips_to_frame() {
        let mut frame = Frame::new(4, 4);
        frame.fill_rect(Rect::from_origin(-2.0, 2.0, 10.0, 10.0), WHITE);
        assert_eq!(frame.pixel(0, 0), Some(0xFF00_0000));
        assert_eq!(frame.pixel(3, 3), Some(0xFFFF_FFFF));
        assert_eq!(frame.pixel(4, 0), None);
    }

    #[test]
    fn rounded_corners_stay_clear() {
        let mut frame = Frame::new(20, 20);
        frame.fill_rounded_rect(Rect::from_origin(0.0, 0.0, 20.0, 20.0), 8.0, WHITE);
        assert_eq!(frame.pixel(0, 0), Some(0xFF00_0000));
        assert_eq!(frame.pixel(10, 10), Some(0xFFFF_FFFF));
        assert_eq!(frame.pixel(10, 0), Some(0xFFFF_FFFF));
    }

    #[test]
    fn triangle_fills_interior_either_winding() {
        for points in [
            [(0.0, 0.0), (10.0, 5.0), (0.0, 10.0)],
            [(0.0, 0.0), (0.0, 10.0), (10.0, 5.0)],
        ] {
            let mut frame = Frame::new(10, 10);
            frame.fill_triangle(points, WHITE);
            assert_eq!(frame.pixel(2, 5), Some(0xFFFF_FFFF));
            assert_eq!(frame.pixel(9, 0), Some(0xFF00_0000));
        }
    }

    #[test]
    fn image_fill_composites_over_black() {
        let mut frame = Frame::new(2, 1);
        let image = RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 255, 255, 255, 0]).unwrap();
        frame.fill_with_image(&image);
        assert_eq!(frame.pixel(0, 0), Some(0xFFFF_0000));
        assert_eq!(frame.pixel(1, 0), Some(0xFF00_0000));
    }

    #[test]
    fn fitted_image_keeps_aspect_and_centers() {
        let rect = Rect::from_origin(0.0, 0.0, 20.0, 20.0);
        let image = RgbaImage::from_pixel(300, 150, image::Rgba([255, 255, 255, 255]));
        let fitted = fit_image(&image, rect).unwrap();
        assert_eq!(fitted.dimensions(), (20, 10));

        let mut frame = Frame::new(20, 20);
        frame.draw_image_centered(&fitted, rect, 0.0);
        assert_eq!(frame.pixel(10, 10), Some(0xFFFF_FFFF));
        assert_eq!(frame.pixel(10, 2), Some(0xFF00_0000));
        assert!(fit_image(&RgbaImage::new(0, 0), rect).is_none());
    }

    #[test]
    fn snapshot_conversion_keeps_channels() {
        let mut frame = Frame::new(1, 1);
        frame.fill_rect(Rect::from_origin(0.0, 0.0, 1.0, 1.0), Color::from_rgb(0x102030));
        assert_eq!(frame.to_rgba_image().get_pixel(0, 0).0, [0x10, 0x20, 0x30, 0xFF]);
    }
}
