//! CPU rasterization of a composed [`Scene`].
//!
//! The canvas holds premultiplied linear-in-sRGB-space RGBA floats and starts
//! fully transparent. The viewer scales the result up to the window.

use image::{DynamicImage, ImageBuffer, Rgba, Rgba32FImage, RgbaImage, imageops};
use palette::Srgb;
use tracing::trace;

use super::composer::{BlendMode, BlobLayer, GradientFill, Layer, Material, Scene, Viewport};

const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

type Premul = [f32; 4];

pub struct Rasterizer {
    scale: f32,
}

impl Rasterizer {
    /// `scale` is the canvas resolution relative to viewport units.
    pub fn new(scale: f32) -> Self {
        Self {
            scale: if scale.is_finite() && scale > 0.0 { scale } else { 1.0 },
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn canvas_size(&self, viewport: Viewport) -> (u32, u32) {
        let w = (viewport.width * self.scale).ceil().max(1.0) as u32;
        let h = (viewport.height * self.scale).ceil().max(1.0) as u32;
        (w, h)
    }

    pub fn render(&self, scene: &Scene) -> Rgba32FImage {
        let (w, h) = self.canvas_size(scene.viewport);
        let mut canvas: Rgba32FImage = ImageBuffer::new(w, h);
        let fill = FillSampler::new(&scene.fill);
        if fill.is_empty() {
            trace!("both gradient slots empty; background stays transparent");
        }

        for layer in &scene.layers {
            match layer {
                Layer::Backdrop {
                    side,
                    rotation_degrees,
                } => self.draw_backdrop(&mut canvas, scene.viewport, &fill, *side, *rotation_degrees),
                Layer::Blob(blob) => self.draw_blob(&mut canvas, scene.viewport, &fill, blob),
                Layer::Frosted(material) => {
                    canvas = self.frost(&canvas, *material);
                }
            }
        }
        canvas
    }

    /// Maps a canvas pixel center back to viewport units.
    fn to_viewport(&self, x: u32, y: u32) -> (f32, f32) {
        ((x as f32 + 0.5) / self.scale, (y as f32 + 0.5) / self.scale)
    }

    fn draw_backdrop(
        &self,
        canvas: &mut Rgba32FImage,
        viewport: Viewport,
        fill: &FillSampler,
        side: f32,
        rotation_degrees: f32,
    ) {
        if fill.is_empty() || side <= 0.0 {
            return;
        }
        let (cx, cy) = viewport.center();
        let (sin, cos) = (-rotation_degrees.to_radians()).sin_cos();
        let half = side * 0.5;
        for (x, y, pixel) in canvas.enumerate_pixels_mut() {
            let (vx, vy) = self.to_viewport(x, y);
            let (lx, ly) = rotate(vx - cx, vy - cy, sin, cos);
            if lx.abs() > half || ly.abs() > half {
                continue;
            }
            let src = fill.sample((ly + half) / side);
            pixel.0 = source_over(src, pixel.0);
        }
    }

    fn draw_blob(
        &self,
        canvas: &mut Rgba32FImage,
        viewport: Viewport,
        fill: &FillSampler,
        blob: &BlobLayer,
    ) {
        let (w, h) = (blob.width.max(1.0), blob.height.max(1.0));
        let scale = blob.scale.max(f32::EPSILON);
        if fill.is_empty() || blob.opacity <= 0.0 {
            return;
        }

        let (cx, cy) = viewport.center();
        let center = (cx + blob.offset.0, cy + blob.offset.1);
        let (sin, cos) = (-blob.rotation_degrees.to_radians()).sin_cos();
        let radius = w.min(h) * 0.5;
        let inner = (w * 0.5 - radius, h * 0.5 - radius);

        // Axis-aligned bounds of the rotated, scaled capsule in canvas pixels.
        let reach = 0.5 * w.hypot(h) * scale * self.scale + 1.0;
        let (px, py) = (center.0 * self.scale, center.1 * self.scale);
        let x0 = (px - reach).floor().max(0.0) as u32;
        let y0 = (py - reach).floor().max(0.0) as u32;
        let x1 = ((px + reach).ceil().max(0.0) as u32).min(canvas.width());
        let y1 = ((py + reach).ceil().max(0.0) as u32).min(canvas.height());

        for y in y0..y1 {
            for x in x0..x1 {
                let (vx, vy) = self.to_viewport(x, y);
                let (rx, ry) = rotate(vx - center.0, vy - center.1, sin, cos);
                let (lx, ly) = (rx / scale, ry / scale);

                let dist = rounded_rect_distance(lx, ly, inner, radius);
                let coverage = (0.5 - dist * scale * self.scale).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }

                let sampled = fill.sample((ly + h * 0.5) / h);
                if sampled[3] <= 0.0 {
                    continue;
                }
                let mut rgb = unpremultiply(sampled);
                rgb = adjust_saturation(rgb, blob.saturation);
                rgb = adjust_contrast(rgb, blob.contrast);
                let alpha = sampled[3] * coverage * blob.opacity;
                let src = [rgb[0] * alpha, rgb[1] * alpha, rgb[2] * alpha, alpha];

                let pixel = canvas.get_pixel_mut(x, y);
                pixel.0 = match blob.blend {
                    BlendMode::Lighten => lighten(src, pixel.0),
                };
            }
        }
    }

    fn frost(&self, canvas: &Rgba32FImage, material: Material) -> Rgba32FImage {
        let sigma = material.blur_sigma() * self.scale;
        let mut blurred = if sigma > 0.0 {
            blur_clamped(canvas, sigma)
        } else {
            canvas.clone()
        };
        let (tint, amount) = material.tint();
        for pixel in blurred.pixels_mut() {
            let a = pixel.0[3];
            for c in 0..3 {
                pixel.0[c] += (tint[c] * a - pixel.0[c]) * amount;
            }
        }
        blurred
    }
}

/// Gaussian blur that treats everything past the edge as the edge pixel.
fn blur_clamped(canvas: &Rgba32FImage, sigma: f32) -> Rgba32FImage {
    let (w, h) = canvas.dimensions();
    let pad = (sigma * 4.0).ceil() as u32;
    let padded: Rgba32FImage = ImageBuffer::from_fn(w + 2 * pad, h + 2 * pad, |x, y| {
        let sx = x.saturating_sub(pad).min(w - 1);
        let sy = y.saturating_sub(pad).min(h - 1);
        *canvas.get_pixel(sx, sy)
    });
    let blurred = imageops::blur(&padded, sigma);
    imageops::crop_imm(&blurred, pad, pad, w, h).to_image()
}

/// Converts a premultiplied float canvas to straight 8-bit RGBA.
pub fn to_rgba8(canvas: &Rgba32FImage) -> RgbaImage {
    let mut straight = canvas.clone();
    for pixel in straight.pixels_mut() {
        let rgb = unpremultiply(pixel.0);
        *pixel = Rgba([rgb[0], rgb[1], rgb[2], pixel.0[3].clamp(0.0, 1.0)]);
    }
    DynamicImage::ImageRgba32F(straight).to_rgba8()
}

/// The two gradient slots prepared for per-pixel sampling.
struct FillSampler {
    first: Vec<[f32; 3]>,
    second: Vec<[f32; 3]>,
    first_opacity: f32,
}

impl FillSampler {
    fn new(fill: &GradientFill) -> Self {
        let convert = |colors: &[Srgb<u8>]| -> Vec<[f32; 3]> {
            colors
                .iter()
                .map(|c| {
                    let c: Srgb<f32> = c.into_format();
                    [c.red, c.green, c.blue]
                })
                .collect()
        };
        Self {
            first: convert(&fill.first),
            second: convert(&fill.second),
            first_opacity: fill.first_opacity.clamp(0.0, 1.0),
        }
    }

    fn is_empty(&self) -> bool {
        self.first.is_empty() && self.second.is_empty()
    }

    /// Premultiplied color at `t` (0 = top, 1 = bottom) of the crossfaded fill.
    fn sample(&self, t: f32) -> Premul {
        let mut out = [0.0; 4];
        if let Some(rgb) = sample_stops(&self.first, t) {
            out = source_over(premultiply(rgb, self.first_opacity), out);
        }
        if let Some(rgb) = sample_stops(&self.second, t) {
            out = source_over(premultiply(rgb, 1.0 - self.first_opacity), out);
        }
        out
    }
}

/// Evenly spaced stops; `None` for an empty gradient.
fn sample_stops(stops: &[[f32; 3]], t: f32) -> Option<[f32; 3]> {
    match stops {
        [] => None,
        [only] => Some(*only),
        _ => {
            let pos = t.clamp(0.0, 1.0) * (stops.len() - 1) as f32;
            let i = (pos.floor() as usize).min(stops.len() - 2);
            let f = pos - i as f32;
            let (a, b) = (stops[i], stops[i + 1]);
            Some([
                a[0] + (b[0] - a[0]) * f,
                a[1] + (b[1] - a[1]) * f,
                a[2] + (b[2] - a[2]) * f,
            ])
        }
    }
}

fn rotate(x: f32, y: f32, sin: f32, cos: f32) -> (f32, f32) {
    (x * cos - y * sin, x * sin + y * cos)
}

/// Signed distance to a rounded rectangle centered at the origin.
pub(crate) fn rounded_rect_distance(x: f32, y: f32, inner: (f32, f32), radius: f32) -> f32 {
    let qx = x.abs() - inner.0;
    let qy = y.abs() - inner.1;
    let outside = qx.max(0.0).hypot(qy.max(0.0));
    outside + qx.max(qy).min(0.0) - radius
}

fn premultiply(rgb: [f32; 3], alpha: f32) -> Premul {
    let a = alpha.clamp(0.0, 1.0);
    [rgb[0] * a, rgb[1] * a, rgb[2] * a, a]
}

fn unpremultiply(c: Premul) -> [f32; 3] {
    if c[3] <= f32::EPSILON {
        return [0.0; 3];
    }
    [
        (c[0] / c[3]).clamp(0.0, 1.0),
        (c[1] / c[3]).clamp(0.0, 1.0),
        (c[2] / c[3]).clamp(0.0, 1.0),
    ]
}

fn source_over(src: Premul, dst: Premul) -> Premul {
    let k = 1.0 - src[3];
    [
        src[0] + dst[0] * k,
        src[1] + dst[1] * k,
        src[2] + dst[2] * k,
        src[3] + dst[3] * k,
    ]
}

/// Separable lighten on premultiplied colors.
fn lighten(src: Premul, dst: Premul) -> Premul {
    let (sa, da) = (src[3], dst[3]);
    let channel = |s: f32, d: f32| s * (1.0 - da) + d * (1.0 - sa) + (s * da).max(d * sa);
    [
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        sa + da * (1.0 - sa),
    ]
}

fn adjust_saturation(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    let luma = rgb[0] * LUMA[0] + rgb[1] * LUMA[1] + rgb[2] * LUMA[2];
    rgb.map(|c| (luma + (c - luma) * amount).clamp(0.0, 1.0))
}

fn adjust_contrast(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    rgb.map(|c| ((c - 0.5) * amount + 0.5).clamp(0.0, 1.0))
}
