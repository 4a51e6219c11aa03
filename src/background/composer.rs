//! Background composition and its animation clock.
//!
//! [`BackgroundComposer`] owns the animated parameters (backdrop angle, blob
//! geometry, crossfade opacity) and turns them, together with the current
//! [`CrossfadeGradient`] and viewport, into a bottom-to-top [`Scene`].

use std::time::{Duration, Instant};

use palette::Srgb;
use rand::{Rng, rngs::StdRng};
use tracing::{debug, trace};

use super::blobs::{Blob, BlobLayout};
use super::gradient::CrossfadeGradient;
use super::tween::{Motion, Tween};
use crate::config::BackgroundConfig;

pub const BLOB_OPACITY: f32 = 0.5;
pub const BLOB_CONTRAST: f32 = 2.0;
pub const BLOB_BLEND: BlendMode = BlendMode::Lighten;
pub const OVERLAYS: [Material; 2] = [Material::UltraThinLight, Material::UltraThinDark];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn diagonal(&self) -> f32 {
        self.width.hypot(self.height)
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Per-channel maximum of source and destination.
    Lighten,
}

/// Frosted-glass overlay variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    UltraThinLight,
    UltraThinDark,
}

impl Material {
    /// Blur radius in viewport units.
    pub fn blur_sigma(self) -> f32 {
        match self {
            Self::UltraThinLight | Self::UltraThinDark => 20.0,
        }
    }

    /// Tint color (linear 0..1) and how strongly it is mixed in.
    pub fn tint(self) -> ([f32; 3], f32) {
        match self {
            Self::UltraThinLight => ([1.0, 1.0, 1.0], 0.12),
            Self::UltraThinDark => ([0.0, 0.0, 0.0], 0.28),
        }
    }
}

/// The two gradient slots and the first slot's current opacity.
///
/// The second slot is drawn over the first with `1 - first_opacity`.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientFill {
    pub first: Vec<Srgb<u8>>,
    pub second: Vec<Srgb<u8>>,
    pub first_opacity: f32,
}

impl GradientFill {
    pub fn second_opacity(&self) -> f32 {
        1.0 - self.first_opacity
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobLayer {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
    pub rotation_degrees: f32,
    pub offset: (f32, f32),
    pub opacity: f32,
    pub blend: BlendMode,
    pub saturation: f32,
    pub contrast: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// Gradient square of side `side`, centered and rotated.
    Backdrop { side: f32, rotation_degrees: f32 },
    Blob(BlobLayer),
    Frosted(Material),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub viewport: Viewport,
    pub fill: GradientFill,
    /// Bottom to top.
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPhase {
    Idle,
    Animating,
}

pub struct BackgroundComposer<R = StdRng> {
    rng: R,
    blob_count: usize,
    tick_interval: Duration,
    layout_motion: Motion,
    crossfade_motion: Motion,
    phase: AnimationPhase,
    angle: Tween<f32>,
    blobs: Vec<Tween<Blob>>,
    first_opacity: Tween<f32>,
    first_visible: bool,
    next_tick: Option<Instant>,
}

impl<R: Rng> BackgroundComposer<R> {
    pub fn new(cfg: &BackgroundConfig, mut rng: R, now: Instant) -> Self {
        let layout = BlobLayout::random(&mut rng, cfg.blob_count);
        let blobs = layout
            .blobs()
            .iter()
            .map(|blob| Tween::settled(*blob, now))
            .collect();
        Self {
            rng,
            blob_count: cfg.blob_count,
            tick_interval: cfg.tick_interval,
            layout_motion: cfg.layout_motion(),
            crossfade_motion: cfg.crossfade_motion(),
            phase: AnimationPhase::Idle,
            angle: Tween::settled(0.0, now),
            blobs,
            first_opacity: Tween::settled(1.0, now),
            first_visible: true,
            next_tick: None,
        }
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    /// When the repeating timer fires next; `None` until mounted.
    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Starts the timer and the first transition.
    pub fn mount(&mut self, gradient: &CrossfadeGradient, now: Instant) {
        self.observe_gradient(gradient, now);
        self.phase = AnimationPhase::Animating;
        self.next_tick = Some(now + self.tick_interval);
        self.regenerate(now);
        debug!(
            period = %humantime::format_duration(self.tick_interval),
            blobs = self.blob_count,
            "background mounted"
        );
    }

    /// Stops the timer; current values freeze where they are.
    pub fn unmount(&mut self, now: Instant) {
        self.angle = Tween::settled(self.angle.value_at(now), now);
        for blob in &mut self.blobs {
            *blob = Tween::settled(blob.value_at(now), now);
        }
        self.phase = AnimationPhase::Idle;
        self.next_tick = None;
    }

    /// Fires the repeating timer if it is due. Returns whether it fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_tick else {
            return false;
        };
        if now < due {
            return false;
        }
        // A late wakeup fires once and realigns to the period grid.
        let mut next = due + self.tick_interval;
        while next <= now {
            next += self.tick_interval;
        }
        self.next_tick = Some(next);
        self.regenerate(now);
        trace!("background timer fired");
        true
    }

    /// Starts a crossfade when the gradient's visible slot has flipped.
    pub fn observe_gradient(&mut self, gradient: &CrossfadeGradient, now: Instant) -> bool {
        if gradient.first_visible() == self.first_visible {
            return false;
        }
        self.first_visible = gradient.first_visible();
        let target = if self.first_visible { 1.0 } else { 0.0 };
        self.first_opacity
            .retarget(target, now, &self.crossfade_motion);
        if self.phase == AnimationPhase::Animating {
            self.regenerate(now);
        }
        debug!(first_visible = self.first_visible, "gradient crossfade started");
        true
    }

    /// Samples a new backdrop angle and blob layout and starts easing toward them.
    pub fn regenerate(&mut self, now: Instant) {
        let angle = self.rng.random_range(0.0..360.0);
        self.angle.retarget(angle, now, &self.layout_motion);
        let layout = BlobLayout::random(&mut self.rng, self.blob_count);
        for (tween, blob) in self.blobs.iter_mut().zip(layout.blobs()) {
            tween.retarget(*blob, now, &self.layout_motion);
        }
    }

    /// The layout the blobs are currently easing toward.
    pub fn target_layout(&self) -> Vec<Blob> {
        self.blobs.iter().map(Tween::target).collect()
    }

    pub fn target_angle(&self) -> f32 {
        self.angle.target()
    }

    pub fn first_opacity(&self, now: Instant) -> f32 {
        self.first_opacity.value_at(now)
    }

    pub fn is_crossfading(&self, now: Instant) -> bool {
        !self.first_opacity.is_finished(now)
    }

    pub fn compose(&self, gradient: &CrossfadeGradient, viewport: Viewport, now: Instant) -> Scene {
        let fill = GradientFill {
            first: gradient.first().to_vec(),
            second: gradient.second().to_vec(),
            first_opacity: self.first_opacity.value_at(now).clamp(0.0, 1.0),
        };

        let mut layers = Vec::with_capacity(self.blobs.len() + 1 + OVERLAYS.len());
        layers.push(Layer::Backdrop {
            side: viewport.diagonal(),
            rotation_degrees: self.angle.value_at(now),
        });

        let base = viewport.min_side();
        for tween in &self.blobs {
            let blob = tween.value_at(now);
            layers.push(Layer::Blob(BlobLayer {
                width: (base + blob.size_delta.0).max(0.0),
                height: (base + blob.size_delta.1).max(0.0),
                scale: blob.scale,
                rotation_degrees: blob.rotation_degrees,
                offset: blob.offset,
                opacity: BLOB_OPACITY,
                blend: BLOB_BLEND,
                saturation: blob.saturation,
                contrast: BLOB_CONTRAST,
            }));
        }

        layers.extend(OVERLAYS.iter().copied().map(Layer::Frosted));

        Scene {
            viewport,
            fill,
            layers,
        }
    }
}
