//! Explicit time-based interpolation.
//!
//! A [`Tween`] remembers where it started, where it is heading, when it
//! started and how long it takes. Setting a new target mid-flight restarts
//! from the currently interpolated value, so retargeting never pops.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// cubic-bezier(0.42, 0, 0.58, 1)
    EaseInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
        }
    }
}

fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    let curve = |p1: f32, p2: f32, s: f32| {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
    };

    // x(s) is monotonic for control points inside [0, 1]; bisect for s.
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    let mut s = x;
    for _ in 0..32 {
        let bx = curve(x1, x2, s);
        if (bx - x).abs() < 1e-6 {
            break;
        }
        if bx < x {
            lo = s;
        } else {
            hi = s;
        }
        s = 0.5 * (lo + hi);
    }
    curve(y1, y2, s)
}

/// Duration, curve and playback speed of an animation.
///
/// `speed` divides the duration: 0.1 plays ten times slower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub duration: Duration,
    pub easing: Easing,
    pub speed: f32,
}

impl Motion {
    pub fn effective_duration(&self) -> Duration {
        if self.speed <= 0.0 || !self.speed.is_finite() {
            return self.duration;
        }
        self.duration.div_f32(self.speed)
    }
}

pub trait Lerp: Copy {
    fn lerp(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for (f32, f32) {
    fn lerp(self, to: Self, t: f32) -> Self {
        (self.0.lerp(to.0, t), self.1.lerp(to.1, t))
    }
}

#[derive(Debug, Clone)]
pub struct Tween<T: Lerp> {
    from: T,
    to: T,
    started: Instant,
    duration: Duration,
    easing: Easing,
}

impl<T: Lerp> Tween<T> {
    /// A tween that is already at rest on `value`.
    pub fn settled(value: T, now: Instant) -> Self {
        Self {
            from: value,
            to: value,
            started: now,
            duration: Duration::ZERO,
            easing: Easing::Linear,
        }
    }

    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn value_at(&self, now: Instant) -> T {
        let t = self.easing.apply(self.progress(now));
        self.from.lerp(self.to, t)
    }

    pub fn target(&self) -> T {
        self.to
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    pub fn retarget(&mut self, to: T, now: Instant, motion: &Motion) {
        self.from = self.value_at(now);
        self.to = to;
        self.started = now;
        self.duration = motion.effective_duration();
        self.easing = motion.easing;
    }
}
