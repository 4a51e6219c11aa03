//! Animated gradient-blob background.

pub mod blobs;
pub mod composer;
pub mod gradient;
pub mod raster;
pub mod tween;

pub use blobs::{Blob, BlobLayout};
pub use composer::{BackgroundComposer, Layer, Scene, Viewport};
pub use gradient::{CrossfadeGradient, Slot};
