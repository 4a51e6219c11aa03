use std::time::{Duration, Instant};

use cover_glow::background::blobs::{
    OFFSET_RANGE, ROTATION_RANGE, SATURATION_RANGE, SCALE_RANGE, SIZE_DELTA_RANGE,
};
use cover_glow::background::composer::{
    AnimationPhase, BLOB_CONTRAST, BLOB_OPACITY, BlendMode, Material,
};
use cover_glow::background::raster::{Rasterizer, to_rgba8};
use cover_glow::background::{
    BackgroundComposer, BlobLayout, CrossfadeGradient, Layer, Viewport,
};
use cover_glow::config::BackgroundConfig;
use palette::Srgb;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn composer(seed: u64, now: Instant) -> BackgroundComposer<StdRng> {
    BackgroundComposer::new(&BackgroundConfig::default(), StdRng::seed_from_u64(seed), now)
}

#[test]
fn blob_parameters_stay_in_bounds() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut seen = 0;
    while seen < 1000 {
        let layout = BlobLayout::random(&mut rng, 3);
        for blob in layout.blobs() {
            assert!(SIZE_DELTA_RANGE.contains(&blob.size_delta.0));
            assert!(SIZE_DELTA_RANGE.contains(&blob.size_delta.1));
            assert!(SCALE_RANGE.contains(&blob.scale));
            assert!(ROTATION_RANGE.contains(&blob.rotation_degrees));
            assert!(OFFSET_RANGE.contains(&blob.offset.0));
            assert!(OFFSET_RANGE.contains(&blob.offset.1));
            assert!(SATURATION_RANGE.contains(&blob.saturation));
            seen += 1;
        }
    }
}

#[test]
fn scene_layers_are_ordered_bottom_to_top() {
    let now = Instant::now();
    let mut c = composer(1, now);
    let gradient = CrossfadeGradient::new(vec![Srgb::new(255, 0, 0), Srgb::new(0, 0, 255)]);
    c.mount(&gradient, now);
    let viewport = Viewport::new(300.0, 400.0);
    let scene = c.compose(&gradient, viewport, now + Duration::from_secs(3));

    assert_eq!(scene.layers.len(), 6);
    match &scene.layers[0] {
        Layer::Backdrop { side, .. } => assert!((side - 500.0).abs() < 1e-3),
        other => panic!("expected backdrop, got {other:?}"),
    }
    for layer in &scene.layers[1..4] {
        let Layer::Blob(blob) = layer else {
            panic!("expected blob, got {layer:?}");
        };
        assert_eq!(blob.opacity, BLOB_OPACITY);
        assert_eq!(blob.contrast, BLOB_CONTRAST);
        assert_eq!(blob.blend, BlendMode::Lighten);
    }
    assert_eq!(scene.layers[4], Layer::Frosted(Material::UltraThinLight));
    assert_eq!(scene.layers[5], Layer::Frosted(Material::UltraThinDark));
}

#[test]
fn blob_size_tracks_the_short_side() {
    let now = Instant::now();
    let c = composer(2, now);
    let gradient = CrossfadeGradient::default();
    let small = c.compose(&gradient, Viewport::new(200.0, 900.0), now);
    let large = c.compose(&gradient, Viewport::new(900.0, 500.0), now);

    for (a, b) in small.layers.iter().zip(&large.layers) {
        if let (Layer::Blob(a), Layer::Blob(b)) = (a, b) {
            assert!((b.width - a.width - 300.0).abs() < 1e-3);
            assert!((b.height - a.height - 300.0).abs() < 1e-3);
        }
    }
}

#[test]
fn mount_and_ticks_retarget_the_layout() {
    let t0 = Instant::now();
    let mut c = composer(3, t0);
    let initial = c.target_layout();
    assert_eq!(c.phase(), AnimationPhase::Idle);

    c.mount(&CrossfadeGradient::default(), t0);
    let mounted = c.target_layout();
    assert_ne!(initial, mounted);

    assert!(!c.tick(t0 + Duration::from_secs(4)));
    assert_eq!(c.target_layout(), mounted);

    assert!(c.tick(t0 + Duration::from_secs(5)));
    assert_ne!(c.target_layout(), mounted);
    assert_eq!(c.next_tick(), Some(t0 + Duration::from_secs(10)));
}

#[test]
fn layout_transition_crawls() {
    let t0 = Instant::now();
    let mut c = composer(4, t0);
    let gradient = CrossfadeGradient::default();
    let viewport = Viewport::new(400.0, 800.0);
    let before = c.compose(&gradient, viewport, t0);
    c.mount(&gradient, t0);

    // Five seconds into a fifty-second ease-in-out the blobs have barely moved.
    let early = c.compose(&gradient, viewport, t0 + Duration::from_secs(5));
    let done = c.compose(&gradient, viewport, t0 + Duration::from_secs(50));
    let width = |scene: &cover_glow::background::Scene| match &scene.layers[1] {
        Layer::Blob(b) => b.width,
        _ => unreachable!(),
    };
    let total = (width(&done) - width(&before)).abs();
    let moved = (width(&early) - width(&before)).abs();
    assert!(moved <= total * 0.1 + 1e-3, "moved {moved} of {total}");
}

#[test]
fn seeded_composers_agree() {
    let now = Instant::now();
    let gradient = CrossfadeGradient::new(vec![Srgb::new(9, 9, 9)]);
    let mut a = composer(77, now);
    let mut b = composer(77, now);
    a.mount(&gradient, now);
    b.mount(&gradient, now);
    let at = now + Duration::from_secs(7);
    let viewport = Viewport::new(120.0, 240.0);
    assert_eq!(a.compose(&gradient, viewport, at), b.compose(&gradient, viewport, at));
}

#[test]
fn rasterized_scene_is_opaque_with_colors_and_clear_without() {
    let now = Instant::now();
    let mut c = composer(5, now);
    let viewport = Viewport::new(80.0, 160.0);
    let raster = Rasterizer::new(0.25);

    let empty = CrossfadeGradient::default();
    c.mount(&empty, now);
    let clear = to_rgba8(&raster.render(&c.compose(&empty, viewport, now)));
    assert_eq!(clear.dimensions(), (20, 40));
    assert!(clear.pixels().all(|p| p.0[3] == 0));

    let mut gradient = CrossfadeGradient::default();
    gradient.set_colors(vec![Srgb::new(240, 120, 20), Srgb::new(20, 60, 200)]);
    c.observe_gradient(&gradient, now);
    let settled = now + Duration::from_secs(2);
    let painted = to_rgba8(&raster.render(&c.compose(&gradient, viewport, settled)));
    assert!(painted.pixels().all(|p| p.0[3] == 255));
}
