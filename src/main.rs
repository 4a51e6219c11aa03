use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use cover_glow::config::Configuration;
use cover_glow::extract::{HistogramExtractor, Quality};
use cover_glow::library::{ImageLibrary, load_or_placeholder};
use cover_glow::shell::AppShell;
use cover_glow::swatch::PaletteModel;
use cover_glow::ui::{Renderer, font, frequency_label};
use cover_glow::viewer;

#[derive(Debug, Parser)]
#[command(
    name = "cover-glow",
    version,
    about = "Cover-art viewer with a dominant-color palette and an animated gradient background"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG", default_value = "config.yaml")]
    config: PathBuf,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
    /// Deterministic RNG seed for the background blobs
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Override the configured extraction quality
    #[arg(long, value_enum, value_name = "LEVEL")]
    quality: Option<Quality>,
    /// Override the image shown at startup
    #[arg(long = "start-index", value_name = "N")]
    start_index: Option<usize>,
    /// Print every image's palette and exit without opening a window
    #[arg(long = "print-palettes")]
    print_palettes: bool,
    /// Render a single frame to this PNG and exit
    #[arg(long, value_name = "PNG")]
    snapshot: Option<PathBuf>,
    /// Size of the snapshot in pixels
    #[arg(long = "snapshot-size", value_name = "WxH", default_value = "430x860")]
    snapshot_size: SnapshotSize,
    /// How far into the animation the snapshot is taken (e.g. "12s")
    #[arg(long = "snapshot-at", value_name = "DURATION", value_parser = humantime::parse_duration)]
    snapshot_at: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SnapshotSize {
    width: u32,
    height: u32,
}

impl FromStr for SnapshotSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width: u32 = w.trim().parse().context("invalid snapshot width")?;
        let height: u32 = h.trim().parse().context("invalid snapshot height")?;
        anyhow::ensure!(width > 0 && height > 0, "snapshot size must be non-zero");
        Ok(Self { width, height })
    }
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(format!("cover_glow={level}").parse()?)
        .add_directive("winit=warn".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let mut cfg = Configuration::from_yaml_file(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?
        .validated()
        .context("invalid configuration values")?;
    if let Some(quality) = args.quality {
        cfg.quality = quality;
    }
    if let Some(index) = args.start_index {
        cfg.start_index = index;
    }
    info!(
        config = %args.config.display(),
        quality = %cfg.quality,
        tick = %humantime::format_duration(cfg.background.tick_interval),
        "configuration loaded"
    );

    let library = ImageLibrary::from_config(&cfg).context("failed to build image library")?;

    if args.print_palettes {
        print_palettes(&cfg, &library);
        return Ok(());
    }

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let now = Instant::now();
    let mut shell = AppShell::new(&cfg, library, HistogramExtractor, rng, now);

    let label_font = match font::load_font() {
        Ok(font) => Some(font),
        Err(err) => {
            warn!(error = %err, "frequency labels disabled");
            None
        }
    };
    let mut renderer = Renderer::new(label_font, cfg.background.render_scale);

    if let Some(path) = args.snapshot {
        let SnapshotSize { width, height } = args.snapshot_size;
        shell.mount(now);
        let at = now + args.snapshot_at.unwrap_or_default();
        shell.advance(at);
        let frame = renderer.render(&shell, width, height, 1.0, at);
        frame
            .to_rgba_image()
            .save(&path)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        info!(path = %path.display(), width, height, "snapshot written");
        return Ok(());
    }

    viewer::run(shell, renderer, cfg.window.clone(), cfg.background.frame_interval)
}

fn print_palettes(cfg: &Configuration, library: &ImageLibrary) {
    for entry in library.entries() {
        let image = load_or_placeholder(&entry.path);
        let mut palette = PaletteModel::new(cfg.palette_size);
        let line = match palette.recompute(&image, cfg.quality, &HistogramExtractor) {
            Some(entries) => entries
                .iter()
                .map(|e| {
                    format!(
                        "#{:02x}{:02x}{:02x} {}",
                        e.color.red,
                        e.color.green,
                        e.color.blue,
                        frequency_label(e.frequency)
                    )
                })
                .collect::<Vec<_>>()
                .join("  "),
            None => "(no palette)".to_string(),
        };
        println!("{}: {line}", entry.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snapshot_size() {
        assert_eq!(
            "640x480".parse::<SnapshotSize>().unwrap(),
            SnapshotSize {
                width: 640,
                height: 480
            }
        );
        assert!("640".parse::<SnapshotSize>().is_err());
        assert!("0x10".parse::<SnapshotSize>().is_err());
    }

    #[test]
    fn cli_accepts_overrides() {
        let args = Args::try_parse_from([
            "cover-glow",
            "covers.yaml",
            "-vv",
            "--seed",
            "7",
            "--quality",
            "low",
            "--snapshot",
            "out.png",
            "--snapshot-at",
            "12s",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.quality, Some(Quality::Low));
        assert_eq!(args.snapshot_at, Some(Duration::from_secs(12)));
        assert_eq!(args.snapshot_size.width, 430);
    }
}
