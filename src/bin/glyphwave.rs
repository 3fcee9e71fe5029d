use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context as _;
use clap::{Parser, ValueEnum as _};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use glyphwave::palette::{self, Charset};
use glyphwave::{playback, pool, term, Pipeline, PlaybackOptions, RenderConfig, TermSession};

#[derive(Parser, Debug)]
#[command(name = "glyphwave", version, about = "Animated noise patterns for the terminal")]
struct Cli {
    /// Character set used for rendering.
    #[arg(short, long, value_enum, default_value_t = Charset::Horizontal)]
    charset: Charset,

    /// Noise scale factor; smaller is more detailed, larger is smoother.
    #[arg(short, long, default_value_t = 0.1)]
    scale: f64,

    /// Gradient start color in hex (e.g. #FF1111).
    #[arg(long, default_value = "#FF1111")]
    color_start: String,

    /// Gradient end color in hex (e.g. #11FFFF).
    #[arg(long, default_value = "#11FFFF")]
    color_end: String,

    /// Disable the color gradient (monochrome output).
    #[arg(long)]
    no_color: bool,

    /// Display the measured frame rate below the pattern.
    #[arg(long)]
    show_fps: bool,

    /// Target maximum frames per second.
    #[arg(long, default_value_t = 120)]
    max_fps: u32,

    /// Noise seed; defaults to the current unix time.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of render workers; defaults to the available parallelism.
    #[arg(long)]
    workers: Option<usize>,

    /// Pick a random charset and a random contrasting color pair.
    #[arg(long)]
    random: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let seed = cli.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    });
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let charset = if cli.random {
        let variants = Charset::value_variants();
        let picked = variants[rng.gen_range(0..variants.len())];
        eprintln!("random charset: {picked}");
        picked
    } else {
        cli.charset
    };

    let gradient = if cli.no_color {
        None
    } else if cli.random {
        let (start, end) = palette::random_contrast_colors(&mut rng);
        eprintln!("random colors: {start} -> {end}");
        Some((start, end))
    } else {
        let start = palette::parse_hex_color(&cli.color_start)?;
        let end = palette::parse_hex_color(&cli.color_end)?;
        Some((start, end))
    };

    let glyphs = palette::build_glyph_table(&charset.glyphs(), gradient);
    let (width, height) = term::grid_size(cli.show_fps);
    let config = RenderConfig {
        width,
        height,
        scale: cli.scale,
        seed,
        glyphs,
    };

    let workers = cli.workers.unwrap_or_else(pool::default_workers).max(1);
    let mut pipeline = Pipeline::new(config, workers)?;

    let mut out = io::stdout();
    let mut session = TermSession::enter(&mut out).context("prepare terminal")?;

    let result = playback::run(
        &mut out,
        &mut pipeline,
        &PlaybackOptions {
            max_fps: cli.max_fps,
            show_fps: cli.show_fps,
        },
    );

    // Restore before reporting: no failure path may leave the terminal in
    // raw, cursor-hidden mode.
    let restored = session.restore(&mut out);
    result?;
    restored?;
    Ok(())
}
