use std::path::PathBuf;

use anyhow::{ Context, Result };
use clap::{ Parser, ValueEnum };
use log::{ info, LevelFilter };

use whitted::scene::Scene;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Renders a JSON scene description to a PPM image.
#[derive(Parser, Debug)]
#[clap(name = "whitted", version, about)]
struct Args {
    /// The scene file to render.
    scene: PathBuf,

    /// Where to write the image.
    #[clap(short, long, default_value = "out.ppm")]
    output: PathBuf,

    /// Seed for area light sampling; overrides the scene's seed.
    #[clap(long)]
    seed: Option<u64>,

    /// Size of the worker pool. Defaults to one thread per core.
    #[clap(long)]
    threads: Option<usize>,

    /// Render on the calling thread only.
    #[clap(long)]
    sequential: bool,

    /// Skip building the bounding volume hierarchy.
    #[clap(long)]
    no_bvh: bool,

    #[clap(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to start the worker pool")?;
    }

    let mut scene = Scene::load(&args.scene)
        .with_context(|| format!("could not load {}", args.scene.display()))?;

    if args.seed.is_some() {
        scene.config.seed = args.seed;
    }
    if args.sequential {
        scene.config.parallel = false;
    }
    if args.no_bvh {
        scene.config.bvh_threshold = None;
    }

    scene.prepare().context("failed to build the bounding volume hierarchy")?;

    let canvas = scene.camera.render(&scene.world, &scene.config);
    canvas.save(&args.output)
        .with_context(|| format!("could not write {}", args.output.display()))?;

    info!("wrote {}", args.output.display());
    Ok(())
}
