use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry, EnvFilter};
use tracing_appender::non_blocking::NonBlockingBuilder;

use astrometry_batch::batch::BatchRun;
use astrometry_batch::cleanup;
use astrometry_batch::telescope_config::TelescopeConfig;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Batch astrometric plate solving",
          long_about = None)]
struct Args {
    /// Directory holding the images to solve.
    images_dir: PathBuf,

    /// Replace the original images with their solved counterparts once
    /// the batch finishes.
    #[arg(long)]
    overwrite: bool,

    /// Telescope profile to solve with.
    #[arg(long, default_value = "suhora")]
    config: String,

    /// Log level for stdout and the batch log file. RUST_LOG overrides.
    #[arg(long, value_enum, ignore_case = true,
          default_value_t = LogLevel::Info)]
    logger: LogLevel,
}

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let args = Args::parse();

    let config = match TelescopeConfig::resolve(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:?}", e);
            return 1;
        },
    };

    let mut batch = match BatchRun::new(&args.images_dir, config.clone(),
                                        args.overwrite) {
        Ok(batch) => batch,
        Err(e) => {
            eprintln!("{:?}", e);
            // Scratch from earlier runs still gets swept on the way out.
            let output_dir = args.images_dir.join(&config.output_folder_name);
            let _ = cleanup::cleanup(&args.images_dir, &output_dir,
                                     /*overwrite=*/false);
            return 1;
        },
    };

    // The batch log lives alongside the solved images, so the output
    // directory has to exist before logging can start.
    let output_dir = batch.output_dir();
    if let Err(e) = fs::create_dir_all(&output_dir) {
        eprintln!("Could not create {:?}: {:?}", output_dir, e);
        return 1;
    }
    let file_appender =
        tracing_appender::rolling::never(&output_dir, &config.log_file_name);
    // Create non-blocking writers for both the file and stdout. The guards
    // flush on drop, before the exit status is returned.
    let (non_blocking_file, _guard1) = NonBlockingBuilder::default()
        .lossy(false)
        .finish(file_appender);
    let (non_blocking_stdout, _guard2) = NonBlockingBuilder::default()
        .lossy(false)
        .finish(std::io::stdout());
    registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(
            |_| EnvFilter::new(args.logger.directive())))
        .with(fmt::layer().with_writer(non_blocking_stdout))
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking_file))
        .init();

    info!("Solving {:?} with profile {:?}", args.images_dir, args.config);
    match batch.run() {
        Ok(()) => 0,
        Err(e) => {
            // Per-image failures were already recorded; ending up here
            // means the solver itself could not be run.
            error!("Batch aborted: {:?}", e);
            1
        },
    }
}
