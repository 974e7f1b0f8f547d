//! `asset-slices`: split asset-only modules into device-targeted slices.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use asset_slices::config::GenerationConfig;
use asset_slices::loader::{load_modules_from_json, scan_bundle_dir};
use asset_slices::report::SliceReport;
use asset_slices::{AssetSlicesGenerator, OptimizationDimension};

#[derive(Debug, Parser)]
#[command(name = "asset-slices", version, about)]
struct Cli {
  /// JSON file holding an array of module descriptors.
  #[arg(long, conflicts_with = "bundle_dir")]
  modules: Option<PathBuf>,

  /// Directory with one sub-directory per module.
  #[arg(long)]
  bundle_dir: Option<PathBuf>,

  /// Generation config file; defaults to asset-slices.config.json in the working directory.
  #[arg(long)]
  config: Option<PathBuf>,

  /// Additional dimension to split on (repeatable).
  #[arg(long = "dimension", value_name = "DIM")]
  dimensions: Vec<OptimizationDimension>,

  /// Where to write the slice report; stdout when omitted.
  #[arg(long)]
  output: Option<PathBuf>,

  /// Slice modules on a thread pool.
  #[cfg(feature = "parallel")]
  #[arg(long)]
  parallel: bool,

  /// Log debug output.
  #[arg(long, short)]
  verbose: bool,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let modules = match (&cli.modules, &cli.bundle_dir) {
    (Some(path), None) => load_modules_from_json(path)?,
    (None, Some(dir)) => scan_bundle_dir(dir)?,
    _ => bail!("one of --modules or --bundle-dir is required"),
  };

  let base = match &cli.config {
    Some(path) => GenerationConfig::from_path(path)?,
    None => {
      let cwd = std::env::current_dir().context("failed to resolve working directory")?;
      GenerationConfig::discover(&cwd)?
    }
  };
  let config = cli
    .dimensions
    .iter()
    .fold(base, |config, dimension| config.with_dimension(*dimension));

  info!(
    modules = modules.len(),
    dimensions = ?config.optimization_dimensions(),
    "slicing asset modules"
  );

  let generator = AssetSlicesGenerator::new(&modules, &config);
  #[cfg(feature = "parallel")]
  let slices = if cli.parallel {
    generator.generate_asset_slices_parallel()?
  } else {
    generator.generate_asset_slices()?
  };
  #[cfg(not(feature = "parallel"))]
  let slices = generator.generate_asset_slices()?;

  let json = SliceReport::new(&slices)
    .to_json_pretty()
    .context("failed to serialise slice report")?;

  match &cli.output {
    Some(path) => {
      fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?
    }
    None => println!("{json}"),
  }

  Ok(())
}

fn init_logging(verbose: bool) {
  let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
  tracing_subscriber::fmt()
    .with_env_filter(log_filter(verbose, directives.as_deref()))
    .with_writer(std::io::stderr)
    .init();
}

/// `RUST_LOG` directives, or `info` without them. `--verbose` always lifts the default to debug.
fn log_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
  let filter = directives
    .and_then(|directives| EnvFilter::try_new(directives).ok())
    .unwrap_or_else(|| EnvFilter::new("info"));
  if verbose {
    filter.add_directive(LevelFilter::DEBUG.into())
  } else {
    filter
  }
}
