use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};

use sweeper::config::{FailurePolicy, SweepConfig};
use sweeper::lifecycle::Sweeper;
use sweeper::logging;

#[derive(Parser)]
#[command(name = "sweeper", version)]
#[command(about = "Delete the oldest recordings when free disk space runs low")]
struct Cli {
    /// JSON config file (flags below override its values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory holding <source>/<YYYY-MM-DD>/<sequence> recordings
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// Free fraction below which a sweep starts (default 0.15)
    #[arg(long)]
    critical: Option<f64>,

    /// Free fraction at which a sweep stops (default 0.20)
    #[arg(long)]
    target: Option<f64>,

    /// Log file receiving the same records as stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Regex identifying recording directories; a `key` group supplies the order
    #[arg(long)]
    unit_pattern: Option<String>,

    /// Keep date directories even when their last recording is deleted
    #[arg(long)]
    no_prune_parent: bool,

    /// abort (stop the run) or skip (continue with the next recording)
    #[arg(long)]
    on_deletion_failure: Option<FailurePolicy>,

    /// Print candidates newest first and the volume state; delete nothing
    #[arg(long)]
    list: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::from(2);
        }
    };

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(err) = logging::init(config.log_file_path.as_deref(), level) {
        eprintln!("error: {err:#}");
        return ExitCode::from(2);
    }

    let code = if cli.list {
        list(&config)
    } else {
        sweep(&config)
    };
    logging::flush();
    code
}

fn build_config(cli: &Cli) -> Result<SweepConfig> {
    let mut config = match (&cli.config, &cli.working_dir) {
        (Some(path), _) => SweepConfig::from_json_file(path)?,
        (None, Some(dir)) => SweepConfig::new(dir),
        (None, None) => return Err(anyhow!("either --config or --working-dir is required")),
    };

    if let Some(dir) = &cli.working_dir {
        config.working_directory = dir.clone();
    }
    if let Some(critical) = cli.critical {
        config.critical_free_fraction = critical;
    }
    if let Some(target) = cli.target {
        config.target_free_fraction = target;
    }
    if let Some(path) = &cli.log_file {
        config.log_file_path = Some(path.clone());
    }
    if let Some(pattern) = &cli.unit_pattern {
        config.unit_pattern = pattern.clone();
    }
    if cli.no_prune_parent {
        config.prune_empty_parent = false;
    }
    if let Some(policy) = cli.on_deletion_failure {
        config.on_deletion_failure = policy;
    }

    config.validate().context("config rejected")?;
    Ok(config)
}

fn sweep(config: &SweepConfig) -> ExitCode {
    let mut sweeper = match Sweeper::new(config) {
        Ok(sweeper) => sweeper,
        Err(err) => {
            error!("sweeper failed: {err}");
            return ExitCode::from(err.exit_code());
        }
    };

    match sweeper.run_once() {
        Ok(stats) => {
            info!("{}", stats.summary());
            if stats.has_errors() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => ExitCode::from(err.exit_code()),
    }
}

fn list(config: &SweepConfig) -> ExitCode {
    let report = match Sweeper::new(config).and_then(|mut sweeper| sweeper.list()) {
        Ok(report) => report,
        Err(err) => {
            error!("listing failed: {err}");
            return ExitCode::from(err.exit_code());
        }
    };

    let volume = report.volume;
    let free = match volume.free_fraction() {
        Some(f) => format!("{:.1}%", f * 100.0),
        None => "n/a".to_string(),
    };
    println!("working directory: {}", report.root.display());
    println!(
        "volume: total {} used {} free {} ({free} free)",
        volume.total_bytes, volume.used_bytes, volume.free_bytes
    );
    println!("{} recording directories, newest first:", report.candidates.len());
    for unit in report.candidates.newest_first() {
        println!("{:>12}  {}", unit.key, unit.path.display());
    }
    ExitCode::SUCCESS
}
