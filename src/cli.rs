use crate::{
    batch::Batch,
    config::Config,
    extract,
    report::FileSummary,
    sample_key::SampleKey,
    util::{ensure_dir, read_lossy},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "sheet-extract")]
#[command(about = "Extract bad channels and rejected epochs from EEG AnalysisSheet reports")]
pub struct Args {
    /// Defaults to `run`.
    #[command(subcommand)]
    pub cmd: Option<Command>,

    /// Path to config TOML. If omitted, uses ./sheet-extract.toml if present,
    /// otherwise built-in defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Process every matching report and write artifacts plus summary.
    Run {
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Print the summary record for one report without writing anything.
    Extract {
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the effective configuration.
    Config {},
}

pub fn dispatch(args: Args) -> Result<()> {
    let mut cfg = match resolve_config_path(args.config.as_deref())? {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    let cmd = args.cmd.clone().unwrap_or(Command::Run { out_dir: None });
    if let Command::Run {
        out_dir: Some(dir),
    } = &cmd
    {
        cfg.output.root = dir.display().to_string();
    }

    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &cmd {
        Command::Run { .. } => run(&cfg),
        Command::Extract { input } => extract_one(input),
        Command::Config {} => {
            print!("{}", toml::to_string(&cfg)?);
            Ok(())
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(p) = user {
        if !p.exists() {
            return Err(anyhow!("config does not exist: {}", p.display()));
        }
        return Ok(Some(p.to_path_buf()));
    }
    let default = PathBuf::from("sheet-extract.toml");
    Ok(default.exists().then_some(default))
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn run(cfg: &Config) -> Result<()> {
    let batch = Batch::new(cfg);
    let outcome = batch.run()?;
    info!(
        "done: {} records, {} legacy dirs removed",
        outcome.records.len(),
        outcome.removed_dirs.len()
    );
    Ok(())
}

fn extract_one(input: &Path) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }
    let content = read_lossy(input)?;
    let extraction = extract::extract(&content);
    let key = SampleKey::from_path(input);
    let summary = FileSummary::new(input.display().to_string(), key.as_ref(), &extraction);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    Some(PathBuf::from(&cfg.output.root).join("sheet-extract.log"))
}
