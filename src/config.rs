use crate::layout::LayoutKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub input: Input,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub cleanup: Cleanup,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub print_progress: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_progress: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    /// Root of the dataset; a leading `~/` is expanded from `$HOME`.
    pub base_dir: String,
    /// Glob relative to `base_dir`.
    pub pattern: String,
}
impl Default for Input {
    fn default() -> Self {
        Self {
            base_dir: "~/liensNet/analyse/BRAINLIFE/datasets/Latinus Data".into(),
            pattern: "S*/*AnalysisExplanation/*AnalysisSheet.txt".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub root: String,
    pub layout: LayoutKind,
    pub write_summary: bool,
    pub summary_filename: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            root: ".".into(),
            layout: LayoutKind::Aggregated,
            write_summary: true,
            summary_filename: "summary.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Cleanup {
    pub enabled: bool,
    /// Relative to `output.root`.
    pub legacy_dirs: Vec<String>,
}
impl Default for Cleanup {
    fn default() -> Self {
        Self {
            enabled: true,
            legacy_dirs: vec![
                "bad_channels".into(),
                "bad_epochs".into(),
                "bad_epochs_channels".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
