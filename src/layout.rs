use crate::{config::Config, extract::Pass, sample_key::SampleKey, util::ensure_dir};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory and file-naming scheme for per-sample artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// `AggregatedChannelDrop/` + `AggregatedTrialDrop/`.
    #[default]
    Aggregated,
    /// `bad_channels/` + `bad_epochs/`, the older naming.
    Split,
}

impl LayoutKind {
    fn channels_dir_name(self) -> &'static str {
        match self {
            LayoutKind::Aggregated => "AggregatedChannelDrop",
            LayoutKind::Split => "bad_channels",
        }
    }

    fn epochs_dir_name(self) -> &'static str {
        match self {
            LayoutKind::Aggregated => "AggregatedTrialDrop",
            LayoutKind::Split => "bad_epochs",
        }
    }

    fn channels_stem(self, key: &SampleKey) -> String {
        match self {
            LayoutKind::Aggregated => key.to_string(),
            LayoutKind::Split => format!("{key}_bad_channels"),
        }
    }

    fn pass_suffix(self, pass: Pass) -> &'static str {
        match (self, pass) {
            (LayoutKind::Aggregated, Pass::First) => "Firstpass",
            (LayoutKind::Aggregated, Pass::Second) => "Secondpass",
            (LayoutKind::Split, Pass::First) => "pass1",
            (LayoutKind::Split, Pass::Second) => "pass2",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputLayout {
    kind: LayoutKind,
    channels_dir: PathBuf,
    epochs_dir: PathBuf,
    summary_filename: String,
}

impl OutputLayout {
    pub fn new(kind: LayoutKind, root: &Path, summary_filename: &str) -> Self {
        Self {
            kind,
            channels_dir: root.join(kind.channels_dir_name()),
            epochs_dir: root.join(kind.epochs_dir_name()),
            summary_filename: summary_filename.to_string(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.output.layout,
            Path::new(&cfg.output.root),
            &cfg.output.summary_filename,
        )
    }

    pub fn channels_dir(&self) -> &Path {
        &self.channels_dir
    }

    pub fn epochs_dir(&self) -> &Path {
        &self.epochs_dir
    }

    pub fn channel_table(&self, key: &SampleKey) -> PathBuf {
        self.channels_dir
            .join(format!("{}.tsv", self.kind.channels_stem(key)))
    }

    pub fn channel_names(&self, key: &SampleKey) -> PathBuf {
        self.channels_dir
            .join(format!("{}.txt", self.kind.channels_stem(key)))
    }

    pub fn pass_indices(&self, key: &SampleKey, pass: Pass) -> PathBuf {
        self.epochs_dir
            .join(format!("{key}_{}.txt", self.kind.pass_suffix(pass)))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.channels_dir.join(&self.summary_filename)
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        ensure_dir(&self.channels_dir)?;
        ensure_dir(&self.epochs_dir)
    }

    /// True when `dir` is one of the directories this layout writes into.
    pub fn owns(&self, dir: &Path) -> bool {
        dir == self.channels_dir || dir == self.epochs_dir
    }
}
