use crate::{
    config::Config,
    extract,
    layout::OutputLayout,
    report::{FileError, FileSummary, SummaryRecord},
    sample_key::SampleKey,
    util::{expand_home, read_lossy},
    writer,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct Batch {
    cfg: Config,
    layout: OutputLayout,
    base_dir: PathBuf,
}

pub struct BatchOutcome {
    pub records: Vec<SummaryRecord>,
    pub summary_path: Option<PathBuf>,
    pub removed_dirs: Vec<PathBuf>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.is_ok()).count()
    }
}

impl Batch {
    pub fn new(cfg: &Config) -> Self {
        Self {
            cfg: cfg.clone(),
            layout: OutputLayout::from_config(cfg),
            base_dir: expand_home(&cfg.input.base_dir),
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Input files matching the configured pattern, sorted.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let base = glob::Pattern::escape(&self.base_dir.to_string_lossy());
        let pattern = format!("{}/{}", base.trim_end_matches('/'), self.cfg.input.pattern);
        debug!("glob {pattern}");

        let mut files = Vec::new();
        for entry in glob::glob(&pattern).with_context(|| format!("bad glob: {pattern}"))? {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(path) => debug!("skipping non-file match {}", path.display()),
                Err(err) => warn!("unreadable glob entry: {err}"),
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn run(&self) -> Result<BatchOutcome> {
        self.layout.ensure_dirs()?;

        let files = self.discover()?;
        info!(
            "found {} files under {}",
            files.len(),
            self.base_dir.display()
        );
        self.progress(format_args!(
            "Found {} files\nOutput directories: {}, {}\n",
            files.len(),
            self.layout.channels_dir().display(),
            self.layout.epochs_dir().display()
        ));

        let mut records = Vec::with_capacity(files.len());
        for path in &files {
            let record = self.process_file(path);
            self.print_record(&record);
            records.push(record);
        }

        let summary_path = if self.cfg.output.write_summary {
            let path = self.layout.summary_path();
            let json = serde_json::to_string_pretty(&records)?;
            std::fs::write(&path, json)
                .with_context(|| format!("write summary: {}", path.display()))?;
            self.progress(format_args!("Summary saved to {}", path.display()));
            Some(path)
        } else {
            None
        };

        let removed_dirs = if self.cfg.cleanup.enabled {
            self.cleanup_legacy_dirs()?
        } else {
            Vec::new()
        };

        let outcome = BatchOutcome {
            records,
            summary_path,
            removed_dirs,
        };
        self.print_stats(&outcome);
        info!(
            "processed {}/{} files successfully",
            outcome.succeeded(),
            outcome.records.len()
        );
        Ok(outcome)
    }

    /// Never fails; problems with the file end up in the returned record.
    pub fn process_file(&self, path: &Path) -> SummaryRecord {
        let filepath = path.display().to_string();
        match self.try_process(path, filepath.clone()) {
            Ok(summary) => SummaryRecord::Extracted(summary),
            Err(err) => {
                warn!("{filepath}: {err:#}");
                SummaryRecord::Failed(FileError {
                    filepath,
                    error: format!("{err:#}"),
                })
            }
        }
    }

    fn try_process(&self, path: &Path, filepath: String) -> Result<FileSummary> {
        let content = read_lossy(path)?;
        let extraction = extract::extract(&content);
        let key = SampleKey::from_path(path);

        match &key {
            Some(key) => writer::write_sample(
                &self.layout,
                key,
                &extraction.bad_channels,
                extraction.pass1.rejected_indices.as_deref(),
                extraction.pass2.rejected_indices.as_deref(),
            )
            .with_context(|| format!("writing artifacts for {key}"))?,
            None => warn!("no subject/task in file name, no artifacts written: {filepath}"),
        }

        Ok(FileSummary::new(filepath, key.as_ref(), &extraction))
    }

    fn cleanup_legacy_dirs(&self) -> Result<Vec<PathBuf>> {
        let root = Path::new(&self.cfg.output.root);
        let mut removed = Vec::new();
        for name in &self.cfg.cleanup.legacy_dirs {
            let dir = root.join(name);
            if self.layout.owns(&dir) {
                debug!("not removing active output dir {}", dir.display());
                continue;
            }
            if !dir.is_dir() {
                continue;
            }
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("remove_dir_all {}", dir.display()))?;
            info!("removed old directory {}", dir.display());
            self.progress(format_args!("Removed old directory: {}", dir.display()));
            removed.push(dir);
        }
        Ok(removed)
    }

    fn print_record(&self, record: &SummaryRecord) {
        let path = Path::new(record.filepath());
        let rel = path.strip_prefix(&self.base_dir).unwrap_or(path);
        self.progress(format_args!("File: {}", rel.display()));

        match record {
            SummaryRecord::Failed(e) => self.progress(format_args!("  ERROR: {}\n", e.error)),
            SummaryRecord::Extracted(s) => self.progress(format_args!(
                "  Subject: S{}, Task: {}\n  Bad channels: {} channels\n  Pass 1 - Rejected count: {}, Trials left: {}\n  Pass 2 - Rejected count: {}, Trials left: {}\n",
                show(&s.subject),
                show(&s.task),
                s.bad_channels.len(),
                show(&s.pass1_rejected_count),
                show(&s.pass1_trials_left),
                show(&s.pass2_rejected_count),
                show(&s.pass2_trials_left),
            )),
        }
    }

    fn print_stats(&self, outcome: &BatchOutcome) {
        let ok = outcome.succeeded();
        let channels = dir_label(self.layout.channels_dir());
        let epochs = dir_label(self.layout.epochs_dir());
        self.progress(format_args!(
            "\nProcessed {ok}/{} files successfully",
            outcome.records.len()
        ));
        self.progress(format_args!(
            "Generated {ok} pass 1 index files in {epochs}/"
        ));
        self.progress(format_args!(
            "Generated {ok} pass 2 index files in {epochs}/"
        ));
        self.progress(format_args!(
            "Generated {ok} bad channel tables in {channels}/"
        ));
    }

    fn progress(&self, msg: std::fmt::Arguments<'_>) {
        if self.cfg.global.print_progress {
            println!("{msg}");
        }
    }
}

fn show<T: std::fmt::Display>(v: &Option<T>) -> String {
    v.as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "None".to_string())
}

fn dir_label(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}
