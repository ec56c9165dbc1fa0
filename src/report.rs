use crate::{extract::Extraction, sample_key::SampleKey};
use serde::{Deserialize, Serialize};

/// One entry of the run summary. Absent values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub filepath: String,
    pub subject: Option<String>,
    pub task: Option<String>,
    pub bad_channels: Vec<u64>,
    pub pass1_rejected_count: Option<usize>,
    pub pass1_trials_left: Option<u64>,
    pub pass2_rejected_count: Option<usize>,
    pub pass2_trials_left: Option<u64>,
}

impl FileSummary {
    pub fn new(filepath: String, key: Option<&SampleKey>, extraction: &Extraction) -> Self {
        Self {
            filepath,
            subject: key.map(|k| k.subject.clone()),
            task: key.map(|k| k.task.clone()),
            bad_channels: extraction.bad_channels.clone(),
            pass1_rejected_count: extraction.pass1.rejected_count,
            pass1_trials_left: extraction.pass1.trials_left,
            pass2_rejected_count: extraction.pass2.rejected_count,
            pass2_trials_left: extraction.pass2.trials_left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub filepath: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryRecord {
    Extracted(FileSummary),
    Failed(FileError),
}

impl SummaryRecord {
    pub fn filepath(&self) -> &str {
        match self {
            SummaryRecord::Extracted(s) => &s.filepath,
            SummaryRecord::Failed(e) => &e.filepath,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SummaryRecord::Extracted(_))
    }
}
