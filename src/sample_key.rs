use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

static SUBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"S([0-9]+)").expect("subject regex"));
static TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"T[0-9]+(?:_Face1)?").expect("task regex"));

/// `(subject, task)` pair naming every artifact derived from one report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleKey {
    /// Digits only, leading zeros kept (`"01"`).
    pub subject: String,
    /// Verbatim, including a `_Face1` suffix when present (`"T1_Face1"`).
    pub task: String,
}

impl SampleKey {
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_string_lossy();
        Self::from_stem(&stem)
    }

    pub fn from_stem(stem: &str) -> Option<Self> {
        let subject = SUBJECT_RE.captures(stem)?.get(1)?.as_str();
        let task = TASK_RE.find(stem)?.as_str();
        Some(Self {
            subject: subject.to_string(),
            task: task.to_string(),
        })
    }
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}_{}", self.subject, self.task)
    }
}
