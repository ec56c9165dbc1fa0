use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

pub const BAD_CHANNELS_MARKER: &str = "Bad channels:";
pub const REJECTED_COUNT_MARKER: &str = "Total No. of rejected epochs:";
pub const INDICES_MARKER: &str = "Indices of rejected epochs:";
pub const TRIALS_LEFT_MARKER: &str = "Total No. of trials left:";

/// A continuation line containing any of these ends a multi-line index list.
pub const STOP_MARKERS: [&str; 11] = [
    "marked epochs file:",
    "rejected file:",
    "Total No.",
    "ICA file:",
    "Subtracted",
    "Converted",
    "Low-pass",
    "SEPARATED INTO:",
    "Direct:",
    "Extreme:",
    "Intermediate:",
];

/// Lines searched for the index list, counted from the rejected-count line.
pub const INDICES_WINDOW: usize = 5;
/// Lines searched for the trials-left count, counted from the rejected-count line.
pub const TRIALS_LEFT_WINDOW: usize = 10;

static BAD_CHANNELS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bad channels:\s*([0-9\s]+)").expect("bad channels regex"));
static REJECTED_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Total No\. of rejected epochs:\s*([0-9]+)").expect("rejected count regex")
});
static TRIALS_LEFT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Total No\. of trials left:\s*([0-9]+)").expect("trials left regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    First,
    Second,
}

impl Pass {
    pub fn number(self) -> usize {
        match self {
            Pass::First => 1,
            Pass::Second => 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassStats {
    /// Length of `rejected_indices`, not the count the report claims.
    pub rejected_count: Option<usize>,
    /// 1-based, in source order, duplicates kept.
    pub rejected_indices: Option<Vec<u64>>,
    pub trials_left: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub bad_channels: Vec<u64>,
    pub pass1: PassStats,
    pub pass2: PassStats,
}

/// Everything found under each `Total No. of rejected epochs:` line, in order.
///
/// The three lists are filled independently: an occurrence without an index
/// list still contributes its trials-left value, and vice versa.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionScan {
    /// `None` when the count's digits do not fit a `u64`.
    pub reported_counts: Vec<Option<u64>>,
    pub indices: Vec<Vec<u64>>,
    pub trials_left: Vec<u64>,
}

impl RejectionScan {
    pub fn pass(&self, pass: Pass) -> PassStats {
        let i = pass.number() - 1;
        let indices = self.indices.get(i).cloned();
        PassStats {
            rejected_count: indices.as_ref().map(Vec::len),
            rejected_indices: indices,
            trials_left: self.trials_left.get(i).copied(),
        }
    }
}

pub fn extract(content: &str) -> Extraction {
    let lines: Vec<&str> = content.split('\n').collect();
    let scan = scan_rejection_passes(&lines);
    Extraction {
        bad_channels: bad_channels(content),
        pass1: scan.pass(Pass::First),
        pass2: scan.pass(Pass::Second),
    }
}

/// Channel numbers following the first `Bad channels:` marker.
///
/// The digit run may continue onto following lines.
pub fn bad_channels(content: &str) -> Vec<u64> {
    BAD_CHANNELS_RE
        .captures(content)
        .map(|caps| numeric_tokens(&caps[1]))
        .unwrap_or_default()
}

pub fn scan_rejection_passes(lines: &[&str]) -> RejectionScan {
    let mut scan = RejectionScan::default();

    for (i, line) in lines.iter().enumerate() {
        if !line.contains(REJECTED_COUNT_MARKER) {
            continue;
        }
        let Some(caps) = REJECTED_COUNT_RE.captures(line) else {
            continue;
        };
        let reported: Option<u64> = caps[1].parse().ok();
        scan.reported_counts.push(reported);

        if let Some(indices) = indices_after(lines, i) {
            if reported != Some(indices.len() as u64) {
                debug!(
                    line = i + 1,
                    reported = caps[1].trim(),
                    parsed = indices.len(),
                    "rejected epoch count differs from parsed indices"
                );
            }
            scan.indices.push(indices);
        }

        if let Some(left) = trials_left_after(lines, i) {
            scan.trials_left.push(left);
        }
    }

    scan
}

pub fn is_stop_line(line: &str) -> bool {
    STOP_MARKERS.iter().any(|m| line.contains(m))
}

/// Whitespace-separated tokens made only of ASCII digits, in order.
pub fn numeric_tokens(s: &str) -> Vec<u64> {
    s.split_whitespace()
        .filter(|t| t.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|t| t.parse().ok())
        .collect()
}

fn indices_after(lines: &[&str], start: usize) -> Option<Vec<u64>> {
    let end = (start + INDICES_WINDOW).min(lines.len());
    let j = (start..end).find(|&j| lines[j].contains(INDICES_MARKER))?;

    let mut text = lines[j]
        .split_once(INDICES_MARKER)
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_default();

    for next in &lines[j + 1..] {
        let trimmed = next.trim();
        if trimmed.is_empty() || is_stop_line(next) {
            break;
        }
        text.push(' ');
        text.push_str(trimmed);
    }

    Some(numeric_tokens(&text))
}

fn trials_left_after(lines: &[&str], start: usize) -> Option<u64> {
    let end = (start + TRIALS_LEFT_WINDOW).min(lines.len());
    let line = lines[start..end]
        .iter()
        .find(|l| l.contains(TRIALS_LEFT_MARKER))?;
    captured_count(&TRIALS_LEFT_RE, line)
}

fn captured_count(re: &Regex, line: &str) -> Option<u64> {
    re.captures(line).and_then(|caps| caps[1].parse().ok())
}
