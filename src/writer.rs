use crate::{extract::Pass, layout::OutputLayout, sample_key::SampleKey};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

const TABLE_HEADER: &str = "name\tstatus";
const ROW_END: &str = "\r\n";

/// Writes the four artifacts for one sample, overwriting any earlier ones.
pub fn write_sample(
    layout: &OutputLayout,
    key: &SampleKey,
    bad_channels: &[u64],
    pass1: Option<&[u64]>,
    pass2: Option<&[u64]>,
) -> Result<()> {
    write_file(&layout.channel_table(key), &bad_channel_table(bad_channels))?;
    write_file(&layout.channel_names(key), &bad_channel_names(bad_channels))?;
    write_file(
        &layout.pass_indices(key, Pass::First),
        &zero_based_indices(pass1.unwrap_or_default()),
    )?;
    write_file(
        &layout.pass_indices(key, Pass::Second),
        &zero_based_indices(pass2.unwrap_or_default()),
    )?;
    debug!(sample = %key, channels = bad_channels.len(), "artifacts written");
    Ok(())
}

/// Header plus one `E<n>\tbad` row per channel.
pub fn bad_channel_table(bad_channels: &[u64]) -> String {
    let mut out = String::from(TABLE_HEADER);
    out.push_str(ROW_END);
    for ch in bad_channels {
        out.push_str(&format!("E{ch}\tbad{ROW_END}"));
    }
    out
}

pub fn bad_channel_names(bad_channels: &[u64]) -> String {
    bad_channels
        .iter()
        .map(|ch| format!("E{ch}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Reports number epochs from 1; everything downstream expects 0.
pub fn zero_based_indices(indices: &[u64]) -> String {
    indices
        .iter()
        .map(|&i| (i128::from(i) - 1).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}
