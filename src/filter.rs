//! Admin allowlist filtering
//!
//! Writes the working copy of the input log with lines mentioning an
//! allowlisted administrative address removed. The copy is produced even
//! when the allowlist is empty, so the rest of the pipeline always reads
//! from the same well-known file.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::errors::Result;

/// File name of the working copy inside the output directory.
pub const FILTERED_LOG_NAME: &str = "filtered.log";

/// Line counts from one filtering pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub lines_read: usize,
    pub lines_kept: usize,
    pub lines_dropped: usize,
}

/// Drops lines attributable to known administrative addresses.
pub struct AdminFilter {
    allowlist: Vec<String>,
}

impl AdminFilter {
    pub fn new(allowlist: Vec<String>) -> Self {
        AdminFilter { allowlist }
    }

    /// Substring test: a line is administrative when it mentions any
    /// allowlisted address anywhere.
    pub fn is_admin_line(&self, line: &str) -> bool {
        self.allowlist.iter().any(|ip| line.contains(ip.as_str()))
    }

    /// Copies `source` to `dest`, skipping administrative lines. A missing
    /// or unreadable source is fatal.
    pub fn write_filtered(&self, source: &Path, dest: &Path) -> Result<FilterStats> {
        let reader = BufReader::new(File::open(source)?);
        let mut writer = BufWriter::new(File::create(dest)?);
        let mut stats = FilterStats::default();

        for line in reader.lines() {
            let line = line?;
            stats.lines_read += 1;
            if self.is_admin_line(&line) {
                stats.lines_dropped += 1;
                continue;
            }
            writeln!(writer, "{}", line)?;
            stats.lines_kept += 1;
        }
        writer.flush()?;

        debug!(
            "Filtered {} -> {}: kept {}, dropped {}",
            source.display(),
            dest.display(),
            stats.lines_kept,
            stats.lines_dropped
        );
        Ok(stats)
    }
}
