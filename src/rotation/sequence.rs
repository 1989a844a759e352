//! Sequence suffix discovery and allocation
//!
//! Fixed-name targets are written as `<baseName>.<NNN>`. On startup the
//! target directory is listed once and the highest numeric suffix already
//! present seeds the allocator, so a restarted reporter continues the
//! sequence instead of appending to an old file.

use std::path::Path;

use tracing::debug;

use crate::reporter::{ReporterError, ReporterResult};

/// Minimum number of digits in a formatted suffix
pub const MIN_SUFFIX_WIDTH: usize = 3;

/// Format a suffix zero-padded to at least [`MIN_SUFFIX_WIDTH`] digits
///
/// Wider values are never truncated: `999` is followed by `1000`.
pub fn format_suffix(value: u64) -> String {
    format!("{:0width$}", value, width = MIN_SUFFIX_WIDTH)
}

/// Parse the numeric suffix of `file_name` if it is `<base_name>.<digits>`
///
/// Only that exact shape counts. Names that merely contain the base name or
/// have trailing text after the digits, such as `other-base.005` or
/// `base.010x`, are ignored.
pub fn parse_suffix(file_name: &str, base_name: &str) -> Option<u64> {
    let suffix = file_name.strip_prefix(base_name)?.strip_prefix('.')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Overlong digit runs fail to parse and are ignored like any other junk
    suffix.parse().ok()
}

/// Highest numeric suffix among `names`, or 0 if none matches
pub fn max_suffix<I, S>(names: I, base_name: &str) -> u64
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| parse_suffix(name.as_ref(), base_name))
        .max()
        .unwrap_or(0)
}

/// List the entry names of a directory
pub async fn read_dir_names(directory: &Path) -> ReporterResult<Vec<String>> {
    let unreadable = |source| ReporterError::DirectoryUnreadable {
        path: directory.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(directory).await.map_err(unreadable)?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Stateful allocator of monotonically increasing suffixes
#[derive(Debug, Clone)]
pub struct SequenceAllocator {
    last: u64,
}

impl SequenceAllocator {
    /// Create an allocator whose first suffix is `last + 1`
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    /// Scan `directory` once and seed from the files named after `base_name`
    pub async fn discover(directory: &Path, base_name: &str) -> ReporterResult<Self> {
        let names = read_dir_names(directory).await?;
        let seed = max_suffix(&names, base_name);

        debug!(
            directory = %directory.display(),
            base_name,
            entries = names.len(),
            seed,
            "discovered sequence seed"
        );

        Ok(Self::starting_after(seed))
    }

    /// Issue the next suffix
    pub fn next(&mut self) -> String {
        self.last = self.last.saturating_add(1);
        format_suffix(self.last)
    }

    /// The most recently issued value (the seed before the first call)
    pub fn last_issued(&self) -> u64 {
        self.last
    }
}
