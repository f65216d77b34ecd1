//! Tree-walk report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::SpecFsError;

/// Aggregate counters and diagnostics for one purge/copy run.
#[derive(Debug, Default, Clone)]
pub struct ReportTree {
    /// Total entries visited below the root.
    pub cnt_scanned: u64,
    /// Entries removed (purge) or copied/ensured (copy).
    pub cnt_done: u64,
    /// Entries skipped by policy (e.g. skipped symlinks, special files).
    pub cnt_skipped: u64,
    /// Non-fatal warnings collected during traversal.
    pub warnings: Vec<String>,
    /// Per-entry failures swallowed by the walk.
    pub errors: Vec<SpecFsError>,
}

impl ReportTree {
    /// Number of collected entry errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_done".to_string(), self.cnt_done);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} done={} skipped={} errors={} warnings={}",
            self.cnt_scanned,
            self.cnt_done,
            self.cnt_skipped,
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[TREE]"))
    }
}

/// Mutable accumulator for tree statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportTreeBuilder {
    cnt_scanned: u64,
    cnt_done: u64,
    cnt_skipped: u64,
    errors: Vec<SpecFsError>,
    warnings: Vec<String>,
}

impl ReportTreeBuilder {
    /// Increment scanned count by one.
    pub fn add_scanned(&mut self) {
        self.cnt_scanned += 1;
    }

    /// Increment done count by one.
    pub fn add_done(&mut self) {
        self.cnt_done += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, path: PathBuf, exception: String) {
        tracing::warn!(path = %path.display(), "{exception}");
        self.errors.push(SpecFsError { path, exception });
    }

    /// Current done count.
    pub fn cnt_done(&self) -> u64 {
        self.cnt_done
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportTree {
        ReportTree {
            cnt_scanned: self.cnt_scanned,
            cnt_done: self.cnt_done,
            cnt_skipped: self.cnt_skipped,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}
