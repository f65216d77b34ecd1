//! One-level directory listing with file metadata enrichment.

use std::fs;
use std::path::Path;

use crate::mime::resolve_mime;
use crate::spec::{EnumListFilter, EnumMimeStrategy, FsError, SpecListOptions};
use crate::util::{SpecListPatterns, derive_extension, ensure_trailing_separator};

/// Metadata carried by file entries only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFileDetails {
    /// Lower-cased substring after the last `.` of the name (`""` if none).
    pub extension: String,
    /// Resolved MIME type.
    pub mime_type: String,
    /// Size in KiB, rounded to nearest.
    pub size_kib: u64,
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecListEntry {
    /// Entry basename.
    pub name: String,
    /// Listed directory path (forward slashes) joined with `name`.
    pub path: String,
    /// Whether the entry is a directory (symlinks are followed).
    pub if_is_dir: bool,
    /// `Some` for files, `None` for directories.
    pub details: Option<SpecFileDetails>,
}

fn round_kib(n_bytes: u64) -> u64 {
    (n_bytes as f64 / 1024.0).round() as u64
}

/// List the immediate children of `path`.
///
/// Returns `Ok(None)` when the directory cannot be opened or has no children.
/// Errors only on invalid name patterns.
pub fn list_dir(
    path: &Path,
    spec_list_options: &SpecListOptions,
    rules_mime: &[EnumMimeStrategy],
) -> Result<Option<Vec<SpecListEntry>>, FsError> {
    let spec_list_pats = SpecListPatterns::from_raw(
        spec_list_options.patterns_include.as_deref(),
        spec_list_options.patterns_exclude.as_deref(),
        spec_list_options.rule_pattern,
    )?;
    let c_dir = ensure_trailing_separator(path);

    let iter_entries = match fs::read_dir(&c_dir) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(path = %c_dir, error = %e, "directory not listable");
            return Ok(None);
        }
    };
    let mut l_names: Vec<String> = iter_entries
        .filter_map(|entry_res| entry_res.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name != "." && name != "..")
        .collect();
    if l_names.is_empty() {
        return Ok(None);
    }
    l_names.sort();

    let mut l_entries = Vec::with_capacity(l_names.len());
    for name in l_names {
        let c_path = format!("{c_dir}{name}");
        let meta = fs::metadata(&c_path).ok();
        let b_is_dir = meta.as_ref().is_some_and(|m| m.is_dir());

        match spec_list_options.filter {
            EnumListFilter::Files if b_is_dir => continue,
            EnumListFilter::Folders if !b_is_dir => continue,
            _ => {}
        }
        if spec_list_pats.should_exclude(&name) {
            continue;
        }

        let details = if b_is_dir {
            None
        } else {
            let extension = derive_extension(&name).to_lowercase();
            let mime_type = resolve_mime(Path::new(&c_path), &extension, rules_mime);
            Some(SpecFileDetails {
                mime_type,
                size_kib: round_kib(meta.map_or(0, |m| m.len())),
                extension,
            })
        };
        l_entries.push(SpecListEntry {
            name,
            path: c_path,
            if_is_dir: b_is_dir,
            details,
        });
    }
    Ok(Some(l_entries))
}
