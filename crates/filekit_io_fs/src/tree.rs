//! Recursive purge / delete / copy walks.
//!
//! Walks are best-effort: a failing entry is recorded in the report and left
//! out of the count, and the traversal goes on with its siblings. Only
//! top-level precondition failures surface as [`FsError`].

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::{ReportTree, ReportTreeBuilder};
use crate::spec::{
    EnumCopySymlinkStrategy, EnumEmptyDirDelete, EnumFsOutcome, FsError, SpecFileManagerOptions,
};
use crate::util::{
    copy_file_with_metadata, create_dir_chain, create_symbolic_link, derive_parent_dir,
    ensure_trailing_separator, is_overlap,
};

#[derive(Debug, Clone)]
struct SpecChildEntry {
    path_entry: PathBuf,
    name_entry: String,
    file_type: fs::FileType,
}

/// Read the children of `path_dir` sorted by name.
///
/// The directory handle is dropped before the caller descends.
fn read_children(
    path_dir: &Path,
    builder_report: &mut ReportTreeBuilder,
) -> std::io::Result<Vec<SpecChildEntry>> {
    let mut l_children = Vec::new();
    for entry_res in fs::read_dir(path_dir)? {
        let entry = match entry_res {
            Ok(v) => v,
            Err(e) => {
                builder_report.add_warning(format!(
                    "Failed to read directory entry under {} ({e})",
                    path_dir.display()
                ));
                continue;
            }
        };
        let path_entry = entry.path();
        let file_type = match entry.file_type() {
            Ok(v) => v,
            Err(e) => {
                builder_report.add_warning(format!("Failed to inspect {} ({e})", path_entry.display()));
                continue;
            }
        };
        l_children.push(SpecChildEntry {
            path_entry,
            name_entry: entry.file_name().to_string_lossy().to_string(),
            file_type,
        });
    }
    l_children.sort_by(|a, b| a.name_entry.cmp(&b.name_entry));
    Ok(l_children)
}

fn require_dir(path_dir: &Path) -> Result<(), FsError> {
    let meta = fs::metadata(path_dir).map_err(|e| FsError::from_io(path_dir, e))?;
    if !meta.is_dir() {
        return Err(FsError::NotFound(path_dir.to_path_buf()));
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// #region Purge

/// Remove everything inside `dir`, keeping `dir` itself.
pub fn purge_tree(dir: &Path) -> Result<ReportTree, FsError> {
    require_dir(dir)?;
    let mut builder_report = ReportTreeBuilder::default();
    let l_children =
        read_children(dir, &mut builder_report).map_err(|e| FsError::from_io(dir, e))?;
    purge_children(l_children, &mut builder_report);

    let report = builder_report.build();
    tracing::debug!(path = %dir.display(), "{}", report.format("[PURGE]"));
    Ok(report)
}

fn purge_children(l_children: Vec<SpecChildEntry>, builder_report: &mut ReportTreeBuilder) {
    for child in l_children {
        builder_report.add_scanned();
        // `file_type` does not follow symlinks, so a link to a directory is unlinked.
        if child.file_type.is_dir() {
            match read_children(&child.path_entry, builder_report) {
                Ok(l_grandchildren) => purge_children(l_grandchildren, builder_report),
                Err(e) => builder_report.add_warning(format!(
                    "Failed to read directory {} ({e})",
                    child.path_entry.display()
                )),
            }
            match fs::remove_dir(&child.path_entry) {
                Ok(()) => builder_report.add_done(),
                Err(e) => builder_report.add_error(child.path_entry, e.to_string()),
            }
        } else {
            match fs::remove_file(&child.path_entry) {
                Ok(()) => builder_report.add_done(),
                Err(e) => builder_report.add_error(child.path_entry, e.to_string()),
            }
        }
    }
}

/// Delete a file, or a directory tree (optionally keeping the root).
pub fn delete_path(
    path: &Path,
    if_delete_self: bool,
    spec_options: &SpecFileManagerOptions,
) -> Result<EnumFsOutcome, FsError> {
    let meta = fs::symlink_metadata(path).map_err(|e| FsError::from_io(path, e))?;
    if !meta.is_dir() {
        fs::remove_file(path).map_err(|e| FsError::from_io(path, e))?;
        tracing::debug!(path = %path.display(), "file deleted");
        return Ok(EnumFsOutcome::Done);
    }

    let path_dir = PathBuf::from(ensure_trailing_separator(path));
    let n_total = purge_tree(&path_dir)?.cnt_done;

    if n_total == 0 {
        return match spec_options.rule_empty_dir_delete {
            EnumEmptyDirDelete::ReportFailure => Ok(EnumFsOutcome::Failed),
            EnumEmptyDirDelete::RemoveSelf if if_delete_self => {
                fs::remove_dir(&path_dir).map_err(|e| FsError::from_io(&path_dir, e))?;
                Ok(EnumFsOutcome::Count(1))
            }
            EnumEmptyDirDelete::RemoveSelf => Ok(EnumFsOutcome::Count(0)),
        };
    }

    if !if_delete_self {
        return Ok(EnumFsOutcome::Count(n_total));
    }
    match fs::remove_dir(&path_dir) {
        Ok(()) => Ok(EnumFsOutcome::Count(n_total + 1)),
        Err(e) => {
            tracing::warn!(path = %path_dir.display(), error = %e, "directory kept after purge");
            Ok(EnumFsOutcome::Count(n_total))
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Copy

struct SpecCopyContext<'a> {
    spec_options: &'a SpecFileManagerOptions,
    builder_report: ReportTreeBuilder,
    /// `(dev, ino)` of the source directories on the current descent path.
    set_ancestor_dirs: HashSet<(u64, u64)>,
}

/// Copy a directory tree into `dir_destination`, creating it when absent.
pub fn copy_tree(
    dir_source: &Path,
    dir_destination: &Path,
    spec_options: &SpecFileManagerOptions,
) -> Result<ReportTree, FsError> {
    require_dir(dir_source)?;
    let path_dir_src = PathBuf::from(ensure_trailing_separator(dir_source));
    let path_dir_dst = PathBuf::from(ensure_trailing_separator(dir_destination));

    if is_overlap(&path_dir_src, &path_dir_dst) {
        return Err(FsError::SourceDestinationOverlap {
            path_src: path_dir_src,
            path_dst: path_dir_dst,
        });
    }
    create_dir_chain(&path_dir_dst, spec_options.mode_permission)?;

    let mut spec_cp_ctx = SpecCopyContext {
        spec_options,
        builder_report: ReportTreeBuilder::default(),
        set_ancestor_dirs: HashSet::new(),
    };
    spec_cp_ctx
        .set_ancestor_dirs
        .extend(derive_dir_key(&path_dir_src));
    walk_copy(&path_dir_src, &path_dir_dst, &mut spec_cp_ctx);

    let report = spec_cp_ctx.builder_report.build();
    tracing::debug!(
        src = %path_dir_src.display(),
        dst = %path_dir_dst.display(),
        "{}",
        report.format("[COPY]")
    );
    Ok(report)
}

/// Copy one file, creating the destination's parent chain.
pub fn copy_single_file(
    path_file_src: &Path,
    path_file_dst: &Path,
    spec_options: &SpecFileManagerOptions,
) -> Result<EnumFsOutcome, FsError> {
    if let Some(c_parent) = derive_parent_dir(path_file_dst) {
        create_dir_chain(Path::new(&c_parent), spec_options.mode_permission)?;
    }
    copy_file_with_metadata(path_file_src, path_file_dst, spec_options.if_preserve_metadata)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound && !path_file_src.exists() {
                FsError::NotFound(path_file_src.to_path_buf())
            } else {
                FsError::from_io(path_file_dst, e)
            }
        })?;
    Ok(EnumFsOutcome::Done)
}

/// Identity of a directory, following symlinks.
#[cfg(unix)]
fn derive_dir_key(path_dir: &Path) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(path_dir)
        .ok()
        .map(|stat_dir| (stat_dir.dev(), stat_dir.ino()))
}

#[cfg(not(unix))]
fn derive_dir_key(_path_dir: &Path) -> Option<(u64, u64)> {
    None
}

fn walk_copy(path_dir_src: &Path, path_dir_dst: &Path, spec_cp_ctx: &mut SpecCopyContext<'_>) {
    let enum_rule_symlink = spec_cp_ctx.spec_options.rule_symlink;
    let l_children = match read_children(path_dir_src, &mut spec_cp_ctx.builder_report) {
        Ok(v) => v,
        Err(e) => {
            spec_cp_ctx.builder_report.add_warning(format!(
                "Failed to read directory {} ({e})",
                path_dir_src.display()
            ));
            return;
        }
    };

    for child in l_children {
        spec_cp_ctx.builder_report.add_scanned();
        let path_dst = path_dir_dst.join(&child.name_entry);

        let (b_is_dir, b_is_file) = if child.file_type.is_symlink() {
            match enum_rule_symlink {
                EnumCopySymlinkStrategy::SkipSymlinks => {
                    spec_cp_ctx.builder_report.add_skipped();
                    continue;
                }
                EnumCopySymlinkStrategy::CopySymlinks => {
                    match create_symbolic_link(&child.path_entry, &path_dst) {
                        Ok(()) => spec_cp_ctx.builder_report.add_done(),
                        Err(e) => spec_cp_ctx.builder_report.add_error(path_dst, e.to_string()),
                    }
                    continue;
                }
                EnumCopySymlinkStrategy::Dereference => match fs::metadata(&child.path_entry) {
                    Ok(meta_target) => (meta_target.is_dir(), meta_target.is_file()),
                    Err(_) => {
                        spec_cp_ctx.builder_report.add_error(
                            child.path_entry.clone(),
                            format!("Broken symlink: {}", child.path_entry.display()),
                        );
                        continue;
                    }
                },
            }
        } else {
            (child.file_type.is_dir(), child.file_type.is_file())
        };

        if b_is_dir {
            // Only a directory that is its own ancestor is cut; links to
            // siblings are copied in full.
            let key_dir = derive_dir_key(&child.path_entry);
            if key_dir.is_some_and(|k| spec_cp_ctx.set_ancestor_dirs.contains(&k)) {
                spec_cp_ctx.builder_report.add_warning(format!(
                    "Symlink loop detected: {}",
                    child.path_entry.display()
                ));
                spec_cp_ctx.builder_report.add_skipped();
                continue;
            }
            if path_dst.exists() && !path_dst.is_dir() {
                spec_cp_ctx.builder_report.add_error(
                    path_dst.clone(),
                    format!("Destination is a file, expected directory: {}", path_dst.display()),
                );
                continue;
            }
            if let Err(e) = create_dir_chain(&path_dst, spec_cp_ctx.spec_options.mode_permission) {
                spec_cp_ctx.builder_report.add_error(path_dst, e.to_string());
                continue;
            }
            spec_cp_ctx.builder_report.add_done();
            if let Some(k) = key_dir {
                spec_cp_ctx.set_ancestor_dirs.insert(k);
            }
            walk_copy(&child.path_entry, &path_dst, spec_cp_ctx);
            if let Some(k) = key_dir {
                spec_cp_ctx.set_ancestor_dirs.remove(&k);
            }
        } else if b_is_file {
            match copy_file_with_metadata(
                &child.path_entry,
                &path_dst,
                spec_cp_ctx.spec_options.if_preserve_metadata,
            ) {
                Ok(()) => spec_cp_ctx.builder_report.add_done(),
                Err(e) => spec_cp_ctx.builder_report.add_error(path_dst, e.to_string()),
            }
        } else {
            spec_cp_ctx.builder_report.add_warning(format!(
                "Special file skipped: {}",
                child.path_entry.display()
            ));
            spec_cp_ctx.builder_report.add_skipped();
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
