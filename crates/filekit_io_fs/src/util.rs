use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{EnumListPatternMode, FsError};

////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Rewrite backslash separators to forward slashes.
pub(crate) fn normalize_separators(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Forward-slash path that always ends with `/`.
pub(crate) fn ensure_trailing_separator(path: &Path) -> String {
    let mut c_path = normalize_separators(path);
    if !c_path.ends_with('/') {
        c_path.push('/');
    }
    c_path
}

/// Parent directory of a forward-slash path, including its trailing `/`.
///
/// Returns `None` for bare names, which live in the working directory.
pub(crate) fn derive_parent_dir(path: &Path) -> Option<String> {
    let c_path = normalize_separators(path);
    let n_idx = c_path.trim_end_matches('/').rfind('/')?;
    Some(c_path[..=n_idx].to_string())
}

/// Substring after the last `.` of `name`, or `""` when there is none.
pub(crate) fn derive_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(n_idx) => &name[n_idx + 1..],
        None => "",
    }
}

/// Absolute form of `path` with its longest existing prefix canonicalized.
fn _absolutize_path(path: &Path) -> PathBuf {
    let path_abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };

    let mut path_existing = path_abs.as_path();
    let mut l_tail = Vec::new();
    loop {
        if let Ok(resolved) = fs::canonicalize(path_existing) {
            return l_tail
                .iter()
                .rev()
                .fold(resolved, |acc: PathBuf, part| acc.join(part));
        }
        match (path_existing.parent(), path_existing.file_name()) {
            (Some(parent), Some(name)) => {
                l_tail.push(name.to_os_string());
                path_existing = parent;
            }
            _ => return path_abs,
        }
    }
}

pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = _absolutize_path(src);
    let dst_resolved = _absolutize_path(dst);
    dst_resolved.starts_with(&src_resolved) || src_resolved.starts_with(&dst_resolved)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CreateAndCopy

/// Create `path` and every missing ancestor, top-down.
///
/// Returns how many directories were created. A failure after at least one
/// ancestor was created is reported as [`FsError::PartialCreate`].
pub(crate) fn create_dir_chain(path: &Path, mode_permission: Option<u32>) -> Result<usize, FsError> {
    let mut l_missing: Vec<&Path> = Vec::new();
    let mut path_cursor = Some(path);
    while let Some(path_dir) = path_cursor {
        if path_dir.as_os_str().is_empty() || path_dir.exists() {
            break;
        }
        l_missing.push(path_dir);
        path_cursor = path_dir.parent();
    }

    let mut n_created = 0;
    for path_dir in l_missing.into_iter().rev() {
        match _create_single_dir(path_dir, mode_permission) {
            Ok(()) => n_created += 1,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path_dir.is_dir() => {}
            Err(e) if n_created > 0 => {
                return Err(FsError::PartialCreate {
                    path: path.to_path_buf(),
                    created: n_created,
                    source: e,
                });
            }
            Err(e) => return Err(FsError::from_io(path_dir, e)),
        }
    }
    Ok(n_created)
}

fn _create_single_dir(path_dir: &Path, mode_permission: Option<u32>) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        if let Some(mode) = mode_permission {
            builder.mode(mode);
        }
    }
    #[cfg(not(unix))]
    let _ = mode_permission;
    builder.create(path_dir)
}

/// Apply configured permission bits to a file this crate created.
pub(crate) fn apply_file_mode(path_file: &Path, mode_permission: Option<u32>) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode_permission {
            fs::set_permissions(path_file, fs::Permissions::from_mode(mode))?;
        }
    }
    #[cfg(not(unix))]
    let _ = (path_file, mode_permission);
    Ok(())
}

pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_preserve_metadata: bool,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;
    #[cfg(target_os = "linux")]
    {
        if if_preserve_metadata {
            apply_metadata_linux(path_file_src, path_file_dst)?;
        }
    }
    #[cfg(not(target_os = "linux"))]
    let _ = if_preserve_metadata;
    Ok(())
}

#[cfg(target_os = "linux")]
fn apply_metadata_linux(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let Ok(iter_xattr_names) = xattr::list(path_file_src) else {
        return;
    };
    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(path = %path_file_dst.display(), error = %e, "xattr not copied");
        }
    }
}

pub(crate) fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    let target = fs::read_link(path_src)?;

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(&target, path_dst)
        } else {
            symlink_file(&target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, path_dst);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypeListPatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypeListPatternSeq {
    fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
            Self::Glob(v) => v.iter().any(|p| p.is_match(value)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(value)),
        }
    }
}

/// Compiled include/exclude name filters.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpecListPatterns {
    patterns_include: Option<TypeListPatternSeq>,
    patterns_exclude: Option<TypeListPatternSeq>,
}

impl SpecListPatterns {
    pub(crate) fn from_raw(
        patterns_include: Option<&[String]>,
        patterns_exclude: Option<&[String]>,
        rule_pattern: EnumListPatternMode,
    ) -> Result<Self, FsError> {
        Ok(Self {
            patterns_include: _compile(patterns_include, rule_pattern)?,
            patterns_exclude: _compile(patterns_exclude, rule_pattern)?,
        })
    }

    /// `true` when `value` fails the include list or hits the exclude list.
    pub(crate) fn should_exclude(&self, value: &str) -> bool {
        let b_included = self
            .patterns_include
            .as_ref()
            .is_none_or(|p| p.is_match(value));
        let b_excluded = self
            .patterns_exclude
            .as_ref()
            .is_some_and(|p| p.is_match(value));
        !b_included || b_excluded
    }
}

fn _compile(
    patterns: Option<&[String]>,
    rule_pattern: EnumListPatternMode,
) -> Result<Option<TypeListPatternSeq>, FsError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };
    if patterns.is_empty() {
        return Ok(None);
    }

    let seq = match rule_pattern {
        EnumListPatternMode::Literal => TypeListPatternSeq::Literal(patterns.to_vec()),
        EnumListPatternMode::Glob => TypeListPatternSeq::Glob(
            patterns
                .iter()
                .map(|p| {
                    Glob::new(p).map(|g| g.compile_matcher()).map_err(|e| {
                        FsError::InvalidPattern(format!("Invalid pattern in include/exclude: {e}"))
                    })
                })
                .collect::<Result<_, _>>()?,
        ),
        EnumListPatternMode::Regex => TypeListPatternSeq::Regex(
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        FsError::InvalidPattern(format!("Invalid pattern in include/exclude: {e}"))
                    })
                })
                .collect::<Result<_, _>>()?,
        ),
    };
    Ok(Some(seq))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
