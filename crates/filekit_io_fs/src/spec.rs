//! File manager specification models and top-level error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Symlink handling policy for recursive copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopySymlinkStrategy {
    /// Follow the link and copy the target bytes/entries.
    Dereference,
    /// Create a symbolic link at destination (do not copy target bytes).
    CopySymlinks,
    /// Ignore symlink entries.
    SkipSymlinks,
}

/// Pattern matching mode for listing include/exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumListPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

/// Entry kinds kept by a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumListFilter {
    /// Files and directories.
    #[default]
    All,
    /// Regular files only.
    Files,
    /// Directories only.
    Folders,
}

/// How `create` opens an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumWriteMode {
    /// Create the file or truncate it to zero length first.
    #[default]
    Truncate,
    /// Create the file or append to its current end.
    Append,
}

/// Naming policy for accepted uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumUploadNaming {
    /// Keep the client-supplied filename.
    #[default]
    Original,
    /// Generate `{unix_seconds}-{1000..=9999}` names.
    Randomize,
}

/// What `delete` does with a directory whose purge removed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumEmptyDirDelete {
    /// Leave the directory in place and answer [`EnumFsOutcome::Failed`].
    #[default]
    ReportFailure,
    /// Remove the empty directory and answer `Count(1)` (or `Count(0)` when
    /// the directory itself is kept).
    RemoveSelf,
}

/// One MIME resolution step. Strategies run in order; the first hit wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumMimeStrategy {
    /// Built-in extension table.
    Table,
    /// Magic-number content sniffing.
    Sniff,
}

/// Result of a file manager operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFsOutcome {
    /// Number of entries touched by a tree operation.
    Count(u64),
    /// A single-path operation succeeded.
    Done,
    /// Nothing was done; legacy callers read this as `false`.
    Failed,
}

impl EnumFsOutcome {
    /// `false` only for [`EnumFsOutcome::Failed`].
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed)
    }

    /// Entry count for tree operations.
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            Self::Done | Self::Failed => None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// File manager configuration, fixed at construction.
#[derive(Debug, Clone)]
pub struct SpecFileManagerOptions {
    /// Permission bits for directories/files this manager creates.
    /// `None` leaves the platform default (subject to umask).
    pub mode_permission: Option<u32>,
    /// Upload naming policy.
    pub rule_upload_naming: EnumUploadNaming,
    /// Symlink handling during recursive copy.
    pub rule_symlink: EnumCopySymlinkStrategy,
    /// Behavior of `delete` on an already empty directory.
    pub rule_empty_dir_delete: EnumEmptyDirDelete,
    /// Ordered MIME resolution strategies used by listings.
    pub rules_mime: Vec<EnumMimeStrategy>,
    /// Copy permissions, timestamps and xattrs along with file bytes (Linux).
    pub if_preserve_metadata: bool,
}

impl Default for SpecFileManagerOptions {
    fn default() -> Self {
        Self {
            mode_permission: None,
            rule_upload_naming: EnumUploadNaming::Original,
            rule_symlink: EnumCopySymlinkStrategy::Dereference,
            rule_empty_dir_delete: EnumEmptyDirDelete::ReportFailure,
            rules_mime: vec![EnumMimeStrategy::Table, EnumMimeStrategy::Sniff],
            if_preserve_metadata: false,
        }
    }
}

/// Name filters for [`crate::FileManager::list_matching`].
#[derive(Debug, Clone)]
pub struct SpecListOptions {
    /// Entry kinds to keep.
    pub filter: EnumListFilter,
    /// Include patterns applied to entry basename.
    pub patterns_include: Option<Vec<String>>,
    /// Exclude patterns applied to entry basename.
    pub patterns_exclude: Option<Vec<String>>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumListPatternMode,
}

impl Default for SpecListOptions {
    fn default() -> Self {
        Self {
            filter: EnumListFilter::All,
            patterns_include: None,
            patterns_exclude: None,
            rule_pattern: EnumListPatternMode::Glob,
        }
    }
}

/// One entry failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFsError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// "Top-level call failed" errors.
#[derive(Debug, Error)]
pub enum FsError {
    /// Operand path does not exist (or is not the expected kind).
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Filesystem refused the operation.
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Some ancestors were created before a later one failed.
    #[error("Created {created} of the missing ancestors of {} before failing: {source}", .path.display())]
    PartialCreate {
        /// Directory whose chain was being created.
        path: PathBuf,
        /// Number of ancestors that now exist but did not before the call.
        created: usize,
        /// Error of the failing step.
        #[source]
        source: io::Error,
    },

    /// Source and destination overlap (`src` contains `dst` or vice versa).
    #[error("Source and destination directories overlap: {} <-> {}", .path_src.display(), .path_dst.display())]
    SourceDestinationOverlap {
        /// Source directory.
        path_src: PathBuf,
        /// Destination directory.
        path_dst: PathBuf,
    },

    /// Invalid include/exclude pattern.
    #[error("{0}")]
    InvalidPattern(String),

    /// Parallel upload arrays of one field have different lengths.
    #[error("Upload field `{field}` has mismatched array lengths: {lengths:?}")]
    UploadFieldMismatch {
        /// Field name.
        field: String,
        /// Lengths of name/tmp path/type/size/error arrays, in that order.
        lengths: [usize; 5],
    },

    /// Any other IO failure.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// Path the failing syscall acted on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Classify an IO error raised while acting on `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
