//! `filekit_io_fs` v1:
//! Rust-side local file manager.
//!
//! Modules:
//! - `manager` : `FileManager` entry point
//! - `tree`    : purge / delete / copy walks
//! - `list`    : one-level directory listing with metadata
//! - `upload`  : staged upload relocation and validation
//! - `mime`    : extension table and content sniffing
//! - `spec`    : enums/options/errors
//! - `report`  : run-time report model
//! - `util`    : shared helper functions

pub mod list;
pub mod manager;
pub mod mime;
pub mod report;
pub mod spec;
pub mod tree;
pub mod upload;
mod util;

pub use list::{SpecFileDetails, SpecListEntry};
pub use manager::FileManager;
pub use mime::{C_MIME_FALLBACK, lookup_mime_by_extension, resolve_mime, sniff_mime};
pub use report::{ReportTree, ReportTreeBuilder};
pub use spec::{
    EnumCopySymlinkStrategy, EnumEmptyDirDelete, EnumFsOutcome, EnumListFilter,
    EnumListPatternMode, EnumMimeStrategy, EnumUploadNaming, EnumWriteMode, FsError,
    SpecFileManagerOptions, SpecFsError, SpecListOptions,
};
pub use upload::{
    EnumUploadErrorCode, EnumUploadOutcome, UploadDescriptor, UploadField, UploadTable,
};
