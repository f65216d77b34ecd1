//! Upload descriptors, acceptance into storage, and declared-metadata checks.
//!
//! Type and size checks read the metadata the client declared. They cannot
//! tell a renamed executable from a real image; use
//! [`validate_type_sniffed`] when the decision is security relevant.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::mime::sniff_mime;
use crate::spec::{EnumUploadNaming, FsError};
use crate::util::{apply_file_mode, create_dir_chain, derive_extension};

////////////////////////////////////////////////////////////////////////////////
// #region Descriptors

/// Standard multipart upload status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumUploadErrorCode {
    /// Upload completed.
    Ok,
    /// Exceeds the server-wide size limit.
    IniSize,
    /// Exceeds the form's declared size limit.
    FormSize,
    /// Only part of the file arrived.
    Partial,
    /// No file was submitted.
    NoFile,
    /// Server has no temporary directory.
    NoTmpDir,
    /// Temporary file could not be written.
    CantWrite,
    /// A server extension stopped the upload.
    Extension,
}

impl EnumUploadErrorCode {
    /// Decode a numeric status code.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::IniSize),
            2 => Some(Self::FormSize),
            3 => Some(Self::Partial),
            4 => Some(Self::NoFile),
            6 => Some(Self::NoTmpDir),
            7 => Some(Self::CantWrite),
            8 => Some(Self::Extension),
            _ => None,
        }
    }

    /// Numeric status code.
    pub fn code(&self) -> u32 {
        match self {
            Self::Ok => 0,
            Self::IniSize => 1,
            Self::FormSize => 2,
            Self::Partial => 3,
            Self::NoFile => 4,
            Self::NoTmpDir => 6,
            Self::CantWrite => 7,
            Self::Extension => 8,
        }
    }
}

/// One pending uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDescriptor {
    /// Client-supplied filename.
    pub name: String,
    /// Where the transport layer stored the bytes.
    pub path_tmp: PathBuf,
    /// Client-declared MIME type.
    pub mime_type_declared: String,
    /// Client-declared size in bytes.
    pub size_declared: u64,
    /// Transport status.
    pub code_error: EnumUploadErrorCode,
}

/// Uploads registered under one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadField {
    /// `<input type="file">`
    Single(UploadDescriptor),
    /// `<input type="file" multiple>` or `name[]` fields.
    Batch(Vec<UploadDescriptor>),
}

impl UploadField {
    /// Build a batch from per-attribute arrays that share indices.
    pub fn from_parallel(
        field: &str,
        names: Vec<String>,
        paths_tmp: Vec<PathBuf>,
        mime_types: Vec<String>,
        sizes: Vec<u64>,
        codes_error: Vec<EnumUploadErrorCode>,
    ) -> Result<Self, FsError> {
        let lengths = [
            names.len(),
            paths_tmp.len(),
            mime_types.len(),
            sizes.len(),
            codes_error.len(),
        ];
        if lengths.iter().any(|n| *n != lengths[0]) {
            return Err(FsError::UploadFieldMismatch {
                field: field.to_string(),
                lengths,
            });
        }

        let l_descriptors = names
            .into_iter()
            .zip(paths_tmp)
            .zip(mime_types)
            .zip(sizes)
            .zip(codes_error)
            .map(
                |((((name, path_tmp), mime_type_declared), size_declared), code_error)| {
                    UploadDescriptor {
                        name,
                        path_tmp,
                        mime_type_declared,
                        size_declared,
                        code_error,
                    }
                },
            )
            .collect();
        Ok(Self::Batch(l_descriptors))
    }

    /// All descriptors, one for `Single`.
    pub fn descriptors(&self) -> &[UploadDescriptor] {
        match self {
            Self::Single(descriptor) => std::slice::from_ref(descriptor),
            Self::Batch(l_descriptors) => l_descriptors,
        }
    }
}

/// Uploads of one request, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadTable {
    dict_fields: BTreeMap<String, UploadField>,
}

impl UploadTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a field.
    pub fn insert(&mut self, field: impl Into<String>, upload_field: UploadField) {
        self.dict_fields.insert(field.into(), upload_field);
    }

    /// Uploads under `field`.
    pub fn get(&self, field: &str) -> Option<&UploadField> {
        self.dict_fields.get(field)
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.dict_fields.len()
    }

    /// Whether no field is registered.
    pub fn is_empty(&self) -> bool {
        self.dict_fields.is_empty()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Accept

/// Result of [`accept_upload`] for a registered field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumUploadOutcome {
    /// Single upload stored under this filename.
    Stored(String),
    /// Batch entries stored under these filenames, in index order.
    StoredBatch(Vec<String>),
    /// An entry carried a non-OK transport status.
    Rejected {
        /// Index of the offending entry.
        index: usize,
        /// Its status.
        code_error: EnumUploadErrorCode,
    },
}

/// Strip any client-side directory part; `.` and `..` become empty.
fn sanitize_client_name(name: &str) -> &str {
    let c_base = name.rsplit(['/', '\\']).next().unwrap_or("");
    match c_base {
        "." | ".." => "",
        _ => c_base,
    }
}

fn join_extension(stem: String, extension: &str) -> String {
    if extension.is_empty() {
        stem
    } else {
        format!("{stem}.{extension}")
    }
}

fn derive_target_name(
    name_client: &str,
    rename: &str,
    rule_upload_naming: EnumUploadNaming,
    n_index: Option<usize>,
) -> String {
    let extension = derive_extension(name_client);
    let c_suffix = n_index.map(|k| format!("_{k}")).unwrap_or_default();
    if !rename.is_empty() {
        return join_extension(format!("{rename}{c_suffix}"), extension);
    }
    match rule_upload_naming {
        EnumUploadNaming::Original => name_client.to_string(),
        EnumUploadNaming::Randomize => {
            let n_ts = chrono::Utc::now().timestamp();
            let n_rand: u32 = rand::thread_rng().gen_range(1000..=9999);
            join_extension(format!("{n_ts}-{n_rand}{c_suffix}"), extension)
        }
    }
}

/// Rename, falling back to copy + unlink across filesystems.
fn relocate_file(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    match fs::rename(path_src, path_dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(path_src, path_dst)?;
            fs::remove_file(path_src)
        }
        Err(e) => Err(e),
    }
}

/// Move the uploads under `field` into `dir_destination`.
///
/// `Ok(None)` when the field is not registered (or a single upload carries no
/// filename). A batch stops at the first entry with a non-OK status; entries
/// already relocated stay where they are.
pub fn accept_upload(
    upload_table: &UploadTable,
    field: &str,
    dir_destination: &Path,
    rename: &str,
    rule_upload_naming: EnumUploadNaming,
    mode_permission: Option<u32>,
) -> Result<Option<EnumUploadOutcome>, FsError> {
    let Some(upload_field) = upload_table.get(field) else {
        return Ok(None);
    };

    match upload_field {
        UploadField::Single(descriptor) => {
            let name_client = sanitize_client_name(&descriptor.name);
            if name_client.is_empty() {
                return Ok(None);
            }
            if descriptor.code_error != EnumUploadErrorCode::Ok {
                return Ok(Some(EnumUploadOutcome::Rejected {
                    index: 0,
                    code_error: descriptor.code_error,
                }));
            }
            let name_target = derive_target_name(name_client, rename, rule_upload_naming, None);
            let path_target = dir_destination.join(&name_target);
            create_dir_chain(dir_destination, mode_permission)?;
            relocate_file(&descriptor.path_tmp, &path_target)
                .map_err(|e| FsError::from_io(&descriptor.path_tmp, e))?;
            apply_file_mode(&path_target, mode_permission)
                .map_err(|e| FsError::from_io(&path_target, e))?;
            tracing::debug!(field, path = %path_target.display(), "upload stored");
            Ok(Some(EnumUploadOutcome::Stored(name_target)))
        }
        UploadField::Batch(l_descriptors) => {
            let mut l_stored = Vec::new();
            let mut b_dir_ready = false;
            for (n_index, descriptor) in l_descriptors.iter().enumerate() {
                let name_client = sanitize_client_name(&descriptor.name);
                if name_client.is_empty() {
                    continue;
                }
                if descriptor.code_error != EnumUploadErrorCode::Ok {
                    tracing::warn!(
                        field,
                        index = n_index,
                        code = descriptor.code_error.code(),
                        "upload batch rejected"
                    );
                    return Ok(Some(EnumUploadOutcome::Rejected {
                        index: n_index,
                        code_error: descriptor.code_error,
                    }));
                }
                let name_target =
                    derive_target_name(name_client, rename, rule_upload_naming, Some(n_index));
                let path_target = dir_destination.join(&name_target);
                if !b_dir_ready {
                    create_dir_chain(dir_destination, mode_permission)?;
                    b_dir_ready = true;
                }
                if let Err(e) = relocate_file(&descriptor.path_tmp, &path_target)
                    .and_then(|_| apply_file_mode(&path_target, mode_permission))
                {
                    tracing::warn!(field, index = n_index, error = %e, "upload entry not stored");
                    continue;
                }
                l_stored.push(name_target);
            }
            tracing::debug!(field, n_stored = l_stored.len(), "upload batch stored");
            Ok(Some(EnumUploadOutcome::StoredBatch(l_stored)))
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Validate

/// Declared MIME types under `field`, in index order.
pub fn declared_types(upload_table: &UploadTable, field: &str) -> Option<Vec<String>> {
    let upload_field = upload_table.get(field)?;
    Some(
        upload_field
            .descriptors()
            .iter()
            .map(|d| d.mime_type_declared.clone())
            .collect(),
    )
}

/// Every declared MIME type is in `allowed_types`.
///
/// Batch entries with an empty declared type are ignored.
pub fn validate_type<S: AsRef<str>>(
    upload_table: &UploadTable,
    field: &str,
    allowed_types: &[S],
) -> bool {
    let is_allowed = |mime: &str| allowed_types.iter().any(|a| a.as_ref() == mime);
    match upload_table.get(field) {
        None => false,
        Some(UploadField::Single(d)) => is_allowed(&d.mime_type_declared),
        Some(UploadField::Batch(l)) => l
            .iter()
            .filter(|d| !d.mime_type_declared.is_empty())
            .all(|d| is_allowed(&d.mime_type_declared)),
    }
}

/// Every filename extension is in `allowed_extensions`, ignoring case.
///
/// Batch entries without a filename are ignored.
pub fn validate_extension<S: AsRef<str>>(
    upload_table: &UploadTable,
    field: &str,
    allowed_extensions: &[S],
) -> bool {
    let is_allowed = |name: &str| {
        let extension = derive_extension(name);
        allowed_extensions
            .iter()
            .any(|a| a.as_ref().eq_ignore_ascii_case(extension))
    };
    match upload_table.get(field) {
        None => false,
        Some(UploadField::Single(d)) => is_allowed(&d.name),
        Some(UploadField::Batch(l)) => l
            .iter()
            .filter(|d| !d.name.is_empty())
            .all(|d| is_allowed(&d.name)),
    }
}

/// No declared size exceeds `max_kib` KiB.
pub fn validate_size(upload_table: &UploadTable, field: &str, max_kib: u64) -> bool {
    let n_max_bytes = max_kib.saturating_mul(1024);
    match upload_table.get(field) {
        None => false,
        Some(upload_field) => upload_field
            .descriptors()
            .iter()
            .all(|d| d.size_declared <= n_max_bytes),
    }
}

/// Like [`validate_type`], but sniffs the uploaded bytes instead of trusting
/// the declared type. Content that cannot be identified fails.
pub fn validate_type_sniffed<S: AsRef<str>>(
    upload_table: &UploadTable,
    field: &str,
    allowed_types: &[S],
) -> bool {
    let Some(upload_field) = upload_table.get(field) else {
        return false;
    };
    upload_field
        .descriptors()
        .iter()
        .filter(|d| !d.name.is_empty())
        .all(|d| {
            sniff_mime(&d.path_tmp)
                .is_some_and(|mime| allowed_types.iter().any(|a| a.as_ref() == mime))
        })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 16] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    fn descriptor(name: &str, path_tmp: PathBuf, mime: &str, size: u64) -> UploadDescriptor {
        UploadDescriptor {
            name: name.to_string(),
            path_tmp,
            mime_type_declared: mime.to_string(),
            size_declared: size,
            code_error: EnumUploadErrorCode::Ok,
        }
    }

    fn staged(dir: &Path, tmp_name: &str, bytes: &[u8]) -> PathBuf {
        let path_tmp = dir.join(tmp_name);
        fs::write(&path_tmp, bytes).expect("stage upload");
        path_tmp
    }

    #[test]
    fn error_code_round_trip_and_gap() {
        assert_eq!(EnumUploadErrorCode::from_code(4), Some(EnumUploadErrorCode::NoFile));
        assert_eq!(EnumUploadErrorCode::from_code(5), None);
        assert_eq!(EnumUploadErrorCode::Extension.code(), 8);
    }

    #[test]
    fn from_parallel_rejects_mismatched_lengths() {
        let err = UploadField::from_parallel(
            "files",
            vec!["a.jpg".to_string(), "b.jpg".to_string()],
            vec![PathBuf::from("/tmp/a")],
            vec!["image/jpeg".to_string(); 2],
            vec![1, 2],
            vec![EnumUploadErrorCode::Ok; 2],
        )
        .expect_err("mismatch");
        assert!(matches!(
            err,
            FsError::UploadFieldMismatch { lengths: [2, 1, 2, 2, 2], .. }
        ));

        let upload_field = UploadField::from_parallel(
            "files",
            vec!["a.jpg".to_string()],
            vec![PathBuf::from("/tmp/a")],
            vec!["image/jpeg".to_string()],
            vec![10],
            vec![EnumUploadErrorCode::Ok],
        )
        .expect("batch");
        assert_eq!(upload_field.descriptors().len(), 1);
        assert_eq!(upload_field.descriptors()[0].size_declared, 10);
    }

    #[test]
    fn accept_single_keeps_original_name() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_tmp = staged(tmp.path(), "php123", b"png bytes");
        let dir_dst = tmp.path().join("uploads");

        let mut upload_table = UploadTable::new();
        upload_table.insert(
            "avatar",
            UploadField::Single(descriptor("photo.PNG", path_tmp.clone(), "image/png", 9)),
        );

        let outcome = accept_upload(
            &upload_table,
            "avatar",
            &dir_dst,
            "",
            EnumUploadNaming::Original,
            None,
        )
        .expect("accept");
        assert_eq!(outcome, Some(EnumUploadOutcome::Stored("photo.PNG".to_string())));
        assert!(!path_tmp.exists());
        assert_eq!(fs::read(dir_dst.join("photo.PNG")).expect("read"), b"png bytes");
    }

    #[test]
    fn accept_single_rename_and_randomize() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir_dst = tmp.path().join("uploads");

        let mut upload_table = UploadTable::new();
        upload_table.insert(
            "avatar",
            UploadField::Single(descriptor(
                "photo.PNG",
                staged(tmp.path(), "t1", b"x"),
                "image/png",
                1,
            )),
        );
        let outcome = accept_upload(
            &upload_table,
            "avatar",
            &dir_dst,
            "user42",
            EnumUploadNaming::Randomize,
            None,
        )
        .expect("accept");
        assert_eq!(outcome, Some(EnumUploadOutcome::Stored("user42.PNG".to_string())));

        upload_table.insert(
            "avatar",
            UploadField::Single(descriptor(
                "photo.PNG",
                staged(tmp.path(), "t2", b"y"),
                "image/png",
                1,
            )),
        );
        let Some(EnumUploadOutcome::Stored(name)) = accept_upload(
            &upload_table,
            "avatar",
            &dir_dst,
            "",
            EnumUploadNaming::Randomize,
            None,
        )
        .expect("accept") else {
            panic!("expected stored upload");
        };
        let (c_stem, c_ext) = name.rsplit_once('.').expect("extension");
        assert_eq!(c_ext, "PNG");
        let (c_ts, c_rand) = c_stem.split_once('-').expect("ts-rand");
        assert!(c_ts.parse::<i64>().is_ok());
        let n_rand: u32 = c_rand.parse().expect("rand");
        assert!((1000..=9999).contains(&n_rand));
        assert!(dir_dst.join(&name).exists());
    }

    #[test]
    fn accept_missing_field_is_absent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let outcome = accept_upload(
            &UploadTable::new(),
            "avatar",
            tmp.path(),
            "",
            EnumUploadNaming::Original,
            None,
        )
        .expect("accept");
        assert_eq!(outcome, None);
    }

    #[test]
    fn accept_strips_client_directories() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir_dst = tmp.path().join("uploads");
        let mut upload_table = UploadTable::new();
        upload_table.insert(
            "doc",
            UploadField::Single(descriptor(
                "../../etc/passwd.txt",
                staged(tmp.path(), "t", b"x"),
                "text/plain",
                1,
            )),
        );

        let outcome = accept_upload(
            &upload_table,
            "doc",
            &dir_dst,
            "",
            EnumUploadNaming::Original,
            None,
        )
        .expect("accept");
        assert_eq!(outcome, Some(EnumUploadOutcome::Stored("passwd.txt".to_string())));
        assert!(dir_dst.join("passwd.txt").exists());
    }

    #[test]
    fn accept_batch_skips_empty_and_suffixes_rename() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir_dst = tmp.path().join("uploads");
        let mut empty = descriptor("", PathBuf::new(), "", 0);
        empty.code_error = EnumUploadErrorCode::NoFile;

        let mut upload_table = UploadTable::new();
        upload_table.insert(
            "files",
            UploadField::Batch(vec![
                descriptor("a.jpg", staged(tmp.path(), "t0", b"a"), "image/jpeg", 1),
                empty,
                descriptor("c.png", staged(tmp.path(), "t2", b"c"), "image/png", 1),
            ]),
        );

        let outcome = accept_upload(
            &upload_table,
            "files",
            &dir_dst,
            "pic",
            EnumUploadNaming::Original,
            None,
        )
        .expect("accept");
        assert_eq!(
            outcome,
            Some(EnumUploadOutcome::StoredBatch(vec![
                "pic_0.jpg".to_string(),
                "pic_2.png".to_string()
            ]))
        );
        assert!(dir_dst.join("pic_0.jpg").exists());
        assert!(dir_dst.join("pic_2.png").exists());
    }

    #[test]
    fn accept_batch_randomize_suffixes_each_index() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir_dst = tmp.path().join("uploads");

        let mut upload_table = UploadTable::new();
        upload_table.insert(
            "files",
            UploadField::Batch(vec![
                descriptor("a.jpg", staged(tmp.path(), "t0", b"a"), "image/jpeg", 1),
                descriptor("b.png", staged(tmp.path(), "t1", b"b"), "image/png", 1),
            ]),
        );

        let Some(EnumUploadOutcome::StoredBatch(l_names)) = accept_upload(
            &upload_table,
            "files",
            &dir_dst,
            "",
            EnumUploadNaming::Randomize,
            None,
        )
        .expect("accept") else {
            panic!("expected stored batch");
        };
        assert_eq!(l_names.len(), 2);
        for (n_index, (name, c_ext)) in l_names.iter().zip(["jpg", "png"]).enumerate() {
            let (c_stem, c_ext_stored) = name.rsplit_once('.').expect("extension");
            assert_eq!(c_ext_stored, c_ext);
            let (c_ts_rand, c_index) = c_stem.rsplit_once('_').expect("index suffix");
            assert_eq!(c_index, n_index.to_string());
            let (c_ts, c_rand) = c_ts_rand.split_once('-').expect("ts-rand");
            assert!(c_ts.parse::<i64>().is_ok());
            assert!((1000..=9999).contains(&c_rand.parse::<u32>().expect("rand")));
            assert!(dir_dst.join(name).exists());
        }
    }

    #[test]
    fn accept_that_stores_nothing_creates_no_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir_dst = tmp.path().join("uploads/nested");
        let mut rejected = descriptor("a.jpg", staged(tmp.path(), "t0", b"a"), "image/jpeg", 1);
        rejected.code_error = EnumUploadErrorCode::IniSize;

        let mut upload_table = UploadTable::new();
        upload_table.insert("nameless", UploadField::Single(descriptor("", PathBuf::new(), "", 0)));
        upload_table.insert("rejected", UploadField::Single(rejected.clone()));
        upload_table.insert("batch", UploadField::Batch(vec![rejected]));

        for field in ["nameless", "rejected", "batch"] {
            accept_upload(
                &upload_table,
                field,
                &dir_dst,
                "",
                EnumUploadNaming::Original,
                None,
            )
            .expect("accept");
        }
        assert!(!tmp.path().join("uploads").exists());
    }

    #[test]
    fn accept_batch_aborts_on_first_error_without_undo() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir_dst = tmp.path().join("uploads");
        let mut partial = descriptor("b.jpg", staged(tmp.path(), "t1", b"b"), "image/jpeg", 1);
        partial.code_error = EnumUploadErrorCode::Partial;
        let path_tmp_c = staged(tmp.path(), "t2", b"c");

        let mut upload_table = UploadTable::new();
        upload_table.insert(
            "files",
            UploadField::Batch(vec![
                descriptor("a.jpg", staged(tmp.path(), "t0", b"a"), "image/jpeg", 1),
                partial,
                descriptor("c.jpg", path_tmp_c.clone(), "image/jpeg", 1),
            ]),
        );

        let outcome = accept_upload(
            &upload_table,
            "files",
            &dir_dst,
            "",
            EnumUploadNaming::Original,
            None,
        )
        .expect("accept");
        assert_eq!(
            outcome,
            Some(EnumUploadOutcome::Rejected {
                index: 1,
                code_error: EnumUploadErrorCode::Partial
            })
        );
        assert!(dir_dst.join("a.jpg").exists());
        assert!(!dir_dst.join("c.jpg").exists());
        assert!(path_tmp_c.exists());
    }

    #[test]
    fn validate_extension_is_case_insensitive() {
        let mut upload_table = UploadTable::new();
        upload_table.insert(
            "ok",
            UploadField::Batch(vec![
                descriptor("a.JPG", PathBuf::new(), "image/jpeg", 1),
                descriptor("b.png", PathBuf::new(), "image/png", 1),
            ]),
        );
        upload_table.insert(
            "bad",
            UploadField::Batch(vec![
                descriptor("a.jpg", PathBuf::new(), "image/jpeg", 1),
                descriptor("b.gif", PathBuf::new(), "image/gif", 1),
            ]),
        );

        assert!(validate_extension(&upload_table, "ok", &["jpg", "png"]));
        assert!(!validate_extension(&upload_table, "bad", &["jpg", "png"]));
        assert!(validate_extension(&upload_table, "ok", &["JPG", "PNG"]));
        assert!(!validate_extension(&upload_table, "missing", &["jpg"]));
    }

    #[test]
    fn validate_type_and_size() {
        let mut upload_table = UploadTable::new();
        upload_table.insert(
            "avatar",
            UploadField::Single(descriptor("photo.PNG", PathBuf::new(), "image/png", 2048)),
        );
        upload_table.insert(
            "files",
            UploadField::Batch(vec![
                descriptor("a.jpg", PathBuf::new(), "image/jpeg", 1024),
                descriptor("", PathBuf::new(), "", 0),
                descriptor("c.gif", PathBuf::new(), "image/gif", 1025),
            ]),
        );

        let allowed = ["image/png", "image/jpeg"];
        assert!(validate_type(&upload_table, "avatar", &allowed));
        assert!(!validate_type(&upload_table, "files", &allowed));
        assert!(validate_type(&upload_table, "files", &["image/jpeg", "image/gif"]));
        assert!(!validate_type(&upload_table, "missing", &allowed));

        assert!(validate_size(&upload_table, "avatar", 2));
        assert!(!validate_size(&upload_table, "avatar", 1));
        assert!(!validate_size(&upload_table, "files", 1));
        assert!(validate_size(&upload_table, "files", 2));

        assert_eq!(
            declared_types(&upload_table, "files"),
            Some(vec![
                "image/jpeg".to_string(),
                String::new(),
                "image/gif".to_string()
            ])
        );
    }

    #[test]
    fn validate_type_sniffed_ignores_declared_type() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut upload_table = UploadTable::new();
        upload_table.insert(
            "real",
            UploadField::Single(descriptor(
                "a.png",
                staged(tmp.path(), "real", &PNG_HEADER),
                "text/plain",
                16,
            )),
        );
        upload_table.insert(
            "fake",
            UploadField::Single(descriptor(
                "b.png",
                staged(tmp.path(), "fake", b"#!/bin/sh\necho hi\n"),
                "image/png",
                18,
            )),
        );

        assert!(validate_type_sniffed(&upload_table, "real", &["image/png"]));
        assert!(validate_type(&upload_table, "fake", &["image/png"]));
        assert!(!validate_type_sniffed(&upload_table, "fake", &["image/png"]));
    }
}
