//! `FileManager`: the public entry point over tree, list and upload helpers.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::list::{SpecListEntry, list_dir};
use crate::report::ReportTree;
use crate::spec::{
    EnumFsOutcome, EnumListFilter, EnumWriteMode, FsError, SpecFileManagerOptions,
    SpecListOptions,
};
use crate::tree::{copy_single_file, copy_tree, delete_path, purge_tree};
use crate::upload::{
    EnumUploadOutcome, UploadTable, accept_upload, declared_types, validate_extension,
    validate_size, validate_type, validate_type_sniffed,
};
use crate::util::{apply_file_mode, create_dir_chain, derive_parent_dir, normalize_separators};

/// Local filesystem manager.
///
/// Stateless apart from its [`SpecFileManagerOptions`]; every call works on
/// the paths it is given and returns a count, an outcome or an [`FsError`].
#[derive(Debug, Clone, Default)]
pub struct FileManager {
    spec_options: SpecFileManagerOptions,
}

impl FileManager {
    pub fn new(spec_options: SpecFileManagerOptions) -> Self {
        Self { spec_options }
    }

    /// Manager that applies `mode` to everything it creates.
    pub fn with_mode(mode: u32) -> Self {
        Self::new(SpecFileManagerOptions {
            mode_permission: Some(mode),
            ..SpecFileManagerOptions::default()
        })
    }

    pub fn options(&self) -> &SpecFileManagerOptions {
        &self.spec_options
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region Tree

    /// Delete everything inside `dir`; returns the number of removed entries.
    pub fn purge(&self, dir: impl AsRef<Path>) -> Result<u64, FsError> {
        Ok(purge_tree(dir.as_ref())?.cnt_done)
    }

    /// [`Self::purge`] with per-entry diagnostics.
    pub fn purge_with_report(&self, dir: impl AsRef<Path>) -> Result<ReportTree, FsError> {
        purge_tree(dir.as_ref())
    }

    /// Delete a file, or a directory's contents and optionally the directory.
    ///
    /// For directories the answer is `Count(n)`; a purge that removed nothing
    /// answers according to [`SpecFileManagerOptions::rule_empty_dir_delete`].
    pub fn delete(
        &self,
        path: impl AsRef<Path>,
        if_delete_self: bool,
    ) -> Result<EnumFsOutcome, FsError> {
        let path = PathBuf::from(normalize_separators(path.as_ref()));
        let outcome = delete_path(&path, if_delete_self, &self.spec_options)?;
        tracing::debug!(path = %path.display(), ?outcome, "delete");
        Ok(outcome)
    }

    /// Copy a file (`Done`) or a directory tree (`Count(n)`).
    pub fn copy(
        &self,
        from: impl AsRef<Path>,
        to: impl AsRef<Path>,
    ) -> Result<EnumFsOutcome, FsError> {
        let path_from = PathBuf::from(normalize_separators(from.as_ref()));
        let path_to = PathBuf::from(normalize_separators(to.as_ref()));
        let meta_from = fs::metadata(&path_from).map_err(|e| FsError::from_io(&path_from, e))?;
        if meta_from.is_dir() {
            let report = copy_tree(&path_from, &path_to, &self.spec_options)?;
            return Ok(EnumFsOutcome::Count(report.cnt_done));
        }
        copy_single_file(&path_from, &path_to, &self.spec_options)
    }

    /// [`Self::copy`] for directories, with per-entry diagnostics.
    pub fn copy_with_report(
        &self,
        from: impl AsRef<Path>,
        to: impl AsRef<Path>,
    ) -> Result<ReportTree, FsError> {
        copy_tree(
            Path::new(&normalize_separators(from.as_ref())),
            Path::new(&normalize_separators(to.as_ref())),
            &self.spec_options,
        )
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region CreateMove

    /// Write `content` to `path`, creating missing parents.
    ///
    /// With empty `content`, `path` itself is created as a directory chain and
    /// the answer is `false` when it already existed. Returns `true` when at
    /// least one byte (file) or one directory was written.
    pub fn create(
        &self,
        path: impl AsRef<Path>,
        content: &[u8],
        write_mode: EnumWriteMode,
    ) -> Result<bool, FsError> {
        let c_path = normalize_separators(path.as_ref());
        let path_target = Path::new(&c_path);

        if content.is_empty() {
            let n_created = create_dir_chain(path_target, self.spec_options.mode_permission)?;
            tracing::debug!(path = %c_path, n_created, "create directory");
            return Ok(n_created > 0);
        }

        self.ensure_parent_chain(path_target)?;
        let b_existed = path_target.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(write_mode == EnumWriteMode::Truncate)
            .append(write_mode == EnumWriteMode::Append)
            .open(path_target)
            .map_err(|e| FsError::from_io(path_target, e))?;
        file.write_all(content)
            .map_err(|e| FsError::from_io(path_target, e))?;
        if !b_existed {
            apply_file_mode(path_target, self.spec_options.mode_permission)
                .map_err(|e| FsError::from_io(path_target, e))?;
        }
        tracing::debug!(path = %c_path, n_bytes = content.len(), ?write_mode, "create file");
        Ok(true)
    }

    /// Rename `from` to `to`, creating `to`'s missing parents first.
    pub fn move_path(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<(), FsError> {
        let path_from = PathBuf::from(normalize_separators(from.as_ref()));
        let path_to = PathBuf::from(normalize_separators(to.as_ref()));
        if fs::symlink_metadata(&path_from).is_err() {
            return Err(FsError::NotFound(path_from));
        }
        self.ensure_parent_chain(&path_to)?;
        fs::rename(&path_from, &path_to).map_err(|e| FsError::from_io(&path_to, e))?;
        tracing::debug!(from = %path_from.display(), to = %path_to.display(), "moved");
        Ok(())
    }

    fn ensure_parent_chain(&self, path: &Path) -> Result<(), FsError> {
        if let Some(c_parent) = derive_parent_dir(path) {
            create_dir_chain(Path::new(&c_parent), self.spec_options.mode_permission)?;
        }
        Ok(())
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region List

    /// Immediate children of `path`; `None` when unreadable or empty.
    pub fn list(
        &self,
        path: impl AsRef<Path>,
        filter: EnumListFilter,
    ) -> Option<Vec<SpecListEntry>> {
        let spec_list_options = SpecListOptions {
            filter,
            ..SpecListOptions::default()
        };
        // Without patterns there is nothing to compile, so this cannot fail.
        list_dir(path.as_ref(), &spec_list_options, &self.spec_options.rules_mime)
            .ok()
            .flatten()
    }

    /// [`Self::list`] with include/exclude name patterns.
    pub fn list_matching(
        &self,
        path: impl AsRef<Path>,
        spec_list_options: &SpecListOptions,
    ) -> Result<Option<Vec<SpecListEntry>>, FsError> {
        list_dir(path.as_ref(), spec_list_options, &self.spec_options.rules_mime)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Upload

    /// Move the uploads under `field` into `dir_destination`.
    ///
    /// A non-empty `rename` replaces the stem of every stored name (batches
    /// get an `_{index}` suffix). See [`crate::upload::accept_upload`].
    pub fn accept_upload(
        &self,
        upload_table: &UploadTable,
        field: &str,
        dir_destination: impl AsRef<Path>,
        rename: &str,
    ) -> Result<Option<EnumUploadOutcome>, FsError> {
        accept_upload(
            upload_table,
            field,
            Path::new(&normalize_separators(dir_destination.as_ref())),
            rename,
            self.spec_options.rule_upload_naming,
            self.spec_options.mode_permission,
        )
    }

    pub fn upload_types(&self, upload_table: &UploadTable, field: &str) -> Option<Vec<String>> {
        declared_types(upload_table, field)
    }

    /// Declared MIME types are all allowed. Trusts the client.
    pub fn validate_type<S: AsRef<str>>(
        &self,
        upload_table: &UploadTable,
        field: &str,
        allowed_types: &[S],
    ) -> bool {
        validate_type(upload_table, field, allowed_types)
    }

    /// Sniffed MIME types are all allowed.
    pub fn validate_type_sniffed<S: AsRef<str>>(
        &self,
        upload_table: &UploadTable,
        field: &str,
        allowed_types: &[S],
    ) -> bool {
        validate_type_sniffed(upload_table, field, allowed_types)
    }

    pub fn validate_extension<S: AsRef<str>>(
        &self,
        upload_table: &UploadTable,
        field: &str,
        allowed_extensions: &[S],
    ) -> bool {
        validate_extension(upload_table, field, allowed_extensions)
    }

    /// Declared sizes are all within `max_kib`. Trusts the client.
    pub fn validate_size(&self, upload_table: &UploadTable, field: &str, max_kib: u64) -> bool {
        validate_size(upload_table, field, max_kib)
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::EnumUploadNaming;
    use crate::upload::{EnumUploadErrorCode, UploadDescriptor, UploadField};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, txt).expect("write text");
    }

    #[test]
    fn purge_flat_dir_returns_files_plus_dirs() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("d");
        for name in ["a", "b", "c"] {
            write_text(&root.join(format!("{name}.txt")), name);
        }
        for name in ["x", "y"] {
            fs::create_dir_all(root.join(name)).expect("mkdir");
        }

        let fm = FileManager::default();
        assert_eq!(fm.purge(&root).expect("purge"), 5);
        assert!(root.is_dir());
        assert_eq!(fs::read_dir(&root).expect("read").count(), 0);
    }

    #[test]
    fn delete_non_empty_is_purge_plus_one() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("d");
        write_text(&root.join("a.txt"), "a");
        write_text(&root.join("s/b.txt"), "b");

        let fm = FileManager::default();
        assert_eq!(fm.delete(&root, true).expect("delete"), EnumFsOutcome::Count(4));
        assert!(!root.exists());

        fs::create_dir_all(&root).expect("mkdir");
        assert_eq!(fm.delete(&root, true).expect("delete"), EnumFsOutcome::Failed);
    }

    #[test]
    fn copy_scenario_counts_three() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a.txt"), "a");
        write_text(&src.join("b/c.txt"), "cc");

        let fm = FileManager::default();
        let c_src = format!("{}/", src.display());
        let c_dst = format!("{}/", dst.display());
        assert_eq!(fm.copy(&c_src, &c_dst).expect("copy"), EnumFsOutcome::Count(3));
        assert_eq!(
            fs::read(dst.join("b/c.txt")).expect("dst"),
            fs::read(src.join("b/c.txt")).expect("src")
        );

        assert_eq!(fm.delete(&dst, true).expect("delete"), EnumFsOutcome::Count(4));
        assert_eq!(fm.copy(&src, &dst).expect("recopy"), EnumFsOutcome::Count(3));
    }

    #[test]
    fn copy_single_file_and_missing_source() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_src = tmp.path().join("a.txt");
        write_text(&path_src, "a");

        let fm = FileManager::default();
        assert_eq!(
            fm.copy(&path_src, tmp.path().join("deep/er/a.txt")).expect("copy"),
            EnumFsOutcome::Done
        );
        let err = fm
            .copy(tmp.path().join("missing.txt"), tmp.path().join("b.txt"))
            .expect_err("missing");
        assert!(matches!(err, FsError::NotFound(_)));
    }

    #[test]
    fn create_file_then_read_back() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("x/y/z.txt");
        assert!(!tmp.path().join("x").exists());

        let fm = FileManager::default();
        assert!(fm.create(&path_file, b"hello", EnumWriteMode::Truncate).expect("create"));
        assert_eq!(fs::read(&path_file).expect("read"), b"hello");
        assert!(tmp.path().join("x/y").is_dir());

        assert!(fm.create(&path_file, b" world", EnumWriteMode::Append).expect("append"));
        assert_eq!(fs::read_to_string(&path_file).expect("read"), "hello world");

        assert!(fm.create(&path_file, b"reset", EnumWriteMode::Truncate).expect("truncate"));
        assert_eq!(fs::read_to_string(&path_file).expect("read"), "reset");
    }

    #[test]
    fn create_directory_when_content_empty() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_dir = tmp.path().join("p/q/r");

        let fm = FileManager::default();
        assert!(fm.create(&path_dir, b"", EnumWriteMode::Truncate).expect("create"));
        assert!(path_dir.is_dir());
        assert!(!fm.create(&path_dir, b"", EnumWriteMode::Truncate).expect("exists"));
    }

    #[test]
    fn create_reports_partially_created_chain() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_new = tmp.path().join("new");
        let path_leaf = path_new.join("x".repeat(300));

        let fm = FileManager::default();
        let err = fm
            .create(&path_leaf, b"", EnumWriteMode::Truncate)
            .expect_err("name too long");
        assert!(matches!(err, FsError::PartialCreate { created: 1, .. }));
        assert!(path_new.is_dir());
        assert!(!path_leaf.exists());
    }

    #[cfg(unix)]
    #[test]
    fn create_applies_configured_mode_to_new_file() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().expect("tempdir");
        let path_file = tmp.path().join("sub/secret.txt");
        let fm = FileManager::with_mode(0o700);
        assert!(fm.create(&path_file, b"s", EnumWriteMode::Truncate).expect("create"));

        let mode_file = fs::metadata(&path_file).expect("meta").permissions().mode();
        assert_eq!(mode_file & 0o777, 0o700);
    }

    #[test]
    fn move_round_trips() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_a = tmp.path().join("a.txt");
        let path_b = tmp.path().join("nested/dir/b.txt");
        write_text(&path_a, "payload");

        let fm = FileManager::default();
        fm.move_path(&path_a, &path_b).expect("move");
        assert!(!path_a.exists());
        assert_eq!(fs::read_to_string(&path_b).expect("read"), "payload");

        fm.move_path(&path_b, &path_a).expect("move back");
        assert_eq!(fs::read_to_string(&path_a).expect("read"), "payload");

        let err = fm.move_path(&path_b, &path_a).expect_err("missing");
        assert!(matches!(err, FsError::NotFound(_)));
    }

    #[test]
    fn list_via_manager() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_text(&tmp.path().join("a.txt"), "a");
        fs::create_dir_all(tmp.path().join("sub")).expect("mkdir");

        let fm = FileManager::default();
        let l_all = fm.list(tmp.path(), EnumListFilter::All).expect("entries");
        assert_eq!(l_all.len(), 2);
        let l_files = fm.list(tmp.path(), EnumListFilter::Files).expect("entries");
        assert_eq!(l_files.len(), 1);
        assert_eq!(l_files[0].name, "a.txt");
        assert!(fm.list(tmp.path().join("nope"), EnumListFilter::All).is_none());
    }

    #[test]
    fn avatar_scenario() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_tmp = tmp.path().join("phpA1B2");
        fs::write(&path_tmp, b"bytes").expect("stage");
        let dir_uploads = tmp.path().join("uploads/");

        let mut upload_table = UploadTable::new();
        upload_table.insert(
            "avatar",
            UploadField::Single(UploadDescriptor {
                name: "photo.PNG".to_string(),
                path_tmp,
                mime_type_declared: "image/png".to_string(),
                size_declared: 5,
                code_error: EnumUploadErrorCode::Ok,
            }),
        );

        let fm = FileManager::default();
        assert!(fm.validate_type(&upload_table, "avatar", &["image/png", "image/jpeg"]));
        assert!(fm.validate_extension(&upload_table, "avatar", &["png"]));
        assert!(fm.validate_size(&upload_table, "avatar", 1));
        assert_eq!(
            fm.upload_types(&upload_table, "avatar"),
            Some(vec!["image/png".to_string()])
        );
        assert_eq!(
            fm.accept_upload(&upload_table, "avatar", &dir_uploads, "")
                .expect("accept"),
            Some(EnumUploadOutcome::Stored("photo.PNG".to_string()))
        );
        assert!(dir_uploads.join("photo.PNG").exists());
    }

    #[test]
    fn randomize_policy_comes_from_options() {
        let fm = FileManager::new(SpecFileManagerOptions {
            rule_upload_naming: EnumUploadNaming::Randomize,
            ..SpecFileManagerOptions::default()
        });
        assert_eq!(fm.options().rule_upload_naming, EnumUploadNaming::Randomize);
    }
}
