use std::collections::BTreeMap;
use std::path::PathBuf;

use filekit_io_fs::{
    EnumCopySymlinkStrategy, EnumEmptyDirDelete, EnumFsOutcome, EnumListFilter,
    EnumListPatternMode, EnumMimeStrategy, EnumUploadErrorCode, EnumUploadNaming,
    EnumUploadOutcome, EnumWriteMode, FileManager, FsError, ReportTree, SpecFileManagerOptions,
    SpecFsError, SpecListEntry, SpecListOptions, UploadDescriptor, UploadField, UploadTable,
};
use pyo3::exceptions::{PyFileNotFoundError, PyOSError, PyPermissionError, PyValueError};
use pyo3::prelude::*;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "filekit.fs.file_manager.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

////////////////////////////////////////////////////////////////////////////////
// #region Results

#[pyclass(name = "SpecFsError")]
#[derive(Debug, Clone)]
struct PySpecFsError {
    #[pyo3(get)]
    path: String,
    #[pyo3(get)]
    exception: String,
}

impl From<SpecFsError> for PySpecFsError {
    fn from(spec_error: SpecFsError) -> Self {
        Self {
            path: spec_error.path.to_string_lossy().to_string(),
            exception: spec_error.exception,
        }
    }
}

#[pyclass(name = "ReportTree")]
#[derive(Debug, Clone)]
struct PyReportTree {
    #[pyo3(get)]
    cnt_scanned: u64,
    #[pyo3(get)]
    cnt_done: u64,
    #[pyo3(get)]
    cnt_skipped: u64,
    #[pyo3(get)]
    warnings: Vec<String>,
    #[pyo3(get)]
    errors: Vec<PySpecFsError>,
    report: ReportTree,
}

impl From<ReportTree> for PyReportTree {
    fn from(report: ReportTree) -> Self {
        Self {
            cnt_scanned: report.cnt_scanned,
            cnt_done: report.cnt_done,
            cnt_skipped: report.cnt_skipped,
            warnings: report.warnings.clone(),
            errors: report
                .errors
                .iter()
                .cloned()
                .map(PySpecFsError::from)
                .collect(),
            report,
        }
    }
}

#[pymethods]
impl PyReportTree {
    #[getter]
    fn error_count(&self) -> usize {
        self.report.error_count()
    }

    #[getter]
    fn warning_count(&self) -> usize {
        self.report.warning_count()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.report.to_dict()
    }

    #[pyo3(signature = (prefix = "[TREE]"))]
    fn format(&self, prefix: &str) -> String {
        self.report.format(prefix)
    }

    fn __str__(&self) -> String {
        self.report.to_string()
    }
}

/// `kind` is one of `count`, `done`, `failed`; `count` is set for `count`.
#[pyclass(name = "FsOutcome")]
#[derive(Debug, Clone)]
struct PyFsOutcome {
    #[pyo3(get)]
    kind: &'static str,
    #[pyo3(get)]
    count: Option<u64>,
}

impl From<EnumFsOutcome> for PyFsOutcome {
    fn from(outcome: EnumFsOutcome) -> Self {
        let kind = match outcome {
            EnumFsOutcome::Count(_) => "count",
            EnumFsOutcome::Done => "done",
            EnumFsOutcome::Failed => "failed",
        };
        Self {
            kind,
            count: outcome.count(),
        }
    }
}

#[pymethods]
impl PyFsOutcome {
    fn __bool__(&self) -> bool {
        self.kind != "failed"
    }

    fn __repr__(&self) -> String {
        match self.count {
            Some(n) => format!("FsOutcome(count={n})"),
            None => format!("FsOutcome({})", self.kind),
        }
    }
}

#[pyclass(name = "ListEntry")]
#[derive(Debug, Clone)]
struct PyListEntry {
    #[pyo3(get)]
    name: String,
    #[pyo3(get)]
    path: String,
    #[pyo3(get)]
    if_is_dir: bool,
    #[pyo3(get)]
    extension: Option<String>,
    #[pyo3(get)]
    mime_type: Option<String>,
    #[pyo3(get)]
    size_kib: Option<u64>,
}

impl From<SpecListEntry> for PyListEntry {
    fn from(entry: SpecListEntry) -> Self {
        let (extension, mime_type, size_kib) = match entry.details {
            Some(details) => (
                Some(details.extension),
                Some(details.mime_type),
                Some(details.size_kib),
            ),
            None => (None, None, None),
        };
        Self {
            name: entry.name,
            path: entry.path,
            if_is_dir: entry.if_is_dir,
            extension,
            mime_type,
            size_kib,
        }
    }
}

/// `kind` is one of `stored`, `rejected`.
#[pyclass(name = "UploadOutcome")]
#[derive(Debug, Clone)]
struct PyUploadOutcome {
    #[pyo3(get)]
    kind: &'static str,
    #[pyo3(get)]
    names: Vec<String>,
    #[pyo3(get)]
    index: Option<usize>,
    #[pyo3(get)]
    code_error: Option<u32>,
}

impl From<EnumUploadOutcome> for PyUploadOutcome {
    fn from(outcome: EnumUploadOutcome) -> Self {
        match outcome {
            EnumUploadOutcome::Stored(name) => Self {
                kind: "stored",
                names: vec![name],
                index: None,
                code_error: None,
            },
            EnumUploadOutcome::StoredBatch(names) => Self {
                kind: "stored",
                names,
                index: None,
                code_error: None,
            },
            EnumUploadOutcome::Rejected { index, code_error } => Self {
                kind: "rejected",
                names: Vec::new(),
                index: Some(index),
                code_error: Some(code_error.code()),
            },
        }
    }
}

#[pymethods]
impl PyUploadOutcome {
    fn __bool__(&self) -> bool {
        self.kind == "stored"
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Parsers

fn parse_rule_upload_naming(value: &str) -> PyResult<EnumUploadNaming> {
    match value {
        "original" => Ok(EnumUploadNaming::Original),
        "randomize" => Ok(EnumUploadNaming::Randomize),
        _ => Err(PyValueError::new_err(format!(
            "Invalid upload naming: `{value}`. Expected one of: ['original', 'randomize']"
        ))),
    }
}

fn parse_rule_symlink(value: &str) -> PyResult<EnumCopySymlinkStrategy> {
    match value {
        "dereference" => Ok(EnumCopySymlinkStrategy::Dereference),
        "copy_symlinks" => Ok(EnumCopySymlinkStrategy::CopySymlinks),
        "skip_symlinks" => Ok(EnumCopySymlinkStrategy::SkipSymlinks),
        _ => Err(PyValueError::new_err(format!(
            "Invalid symlink strategy: `{value}`. Expected one of: ['dereference', 'copy_symlinks', 'skip_symlinks']"
        ))),
    }
}

fn parse_rule_empty_dir_delete(value: &str) -> PyResult<EnumEmptyDirDelete> {
    match value {
        "report_failure" => Ok(EnumEmptyDirDelete::ReportFailure),
        "remove_self" => Ok(EnumEmptyDirDelete::RemoveSelf),
        _ => Err(PyValueError::new_err(format!(
            "Invalid empty directory rule: `{value}`. Expected one of: ['report_failure', 'remove_self']"
        ))),
    }
}

fn parse_rules_mime(values: &[String]) -> PyResult<Vec<EnumMimeStrategy>> {
    values
        .iter()
        .map(|value| match value.as_str() {
            "table" => Ok(EnumMimeStrategy::Table),
            "sniff" => Ok(EnumMimeStrategy::Sniff),
            _ => Err(PyValueError::new_err(format!(
                "Invalid mime strategy: `{value}`. Expected one of: ['table', 'sniff']"
            ))),
        })
        .collect()
}

fn parse_rule_filter(value: &str) -> PyResult<EnumListFilter> {
    match value {
        "all" => Ok(EnumListFilter::All),
        "files" => Ok(EnumListFilter::Files),
        "folders" => Ok(EnumListFilter::Folders),
        _ => Err(PyValueError::new_err(format!(
            "Invalid list filter: `{value}`. Expected one of: ['all', 'files', 'folders']"
        ))),
    }
}

fn parse_rule_pattern(value: &str) -> PyResult<EnumListPatternMode> {
    match value {
        "glob" => Ok(EnumListPatternMode::Glob),
        "regex" => Ok(EnumListPatternMode::Regex),
        "literal" => Ok(EnumListPatternMode::Literal),
        _ => Err(PyValueError::new_err(format!(
            "Invalid pattern strategy: `{value}`. Expected one of: ['glob', 'regex', 'literal']"
        ))),
    }
}

fn parse_rule_write(value: &str) -> PyResult<EnumWriteMode> {
    match value {
        "truncate" => Ok(EnumWriteMode::Truncate),
        "append" => Ok(EnumWriteMode::Append),
        _ => Err(PyValueError::new_err(format!(
            "Invalid write mode: `{value}`. Expected one of: ['truncate', 'append']"
        ))),
    }
}

fn parse_code_error(code: u32) -> PyResult<EnumUploadErrorCode> {
    EnumUploadErrorCode::from_code(code)
        .ok_or_else(|| PyValueError::new_err(format!("Invalid upload error code: {code}")))
}

fn map_fs_error(exception: FsError) -> PyErr {
    match exception {
        FsError::NotFound(path) => {
            PyFileNotFoundError::new_err(format!("Path not found: {}", path.display()))
        }
        FsError::PermissionDenied(path) => {
            PyPermissionError::new_err(format!("Permission denied: {}", path.display()))
        }
        FsError::InvalidPattern(_)
        | FsError::SourceDestinationOverlap { .. }
        | FsError::UploadFieldMismatch { .. } => PyValueError::new_err(exception.to_string()),
        FsError::PartialCreate { .. } | FsError::Io { .. } => {
            PyOSError::new_err(exception.to_string())
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Upload table

#[pyclass(name = "UploadTable")]
#[derive(Debug, Clone, Default)]
struct PyUploadTable {
    upload_table: UploadTable,
}

#[pymethods]
impl PyUploadTable {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    #[pyo3(signature = (field, name, path_tmp, mime_type, size, code_error = 0))]
    fn add_single(
        &mut self,
        field: String,
        name: String,
        path_tmp: PathBuf,
        mime_type: String,
        size: u64,
        code_error: u32,
    ) -> PyResult<()> {
        let descriptor = UploadDescriptor {
            name,
            path_tmp,
            mime_type_declared: mime_type,
            size_declared: size,
            code_error: parse_code_error(code_error)?,
        };
        self.upload_table
            .insert(field, UploadField::Single(descriptor));
        Ok(())
    }

    fn add_batch(
        &mut self,
        field: String,
        names: Vec<String>,
        paths_tmp: Vec<PathBuf>,
        mime_types: Vec<String>,
        sizes: Vec<u64>,
        codes_error: Vec<u32>,
    ) -> PyResult<()> {
        let codes_error = codes_error
            .into_iter()
            .map(parse_code_error)
            .collect::<PyResult<Vec<_>>>()?;
        let upload_field = UploadField::from_parallel(
            &field,
            names,
            paths_tmp,
            mime_types,
            sizes,
            codes_error,
        )
        .map_err(map_fs_error)?;
        self.upload_table.insert(field, upload_field);
        Ok(())
    }

    fn __len__(&self) -> usize {
        self.upload_table.len()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileManager

#[pyclass(name = "FileManager")]
#[derive(Debug, Clone)]
struct PyFileManager {
    file_manager: FileManager,
}

#[pymethods]
impl PyFileManager {
    #[new]
    #[pyo3(signature = (
        mode_permission = None,
        rule_upload_naming = "original",
        rule_symlink = "dereference",
        rule_empty_dir_delete = "report_failure",
        rules_mime = None,
        if_preserve_metadata = false
    ))]
    fn new(
        mode_permission: Option<u32>,
        rule_upload_naming: &str,
        rule_symlink: &str,
        rule_empty_dir_delete: &str,
        rules_mime: Option<Vec<String>>,
        if_preserve_metadata: bool,
    ) -> PyResult<Self> {
        let mut spec_options = SpecFileManagerOptions {
            mode_permission,
            rule_upload_naming: parse_rule_upload_naming(rule_upload_naming)?,
            rule_symlink: parse_rule_symlink(rule_symlink)?,
            rule_empty_dir_delete: parse_rule_empty_dir_delete(rule_empty_dir_delete)?,
            if_preserve_metadata,
            ..SpecFileManagerOptions::default()
        };
        if let Some(values) = rules_mime {
            spec_options.rules_mime = parse_rules_mime(&values)?;
        }
        Ok(Self {
            file_manager: FileManager::new(spec_options),
        })
    }

    fn purge(&self, py: Python<'_>, dir: PathBuf) -> PyResult<PyReportTree> {
        let report = py.allow_threads(|| self.file_manager.purge_with_report(&dir));
        Ok(PyReportTree::from(report.map_err(map_fs_error)?))
    }

    #[pyo3(signature = (path, if_delete_self = true))]
    fn delete(&self, py: Python<'_>, path: PathBuf, if_delete_self: bool) -> PyResult<PyFsOutcome> {
        let outcome = py.allow_threads(|| self.file_manager.delete(&path, if_delete_self));
        Ok(PyFsOutcome::from(outcome.map_err(map_fs_error)?))
    }

    fn copy(&self, py: Python<'_>, from: PathBuf, to: PathBuf) -> PyResult<PyFsOutcome> {
        let outcome = py.allow_threads(|| self.file_manager.copy(&from, &to));
        Ok(PyFsOutcome::from(outcome.map_err(map_fs_error)?))
    }

    fn copy_tree(&self, py: Python<'_>, from: PathBuf, to: PathBuf) -> PyResult<PyReportTree> {
        let report = py.allow_threads(|| self.file_manager.copy_with_report(&from, &to));
        Ok(PyReportTree::from(report.map_err(map_fs_error)?))
    }

    #[pyo3(signature = (path, content = None, rule_write = "truncate"))]
    fn create(
        &self,
        py: Python<'_>,
        path: PathBuf,
        content: Option<Vec<u8>>,
        rule_write: &str,
    ) -> PyResult<bool> {
        let rule_write = parse_rule_write(rule_write)?;
        let content = content.unwrap_or_default();
        py.allow_threads(|| self.file_manager.create(&path, &content, rule_write))
            .map_err(map_fs_error)
    }

    #[pyo3(name = "move")]
    fn move_path(&self, py: Python<'_>, from: PathBuf, to: PathBuf) -> PyResult<()> {
        py.allow_threads(|| self.file_manager.move_path(&from, &to))
            .map_err(map_fs_error)
    }

    #[pyo3(signature = (
        path,
        filter = "all",
        patterns_include = None,
        patterns_exclude = None,
        rule_pattern = "glob"
    ))]
    fn list(
        &self,
        py: Python<'_>,
        path: PathBuf,
        filter: &str,
        patterns_include: Option<Vec<String>>,
        patterns_exclude: Option<Vec<String>>,
        rule_pattern: &str,
    ) -> PyResult<Option<Vec<PyListEntry>>> {
        let spec_list_options = SpecListOptions {
            filter: parse_rule_filter(filter)?,
            patterns_include,
            patterns_exclude,
            rule_pattern: parse_rule_pattern(rule_pattern)?,
        };
        let l_entries = py
            .allow_threads(|| self.file_manager.list_matching(&path, &spec_list_options))
            .map_err(map_fs_error)?;
        Ok(l_entries.map(|l| l.into_iter().map(PyListEntry::from).collect()))
    }

    #[pyo3(signature = (upload_table, field, dir_destination, rename = ""))]
    fn accept_upload(
        &self,
        py: Python<'_>,
        upload_table: &PyUploadTable,
        field: &str,
        dir_destination: PathBuf,
        rename: &str,
    ) -> PyResult<Option<PyUploadOutcome>> {
        let outcome = py
            .allow_threads(|| {
                self.file_manager.accept_upload(
                    &upload_table.upload_table,
                    field,
                    &dir_destination,
                    rename,
                )
            })
            .map_err(map_fs_error)?;
        Ok(outcome.map(PyUploadOutcome::from))
    }

    fn upload_types(&self, upload_table: &PyUploadTable, field: &str) -> Option<Vec<String>> {
        self.file_manager
            .upload_types(&upload_table.upload_table, field)
    }

    #[pyo3(signature = (upload_table, field, allowed_types, if_sniff = false))]
    fn validate_type(
        &self,
        py: Python<'_>,
        upload_table: &PyUploadTable,
        field: &str,
        allowed_types: Vec<String>,
        if_sniff: bool,
    ) -> bool {
        if if_sniff {
            return py.allow_threads(|| {
                self.file_manager.validate_type_sniffed(
                    &upload_table.upload_table,
                    field,
                    &allowed_types,
                )
            });
        }
        self.file_manager
            .validate_type(&upload_table.upload_table, field, &allowed_types)
    }

    fn validate_extension(
        &self,
        upload_table: &PyUploadTable,
        field: &str,
        allowed_extensions: Vec<String>,
    ) -> bool {
        self.file_manager
            .validate_extension(&upload_table.upload_table, field, &allowed_extensions)
    }

    fn validate_size(&self, upload_table: &PyUploadTable, field: &str, max_kib: u64) -> bool {
        self.file_manager
            .validate_size(&upload_table.upload_table, field, max_kib)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[pymodule]
fn _filekit_io_fs_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PySpecFsError>()?;
    module.add_class::<PyReportTree>()?;
    module.add_class::<PyFsOutcome>()?;
    module.add_class::<PyListEntry>()?;
    module.add_class::<PyUploadOutcome>()?;
    module.add_class::<PyUploadTable>()?;
    module.add_class::<PyFileManager>()?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
