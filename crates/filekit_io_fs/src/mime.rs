//! Extension → MIME resolution.
//!
//! Listings resolve a file's MIME type by running [`EnumMimeStrategy`] steps in
//! order and falling back to [`C_MIME_FALLBACK`] when none answers.

use std::path::Path;

use crate::spec::EnumMimeStrategy;

/// Answer when no strategy recognizes a file.
pub const C_MIME_FALLBACK: &str = "application/octet-stream";

const TUP_MIME_TABLE: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("php", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("swf", "application/x-shockwave-flash"),
    ("flv", "video/x-flv"),
    ("sql", "text/x-sql"),
    // images
    ("png", "image/png"),
    ("jpe", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("ico", "image/vnd.microsoft.icon"),
    ("tiff", "image/tiff"),
    ("tif", "image/tiff"),
    ("svg", "image/svg+xml"),
    ("svgz", "image/svg+xml"),
    ("webp", "image/webp"),
    // archives
    ("zip", "application/zip"),
    ("rar", "application/x-rar-compressed"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("exe", "application/x-msdownload"),
    ("msi", "application/x-msdownload"),
    ("cab", "application/vnd.ms-cab-compressed"),
    // audio/video
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("mp4", "video/mp4"),
    ("qt", "video/quicktime"),
    ("mov", "video/quicktime"),
    // adobe
    ("pdf", "application/pdf"),
    ("psd", "image/vnd.adobe.photoshop"),
    ("ai", "application/postscript"),
    ("eps", "application/postscript"),
    ("ps", "application/postscript"),
    // ms office
    ("doc", "application/msword"),
    ("rtf", "application/rtf"),
    ("xls", "application/vnd.ms-excel"),
    ("ppt", "application/vnd.ms-powerpoint"),
    // open office
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("csv", "text/csv"),
];

/// Look up a lower-cased extension in the built-in table.
pub fn lookup_mime_by_extension(extension: &str) -> Option<&'static str> {
    let c_ext = extension.to_ascii_lowercase();
    TUP_MIME_TABLE
        .iter()
        .find(|(ext, _)| *ext == c_ext)
        .map(|(_, mime)| *mime)
}

/// Detect a MIME type from the file's leading bytes.
pub fn sniff_mime(path_file: &Path) -> Option<String> {
    match infer::get_from_path(path_file) {
        Ok(kind) => kind.map(|k| k.mime_type().to_string()),
        Err(e) => {
            tracing::debug!(path = %path_file.display(), error = %e, "content sniffing failed");
            None
        }
    }
}

/// Run `rules_mime` in order for one file.
pub fn resolve_mime(path_file: &Path, extension: &str, rules_mime: &[EnumMimeStrategy]) -> String {
    rules_mime
        .iter()
        .find_map(|rule| match rule {
            EnumMimeStrategy::Table => lookup_mime_by_extension(extension).map(str::to_string),
            EnumMimeStrategy::Sniff => sniff_mime(path_file),
        })
        .unwrap_or_else(|| C_MIME_FALLBACK.to_string())
}
