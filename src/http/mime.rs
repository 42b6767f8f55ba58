//! Content-Type lookup by file extension.

use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content-Type for a served file, decided by its extension
/// (case-insensitive). Unknown or missing extensions yield
/// `application/octet-stream`.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") => "text/html; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => OCTET_STREAM,
    }
}
