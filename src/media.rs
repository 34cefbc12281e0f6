/// MIME handling for uploaded and served images. Uploads trust the client's
/// content type unless it is missing or the generic octet-stream, falling
/// back to the file extension; serving falls back to magic-byte sniffing
/// when no type was stored.

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Resolves the MIME type recorded for an upload.
pub fn upload_content_type(filename: &str, provided: Option<&str>) -> String {
    if let Some(provided) = provided {
        if !provided.is_empty() && provided != OCTET_STREAM {
            return provided.to_string();
        }
    }

    match extension(filename).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg".to_string(),
        Some("png") => "image/png".to_string(),
        Some("gif") => "image/gif".to_string(),
        Some("webp") => "image/webp".to_string(),
        Some("svg") => "image/svg+xml".to_string(),
        _ => OCTET_STREAM.to_string(),
    }
}

/// Sniffs an image type from leading magic bytes, for blobs stored without
/// a recorded MIME type.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => "image/gif",
        // WebP: 52 49 46 46 ... 57 45 42 50
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        _ => OCTET_STREAM,
    }
}

fn extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
