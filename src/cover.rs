//! Cover image extraction from FB2 `binary` nodes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::document::Document;
use crate::types::CoverImage;

/// `content-type` values accepted for a cover.
const JPEG_CONTENT_TYPES: [&str; 2] = ["image/jpeg", "image/jpg"];

/// Finds the first JPEG `binary` node and decodes it.
///
/// A corrupt payload is logged and treated as "no cover"; it never fails the
/// conversion.
pub fn extract_cover(document: &Document) -> Option<CoverImage> {
    let binary = document.find_with_attr("binary", "content-type", &JPEG_CONTENT_TYPES)?;

    match decode_payload(&binary.text()) {
        Ok(data) => {
            log::debug!("Found JPEG cover ({} bytes)", data.len());
            Some(CoverImage::jpeg(data))
        }
        Err(e) => {
            log::warn!(
                "Failed to decode cover image '{}': {}",
                binary.attr("id").unwrap_or("<no id>"),
                e
            );
            None
        }
    }
}

/// Decodes base64 text, ignoring the line breaks and indentation FB2 writers insert.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD.decode(compact)
}
