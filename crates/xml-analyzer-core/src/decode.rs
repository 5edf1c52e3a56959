//! Character decoding of raw XML files.
//!
//! The encoding is chosen the way an XML processor does it:
//! 1. BOM (UTF-8, UTF-16 LE/BE)
//! 2. `encoding="..."` in the XML declaration
//! 3. UTF-8
//!
//! Bytes that are invalid in the chosen encoding are an error, not replaced.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

use crate::error::{ExtractError, Result};

/// UTF-8 BOM: EF BB BF
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
/// UTF-16 LE BOM: FF FE
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
/// UTF-16 BE BOM: FE FF
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// The XML declaration must fit in this many leading bytes to be honored.
const DECLARATION_WINDOW: usize = 1024;

/// Decode an XML file's bytes into text ready for parsing.
///
/// Valid UTF-8 input without a BOM is borrowed, not copied.
///
/// # Errors
///
/// Returns [`ExtractError::Decode`] if the bytes are malformed for the
/// detected encoding.
pub fn decode_document(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let (encoding, body) = detect_encoding(bytes);

    if encoding == UTF_8 {
        return std::str::from_utf8(body)
            .map(Cow::Borrowed)
            .map_err(|_| ExtractError::Decode {
                encoding: UTF_8.name(),
            });
    }

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or(ExtractError::Decode {
            encoding: encoding.name(),
        })
}

/// Pick the encoding for `bytes` and return it with the BOM stripped off.
fn detect_encoding(bytes: &[u8]) -> (&'static Encoding, &[u8]) {
    if let Some(body) = bytes.strip_prefix(UTF8_BOM) {
        return (UTF_8, body);
    }
    if let Some(body) = bytes.strip_prefix(UTF16_LE_BOM) {
        return (UTF_16LE, body);
    }
    if let Some(body) = bytes.strip_prefix(UTF16_BE_BOM) {
        return (UTF_16BE, body);
    }

    let declared = declared_encoding(bytes)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        // A declaration readable as ASCII rules out UTF-16 without a BOM.
        .filter(|enc| *enc != UTF_16LE && *enc != UTF_16BE);

    (declared.unwrap_or(UTF_8), bytes)
}

/// Extract the `encoding` pseudo-attribute from a leading XML declaration.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let window = &bytes[..bytes.len().min(DECLARATION_WINDOW)];
    if !window.starts_with(b"<?xml") {
        return None;
    }

    let end = window.windows(2).position(|w| w == b"?>")?;
    let declaration = String::from_utf8_lossy(&window[..end]);

    let rest = &declaration[declaration.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    let close = value.find(quote)?;

    Some(value[..close].to_string())
}
