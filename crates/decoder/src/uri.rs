//! RFC 2397 `data:` URI parsing.
//!
//! ```text
//! data:[<mediatype>][;charset=<label>][;name=<file>][;base64],<payload>
//! ```
//!
//! [`parse_data_uri`] only splits and validates the header; the payload stays
//! borrowed from the input until [`decode_payload`](crate::decode_payload)
//! turns it into bytes.
//!
//! ```rust
//! use decoder::parse_data_uri;
//!
//! let uri = parse_data_uri("data:text/plain;charset=utf-8;base64,SGk=").unwrap();
//! assert_eq!(uri.media_type(), "text/plain");
//! assert_eq!(uri.charset.as_deref(), Some("utf-8"));
//! assert!(uri.is_base64);
//! assert_eq!(uri.payload, "SGk=");
//! ```
use tracing::trace;

use crate::error::DecodeError;
use crate::payload::{decode_payload, Charset};
use crate::sniff::MimeType;

const SCHEME: &str = "data:";

/// Media type assumed when the header names none.
pub const DEFAULT_MEDIA_TYPE: &str = "text/plain";

/// Charset assumed when the header names none.
pub const DEFAULT_CHARSET: &str = "US-ASCII";

/// The pieces of a data URI, prior to payload decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedUri<'a> {
    /// Declared `type/subtype`, lowercased. `None` when the header omits it.
    pub declared_type: Option<MimeType>,
    /// Value of the `charset` parameter, if present.
    pub charset: Option<String>,
    /// Value of a `name` or `filename` parameter, percent-decoded when possible.
    pub name: Option<String>,
    /// Whether the header ends with the `;base64` token.
    pub is_base64: bool,
    /// Everything after the first comma, untouched.
    pub payload: &'a str,
}

impl DecodedUri<'_> {
    /// Declared media type, or `text/plain` when omitted.
    pub fn media_type(&self) -> &str {
        self.declared_type
            .as_ref()
            .map(MimeType::essence)
            .unwrap_or(DEFAULT_MEDIA_TYPE)
    }

    /// Declared charset, or `US-ASCII` when omitted.
    pub fn charset_label(&self) -> &str {
        self.charset.as_deref().unwrap_or(DEFAULT_CHARSET)
    }

    /// Charset used for the literal characters of a percent-encoded payload.
    pub fn payload_charset(&self) -> Charset {
        Charset::from_label(self.charset.as_deref())
    }
}

/// Whether `input` starts with the `data:` scheme (ASCII case-insensitive).
pub fn has_data_scheme(input: &str) -> bool {
    input
        .get(..SCHEME.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SCHEME))
}

/// Splits a data URI into header fields and payload.
///
/// # Errors
///
/// - [`DecodeError::NotADataUri`] when the scheme is missing.
/// - [`DecodeError::MalformedHeader`] when there is no comma or the media
///   type is not a `type/subtype` pair.
pub fn parse_data_uri(input: &str) -> Result<DecodedUri<'_>, DecodeError> {
    let input = input.trim();
    if !has_data_scheme(input) {
        return Err(DecodeError::NotADataUri);
    }
    let rest = &input[SCHEME.len()..];
    let Some((header, payload)) = rest.split_once(',') else {
        return Err(DecodeError::MalformedHeader(
            "missing ',' between header and payload".into(),
        ));
    };

    let mut segments: Vec<&str> = header.split(';').map(str::trim).collect();
    let is_base64 = segments
        .last()
        .is_some_and(|last| last.eq_ignore_ascii_case("base64"));
    if is_base64 {
        segments.pop();
    }

    let mut declared_type = None;
    let mut params = segments.as_slice();
    if let Some((first, tail)) = params.split_first() {
        if !first.contains('=') {
            if !first.is_empty() {
                declared_type = Some(MimeType::parse(first).ok_or_else(|| {
                    DecodeError::MalformedHeader(format!("invalid media type {first:?}"))
                })?);
            }
            params = tail;
        }
    }

    let mut charset = None;
    let mut name = None;
    for param in params {
        let Some((key, value)) = param.split_once('=') else {
            if !param.is_empty() {
                trace!(token = %param, "data_uri_ignored_token");
            }
            continue;
        };
        let value = value.trim().trim_matches('"');
        match key.trim().to_ascii_lowercase().as_str() {
            "charset" if !value.is_empty() => charset = Some(value.to_string()),
            "name" | "filename" if !value.is_empty() => name = Some(unescape_param(value)),
            _ => trace!(param = %param, "data_uri_ignored_param"),
        }
    }

    Ok(DecodedUri {
        declared_type,
        charset,
        name,
        is_base64,
        payload,
    })
}

fn unescape_param(value: &str) -> String {
    decode_payload(value, false, Charset::Utf8)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| value.to_string())
}
