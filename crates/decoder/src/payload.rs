//! Payload decoding: the part of a data URI after the first comma.
//!
//! Two transfer encodings exist:
//!
//! - **base64** (`;base64` in the header): percent escapes are resolved first,
//!   since RFC 2397 payloads are URL characters and `+`, `/`, `=` are often
//!   escaped; ASCII whitespace is then dropped and the rest decoded with the
//!   standard, padded alphabet.
//! - **percent-encoded** (default): `%XX` escapes become raw bytes; every other
//!   character is encoded with the declared [`Charset`].
//!
//! Decoding is strict. A `%` that is not followed by two hex digits, a
//! character outside the base64 alphabet, or wrong padding all fail with
//! [`DecodeError::InvalidEncoding`].
//!
//! ```rust
//! use decoder::{decode_payload, Charset};
//!
//! let bytes = decode_payload("SGVsbG8sIHdvcmxkIQ==", true, Charset::Utf8).unwrap();
//! assert_eq!(bytes, b"Hello, world!");
//!
//! let bytes = decode_payload("caf%C3%A9", false, Charset::Utf8).unwrap();
//! assert_eq!(bytes, "café".as_bytes());
//!
//! assert!(decode_payload("100%", false, Charset::Utf8).is_err());
//! ```
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::DecodeError;

/// Character set used for the literal (unescaped) characters of a
/// percent-encoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// UTF-8. Also used for `US-ASCII` and for labels we do not recognize.
    #[default]
    Utf8,
    /// ISO-8859-1: one byte per character, U+0000..=U+00FF only.
    Latin1,
}

impl Charset {
    /// Maps a `charset=` label to a [`Charset`], case-insensitively.
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label else {
            return Charset::Utf8;
        };
        match label.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "iso-8859-1" | "iso_8859-1" | "iso8859-1" | "latin1" | "latin-1" | "l1" => {
                Charset::Latin1
            }
            _ => Charset::Utf8,
        }
    }
}

/// Decodes a payload segment into raw bytes.
pub fn decode_payload(
    payload: &str,
    is_base64: bool,
    charset: Charset,
) -> Result<Vec<u8>, DecodeError> {
    if is_base64 {
        decode_base64(payload)
    } else {
        percent_decode(payload, charset)
    }
}

/// Smallest number of bytes `payload` can decode to, if it decodes at all.
///
/// Cheap enough to run before decoding so an oversized payload is rejected
/// without allocating its output.
pub fn min_decoded_len(payload: &str, is_base64: bool) -> usize {
    let escapes = payload.bytes().filter(|&b| b == b'%').count();
    if is_base64 {
        // An escape may stand for a single alphabet character, so its two hex
        // digits are not counted.
        let symbols = payload
            .bytes()
            .filter(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/'))
            .count()
            .saturating_sub(escapes * 2);
        symbols * 3 / 4
    } else {
        payload.chars().count().saturating_sub(escapes * 2)
    }
}

fn decode_base64(payload: &str) -> Result<Vec<u8>, DecodeError> {
    let unescaped;
    let payload = if payload.contains('%') {
        unescaped = percent_decode(payload, Charset::Utf8)?;
        unescaped.as_slice()
    } else {
        payload.as_bytes()
    };

    let compact: Vec<u8> = payload
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(&compact)
        .map_err(|err| DecodeError::InvalidEncoding(format!("invalid base64: {err}")))
}

fn percent_decode(payload: &str, charset: Charset) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(payload.len());
    let mut chars = payload.char_indices();
    while let Some((pos, c)) = chars.next() {
        if c == '%' {
            let hi = chars.next().and_then(|(_, h)| h.to_digit(16));
            let lo = chars.next().and_then(|(_, l)| l.to_digit(16));
            match (hi, lo) {
                (Some(hi), Some(lo)) => out.push((hi * 16 + lo) as u8),
                _ => {
                    return Err(DecodeError::InvalidEncoding(format!(
                        "invalid percent escape at byte {pos}"
                    )));
                }
            }
            continue;
        }

        match charset {
            Charset::Utf8 => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            Charset::Latin1 => {
                let code = u32::from(c);
                if code > 0xFF {
                    return Err(DecodeError::InvalidEncoding(format!(
                        "character {c:?} at byte {pos} is not representable in ISO-8859-1"
                    )));
                }
                out.push(code as u8);
            }
        }
    }
    Ok(out)
}
