//! Content type detection.
//!
//! [`ContentSniffer`] decides the effective [`MimeType`] of a decoded payload.
//! Precedence, highest first:
//!
//! 1. A syntactically valid declared type (from a data URI header), unless the
//!    payload is empty.
//! 2. Magic-byte signatures found in the first `window` bytes.
//! 3. Textual heuristics: valid UTF-8 without NUL bytes is text, with a few
//!    markup shapes (HTML, XML, SVG) told apart.
//! 4. The supplied file name's extension, consulted only when the byte-level
//!    result is inconclusive (`application/octet-stream`, or generic
//!    `text/plain` where the extension names another text type).
//! 5. `application/octet-stream`.
//!
//! Sniffing never looks at anything except its arguments, so identical bytes
//! always produce the same type.
//!
//! ```rust
//! use decoder::ContentSniffer;
//!
//! let sniffer = ContentSniffer::default();
//! let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
//! assert_eq!(sniffer.sniff(&png, None, None).essence(), "image/png");
//! assert!(sniffer.sniff(b"Hello, world!", None, None).is_txt());
//! ```
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Extension used when a type has no entry in the table.
pub const DEFAULT_EXTENSION: &str = "bin";

/// Type to preferred-extension table. The first row for a type is the one
/// used when naming; every row is consulted for extension lookups.
const EXTENSIONS: &[(&str, &str)] = &[
    ("text/plain", "txt"),
    ("text/html", "html"),
    ("text/css", "css"),
    ("text/csv", "csv"),
    ("text/markdown", "md"),
    ("text/javascript", "js"),
    ("application/javascript", "js"),
    ("application/json", "json"),
    ("application/xml", "xml"),
    ("text/xml", "xml"),
    ("image/svg+xml", "svg"),
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/bmp", "bmp"),
    ("image/tiff", "tif"),
    ("image/x-icon", "ico"),
    ("image/avif", "avif"),
    ("image/heic", "heic"),
    ("audio/mpeg", "mp3"),
    ("audio/wav", "wav"),
    ("audio/ogg", "ogg"),
    ("audio/flac", "flac"),
    ("audio/mp4", "m4a"),
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
    ("video/x-matroska", "mkv"),
    ("video/x-msvideo", "avi"),
    ("video/quicktime", "mov"),
    ("application/pdf", "pdf"),
    ("application/zip", "zip"),
    ("application/gzip", "gz"),
    ("application/x-bzip2", "bz2"),
    ("application/x-7z-compressed", "7z"),
    ("application/vnd.rar", "rar"),
    ("application/x-tar", "tar"),
    ("application/wasm", "wasm"),
    ("application/x-executable", "elf"),
];

/// Alternate spellings that map onto a table type.
const EXTENSION_ALIASES: &[(&str, &str)] = &[
    ("text", "text/plain"),
    ("log", "text/plain"),
    ("htm", "text/html"),
    ("mjs", "text/javascript"),
    ("jpeg", "image/jpeg"),
    ("jpe", "image/jpeg"),
    ("tiff", "image/tiff"),
    ("tgz", "application/gzip"),
];

/// A parsed `type/subtype` pair, lowercased, without parameters.
///
/// Serializes as its essence string (`"image/png"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MimeType {
    essence: String,
    slash: usize,
}

impl MimeType {
    /// Parses `type/subtype[;params]`. Returns `None` unless both halves are
    /// non-empty RFC 2045 tokens.
    ///
    /// ```rust
    /// use decoder::MimeType;
    ///
    /// let mime = MimeType::parse(" Text/HTML; charset=utf-8").unwrap();
    /// assert_eq!(mime.essence(), "text/html");
    /// assert!(MimeType::parse("text").is_none());
    /// assert!(MimeType::parse("text/plain text").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let essence = raw.split(';').next()?.trim();
        let (top, sub) = essence.split_once('/')?;
        if !is_token(top) || !is_token(sub) {
            return None;
        }
        Some(Self {
            essence: essence.to_ascii_lowercase(),
            slash: top.len(),
        })
    }

    /// Builds a type from a table literal known to be well formed.
    fn from_static(essence: &'static str) -> Self {
        let slash = essence.find('/').unwrap_or(essence.len());
        Self {
            essence: essence.to_string(),
            slash,
        }
    }

    pub fn octet_stream() -> Self {
        Self::from_static("application/octet-stream")
    }

    pub fn text_plain() -> Self {
        Self::from_static("text/plain")
    }

    /// `type/subtype`, lowercased.
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// The primary type, e.g. `image`.
    pub fn top_level(&self) -> &str {
        &self.essence[..self.slash]
    }

    /// The subtype, e.g. `png`.
    pub fn subtype(&self) -> &str {
        self.essence.get(self.slash + 1..).unwrap_or("")
    }

    /// Preferred file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        EXTENSIONS
            .iter()
            .find(|(mime, _)| *mime == self.essence)
            .map(|(_, ext)| *ext)
            .unwrap_or(DEFAULT_EXTENSION)
    }

    /// Exactly `text/plain`.
    pub fn is_txt(&self) -> bool {
        self.essence == "text/plain"
    }

    /// Any `text/*` type, plus structured text carried under other top-level
    /// types (JSON, XML, JavaScript, SVG).
    pub fn is_text(&self) -> bool {
        if self.top_level() == "text" {
            return true;
        }
        let sub = self.subtype();
        matches!(
            self.essence.as_str(),
            "application/json" | "application/xml" | "application/javascript"
        ) || sub.ends_with("+xml")
            || sub.ends_with("+json")
    }

    pub fn is_image(&self) -> bool {
        self.top_level() == "image"
    }

    pub fn is_audio(&self) -> bool {
        self.top_level() == "audio"
    }

    pub fn is_video(&self) -> bool {
        self.top_level() == "video"
    }

    pub fn is_pdf(&self) -> bool {
        self.essence == "application/pdf"
    }

    pub fn is_archive(&self) -> bool {
        matches!(
            self.essence.as_str(),
            "application/zip"
                | "application/gzip"
                | "application/x-bzip2"
                | "application/x-7z-compressed"
                | "application/vnd.rar"
                | "application/x-tar"
        )
    }

    /// Anything that is not text.
    pub fn is_binary(&self) -> bool {
        !self.is_text()
    }

    pub fn is_octet_stream(&self) -> bool {
        self.essence == "application/octet-stream"
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essence)
    }
}

impl TryFrom<String> for MimeType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        MimeType::parse(&value).ok_or_else(|| format!("invalid media type: {value:?}"))
    }
}

impl From<MimeType> for String {
    fn from(value: MimeType) -> Self {
        value.essence
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(
                    b,
                    b'(' | b')'
                        | b'<'
                        | b'>'
                        | b'@'
                        | b','
                        | b';'
                        | b':'
                        | b'\\'
                        | b'"'
                        | b'/'
                        | b'['
                        | b']'
                        | b'?'
                        | b'='
                )
        })
}

/// Looks up the type for a bare extension (no dot), case-insensitively.
///
/// The fixed table wins; `mime_guess` covers everything else.
pub fn mime_for_extension(ext: &str) -> Option<MimeType> {
    let ext = ext.to_ascii_lowercase();
    if let Some((mime, _)) = EXTENSIONS.iter().find(|(_, e)| *e == ext) {
        return Some(MimeType::from_static(mime));
    }
    if let Some((_, mime)) = EXTENSION_ALIASES.iter().find(|(e, _)| *e == ext) {
        return Some(MimeType::from_static(mime));
    }
    mime_guess::from_ext(&ext)
        .first_raw()
        .and_then(MimeType::parse)
}

/// Extension of the final path component of `name`, if it has one.
pub(crate) fn extension_of(name: &str) -> Option<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

struct Signature {
    offset: usize,
    magic: &'static [u8],
    mime: &'static str,
}

const SIGNATURES: &[Signature] = &[
    Signature { offset: 0, magic: b"\x89PNG\r\n\x1a\n", mime: "image/png" },
    Signature { offset: 0, magic: b"\xFF\xD8\xFF", mime: "image/jpeg" },
    Signature { offset: 0, magic: b"GIF87a", mime: "image/gif" },
    Signature { offset: 0, magic: b"GIF89a", mime: "image/gif" },
    Signature { offset: 0, magic: b"II*\x00", mime: "image/tiff" },
    Signature { offset: 0, magic: b"MM\x00*", mime: "image/tiff" },
    Signature { offset: 0, magic: b"\x00\x00\x01\x00", mime: "image/x-icon" },
    Signature { offset: 0, magic: b"%PDF-", mime: "application/pdf" },
    Signature { offset: 0, magic: b"PK\x03\x04", mime: "application/zip" },
    Signature { offset: 0, magic: b"PK\x05\x06", mime: "application/zip" },
    Signature { offset: 0, magic: b"PK\x07\x08", mime: "application/zip" },
    Signature { offset: 0, magic: b"\x1F\x8B", mime: "application/gzip" },
    Signature { offset: 0, magic: b"BZh", mime: "application/x-bzip2" },
    Signature { offset: 0, magic: b"7z\xBC\xAF\x27\x1C", mime: "application/x-7z-compressed" },
    Signature { offset: 0, magic: b"Rar!\x1A\x07", mime: "application/vnd.rar" },
    Signature { offset: 0, magic: b"OggS", mime: "audio/ogg" },
    Signature { offset: 0, magic: b"fLaC", mime: "audio/flac" },
    Signature { offset: 0, magic: b"ID3", mime: "audio/mpeg" },
    Signature { offset: 0, magic: b"\x00asm", mime: "application/wasm" },
    Signature { offset: 0, magic: b"\x7FELF", mime: "application/x-executable" },
    Signature { offset: 257, magic: b"ustar", mime: "application/x-tar" },
];

fn matches_at(head: &[u8], offset: usize, magic: &[u8]) -> bool {
    head.get(offset..offset + magic.len()) == Some(magic)
}

/// Container formats whose identity sits behind a generic header.
fn sniff_container(head: &[u8]) -> Option<&'static str> {
    if matches_at(head, 0, b"RIFF") {
        return match head.get(8..12)? {
            b"WEBP" => Some("image/webp"),
            b"WAVE" => Some("audio/wav"),
            b"AVI " => Some("video/x-msvideo"),
            _ => None,
        };
    }
    if matches_at(head, 4, b"ftyp") {
        return match head.get(8..12)? {
            b"avif" | b"avis" => Some("image/avif"),
            b"heic" | b"heix" | b"mif1" => Some("image/heic"),
            b"M4A " => Some("audio/mp4"),
            b"qt  " => Some("video/quicktime"),
            _ => Some("video/mp4"),
        };
    }
    if matches_at(head, 0, b"\x1A\x45\xDF\xA3") {
        let is_webm = head.windows(4).any(|w| w == b"webm");
        return Some(if is_webm { "video/webm" } else { "video/x-matroska" });
    }
    // "BM" alone opens plenty of text; also require the zeroed reserved words.
    if matches_at(head, 0, b"BM") && matches_at(head, 6, &[0, 0, 0, 0]) {
        return Some("image/bmp");
    }
    None
}

fn sniff_signature(head: &[u8]) -> Option<&'static str> {
    sniff_container(head).or_else(|| {
        SIGNATURES
            .iter()
            .find(|sig| matches_at(head, sig.offset, sig.magic))
            .map(|sig| sig.mime)
    })
}

/// Classifies a UTF-8, NUL-free prefix. `truncated` means `head` is a prefix of
/// a longer payload, so a multi-byte sequence cut at the end is tolerated.
fn sniff_text(head: &[u8], truncated: bool) -> Option<&'static str> {
    let head = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
    if head.contains(&0) {
        return None;
    }
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(err) if truncated && err.error_len().is_none() => {
            std::str::from_utf8(&head[..err.valid_up_to()]).ok()?
        }
        Err(_) => return None,
    };

    let lead: String = text
        .trim_start()
        .chars()
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    if lead.starts_with("<?xml") {
        return Some(if text.contains("<svg") {
            "image/svg+xml"
        } else {
            "application/xml"
        });
    }
    if lead.starts_with("<svg") {
        return Some("image/svg+xml");
    }
    if lead.starts_with("<!doctype html") || lead.starts_with("<html") {
        return Some("text/html");
    }
    Some("text/plain")
}

/// Infers content types from bytes, a declared type, and a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentSniffer {
    window: usize,
}

impl Default for ContentSniffer {
    fn default() -> Self {
        Self::new(512)
    }
}

impl ContentSniffer {
    /// `window` is the number of leading bytes inspected.
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Effective type of `bytes`. See the module docs for precedence.
    pub fn sniff(
        &self,
        bytes: &[u8],
        declared_type: Option<&str>,
        declared_name: Option<&str>,
    ) -> MimeType {
        if !bytes.is_empty() {
            if let Some(mime) = declared_type.and_then(MimeType::parse) {
                return mime;
            }
        }

        let sniffed = self.sniff_bytes(bytes);
        let by_name = declared_name
            .and_then(extension_of)
            .and_then(mime_for_extension);
        match by_name {
            Some(named) if is_inconclusive(&sniffed, &named) => {
                trace!(sniffed = %sniffed, named = %named, "sniff_name_tiebreak");
                named
            }
            _ => sniffed,
        }
    }

    /// Byte-only classification, ignoring any declared type or name.
    pub fn sniff_bytes(&self, bytes: &[u8]) -> MimeType {
        let head = &bytes[..bytes.len().min(self.window)];
        let found = sniff_signature(head)
            .or_else(|| sniff_text(head, head.len() < bytes.len()))
            .unwrap_or("application/octet-stream");
        MimeType::from_static(found)
    }
}

fn is_inconclusive(sniffed: &MimeType, named: &MimeType) -> bool {
    sniffed.is_octet_stream() || (sniffed.is_txt() && named.is_text())
}
