//! File name derivation.
//!
//! A supplied name is reduced to its final path component and filtered to a
//! conservative allow-list (`A-Z a-z 0-9 - _ .`). Leading dots are dropped so
//! the result can be neither hidden nor a `..` traversal, and the name is cut
//! to the configured byte limit while keeping its extension.
//!
//! Without a usable supplied name, one is synthesized from content:
//!
//! ```text
//! <first N hex chars of SHA-256(bytes)>.<extension for the mime type>
//! ```
//!
//! so identical bytes always receive identical names.
//!
//! ```rust
//! use decoder::{MimeType, NameDeriver};
//!
//! let deriver = NameDeriver::default();
//! let text = MimeType::text_plain();
//!
//! assert_eq!(deriver.derive(Some("../../etc/passwd"), &text, b""), "passwd");
//! assert_eq!(deriver.derive(Some("C:\\Users\\me\\photo 1.jpg"), &text, b""), "photo1.jpg");
//!
//! let name = deriver.derive(None, &text, b"Hello, world!");
//! assert_eq!(name, "315f5bdb76d078c4.txt");
//! ```
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::sniff::MimeType;

/// Full lowercase hex SHA-256 digest of `bytes`.
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Produces safe, bounded file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameDeriver {
    max_len: usize,
    hash_prefix_len: usize,
}

impl Default for NameDeriver {
    fn default() -> Self {
        Self::new(128, 16)
    }
}

impl NameDeriver {
    /// `hash_prefix_len` is clamped to `8..=64` and `max_len` to at least 1,
    /// so every derived name is non-empty and never starts with a dot.
    pub fn new(max_len: usize, hash_prefix_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
            hash_prefix_len: hash_prefix_len.clamp(8, 64),
        }
    }

    /// Sanitized `suggested`, or a content-derived name when it is absent or
    /// sanitizes to nothing.
    pub fn derive(&self, suggested: Option<&str>, mime: &MimeType, bytes: &[u8]) -> String {
        if let Some(name) = suggested.and_then(|raw| self.sanitize(raw)) {
            return name;
        }
        let name = self.synthesize(mime, bytes);
        debug!(name = %name, "name_synthesized");
        name
    }

    /// Applies the allow-list and length bound. `None` if nothing survives.
    pub fn sanitize(&self, raw: &str) -> Option<String> {
        let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
        let filtered: String = base
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            .collect();
        let trimmed = filtered.trim_start_matches('.');
        if trimmed.is_empty() {
            return None;
        }
        Some(self.truncate(trimmed))
    }

    /// `<hash prefix>.<extension>`.
    pub fn synthesize(&self, mime: &MimeType, bytes: &[u8]) -> String {
        let digest = content_digest(bytes);
        format!("{}.{}", &digest[..self.hash_prefix_len], mime.extension())
    }

    /// Cuts the stem so that `stem.ext` fits in `max_len`. Input is ASCII.
    fn truncate(&self, name: &str) -> String {
        if name.len() <= self.max_len {
            return name.to_string();
        }
        match name.rsplit_once('.') {
            // Keep the extension only when it leaves room for a stem.
            Some((stem, ext)) if !stem.is_empty() && ext.len() + 2 <= self.max_len => {
                let keep = self.max_len - ext.len() - 1;
                format!("{}.{}", &stem[..keep.min(stem.len())], ext)
            }
            _ => name[..self.max_len].to_string(),
        }
    }
}
