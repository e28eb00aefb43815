//! Data URI Decoder
//!
//! Turns file-like inputs into typed, content-addressed records. A caller hands
//! over a data URI, a blob of text or bytes, or a file handle; what comes back
//! is an immutable [`FileRecord`] holding the decoded bytes, a sniffed
//! [`MimeType`], a safe file name and a SHA-256 digest.
//!
//! ## What we do here
//!
//! - **Parse RFC 2397 URIs** - media type, `charset`, `name`, `;base64`
//! - **Decode payloads** - padded base64 or strict percent escapes
//! - **Sniff content** - magic numbers first, text heuristics second, the file
//!   extension only as a tiebreak
//! - **Derive names** - sanitize what the caller suggested, or synthesize
//!   `<hash prefix>.<ext>` so identical bytes get identical names
//! - **Enforce limits** - decoded size is capped for every source kind
//! - **Log every call** - one span per call plus `decode_success` /
//!   `decode_failure` events with timings
//!
//! ## Pipeline
//!
//! ```text
//! Source ──► bytes ──► ContentSniffer ──► NameDeriver ──► FileRecord
//!   │          ▲
//!   │          ├── DataUri: parse_data_uri ─► decode_payload
//!   │          ├── Text / Bytes: taken as-is
//!   │          └── File: check() ─► bounded read
//! ```
//!
//! ## Main entry point
//!
//! Build a [`DataDecoder`] once and call [`DataDecoder::decode`] or
//! [`DataDecoder::decode_text`] as often as needed; the decoder holds no state
//! between calls and can be shared across threads.
//!
//! ## Example
//!
//! ```
//! use decoder::{DataDecoder, Source};
//!
//! let decoder = DataDecoder::default();
//! let record = decoder
//!     .decode(Source::DataUri("data:text/plain;base64,SGVsbG8sIHdvcmxkIQ==".into()), None)
//!     .unwrap();
//!
//! assert_eq!(record.read(), b"Hello, world!");
//! assert!(record.mime_type().is_txt());
//! assert_eq!(record.name(), "315f5bdb76d078c4.txt");
//! ```
use std::io::Read;
use std::time::Instant;

use bytes::Bytes;
use tracing::{info, warn, Level};

mod classify;
mod config;
mod error;
mod name;
mod payload;
mod sniff;
mod types;
mod uri;

pub use crate::classify::{classify_source, SourceClass};
pub use crate::config::{
    ConfigError, DecoderConfig, DEFAULT_MAX_PAYLOAD_BYTES, MIN_SNIFF_WINDOW_BYTES,
};
pub use crate::error::DecodeError;
pub use crate::name::{content_digest, NameDeriver};
pub use crate::payload::{decode_payload, min_decoded_len, Charset};
pub use crate::sniff::{mime_for_extension, ContentSniffer, MimeType, DEFAULT_EXTENSION};
pub use crate::types::{FileHandle, FileRecord, LocalFile, Source, UploadStatus, UploadedFile};
pub use crate::uri::{
    has_data_scheme, parse_data_uri, DecodedUri, DEFAULT_CHARSET, DEFAULT_MEDIA_TYPE,
};

/// Bytes pulled out of a source, plus whatever the source said about them.
struct Loaded {
    bytes: Bytes,
    declared_type: Option<MimeType>,
    /// Handle name or URI `name=` parameter.
    source_name: Option<String>,
}

impl Loaded {
    fn raw(bytes: Bytes) -> Self {
        Self {
            bytes,
            declared_type: None,
            source_name: None,
        }
    }
}

/// Stateless decoding engine. Cheap to clone; safe to share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDecoder {
    config: DecoderConfig,
    sniffer: ContentSniffer,
    names: NameDeriver,
}

impl Default for DataDecoder {
    fn default() -> Self {
        Self::from_valid(DecoderConfig::default())
    }
}

impl DataDecoder {
    /// Builds a decoder after validating `config`.
    pub fn new(config: DecoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: DecoderConfig) -> Self {
        Self {
            sniffer: ContentSniffer::new(config.sniff_window_bytes),
            names: NameDeriver::new(config.max_name_len, config.hash_prefix_len),
            config,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes any [`Source`] into a [`FileRecord`].
    ///
    /// `suggested_name` wins over a handle's own name and over a URI `name=`
    /// parameter; with none of them usable the name is synthesized from the
    /// content.
    pub fn decode(
        &self,
        source: Source,
        suggested_name: Option<&str>,
    ) -> Result<FileRecord, DecodeError> {
        let start = Instant::now();
        let span = tracing::span!(Level::INFO, "decoder.decode", source = source.kind());
        let _guard = span.enter();

        let result = self
            .load(source)
            .map(|loaded| self.finish(loaded, suggested_name));
        log_outcome(&result, start);
        result
    }

    /// Decodes plain text as a UTF-8 document.
    ///
    /// The type is sniffed, so markup keeps its type, but anything outside the
    /// text family is reported as `text/plain`. Only the size limit can fail.
    ///
    /// ```
    /// use decoder::DataDecoder;
    ///
    /// let record = DataDecoder::default().decode_text("Hello, world!", None).unwrap();
    /// assert!(record.mime_type().is_txt());
    /// assert_eq!(record.text(), Some("Hello, world!"));
    /// ```
    pub fn decode_text(
        &self,
        text: &str,
        suggested_name: Option<&str>,
    ) -> Result<FileRecord, DecodeError> {
        let start = Instant::now();
        let span = tracing::span!(Level::INFO, "decoder.decode", source = "text");
        let _guard = span.enter();

        let result = self.check_len(text.len()).map(|()| {
            let bytes = Bytes::copy_from_slice(text.as_bytes());
            let mut mime = self.sniffer.sniff(&bytes, None, suggested_name);
            if !mime.is_text() {
                mime = MimeType::text_plain();
            }
            let name = self.names.derive(suggested_name, &mime, &bytes);
            FileRecord::new(bytes, mime, name)
        });
        log_outcome(&result, start);
        result
    }

    fn load(&self, source: Source) -> Result<Loaded, DecodeError> {
        match source {
            Source::DataUri(input) => self.load_data_uri(&input),
            Source::Text(text) => {
                self.check_len(text.len())?;
                Ok(Loaded::raw(Bytes::from(text.into_bytes())))
            }
            Source::Bytes(bytes) => {
                self.check_len(bytes.len())?;
                Ok(Loaded::raw(bytes))
            }
            Source::File(handle) => self.load_file(handle.as_ref()),
        }
    }

    fn load_data_uri(&self, input: &str) -> Result<Loaded, DecodeError> {
        let uri = parse_data_uri(input)?;
        let limit = self.config.max_payload_bytes;
        let floor = min_decoded_len(uri.payload, uri.is_base64);
        if floor > limit {
            return Err(DecodeError::PayloadTooLarge(format!(
                "payload decodes to at least {floor} bytes, limit is {limit}"
            )));
        }

        let bytes = decode_payload(uri.payload, uri.is_base64, uri.payload_charset())?;
        self.check_len(bytes.len())?;
        Ok(Loaded {
            bytes: Bytes::from(bytes),
            declared_type: uri.declared_type,
            source_name: uri.name,
        })
    }

    fn load_file(&self, handle: &dyn FileHandle) -> Result<Loaded, DecodeError> {
        handle.check().map_err(DecodeError::UnreadableSource)?;

        let limit = self.config.max_payload_bytes;
        let hint = handle.size_hint();
        if let Some(size) = hint {
            if size > limit as u64 {
                return Err(DecodeError::PayloadTooLarge(format!(
                    "file size {size} exceeds limit of {limit}"
                )));
            }
        }

        let unreadable = |err: std::io::Error| {
            let message = match handle.name() {
                Some(name) => format!("The file \"{name}\" could not be read: {err}"),
                None => format!("The file could not be read: {err}"),
            };
            DecodeError::UnreadableSource(message)
        };

        // Read one byte past the limit so a lying size hint is still caught.
        let reader = handle.open().map_err(unreadable)?;
        let capacity = hint.map_or(0, |size| size as usize);
        let mut buf = Vec::with_capacity(capacity);
        reader
            .take((limit as u64).saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(unreadable)?;
        self.check_len(buf.len())?;

        Ok(Loaded {
            bytes: Bytes::from(buf),
            declared_type: None,
            source_name: handle.name().map(str::to_string),
        })
    }

    fn finish(&self, loaded: Loaded, suggested_name: Option<&str>) -> FileRecord {
        let Loaded {
            bytes,
            declared_type,
            source_name,
        } = loaded;
        let raw_name = suggested_name.or(source_name.as_deref());
        let mime = self.sniffer.sniff(
            &bytes,
            declared_type.as_ref().map(MimeType::essence),
            raw_name,
        );
        let name = self.names.derive(raw_name, &mime, &bytes);
        FileRecord::new(bytes, mime, name)
    }

    fn check_len(&self, len: usize) -> Result<(), DecodeError> {
        let limit = self.config.max_payload_bytes;
        if len > limit {
            return Err(DecodeError::PayloadTooLarge(format!(
                "decoded size {len} exceeds limit of {limit}"
            )));
        }
        Ok(())
    }
}

fn log_outcome(result: &Result<FileRecord, DecodeError>, start: Instant) {
    let elapsed_micros = start.elapsed().as_micros();
    match result {
        Ok(record) => info!(
            mime_type = %record.mime_type(),
            size = record.size(),
            name = %record.name(),
            elapsed_micros,
            "decode_success"
        ),
        Err(err) => warn!(
            error = %err,
            kind = err.kind(),
            elapsed_micros,
            "decode_failure"
        ),
    }
}
