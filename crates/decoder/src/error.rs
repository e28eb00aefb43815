//! Error types produced by the decoder crate.
//!
//! Every failure of [`DataDecoder::decode`](crate::DataDecoder::decode) is
//! terminal for that call: no partially built [`FileRecord`](crate::FileRecord)
//! is ever returned, and nothing is retried internally.
//!
//! # Error Categories
//!
//! | Error | Raised by | Description |
//! |-------|-----------|-------------|
//! | [`NotADataUri`](DecodeError::NotADataUri) | URI parser | Input lacks the `data:` scheme |
//! | [`MalformedHeader`](DecodeError::MalformedHeader) | URI parser | No comma, or an unparseable media type |
//! | [`InvalidEncoding`](DecodeError::InvalidEncoding) | Payload decoder | Bad base64 or percent escape |
//! | [`PayloadTooLarge`](DecodeError::PayloadTooLarge) | Facade | Decoded size above the configured ceiling |
//! | [`UnreadableSource`](DecodeError::UnreadableSource) | Facade | Handle reported an invalid state or failed to read |
//!
//! # Examples
//!
//! ```rust
//! use decoder::{DataDecoder, DecodeError, Source};
//!
//! let decoder = DataDecoder::default();
//! match decoder.decode(Source::DataUri("data:text/plain;base64,@@@".into()), None) {
//!     Err(DecodeError::InvalidEncoding(msg)) => assert!(msg.contains("base64")),
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```
use thiserror::Error;

/// Errors that can occur while decoding a source into a file record.
///
/// The enum is `#[non_exhaustive]`; match with a catch-all arm.
///
/// ```rust
/// use decoder::DecodeError;
///
/// let err = DecodeError::UnreadableSource(
///     "The file \"photo.jpeg\" was only partially uploaded.".into(),
/// );
/// assert_eq!(err.to_string(), "The file \"photo.jpeg\" was only partially uploaded.");
/// assert_eq!(err.kind(), "unreadable_source");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The input was expected to be a data URI but does not start with `data:`.
    #[error("input is not a data: URI")]
    NotADataUri,

    /// The data URI has no comma separating header and payload, or its
    /// media type is not a `type/subtype` pair.
    #[error("malformed data URI header: {0}")]
    MalformedHeader(String),

    /// The payload is not valid base64 or contains a broken percent escape.
    #[error("invalid payload encoding: {0}")]
    InvalidEncoding(String),

    /// The decoded content exceeds `DecoderConfig::max_payload_bytes`.
    #[error("payload exceeds size limit: {0}")]
    PayloadTooLarge(String),

    /// The source reported an invalid state or could not be read.
    ///
    /// The message is shown verbatim since it is meant for end users.
    #[error("{0}")]
    UnreadableSource(String),
}

impl DecodeError {
    /// Stable snake_case label, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::NotADataUri => "not_a_data_uri",
            DecodeError::MalformedHeader(_) => "malformed_header",
            DecodeError::InvalidEncoding(_) => "invalid_encoding",
            DecodeError::PayloadTooLarge(_) => "payload_too_large",
            DecodeError::UnreadableSource(_) => "unreadable_source",
        }
    }

    /// Whether the failure is attributable to the caller's input rather than
    /// to the environment (e.g. a disk read error).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, DecodeError::UnreadableSource(_))
    }
}
