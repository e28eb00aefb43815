//! Core data model: what goes into the decoder and what comes out.
//!
//! ```text
//! Source
//! ├── Text(String)            raw text, taken as opaque bytes
//! ├── DataUri(String)         RFC 2397 data: URI
//! ├── Bytes(Bytes)            raw buffer
//! └── File(Box<dyn FileHandle>)
//!     ├── LocalFile           path on disk, name = final path component
//!     └── UploadedFile        temp path + client name + UploadStatus
//!
//!         ↓ DataDecoder::decode()
//!
//! FileRecord (immutable)
//! ├── bytes: Bytes
//! ├── mime_type: MimeType
//! ├── name: String            sanitized or synthesized
//! ├── size: usize
//! └── hash: String            SHA-256 hex
//! ```
use std::fmt;
use std::fs;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;

use crate::name::content_digest;
use crate::sniff::MimeType;

/// A byte-bearing handle supplied by the caller: an upload, a file on disk,
/// or anything else that can be read once.
///
/// Implementations must be cheap to query; [`check`](FileHandle::check) runs
/// before any bytes are read.
pub trait FileHandle: fmt::Debug + Send + Sync {
    /// The handle's own file name, if it has one.
    fn name(&self) -> Option<&str>;

    /// `Err` carries a user-facing message explaining why the handle cannot be
    /// used, e.g. `The file "photo.jpeg" was only partially uploaded.`
    fn check(&self) -> Result<(), String>;

    /// Total size in bytes, when known up front.
    fn size_hint(&self) -> Option<u64> {
        None
    }

    /// Opens the content for reading.
    fn open(&self) -> io::Result<Box<dyn Read + '_>>;
}

/// Input accepted by [`DataDecoder::decode`](crate::DataDecoder::decode).
///
/// A closed set: callers holding an untyped string pick the variant with
/// [`classify_source`](crate::classify_source).
#[derive(Debug)]
pub enum Source {
    /// Text whose bytes are taken as-is and sniffed.
    Text(String),
    /// A string that must parse as a data URI.
    DataUri(String),
    /// A raw buffer.
    Bytes(Bytes),
    /// A readable handle; its name is used when the caller suggests none.
    File(Box<dyn FileHandle>),
}

impl Source {
    pub fn file(handle: impl FileHandle + 'static) -> Self {
        Source::File(Box::new(handle))
    }

    /// Variant label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Source::Text(_) => "text",
            Source::DataUri(_) => "data_uri",
            Source::Bytes(_) => "bytes",
            Source::File(_) => "file",
        }
    }
}

impl From<Vec<u8>> for Source {
    fn from(value: Vec<u8>) -> Self {
        Source::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for Source {
    fn from(value: Bytes) -> Self {
        Source::Bytes(value)
    }
}

/// A file on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileHandle for LocalFile {
    fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    fn check(&self) -> Result<(), String> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(format!("The file \"{}\" does not exist.", self.path.display()))
        }
    }

    fn size_hint(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|meta| meta.len())
    }

    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(BufReader::new(fs::File::open(&self.path)?)))
    }
}

/// Outcome reported by the layer that received a multipart upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Ok,
    /// Larger than the server-wide upload limit.
    ExceedsServerLimit { limit_kib: u64 },
    /// Larger than the limit the submitting form declared.
    ExceedsFormLimit,
    /// The body ended before the file part was complete.
    Partial,
    /// The field was present but carried no file.
    NoFile,
    /// No temporary directory to spool the upload into.
    NoTmpDir,
    /// Spooling the upload to disk failed.
    CantWrite,
    /// A server extension aborted the upload.
    Stopped,
    Unknown,
}

impl UploadStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, UploadStatus::Ok)
    }

    /// User-facing message for a failed upload of `name`; `None` for `Ok`.
    ///
    /// ```rust
    /// use decoder::UploadStatus;
    ///
    /// assert_eq!(
    ///     UploadStatus::Partial.message("photo.jpeg").as_deref(),
    ///     Some("The file \"photo.jpeg\" was only partially uploaded.")
    /// );
    /// assert_eq!(UploadStatus::Ok.message("photo.jpeg"), None);
    /// ```
    pub fn message(&self, name: &str) -> Option<String> {
        let message = match self {
            UploadStatus::Ok => return None,
            UploadStatus::ExceedsServerLimit { limit_kib } => format!(
                "The file \"{name}\" exceeds the server upload limit (limit is {limit_kib} KiB)."
            ),
            UploadStatus::ExceedsFormLimit => {
                format!("The file \"{name}\" exceeds the upload limit defined in your form.")
            }
            UploadStatus::Partial => format!("The file \"{name}\" was only partially uploaded."),
            UploadStatus::NoFile => "No file was uploaded.".to_string(),
            UploadStatus::NoTmpDir => {
                "File could not be uploaded: missing temporary directory.".to_string()
            }
            UploadStatus::CantWrite => {
                format!("The file \"{name}\" could not be written on disk.")
            }
            UploadStatus::Stopped => "File upload was stopped by an extension.".to_string(),
            UploadStatus::Unknown => {
                format!("The file \"{name}\" was not uploaded due to an unknown error.")
            }
        };
        Some(message)
    }
}

/// A file received through an upload form: spooled to `path`, named by the
/// client, and carrying the receiving layer's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    path: PathBuf,
    client_name: String,
    status: UploadStatus,
}

impl UploadedFile {
    pub fn new(path: impl Into<PathBuf>, client_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            client_name: client_name.into(),
            status: UploadStatus::Ok,
        }
    }

    pub fn with_status(mut self, status: UploadStatus) -> Self {
        self.status = status;
        self
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileHandle for UploadedFile {
    fn name(&self) -> Option<&str> {
        Some(&self.client_name)
    }

    fn check(&self) -> Result<(), String> {
        match self.status.message(&self.client_name) {
            Some(message) => Err(message),
            None => Ok(()),
        }
    }

    fn size_hint(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|meta| meta.len())
    }

    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(BufReader::new(fs::File::open(&self.path)?)))
    }
}

/// Decoded content with its inferred type and a safe name.
///
/// Immutable once built. Cloning is cheap: the bytes are reference counted.
/// Serializes as a summary without the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    #[serde(skip)]
    bytes: Bytes,
    name: String,
    mime_type: MimeType,
    size: usize,
    hash: String,
}

impl FileRecord {
    pub(crate) fn new(bytes: Bytes, mime_type: MimeType, name: String) -> Self {
        let hash = content_digest(&bytes);
        Self {
            size: bytes.len(),
            bytes,
            name,
            mime_type,
            hash,
        }
    }

    /// The full content.
    pub fn read(&self) -> &[u8] {
        &self.bytes
    }

    /// The content as a shared buffer.
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// The content as text, when it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    /// Extension of the record's name, or the type's preferred extension when
    /// the name has none.
    pub fn extension(&self) -> &str {
        crate::sniff::extension_of(&self.name).unwrap_or_else(|| self.mime_type.extension())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// SHA-256 of the content, lowercase hex.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Re-encodes the record as `data:<type>;base64,<payload>`.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}
