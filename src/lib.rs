//! Caller-facing layer over the [`decoder`] engine.
//!
//! The engine takes a typed [`Source`]. Callers at the edge usually hold
//! something looser: a form field that may be a data URI, a link or plain
//! text, an uploaded file, or a list of those. This crate maps such
//! [`Input`]s onto the engine:
//!
//! - `data:` strings are decoded as URIs,
//! - `http`/`https` URLs are refused with [`DenormalizeError::RemoteSource`]
//!   (nothing is fetched),
//! - any other string is decoded as text,
//! - file handles are read through the engine's bounded reader.
//!
//! [`decode_all`] is a plain map over [`decode_input`] that stops at the first
//! failure.
//!
//! ```
//! use datauri::{decode_all, DataDecoder, Input};
//!
//! let decoder = DataDecoder::default();
//! let records = decode_all(
//!     &decoder,
//!     vec![Input::from("data:,Hello%2C%20world%21"), Input::from("Hello, world!")],
//! )
//! .unwrap();
//!
//! assert_eq!(records[0].read(), records[1].read());
//! ```

pub mod config;

pub use config::{ConfigLoadError, DataUriConfig, LogFormat, LoggingConfig};
pub use decoder::{
    classify_source, content_digest, ConfigError, ContentSniffer, DataDecoder, DecodeError,
    DecoderConfig, FileHandle, FileRecord, LocalFile, MimeType, NameDeriver, Source,
    SourceClass, UploadStatus, UploadedFile,
};

use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use thiserror::Error;

/// A loosely typed input as received from a form, a JSON body or the command
/// line.
#[derive(Debug)]
pub enum Input {
    Text(String),
    File(Box<dyn FileHandle>),
}

impl Input {
    pub fn file(handle: impl FileHandle + 'static) -> Self {
        Input::File(Box::new(handle))
    }

    /// Label used for metrics: the classified kind of a text input, or `file`.
    pub fn kind(&self) -> &'static str {
        match self {
            Input::Text(text) => match classify_source(text) {
                SourceClass::DataUri => "data_uri",
                SourceClass::HttpUrl => "http_url",
                SourceClass::Text => "text",
            },
            Input::File(_) => "file",
        }
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Input::Text(value)
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Input::Text(value.to_string())
    }
}

/// Errors that can occur while mapping inputs onto the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DenormalizeError {
    /// The engine rejected the input. Displays the engine's message as-is.
    #[error("{0}")]
    Decode(#[from] DecodeError),
    /// The input is a remote URL; remote content is never fetched.
    #[error("remote sources are not fetched: {0}")]
    RemoteSource(String),
    /// One element of a batch failed; no records are returned for the batch.
    #[error("input #{index}: {error}")]
    Batch {
        index: usize,
        #[source]
        error: Box<DenormalizeError>,
    },
}

impl DenormalizeError {
    /// The innermost engine error, if any.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            DenormalizeError::Decode(err) => Some(err),
            DenormalizeError::RemoteSource(_) => None,
            DenormalizeError::Batch { error, .. } => error.decode_error(),
        }
    }
}

/// Metrics observer for decoded inputs.
pub trait DecodeMetrics: Send + Sync {
    fn record_decode(
        &self,
        kind: &'static str,
        latency: Duration,
        result: Result<(), DenormalizeError>,
    );
}

/// Install or clear the global decode metrics recorder.
pub fn set_decode_metrics(recorder: Option<Arc<dyn DecodeMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn DecodeMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn DecodeMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn DecodeMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn DecodeMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record(self, kind: &'static str, result: &Result<FileRecord, DenormalizeError>) {
        let outcome = match result {
            Ok(_) => Ok(()),
            Err(err) => Err(err.clone()),
        };
        self.recorder
            .record_decode(kind, self.start.elapsed(), outcome);
    }
}

/// Decodes one input, choosing the engine entry point by classification.
pub fn decode_input(
    decoder: &DataDecoder,
    input: Input,
    suggested_name: Option<&str>,
) -> Result<FileRecord, DenormalizeError> {
    let metrics = MetricsSpan::start();
    let kind = input.kind();

    let result = match input {
        Input::File(handle) => decoder
            .decode(Source::File(handle), suggested_name)
            .map_err(DenormalizeError::from),
        Input::Text(text) => match classify_source(&text) {
            SourceClass::DataUri => decoder
                .decode(Source::DataUri(text), suggested_name)
                .map_err(DenormalizeError::from),
            SourceClass::HttpUrl => Err(DenormalizeError::RemoteSource(text)),
            SourceClass::Text => decoder
                .decode_text(&text, suggested_name)
                .map_err(DenormalizeError::from),
        },
    };

    if let Some(span) = metrics {
        span.record(kind, &result);
    }
    result
}

/// Decodes every input in order. The first failure aborts the batch and is
/// reported with its position. An empty batch is not an error and yields an
/// empty `Vec`.
pub fn decode_all(
    decoder: &DataDecoder,
    inputs: impl IntoIterator<Item = Input>,
) -> Result<Vec<FileRecord>, DenormalizeError> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            decode_input(decoder, input, None).map_err(|error| DenormalizeError::Batch {
                index,
                error: Box::new(error),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingMetrics {
        events: Mutex<Vec<(&'static str, bool)>>,
    }

    impl DecodeMetrics for RecordingMetrics {
        fn record_decode(
            &self,
            kind: &'static str,
            _latency: Duration,
            result: Result<(), DenormalizeError>,
        ) {
            self.events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push((kind, result.is_ok()));
        }
    }

    #[test]
    fn test_decode_input_dispatch() {
        let decoder = DataDecoder::default();

        let record = decode_input(
            &decoder,
            Input::from("data:text/plain;base64,SGVsbG8sIHdvcmxkIQ=="),
            None,
        )
        .expect("data uri");
        assert_eq!(record.read(), b"Hello, world!");

        let record = decode_input(&decoder, Input::from("Hello, world!"), None).expect("text");
        assert!(record.mime_type().is_txt());

        let err = decode_input(&decoder, Input::from("https://example.com/cat.png"), None)
            .expect_err("remote");
        assert_eq!(
            err,
            DenormalizeError::RemoteSource("https://example.com/cat.png".into())
        );
    }

    #[test]
    fn test_empty_string_is_empty_text() {
        let record =
            decode_input(&DataDecoder::default(), Input::from(""), None).expect("empty text");
        assert!(record.is_empty());
        assert!(record.mime_type().is_txt());
    }

    #[test]
    fn test_padded_data_uri_is_decoded_not_sniffed() {
        let record = decode_input(
            &DataDecoder::default(),
            Input::from("  data:text/plain;base64,SGVsbG8sIHdvcmxkIQ==\n"),
            None,
        )
        .expect("padded data uri");
        assert_eq!(record.read(), b"Hello, world!");
    }

    #[test]
    fn test_decode_all_reports_failing_index() {
        let decoder = DataDecoder::default();
        let inputs = vec![
            Input::from("first"),
            Input::from("data:,fine"),
            Input::from("data:text/plain;base64,!!!"),
            Input::from("never reached"),
        ];

        match decode_all(&decoder, inputs) {
            Err(DenormalizeError::Batch { index, error }) => {
                assert_eq!(index, 2);
                assert!(matches!(
                    error.decode_error(),
                    Some(DecodeError::InvalidEncoding(_))
                ));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_decode_all_empty_batch() {
        let records = decode_all(&DataDecoder::default(), Vec::new()).expect("empty batch");
        assert!(records.is_empty());
    }

    #[test]
    fn test_decode_error_message_passes_through() {
        let upload =
            UploadedFile::new("/tmp/none", "photo.jpeg").with_status(UploadStatus::Partial);
        let err = decode_input(&DataDecoder::default(), Input::file(upload), None)
            .expect_err("partial upload");
        assert_eq!(
            err.to_string(),
            "The file \"photo.jpeg\" was only partially uploaded."
        );
    }

    #[test]
    fn test_metrics_recorder_sees_each_input() {
        let metrics = Arc::new(RecordingMetrics::default());
        set_decode_metrics(Some(metrics.clone() as Arc<dyn DecodeMetrics>));

        let decoder = DataDecoder::default();
        let _ = decode_input(&decoder, Input::from("metrics-sample-text"), None);
        let _ = decode_input(&decoder, Input::from("http://example.com/metrics-sample"), None);
        set_decode_metrics(None);

        let events = metrics
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        assert!(events.contains(&("text", true)));
        assert!(events.contains(&("http_url", false)));
    }
}
