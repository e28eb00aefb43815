use datauri::{
    decode_all, decode_input, DataDecoder, DecodeError, DenormalizeError, Input, Source,
    UploadStatus, UploadedFile,
};

fn decode_uri(uri: &str) -> Result<datauri::FileRecord, DecodeError> {
    DataDecoder::default().decode(Source::DataUri(uri.to_string()), None)
}

#[test]
fn not_a_data_uri() {
    for input in ["", "hello", "date:,x", "http://example.com"] {
        assert_eq!(decode_uri(input), Err(DecodeError::NotADataUri), "{input:?}");
    }
}

#[test]
fn malformed_headers() {
    for input in ["data:", "data:text/plain", "data:image;base64,AAAA", "data:text/pl ain,x"] {
        let err = decode_uri(input).expect_err(input);
        assert_eq!(err.kind(), "malformed_header", "{input:?}: {err}");
        assert!(err.is_client_error());
    }
}

#[test]
fn invalid_encodings() {
    let cases = [
        "data:text/plain;base64,SGVsbG8",
        "data:text/plain;base64,SGVs*bG8=",
        "data:text/plain;base64,SGVsbG8sIHdvcmxkIQ===",
        "data:text/plain,100%",
        "data:text/plain,%zz",
        "data:text/plain;charset=iso-8859-1,\u{20ac}",
    ];
    for input in cases {
        let err = decode_uri(input).expect_err(input);
        assert!(
            matches!(err, DecodeError::InvalidEncoding(_)),
            "{input:?}: {err:?}"
        );
    }
}

#[test]
fn upload_failures_surface_their_messages() {
    let decoder = DataDecoder::default();
    let cases = [
        (
            UploadStatus::Partial,
            "The file \"photo.jpeg\" was only partially uploaded.",
        ),
        (
            UploadStatus::ExceedsServerLimit { limit_kib: 2048 },
            "The file \"photo.jpeg\" exceeds the server upload limit (limit is 2048 KiB).",
        ),
        (UploadStatus::NoFile, "No file was uploaded."),
        (
            UploadStatus::CantWrite,
            "The file \"photo.jpeg\" could not be written on disk.",
        ),
    ];

    for (status, message) in cases {
        let upload = UploadedFile::new("/does/not/matter", "photo.jpeg").with_status(status);
        let err = decoder
            .decode(Source::file(upload), None)
            .expect_err("invalid upload");
        assert_eq!(err, DecodeError::UnreadableSource(message.to_string()));
        assert_eq!(err.to_string(), message);
        assert!(!err.is_client_error());
    }
}

#[test]
fn remote_urls_are_refused() {
    let err = decode_input(
        &DataDecoder::default(),
        Input::from("https://example.com/image.png"),
        None,
    )
    .expect_err("remote url");
    assert!(matches!(err, DenormalizeError::RemoteSource(_)));
    assert!(err.decode_error().is_none());
    assert!(err.to_string().contains("https://example.com/image.png"));
}

#[test]
fn batch_failure_carries_index_and_cause() {
    let inputs = vec![
        Input::from("ok"),
        Input::file(UploadedFile::new("/tmp/x", "cv.pdf").with_status(UploadStatus::Partial)),
    ];
    let err = decode_all(&DataDecoder::default(), inputs).expect_err("second input fails");

    assert_eq!(
        err.to_string(),
        "input #1: The file \"cv.pdf\" was only partially uploaded."
    );
    assert!(std::error::Error::source(&err).is_some());
}
