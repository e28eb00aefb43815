use decoder::{DataDecoder, Source, UploadStatus, UploadedFile};

fn main() {
    let decoder = DataDecoder::default();

    let inputs = [
        ("base64 text", Source::DataUri("data:text/plain;base64,SGVsbG8sIHdvcmxkIQ==".into())),
        ("percent text", Source::DataUri("data:,Hello%2C%20world%21".into())),
        ("untyped png", Source::DataUri("data:;base64,iVBORw0KGgo=".into())),
        ("raw bytes", Source::from(b"%PDF-1.7\n".to_vec())),
        (
            "partial upload",
            Source::file(
                UploadedFile::new("/tmp/upload-0001", "photo.jpeg")
                    .with_status(UploadStatus::Partial),
            ),
        ),
    ];

    for (label, source) in inputs {
        match decoder.decode(source, None) {
            Ok(record) => println!(
                "{label}: {} ({}, {} bytes, sha256 {})",
                record.name(),
                record.mime_type(),
                record.size(),
                record.hash()
            ),
            Err(err) => eprintln!("{label}: decode failed ({}): {err}", err.kind()),
        }
    }

    match decoder.decode_text("Plain text is always accepted.", Some("note.txt")) {
        Ok(record) => println!("text: {} ({})", record.name(), record.mime_type()),
        Err(err) => eprintln!("text: decode failed: {err}"),
    }
}
