use datauri::{ContentSniffer, DataDecoder, NameDeriver, Source};

const SAMPLES: &[&[u8]] = &[
    b"Hello, world!",
    b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR",
    b"%PDF-1.7\n%\xe2\xe3\xcf\xd3",
    b"PK\x03\x04\x14\x00\x00\x00",
    b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>",
    b"\x00\x01\x02\x03\xff\xfe",
    b"",
];

#[test]
fn sniffing_is_independent_of_call_order() {
    let sniffer = ContentSniffer::default();
    let forward: Vec<_> = SAMPLES.iter().map(|s| sniffer.sniff(s, None, None)).collect();
    let backward: Vec<_> = SAMPLES
        .iter()
        .rev()
        .map(|s| sniffer.sniff(s, None, None))
        .collect();

    for (a, b) in forward.iter().zip(backward.iter().rev()) {
        assert_eq!(a, b);
    }
    // A fresh sniffer agrees with one that has already seen everything.
    let fresh = ContentSniffer::default();
    for (sample, expected) in SAMPLES.iter().zip(&forward) {
        assert_eq!(&fresh.sniff(sample, None, None), expected);
    }
}

#[test]
fn derived_names_are_idempotent() {
    let decoder = DataDecoder::default();
    for sample in SAMPLES {
        let a = decoder
            .decode(Source::from(sample.to_vec()), None)
            .expect("bytes decode");
        let b = decoder
            .decode(Source::from(sample.to_vec()), None)
            .expect("bytes decode");
        assert_eq!(a.name(), b.name());
        assert_eq!(a.hash(), b.hash());
        assert!(a.name().starts_with(&a.hash()[..16]));
    }

    let deriver = NameDeriver::default();
    let first = decoder.decode_text("same text", None).expect("text");
    let second = decoder.decode_text("same text", None).expect("text");
    assert_eq!(first.name(), second.name());
    assert_eq!(
        first.name(),
        deriver.derive(None, first.mime_type(), first.read())
    );
}

#[test]
fn equivalent_encodings_produce_identical_records() {
    let decoder = DataDecoder::default();
    let forms = [
        "data:text/plain;base64,SGVsbG8sIHdvcmxkIQ==",
        "data:text/plain;base64,SGVsbG8sIHdvcmxkIQ%3D%3D",
        "data:text/plain,Hello%2C%20world%21",
        "data:text/plain;charset=US-ASCII,Hello, world!",
        " data:text/plain;BASE64,SGVsbG8s IHdvcmxkIQ== ",
    ];

    let records: Vec<_> = forms
        .iter()
        .map(|uri| {
            decoder
                .decode(Source::DataUri(uri.to_string()), None)
                .unwrap_or_else(|err| panic!("{uri}: {err}"))
        })
        .collect();

    for record in &records[1..] {
        assert_eq!(record, &records[0]);
    }
    assert_eq!(records[0].read(), b"Hello, world!");
}
