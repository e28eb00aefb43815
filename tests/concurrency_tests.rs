//! Concurrency and thread safety tests for the decoder

use std::sync::Arc;
use std::thread;

use datauri::{decode_all, DataDecoder, Input, Source};

#[test]
fn shared_decoder_across_threads() {
    let decoder = Arc::new(DataDecoder::default());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let decoder = Arc::clone(&decoder);
            thread::spawn(move || {
                let text = format!("payload from thread {i}");
                decoder
                    .decode_text(&text, None)
                    .expect("decode should succeed")
            })
        })
        .collect();

    let records: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.text(), Some(format!("payload from thread {i}").as_str()));
    }
}

#[test]
fn parallel_results_match_sequential_results() {
    let decoder = DataDecoder::default();
    let uris: Vec<String> = (0..32)
        .map(|i| format!("data:,item%20{i}"))
        .collect();

    let sequential: Vec<_> = uris
        .iter()
        .map(|uri| {
            decoder
                .decode(Source::DataUri(uri.clone()), None)
                .expect("decode")
        })
        .collect();

    let parallel: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = uris
            .iter()
            .map(|uri| {
                let decoder = &decoder;
                scope.spawn(move || {
                    decoder
                        .decode(Source::DataUri(uri.clone()), None)
                        .expect("decode")
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect()
    });

    assert_eq!(sequential, parallel);
}

#[test]
fn batches_on_many_threads() {
    let decoder = Arc::new(DataDecoder::default());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let decoder = Arc::clone(&decoder);
            thread::spawn(move || {
                let inputs: Vec<Input> = (0..16)
                    .map(|i| Input::from(format!("batch {t} entry {i}")))
                    .collect();
                decode_all(&decoder, inputs).expect("batch decodes")
            })
        })
        .collect();

    for handle in handles {
        let records = handle.join().expect("thread panicked");
        assert_eq!(records.len(), 16);
        assert!(records.iter().all(|r| r.mime_type().is_txt()));
    }
}
