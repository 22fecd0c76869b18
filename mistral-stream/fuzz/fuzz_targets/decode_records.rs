#![no_main]
use libfuzzer_sys::fuzz_target;
use mistral_stream::{Decoded, RecordDecoder};

fuzz_target!(|data: &[u8]| {
    // First byte picks the chunk size so splits land everywhere, including
    // inside multi-byte characters.
    let Some((&size, body)) = data.split_first() else {
        return;
    };
    let size = usize::from(size).max(1);

    let mut decoder = RecordDecoder::new();
    let mut terminal = false;
    for chunk in body.chunks(size) {
        let events = decoder.feed(chunk);
        assert!(!terminal || events.is_empty(), "events after terminal event");
        terminal |= events
            .iter()
            .any(|e| matches!(e, Decoded::Done | Decoded::Error(_)));
    }
    let _ = decoder.finish();
});
