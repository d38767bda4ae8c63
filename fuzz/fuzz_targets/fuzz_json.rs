#![no_main]
use libfuzzer_sys::fuzz_target;
use pbit_vcs::{JsonCodec, TextEncoding, Transcode};

fuzz_target!(|data: &[u8]| {
    let codec = JsonCodec::new(TextEncoding::Utf8);
    let Ok(readable) = codec.to_readable(data) else {
        return;
    };

    // Minified output is a fixed point
    let raw = codec.to_raw(&readable).unwrap();
    let again = codec.to_readable(&raw).unwrap();
    assert_eq!(again, readable);
    assert_eq!(codec.to_raw(&again).unwrap(), raw);
});
