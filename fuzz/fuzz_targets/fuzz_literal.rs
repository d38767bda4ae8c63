#![no_main]
use libfuzzer_sys::fuzz_target;
use pbit_vcs::{LiteralBytesCodec, Transcode};

fuzz_target!(|data: &[u8]| {
    let codec = LiteralBytesCodec::new();
    let readable = codec.to_readable(data).unwrap();
    assert_eq!(codec.to_raw(&readable).unwrap(), data);

    let _ = codec.to_raw(data);
});
