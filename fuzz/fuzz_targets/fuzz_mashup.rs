#![no_main]
use libfuzzer_sys::fuzz_target;
use pbit_vcs::MashupContainer;

fuzz_target!(|data: &[u8]| {
    let Ok(container) = MashupContainer::parse(data) else {
        return;
    };

    // A parsed layout always writes back to the same bytes
    assert_eq!(container.to_vec().unwrap(), data);
});
