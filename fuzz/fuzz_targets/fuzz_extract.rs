#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(tree) = pbit_vcs::extract(data) else {
        return;
    };

    let Ok(rebuilt) = pbit_vcs::compress(&tree) else {
        return;
    };

    let again = pbit_vcs::extract(&rebuilt).unwrap();
    assert_eq!(again, tree);
});
