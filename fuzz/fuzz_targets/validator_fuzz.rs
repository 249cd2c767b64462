#![no_main]
use libfuzzer_sys::fuzz_target;
use vcdelta::validator;

fuzz_target!(|data: &[u8]| {
    let summary = validator::inspect(data);
    assert_eq!(summary.is_ok(), validator::is_delta(data));
    if let Ok(summary) = summary {
        assert!(summary.header_len <= data.len());
    }
});
