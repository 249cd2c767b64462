#![no_main]
use libfuzzer_sys::fuzz_target;
use vcdelta::vcdiff::decoder;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must only ever produce errors, never panics.
    let _ = decoder::decode_memory(data, &[]);

    if data.len() >= 2 {
        let split = data.len() / 2;
        let (base, delta) = data.split_at(split);
        let _ = decoder::decode_memory(delta, base);
        let _ = vcdelta::decode(delta, base);
    }
});
