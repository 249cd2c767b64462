#![no_main]
use libfuzzer_sys::fuzz_target;
use vcdelta::DeltaCodec;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let split = rest.len() / 2;
    let (base, delta) = rest.split_at(split);

    let codec = DeltaCodec::new();
    codec.set_base(base.to_vec(), "v0");
    let delta_id = if selector & 1 == 0 { "v1" } else { "" };
    let base_id = if selector & 2 == 0 { "v0" } else { "other" };

    // Whatever happens, the codec holds either the old base or the decoded one.
    match codec.apply(delta, delta_id, base_id) {
        Ok(payload) => {
            assert_eq!(codec.base(), Some(payload));
            assert_eq!(codec.base_id().as_deref(), Some("v1"));
        }
        Err(_) => {
            assert_eq!(codec.base().as_deref(), Some(base));
            assert_eq!(codec.base_id().as_deref(), Some("v0"));
        }
    }
});
