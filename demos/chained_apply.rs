use vcdelta::{DeltaCodec, ErrorKind, is_delta};

fn message(seq: u32) -> Vec<u8> {
    format!(
        "{{\"seq\":{seq},\"symbol\":\"ABC\",\"bid\":{},\"ask\":{},\"depth\":[5,4,3,2,1]}}",
        100 + seq,
        101 + seq
    )
    .into_bytes()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let versions: Vec<Vec<u8>> = (0..4).map(message).collect();
    let deltas: Vec<Vec<u8>> = versions
        .windows(2)
        .map(|w| xdelta3::encode(&w[1], &w[0]).ok_or("xdelta3 encode failed"))
        .collect::<Result<_, _>>()?;

    let codec = DeltaCodec::new();
    codec.set_base(versions[0].clone(), "msg:0");

    for (i, delta) in deltas.iter().enumerate() {
        assert!(is_delta(delta));
        let id = format!("msg:{}", i + 1);
        let base_id = format!("msg:{i}");
        let payload = codec.apply(delta, &id, &base_id)?;
        assert_eq!(payload, versions[i + 1]);
        println!("{id}: {} byte delta -> {} byte payload", delta.len(), payload.len());
    }

    // Replaying a delta after the chain moved on is a bookkeeping error.
    let err = codec.apply(&deltas[0], "msg:1", "msg:0").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BaseIdMismatch);
    assert!(err.is_identifier_error());
    println!("stale delta: {err}");

    // Resync: take a full payload and continue from there.
    codec.set_base(versions[0].clone(), "msg:0");
    let payload = codec.apply(&deltas[0], "msg:1", "msg:0")?;
    assert_eq!(payload, versions[1]);
    println!("resynced at {:?}", codec.base_id());

    Ok(())
}
