mod common;

use std::process::Command;

use common::{document, pseudo_random, xdelta};
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_vcdelta").to_string()
}

#[test]
fn cli_decode_to_file() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("base.json");
    let delta = dir.path().join("delta.vcdiff");
    let output = dir.path().join("output.json");

    std::fs::write(&base, document(0)).unwrap();
    std::fs::write(&delta, xdelta(&document(0), &document(1))).unwrap();

    let st = Command::new(bin())
        .args(["decode", "--base"])
        .arg(&base)
        .arg(&delta)
        .arg(&output)
        .status()
        .unwrap();
    assert!(st.success());
    assert_eq!(std::fs::read(&output).unwrap(), document(1));

    // Existing output is kept unless forced.
    let st = Command::new(bin())
        .args(["decode", "--base"])
        .arg(&base)
        .arg(&delta)
        .arg(&output)
        .status()
        .unwrap();
    assert!(!st.success());

    let st = Command::new(bin())
        .args(["--force", "decode", "--stream", "--base"])
        .arg(&base)
        .arg(&delta)
        .arg(&output)
        .status()
        .unwrap();
    assert!(st.success());
    assert_eq!(std::fs::read(&output).unwrap(), document(1));
}

#[test]
fn cli_stream_decode_classifies_errors_like_memory_decode() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("base.json");
    let delta = dir.path().join("delta.vcdiff");
    let output = dir.path().join("output.json");
    std::fs::write(&base, b"").unwrap();
    std::fs::write(&delta, xdelta(&document(0), &document(1))).unwrap();

    for stream in [false, true] {
        let mut cmd = Command::new(bin());
        cmd.arg("decode");
        if stream {
            cmd.arg("--stream");
        }
        let out = cmd.arg("--base").arg(&base).arg(&delta).arg(&output).output().unwrap();
        assert!(!out.status.success());
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains("invalid_base_data"), "stream={stream}: {stderr}");
        assert!(!output.exists());
    }

    // A wrong base fails mid-stream; the partial output is removed.
    let big_base = pseudo_random(8192, 5);
    let mut big_target = big_base.clone();
    big_target.extend_from_slice(b"tail");
    std::fs::write(&delta, xdelta(&big_base, &big_target)).unwrap();
    std::fs::write(&base, b"short").unwrap();
    let out = Command::new(bin())
        .args(["decode", "--stream", "--base"])
        .arg(&base)
        .arg(&delta)
        .arg(&output)
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid_base_data"));
    assert!(!output.exists());
}

#[test]
fn cli_decode_to_stdout() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("base.json");
    let delta = dir.path().join("delta.vcdiff");
    std::fs::write(&base, document(3)).unwrap();
    std::fs::write(&delta, xdelta(&document(3), &document(4))).unwrap();

    let out = Command::new(bin())
        .args(["decode", "-c", "-b"])
        .arg(&base)
        .arg(&delta)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(out.stdout, document(4));
}

#[test]
fn cli_decode_reports_error_kind() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("base.json");
    let delta = dir.path().join("plain.json");
    std::fs::write(&base, document(0)).unwrap();
    std::fs::write(&delta, b"{\"not\":\"a delta\"}").unwrap();

    let out = Command::new(bin())
        .args(["--json", "decode", "--check-only", "--base"])
        .arg(&base)
        .arg(&delta)
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("invalid_delta_data"), "{stderr}");
}

#[test]
fn cli_apply_chain() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("v0.json");
    let d1 = dir.path().join("d1.vcdiff");
    let d2 = dir.path().join("d2.vcdiff");
    let output = dir.path().join("final.json");

    std::fs::write(&base, document(0)).unwrap();
    std::fs::write(&d1, xdelta(&document(0), &document(1))).unwrap();
    std::fs::write(&d2, xdelta(&document(1), &document(2))).unwrap();

    let out = Command::new(bin())
        .arg("--json")
        .args(["apply", "--base"])
        .arg(&base)
        .args(["--base-id", "v0", "--step", "v1", "v0"])
        .arg(&d1)
        .args(["--step", "v2", "v1"])
        .arg(&d2)
        .arg("--output")
        .arg(&output)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(std::fs::read(&output).unwrap(), document(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("\"final_id\": \"v2\""), "{stderr}");
}

#[test]
fn cli_apply_stale_base_id_fails() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("v0.json");
    let d1 = dir.path().join("d1.vcdiff");
    let d2 = dir.path().join("d2.vcdiff");

    std::fs::write(&base, document(0)).unwrap();
    std::fs::write(&d1, xdelta(&document(0), &document(1))).unwrap();
    std::fs::write(&d2, xdelta(&document(1), &document(2))).unwrap();

    let out = Command::new(bin())
        .args(["apply", "--check-only", "--base"])
        .arg(&base)
        .args(["--base-id", "v0", "--step", "v1", "v0"])
        .arg(&d1)
        .args(["--step", "v2", "v0"])
        .arg(&d2)
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("base_id_mismatch"), "{stderr}");
}

#[test]
fn cli_check_files() {
    let dir = tempdir().unwrap();
    let delta = dir.path().join("delta.vcdiff");
    let plain = dir.path().join("plain.txt");
    std::fs::write(&delta, xdelta(&document(0), &document(1))).unwrap();
    std::fs::write(&plain, b"hello").unwrap();

    let st = Command::new(bin()).arg("check").arg(&delta).status().unwrap();
    assert!(st.success());

    let out = Command::new(bin())
        .arg("check")
        .arg(&delta)
        .arg(&plain)
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("not a delta"), "{stdout}");
}

#[test]
fn cli_print_commands() {
    let dir = tempdir().unwrap();
    let delta = dir.path().join("delta.vcdiff");
    std::fs::write(&delta, xdelta(&document(0), &document(1))).unwrap();

    for cmd in ["header", "headers", "delta"] {
        let out = Command::new(bin()).arg(cmd).arg(&delta).output().unwrap();
        assert!(out.status.success(), "{cmd}");
        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.contains("VCDIFF window number:"), "{cmd}: {stdout}");
    }

    let out = Command::new(bin()).arg("delta").arg(&delta).output().unwrap();
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Offset"), "{stdout}");
}

#[test]
fn cli_config_works() {
    let out = Command::new(bin()).arg("config").output().unwrap();
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("HARD_MAX_WINSIZE="), "{stderr}");
}
