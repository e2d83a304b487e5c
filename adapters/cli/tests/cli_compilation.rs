use std::process::Command;

#[test]
fn runtag_binary_passes_cargo_check() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "runtag"])
        .status()
        .expect("failed to invoke cargo check for the runtag binary");

    assert!(status.success(), "cargo check --bin runtag should succeed");
}
