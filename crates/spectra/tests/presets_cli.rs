use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn spectra(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_spectra"))
        .env("SPECTRA_CONFIG_DIR", config_dir)
        .env_remove("SPECTRA_CONFIG")
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run spectra")
}

#[test]
fn presets_lists_every_builtin() {
    let root = TempDir::new().unwrap();
    let output = spectra(root.path(), &["presets"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    for name in ["plain", "twist", "pulse", "wave", "jitter"] {
        assert!(stdout.contains(name), "missing {name} in:\n{stdout}");
    }
    assert!(stdout.contains("(default)"));
}

#[test]
fn export_writes_both_stages_and_refuses_to_overwrite() {
    let root = TempDir::new().unwrap();
    let out = root.path().join("shaders");
    let out_arg = out.to_str().unwrap();

    let first = spectra(root.path(), &["export", "wave", out_arg]);
    assert!(first.status.success());
    let vertex = fs::read_to_string(out.join("vertex.glsl")).unwrap();
    let fragment = fs::read_to_string(out.join("fragment.glsl")).unwrap();
    assert!(vertex.contains("void main"));
    assert!(fragment.contains("void main"));

    fs::write(out.join("fragment.glsl"), "edited").unwrap();
    let second = spectra(root.path(), &["export", "wave", out_arg]);
    assert!(!second.status.success());
    assert_eq!(fs::read_to_string(out.join("fragment.glsl")).unwrap(), "edited");

    let forced = spectra(root.path(), &["export", "wave", out_arg, "--force"]);
    assert!(forced.status.success());
    assert_eq!(fs::read_to_string(out.join("fragment.glsl")).unwrap(), fragment);
}

#[test]
fn unknown_preset_is_rejected() {
    let root = TempDir::new().unwrap();
    let output = spectra(
        root.path(),
        &["export", "nope", root.path().join("out").to_str().unwrap()],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unknown preset 'nope'"), "{stderr}");
}

#[test]
fn config_prints_file_values_with_overrides() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("spectra.toml"),
        "[pipeline]\nquiet_period = \"250ms\"\n\n[view]\nwireframe = false\n",
    )
    .unwrap();

    let output = spectra(root.path(), &["--wireframe", "config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("# loaded from"), "{stdout}");
    assert!(stdout.contains("quiet_period = \"250ms\""), "{stdout}");
    assert!(stdout.contains("wireframe = true"), "{stdout}");
}

#[test]
fn config_without_file_prints_defaults() {
    let root = TempDir::new().unwrap();
    let output = spectra(root.path(), &["config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("# defaults"), "{stdout}");
    assert!(stdout.contains("[pipeline]"), "{stdout}");
}
