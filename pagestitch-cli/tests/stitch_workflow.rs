//! Integration tests for the `pagestitch` binary.
//!
//! Each test points HOME at a temporary directory so config.ini and the log
//! file never touch the real user profile.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{Rgb, RgbImage};
use tempfile::TempDir;

/// Temporary HOME with a config tuned for fast discovery.
struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let home = TempDir::new().unwrap();
        let config_dir = home.path().join(".pagestitch");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("config.ini"),
            "[discovery]\n\
             settle_delay_ms = 10\n\
             poll_interval_ms = 10\n\
             stable_polls = 2\n\
             [layout]\n\
             page_width_px = 90\n\
             page_height_px = 120\n",
        )
        .unwrap();
        Self { home }
    }

    fn path(&self) -> &Path {
        self.home.path()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_pagestitch"))
            .args(args)
            .env("HOME", self.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to run pagestitch")
    }
}

fn write_tiles(dir: &Path, count: usize) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    for i in 0..count {
        let tile = RgbImage::from_pixel(30, 10, Rgb([(i * 10) as u8, 80, 160]));
        tile.save(dir.join(format!("chunk-{}.png", i + 1))).unwrap();
    }
    dir.to_path_buf()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_stitch_directory_writes_pdf() {
    let sandbox = Sandbox::new();
    let tiles = write_tiles(&sandbox.path().join("tiles"), 12);
    let out = sandbox.path().join("out");

    let output = sandbox.run(&[
        "stitch",
        "--dir",
        tiles.to_str().unwrap(),
        "--output-dir",
        out.to_str().unwrap(),
        "--title",
        "Lecture Notes",
        "--window",
        "5",
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let pdf = out.join("lecture_notes.pdf");
    assert!(pdf.exists());
    assert!(fs::read(&pdf).unwrap().starts_with(b"%PDF-"));
    assert!(stdout(&output).contains("2 written of 2 expected"));
}

#[test]
fn test_stitch_reports_skipped_page() {
    let sandbox = Sandbox::new();
    let tiles = write_tiles(&sandbox.path().join("tiles"), 7);
    let out = sandbox.path().join("out");

    let output = sandbox.run(&[
        "stitch",
        "--dir",
        tiles.to_str().unwrap(),
        "--output-dir",
        out.to_str().unwrap(),
        "--slots-per-page",
        "3",
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("2 written of 3 expected"), "stdout: {}", text);
    assert!(text.contains("page 3 (missing slots 1, 2)"), "stdout: {}", text);
}

#[test]
fn test_stitch_empty_directory_fails() {
    let sandbox = Sandbox::new();
    let tiles = write_tiles(&sandbox.path().join("tiles"), 0);

    let output = sandbox.run(&["stitch", "--dir", tiles.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error:"));
}

#[test]
fn test_stitch_requires_a_source() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["stitch"]);
    assert!(!output.status.success());
}

#[test]
fn test_config_set_get_and_reject_invalid() {
    let sandbox = Sandbox::new();

    let set = sandbox.run(&["config", "set", "layout.slots_per_page", "4"]);
    assert!(set.status.success(), "stderr: {}", stderr(&set));

    let get = sandbox.run(&["config", "get", "layout.slots_per_page"]);
    assert_eq!(stdout(&get).trim(), "4");

    // Values set earlier in the file survive the rewrite.
    let get = sandbox.run(&["config", "get", "discovery.poll_interval_ms"]);
    assert_eq!(stdout(&get).trim(), "10");

    let bad = sandbox.run(&["config", "set", "decode.jpeg_quality", "0"]);
    assert_eq!(bad.status.code(), Some(1));

    let unknown = sandbox.run(&["config", "get", "layout.colour"]);
    assert_eq!(unknown.status.code(), Some(1));
}

#[test]
fn test_config_path_and_init() {
    let sandbox = Sandbox::new();
    fs::remove_file(sandbox.path().join(".pagestitch/config.ini")).unwrap();

    let path = sandbox.run(&["config", "path"]);
    let expected = sandbox.path().join(".pagestitch").join("config.ini");
    assert_eq!(stdout(&path).trim(), expected.display().to_string());

    let init = sandbox.run(&["config", "init"]);
    assert!(init.status.success());
    assert!(stdout(&init).contains("Created"));
    assert!(expected.exists());

    let again = sandbox.run(&["config", "init"]);
    assert!(stdout(&again).contains("already exists"));
}
