use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use assert_cmd::Command;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Writes `source` to a throwaway script file and runs it through the built
/// `rocks` binary, returning its captured `(stdout, stderr)`.
pub fn run(source: &str) -> (String, String) {
    let path = script_path();
    let mut file = fs::File::create(&path).expect("create temp script");
    file.write_all(source.as_bytes()).expect("write temp script");
    drop(file);

    let output = Command::cargo_bin("rocks")
        .expect("rocks binary")
        .arg(&path)
        .output()
        .expect("run rocks binary");

    fs::remove_file(&path).ok();

    (
        String::from_utf8(output.stdout).expect("stdout is utf8"),
        String::from_utf8(output.stderr).expect("stderr is utf8"),
    )
}

pub fn assert_stdout(source: &str, expected: &str) {
    let (stdout, stderr) = run(source);
    assert_eq!(stderr, "", "expected no stderr, got: {stderr}");
    assert_eq!(stdout, expected);
}

pub fn assert_stderr(source: &str, expected: &str) {
    let (_, stderr) = run(source);
    assert_eq!(stderr, expected);
}

fn script_path() -> PathBuf {
    let id = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("rocks-test-{}-{id}.lox", std::process::id()))
}
