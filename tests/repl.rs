use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

const ISH: &str = env!("CARGO_BIN_EXE_ish");

#[test]
fn single_line() {
	let out = Command::new(ISH).args(["-c", "echo hi | cat"]).output().unwrap();
	assert!(out.status.success());
	assert_eq!(out.stdout, b"hi\n");

	let out = Command::new(ISH).args(["-c", "true | false"]).output().unwrap();
	assert_eq!(out.status.code(), Some(1));
}

#[test]
fn prompt_loop() {
	let mut child = Command::new(ISH)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.unwrap();
	child.stdin.take().unwrap().write_all(b"X=hi\necho $X\necho $Y\n").unwrap();
	let out = child.wait_with_output().unwrap();
	assert_eq!(String::from_utf8(out.stdout).unwrap(), "ish> ish> hi\nish> ish> ");
	assert!(String::from_utf8(out.stderr).unwrap().contains("undefined variable: Y"));
	assert_eq!(out.status.code(), Some(1));
}

#[test]
fn script_file() {
	let dir = TempDir::new().unwrap();
	let out_path = dir.path().join("out");
	let ok = dir.path().join("ok.ish");
	fs::write(&ok, format!("# greet\nWHO=script\n\necho from $WHO > {} # trailing\n", out_path.display())).unwrap();
	let out = Command::new(ISH).arg(&ok).output().unwrap();
	assert!(out.status.success());
	assert_eq!(fs::read_to_string(&out_path).unwrap(), "from script\n");

	let bad = dir.path().join("bad.ish");
	fs::write(&bad, format!("true\nfalse\necho never > {}\n", out_path.display())).unwrap();
	let out = Command::new(ISH).arg(&bad).output().unwrap();
	assert!(!out.status.success());
	assert!(String::from_utf8(out.stderr).unwrap().contains("line 2"));
	assert_eq!(fs::read_to_string(&out_path).unwrap(), "from script\n");
}
