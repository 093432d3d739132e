use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug,error};

use crate::error::{Error, Result};
use crate::eval::EvalResult;
use crate::global::State;

fn is_blank_or_comment(line: &[u8]) -> bool {
	match line.iter().find(|c| !c.is_ascii_whitespace()) {
		None | Some(&b'#') => true,
		Some(_) => false,
	}
}

/// Runs `reader` line by line, stopping at the first line that fails to
/// parse, fails to start, or exits with a non-zero status. Lines are read as
/// bytes; invalid UTF-8 in a command line is replaced, not rejected.
pub fn run_reader<R: BufRead>(mut reader: R, state: &mut State) -> Result<()> {
	let mut buf: Vec<u8> = vec![];
	let mut lineno = 0;
	loop {
		buf.clear();
		if reader.read_until(b'\n', &mut buf)? == 0 {
			break;
		}
		lineno += 1;
		if is_blank_or_comment(&buf) {
			continue;
		}
		let line = String::from_utf8_lossy(&buf);
		match state.eval_line(&line) {
			Ok(EvalResult::Nothing) => {},
			Ok(EvalResult::Done(0)) => debug!(line = lineno, "ok"),
			Ok(EvalResult::Done(status)) => {
				error!(line = lineno, status, "script line failed");
				return Err(Error::LineFailed { line: lineno, status: status });
			},
			Err(e) => {
				error!(line = lineno, error = %e, "script line failed");
				return Err(e);
			},
		}
	}
	Ok(())
}

pub fn run_script<P: AsRef<Path>>(path: P, state: &mut State) -> Result<()> {
	let path = path.as_ref();
	let file = File::open(path).map_err(|e| Error::Script { path: path.to_path_buf(), source: e })?;
	run_reader(BufReader::new(file), state)
}
