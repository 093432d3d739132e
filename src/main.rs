use std::io;
use std::io::{BufRead, Write};
use std::process::ExitCode;

use anyhow::Context;
use argh::FromArgs;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ish::{script, EvalResult, State};

const PROMPT: &[u8] = b"ish> ";

#[derive(FromArgs)]
/// A small line-oriented command interpreter.
struct Args {
	/// run a single line and exit with its status
	#[argh(option, short = 'c')]
	command: Option<String>,

	/// log at debug level unless RUST_LOG says otherwise
	#[argh(switch)]
	trace: bool,

	/// script to run line by line; reads interactively from stdin when omitted
	#[argh(positional)]
	script: Option<String>,
}

fn init_logging(trace: bool) {
	let default = if trace { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
	tracing_subscriber::registry()
		.with(fmt::layer().with_writer(io::stderr))
		.with(filter)
		.init();
}

fn status_code(status: i32) -> ExitCode {
	ExitCode::from(status.clamp(0, 255) as u8)
}

fn interactive(state: &mut State) -> anyhow::Result<ExitCode> {
	let mut stdout = io::stdout();
	let stdin = io::stdin();
	let mut stdin_locked = stdin.lock();
	let mut last = 0;
	loop {
		stdout.write_all(PROMPT)?;
		stdout.flush()?;
		let mut line: Vec<u8> = vec![];
		if stdin_locked.read_until(b'\n', &mut line).context("reading stdin")? == 0 {
			break;
		}
		match state.eval_line(&String::from_utf8_lossy(&line)) {
			Ok(EvalResult::Done(status)) => last = status,
			Ok(EvalResult::Nothing) => {},
			Err(e) => {
				error!(error = %e, "line failed");
				eprintln!("ish: {}", e);
				last = 1;
			},
		}
	}
	Ok(status_code(last))
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
	let mut state = State::new();
	if let Some(line) = args.command {
		return match state.eval_line(&line)? {
			EvalResult::Done(status) => Ok(status_code(status)),
			EvalResult::Nothing => Ok(ExitCode::SUCCESS),
		};
	}
	match args.script {
		Some(path) => {
			script::run_script(&path, &mut state).with_context(|| format!("running {}", path))?;
			Ok(ExitCode::SUCCESS)
		},
		None => interactive(&mut state),
	}
}

fn main() -> ExitCode {
	let args: Args = argh::from_env();
	init_logging(args.trace);
	match run(args) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("ish: {:#}", e);
			ExitCode::FAILURE
		},
	}
}
