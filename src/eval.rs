use std::ffi::{self,CString};
use std::fs;
use std::os::fd::{AsRawFd,IntoRawFd,OwnedFd,RawFd};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;

use nix::errno::Errno;
use nix::fcntl::{self,FcntlArg,FdFlag,OFlag};
use nix::unistd;
use tracing::{debug,trace};

use crate::error::{Error, Result};
use crate::job::JobBuilder;
use crate::types::*;

const EXIT_NOT_FOUND: ExitCode = 127;
const EXIT_CANNOT_EXEC: ExitCode = 126;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum EvalResult {
	/// There was nothing to run.
	Nothing,
	Done(ExitCode),
}

enum Target {
	/// A builtin past the first stage; it has no effect in a child.
	Builtin,
	Path(CString),
	NotFound,
}

/// Everything a child needs, prepared before forking so that the child
/// does not allocate.
struct Stage {
	target: Target,
	argv: Vec<CString>,
	not_found: Vec<u8>,
}

impl Stage {
	fn new(command: &Command) -> Result<Stage> {
		let target = match command.exec {
			Executable::Builtin(_) => Target::Builtin,
			Executable::Path(ref path) => Target::Path(CString::new(path.as_os_str().as_bytes())?),
			Executable::NotFound => Target::NotFound,
		};
		let argv: std::result::Result<Vec<CString>, ffi::NulError> = command.arguments.iter().map(|s| CString::new(s.as_str())).collect();
		let name = command.name().unwrap_or_default();
		Ok(Stage {
			target: target,
			argv: argv?,
			not_found: format!("command not found: {}\n", name).into_bytes(),
		})
	}

	fn name(&self) -> &[u8] {
		self.argv.first().map_or(&b""[..], |s| s.as_bytes())
	}
}

fn open_redirect(redirect: &Redirect) -> Result<OwnedFd> {
	let mut oopt = fs::OpenOptions::new();
	let _ = match redirect.typ {
		RedirectType::Input => oopt.read(true),
		RedirectType::Output => oopt.write(true).create(true).truncate(true),
		RedirectType::Append => oopt.append(true).create(true),
	};
	let file = oopt.mode(0o644).open(&redirect.target)
		.map_err(|e| Error::Redirect { path: redirect.target.clone(), source: e })?;
	Ok(file.into())
}

fn write_stderr(parts: &[&[u8]]) {
	for part in parts {
		unsafe {
			libc::write(libc::STDERR_FILENO, part.as_ptr() as *const libc::c_void, part.len());
		}
	}
}

fn move_fd(fd: Option<OwnedFd>, to: RawFd) -> nix::Result<()> {
	let fd = match fd {
		Some(fd) => fd,
		None => { return Ok(()); },
	};
	if fd.as_raw_fd() == to {
		// already in place, only has to survive exec
		let raw = fd.into_raw_fd();
		fcntl::fcntl(raw, FcntlArg::F_SETFD(FdFlag::empty()))?;
	} else {
		unistd::dup2(fd.as_raw_fd(), to)?;
	}
	Ok(())
}

fn do_exec_command(stage: &Stage, stdin: Option<OwnedFd>, stdout: Option<OwnedFd>) -> nix::Result<ExitCode> {
	move_fd(stdin, libc::STDIN_FILENO)?;
	move_fd(stdout, libc::STDOUT_FILENO)?;
	match stage.target {
		Target::Builtin => Ok(0),
		Target::NotFound => {
			write_stderr(&[&stage.not_found[..]]);
			Ok(EXIT_NOT_FOUND)
		},
		Target::Path(ref path) => match unistd::execv(path, &stage.argv) {
			Ok(never) => match never {},
			Err(e) => Err(e),
		},
	}
}

fn exec_command(stage: &Stage, stdin: Option<OwnedFd>, stdout: Option<OwnedFd>) -> ! {
	let code = do_exec_command(stage, stdin, stdout).unwrap_or_else(|e| {
		write_stderr(&[stage.name(), &b": "[..], e.desc().as_bytes(), &b"\n"[..]]);
		if e == Errno::ENOENT { EXIT_NOT_FOUND } else { EXIT_CANNOT_EXEC }
	});
	unsafe { libc::_exit(code) }
}

fn spawn_commands(commands: &[Command], job_builder: &mut JobBuilder) -> Result<()> {
	let last = commands.len() - 1;
	let mut pipe_stdin: Option<OwnedFd> = None;
	for (i, command) in commands.iter().enumerate() {
		let stage = Stage::new(command)?;
		// a pipe from the previous stage overrides any input file
		let stdin = match pipe_stdin.take() {
			Some(fd) => Some(fd),
			None => command.stdin.as_ref().map(open_redirect).transpose()?,
		};
		let stdout = if i < last {
			let (pipe_read, pipe_write) = unistd::pipe2(OFlag::O_CLOEXEC)?;
			pipe_stdin = Some(pipe_read);
			Some(pipe_write)
		} else {
			command.stdout.as_ref().map(open_redirect).transpose()?
		};
		match job_builder.push_fork().map_err(Error::Spawn)? {
			unistd::ForkResult::Parent{ child } => {
				debug!(pid = child.as_raw(), command = command.name().unwrap_or_default(), stage = i, "spawned");
				drop(stdin);
				drop(stdout);
			},
			unistd::ForkResult::Child => exec_command(&stage, stdin, stdout),
		}
	}
	Ok(())
}

fn validate(commands: &[Command]) -> Result<()> {
	let last = commands.len() - 1;
	match commands[..last].iter().find(|c| c.stdout.is_some()) {
		Some(c) => Err(Error::Syntax(format!("{}: output redirected to both a file and a pipe", c.name().unwrap_or_default()))),
		None => Ok(()),
	}
}

/// Runs a parsed pipeline to completion.
///
/// A builtin in the first stage runs in this process and the rest of the
/// line is ignored. Otherwise every stage is forked left to right, connected
/// by pipes, and waited for; the result is the status of the last stage.
/// Stages already running when a later stage fails to start are still
/// waited for before the error is returned.
pub fn execute(pipeline: Pipeline) -> Result<EvalResult> {
	let commands = pipeline.commands;
	let first = match commands.first() {
		Some(first) => first,
		None => { return Ok(EvalResult::Nothing); },
	};
	if let Executable::Builtin(builtin) = first.exec {
		trace!(builtin = builtin.name(), "running builtin");
		return Ok(EvalResult::Done(builtin.run(&first.arguments)));
	}
	validate(&commands)?;

	let mut job_builder = JobBuilder::new(commands.len());
	let spawned = spawn_commands(&commands, &mut job_builder);
	let mut job = job_builder.build();
	let waited = job.wait();
	spawned?;
	waited?;
	Ok(job.code().map_or(EvalResult::Nothing, EvalResult::Done))
}
