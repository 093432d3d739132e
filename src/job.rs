use nix::errno::Errno;
use nix::unistd::{self, Pid};
use nix::sys::wait::{self, WaitStatus};

use crate::types::ExitCode;

pub trait WaitStatusExt {
	fn is_terminated(self) -> bool;
	fn code(self) -> ExitCode;
}

impl WaitStatusExt for WaitStatus {
	fn is_terminated(self) -> bool {
		match self {
			WaitStatus::Exited(..) | WaitStatus::Signaled(..) => true,
			_ => false,
		}
	}

	/// Exit code as a shell reports it; a signal `n` is reported as `128 + n`.
	fn code(self) -> ExitCode {
		match self {
			WaitStatus::Exited(_, code) => code,
			WaitStatus::Signaled(_, sig, _) => 128 + sig as ExitCode,
			_ => -1,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Process {
	pub pid: Pid,
	pub status: WaitStatus,
}

/// The processes of one pipeline, in pipeline order.
#[derive(Debug)]
pub struct Job {
	pub processes: Vec<Process>,
}

impl Job {
	/// Blocks until every process has terminated.
	pub fn wait(&mut self) -> nix::Result<()> {
		for pr in self.processes.iter_mut() {
			while !pr.status.is_terminated() {
				match wait::waitpid(pr.pid, None) {
					Ok(status) => pr.status = status,
					Err(Errno::EINTR) => {},
					Err(e) => { return Err(e); },
				}
			}
		}
		Ok(())
	}

	/// Status of the last stage, once it has terminated.
	pub fn code(&self) -> Option<ExitCode> {
		self.processes.last()
			.filter(|pr| pr.status.is_terminated())
			.map(|pr| pr.status.code())
	}
}

#[derive(Debug)]
pub struct JobBuilder {
	imp: Job,
}

impl JobBuilder {
	pub fn new(size_hint: usize) -> JobBuilder {
		JobBuilder {
			imp: Job { processes: Vec::with_capacity(size_hint) }
		}
	}

	pub fn push_fork(&mut self) -> nix::Result<unistd::ForkResult> {
		// SAFETY: the child only calls async-signal-safe functions (dup2, fcntl,
		// close, execv, write, _exit) before replacing or terminating itself.
		let r = unsafe { unistd::fork() }?;
		if let unistd::ForkResult::Parent{ child: pid } = r {
			self.imp.processes.push(Process { pid: pid, status: WaitStatus::StillAlive });
		}
		Ok(r)
	}

	pub fn build(self) -> Job {
		self.imp
	}
}
