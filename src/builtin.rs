use std::env;
use std::path::PathBuf;

use nix::unistd::{self, User};
use tracing::debug;

use crate::types::ExitCode;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Builtin { Cd }

impl Builtin {
	pub fn name(self) -> &'static str {
		match self {
			Builtin::Cd => "cd",
		}
	}

	/// Runs the builtin in the current process. `args[0]` is the builtin name.
	pub fn run(self, args: &[String]) -> ExitCode {
		match self {
			Builtin::Cd => builtin_cd(args),
		}
	}
}

fn home_dir() -> Option<PathBuf> {
	match User::from_uid(unistd::getuid()) {
		Ok(Some(user)) => Some(user.dir),
		Ok(None) => None,
		Err(e) => {
			debug!(error = %e, "account lookup failed");
			None
		},
	}
}

pub fn builtin_cd(args: &[String]) -> ExitCode {
	let target = match args.get(1) {
		Some(dir) => PathBuf::from(dir),
		None => match home_dir() {
			Some(home) => home,
			None => {
				eprintln!("cd: cannot determine home directory");
				return 1;
			},
		},
	};
	match env::set_current_dir(&target) {
		Ok(()) => {
			debug!(dir = %target.display(), "changed directory");
			0
		},
		Err(e) => {
			eprintln!("cd: {}: {}", target.display(), e);
			1
		},
	}
}

pub fn match_builtin(name: &str) -> Option<Builtin> {
	match name {
		"cd" => Some(Builtin::Cd),
		_ => None,
	}
}
