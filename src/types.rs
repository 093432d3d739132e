use std::path::PathBuf;

use crate::builtin::Builtin;

/// Conventional process exit status; 0 is success.
pub type ExitCode = i32;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Input, Output, Append }

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Redirect {
	pub target: PathBuf,
	pub typ: RedirectType,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Executable {
	Builtin(Builtin),
	Path(PathBuf),
	NotFound,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Command {
	pub exec: Executable,
	/// argv, starting with the command name as typed (after substitution).
	pub arguments: Vec<String>,
	pub stdin: Option<Redirect>,
	pub stdout: Option<Redirect>,
}

impl Command {
	pub fn new() -> Command {
		Command { exec: Executable::NotFound, arguments: vec![], stdin: None, stdout: None }
	}

	pub fn name(&self) -> Option<&str> {
		self.arguments.first().map(|s| s.as_str())
	}
}

impl Default for Command {
	fn default() -> Command {
		Command::new()
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline {
	pub commands: Vec<Command>,
}
