use std::{ffi,io};
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("invalid variable name: {0}")]
	InvalidVariableName(String),
	#[error("undefined variable: {0}")]
	UndefinedVariable(String),
	#[error("configuration error: {0}")]
	Config(String),
	#[error("syntax error: {0}")]
	Syntax(String),
	#[error("could not spawn process: {0}")]
	Spawn(nix::Error),
	#[error("cannot open {}: {source}", path.display())]
	Redirect { path: PathBuf, source: io::Error },
	#[error("cannot open script {}: {source}", path.display())]
	Script { path: PathBuf, source: io::Error },
	#[error("line {line}: exited with status {status}")]
	LineFailed { line: usize, status: i32 },
	#[error("IO error: {0}")]
	Io(#[from] io::Error),
	#[error("Nix error: {0}")]
	Nix(#[from] nix::Error),
	#[error("Nul char error: {0}")]
	NulByte(#[from] ffi::NulError),
}

pub type Result<T> = std::result::Result<T, Error>;
