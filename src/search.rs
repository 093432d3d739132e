use std::{fs,io};
use std::path::PathBuf;

use tracing::{debug,warn};

use crate::builtin;
use crate::error::{Error, Result};
use crate::types::Executable;
use crate::vars::{Variable, PATH_VAR};

fn dir_contains(dir: &str, name: &str) -> io::Result<bool> {
	for entry in fs::read_dir(dir)? {
		if entry?.file_name() == name {
			return Ok(true);
		}
	}
	Ok(false)
}

fn join(dir: &str, name: &str) -> PathBuf {
	let mut path = String::with_capacity(dir.len() + name.len() + 1);
	path.push_str(dir);
	if !dir.ends_with('/') {
		path.push('/');
	}
	path.push_str(name);
	PathBuf::from(path)
}

/// Turns a command name into something runnable.
///
/// `cd` short-circuits to the builtin. Names containing `/` are taken as
/// they are. Anything else is looked up by listing the directories of `path`
/// in order; the first directory holding an entry of that exact name wins.
/// Directories that cannot be listed are skipped.
pub fn resolve(name: &str, path: Option<&Variable>) -> Result<Executable> {
	if let Some(b) = builtin::match_builtin(name) {
		return Ok(Executable::Builtin(b));
	}
	let path = match path {
		Some(var) if var.name == PATH_VAR => var,
		Some(var) => { return Err(Error::Config(format!("expected {} but got {}", PATH_VAR, var.name))); },
		None => { return Err(Error::Config(format!("{} is not set", PATH_VAR))); },
	};
	if name.contains('/') {
		return Ok(Executable::Path(PathBuf::from(name)));
	}
	for dir in path.value.split(':').filter(|d| !d.is_empty()) {
		match dir_contains(dir, name) {
			Ok(true) => {
				let found = join(dir, name);
				debug!(command = name, path = %found.display(), "resolved");
				return Ok(Executable::Path(found));
			},
			Ok(false) => {},
			Err(e) => warn!(dir, error = %e, "skipping unreadable search directory"),
		}
	}
	Ok(Executable::NotFound)
}
