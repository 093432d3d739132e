use std::env;

use crate::error::{Error, Result};

pub const PATH_VAR: &str = "PATH";

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Variable {
	pub name: String,
	pub value: String,
}

/// Insertion-ordered name/value store consulted while parsing a line.
///
/// Names are unique and compared case-sensitively. Entries are only ever
/// appended or updated in place, never removed, for the life of a session.
#[derive(Debug, Default, Clone)]
pub struct VariableStore {
	vars: Vec<Variable>,
}

fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

impl VariableStore {
	pub fn new() -> VariableStore {
		VariableStore { vars: vec![] }
	}

	/// A store seeded with the `PATH` of the current process.
	pub fn from_env() -> VariableStore {
		let mut this = VariableStore::new();
		let path = env::var(PATH_VAR).unwrap_or_default();
		this.set(PATH_VAR, &path);
		this
	}

	/// Applies a `NAME=value` assignment.
	///
	/// The token is split on its first `=`. The name must be non-empty and
	/// made only of ASCII letters and underscores; otherwise the store is left
	/// untouched.
	pub fn assign(&mut self, token: &str) -> Result<()> {
		let (name, value) = match token.find('=') {
			Some(i) => (&token[..i], &token[i + 1 ..]),
			None => (token, ""),
		};
		if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
			return Err(Error::InvalidVariableName(name.to_string()));
		}
		self.set(name, value);
		Ok(())
	}

	fn set(&mut self, name: &str, value: &str) {
		match self.vars.iter_mut().find(|v| v.name == name) {
			Some(var) => var.value = value.to_string(),
			None => self.vars.push(Variable { name: name.to_string(), value: value.to_string() }),
		}
	}

	pub fn get(&self, name: &str) -> Option<&Variable> {
		self.vars.iter().find(|v| v.name == name)
	}

	pub fn lookup(&self, name: &str) -> Option<&str> {
		self.get(name).map(|v| v.value.as_str())
	}

	pub fn iter(&self) -> std::slice::Iter<Variable> {
		self.vars.iter()
	}

	pub fn len(&self) -> usize {
		self.vars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.vars.is_empty()
	}

	/// Replaces every `$NAME` and `${NAME}` in `line` with its value.
	///
	/// Substitution is a single left-to-right pass: substituted values are
	/// never scanned again. An unterminated `${` takes the rest of the line as
	/// the name. A `$` followed by neither `{` nor a name character refers to
	/// the empty name, which is never defined.
	pub fn expand(&self, line: &str) -> Result<String> {
		let mut out = String::with_capacity(line.len());
		let mut rest = line;
		while let Some(i) = rest.find('$') {
			out.push_str(&rest[..i]);
			let after = &rest[i + 1 ..];
			let (name, consumed) = if after.starts_with('{') {
				let body = &after[1..];
				match body.find('}') {
					Some(end) => (&body[..end], end + 2),
					None => (body, after.len()),
				}
			} else {
				let end = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());
				(&after[..end], end)
			};
			match self.lookup(name) {
				Some(value) => out.push_str(value),
				None => { return Err(Error::UndefinedVariable(name.to_string())); },
			}
			rest = &after[consumed..];
		}
		out.push_str(rest);
		Ok(out)
	}
}
