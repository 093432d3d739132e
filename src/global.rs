use tracing::debug;

use crate::error::Result;
use crate::eval::{self, EvalResult};
use crate::parser;
use crate::vars::VariableStore;

/// Session state threaded through every line. The variable store is the
/// only thing that outlives a single line.
#[derive(Debug)]
pub struct State {
	pub vars: VariableStore,
}

impl State {
	pub fn new() -> State {
		State { vars: VariableStore::from_env() }
	}

	pub fn with_vars(vars: VariableStore) -> State {
		State { vars: vars }
	}

	/// Parses and runs one line.
	pub fn eval_line(&mut self, line: &str) -> Result<EvalResult> {
		match parser::parse(line, &mut self.vars)? {
			Some(pipeline) => {
				debug!(stages = pipeline.commands.len(), "executing pipeline");
				eval::execute(pipeline)
			},
			None => Ok(EvalResult::Nothing),
		}
	}
}
