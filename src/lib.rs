//! `ish`, a small line-oriented command interpreter.
//!
//! A line goes through [`parser::parse`], which pads operators, splits it into
//! words, applies `NAME=value` assignments, substitutes `$NAME` and `${NAME}`
//! and resolves each command against `PATH`. The resulting [`types::Pipeline`]
//! is handed to [`eval::execute`], which forks one process per stage, wires
//! the pipes and redirections and waits for all of them.

pub mod builtin;
pub mod error;
pub mod eval;
pub mod global;
pub mod job;
pub mod parser;
pub mod script;
pub mod search;
pub mod types;
pub mod vars;

pub use error::{Error, Result};
pub use eval::EvalResult;
pub use global::State;
