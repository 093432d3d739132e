use std::path::PathBuf;

use tracing::{debug,warn};

use crate::error::{Error, Result};
use crate::search;
use crate::types::*;
use crate::vars::{VariableStore, PATH_VAR};

fn is_operator(c: char) -> bool {
	match c {
		'|' | '<' | '>' => true,
		_ => false,
	}
}

/// Pads `|`, `<`, `>` and `>>` with a single space on each side so that the
/// line can be split on whitespace. No space is added where one is already
/// present, nor at the very start or end of the line.
pub fn preprocess(line: &str) -> String {
	let mut out = String::with_capacity(line.len() * 2);
	let mut chars = line.chars().peekable();
	while let Some(c) = chars.next() {
		if !is_operator(c) {
			out.push(c);
			continue;
		}
		if !out.is_empty() && !out.ends_with(' ') {
			out.push(' ');
		}
		out.push(c);
		if c == '>' && chars.peek() == Some(&'>') {
			chars.next();
			out.push('>');
		}
		match chars.peek() {
			Some(&' ') | None => {},
			Some(_) => out.push(' '),
		}
	}
	out
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
struct Token<'a> {
	text: &'a str,
	/// The remainder of the whitespace-delimited word this token starts in.
	rest: &'a str,
	word: usize,
}

fn tokenize(line: &str) -> Vec<Token> {
	let mut tokens = vec![];
	for (word_idx, word) in line.split_whitespace().enumerate() {
		let padded = preprocess(word);
		let mut offset = 0;
		for piece in padded.split_whitespace() {
			// preprocess only inserts spaces, so every piece occurs in order in the word
			let start = match word[offset..].find(piece) {
				Some(i) => offset + i,
				None => break,
			};
			let end = start + piece.len();
			tokens.push(Token { text: &word[start..end], rest: &word[start..], word: word_idx });
			offset = end;
		}
	}
	tokens
}

fn redirect_type(op: &str) -> Option<RedirectType> {
	match op {
		"<" => Some(RedirectType::Input),
		">" => Some(RedirectType::Output),
		">>" => Some(RedirectType::Append),
		_ => None,
	}
}

fn is_operator_token(text: &str) -> bool {
	text == "|" || redirect_type(text).is_some()
}

struct Parser<'a, 'v> {
	tokens: std::iter::Peekable<std::vec::IntoIter<Token<'a>>>,
	vars: &'v mut VariableStore,
	commands: Vec<Command>,
}

impl<'a, 'v> Parser<'a, 'v> {
	fn current(&mut self) -> &mut Command {
		let last = self.commands.len() - 1;
		&mut self.commands[last]
	}

	fn parse_assignment(&mut self, token: Token<'a>) -> Result<()> {
		self.vars.assign(token.rest)?;
		while self.tokens.peek().map_or(false, |t| t.word == token.word) {
			self.tokens.next();
		}
		Ok(())
	}

	fn parse_redirect(&mut self, op: &str, typ: RedirectType) -> Result<()> {
		let target = match self.tokens.next() {
			Some(t) if !is_operator_token(t.text) => t,
			Some(t) => { return Err(Error::Syntax(format!("unexpected '{}' after '{}'", t.text, op))); },
			None => { return Err(Error::Syntax(format!("missing file name after '{}'", op))); },
		};
		let path = PathBuf::from(self.vars.expand(target.text)?);
		let redirect = Some(Redirect { target: path, typ: typ });
		let command = self.current();
		match typ {
			RedirectType::Input => command.stdin = redirect,
			RedirectType::Output | RedirectType::Append => command.stdout = redirect,
		}
		Ok(())
	}

	fn parse_pipe(&mut self) -> Result<()> {
		let command = self.current();
		if command.arguments.is_empty() {
			return Err(Error::Syntax("empty command before '|'".to_string()));
		}
		if command.stdout.is_some() {
			return Err(Error::Syntax("output redirected to both a file and a pipe".to_string()));
		}
		self.commands.push(Command::new());
		Ok(())
	}

	fn parse_word(&mut self, text: &str) -> Result<()> {
		let word = self.vars.expand(text)?;
		if self.current().arguments.is_empty() {
			let exec = search::resolve(&word, self.vars.get(PATH_VAR))?;
			self.current().exec = exec;
		}
		self.current().arguments.push(word);
		Ok(())
	}

	fn parse_pipeline(mut self) -> Result<Option<Pipeline>> {
		while let Some(token) = self.tokens.next() {
			if token.text.starts_with('#') {
				break;
			}
			if token.text.contains('=') {
				self.parse_assignment(token)?;
			} else if let Some(typ) = redirect_type(token.text) {
				self.parse_redirect(token.text, typ)?;
			} else if token.text == "|" {
				self.parse_pipe()?;
			} else {
				self.parse_word(token.text)?;
			}
		}

		if self.commands.len() > 1 && self.current().arguments.is_empty() {
			return Err(Error::Syntax("missing command after '|'".to_string()));
		}
		let first = &self.commands[0];
		if first.arguments.is_empty() {
			return Ok(None);
		}
		if first.exec == Executable::NotFound {
			let name = first.name().unwrap_or_default();
			warn!(command = name, "command not found");
			eprintln!("command not found: {}", name);
			return Ok(None);
		}
		Ok(Some(Pipeline { commands: self.commands }))
	}
}

/// Parses one line into a pipeline.
///
/// Returns `Ok(None)` for blank lines, comments and lines that only assign
/// variables. Assignments take effect immediately and are kept even if a
/// later token of the same line fails to parse.
pub fn parse(line: &str, vars: &mut VariableStore) -> Result<Option<Pipeline>> {
	match line.trim_start().chars().next() {
		None | Some('#') => { return Ok(None); },
		Some(c) if is_operator(c) => {
			return Err(Error::Syntax(format!("unexpected '{}' at start of line", c)));
		},
		Some(_) => {},
	}

	let tokens = tokenize(line);
	debug!(tokens = tokens.len(), "tokenized line");
	let parser = Parser {
		tokens: tokens.into_iter().peekable(),
		vars: vars,
		commands: vec![Command::new()],
	};
	parser.parse_pipeline()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builtin::Builtin;
	use crate::vars::Variable;

	fn vars() -> VariableStore {
		let mut vars = VariableStore::new();
		vars.assign("PATH=/bin:/usr/bin").unwrap();
		vars
	}

	fn texts(line: &str) -> Vec<&str> {
		tokenize(line).iter().map(|t| t.text).collect()
	}

	#[test]
	fn preprocess_pads_operators() {
		assert_eq!(preprocess("a|b"), "a | b");
		assert_eq!(preprocess("cat<in>out"), "cat < in > out");
		assert_eq!(preprocess("echo hi>>log"), "echo hi >> log");
		assert_eq!(preprocess("a | b"), "a | b");
		assert_eq!(preprocess("|x"), "| x");
		assert_eq!(preprocess("x>"), "x >");
		assert_eq!(preprocess("plain words"), "plain words");
	}

	#[test]
	fn preprocess_does_not_split_append() {
		assert_eq!(preprocess("a>>>b"), "a >> > b");
	}

	#[test]
	fn tokens_are_split_around_operators() {
		assert_eq!(texts("  ls -l|wc  -l "), ["ls", "-l", "|", "wc", "-l"]);
		assert_eq!(texts("sort<in>>out"), ["sort", "<", "in", ">>", "out"]);
	}

	#[test]
	fn blank_and_comment_lines_are_empty() {
		let mut vars = vars();
		for line in &["", "   ", "\t\n", "# comment", "   # indented comment"] {
			assert_eq!(parse(line, &mut vars).unwrap(), None, "{:?}", line);
		}
	}

	#[test]
	fn leading_operator_is_syntax_error() {
		let mut vars = vars();
		for line in &["| cat", "  < in", ">out", ">> out"] {
			match parse(line, &mut vars) {
				Err(Error::Syntax(_)) => {},
				r => panic!("{:?}: unexpected {:?}", line, r),
			}
		}
	}

	#[test]
	fn two_stage_pipeline() {
		let mut vars = vars();
		let pipeline = parse("echo hi | cat", &mut vars).unwrap().unwrap();
		assert_eq!(pipeline.commands.len(), 2);
		assert_eq!(pipeline.commands[0].arguments, ["echo", "hi"]);
		assert_eq!(pipeline.commands[1].arguments, ["cat"]);
		assert!(match pipeline.commands[1].exec { Executable::Path(_) => true, _ => false });
	}

	#[test]
	fn redirections_are_recorded() {
		let mut vars = vars();
		vars.assign("F=out.txt").unwrap();
		let pipeline = parse("sort < in.txt >> $F", &mut vars).unwrap().unwrap();
		let command = &pipeline.commands[0];
		assert_eq!(command.arguments, ["sort"]);
		assert_eq!(command.stdin, Some(Redirect { target: PathBuf::from("in.txt"), typ: RedirectType::Input }));
		assert_eq!(command.stdout, Some(Redirect { target: PathBuf::from("out.txt"), typ: RedirectType::Append }));
	}

	#[test]
	fn redirect_and_pipe_are_exclusive() {
		let mut vars = vars();
		match parse("cmd > out | cmd2", &mut vars) {
			Err(Error::Syntax(_)) => {},
			r => panic!("unexpected {:?}", r),
		}
	}

	#[test]
	fn missing_redirect_target() {
		let mut vars = vars();
		for line in &["cat <", "echo hi >", "echo hi > | cat"] {
			match parse(line, &mut vars) {
				Err(Error::Syntax(_)) => {},
				r => panic!("{:?}: unexpected {:?}", line, r),
			}
		}
	}

	#[test]
	fn empty_stages_are_rejected() {
		let mut vars = vars();
		for line in &["echo hi |", "echo hi | | cat"] {
			match parse(line, &mut vars) {
				Err(Error::Syntax(_)) => {},
				r => panic!("{:?}: unexpected {:?}", line, r),
			}
		}
	}

	#[test]
	fn undefined_variable_aborts_line() {
		let mut vars = vars();
		match parse("echo $NOPE", &mut vars) {
			Err(Error::UndefinedVariable(name)) => assert_eq!(name, "NOPE"),
			r => panic!("unexpected {:?}", r),
		}
	}

	#[test]
	fn assignment_only_line_is_empty() {
		let mut vars = vars();
		assert_eq!(parse("A=1 B=two", &mut vars).unwrap(), None);
		assert_eq!(vars.lookup("A"), Some("1"));
		assert_eq!(vars.lookup("B"), Some("two"));
	}

	#[test]
	fn assignment_keeps_operators_in_value() {
		let mut vars = vars();
		assert_eq!(parse("X=a|b>c", &mut vars).unwrap(), None);
		assert_eq!(vars.lookup("X"), Some("a|b>c"));
	}

	#[test]
	fn assignment_value_is_not_substituted() {
		let mut vars = vars();
		assert_eq!(parse("X=$HOME", &mut vars).unwrap(), None);
		assert_eq!(vars.lookup("X"), Some("$HOME"));
	}

	#[test]
	fn failed_assignment_keeps_earlier_ones() {
		let mut vars = vars();
		match parse("A=1 b2=x echo", &mut vars) {
			Err(Error::InvalidVariableName(name)) => assert_eq!(name, "b2"),
			r => panic!("unexpected {:?}", r),
		}
		assert_eq!(vars.lookup("A"), Some("1"));
	}

	#[test]
	fn assignment_before_command_is_visible() {
		let mut vars = vars();
		let pipeline = parse("MSG=hello echo $MSG", &mut vars).unwrap().unwrap();
		assert_eq!(pipeline.commands[0].arguments, ["echo", "hello"]);
	}

	#[test]
	fn trailing_comment_stops_tokenizing() {
		let mut vars = vars();
		let pipeline = parse("echo a b # $UNDEFINED | cat", &mut vars).unwrap().unwrap();
		assert_eq!(pipeline.commands.len(), 1);
		assert_eq!(pipeline.commands[0].arguments, ["echo", "a", "b"]);
	}

	#[test]
	fn cd_resolves_to_builtin() {
		let mut vars = vars();
		let pipeline = parse("cd /tmp", &mut vars).unwrap().unwrap();
		assert_eq!(pipeline.commands[0].exec, Executable::Builtin(Builtin::Cd));
		assert_eq!(pipeline.commands[0].arguments, ["cd", "/tmp"]);
	}

	#[test]
	fn argv0_is_substituted_name() {
		let mut vars = vars();
		vars.assign("PROG=/bin/echo").unwrap();
		let pipeline = parse("$PROG x", &mut vars).unwrap().unwrap();
		assert_eq!(pipeline.commands[0].exec, Executable::Path(PathBuf::from("/bin/echo")));
		assert_eq!(pipeline.commands[0].arguments, ["/bin/echo", "x"]);
	}

	#[test]
	fn unknown_first_command_is_empty() {
		let mut vars = vars();
		assert_eq!(parse("ish-no-such-command arg", &mut vars).unwrap(), None);
	}

	#[test]
	fn missing_path_is_config_error() {
		let mut vars = VariableStore::new();
		match parse("ls", &mut vars) {
			Err(Error::Config(_)) => {},
			r => panic!("unexpected {:?}", r),
		}
		assert_eq!(vars.iter().next(), None::<&Variable>);
	}
}
