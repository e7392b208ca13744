//! Fail-fast errors of the compilation pipeline.
//!
//! Lexing and parsing abort on the first problem, the generator refuses node
//! kinds it has no instruction contract for, and the driver turns a
//! non-empty diagnostic sink into a single `Semantic` error. Semantic
//! problems themselves are data (see `diagnostic`), not errors.

use snafu::Snafu;

use crate::diagnostic::Diagnostic;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("lexical error at byte {loc}: {message}"))]
  Lex { loc: usize, message: String },

  #[snafu(display("syntax error at byte {loc}: {message}"))]
  Syntax { loc: usize, message: String },

  #[snafu(display("expression nests deeper than the limit of {limit}"))]
  RecursionLimitExceeded { limit: usize },

  #[snafu(display("{} semantic error(s)", diagnostics.len()))]
  Semantic { diagnostics: Vec<Diagnostic> },

  /// The generator was handed a construct it has no instruction contract
  /// for. This means the analyzer let something through it should not have.
  #[snafu(display("internal error: no code generation for {kind}"))]
  Unsupported { kind: &'static str },
}

impl CompileError {
  pub fn lex(loc: usize, message: impl Into<String>) -> Self {
    Self::Lex {
      loc,
      message: message.into(),
    }
  }

  pub fn syntax(loc: usize, message: impl Into<String>) -> Self {
    Self::Syntax {
      loc,
      message: message.into(),
    }
  }

  /// Byte offset into the source, for errors that have one.
  pub fn loc(&self) -> Option<usize> {
    match self {
      Self::Lex { loc, .. } | Self::Syntax { loc, .. } => Some(*loc),
      _ => None,
    }
  }

  /// Render the error against its source, pointing at the offending byte
  /// with a caret:
  ///
  /// ```text
  /// '3 + x'
  ///      ^ expected a number, but got "x"
  /// ```
  pub fn caret(&self, source: &str) -> String {
    let message = match self {
      Self::Lex { message, .. } | Self::Syntax { message, .. } => message.clone(),
      Self::Semantic { diagnostics } => {
        let lines: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
        return lines.join("\n");
      }
      other => return other.to_string(),
    };
    let Some(loc) = self.loc() else {
      return message;
    };

    let expr_line = format!("'{source}'");
    let safe_loc = loc.min(source.len());
    let char_offset = source[..safe_loc].chars().count() + 1; // account for opening quote
    let marker = format!("{}^", " ".repeat(char_offset));
    format!("{expr_line}\n{marker} {message}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn caret_points_at_offending_byte() {
    let err = CompileError::syntax(4, "expected a number");
    assert_eq!(err.caret("3 + x"), "'3 + x'\n     ^ expected a number");
  }

  #[test]
  fn caret_clamps_past_end() {
    let err = CompileError::lex(99, "unexpected end of input");
    assert_eq!(err.caret("1"), "'1'\n  ^ unexpected end of input");
  }

  #[test]
  fn unlocated_errors_render_plainly() {
    let err = CompileError::RecursionLimitExceeded { limit: 8 };
    assert_eq!(err.loc(), None);
    assert_eq!(
      err.caret("1+1"),
      "expression nests deeper than the limit of 8"
    );
  }
}
