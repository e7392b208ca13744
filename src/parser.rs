//! Recursive-descent parser for arithmetic expressions.
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := primary (('*' | '/') primary)*
//! primary    := literal
//! ```
//!
//! Each precedence tier is one helper that loops while the lookahead is one
//! of its operators, folding into a left-leaning `Binary` chain. The grammar
//! is LL(1): only `TokenSource::current_token` is ever inspected.

use crate::ast::{AstNode, BinaryOp};
use crate::config::CompilerConf;
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{TokenKind, TokenSource};

/// A subtree together with its height, so the depth limit can be enforced
/// while the chain is being built.
struct Parsed {
  node: AstNode,
  depth: usize,
}

impl Parsed {
  fn leaf(node: AstNode) -> Self {
    Self { node, depth: 1 }
  }

  fn combine(self, op: BinaryOp, rhs: Parsed, conf: &CompilerConf) -> CompileResult<Self> {
    let depth = self.depth.max(rhs.depth) + 1;
    if depth > conf.max_depth {
      return Err(CompileError::RecursionLimitExceeded {
        limit: conf.max_depth,
      });
    }
    Ok(Self {
      node: AstNode::binary(op, self.node, rhs.node),
      depth,
    })
  }
}

/// Parse a complete expression; the stream must be fully consumed.
pub fn parse<S: TokenSource>(stream: &mut S, conf: &CompilerConf) -> CompileResult<AstNode> {
  if stream.current_token().is_eof() {
    return Err(CompileError::syntax(
      stream.current_token().loc,
      "expression is empty",
    ));
  }

  let node = parse_expression(stream, conf)?;

  let token = stream.current_token();
  if !token.is_eof() {
    return Err(CompileError::syntax(
      token.loc,
      format!("unexpected token \"{}\"", token.describe()),
    ));
  }

  Ok(node)
}

pub fn parse_expression<S: TokenSource>(
  stream: &mut S,
  conf: &CompilerConf,
) -> CompileResult<AstNode> {
  expression(stream, conf).map(|parsed| parsed.node)
}

pub fn parse_term<S: TokenSource>(stream: &mut S, conf: &CompilerConf) -> CompileResult<AstNode> {
  term(stream, conf).map(|parsed| parsed.node)
}

/// Consume exactly one token and turn it into a leaf.
pub fn parse_primary<S: TokenSource>(stream: &mut S) -> CompileResult<AstNode> {
  let token = stream.current_token();
  match (token.kind, token.value) {
    (TokenKind::Num, Some(value)) => {
      stream.advance();
      Ok(AstNode::number(value))
    }
    (TokenKind::Num, None) => Err(CompileError::syntax(
      token.loc,
      "internal error: numeric token missing value",
    )),
    (TokenKind::Eof, _) => Err(CompileError::syntax(
      token.loc,
      "expected a number, but reached end of input",
    )),
    _ => Err(CompileError::syntax(
      token.loc,
      format!("expected a number, but got \"{}\"", token.describe()),
    )),
  }
}

fn expression<S: TokenSource>(stream: &mut S, conf: &CompilerConf) -> CompileResult<Parsed> {
  let mut node = term(stream, conf)?;

  loop {
    let op = match stream.current_token().kind {
      TokenKind::Plus => BinaryOp::Add,
      TokenKind::Minus => BinaryOp::Sub,
      _ => break,
    };

    stream.advance();
    let rhs = term(stream, conf)?;
    node = node.combine(op, rhs, conf)?;
  }

  Ok(node)
}

fn term<S: TokenSource>(stream: &mut S, conf: &CompilerConf) -> CompileResult<Parsed> {
  let mut node = parse_primary(stream).map(Parsed::leaf)?;

  loop {
    let op = match stream.current_token().kind {
      TokenKind::Star => BinaryOp::Mul,
      TokenKind::Slash => BinaryOp::Div,
      _ => break,
    };

    stream.advance();
    let rhs = parse_primary(stream).map(Parsed::leaf)?;
    node = node.combine(op, rhs, conf)?;
  }

  Ok(node)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokenizer::TokenStream;

  fn parse_str(input: &str) -> CompileResult<AstNode> {
    let mut stream = TokenStream::from_source(input)?;
    parse(&mut stream, &CompilerConf::default())
  }

  #[test]
  fn multiplication_binds_tighter() {
    assert_eq!(parse_str("3 + 4 * 5").unwrap().to_string(), "(3 + (4 * 5))");
    assert_eq!(parse_str("3 * 4 + 5").unwrap().to_string(), "((3 * 4) + 5)");
  }

  #[test]
  fn same_tier_associates_left() {
    assert_eq!(parse_str("1 - 2 - 3").unwrap().to_string(), "((1 - 2) - 3)");
    assert_eq!(parse_str("8 / 4 / 2").unwrap().to_string(), "((8 / 4) / 2)");
    assert_eq!(
      parse_str("1 + 2 * 3 - 4 / 2").unwrap().to_string(),
      "((1 + (2 * 3)) - (4 / 2))"
    );
  }

  #[test]
  fn primary_consumes_one_token() {
    let mut stream = TokenStream::from_source("42 + 1").unwrap();
    let node = parse_primary(&mut stream).unwrap();
    assert_eq!(node, AstNode::number(42));
    assert_eq!(stream.current_token().kind, TokenKind::Plus);
  }

  #[test]
  fn term_stops_at_additive_operator() {
    let mut stream = TokenStream::from_source("2 * 3 + 4").unwrap();
    let node = parse_term(&mut stream, &CompilerConf::default()).unwrap();
    assert_eq!(node.to_string(), "(2 * 3)");
    assert_eq!(stream.current_token().kind, TokenKind::Plus);
  }

  #[test]
  fn reports_syntax_errors() {
    let err = parse_str("").unwrap_err();
    assert!(matches!(err, CompileError::Syntax { loc: 0, .. }));

    let err = parse_str("3 +").unwrap_err();
    assert_eq!(err.to_string(), "syntax error at byte 3: expected a number, but reached end of input");

    let err = parse_str("3 + x").unwrap_err();
    assert_eq!(err.loc(), Some(4));

    let err = parse_str("3 4").unwrap_err();
    assert_eq!(err.to_string(), "syntax error at byte 2: unexpected token \"4\"");
  }

  #[test]
  fn depth_limit_is_enforced() {
    let conf = CompilerConf::default().with_max_depth(3);
    let mut stream = TokenStream::from_source("1 + 2 + 3").unwrap();
    assert!(parse(&mut stream, &conf).is_ok());

    let mut stream = TokenStream::from_source("1 + 2 + 3 + 4").unwrap();
    let err = parse(&mut stream, &conf).unwrap_err();
    assert!(matches!(err, CompileError::RecursionLimitExceeded { limit: 3 }));
  }
}
