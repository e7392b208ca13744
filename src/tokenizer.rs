//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The parser never sees this module's internals; it consumes tokens
//! through the `TokenSource` trait and only ever looks at the current one.

use crate::error::{CompileError, CompileResult};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Num,
  Ident,
  Plus,
  Minus,
  Star,
  Slash,
  Eof,
}

impl TokenKind {
  fn from_punct(c: u8) -> Option<Self> {
    match c {
      b'+' => Some(Self::Plus),
      b'-' => Some(Self::Minus),
      b'*' => Some(Self::Star),
      b'/' => Some(Self::Slash),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub value: Option<i64>,
  pub ident: Option<String>,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  pub fn new(kind: TokenKind, loc: usize, len: usize) -> Self {
    Self {
      kind,
      value: None,
      ident: None,
      loc,
      len,
    }
  }

  pub fn number(value: i64, loc: usize, len: usize) -> Self {
    Self {
      value: Some(value),
      ..Self::new(TokenKind::Num, loc, len)
    }
  }

  pub fn ident(text: impl Into<String>, loc: usize, len: usize) -> Self {
    Self {
      ident: Some(text.into()),
      ..Self::new(TokenKind::Ident, loc, len)
    }
  }

  pub fn is_eof(&self) -> bool {
    self.kind == TokenKind::Eof
  }

  /// Human-friendly description used in diagnostics.
  pub fn describe(&self) -> String {
    match self.kind {
      TokenKind::Eof => "EOF".to_string(),
      TokenKind::Num => self.value.map(|v| v.to_string()).unwrap_or_default(),
      TokenKind::Ident => self.ident.clone().unwrap_or_default(),
      TokenKind::Plus => "+".to_string(),
      TokenKind::Minus => "-".to_string(),
      TokenKind::Star => "*".to_string(),
      TokenKind::Slash => "/".to_string(),
    }
  }
}

/// The parser's view of its input: one current token and a way to move on.
pub trait TokenSource {
  fn current_token(&self) -> &Token;
  fn advance(&mut self);
}

/// Lightweight cursor over a token vector.
///
/// The vector always ends with an `Eof` token; advancing past it keeps the
/// cursor on `Eof`.
#[derive(Debug, Clone)]
pub struct TokenStream {
  tokens: Vec<Token>,
  pos: usize,
}

impl TokenStream {
  pub fn new(mut tokens: Vec<Token>) -> Self {
    if !tokens.last().is_some_and(Token::is_eof) {
      let end = tokens.last().map(|t| t.loc + t.len).unwrap_or(0);
      tokens.push(Token::new(TokenKind::Eof, end, 0));
    }
    Self { tokens, pos: 0 }
  }

  pub fn from_source(input: &str) -> CompileResult<Self> {
    tokenize(input).map(Self::new)
  }
}

impl TokenSource for TokenStream {
  fn current_token(&self) -> &Token {
    &self.tokens[self.pos]
  }

  fn advance(&mut self) {
    if self.pos + 1 < self.tokens.len() {
      self.pos += 1;
    }
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let text = &input[start..i];
      let value = text
        .parse::<i64>()
        .map_err(|err| CompileError::lex(start, format!("invalid number: {err}")))?;
      tokens.push(Token::number(value, start, i - start));
      continue;
    }

    if c.is_ascii_alphabetic() || c == b'_' {
      let start = i;
      i += 1;
      while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
      }
      tokens.push(Token::ident(&input[start..i], start, i - start));
      continue;
    }

    if let Some(kind) = TokenKind::from_punct(c) {
      tokens.push(Token::new(kind, i, 1));
      i += 1;
      continue;
    }

    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::lex(
      i,
      format!("invalid token: '{invalid_char}'"),
    ));
  }

  log::debug!("tokenized {} token(s)", tokens.len());
  tokens.push(Token::new(TokenKind::Eof, input.len(), 0));
  Ok(tokens)
}
