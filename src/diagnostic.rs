//! Structured semantic diagnostics.
//!
//! A diagnostic is a plain record: what went wrong, where in the tree, and
//! how bad it is. Text is only produced through `Display`, so callers can
//! sort, filter or count records before anything is printed.

use std::fmt;

use crate::ty::DeclaredType;

/// Pre-order index of a node in the analyzed tree. The root is `#0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef(pub usize);

impl fmt::Display for NodeRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
  Error,
}

/// What kind of name a duplicate declaration collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
  Variable,
  Array,
  Function,
  Struct,
}

impl fmt::Display for DeclKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Variable => "variable",
      Self::Array => "array",
      Self::Function => "function",
      Self::Struct => "struct",
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
  DuplicateDeclaration {
    what: DeclKind,
    name: String,
  },
  TypeMismatch {
    name: String,
    expected: DeclaredType,
    found: DeclaredType,
  },
  UnknownType {
    name: String,
  },
  UndeclaredIdentifier {
    name: String,
  },
  MissingReturnType {
    function: String,
  },
  DuplicateParameter {
    function: String,
    param: String,
  },
  MalformedBody {
    function: String,
  },
  UndeclaredFunction {
    name: String,
  },
  ArityMismatch {
    function: String,
    expected: usize,
    found: usize,
  },
  ArgumentTypeMismatch {
    function: String,
    position: usize,
    expected: DeclaredType,
    found: DeclaredType,
  },
  NonBooleanCondition {
    found: DeclaredType,
  },
  /// `found == None` is a bare `return` in a function that returns a value.
  ReturnTypeMismatch {
    function: String,
    expected: DeclaredType,
    found: Option<DeclaredType>,
  },
  ReturnOutsideFunction,
  InvalidArraySize {
    name: String,
    size: Option<i64>,
  },
  NotAnArray {
    name: String,
  },
  /// `value` is the index when it folds to a constant.
  InvalidIndexExpression {
    name: String,
    found: DeclaredType,
    value: Option<i64>,
  },
  InvalidOperand {
    op: char,
    found: DeclaredType,
  },
  DuplicateField {
    structure: String,
    field: String,
  },
  RecursionLimitExceeded {
    limit: usize,
  },
}

impl DiagnosticKind {
  /// Stable machine-readable code.
  pub fn code(&self) -> &'static str {
    match self {
      Self::DuplicateDeclaration { .. } => "duplicate-declaration",
      Self::TypeMismatch { .. } => "type-mismatch",
      Self::UnknownType { .. } => "unknown-type",
      Self::UndeclaredIdentifier { .. } => "undeclared-identifier",
      Self::MissingReturnType { .. } => "missing-return-type",
      Self::DuplicateParameter { .. } => "duplicate-parameter",
      Self::MalformedBody { .. } => "malformed-body",
      Self::UndeclaredFunction { .. } => "undeclared-function",
      Self::ArityMismatch { .. } => "arity-mismatch",
      Self::ArgumentTypeMismatch { .. } => "argument-type-mismatch",
      Self::NonBooleanCondition { .. } => "non-boolean-condition",
      Self::ReturnTypeMismatch { .. } => "return-type-mismatch",
      Self::ReturnOutsideFunction => "return-outside-function",
      Self::InvalidArraySize { .. } => "invalid-array-size",
      Self::NotAnArray { .. } => "not-an-array",
      Self::InvalidIndexExpression { .. } => "invalid-index-expression",
      Self::InvalidOperand { .. } => "invalid-operand",
      Self::DuplicateField { .. } => "duplicate-field",
      Self::RecursionLimitExceeded { .. } => "recursion-limit-exceeded",
    }
  }
}

impl fmt::Display for DiagnosticKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::DuplicateDeclaration { what, name } => {
        write!(f, "{what} '{name}' is already declared in this scope")
      }
      Self::TypeMismatch {
        name,
        expected,
        found,
      } => write!(
        f,
        "cannot assign a value of type {found} to '{name}' of type {expected}"
      ),
      Self::UnknownType { name } => write!(f, "unknown type 'struct {name}'"),
      Self::UndeclaredIdentifier { name } => write!(f, "'{name}' has not been declared"),
      Self::MissingReturnType { function } => {
        write!(f, "function '{function}' must have a return type")
      }
      Self::DuplicateParameter { function, param } => {
        write!(f, "function '{function}' has more than one parameter named '{param}'")
      }
      Self::MalformedBody { function } => {
        write!(f, "the body of function '{function}' is not a block")
      }
      Self::UndeclaredFunction { name } => write!(f, "function '{name}' has not been declared"),
      Self::ArityMismatch {
        function,
        expected,
        found,
      } => write!(
        f,
        "function '{function}' takes {expected} argument(s) but {found} were supplied"
      ),
      Self::ArgumentTypeMismatch {
        function,
        position,
        expected,
        found,
      } => write!(
        f,
        "argument {} to '{function}' has type {found}, expected {expected}",
        position + 1
      ),
      Self::NonBooleanCondition { found } => {
        write!(f, "condition must be of type bool, found {found}")
      }
      Self::ReturnTypeMismatch {
        function,
        expected,
        found: Some(found),
      } => write!(
        f,
        "function '{function}' returns {expected}, but this returns {found}"
      ),
      Self::ReturnTypeMismatch {
        function,
        expected,
        found: None,
      } => write!(f, "function '{function}' must return a value of type {expected}"),
      Self::ReturnOutsideFunction => write!(f, "return outside of a function"),
      Self::InvalidArraySize {
        name,
        size: Some(size),
      } => write!(f, "size of array '{name}' must be positive, found {size}"),
      Self::InvalidArraySize { name, size: None } => write!(
        f,
        "size of array '{name}' must be a constant integer expression"
      ),
      Self::NotAnArray { name } => write!(f, "'{name}' is not an array"),
      Self::InvalidIndexExpression {
        name,
        value: Some(value),
        ..
      } if *value <= 0 => write!(f, "index {value} into '{name}' must be positive"),
      Self::InvalidIndexExpression {
        name,
        value: Some(value),
        ..
      } => write!(f, "index {value} is out of bounds for array '{name}'"),
      Self::InvalidIndexExpression {
        name,
        found,
        value: None,
      } => write!(f, "index into '{name}' must be of type int, found {found}"),
      Self::InvalidOperand { op, found } => {
        write!(f, "operator '{op}' cannot be applied to a value of type {found}")
      }
      Self::DuplicateField { structure, field } => {
        write!(f, "struct '{structure}' has more than one field named '{field}'")
      }
      Self::RecursionLimitExceeded { limit } => {
        write!(f, "tree nests deeper than the limit of {limit}")
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
  pub kind: DiagnosticKind,
  pub node: NodeRef,
  pub severity: Severity,
}

impl Diagnostic {
  pub fn error(node: NodeRef, kind: DiagnosticKind) -> Self {
    Self {
      kind,
      node,
      severity: Severity::Error,
    }
  }

  pub fn code(&self) -> &'static str {
    self.kind.code()
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let level = match self.severity {
      Severity::Error => "error",
    };
    write!(f, "{level}[{}] node {}: {}", self.code(), self.node, self.kind)
  }
}

/// Ordered collection of the diagnostics of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticSink {
  records: Vec<Diagnostic>,
}

impl DiagnosticSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn report(&mut self, node: NodeRef, kind: DiagnosticKind) {
    log::trace!("{} at node {node}", kind.code());
    self.records.push(Diagnostic::error(node, kind));
  }

  pub fn count(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
    self.records.iter()
  }

  /// Codes in report order; handy for asserting on a whole run at once.
  pub fn codes(&self) -> Vec<&'static str> {
    self.records.iter().map(Diagnostic::code).collect()
  }

  pub fn as_slice(&self) -> &[Diagnostic] {
    &self.records
  }

  pub fn into_vec(self) -> Vec<Diagnostic> {
    self.records
  }
}

impl<'a> IntoIterator for &'a DiagnosticSink {
  type Item = &'a Diagnostic;
  type IntoIter = std::slice::Iter<'a, Diagnostic>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl IntoIterator for DiagnosticSink {
  type Item = Diagnostic;
  type IntoIter = std::vec::IntoIter<Diagnostic>;

  fn into_iter(self) -> Self::IntoIter {
    self.records.into_iter()
  }
}
