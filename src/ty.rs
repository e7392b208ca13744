use std::fmt;

/// Value types of the language.
///
/// `Undefined` doubles as "not declared" (a function without a return type)
/// and "could not be inferred" (a call to an unknown function).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclaredType {
  Integer,
  Boolean,
  String,
  Struct(String),
  Undefined,
}

impl DeclaredType {
  pub fn structure(name: impl Into<String>) -> Self {
    Self::Struct(name.into())
  }

  pub fn is_numeric(&self) -> bool {
    matches!(self, Self::Integer)
  }

  pub fn is_string(&self) -> bool {
    matches!(self, Self::String)
  }

  pub fn is_undefined(&self) -> bool {
    matches!(self, Self::Undefined)
  }

  /// No widening: equal types, or both numeric, or both string.
  pub fn is_compatible(&self, other: &DeclaredType) -> bool {
    self == other
      || (self.is_numeric() && other.is_numeric())
      || (self.is_string() && other.is_string())
  }

  /// Name of the struct this type refers to, if any.
  pub fn struct_name(&self) -> Option<&str> {
    match self {
      Self::Struct(name) => Some(name),
      _ => None,
    }
  }
}

impl fmt::Display for DeclaredType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Integer => write!(f, "int"),
      Self::Boolean => write!(f, "bool"),
      Self::String => write!(f, "string"),
      Self::Struct(name) => write!(f, "struct {name}"),
      Self::Undefined => write!(f, "undefined"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compatibility_is_not_widening() {
    assert!(DeclaredType::Integer.is_compatible(&DeclaredType::Integer));
    assert!(DeclaredType::String.is_compatible(&DeclaredType::String));
    assert!(!DeclaredType::Integer.is_compatible(&DeclaredType::Boolean));
    assert!(!DeclaredType::Boolean.is_compatible(&DeclaredType::String));
    assert!(!DeclaredType::structure("a").is_compatible(&DeclaredType::structure("b")));
    assert!(DeclaredType::structure("a").is_compatible(&DeclaredType::structure("a")));
  }

  #[test]
  fn display_names() {
    assert_eq!(DeclaredType::structure("point").to_string(), "struct point");
    assert_eq!(DeclaredType::Integer.to_string(), "int");
  }
}
