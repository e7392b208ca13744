//! Name tables owned by one analysis run.

use std::collections::BTreeMap;

use crate::ast::Field;
use crate::ty::DeclaredType;

/// Index of a scope in `SymbolTable`. Scope 0 is the global scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
  Variable,
  Parameter,
  /// `len` is the folded size, when the size expression was constant.
  Array { len: Option<i64> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
  pub ty: DeclaredType,
  pub kind: SymbolKind,
  pub scope: ScopeId,
}

#[derive(Debug, Default)]
struct Scope {
  symbols: BTreeMap<String, Symbol>,
}

/// Stack of lexical scopes. Lookups walk from the innermost scope outward;
/// declarations only collide within the innermost one.
#[derive(Debug)]
pub struct SymbolTable {
  scopes: Vec<Scope>,
}

impl SymbolTable {
  pub fn new() -> Self {
    Self {
      scopes: vec![Scope::default()],
    }
  }

  pub fn current_scope(&self) -> ScopeId {
    ScopeId(self.scopes.len() - 1)
  }

  pub fn enter_scope(&mut self) -> ScopeId {
    self.scopes.push(Scope::default());
    self.current_scope()
  }

  /// The global scope is never popped.
  pub fn exit_scope(&mut self) {
    if self.scopes.len() > 1 {
      self.scopes.pop();
    }
  }

  pub fn is_declared_locally(&self, name: &str) -> bool {
    self
      .scopes
      .last()
      .is_some_and(|scope| scope.symbols.contains_key(name))
  }

  /// Insert into the innermost scope. Returns `false`, leaving the existing
  /// entry untouched, when the name is already declared there.
  pub fn declare(&mut self, name: &str, ty: DeclaredType, kind: SymbolKind) -> bool {
    let scope = self.current_scope();
    let Some(innermost) = self.scopes.last_mut() else {
      return false;
    };
    if innermost.symbols.contains_key(name) {
      return false;
    }
    innermost
      .symbols
      .insert(name.to_string(), Symbol { ty, kind, scope });
    true
  }

  pub fn lookup(&self, name: &str) -> Option<&Symbol> {
    self
      .scopes
      .iter()
      .rev()
      .find_map(|scope| scope.symbols.get(name))
  }
}

impl Default for SymbolTable {
  fn default() -> Self {
    Self::new()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
  pub params: Vec<DeclaredType>,
  pub ret: DeclaredType,
}

/// Functions live in one flat namespace; the first declaration wins.
#[derive(Debug, Default)]
pub struct FunctionTable {
  functions: BTreeMap<String, FunctionSignature>,
}

impl FunctionTable {
  pub fn contains(&self, name: &str) -> bool {
    self.functions.contains_key(name)
  }

  pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
    self.functions.get(name)
  }

  /// Returns `false` if the name was already taken.
  pub fn insert(&mut self, name: &str, signature: FunctionSignature) -> bool {
    if self.contains(name) {
      return false;
    }
    self.functions.insert(name.to_string(), signature);
    true
  }
}

/// Declared struct layouts, one flat namespace like functions.
#[derive(Debug, Default)]
pub struct StructTable {
  structs: BTreeMap<String, Vec<Field>>,
}

impl StructTable {
  pub fn contains(&self, name: &str) -> bool {
    self.structs.contains_key(name)
  }

  pub fn fields(&self, name: &str) -> Option<&[Field]> {
    self.structs.get(name).map(Vec::as_slice)
  }

  pub fn insert(&mut self, name: &str, fields: Vec<Field>) -> bool {
    if self.contains(name) {
      return false;
    }
    self.structs.insert(name.to_string(), fields);
    true
  }
}
