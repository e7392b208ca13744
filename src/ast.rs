//! Abstract syntax tree shared by the analyzer and the code generator.
//!
//! Every child is owned by exactly one parent through `Box` or `Vec`, so the
//! tree can neither share nodes nor form cycles. The only field a pass is
//! allowed to write after construction is `AstNode::ty`.

use std::fmt;

use crate::ty::DeclaredType;

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
}

impl BinaryOp {
  pub fn symbol(self) -> char {
    match self {
      Self::Add => '+',
      Self::Sub => '-',
      Self::Mul => '*',
      Self::Div => '/',
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowForm {
  If,
  While,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
  pub name: String,
  pub ty: DeclaredType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
  pub name: String,
  pub ty: DeclaredType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
  Int {
    value: i64,
  },
  Bool {
    value: bool,
  },
  Str {
    value: String,
  },
  Var {
    name: String,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
  VarDecl {
    name: String,
    declared: DeclaredType,
    init: Option<Box<AstNode>>,
  },
  Assign {
    name: String,
    value: Box<AstNode>,
  },
  /// `return_type == Undefined` means the declaration omitted it.
  FuncDecl {
    name: String,
    params: Vec<Param>,
    return_type: DeclaredType,
    body: Box<AstNode>,
  },
  Call {
    name: String,
    args: Vec<AstNode>,
  },
  ControlFlow {
    form: FlowForm,
    condition: Box<AstNode>,
    body: Box<AstNode>,
  },
  Return {
    value: Option<Box<AstNode>>,
  },
  ArrayDecl {
    name: String,
    element: DeclaredType,
    size: Box<AstNode>,
    init: Option<Box<AstNode>>,
  },
  ArrayAccess {
    name: String,
    index: Box<AstNode>,
  },
  StructDecl {
    name: String,
    fields: Vec<Field>,
  },
  Block {
    stmts: Vec<AstNode>,
  },
}

/// A tree node plus the type the analyzer inferred for it.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
  pub kind: NodeKind,
  pub ty: Option<DeclaredType>,
}

impl From<NodeKind> for AstNode {
  fn from(kind: NodeKind) -> Self {
    Self { kind, ty: None }
  }
}

impl AstNode {
  pub fn number(value: i64) -> Self {
    NodeKind::Int { value }.into()
  }

  pub fn boolean(value: bool) -> Self {
    NodeKind::Bool { value }.into()
  }

  pub fn string(value: impl Into<String>) -> Self {
    NodeKind::Str {
      value: value.into(),
    }
    .into()
  }

  pub fn var(name: impl Into<String>) -> Self {
    NodeKind::Var { name: name.into() }.into()
  }

  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    NodeKind::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
    .into()
  }

  pub fn var_decl(name: impl Into<String>, declared: DeclaredType, init: Option<AstNode>) -> Self {
    NodeKind::VarDecl {
      name: name.into(),
      declared,
      init: init.map(Box::new),
    }
    .into()
  }

  pub fn assign(name: impl Into<String>, value: AstNode) -> Self {
    NodeKind::Assign {
      name: name.into(),
      value: Box::new(value),
    }
    .into()
  }

  pub fn function(
    name: impl Into<String>,
    params: Vec<Param>,
    return_type: DeclaredType,
    body: AstNode,
  ) -> Self {
    NodeKind::FuncDecl {
      name: name.into(),
      params,
      return_type,
      body: Box::new(body),
    }
    .into()
  }

  pub fn call(name: impl Into<String>, args: Vec<AstNode>) -> Self {
    NodeKind::Call {
      name: name.into(),
      args,
    }
    .into()
  }

  pub fn control_flow(form: FlowForm, condition: AstNode, body: AstNode) -> Self {
    NodeKind::ControlFlow {
      form,
      condition: Box::new(condition),
      body: Box::new(body),
    }
    .into()
  }

  pub fn if_then(condition: AstNode, body: AstNode) -> Self {
    Self::control_flow(FlowForm::If, condition, body)
  }

  pub fn while_loop(condition: AstNode, body: AstNode) -> Self {
    Self::control_flow(FlowForm::While, condition, body)
  }

  pub fn ret(value: Option<AstNode>) -> Self {
    NodeKind::Return {
      value: value.map(Box::new),
    }
    .into()
  }

  pub fn array_decl(
    name: impl Into<String>,
    element: DeclaredType,
    size: AstNode,
    init: Option<AstNode>,
  ) -> Self {
    NodeKind::ArrayDecl {
      name: name.into(),
      element,
      size: Box::new(size),
      init: init.map(Box::new),
    }
    .into()
  }

  pub fn array_access(name: impl Into<String>, index: AstNode) -> Self {
    NodeKind::ArrayAccess {
      name: name.into(),
      index: Box::new(index),
    }
    .into()
  }

  pub fn struct_decl(name: impl Into<String>, fields: Vec<Field>) -> Self {
    NodeKind::StructDecl {
      name: name.into(),
      fields,
    }
    .into()
  }

  pub fn block(stmts: Vec<AstNode>) -> Self {
    NodeKind::Block { stmts }.into()
  }

  pub fn is_block(&self) -> bool {
    matches!(self.kind, NodeKind::Block { .. })
  }

  /// Short, stable name of the node kind, used in diagnostics and errors.
  pub fn kind_name(&self) -> &'static str {
    match self.kind {
      NodeKind::Int { .. } => "integer literal",
      NodeKind::Bool { .. } => "boolean literal",
      NodeKind::Str { .. } => "string literal",
      NodeKind::Var { .. } => "variable reference",
      NodeKind::Binary { .. } => "binary operation",
      NodeKind::VarDecl { .. } => "variable declaration",
      NodeKind::Assign { .. } => "assignment",
      NodeKind::FuncDecl { .. } => "function declaration",
      NodeKind::Call { .. } => "function call",
      NodeKind::ControlFlow { .. } => "control flow",
      NodeKind::Return { .. } => "return",
      NodeKind::ArrayDecl { .. } => "array declaration",
      NodeKind::ArrayAccess { .. } => "array access",
      NodeKind::StructDecl { .. } => "struct declaration",
      NodeKind::Block { .. } => "block",
    }
  }

  /// Direct children in the order the passes visit them.
  pub fn children(&self) -> Vec<&AstNode> {
    match &self.kind {
      NodeKind::Int { .. }
      | NodeKind::Bool { .. }
      | NodeKind::Str { .. }
      | NodeKind::Var { .. }
      | NodeKind::StructDecl { .. } => Vec::new(),
      NodeKind::Binary { lhs, rhs, .. } => vec![&**lhs, &**rhs],
      NodeKind::VarDecl { init, .. } | NodeKind::Return { value: init } => {
        init.as_deref().into_iter().collect()
      }
      NodeKind::Assign { value, .. } => vec![&**value],
      NodeKind::FuncDecl { body, .. } => vec![&**body],
      NodeKind::Call { args, .. } => args.iter().collect(),
      NodeKind::ControlFlow {
        condition, body, ..
      } => vec![&**condition, &**body],
      NodeKind::ArrayDecl { size, init, .. } => {
        std::iter::once(&**size).chain(init.as_deref()).collect()
      }
      NodeKind::ArrayAccess { index, .. } => vec![&**index],
      NodeKind::Block { stmts } => stmts.iter().collect(),
    }
  }

  /// Number of nodes in this subtree, this one included. Counted with an
  /// explicit stack, so it is safe on trees of any depth.
  pub fn subtree_len(&self) -> usize {
    let mut pending = vec![self];
    let mut count = 0;
    while let Some(node) = pending.pop() {
      count += 1;
      pending.extend(node.children());
    }
    count
  }
}

impl Param {
  pub fn new(name: impl Into<String>, ty: DeclaredType) -> Self {
    Self {
      name: name.into(),
      ty,
    }
  }
}

impl Field {
  pub fn new(name: impl Into<String>, ty: DeclaredType) -> Self {
    Self {
      name: name.into(),
      ty,
    }
  }
}

/// Prints arithmetic fully parenthesised, which makes grouping visible in
/// test failures. Other kinds print their kind name.
impl fmt::Display for AstNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.kind {
      NodeKind::Int { value } => write!(f, "{value}"),
      NodeKind::Bool { value } => write!(f, "{value}"),
      NodeKind::Str { value } => write!(f, "{value:?}"),
      NodeKind::Var { name } => write!(f, "{name}"),
      NodeKind::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
      _ => write!(f, "<{}>", self.kind_name()),
    }
  }
}
