//! Semantic analysis: one pre-order walk over the tree.
//!
//! Every node kind has exactly one `check_*` function, dispatched from
//! `visit_node`. A check runs its local tests against the tables in
//! `Context`, then recurses into its children whether or not those tests
//! passed, so a single run reports every independent defect. The walk also
//! writes the inferred type of each node into its `ty` slot; it never
//! changes the shape of the tree.
//!
//! A type check is skipped when either side is `Undefined`. That type only
//! appears where something else already went wrong (an unknown callee, an
//! undeclared name, a missing return type) and has been reported there.

use std::collections::BTreeSet;

use crate::ast::{AstNode, BinaryOp, Field, NodeKind, Param};
use crate::config::CompilerConf;
use crate::consteval::const_eval;
use crate::diagnostic::{DeclKind, DiagnosticKind, DiagnosticSink, NodeRef};
use crate::symbol::{FunctionSignature, FunctionTable, StructTable, SymbolKind, SymbolTable};
use crate::ty::DeclaredType;

/// Everything one analysis run reads and writes. Created per run and
/// threaded by reference through the walk.
#[derive(Debug)]
pub struct Context {
  pub symbols: SymbolTable,
  pub functions: FunctionTable,
  pub structs: StructTable,
  pub diagnostics: DiagnosticSink,
  max_depth: usize,
  next_node: usize,
  depth_reported: bool,
}

impl Context {
  pub fn new(conf: &CompilerConf) -> Self {
    Self {
      symbols: SymbolTable::new(),
      functions: FunctionTable::default(),
      structs: StructTable::default(),
      diagnostics: DiagnosticSink::new(),
      max_depth: conf.max_depth,
      next_node: 0,
      depth_reported: false,
    }
  }

  fn next_ref(&mut self) -> NodeRef {
    let node = NodeRef(self.next_node);
    self.next_node += 1;
    node
  }

  fn report(&mut self, node: NodeRef, kind: DiagnosticKind) {
    self.diagnostics.report(node, kind);
  }
}

/// The function whose body is being walked, for checking `return`.
#[derive(Debug, Clone)]
pub struct FunctionFrame {
  pub name: String,
  pub ret: DeclaredType,
}

/// Whether a block opens its own scope or reuses the one already open.
/// A function body shares the scope its parameters were declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockScope {
  Open,
  Shared,
}

/// Analyze `root` with fresh tables and return the diagnostics.
pub fn analyze(root: &mut AstNode, conf: &CompilerConf) -> DiagnosticSink {
  let mut ctx = Context::new(conf);
  analyze_in(&mut ctx, root);
  ctx.diagnostics
}

/// Analyze `root` into an existing context, leaving the tables for
/// inspection afterwards.
pub fn analyze_in(ctx: &mut Context, root: &mut AstNode) {
  visit(root, ctx, None, 1);
  log::debug!(
    "analyzed {} node(s), {} diagnostic(s)",
    ctx.next_node,
    ctx.diagnostics.count()
  );
}

/// Where the walk currently stands: the node being checked, the function
/// whose body encloses it, and the depth its children sit at.
#[derive(Clone, Copy)]
struct Step<'f> {
  id: NodeRef,
  frame: Option<&'f FunctionFrame>,
  child: usize,
}

fn visit(node: &mut AstNode, ctx: &mut Context, frame: Option<&FunctionFrame>, depth: usize) {
  visit_node(node, ctx, frame, depth, BlockScope::Open);
}

/// Numbers the node, decorates it and hands it to the check for its kind.
/// Each kind's checks live in their own function so that one level of the
/// walk only costs the stack of the kind actually being visited.
fn visit_node(
  node: &mut AstNode,
  ctx: &mut Context,
  frame: Option<&FunctionFrame>,
  depth: usize,
  scoping: BlockScope,
) {
  let id = ctx.next_ref();

  if depth > ctx.max_depth {
    skip_subtree(node, id, ctx);
    return;
  }

  node.ty = Some(infer(node, ctx));
  let step = Step {
    id,
    frame,
    child: depth + 1,
  };

  match &mut node.kind {
    NodeKind::Int { .. } | NodeKind::Bool { .. } | NodeKind::Str { .. } => {}
    NodeKind::Var { name } => check_var(name, ctx, step),
    NodeKind::Binary { op, lhs, rhs } => check_binary(*op, lhs, rhs, ctx, step),
    NodeKind::VarDecl {
      name,
      declared,
      init,
    } => check_var_decl(name, declared, init.as_deref_mut(), ctx, step),
    NodeKind::Assign { name, value } => check_assign(name, value, ctx, step),
    NodeKind::FuncDecl {
      name,
      params,
      return_type,
      body,
    } => check_function(name, params, return_type, body, ctx, step),
    NodeKind::Call { name, args } => check_call(name, args, ctx, step),
    NodeKind::ControlFlow {
      condition, body, ..
    } => check_control_flow(condition, body, ctx, step),
    NodeKind::Return { value } => check_return(value.as_deref_mut(), ctx, step),
    NodeKind::ArrayDecl {
      name,
      element,
      size,
      init,
    } => check_array_decl(name, element, size, init.as_deref_mut(), ctx, step),
    NodeKind::ArrayAccess { name, index } => check_array_access(name, index, ctx, step),
    NodeKind::StructDecl { name, fields } => check_struct(name, fields, ctx, step),
    NodeKind::Block { stmts } => check_block(stmts, scoping, ctx, step),
  }
}

/// A node past the depth limit: report once, and count the nodes below it
/// without walking them so later references keep their pre-order index.
fn skip_subtree(node: &mut AstNode, id: NodeRef, ctx: &mut Context) {
  if !ctx.depth_reported {
    ctx.depth_reported = true;
    ctx.report(
      id,
      DiagnosticKind::RecursionLimitExceeded {
        limit: ctx.max_depth,
      },
    );
  }
  node.ty = Some(DeclaredType::Undefined);
  ctx.next_node += node.subtree_len() - 1;
}

fn check_var(name: &str, ctx: &mut Context, step: Step) {
  if ctx.symbols.lookup(name).is_none() {
    ctx.report(
      step.id,
      DiagnosticKind::UndeclaredIdentifier {
        name: name.to_string(),
      },
    );
  }
}

fn check_binary(
  op: BinaryOp,
  lhs: &mut AstNode,
  rhs: &mut AstNode,
  ctx: &mut Context,
  step: Step,
) {
  for operand in [&*lhs, &*rhs] {
    let found = infer(operand, ctx);
    if !found.is_undefined() && !found.is_numeric() {
      ctx.report(
        step.id,
        DiagnosticKind::InvalidOperand {
          op: op.symbol(),
          found,
        },
      );
    }
  }
  visit(lhs, ctx, step.frame, step.child);
  visit(rhs, ctx, step.frame, step.child);
}

fn check_var_decl(
  name: &str,
  declared: &DeclaredType,
  init: Option<&mut AstNode>,
  ctx: &mut Context,
  step: Step,
) {
  let duplicate = ctx.symbols.is_declared_locally(name);
  if duplicate {
    ctx.report(
      step.id,
      DiagnosticKind::DuplicateDeclaration {
        what: DeclKind::Variable,
        name: name.to_string(),
      },
    );
  }
  check_known_type(declared, step.id, ctx);
  if let Some(init) = init {
    let found = infer(init, ctx);
    if mismatch(declared, &found) {
      ctx.report(
        step.id,
        DiagnosticKind::TypeMismatch {
          name: name.to_string(),
          expected: declared.clone(),
          found,
        },
      );
    }
    visit(init, ctx, step.frame, step.child);
  }
  if !duplicate {
    ctx
      .symbols
      .declare(name, declared.clone(), SymbolKind::Variable);
  }
}

fn check_assign(name: &str, value: &mut AstNode, ctx: &mut Context, step: Step) {
  // The target's type is unknown when it was never declared, so there is
  // nothing to compare the value against.
  match ctx.symbols.lookup(name).map(|symbol| symbol.ty.clone()) {
    None => ctx.report(
      step.id,
      DiagnosticKind::UndeclaredIdentifier {
        name: name.to_string(),
      },
    ),
    Some(expected) => {
      let found = infer(value, ctx);
      if mismatch(&expected, &found) {
        ctx.report(
          step.id,
          DiagnosticKind::TypeMismatch {
            name: name.to_string(),
            expected,
            found,
          },
        );
      }
    }
  }
  visit(value, ctx, step.frame, step.child);
}

fn check_function(
  name: &str,
  params: &[Param],
  return_type: &DeclaredType,
  body: &mut AstNode,
  ctx: &mut Context,
  step: Step,
) {
  let id = step.id;
  if ctx.functions.contains(name) {
    ctx.report(
      id,
      DiagnosticKind::DuplicateDeclaration {
        what: DeclKind::Function,
        name: name.to_string(),
      },
    );
  }
  if return_type.is_undefined() {
    ctx.report(
      id,
      DiagnosticKind::MissingReturnType {
        function: name.to_string(),
      },
    );
  }
  for param in repeated_names(params.iter().map(|p| p.name.as_str())) {
    ctx.report(
      id,
      DiagnosticKind::DuplicateParameter {
        function: name.to_string(),
        param,
      },
    );
  }
  for param in params {
    check_known_type(&param.ty, id, ctx);
  }
  if !body.is_block() {
    ctx.report(
      id,
      DiagnosticKind::MalformedBody {
        function: name.to_string(),
      },
    );
  }

  // Registered before the body is walked so recursive calls resolve.
  ctx.functions.insert(name, signature_of(params, return_type));

  let frame = FunctionFrame {
    name: name.to_string(),
    ret: return_type.clone(),
  };
  ctx.symbols.enter_scope();
  for Param { name, ty } in params {
    ctx.symbols.declare(name, ty.clone(), SymbolKind::Parameter);
  }
  visit_node(body, ctx, Some(&frame), step.child, BlockScope::Shared);
  ctx.symbols.exit_scope();
}

fn check_call(name: &str, args: &mut [AstNode], ctx: &mut Context, step: Step) {
  match ctx.functions.get(name).cloned() {
    None => ctx.report(
      step.id,
      DiagnosticKind::UndeclaredFunction {
        name: name.to_string(),
      },
    ),
    Some(signature) if signature.params.len() != args.len() => ctx.report(
      step.id,
      DiagnosticKind::ArityMismatch {
        function: name.to_string(),
        expected: signature.params.len(),
        found: args.len(),
      },
    ),
    Some(signature) => {
      for (position, (arg, expected)) in args.iter().zip(signature.params).enumerate() {
        let found = infer(arg, ctx);
        if mismatch(&expected, &found) {
          ctx.report(
            step.id,
            DiagnosticKind::ArgumentTypeMismatch {
              function: name.to_string(),
              position,
              expected,
              found,
            },
          );
        }
      }
    }
  }
  for arg in args {
    visit(arg, ctx, step.frame, step.child);
  }
}

fn check_control_flow(
  condition: &mut AstNode,
  body: &mut AstNode,
  ctx: &mut Context,
  step: Step,
) {
  let found = infer(condition, ctx);
  if !found.is_undefined() && found != DeclaredType::Boolean {
    ctx.report(step.id, DiagnosticKind::NonBooleanCondition { found });
  }
  visit(condition, ctx, step.frame, step.child);
  visit(body, ctx, step.frame, step.child);
}

fn check_return(value: Option<&mut AstNode>, ctx: &mut Context, step: Step) {
  match step.frame {
    None => ctx.report(step.id, DiagnosticKind::ReturnOutsideFunction),
    Some(frame) if frame.ret.is_undefined() => {}
    Some(frame) => {
      let found = value.as_deref().map(|value| infer(value, ctx));
      let wrong = match &found {
        None => true,
        Some(found) => mismatch(&frame.ret, found),
      };
      if wrong {
        ctx.report(
          step.id,
          DiagnosticKind::ReturnTypeMismatch {
            function: frame.name.clone(),
            expected: frame.ret.clone(),
            found,
          },
        );
      }
    }
  }
  if let Some(value) = value {
    visit(value, ctx, step.frame, step.child);
  }
}

/// Folding budget for a constant child: the levels left before the limit.
fn fold_budget(ctx: &Context, step: Step) -> usize {
  ctx.max_depth.saturating_add(1).saturating_sub(step.child)
}

fn check_array_decl(
  name: &str,
  element: &DeclaredType,
  size: &mut AstNode,
  init: Option<&mut AstNode>,
  ctx: &mut Context,
  step: Step,
) {
  let duplicate = ctx.symbols.is_declared_locally(name);
  if duplicate {
    ctx.report(
      step.id,
      DiagnosticKind::DuplicateDeclaration {
        what: DeclKind::Array,
        name: name.to_string(),
      },
    );
  }
  check_known_type(element, step.id, ctx);

  let len = const_eval(size, fold_budget(ctx, step));
  let valid_len = len.filter(|len| *len > 0);
  if valid_len.is_none() {
    ctx.report(
      step.id,
      DiagnosticKind::InvalidArraySize {
        name: name.to_string(),
        size: len,
      },
    );
  }

  if let Some(init) = init.as_deref() {
    let found = infer(init, ctx);
    if mismatch(element, &found) {
      ctx.report(
        step.id,
        DiagnosticKind::TypeMismatch {
          name: name.to_string(),
          expected: element.clone(),
          found,
        },
      );
    }
  }

  visit(size, ctx, step.frame, step.child);
  if let Some(init) = init {
    visit(init, ctx, step.frame, step.child);
  }
  if !duplicate {
    ctx
      .symbols
      .declare(name, element.clone(), SymbolKind::Array { len: valid_len });
  }
}

fn check_array_access(name: &str, index: &mut AstNode, ctx: &mut Context, step: Step) {
  let len = match ctx.symbols.lookup(name).map(|symbol| &symbol.kind) {
    None => {
      ctx.report(
        step.id,
        DiagnosticKind::UndeclaredIdentifier {
          name: name.to_string(),
        },
      );
      None
    }
    Some(SymbolKind::Array { len }) => *len,
    Some(_) => {
      ctx.report(
        step.id,
        DiagnosticKind::NotAnArray {
          name: name.to_string(),
        },
      );
      None
    }
  };

  // Constant indices follow the array-size rule: they must be positive.
  // Index `len` is the last element.
  let found = infer(index, ctx);
  if !found.is_undefined() && !found.is_numeric() {
    ctx.report(
      step.id,
      DiagnosticKind::InvalidIndexExpression {
        name: name.to_string(),
        found,
        value: None,
      },
    );
  } else if let Some(value) = const_eval(index, fold_budget(ctx, step))
    && (value <= 0 || len.is_some_and(|len| value > len))
  {
    ctx.report(
      step.id,
      DiagnosticKind::InvalidIndexExpression {
        name: name.to_string(),
        found,
        value: Some(value),
      },
    );
  }

  visit(index, ctx, step.frame, step.child);
}

fn check_struct(name: &str, fields: &[Field], ctx: &mut Context, step: Step) {
  if ctx.structs.contains(name) {
    ctx.report(
      step.id,
      DiagnosticKind::DuplicateDeclaration {
        what: DeclKind::Struct,
        name: name.to_string(),
      },
    );
  }
  for field in repeated_names(fields.iter().map(|f| f.name.as_str())) {
    ctx.report(
      step.id,
      DiagnosticKind::DuplicateField {
        structure: name.to_string(),
        field,
      },
    );
  }
  ctx.structs.insert(name, fields.to_vec());
  for Field { ty, .. } in fields {
    check_known_type(ty, step.id, ctx);
  }
}

fn check_block(stmts: &mut [AstNode], scoping: BlockScope, ctx: &mut Context, step: Step) {
  if scoping == BlockScope::Open {
    ctx.symbols.enter_scope();
  }
  for stmt in stmts {
    visit(stmt, ctx, step.frame, step.child);
  }
  if scoping == BlockScope::Open {
    ctx.symbols.exit_scope();
  }
}

/// Type of an expression as seen from the current tables. Statements have
/// no value and infer to `Undefined`.
fn infer(node: &AstNode, ctx: &Context) -> DeclaredType {
  let symbol_ty = |name: &str| {
    ctx
      .symbols
      .lookup(name)
      .map(|symbol| symbol.ty.clone())
      .unwrap_or(DeclaredType::Undefined)
  };

  match &node.kind {
    NodeKind::Int { .. } | NodeKind::Binary { .. } => DeclaredType::Integer,
    NodeKind::Bool { .. } => DeclaredType::Boolean,
    NodeKind::Str { .. } => DeclaredType::String,
    NodeKind::Var { name } | NodeKind::Assign { name, .. } => symbol_ty(name),
    NodeKind::Call { name, .. } => ctx
      .functions
      .get(name)
      .map(|signature| signature.ret.clone())
      .unwrap_or(DeclaredType::Undefined),
    NodeKind::ArrayAccess { name, .. } => match ctx.symbols.lookup(name) {
      Some(symbol) if matches!(symbol.kind, SymbolKind::Array { .. }) => symbol.ty.clone(),
      _ => DeclaredType::Undefined,
    },
    NodeKind::VarDecl { .. }
    | NodeKind::FuncDecl { .. }
    | NodeKind::ControlFlow { .. }
    | NodeKind::Return { .. }
    | NodeKind::ArrayDecl { .. }
    | NodeKind::StructDecl { .. }
    | NodeKind::Block { .. } => DeclaredType::Undefined,
  }
}

fn mismatch(expected: &DeclaredType, found: &DeclaredType) -> bool {
  !expected.is_undefined() && !found.is_undefined() && !expected.is_compatible(found)
}

fn check_known_type(ty: &DeclaredType, id: NodeRef, ctx: &mut Context) {
  if let Some(name) = ty.struct_name()
    && !ctx.structs.contains(name)
  {
    ctx.report(
      id,
      DiagnosticKind::UnknownType {
        name: name.to_string(),
      },
    );
  }
}

fn signature_of(params: &[Param], ret: &DeclaredType) -> FunctionSignature {
  FunctionSignature {
    params: params.iter().map(|p| p.ty.clone()).collect(),
    ret: ret.clone(),
  }
}

/// Every name that repeats an earlier one, in order. A name appearing three
/// times is yielded twice.
fn repeated_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
  let mut seen = BTreeSet::new();
  names
    .filter(|name| !seen.insert(*name))
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run(root: &mut AstNode) -> DiagnosticSink {
    analyze(root, &CompilerConf::default())
  }

  fn int_decl(name: &str, value: i64) -> AstNode {
    AstNode::var_decl(name, DeclaredType::Integer, Some(AstNode::number(value)))
  }

  #[test]
  fn decorates_expression_types() {
    let mut root = AstNode::block(vec![
      int_decl("x", 1),
      AstNode::binary(BinaryOp::Add, AstNode::var("x"), AstNode::number(2)),
    ]);
    assert!(run(&mut root).is_empty());

    let NodeKind::Block { stmts } = &root.kind else {
      panic!("root is a block");
    };
    assert_eq!(stmts[0].ty, Some(DeclaredType::Undefined));
    assert_eq!(stmts[1].ty, Some(DeclaredType::Integer));
    let NodeKind::Binary { lhs, .. } = &stmts[1].kind else {
      panic!("second statement is binary");
    };
    assert_eq!(lhs.ty, Some(DeclaredType::Integer));
  }

  #[test]
  fn node_refs_are_preorder_indices() {
    // #0 block, #1 decl x, #2 literal, #3 decl x, #4 literal
    let mut root = AstNode::block(vec![int_decl("x", 1), int_decl("x", 2)]);
    let sink = run(&mut root);
    assert_eq!(sink.count(), 1);
    assert_eq!(sink.as_slice()[0].node, NodeRef(3));
  }

  #[test]
  fn inner_block_may_shadow() {
    let mut root = AstNode::block(vec![
      int_decl("x", 1),
      AstNode::block(vec![AstNode::var_decl(
        "x",
        DeclaredType::Boolean,
        Some(AstNode::boolean(true)),
      )]),
      AstNode::assign("x", AstNode::number(3)),
    ]);
    assert!(run(&mut root).is_empty());
  }

  #[test]
  fn block_locals_do_not_leak() {
    let mut root = AstNode::block(vec![
      AstNode::block(vec![int_decl("y", 1)]),
      AstNode::assign("y", AstNode::number(2)),
    ]);
    assert_eq!(run(&mut root).codes(), vec!["undeclared-identifier"]);
  }

  #[test]
  fn assignment_to_undeclared_skips_type_check() {
    let mut root = AstNode::assign("z", AstNode::string("s"));
    assert_eq!(run(&mut root).codes(), vec!["undeclared-identifier"]);
  }

  #[test]
  fn assignment_type_mismatch() {
    let mut root = AstNode::block(vec![
      int_decl("x", 1),
      AstNode::assign("x", AstNode::boolean(false)),
    ]);
    let sink = run(&mut root);
    assert_eq!(
      sink.as_slice()[0].kind,
      DiagnosticKind::TypeMismatch {
        name: "x".to_string(),
        expected: DeclaredType::Integer,
        found: DeclaredType::Boolean,
      }
    );
  }

  #[test]
  fn checks_continue_into_children() {
    // The mismatch on the declaration does not stop the walk from finding
    // the undeclared name inside its initializer.
    let mut root = AstNode::var_decl(
      "flag",
      DeclaredType::Boolean,
      Some(AstNode::binary(
        BinaryOp::Mul,
        AstNode::var("missing"),
        AstNode::number(2),
      )),
    );
    assert_eq!(
      run(&mut root).codes(),
      vec!["type-mismatch", "undeclared-identifier"]
    );
  }

  #[test]
  fn operands_must_be_numeric() {
    let mut root = AstNode::binary(BinaryOp::Add, AstNode::number(1), AstNode::string("a"));
    assert_eq!(run(&mut root).codes(), vec!["invalid-operand"]);
  }

  #[test]
  fn function_declaration_checks() {
    let mut root = AstNode::block(vec![
      AstNode::function(
        "f",
        vec![
          Param::new("a", DeclaredType::Integer),
          Param::new("a", DeclaredType::Integer),
        ],
        DeclaredType::Undefined,
        AstNode::ret(Some(AstNode::number(1))),
      ),
      AstNode::function(
        "f",
        vec![],
        DeclaredType::Integer,
        AstNode::block(vec![]),
      ),
    ]);
    assert_eq!(
      run(&mut root).codes(),
      vec![
        "missing-return-type",
        "duplicate-parameter",
        "malformed-body",
        "duplicate-declaration",
      ]
    );
  }

  #[test]
  fn parameters_are_in_scope_and_recursion_resolves() {
    let mut root = AstNode::function(
      "fact",
      vec![Param::new("n", DeclaredType::Integer)],
      DeclaredType::Integer,
      AstNode::block(vec![AstNode::ret(Some(AstNode::binary(
        BinaryOp::Mul,
        AstNode::var("n"),
        AstNode::call(
          "fact",
          vec![AstNode::binary(
            BinaryOp::Sub,
            AstNode::var("n"),
            AstNode::number(1),
          )],
        ),
      )))]),
    );
    assert!(run(&mut root).is_empty());
  }

  #[test]
  fn function_body_shares_parameter_scope() {
    let mut root = AstNode::function(
      "f",
      vec![Param::new("a", DeclaredType::Integer)],
      DeclaredType::Integer,
      AstNode::block(vec![int_decl("a", 2), AstNode::ret(Some(AstNode::var("a")))]),
    );
    assert_eq!(run(&mut root).codes(), vec!["duplicate-declaration"]);
  }

  #[test]
  fn return_checks_use_enclosing_function() {
    let mut root = AstNode::block(vec![
      AstNode::function(
        "outer",
        vec![],
        DeclaredType::Boolean,
        AstNode::block(vec![
          AstNode::function(
            "inner",
            vec![],
            DeclaredType::Integer,
            AstNode::block(vec![AstNode::ret(Some(AstNode::number(1)))]),
          ),
          AstNode::ret(Some(AstNode::number(2))),
          AstNode::ret(None),
        ]),
      ),
      AstNode::ret(Some(AstNode::number(3))),
    ]);
    let sink = run(&mut root);
    assert_eq!(
      sink.codes(),
      vec![
        "return-type-mismatch",
        "return-type-mismatch",
        "return-outside-function",
      ]
    );
    assert_eq!(
      sink.as_slice()[1].kind,
      DiagnosticKind::ReturnTypeMismatch {
        function: "outer".to_string(),
        expected: DeclaredType::Boolean,
        found: None,
      }
    );
  }

  #[test]
  fn argument_types_checked_positionally() {
    let mut root = AstNode::block(vec![
      AstNode::function(
        "g",
        vec![
          Param::new("a", DeclaredType::Integer),
          Param::new("b", DeclaredType::String),
        ],
        DeclaredType::Boolean,
        AstNode::block(vec![AstNode::ret(Some(AstNode::boolean(true)))]),
      ),
      AstNode::call("g", vec![AstNode::string("x"), AstNode::number(1)]),
    ]);
    let sink = run(&mut root);
    assert_eq!(
      sink.codes(),
      vec!["argument-type-mismatch", "argument-type-mismatch"]
    );
    assert!(matches!(
      sink.as_slice()[1].kind,
      DiagnosticKind::ArgumentTypeMismatch { position: 1, .. }
    ));
  }

  #[test]
  fn control_flow_condition_must_be_boolean() {
    let mut root = AstNode::block(vec![
      AstNode::if_then(AstNode::number(1), AstNode::block(vec![])),
      AstNode::while_loop(AstNode::boolean(true), AstNode::block(vec![int_decl("i", 0)])),
      AstNode::while_loop(AstNode::boolean(true), AstNode::block(vec![int_decl("i", 0)])),
    ]);
    assert_eq!(run(&mut root).codes(), vec!["non-boolean-condition"]);
  }

  #[test]
  fn array_declaration_checks() {
    let mut root = AstNode::block(vec![
      AstNode::array_decl("a", DeclaredType::Integer, AstNode::number(4), None),
      AstNode::array_decl(
        "a",
        DeclaredType::Integer,
        AstNode::binary(BinaryOp::Sub, AstNode::number(1), AstNode::number(1)),
        Some(AstNode::string("s")),
      ),
      AstNode::array_decl("b", DeclaredType::Integer, AstNode::boolean(true), None),
    ]);
    let sink = run(&mut root);
    assert_eq!(
      sink.codes(),
      vec![
        "duplicate-declaration",
        "invalid-array-size",
        "type-mismatch",
        "invalid-array-size",
      ]
    );
    assert_eq!(
      sink.as_slice()[1].kind,
      DiagnosticKind::InvalidArraySize {
        name: "a".to_string(),
        size: Some(0),
      }
    );
    assert_eq!(
      sink.as_slice()[3].kind,
      DiagnosticKind::InvalidArraySize {
        name: "b".to_string(),
        size: None,
      }
    );
  }

  #[test]
  fn array_access_checks() {
    let mut root = AstNode::block(vec![
      AstNode::array_decl("a", DeclaredType::Boolean, AstNode::number(3), None),
      int_decl("n", 0),
      AstNode::var_decl(
        "ok",
        DeclaredType::Boolean,
        Some(AstNode::array_access("a", AstNode::var("n"))),
      ),
      AstNode::array_access("a", AstNode::number(1)),
      AstNode::array_access("a", AstNode::number(3)),
      AstNode::array_access("a", AstNode::number(4)),
      AstNode::array_access("a", AstNode::string("0")),
      AstNode::array_access("n", AstNode::number(1)),
      AstNode::array_access("nope", AstNode::number(1)),
    ]);
    assert_eq!(
      run(&mut root).codes(),
      vec![
        "invalid-index-expression",
        "invalid-index-expression",
        "not-an-array",
        "undeclared-identifier",
      ]
    );
  }

  #[test]
  fn constant_index_must_be_positive() {
    let mut root = AstNode::block(vec![
      AstNode::array_decl("a", DeclaredType::Integer, AstNode::number(3), None),
      AstNode::array_access("a", AstNode::number(0)),
      AstNode::array_access(
        "a",
        AstNode::binary(BinaryOp::Sub, AstNode::number(2), AstNode::number(3)),
      ),
    ]);
    let values: Vec<_> = run(&mut root)
      .into_iter()
      .map(|diag| match diag.kind {
        DiagnosticKind::InvalidIndexExpression { value, .. } => value,
        other => panic!("unexpected diagnostic {other}"),
      })
      .collect();
    assert_eq!(values, vec![Some(0), Some(-1)]);
  }

  #[test]
  fn struct_declaration_checks() {
    let mut root = AstNode::block(vec![
      AstNode::struct_decl(
        "point",
        vec![
          Field::new("x", DeclaredType::Integer),
          Field::new("x", DeclaredType::Integer),
        ],
      ),
      AstNode::struct_decl("point", vec![Field::new("owner", DeclaredType::structure("user"))]),
      AstNode::var_decl("p", DeclaredType::structure("point"), None),
      AstNode::var_decl("q", DeclaredType::structure("line"), None),
    ]);
    assert_eq!(
      run(&mut root).codes(),
      vec![
        "duplicate-field",
        "duplicate-declaration",
        "unknown-type",
        "unknown-type",
      ]
    );
  }

  fn left_sum(terms: usize) -> AstNode {
    let mut root = AstNode::number(1);
    for _ in 1..terms {
      root = AstNode::binary(BinaryOp::Add, root, AstNode::number(1));
    }
    root
  }

  #[test]
  fn depth_limit_reports_once() {
    let mut root = left_sum(11);
    let sink = analyze(&mut root, &CompilerConf::default().with_max_depth(4));
    assert_eq!(sink.codes(), vec!["recursion-limit-exceeded"]);
  }

  #[test]
  fn deep_array_size_hits_the_limit_instead_of_folding() {
    let conf = CompilerConf::default().with_max_depth(16);
    let mut root = AstNode::array_decl("a", DeclaredType::Integer, left_sum(1_000), None);
    let sink = analyze(&mut root, &conf);
    // Too deep to fold, so the size also counts as non-constant.
    assert_eq!(
      sink.codes(),
      vec!["invalid-array-size", "recursion-limit-exceeded"]
    );

    // The same size within the limit folds as usual.
    let mut root = AstNode::array_decl("a", DeclaredType::Integer, left_sum(15), None);
    assert!(analyze(&mut root, &conf).is_empty());
  }

  #[test]
  fn deep_constant_index_is_not_folded() {
    let conf = CompilerConf::default().with_max_depth(16);
    let mut root = AstNode::block(vec![
      AstNode::array_decl("a", DeclaredType::Integer, AstNode::number(2), None),
      AstNode::array_access("a", left_sum(1_000)),
    ]);
    assert_eq!(
      analyze(&mut root, &conf).codes(),
      vec!["recursion-limit-exceeded"]
    );
  }

  #[test]
  fn skipped_subtree_keeps_later_refs_preorder() {
    // #0 block, #1..#7 the sum (four literals, three operators), #8 `y`.
    let mut root = AstNode::block(vec![left_sum(4), AstNode::var("y")]);
    let sink = analyze(&mut root, &CompilerConf::default().with_max_depth(3));
    assert_eq!(
      sink.codes(),
      vec!["recursion-limit-exceeded", "undeclared-identifier"]
    );
    assert_eq!(sink.as_slice()[1].node, NodeRef(8));

    // Without a limit in the way the numbering is the same.
    let sink = run(&mut root);
    assert_eq!(sink.as_slice()[0].node, NodeRef(8));
  }

  #[test]
  fn repeated_names_yield_each_repeat() {
    let names = ["a", "b", "a", "a", "c", "b"];
    assert_eq!(repeated_names(names.into_iter()), vec!["a", "a", "b"]);
  }
}
