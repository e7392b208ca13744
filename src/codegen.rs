//! Code generation: lower arithmetic into symbolic stack-machine assembly.
//!
//! The target has two scratch locations, `acc` and `sec`, a `wide` location
//! that holds the upper half of a dividend, and a last-in-first-out save
//! area. Every expression leaves its value in `acc`. A binary node saves its
//! left value before evaluating the right one and restores it into `sec`:
//!
//! ```text
//! <left>       acc = left
//! push acc
//! <right>      acc = right
//! pop sec      sec = left
//! <combine>    acc = sec <op> acc
//! ```
//!
//! That costs one push/pop pair per operator node and is correct for any
//! tree shape. Division emits `sext wide` ahead of `div` to prepare the
//! two-register dividend.
//!
//! Combining instructions print destination first, then the left and right
//! sources, so the operand order is visible in the text:
//!
//! ```text
//! add acc, sec, acc    acc = sec + acc
//! sub acc, sec, acc    acc = sec - acc
//! mul acc, sec, acc    acc = sec * acc
//! div acc, sec, acc    acc = sec / acc   (needs `sext wide` just before)
//! ```

use std::fmt;

use crate::ast::{AstNode, BinaryOp, NodeKind};
use crate::config::CompilerConf;
use crate::error::{CompileError, CompileResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
  Acc,
  Sec,
  Wide,
}

impl fmt::Display for Register {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Acc => "acc",
      Self::Sec => "sec",
      Self::Wide => "wide",
    })
  }
}

/// The full instruction vocabulary. Combining instructions read the left
/// operand from `sec` and the right operand from `acc`, and write `acc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
  Load(i64),
  Push(Register),
  Pop(Register),
  Add,
  Sub,
  Mul,
  /// Sign-extend `sec` into `wide`; must directly precede `Div`.
  DivSetup,
  Div,
}

impl fmt::Display for Instruction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use Register::*;

    match self {
      Self::Load(value) => write!(f, "load {Acc}, {value}"),
      Self::Push(reg) => write!(f, "push {reg}"),
      Self::Pop(reg) => write!(f, "pop {reg}"),
      Self::Add => write!(f, "add {Acc}, {Sec}, {Acc}"),
      Self::Sub => write!(f, "sub {Acc}, {Sec}, {Acc}"),
      Self::Mul => write!(f, "mul {Acc}, {Sec}, {Acc}"),
      Self::DivSetup => write!(f, "sext {Wide}"),
      Self::Div => write!(f, "div {Acc}, {Sec}, {Acc}"),
    }
  }
}

/// Linear instruction sequence produced for one expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
  pub instructions: Vec<Instruction>,
}

impl Program {
  pub fn len(&self) -> usize {
    self.instructions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.instructions.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
    self.instructions.iter()
  }
}

/// One instruction per line, four-space indented.
impl fmt::Display for Program {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for instruction in &self.instructions {
      writeln!(f, "    {instruction}")?;
    }
    Ok(())
  }
}

/// Emit code for an arithmetic tree. The tree is expected to have passed
/// semantic analysis; anything outside the arithmetic subset is an internal
/// error.
pub fn generate(node: &AstNode, conf: &CompilerConf) -> CompileResult<Program> {
  let mut code = Vec::new();
  emit_expr(node, conf, 1, &mut code)?;
  log::debug!("emitted {} instruction(s)", code.len());
  Ok(Program { instructions: code })
}

fn emit(code: &mut Vec<Instruction>, instruction: Instruction) {
  log::trace!("{instruction}");
  code.push(instruction);
}

/// Post-order emission for a single expression node.
fn emit_expr(
  node: &AstNode,
  conf: &CompilerConf,
  depth: usize,
  code: &mut Vec<Instruction>,
) -> CompileResult<()> {
  if depth > conf.max_depth {
    return Err(CompileError::RecursionLimitExceeded {
      limit: conf.max_depth,
    });
  }

  match &node.kind {
    NodeKind::Int { value } => emit(code, Instruction::Load(*value)),
    NodeKind::Binary { op, lhs, rhs } => {
      emit_expr(lhs, conf, depth + 1, code)?;
      emit(code, Instruction::Push(Register::Acc));
      emit_expr(rhs, conf, depth + 1, code)?;
      emit(code, Instruction::Pop(Register::Sec));
      match op {
        BinaryOp::Add => emit(code, Instruction::Add),
        BinaryOp::Sub => emit(code, Instruction::Sub),
        BinaryOp::Mul => emit(code, Instruction::Mul),
        BinaryOp::Div => {
          emit(code, Instruction::DivSetup);
          emit(code, Instruction::Div);
        }
      }
    }
    NodeKind::Bool { .. }
    | NodeKind::Str { .. }
    | NodeKind::Var { .. }
    | NodeKind::VarDecl { .. }
    | NodeKind::Assign { .. }
    | NodeKind::FuncDecl { .. }
    | NodeKind::Call { .. }
    | NodeKind::ControlFlow { .. }
    | NodeKind::Return { .. }
    | NodeKind::ArrayDecl { .. }
    | NodeKind::ArrayAccess { .. }
    | NodeKind::StructDecl { .. }
    | NodeKind::Block { .. } => {
      return Err(CompileError::Unsupported {
        kind: node.kind_name(),
      });
    }
  }

  Ok(())
}
