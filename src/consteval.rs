//! Constant expression evaluator.
//!
//! Folds the arithmetic subset of the tree into a compile-time value. Used
//! by the analyzer to validate array sizes and constant indices; anything
//! that is not a literal or an operator over literals is not constant.

use crate::ast::{AstNode, BinaryOp, NodeKind};

/// Returns `None` when the expression is not constant, when evaluating it
/// would overflow or divide by zero, or when it nests more than `max_depth`
/// levels deep (the node itself counts as one level).
pub fn const_eval(node: &AstNode, max_depth: usize) -> Option<i64> {
  let below = max_depth.checked_sub(1)?;
  match &node.kind {
    NodeKind::Int { value } => Some(*value),
    NodeKind::Binary { op, lhs, rhs } => {
      let lhs = const_eval(lhs, below)?;
      let rhs = const_eval(rhs, below)?;
      match op {
        BinaryOp::Add => lhs.checked_add(rhs),
        BinaryOp::Sub => lhs.checked_sub(rhs),
        BinaryOp::Mul => lhs.checked_mul(rhs),
        BinaryOp::Div => lhs.checked_div(rhs),
      }
    }
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn bin(op: BinaryOp, lhs: i64, rhs: i64) -> AstNode {
    AstNode::binary(op, AstNode::number(lhs), AstNode::number(rhs))
  }

  #[test]
  fn folds_arithmetic() {
    assert_eq!(const_eval(&bin(BinaryOp::Mul, 4, 5), 8), Some(20));
    assert_eq!(const_eval(&bin(BinaryOp::Sub, 1, 5), 8), Some(-4));
  }

  #[test]
  fn rejects_non_constant_and_faults() {
    assert_eq!(const_eval(&bin(BinaryOp::Div, 1, 0), 8), None);
    assert_eq!(const_eval(&bin(BinaryOp::Add, i64::MAX, 1), 8), None);
    assert_eq!(const_eval(&AstNode::var("n"), 8), None);
    assert_eq!(
      const_eval(
        &AstNode::binary(BinaryOp::Add, AstNode::number(1), AstNode::var("n")),
        8
      ),
      None
    );
  }

  #[test]
  fn gives_up_past_the_depth_budget() {
    let mut deep = AstNode::number(1);
    for _ in 0..9 {
      deep = AstNode::binary(BinaryOp::Add, deep, AstNode::number(1));
    }
    // Ten levels: nine operators over the innermost literal.
    assert_eq!(const_eval(&deep, 10), Some(10));
    assert_eq!(const_eval(&deep, 9), None);
    assert_eq!(const_eval(&AstNode::number(3), 0), None);
  }
}
