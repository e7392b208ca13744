//! Reference executor for emitted programs.
//!
//! Runs a `Program` on the abstract target the generator emits for, so the
//! output of the generator can be checked by value instead of by text.

use snafu::Snafu;

use crate::codegen::{Instruction, Program, Register};

pub type MachineResult<T> = Result<T, MachineError>;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum MachineError {
  #[snafu(display("pop from an empty save area at instruction {pc}"))]
  StackUnderflow { pc: usize },

  #[snafu(display("division by zero at instruction {pc}"))]
  DivisionByZero { pc: usize },

  #[snafu(display("arithmetic overflow at instruction {pc}"))]
  Overflow { pc: usize },

  #[snafu(display("div at instruction {pc} is not preceded by sext"))]
  MissingDivSetup { pc: usize },

  #[snafu(display("{depth} value(s) left on the save area"))]
  UnbalancedStack { depth: usize },
}

#[derive(Debug, Default, Clone)]
pub struct Machine {
  pub acc: i64,
  pub sec: i64,
  pub wide: i64,
  stack: Vec<i64>,
  /// Deepest the save area got during the last run.
  pub max_stack: usize,
}

impl Machine {
  pub fn new() -> Self {
    Self::default()
  }

  /// Execute `program` from a clean state and return the final `acc`.
  pub fn run(&mut self, program: &Program) -> MachineResult<i64> {
    *self = Self::default();
    let mut wide_ready = false;

    for (pc, instruction) in program.iter().enumerate() {
      let mut sets_wide = false;

      match *instruction {
        Instruction::Load(value) => self.acc = value,
        Instruction::Push(reg) => {
          let value = self.read(reg);
          self.stack.push(value);
          self.max_stack = self.max_stack.max(self.stack.len());
        }
        Instruction::Pop(reg) => {
          let value = self.stack.pop().ok_or(MachineError::StackUnderflow { pc })?;
          self.write(reg, value);
        }
        Instruction::Add => {
          self.acc = self.sec.checked_add(self.acc).ok_or(MachineError::Overflow { pc })?
        }
        Instruction::Sub => {
          self.acc = self.sec.checked_sub(self.acc).ok_or(MachineError::Overflow { pc })?
        }
        Instruction::Mul => {
          self.acc = self.sec.checked_mul(self.acc).ok_or(MachineError::Overflow { pc })?
        }
        Instruction::DivSetup => {
          self.wide = if self.sec < 0 { -1 } else { 0 };
          sets_wide = true;
        }
        Instruction::Div => {
          if !wide_ready {
            return Err(MachineError::MissingDivSetup { pc });
          }
          if self.acc == 0 {
            return Err(MachineError::DivisionByZero { pc });
          }
          self.acc = self.sec.checked_div(self.acc).ok_or(MachineError::Overflow { pc })?;
        }
      }

      wide_ready = sets_wide;
    }

    if !self.stack.is_empty() {
      return Err(MachineError::UnbalancedStack {
        depth: self.stack.len(),
      });
    }

    Ok(self.acc)
  }

  fn read(&self, reg: Register) -> i64 {
    match reg {
      Register::Acc => self.acc,
      Register::Sec => self.sec,
      Register::Wide => self.wide,
    }
  }

  fn write(&mut self, reg: Register, value: i64) {
    match reg {
      Register::Acc => self.acc = value,
      Register::Sec => self.sec = value,
      Register::Wide => self.wide = value,
    }
  }
}
