//! Crate root: wires together the compilation pipeline.
//!
//! - `tokenizer` turns source text into tokens behind the `TokenSource` trait.
//! - `parser` builds the arithmetic AST by precedence climbing.
//! - `ast` and `ty` are the tree and type vocabulary both passes share.
//! - `sema` walks the tree once, decorating types and collecting diagnostics.
//! - `codegen` lowers a clean arithmetic tree to stack-machine instructions.
//! - `machine` executes those instructions, mostly for testing.
//!
//! Diagnostics gate code generation: a tree with any semantic error never
//! reaches the generator.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod consteval;
pub mod diagnostic;
pub mod error;
pub mod machine;
pub mod parser;
pub mod sema;
pub mod symbol;
pub mod tokenizer;
pub mod ty;

pub use ast::AstNode;
pub use codegen::{Instruction, Program, Register};
pub use config::CompilerConf;
pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink};
pub use error::{CompileError, CompileResult};
pub use ty::DeclaredType;

use tokenizer::TokenStream;

/// A successfully compiled expression: the decorated tree and its code.
#[derive(Debug, Clone)]
pub struct Compilation {
  pub ast: AstNode,
  pub program: Program,
}

/// Analyze an already-built tree and, if it is clean, generate code for it.
pub fn lower(ast: &mut AstNode, conf: &CompilerConf) -> CompileResult<Program> {
  let diagnostics = sema::analyze(ast, conf);
  if !diagnostics.is_empty() {
    return Err(CompileError::Semantic {
      diagnostics: diagnostics.into_vec(),
    });
  }
  codegen::generate(ast, conf)
}

/// Run the whole pipeline over a source string.
pub fn compile(expr: &str, conf: &CompilerConf) -> CompileResult<Compilation> {
  let mut stream = TokenStream::from_source(expr)?;
  let mut ast = parser::parse(&mut stream, conf)?;
  let program = lower(&mut ast, conf)?;
  Ok(Compilation { ast, program })
}

/// Compile a source string into assembly text.
pub fn generate_assembly(expr: &str) -> CompileResult<String> {
  compile(expr, &CompilerConf::default()).map(|compiled| compiled.program.to_string())
}
