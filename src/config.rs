//! Settings shared by every stage of a compilation run.

/// Deepest tree the parser will build and the later passes will walk. Sized
/// so an unoptimised build walks a tree this deep on a 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerConf {
  /// Maximum nesting depth of the AST. Every pass is a direct recursive
  /// walk, so this bounds host stack usage.
  pub max_depth: usize,
}

impl CompilerConf {
  pub fn with_max_depth(mut self, max_depth: usize) -> Self {
    self.max_depth = max_depth;
    self
  }
}

impl Default for CompilerConf {
  fn default() -> Self {
    Self {
      max_depth: DEFAULT_MAX_DEPTH,
    }
  }
}
