//! Source locations for annotated bytecode items.
//!
//! This is a `(file, line, column)` triple rather than a byte span, because
//! the optimizer never sees the original source text — only the positions
//! the upstream emitter attached to each instruction.

use std::fmt;
use std::rc::Rc;

/// A position in some source file, as reported by the upstream emitter.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
  pub file: Rc<str>,
  pub line: u32,
  pub column: u32,
}

impl Location {
  pub fn new(file: impl Into<Rc<str>>, line: u32, column: u32) -> Self {
    Location {
      file: file.into(),
      line,
      column,
    }
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.file, self.line, self.column)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display() {
    let loc = Location::new("main.dm", 12, 4);
    assert_eq!(loc.to_string(), "main.dm:12:4");
  }
}
