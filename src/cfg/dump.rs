//! Debug-dump interface.
//!
//! Off by default, synchronous, and the only boundary-crossing side effect
//! in this crate — callers opt in by calling [`dump_cfg`] explicitly. Writes
//! plain `Display`-driven text straight to a file rather than through a
//! structured serializer.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::Block;

fn sanitize(name: &str) -> String {
  name.replace('/', "_")
}

fn dump_dir() -> PathBuf {
  PathBuf::from("./cfg")
}

/// Writes `./cfg/<sanitized_name>` (block listing with successors and
/// predecessors) and `./cfg/<sanitized_name>_insts` (flattened instruction
/// listing) for `blocks`.
pub fn dump_cfg(blocks: &[Block], name: &str) -> io::Result<()> {
  let dir = dump_dir();
  fs::create_dir_all(&dir)?;

  let sanitized = sanitize(name);
  write_block_listing(&dir.join(&sanitized), blocks)?;
  write_instruction_listing(&dir.join(format!("{sanitized}_insts")), blocks)?;
  Ok(())
}

fn write_block_listing(path: &Path, blocks: &[Block]) -> io::Result<()> {
  let mut out = fs::File::create(path)?;
  for block in blocks {
    writeln!(out, "block {}:", block.id)?;
    for item in &block.items {
      writeln!(out, "  {item}")?;
    }
    writeln!(
      out,
      "  preds: [{}]",
      block.predecessors.iter().map(|b| b.to_string()).collect::<Vec<_>>().join(", ")
    )?;
    writeln!(
      out,
      "  succs: [{}]",
      block.successors.iter().map(|b| b.to_string()).collect::<Vec<_>>().join(", ")
    )?;
  }
  Ok(())
}

fn write_instruction_listing(path: &Path, blocks: &[Block]) -> io::Result<()> {
  let mut out = fs::File::create(path)?;
  for block in blocks {
    for item in &block.items {
      writeln!(out, "{item}")?;
    }
  }
  Ok(())
}
