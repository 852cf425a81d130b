//! Control-flow-graph reconstruction and cleanup.
//!
//! `convert` turns a linear, peephole-rewritten item stream into a basic
//! block graph: split at labels and control-flow-splitting opcodes, then
//! cleaned up to fixpoint (dead blocks pruned, jump chains forwarded, unused
//! labels dropped). Blocks live in an arena (`Vec<Block>`) addressed by
//! index rather than by owning reference — this sidesteps reference cycles
//! in what is otherwise a general cyclic graph.

mod build;
mod cleanup;
pub mod dump;
pub mod error;
#[cfg(test)]
mod tests;

use std::rc::Rc;

use indexmap::IndexMap;

use crate::item::{Instruction, Item, LabelName};
use crate::opcode::metadata;
pub use error::CfgError;

/// Index of a [`Block`] within the arena returned by [`convert`].
pub type BlockIdx = usize;

/// A basic block: a maximal straight-line run of items, plus its edges.
#[derive(Clone, Debug, Default)]
pub struct Block {
  pub id: u32,
  pub items: Vec<Item>,
  pub predecessors: Vec<BlockIdx>,
  pub successors: Vec<BlockIdx>,
}

impl Block {
  fn new(id: u32) -> Self {
    Block {
      id,
      items: Vec::new(),
      predecessors: Vec::new(),
      successors: Vec::new(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn label(&self) -> Option<&LabelName> {
    self.items.first().and_then(Item::as_label)
  }

  pub fn last_instruction(&self) -> Option<&Instruction> {
    self.items.last().and_then(Item::as_instruction)
  }

  fn add_successor(&mut self, to: BlockIdx) {
    if !self.successors.contains(&to) {
      self.successors.push(to);
    }
  }

  fn add_predecessor(&mut self, from: BlockIdx) {
    if !self.predecessors.contains(&from) {
      self.predecessors.push(from);
    }
  }
}

/// Tunables for [`convert`]'s fixpoint loop.
///
/// These are the only knobs this crate exposes; there is no config file or
/// environment-variable surface, just small, explicit, struct-driven state
/// passed in by the caller.
#[derive(Clone, Copy, Debug)]
pub struct ConvertOptions {
  /// Upper bound on Phase-B outer iterations (including Phase-A restarts).
  /// Exceeding it is an internal invariant violation, not a silent
  /// truncation — "typical procedures converge in a handful of iterations."
  pub max_iterations: usize,
}

impl Default for ConvertOptions {
  fn default() -> Self {
    ConvertOptions { max_iterations: 1024 }
  }
}

/// CFG-local working state, owned exclusively for the duration of one
/// `convert` call.
pub(crate) struct Cfg {
  pub blocks: Vec<Block>,
  pub labels: IndexMap<LabelName, BlockIdx>,
  pub label_references: IndexMap<LabelName, usize>,
  pub alias: IndexMap<LabelName, LabelName>,
  pub try_stack: Vec<BlockIdx>,
  next_id: u32,
  origin: Rc<str>,
}

impl Cfg {
  pub(crate) fn resolve_alias(&self, name: &LabelName) -> LabelName {
    let mut current = name.clone();
    while let Some(canonical) = self.alias.get(&current) {
      if *canonical == current {
        break;
      }
      current = canonical.clone();
    }
    current
  }

  pub(crate) fn fresh_id(&mut self) -> u32 {
    let id = self.next_id;
    self.next_id += 1;
    id
  }
}

/// Splits `stream` into basic blocks and cleans the resulting graph up to
/// fixpoint.
pub fn convert(stream: Vec<Item>, origin_name: &str, options: ConvertOptions) -> Result<Vec<Block>, CfgError> {
  let origin: Rc<str> = Rc::from(origin_name);
  let mut cfg = build::split(stream, origin.clone(), 0)?;
  cleanup::run_to_fixpoint(&mut cfg, &options)?;
  Ok(cfg.blocks)
}

pub(crate) fn recompute_label_references(cfg: &mut Cfg) {
  for count in cfg.label_references.values_mut() {
    *count = 0;
  }
}

pub(crate) fn metadata_of(item: &Item) -> Option<crate::opcode::OpcodeInfo> {
  item.opcode().map(metadata)
}
