//! Phase B — Fixpoint cleanup.
//!
//! Repeats the eight numbered steps until an iteration makes no change,
//! rebuilding the label table between iterations (and, if a label ended up
//! out of position or an unreferenced label was dropped, re-splitting from
//! scratch via Phase A).

use super::build;
use super::{BlockIdx, Cfg, CfgError, ConvertOptions};
use crate::item::{Item, LabelName};
use crate::opcode::{metadata, Opcode};

pub(crate) fn run_to_fixpoint(cfg: &mut Cfg, options: &ConvertOptions) -> Result<(), CfgError> {
  let mut iterations = 0usize;
  loop {
    iterations += 1;
    if iterations > options.max_iterations {
      panic!(
        "cfg cleanup for `{}` did not converge within {} iterations — internal invariant violation",
        cfg.origin, options.max_iterations
      );
    }
    log::debug!(
      "cfg[{}]: iteration {iterations}: {} block(s), {} label(s)",
      cfg.origin,
      cfg.blocks.len(),
      cfg.labels.len()
    );

    let mut changed = false;
    changed |= remove_empty_blocks(cfg);
    linear_connect(cfg);
    changed |= resolve_jumps(cfg)?;
    renumber(cfg);
    changed |= forward_jumps(cfg);
    changed |= remove_unreachable_blocks(cfg);
    renumber(cfg);
    let labels_removed = remove_unreferenced_labels(cfg);
    changed |= labels_removed;

    if !changed {
      log::debug!("cfg[{}]: converged after {iterations} iteration(s)", cfg.origin);
      return Ok(());
    }

    let mislabeled = rebuild_label_table_and_clear_edges(cfg);

    if labels_removed || mislabeled {
      log::trace!("cfg[{}]: restarting from Phase A (labels_removed={labels_removed}, mislabeled={mislabeled})", cfg.origin);
      let flattened = flatten(cfg);
      let base = cfg.next_id;
      let origin = cfg.origin.clone();
      *cfg = build::split(flattened, origin, base)?;
    }
  }
}

/// Step 1 — remove empty blocks (except the entry), retargeting any labels
/// that pointed at them to the next block in layout order.
fn remove_empty_blocks(cfg: &mut Cfg) -> bool {
  let mut changed = false;
  let mut i = 1;
  while i < cfg.blocks.len() {
    if !cfg.blocks[i].is_empty() {
      i += 1;
      continue;
    }
    if i + 1 < cfg.blocks.len() {
      for idx in cfg.labels.values_mut() {
        if *idx == i {
          *idx = i + 1;
        }
      }
    } else {
      cfg.labels.retain(|_, idx| *idx != i);
    }
    cfg.blocks.remove(i);
    for idx in cfg.labels.values_mut() {
      if *idx > i {
        *idx -= 1;
      }
    }
    changed = true;
  }
  changed
}

/// Step 2 — the speculative naive CFG, refined by step 3.
fn linear_connect(cfg: &mut Cfg) {
  let n = cfg.blocks.len();
  for i in 0..n.saturating_sub(1) {
    cfg.blocks[i].add_successor(i + 1);
    cfg.blocks[i + 1].add_predecessor(i);
  }
}

/// Step 3 — resolve jumps, tries, throws, and calls; returns whether any
/// jump argument was rewritten to its canonical form.
fn resolve_jumps(cfg: &mut Cfg) -> Result<bool, CfgError> {
  cfg.try_stack.clear();
  super::recompute_label_references(cfg);

  let mut changed = false;
  let n = cfg.blocks.len();

  for i in 0..n {
    let len = cfg.blocks[i].items.len();
    for j in 0..len {
      let opcode = match cfg.blocks[i].items[j].as_instruction() {
        Some(instr) => instr.opcode,
        None => continue,
      };
      let info = metadata(opcode);
      let is_last = j + 1 == len;

      if info.splits_basic_block && !is_last {
        return Err(CfgError::SplitNotLast {
          origin: cfg.origin.clone(),
          opcode: opcode.to_string(),
        });
      }

      if opcode.label_in_arg0() {
        let (target, rewrote) = resolve_label_arg(cfg, i, j, 0)?;
        add_edge(cfg, i, target);
        changed |= rewrote;
      } else if opcode.label_in_arg1() {
        let (target, rewrote) = resolve_label_arg(cfg, i, j, 1)?;
        add_edge(cfg, i, target);
        changed |= rewrote;
      } else if opcode == Opcode::Jump {
        let (target, rewrote) = resolve_label_arg(cfg, i, j, 0)?;
        remove_fallthrough(cfg, i);
        add_edge(cfg, i, target);
        changed |= rewrote;
      } else if opcode == Opcode::Return {
        if i != n - 1 {
          remove_fallthrough(cfg, i);
        }
      } else if opcode == Opcode::Throw {
        remove_fallthrough(cfg, i);
        if let Some(&catch) = cfg.try_stack.last() {
          add_edge(cfg, i, catch);
        }
      } else if opcode.is_call() {
        if let Some(&catch) = cfg.try_stack.last() {
          add_edge(cfg, i, catch);
        }
      } else if matches!(opcode, Opcode::Try | Opcode::TryNoValue) {
        let (target, _rewrote) = resolve_label_arg(cfg, i, j, 0)?;
        cfg.try_stack.push(target);
      } else if opcode == Opcode::EndTry {
        cfg.try_stack.pop();
      } else if info.splits_basic_block {
        return Err(CfgError::UnclassifiedSplittingOpcode {
          origin: cfg.origin.clone(),
          opcode: opcode.to_string(),
        });
      }
    }
  }

  Ok(changed)
}

/// Resolves the label at `block.items[item_idx].args[arg_idx]` through the
/// alias table, rewriting it to canonical form in place if needed, and
/// counts the reference. Returns the resolved block and whether a rewrite
/// happened.
fn resolve_label_arg(
  cfg: &mut Cfg,
  block: BlockIdx,
  item_idx: usize,
  arg_idx: usize,
) -> Result<(BlockIdx, bool), CfgError> {
  let original: LabelName = cfg.blocks[block].items[item_idx]
    .as_instruction()
    .expect("resolve_label_arg called on a non-instruction item")
    .args[arg_idx]
    .as_label()
    .clone();

  let canonical = cfg.resolve_alias(&original);
  let target = *cfg.labels.get(&canonical).ok_or_else(|| CfgError::UndefinedLabel {
    origin: cfg.origin.clone(),
    label: canonical.clone(),
  })?;

  let rewrote = canonical != original;
  if rewrote {
    let instr = cfg.blocks[block].items[item_idx]
      .as_instruction_mut()
      .expect("checked above");
    *instr.args[arg_idx].as_label_mut() = canonical.clone();
  }

  *cfg.label_references.entry(canonical).or_insert(0) += 1;
  Ok((target, rewrote))
}

fn add_edge(cfg: &mut Cfg, from: BlockIdx, to: BlockIdx) {
  cfg.blocks[from].add_successor(to);
  cfg.blocks[to].add_predecessor(from);
}

fn remove_fallthrough(cfg: &mut Cfg, from: BlockIdx) {
  let to = from + 1;
  if to < cfg.blocks.len() {
    cfg.blocks[from].successors.retain(|&s| s != to);
    cfg.blocks[to].predecessors.retain(|&p| p != from);
  }
}

/// Step 4 / 7 — renumber blocks sequentially from the entry's current id.
fn renumber(cfg: &mut Cfg) {
  let base = cfg.blocks[0].id;
  for (i, block) in cfg.blocks.iter_mut().enumerate() {
    block.id = base + i as u32;
  }
}

/// Step 5 — forward a jump whose target's first real instruction is itself
/// an unconditional jump. One hop per call; the outer fixpoint repeats this
/// until chains stop shortening.
fn forward_jumps(cfg: &mut Cfg) -> bool {
  let mut changed = false;
  let n = cfg.blocks.len();

  for i in 0..n {
    let len = cfg.blocks[i].items.len();
    if len == 0 {
      continue;
    }
    let last_idx = len - 1;
    let (arg_idx, is_jumpish) = match cfg.blocks[i].items[last_idx].as_instruction() {
      Some(instr) if instr.opcode.label_in_arg0() || instr.opcode == Opcode::Jump => (0, true),
      Some(instr) if instr.opcode.label_in_arg1() => (1, true),
      _ => (0, false),
    };
    if !is_jumpish {
      continue;
    }

    let label = cfg.blocks[i].items[last_idx]
      .as_instruction()
      .unwrap()
      .args[arg_idx]
      .as_label()
      .clone();
    let target_idx = match cfg.labels.get(&label) {
      Some(&idx) => idx,
      None => continue,
    };

    let inner_jump_label = cfg.blocks[target_idx]
      .items
      .iter()
      .find(|item| !item.is_label())
      .and_then(Item::as_instruction)
      .filter(|instr| instr.opcode == Opcode::Jump)
      .map(|instr| instr.args[0].as_label().clone());

    if let Some(inner_label) = inner_jump_label {
      if inner_label != label {
        let instr = cfg.blocks[i].items[last_idx].as_instruction_mut().unwrap();
        *instr.args[arg_idx].as_label_mut() = inner_label;
        changed = true;
      }
    }
  }

  changed
}

/// Step 6 — remove blocks with no predecessors, except the entry.
fn remove_unreachable_blocks(cfg: &mut Cfg) -> bool {
  let mut changed = false;
  let mut i = 1;
  while i < cfg.blocks.len() {
    if !cfg.blocks[i].predecessors.is_empty() {
      i += 1;
      continue;
    }
    cfg.blocks.remove(i);
    for block in cfg.blocks.iter_mut() {
      block.successors.retain(|&s| s != i);
      block.predecessors.retain(|&p| p != i);
      for s in block.successors.iter_mut() {
        if *s > i {
          *s -= 1;
        }
      }
      for p in block.predecessors.iter_mut() {
        if *p > i {
          *p -= 1;
        }
      }
    }
    cfg.labels.retain(|_, idx| *idx != i);
    for idx in cfg.labels.values_mut() {
      if *idx > i {
        *idx -= 1;
      }
    }
    changed = true;
  }
  changed
}

/// Step 8 — drop Label items whose reference count is zero.
fn remove_unreferenced_labels(cfg: &mut Cfg) -> bool {
  let mut changed = false;
  let Cfg {
    blocks,
    label_references,
    labels,
    ..
  } = cfg;

  for block in blocks.iter_mut() {
    let name = match block.items.first() {
      Some(Item::Label(name)) if label_references.get(name).copied().unwrap_or(0) == 0 => Some(name.clone()),
      _ => None,
    };
    if let Some(name) = name {
      labels.swap_remove(&name);
      label_references.swap_remove(&name);
      block.items.remove(0);
      changed = true;
    }
  }

  changed
}

/// Step 9 (part 1) — clear edges and label bookkeeping, rebuild the label
/// table from the blocks' current contents. Returns whether any surviving
/// Label item was found out of first position.
fn rebuild_label_table_and_clear_edges(cfg: &mut Cfg) -> bool {
  let mut mislabeled = false;
  cfg.labels.clear();

  for (idx, block) in cfg.blocks.iter().enumerate() {
    for (pos, item) in block.items.iter().enumerate() {
      if let Item::Label(name) = item {
        if pos == 0 {
          cfg.labels.insert(name.clone(), idx);
        } else {
          mislabeled = true;
        }
      }
    }
  }

  for block in cfg.blocks.iter_mut() {
    block.successors.clear();
    block.predecessors.clear();
  }

  cfg.label_references.clear();
  let names: Vec<LabelName> = cfg.labels.keys().cloned().collect();
  for name in names {
    cfg.label_references.insert(name, 0);
  }

  mislabeled
}

/// Step 9 (part 2) — flatten the current blocks back into one linear item
/// list, the input to a fresh Phase-A split.
fn flatten(cfg: &Cfg) -> Vec<Item> {
  cfg.blocks.iter().flat_map(|b| b.items.iter().cloned()).collect()
}
