//! Phase A — Split.

use std::rc::Rc;

use indexmap::IndexMap;

use super::{Block, Cfg, CfgError};
use crate::item::{Item, LabelName};
use crate::opcode::metadata;

/// Splits a linear item stream into basic blocks.
///
/// A fresh block starts after any splitting instruction and at each label,
/// except when a label immediately follows another label with no
/// intervening instruction — those collapse into an alias entry instead of
/// a block of their own.
pub(crate) fn split(stream: Vec<Item>, origin: Rc<str>, base_id: u32) -> Result<Cfg, CfgError> {
  let mut blocks: Vec<Block> = vec![Block::new(base_id)];
  let mut next_id = base_id + 1;
  let mut labels: IndexMap<LabelName, usize> = IndexMap::new();
  let mut alias: IndexMap<LabelName, LabelName> = IndexMap::new();
  // The most recent label seen with no intervening instruction since, used
  // to detect adjacent-label runs (spec: "Adjacent-label collapse").
  let mut pending_label: Option<LabelName> = None;

  for item in stream {
    match item {
      Item::Label(name) => {
        if labels.contains_key(&name) || alias.contains_key(&name) {
          return Err(CfgError::DuplicateLabel {
            origin: origin.clone(),
            label: name,
          });
        }

        if let Some(prev) = pending_label.clone() {
          let canonical = resolve_within(&alias, &prev);
          alias.insert(name, canonical);
          // `pending_label` stays pointed at the first label of the run.
          continue;
        }

        if !blocks.last().unwrap().is_empty() {
          blocks.push(Block::new(next_id));
          next_id += 1;
        }
        let idx = blocks.len() - 1;
        labels.insert(name.clone(), idx);
        blocks[idx].items.push(Item::Label(name.clone()));
        pending_label = Some(name);
      }
      Item::Instruction(instr) => {
        pending_label = None;
        let splits = metadata(instr.opcode).splits_basic_block;
        blocks.last_mut().unwrap().items.push(Item::Instruction(instr));
        if splits {
          blocks.push(Block::new(next_id));
          next_id += 1;
        }
      }
      Item::LocalVariable(info) => {
        pending_label = None;
        blocks.last_mut().unwrap().items.push(Item::LocalVariable(info));
      }
    }
  }

  let mut label_references = IndexMap::new();
  for name in labels.keys() {
    label_references.insert(name.clone(), 0usize);
  }

  Ok(Cfg {
    blocks,
    labels,
    label_references,
    alias,
    try_stack: Vec::new(),
    next_id,
    origin,
  })
}

fn resolve_within(alias: &IndexMap<LabelName, LabelName>, name: &LabelName) -> LabelName {
  let mut current = name.clone();
  while let Some(canonical) = alias.get(&current) {
    if *canonical == current {
      break;
    }
    current = canonical.clone();
  }
  current
}
