use super::{convert, ConvertOptions};
use crate::item::{Arg, Instruction, Item};
use crate::opcode::Opcode;

fn instr(opcode: Opcode, args: Vec<Arg>) -> Item {
  Item::Instruction(Instruction::new(opcode, args))
}

fn label(name: &str) -> Item {
  Item::Label(name.into())
}

fn convert_default(stream: Vec<Item>) -> Vec<super::Block> {
  convert(stream, "test", ConvertOptions::default()).expect("well-formed input")
}

/// Every successor/predecessor pair is mutual, and every jump target index
/// is within bounds (every jump argument must name a block in the list).
fn assert_edges_consistent(blocks: &[super::Block]) {
  for (i, block) in blocks.iter().enumerate() {
    for &s in &block.successors {
      assert!(s < blocks.len(), "block {i} has out-of-range successor {s}");
      assert!(blocks[s].predecessors.contains(&i), "block {s} missing predecessor {i}");
    }
    for &p in &block.predecessors {
      assert!(blocks[p].successors.contains(&i), "block {p} missing successor {i}");
    }
  }
}

#[test]
fn dead_jump_cfg_half() {
  // post-peephole form: a dead jump has already been dropped.
  let stream = vec![instr(Opcode::Jump, vec![Arg::Label("A".into())]), label("A"), instr(Opcode::Return, vec![])];
  let blocks = convert_default(stream);
  assert_edges_consistent(&blocks);

  assert_eq!(blocks.len(), 2);
  assert_eq!(blocks[0].items.len(), 1);
  assert_eq!(blocks[0].successors, vec![1]);
  assert_eq!(blocks[1].predecessors, vec![0]);
  assert_eq!(blocks[1].label().map(|l| l.as_ref()), Some("A"));
}

#[test]
fn alias_collapse_rewrites_to_canonical_label() {
  // adjacent labels collapse to the first (canonical) one.
  let stream = vec![
    instr(Opcode::Jump, vec![Arg::Label("Y".into())]),
    label("X"),
    label("Y"),
    instr(Opcode::PushFloat, vec![Arg::Float(0.0)]),
    instr(Opcode::Return, vec![]),
  ];
  let blocks = convert_default(stream);
  assert_edges_consistent(&blocks);

  assert_eq!(blocks.len(), 2);
  let jump = blocks[0].items[0].as_instruction().unwrap();
  assert_eq!(jump.opcode, Opcode::Jump);
  assert_eq!(jump.args[0], Arg::Label("X".into()));
  assert_eq!(blocks[1].label().map(|l| l.as_ref()), Some("X"));
}

#[test]
fn jump_forwarding_skips_the_intermediate_block() {
  // B1 jumps to B2, which only contains a jump onward to B3. Forwarding
  // should redirect B1 straight to B3 and drop B2 entirely. This uses an
  // unconditional `Jump` for B1 deliberately: a conditional jump would keep
  // a live fallthrough edge into B2, so B2 would never become unreferenced.
  let stream = vec![
    instr(Opcode::Jump, vec![Arg::Label("L1".into())]),
    label("L1"),
    instr(Opcode::Jump, vec![Arg::Label("L2".into())]),
    label("L2"),
    instr(Opcode::Return, vec![]),
  ];
  let blocks = convert_default(stream);
  assert_edges_consistent(&blocks);

  assert_eq!(blocks.len(), 2);
  let jump = blocks[0].items[0].as_instruction().unwrap();
  assert_eq!(jump.opcode, Opcode::Jump);
  assert_eq!(jump.args[0], Arg::Label("L2".into()));
  assert_eq!(blocks[1].label().map(|l| l.as_ref()), Some("L2"));
}

#[test]
fn try_throw_routing_gives_call_site_two_successors() {
  // A label between the call and the throw forces them into different
  // blocks, so the call's fallthrough and catch edges are separately
  // observable rather than collapsing into one.
  let stream = vec![
    instr(Opcode::Try, vec![Arg::Label("CATCH".into())]),
    instr(Opcode::Call, vec![Arg::Int(0)]),
    label("MID"),
    instr(Opcode::Throw, vec![]),
    label("CATCH"),
    instr(Opcode::Return, vec![]),
  ];
  let blocks = convert_default(stream);
  assert_edges_consistent(&blocks);

  assert_eq!(blocks.len(), 3);
  let call_block = &blocks[0];
  assert_eq!(call_block.successors.len(), 2, "call block should fall through and route to CATCH");

  let catch_idx = blocks.iter().position(|b| b.label().map(|l| l.as_ref()) == Some("CATCH")).unwrap();
  let throw_block = blocks.iter().find(|b| b.label().map(|l| l.as_ref()) == Some("MID")).unwrap();
  assert_eq!(throw_block.successors, vec![catch_idx], "throw block has only the catch edge, no fallthrough");
}

#[test]
fn duplicate_label_is_a_fatal_error() {
  let stream = vec![label("A"), instr(Opcode::Return, vec![]), label("A"), instr(Opcode::Return, vec![])];
  let err = convert(stream, "dup", ConvertOptions::default()).unwrap_err();
  assert!(matches!(err, super::CfgError::DuplicateLabel { .. }));
}

#[test]
fn undefined_label_is_a_fatal_error() {
  let stream = vec![instr(Opcode::Jump, vec![Arg::Label("ghost".into())])];
  let err = convert(stream, "undef", ConvertOptions::default()).unwrap_err();
  assert!(matches!(err, super::CfgError::UndefinedLabel { .. }));
}
