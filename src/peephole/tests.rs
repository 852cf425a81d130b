use super::run;
use crate::item::{Arg, Instruction, Item};
use crate::opcode::{metadata, Opcode};

fn instr(opcode: Opcode, args: Vec<Arg>) -> Item {
  Item::Instruction(Instruction::new(opcode, args))
}

fn label(name: &str) -> Item {
  Item::Label(name.into())
}

#[test]
fn greedy_float_fusion() {
  // greedy float fusion
  let mut stream = vec![
    instr(Opcode::PushFloat, vec![Arg::Float(1.0)]),
    instr(Opcode::PushFloat, vec![Arg::Float(2.0)]),
    instr(Opcode::PushFloat, vec![Arg::Float(3.0)]),
    instr(Opcode::Pop, vec![]),
  ];
  run(&mut stream);

  assert_eq!(stream.len(), 2);
  let fused = stream[0].as_instruction().unwrap();
  assert_eq!(fused.opcode, Opcode::PushNFloats);
  assert_eq!(fused.args[0], Arg::ListSize(3));
  assert_eq!(&fused.args[1..], &[Arg::Float(1.0), Arg::Float(2.0), Arg::Float(3.0)]);
  assert_eq!(stream[1].as_instruction().unwrap().opcode, Opcode::Pop);
}

#[test]
fn boolean_not_folding() {
  // BooleanNot folds into the following conditional jump
  let mut stream = vec![
    instr(Opcode::BooleanNot, vec![]),
    instr(Opcode::JumpIfFalse, vec![Arg::Label("L".into())]),
    label("L"),
  ];
  run(&mut stream);

  assert_eq!(stream.len(), 2);
  let jump = stream[0].as_instruction().unwrap();
  assert_eq!(jump.opcode, Opcode::JumpIfTrue);
  assert_eq!(jump.args[0], Arg::Label("L".into()));
  assert!(stream[1].is_label());
}

#[test]
fn dead_jump_removal() {
  // a dead jump (one immediately followed by another jump) is dropped
  let mut stream = vec![
    instr(Opcode::Jump, vec![Arg::Label("A".into())]),
    instr(Opcode::Jump, vec![Arg::Label("B".into())]),
    label("A"),
    instr(Opcode::Return, vec![]),
  ];
  run(&mut stream);

  assert_eq!(stream.len(), 3);
  assert_eq!(stream[0].as_instruction().unwrap().opcode, Opcode::Jump);
  assert_eq!(stream[0].as_instruction().unwrap().args[0], Arg::Label("A".into()));
}

#[test]
fn assign_pop_and_null_ref_chain() {
  let mut stream = vec![
    instr(Opcode::PushNull, vec![]),
    instr(Opcode::Assign, vec![Arg::RefDesc(0)]),
    instr(Opcode::Pop, vec![]),
  ];
  run(&mut stream);

  assert_eq!(stream.len(), 1);
  let fused = stream[0].as_instruction().unwrap();
  assert_eq!(fused.opcode, Opcode::NullRef);
  assert_eq!(fused.args[0], Arg::RefDesc(0));
}

#[test]
fn create_list_n_floats_requires_matching_count() {
  let mut matching = vec![
    instr(Opcode::PushFloat, vec![Arg::Float(1.0)]),
    instr(Opcode::PushFloat, vec![Arg::Float(2.0)]),
    instr(Opcode::CreateList, vec![Arg::ListSize(2)]),
  ];
  run(&mut matching);
  assert_eq!(matching.len(), 1);
  assert_eq!(matching[0].as_instruction().unwrap().opcode, Opcode::CreateListNFloats);

  let mut mismatched = vec![
    instr(Opcode::PushFloat, vec![Arg::Float(1.0)]),
    instr(Opcode::PushFloat, vec![Arg::Float(2.0)]),
    instr(Opcode::CreateList, vec![Arg::ListSize(3)]),
  ];
  run(&mut mismatched);
  // precondition N == K fails, so CreateList stays unfused.
  assert_eq!(mismatched.len(), 2);
  assert_eq!(mismatched[0].as_instruction().unwrap().opcode, Opcode::PushNFloats);
  assert_eq!(mismatched[1].as_instruction().unwrap().opcode, Opcode::CreateList);
}

#[test]
fn idempotence() {
  let mut stream = vec![
    instr(Opcode::PushString, vec![Arg::StringRef(0)]),
    instr(Opcode::PushString, vec![Arg::StringRef(1)]),
    instr(Opcode::PushFloat, vec![Arg::Float(1.0)]),
    instr(Opcode::Assign, vec![Arg::RefDesc(3)]),
    instr(Opcode::Pop, vec![]),
  ];
  run(&mut stream);
  let once = stream.clone();
  run(&mut stream);
  assert_eq!(stream, once);
}

#[test]
fn stack_effect_is_preserved_across_assign_pop() {
  let assign = metadata(Opcode::Assign).stack_effect;
  let pop = metadata(Opcode::Pop).stack_effect;
  let assign_pop = metadata(Opcode::AssignPop).stack_effect;
  assert_eq!(assign + pop, assign_pop);
}

#[test]
fn location_is_inherited_from_first_located_item_in_window() {
  let loc = location::Location::new("a.dm", 3, 1);
  let mut stream = vec![
    instr(Opcode::Assign, vec![Arg::RefDesc(0)]).with_location_for_test(loc.clone()),
    instr(Opcode::Pop, vec![]),
  ];
  run(&mut stream);
  assert_eq!(stream[0].location(), Some(&loc));
}

trait WithLocationForTest {
  fn with_location_for_test(self, loc: location::Location) -> Self;
}

impl WithLocationForTest for Item {
  fn with_location_for_test(mut self, loc: location::Location) -> Self {
    self.set_location(loc);
    self
  }
}
