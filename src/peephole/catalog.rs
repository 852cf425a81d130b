//! The registered rewrite catalog, in registration order — the order ties
//! are broken within a window width.

use super::{inherit_location, Pattern};
use crate::item::{Arg, Instruction, Item};
use crate::opcode::Opcode;

fn instr_at(stream: &[Item], i: usize) -> &Instruction {
  stream[i].as_instruction().expect("window_matches guarantees an instruction")
}

fn splice_one(stream: &mut Vec<Item>, start: usize, end: usize, mut instr: Instruction) -> usize {
  instr.location = inherit_location(&stream[start..end]);
  stream.splice(start..end, [Item::Instruction(instr)]);
  1
}

// -- Assign[r], Pop -> AssignPop[r] --
fn apply_assign_pop(stream: &mut Vec<Item>, i: usize) -> usize {
  let r = instr_at(stream, i).args[0].clone();
  splice_one(stream, i, i + 2, Instruction::new(Opcode::AssignPop, vec![r]))
}

// -- PushNull, AssignPop[r] -> NullRef[r] --
fn apply_null_ref(stream: &mut Vec<Item>, i: usize) -> usize {
  let r = instr_at(stream, i + 1).args[0].clone();
  splice_one(stream, i, i + 2, Instruction::new(Opcode::NullRef, vec![r]))
}

// -- PushReferenceValue[r], DereferenceField[f] -> PushRefAndDereferenceField[r,f] --
fn apply_push_ref_and_dereference_field(stream: &mut Vec<Item>, i: usize) -> usize {
  let r = instr_at(stream, i).args[0].clone();
  let f = instr_at(stream, i + 1).args[0].clone();
  splice_one(
    stream,
    i,
    i + 2,
    Instruction::new(Opcode::PushRefAndDereferenceField, vec![r, f]),
  )
}

// -- BooleanNot, JumpIfFalse[L] -> JumpIfTrue[L] --
fn apply_boolean_not_jump_if_false(stream: &mut Vec<Item>, i: usize) -> usize {
  let l = instr_at(stream, i + 1).args[0].clone();
  splice_one(stream, i, i + 2, Instruction::new(Opcode::JumpIfTrue, vec![l]))
}

// -- PushReferenceValue[r], JumpIfFalse[L] -> JumpIfReferenceFalse[r,L] --
fn apply_push_ref_jump_if_false(stream: &mut Vec<Item>, i: usize) -> usize {
  let r = instr_at(stream, i).args[0].clone();
  let l = instr_at(stream, i + 1).args[0].clone();
  splice_one(
    stream,
    i,
    i + 2,
    Instruction::new(Opcode::JumpIfReferenceFalse, vec![r, l]),
  )
}

/// Shared implementation of the greedy-run families: `PushFloat x N ->
/// PushNFloats[N, ...]` and friends. Extends past the nominal 2-wide window
/// to consume every contiguous instruction with the same opcode.
fn apply_greedy_run(
  stream: &mut Vec<Item>,
  i: usize,
  source: Opcode,
  fused: Opcode,
  extract: fn(&Instruction) -> Vec<Arg>,
) -> usize {
  let mut end = i;
  while end < stream.len() {
    match stream[end].as_instruction() {
      Some(instr) if instr.opcode == source => end += 1,
      _ => break,
    }
  }
  let count = (end - i) as u32;
  let mut args = vec![Arg::ListSize(count)];
  for item in &stream[i..end] {
    args.extend(extract(item.as_instruction().unwrap()));
  }
  splice_one(stream, i, end, Instruction::new(fused, args))
}

macro_rules! greedy_run_family {
  ($fn_name:ident, $source:ident, $fused:ident) => {
    fn $fn_name(stream: &mut Vec<Item>, i: usize) -> usize {
      apply_greedy_run(stream, i, Opcode::$source, Opcode::$fused, |instr| {
        vec![instr.args[0].clone()]
      })
    }
  };
}

greedy_run_family!(apply_push_n_strings, PushString, PushNStrings);
greedy_run_family!(apply_push_n_floats, PushFloat, PushNFloats);
greedy_run_family!(apply_push_n_refs, PushReferenceValue, PushNRefs);
greedy_run_family!(apply_push_n_resources, PushResource, PushNResources);

// -- PushString, PushFloat -> PushStringFloat[s,f] --
fn apply_push_string_float(stream: &mut Vec<Item>, i: usize) -> usize {
  let s = instr_at(stream, i).args[0].clone();
  let f = instr_at(stream, i + 1).args[0].clone();
  splice_one(stream, i, i + 2, Instruction::new(Opcode::PushStringFloat, vec![s, f]))
}

// -- PushStringFloat x N -> PushNOfStringFloats[N, s1,f1, s2,f2, ...] --
fn apply_push_n_of_string_floats(stream: &mut Vec<Item>, i: usize) -> usize {
  apply_greedy_run(
    stream,
    i,
    Opcode::PushStringFloat,
    Opcode::PushNOfStringFloats,
    |instr| instr.args.clone(),
  )
}

// -- PushFloat[f], SwitchCase[L] -> SwitchOnFloat[f,L] --
fn apply_switch_on_float(stream: &mut Vec<Item>, i: usize) -> usize {
  let f = instr_at(stream, i).args[0].clone();
  let l = instr_at(stream, i + 1).args[0].clone();
  splice_one(stream, i, i + 2, Instruction::new(Opcode::SwitchOnFloat, vec![f, l]))
}

// -- PushString[s], SwitchCase[L] -> SwitchOnString[s,L] --
fn apply_switch_on_string(stream: &mut Vec<Item>, i: usize) -> usize {
  let s = instr_at(stream, i).args[0].clone();
  let l = instr_at(stream, i + 1).args[0].clone();
  splice_one(stream, i, i + 2, Instruction::new(Opcode::SwitchOnString, vec![s, l]))
}

fn check_create_list_count_matches(stream: &[Item], i: usize) -> bool {
  let n = instr_at(stream, i).args[0].as_list_size();
  let k = instr_at(stream, i + 1).args[0].as_list_size();
  n == k
}

macro_rules! create_list_n_family {
  ($fn_name:ident, $source:ident, $fused:ident) => {
    fn $fn_name(stream: &mut Vec<Item>, i: usize) -> usize {
      let args = instr_at(stream, i).args.clone();
      splice_one(stream, i, i + 2, Instruction::new(Opcode::$fused, args))
    }
  };
}

create_list_n_family!(apply_create_list_n_floats, PushNFloats, CreateListNFloats);
create_list_n_family!(apply_create_list_n_strings, PushNStrings, CreateListNStrings);
create_list_n_family!(apply_create_list_n_resources, PushNResources, CreateListNResources);
create_list_n_family!(apply_create_list_n_refs, PushNRefs, CreateListNRefs);

// -- Jump[L1], Jump[L2] -> Jump[L1] (the second jump is dead) --
fn apply_dead_jump(stream: &mut Vec<Item>, i: usize) -> usize {
  let l1 = instr_at(stream, i).args[0].clone();
  splice_one(stream, i, i + 2, Instruction::new(Opcode::Jump, vec![l1]))
}

// -- PushType[t], IsType -> IsTypeDirect[t] --
fn apply_is_type_direct(stream: &mut Vec<Item>, i: usize) -> usize {
  let t = instr_at(stream, i).args[0].clone();
  splice_one(stream, i, i + 2, Instruction::new(Opcode::IsTypeDirect, vec![t]))
}

pub static PATTERNS: &[Pattern] = &[
  Pattern {
    name: "assign_pop",
    length: 2,
    opcodes: &[Opcode::Assign, Opcode::Pop],
    check: None,
    apply: apply_assign_pop,
  },
  Pattern {
    name: "null_ref",
    length: 2,
    opcodes: &[Opcode::PushNull, Opcode::AssignPop],
    check: None,
    apply: apply_null_ref,
  },
  Pattern {
    name: "push_ref_and_dereference_field",
    length: 2,
    opcodes: &[Opcode::PushReferenceValue, Opcode::DereferenceField],
    check: None,
    apply: apply_push_ref_and_dereference_field,
  },
  Pattern {
    name: "boolean_not_jump_if_false",
    length: 2,
    opcodes: &[Opcode::BooleanNot, Opcode::JumpIfFalse],
    check: None,
    apply: apply_boolean_not_jump_if_false,
  },
  Pattern {
    name: "push_ref_jump_if_false",
    length: 2,
    opcodes: &[Opcode::PushReferenceValue, Opcode::JumpIfFalse],
    check: None,
    apply: apply_push_ref_jump_if_false,
  },
  Pattern {
    name: "push_n_strings",
    length: 2,
    opcodes: &[Opcode::PushString, Opcode::PushString],
    check: None,
    apply: apply_push_n_strings,
  },
  Pattern {
    name: "push_n_floats",
    length: 2,
    opcodes: &[Opcode::PushFloat, Opcode::PushFloat],
    check: None,
    apply: apply_push_n_floats,
  },
  Pattern {
    name: "push_n_refs",
    length: 2,
    opcodes: &[Opcode::PushReferenceValue, Opcode::PushReferenceValue],
    check: None,
    apply: apply_push_n_refs,
  },
  Pattern {
    name: "push_n_resources",
    length: 2,
    opcodes: &[Opcode::PushResource, Opcode::PushResource],
    check: None,
    apply: apply_push_n_resources,
  },
  Pattern {
    name: "push_string_float",
    length: 2,
    opcodes: &[Opcode::PushString, Opcode::PushFloat],
    check: None,
    apply: apply_push_string_float,
  },
  Pattern {
    name: "push_n_of_string_floats",
    length: 2,
    opcodes: &[Opcode::PushStringFloat, Opcode::PushStringFloat],
    check: None,
    apply: apply_push_n_of_string_floats,
  },
  Pattern {
    name: "switch_on_float",
    length: 2,
    opcodes: &[Opcode::PushFloat, Opcode::SwitchCase],
    check: None,
    apply: apply_switch_on_float,
  },
  Pattern {
    name: "switch_on_string",
    length: 2,
    opcodes: &[Opcode::PushString, Opcode::SwitchCase],
    check: None,
    apply: apply_switch_on_string,
  },
  Pattern {
    name: "create_list_n_floats",
    length: 2,
    opcodes: &[Opcode::PushNFloats, Opcode::CreateList],
    check: Some(check_create_list_count_matches),
    apply: apply_create_list_n_floats,
  },
  Pattern {
    name: "create_list_n_strings",
    length: 2,
    opcodes: &[Opcode::PushNStrings, Opcode::CreateList],
    check: Some(check_create_list_count_matches),
    apply: apply_create_list_n_strings,
  },
  Pattern {
    name: "create_list_n_resources",
    length: 2,
    opcodes: &[Opcode::PushNResources, Opcode::CreateList],
    check: Some(check_create_list_count_matches),
    apply: apply_create_list_n_resources,
  },
  Pattern {
    name: "create_list_n_refs",
    length: 2,
    opcodes: &[Opcode::PushNRefs, Opcode::CreateList],
    check: Some(check_create_list_count_matches),
    apply: apply_create_list_n_refs,
  },
  Pattern {
    name: "dead_jump",
    length: 2,
    opcodes: &[Opcode::Jump, Opcode::Jump],
    check: None,
    apply: apply_dead_jump,
  },
  Pattern {
    name: "is_type_direct",
    length: 2,
    opcodes: &[Opcode::PushType, Opcode::IsType],
    check: None,
    apply: apply_is_type_direct,
  },
];
