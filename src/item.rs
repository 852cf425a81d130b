//! The annotated-bytecode data model: [`Item`], its three variants, and
//! the typed [`Arg`] values an instruction carries.

use std::rc::Rc;

use location::Location;

use crate::opcode::Opcode;

/// A label name. Cheaply cloneable — every jump argument and every alias
/// table entry holds one of these.
pub type LabelName = Rc<str>;

/// One typed instruction argument: integer, float, string-literal index,
/// resource index, type id, reference descriptor, label name, or list size.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
  Int(i64),
  Float(f64),
  StringRef(u32),
  ResourceRef(u32),
  TypeRef(u32),
  RefDesc(u32),
  Label(LabelName),
  ListSize(u32),
}

impl Arg {
  pub fn as_label(&self) -> &LabelName {
    match self {
      Arg::Label(name) => name,
      other => panic!("expected a label argument, found {other:?}"),
    }
  }

  pub fn as_label_mut(&mut self) -> &mut LabelName {
    match self {
      Arg::Label(name) => name,
      other => panic!("expected a label argument, found {other:?}"),
    }
  }

  pub fn as_ref_desc(&self) -> u32 {
    match self {
      Arg::RefDesc(r) => *r,
      other => panic!("expected a reference-descriptor argument, found {other:?}"),
    }
  }

  pub fn as_list_size(&self) -> u32 {
    match self {
      Arg::ListSize(n) => *n,
      other => panic!("expected a list-size argument, found {other:?}"),
    }
  }

  pub fn as_string_ref(&self) -> u32 {
    match self {
      Arg::StringRef(s) => *s,
      other => panic!("expected a string-literal-index argument, found {other:?}"),
    }
  }

  pub fn as_float(&self) -> f64 {
    match self {
      Arg::Float(f) => *f,
      other => panic!("expected a float argument, found {other:?}"),
    }
  }

  pub fn as_type_ref(&self) -> u32 {
    match self {
      Arg::TypeRef(t) => *t,
      other => panic!("expected a type-id argument, found {other:?}"),
    }
  }
}

impl std::fmt::Display for Arg {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Arg::Int(v) => write!(f, "{v}"),
      Arg::Float(v) => write!(f, "{v}"),
      Arg::StringRef(v) => write!(f, "s{v}"),
      Arg::ResourceRef(v) => write!(f, "res{v}"),
      Arg::TypeRef(v) => write!(f, "ty{v}"),
      Arg::RefDesc(v) => write!(f, "r{v}"),
      Arg::Label(name) => write!(f, "{name}"),
      Arg::ListSize(v) => write!(f, "{v}"),
    }
  }
}

/// Debug metadata attached to a `LocalVariable` pseudo-instruction. Passed
/// through every transformation unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalVariableInfo {
  pub name: Rc<str>,
  pub slot: u32,
}

/// A single instruction: an opcode plus its arguments, an optional source
/// location, and an optional stack-delta annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
  pub opcode: Opcode,
  pub args: Vec<Arg>,
  pub location: Option<Location>,
  pub stack_delta: Option<i32>,
}

impl Instruction {
  pub fn new(opcode: Opcode, args: Vec<Arg>) -> Self {
    Instruction {
      opcode,
      args,
      location: None,
      stack_delta: None,
    }
  }

  pub fn with_location(mut self, location: Location) -> Self {
    self.location = Some(location);
    self
  }
}

/// One entry in an annotated-bytecode stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
  Instruction(Instruction),
  Label(LabelName),
  LocalVariable(LocalVariableInfo),
}

impl Item {
  pub fn location(&self) -> Option<&Location> {
    match self {
      Item::Instruction(i) => i.location.as_ref(),
      Item::Label(_) | Item::LocalVariable(_) => None,
    }
  }

  pub fn set_location(&mut self, location: Location) {
    if let Item::Instruction(i) = self {
      i.location = Some(location);
    }
  }

  pub fn as_instruction(&self) -> Option<&Instruction> {
    match self {
      Item::Instruction(i) => Some(i),
      _ => None,
    }
  }

  pub fn as_instruction_mut(&mut self) -> Option<&mut Instruction> {
    match self {
      Item::Instruction(i) => Some(i),
      _ => None,
    }
  }

  pub fn opcode(&self) -> Option<Opcode> {
    self.as_instruction().map(|i| i.opcode)
  }

  pub fn is_label(&self) -> bool {
    matches!(self, Item::Label(_))
  }

  pub fn as_label(&self) -> Option<&LabelName> {
    match self {
      Item::Label(name) => Some(name),
      _ => None,
    }
  }
}

impl std::fmt::Display for Item {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Item::Instruction(instr) => {
        write!(f, "{}", instr.opcode)?;
        for arg in &instr.args {
          write!(f, " {arg}")?;
        }
        Ok(())
      }
      Item::Label(name) => write!(f, "{name}:"),
      Item::LocalVariable(info) => write!(f, "local {} @ {}", info.name, info.slot),
    }
  }
}
