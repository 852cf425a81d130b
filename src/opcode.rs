//! The opcode enumeration and its static metadata registry.
//!
//! One macro invocation lists every opcode together with the data the rest
//! of the optimizer needs, and expands into an exhaustive `match` so that a
//! new opcode whose control-flow classification was forgotten is a compile
//! error rather than a silent gap.

use std::fmt;

/// The kind of a single typed argument, as carried by an [`Arg`](crate::item::Arg).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgKind {
  Int,
  Float,
  StringRef,
  ResourceRef,
  TypeRef,
  RefDesc,
  Label,
  ListSize,
}

/// The declared argument shape of an opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgSchema {
  /// A fixed-length argument list.
  Fixed(&'static [ArgKind]),
  /// A [`ArgKind::ListSize`] followed by that many arguments of the given
  /// kind — the shape produced by the peephole rewriter's greedy-run
  /// fusions (`PushNStrings`, `CreateListNFloats`, ...).
  CountPrefixed(ArgKind),
}

/// Static metadata about one opcode, as queried by both the peephole
/// rewriter and the CFG builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpcodeInfo {
  /// True if this opcode must be the last instruction of its basic block.
  pub splits_basic_block: bool,
  /// Net effect on the operand stack depth, as a hint (not load-bearing for
  /// correctness — no dataflow analysis consumes it here).
  pub stack_effect: i32,
  pub arg_schema: ArgSchema,
}

macro_rules! opcodes {
  ($(
    $name:ident { split: $split:literal, effect: $effect:expr, args: $args:expr }
  ),* $(,)?) => {
    /// The closed set of opcodes produced by the upstream emitter and
    /// consumed by this crate. Exhaustive by construction: every variant
    /// here must have a `metadata()` arm.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[non_exhaustive]
    pub enum Opcode {
      $($name),*
    }

    impl Opcode {
      pub const ALL: &'static [Opcode] = &[$(Opcode::$name),*];
    }

    impl fmt::Display for Opcode {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
          $(Opcode::$name => stringify!($name)),*
        };
        write!(f, "{name}")
      }
    }

    /// Total function from opcode to its static metadata.
    ///
    /// Querying with an opcode outside the enumeration above is impossible
    /// given `Opcode`'s closed definition, so the "unknown opcode is a
    /// programmer error" contract in the opcode-metadata interface is
    /// enforced by the type system instead of by a runtime branch.
    pub fn metadata(op: Opcode) -> OpcodeInfo {
      match op {
        $(
          Opcode::$name => OpcodeInfo {
            splits_basic_block: $split,
            stack_effect: $effect,
            arg_schema: $args,
          },
        )*
      }
    }
  };
}

use ArgKind::*;
use ArgSchema::Fixed;

opcodes! {
  Nop               { split: false, effect: 0,  args: Fixed(&[]) },
  Dup               { split: false, effect: 1,  args: Fixed(&[]) },
  Pop               { split: false, effect: -1, args: Fixed(&[]) },
  Swap              { split: false, effect: 0,  args: Fixed(&[]) },

  // -- assignment --
  Assign            { split: false, effect: 0,  args: Fixed(&[RefDesc]) },
  AssignPop         { split: false, effect: -1, args: Fixed(&[RefDesc]) },
  NullRef           { split: false, effect: -1, args: Fixed(&[RefDesc]) },

  // -- constant pushes --
  PushNull          { split: false, effect: 1,  args: Fixed(&[]) },
  PushTrue          { split: false, effect: 1,  args: Fixed(&[]) },
  PushFalse         { split: false, effect: 1,  args: Fixed(&[]) },
  PushInt           { split: false, effect: 1,  args: Fixed(&[Int]) },
  PushFloat         { split: false, effect: 1,  args: Fixed(&[Float]) },
  PushString        { split: false, effect: 1,  args: Fixed(&[StringRef]) },
  PushResource      { split: false, effect: 1,  args: Fixed(&[ResourceRef]) },
  PushType          { split: false, effect: 1,  args: Fixed(&[TypeRef]) },
  PushReferenceValue{ split: false, effect: 1,  args: Fixed(&[RefDesc]) },

  // -- greedy-run fusions of the above --
  PushNStrings      { split: false, effect: 0,  args: ArgSchema::CountPrefixed(StringRef) },
  PushNFloats       { split: false, effect: 0,  args: ArgSchema::CountPrefixed(Float) },
  PushNRefs         { split: false, effect: 0,  args: ArgSchema::CountPrefixed(RefDesc) },
  PushNResources    { split: false, effect: 0,  args: ArgSchema::CountPrefixed(ResourceRef) },
  PushStringFloat   { split: false, effect: 2,  args: Fixed(&[StringRef, Float]) },
  PushNOfStringFloats{split: false, effect: 0,  args: ArgSchema::CountPrefixed(StringRef) },

  // -- field / index access --
  DereferenceField  { split: false, effect: 0,  args: Fixed(&[StringRef]) },
  PushRefAndDereferenceField{split: false, effect: 1, args: Fixed(&[RefDesc, StringRef]) },
  AssignField       { split: false, effect: -2, args: Fixed(&[StringRef]) },
  LoadIndex         { split: false, effect: -1, args: Fixed(&[]) },
  LoadIndexOpt      { split: false, effect: -1, args: Fixed(&[]) },
  StoreIndex        { split: false, effect: -2, args: Fixed(&[]) },
  DeleteField       { split: false, effect: -1, args: Fixed(&[StringRef]) },
  HasField          { split: false, effect: 0,  args: Fixed(&[StringRef]) },

  // -- variables --
  LoadLocal         { split: false, effect: 1,  args: Fixed(&[RefDesc]) },
  StoreLocal        { split: false, effect: -1, args: Fixed(&[RefDesc]) },
  LoadGlobal        { split: false, effect: 1,  args: Fixed(&[StringRef]) },
  StoreGlobal       { split: false, effect: -1, args: Fixed(&[StringRef]) },
  LoadUpvalue       { split: false, effect: 1,  args: Fixed(&[RefDesc]) },
  StoreUpvalue      { split: false, effect: -1, args: Fixed(&[RefDesc]) },
  LoadArg           { split: false, effect: 1,  args: Fixed(&[RefDesc]) },
  LoadSelf          { split: false, effect: 1,  args: Fixed(&[]) },

  // -- lists / dicts --
  CreateList        { split: false, effect: 1,  args: Fixed(&[ListSize]) },
  CreateDict        { split: false, effect: 1,  args: Fixed(&[ListSize]) },
  CreateListNFloats { split: false, effect: 1,  args: ArgSchema::CountPrefixed(Float) },
  CreateListNStrings{ split: false, effect: 1,  args: ArgSchema::CountPrefixed(StringRef) },
  CreateListNResources{split: false, effect: 1, args: ArgSchema::CountPrefixed(ResourceRef) },
  CreateListNRefs   { split: false, effect: 1,  args: ArgSchema::CountPrefixed(RefDesc) },
  ListAppend        { split: false, effect: -1, args: Fixed(&[]) },
  DictInsert        { split: false, effect: -2, args: Fixed(&[]) },

  // -- types --
  IsType            { split: false, effect: 0,  args: Fixed(&[]) },
  IsTypeDirect      { split: false, effect: 1,  args: Fixed(&[TypeRef]) },
  TypeOf            { split: false, effect: 0,  args: Fixed(&[]) },
  Cast              { split: false, effect: 0,  args: Fixed(&[TypeRef]) },

  // -- arithmetic / logic --
  Add               { split: false, effect: -1, args: Fixed(&[]) },
  Sub               { split: false, effect: -1, args: Fixed(&[]) },
  Mul               { split: false, effect: -1, args: Fixed(&[]) },
  Div               { split: false, effect: -1, args: Fixed(&[]) },
  Mod               { split: false, effect: -1, args: Fixed(&[]) },
  Pow               { split: false, effect: -1, args: Fixed(&[]) },
  Neg               { split: false, effect: 0,  args: Fixed(&[]) },
  BooleanNot        { split: false, effect: 0,  args: Fixed(&[]) },
  BitAnd            { split: false, effect: -1, args: Fixed(&[]) },
  BitOr             { split: false, effect: -1, args: Fixed(&[]) },
  BitXor            { split: false, effect: -1, args: Fixed(&[]) },
  Shl               { split: false, effect: -1, args: Fixed(&[]) },
  Shr               { split: false, effect: -1, args: Fixed(&[]) },
  StringConcat      { split: false, effect: -1, args: Fixed(&[]) },

  // -- comparisons --
  CmpEq             { split: false, effect: -1, args: Fixed(&[]) },
  CmpNe             { split: false, effect: -1, args: Fixed(&[]) },
  CmpLt             { split: false, effect: -1, args: Fixed(&[]) },
  CmpLe             { split: false, effect: -1, args: Fixed(&[]) },
  CmpGt             { split: false, effect: -1, args: Fixed(&[]) },
  CmpGe             { split: false, effect: -1, args: Fixed(&[]) },

  // -- calls --
  Call              { split: false, effect: 0,  args: Fixed(&[Int]) },
  CallStatement     { split: false, effect: -1, args: Fixed(&[Int]) },
  DereferenceCall    { split: false, effect: 0,  args: Fixed(&[StringRef, Int]) },
  CallSuper         { split: false, effect: 0,  args: Fixed(&[Int]) },
  MakeClosure       { split: false, effect: 1,  args: Fixed(&[ResourceRef]) },

  // -- control flow: unconditional / conditional jumps (splitting) --
  Jump              { split: true,  effect: 0,  args: Fixed(&[Label]) },
  JumpIfFalse       { split: true,  effect: -1, args: Fixed(&[Label]) },
  JumpIfTrue        { split: true,  effect: -1, args: Fixed(&[Label]) },
  JumpIfNull        { split: true,  effect: -1, args: Fixed(&[Label]) },
  JumpIfNullNoPop   { split: true,  effect: 0,  args: Fixed(&[Label]) },
  JumpIfReferenceFalse{split: true, effect: 0,  args: Fixed(&[RefDesc, Label]) },
  JumpIfFalseReference{split: true, effect: 0,  args: Fixed(&[RefDesc, Label]) },
  JumpIfTrueReference{split: true,  effect: 0,  args: Fixed(&[RefDesc, Label]) },
  BooleanAnd        { split: true,  effect: 0,  args: Fixed(&[Label]) },
  BooleanOr         { split: true,  effect: 0,  args: Fixed(&[Label]) },
  SwitchCase        { split: true,  effect: -1, args: Fixed(&[Label]) },
  SwitchCaseRange   { split: true,  effect: -1, args: Fixed(&[Label]) },
  SwitchOnFloat     { split: true,  effect: -1, args: Fixed(&[Float, Label]) },
  SwitchOnString    { split: true,  effect: -1, args: Fixed(&[StringRef, Label]) },
  EnumerateNoAssign { split: true,  effect: 0,  args: Fixed(&[Label]) },
  Enumerate         { split: true,  effect: 0,  args: Fixed(&[RefDesc, Label]) },
  Spawn             { split: true,  effect: 0,  args: Fixed(&[Label]) },
  Return            { split: true,  effect: -1, args: Fixed(&[]) },
  Throw             { split: true,  effect: -1, args: Fixed(&[]) },

  // -- exception handling (non-splitting) --
  Try               { split: false, effect: 0,  args: Fixed(&[Label]) },
  TryNoValue        { split: false, effect: 0,  args: Fixed(&[Label]) },
  EndTry            { split: false, effect: 0,  args: Fixed(&[]) },

  // -- coroutines / misc --
  Yield             { split: false, effect: 0,  args: Fixed(&[]) },
  Await             { split: false, effect: 0,  args: Fixed(&[]) },
  ToString          { split: false, effect: 0,  args: Fixed(&[]) },
}

impl Opcode {
  /// Convenience used by the CFG builder's jump-resolution `match`: true if
  /// this opcode's label argument lives at `arg[0]`.
  pub fn label_in_arg0(self) -> bool {
    matches!(
      self,
      Opcode::JumpIfFalse
        | Opcode::JumpIfTrue
        | Opcode::JumpIfNull
        | Opcode::JumpIfNullNoPop
        | Opcode::BooleanAnd
        | Opcode::BooleanOr
        | Opcode::SwitchCase
        | Opcode::SwitchCaseRange
        | Opcode::SwitchOnFloat
        | Opcode::SwitchOnString
        | Opcode::EnumerateNoAssign
        | Opcode::Spawn
    )
  }

  /// True if this opcode's label argument lives at `arg[1]`.
  pub fn label_in_arg1(self) -> bool {
    matches!(
      self,
      Opcode::Enumerate
        | Opcode::JumpIfFalseReference
        | Opcode::JumpIfTrueReference
        | Opcode::JumpIfReferenceFalse
    )
  }

  pub fn is_call(self) -> bool {
    matches!(
      self,
      Opcode::Call | Opcode::DereferenceCall | Opcode::CallStatement | Opcode::CallSuper
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn metadata_is_total() {
    for &op in Opcode::ALL {
      let _ = metadata(op);
    }
  }

  #[test]
  fn splitting_opcodes_cover_the_expected_set() {
    let splitting: Vec<Opcode> = Opcode::ALL
      .iter()
      .copied()
      .filter(|op| metadata(*op).splits_basic_block)
      .collect();

    assert!(splitting.contains(&Opcode::Jump));
    assert!(splitting.contains(&Opcode::Return));
    assert!(splitting.contains(&Opcode::Throw));
    assert!(splitting.contains(&Opcode::Spawn));
    assert!(splitting.contains(&Opcode::Enumerate));
    assert!(splitting.contains(&Opcode::EnumerateNoAssign));

    // Try/EndTry never end a block on their own.
    assert!(!metadata(Opcode::Try).splits_basic_block);
    assert!(!metadata(Opcode::EndTry).splits_basic_block);
    assert!(!metadata(Opcode::Call).splits_basic_block);
  }

  #[test]
  fn label_arg_position_is_disjoint() {
    for &op in Opcode::ALL {
      assert!(!(op.label_in_arg0() && op.label_in_arg1()), "{op}");
    }
  }
}
