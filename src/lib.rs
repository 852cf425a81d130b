//! A bytecode optimization core: a peephole rewriter and a CFG
//! builder/cleanup pass for a stack-based bytecode compiler backend.
//!
//! [`peephole::run`] rewrites a linear, annotated-bytecode stream in place,
//! fusing adjacent instructions into denser forms until no registered
//! pattern applies. [`cfg::convert`] then splits that stream into basic
//! blocks and cleans the resulting graph up to fixpoint — dead blocks
//! pruned, jump chains forwarded, unreferenced labels dropped.
//!
//! Both stages are independent: a caller may run the peephole pass alone
//! (as a pure bytecode-in, bytecode-out transform) or feed its output into
//! `cfg::convert` to get a block graph for later analysis or emission.

pub mod cfg;
pub mod error;
pub mod item;
pub mod opcode;
pub mod peephole;

pub use error::{Error, Result};
pub use item::{Arg, Instruction, Item, LabelName, LocalVariableInfo};
pub use opcode::{metadata, ArgKind, ArgSchema, Opcode, OpcodeInfo};

pub use cfg::{convert, Block, BlockIdx, CfgError, ConvertOptions};
pub use peephole::PeepholeOptions;
