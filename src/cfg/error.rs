//! Fatal structural errors raised by [`crate::cfg::convert`].
//!
//! These are the only recoverable-by-the-caller failures in this crate:
//! malformed input that the upstream emitter is supposed to rule out, but
//! which the builder verifies rather than trusting blindly. Anything else
//! is an internal invariant violation and panics instead.

use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum CfgError {
  #[error("{origin}: duplicate label `{label}`")]
  DuplicateLabel { origin: Rc<str>, label: Rc<str> },

  #[error("{origin}: jump to undefined label `{label}`")]
  UndefinedLabel { origin: Rc<str>, label: Rc<str> },

  #[error("{origin}: `{opcode}` must be the last instruction of its block, found mid-block")]
  SplitNotLast { origin: Rc<str>, opcode: String },

  #[error(
    "{origin}: opcode `{opcode}` is marked `splits_basic_block` but is not handled by any \
     jump-resolution case — coverage bug in the CFG builder"
  )]
  UnclassifiedSplittingOpcode { origin: Rc<str>, opcode: String },
}
