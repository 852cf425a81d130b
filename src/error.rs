//! Top-level error type: a subsystem-wrapping `Error` enum, one variant per
//! fallible subsystem.

use crate::cfg::error::CfgError;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error(transparent)]
  Cfg(#[from] CfgError),
}
