//! Peephole rewriter.
//!
//! Scans the linear item stream with descending window widths `[5, 4, 3, 2]`,
//! splicing in fused replacements wherever a registered [`Pattern`] matches,
//! until an entire outer pass produces no further rewrite. Patterns live in
//! a static, ordered slice rather than a dynamic plugin list, so iteration
//! is cache-friendly and registration order is the tie-break within a width.

mod catalog;
#[cfg(test)]
mod tests;

use crate::item::Item;

/// Window widths scanned in each outer iteration, widest first so that a
/// longer fusion opportunity always wins over a shorter one at the same
/// position.
const WIDTHS: [usize; 4] = [5, 4, 3, 2];

/// Tunables for [`run`]'s fixpoint loop.
///
/// The only knob this module exposes; there is no config file or
/// environment-variable surface, just a small, explicit, struct-driven
/// bound passed in by the caller.
#[derive(Clone, Copy, Debug)]
pub struct PeepholeOptions {
  /// Upper bound on outer iterations. Exceeding it is an internal invariant
  /// violation, not a silent truncation — typical streams converge in a
  /// handful of iterations.
  pub max_outer_iterations: usize,
}

impl Default for PeepholeOptions {
  fn default() -> Self {
    PeepholeOptions { max_outer_iterations: 1024 }
  }
}

/// A registered rewrite pattern.
pub struct Pattern {
  pub name: &'static str,
  /// Nominal window width; greedy-run patterns may consume more than this
  /// many items once matched.
  pub length: usize,
  pub opcodes: &'static [crate::opcode::Opcode],
  /// Optional precondition, checked after the opcode sequence matches.
  pub check: Option<fn(&[Item], usize) -> bool>,
  /// Rewrites `stream` in place at `i`, returning how many items now occupy
  /// that position so the scan can skip past the replacement.
  pub apply: fn(&mut Vec<Item>, usize) -> usize,
}

fn window_matches(stream: &[Item], i: usize, pattern: &Pattern) -> bool {
  if i + pattern.opcodes.len() > stream.len() {
    return false;
  }
  for (k, expected) in pattern.opcodes.iter().enumerate() {
    match stream[i + k].as_instruction() {
      Some(instr) if instr.opcode == *expected => {}
      _ => return false,
    }
  }
  match pattern.check {
    Some(check) => check(stream, i),
    None => true,
  }
}

fn run_pass(stream: &mut Vec<Item>, width: usize) -> bool {
  let mut changed = false;
  let mut i = 0;
  while i < stream.len() {
    let matched = catalog::PATTERNS
      .iter()
      .filter(|p| p.length == width)
      .find(|p| window_matches(stream, i, p));

    match matched {
      Some(pattern) => {
        let before = stream.len();
        let new_len = (pattern.apply)(stream, i);
        log::trace!(
          "peephole: applied `{}` at {i} ({} item(s) -> {new_len})",
          pattern.name,
          before.saturating_sub(stream.len()) + new_len
        );
        changed = true;
        i += new_len;
      }
      None => i += 1,
    }
  }
  changed
}

/// Rewrites `stream` in place until no registered pattern applies.
pub fn run(stream: &mut Vec<Item>) {
  run_with_options(stream, PeepholeOptions::default())
}

/// Like [`run`], but with an explicit iteration bound instead of the default.
pub fn run_with_options(stream: &mut Vec<Item>, options: PeepholeOptions) {
  let mut iteration = 0usize;
  loop {
    iteration += 1;
    if iteration > options.max_outer_iterations {
      panic!(
        "peephole rewrite did not converge within {} iterations — internal invariant violation",
        options.max_outer_iterations
      );
    }

    let mut changed_this_iteration = false;
    for width in WIDTHS {
      if run_pass(stream, width) {
        changed_this_iteration = true;
      }
    }
    log::debug!("peephole: outer iteration {iteration} done, changed={changed_this_iteration}");
    if !changed_this_iteration {
      log::debug!("peephole: converged after {iteration} iteration(s)");
      return;
    }
  }
}

/// Returns the location to assign to a fused replacement: the first
/// location-bearing item in the matched window.
pub(crate) fn inherit_location(window: &[Item]) -> Option<location::Location> {
  window.iter().find_map(|item| item.location().cloned())
}
