//! Scripted allocate/free sequences for checking a heap's health.

use std::{error::Error, fmt};

use crate::{
  arena::Arena,
  error::{AllocError, InvariantViolation},
  heap::{Heap, Ptr},
};

/// Sizes allocated by every scripted sequence.
pub const SCRIPT_SIZES: [usize; 3] = [10, 20, 40];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FreeOrder {
  Forward,
  Reverse,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticError {
  Alloc(AllocError),
  Invariant(InvariantViolation),
  /// Usage did not return to its starting point after a balanced sequence.
  Leak {
    order: FreeOrder,
    baseline: usize,
    usage: usize,
  },
}

impl fmt::Display for DiagnosticError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      DiagnosticError::Alloc(e) => write!(f, "{}", e),
      DiagnosticError::Invariant(e) => write!(f, "broken block list: {}", e),
      DiagnosticError::Leak {
        order,
        baseline,
        usage,
      } => write!(
        f,
        "{:?} free sequence left usage at {} bytes, expected {}",
        order, usage, baseline
      ),
    }
  }
}

impl Error for DiagnosticError {}

impl From<AllocError> for DiagnosticError {
  fn from(value: AllocError) -> Self {
    Self::Alloc(value)
  }
}

impl From<InvariantViolation> for DiagnosticError {
  fn from(value: InvariantViolation) -> Self {
    Self::Invariant(value)
  }
}

/// Allocates [`SCRIPT_SIZES`], frees them in `order`, and checks that usage
/// is back at its starting value.
pub fn run_sequence<A: Arena>(
  heap: &mut Heap<A>,
  order: FreeOrder,
) -> Result<(), DiagnosticError> {
  let baseline = heap.usage();

  let mut ptrs: Vec<Option<Ptr>> = Vec::with_capacity(SCRIPT_SIZES.len());
  for size in SCRIPT_SIZES {
    ptrs.push(heap.resize(None, 0, size)?);
  }
  heap.verify()?;

  if order == FreeOrder::Reverse {
    ptrs.reverse();
  }

  for ptr in ptrs {
    heap.resize(ptr, 0, 0)?;
    heap.verify()?;
  }

  let usage = heap.usage();
  log::debug!(target: "alloc", "{:?} sequence: usage {} (baseline {})", order, usage, baseline);

  if usage != baseline {
    return Err(DiagnosticError::Leak {
      order,
      baseline,
      usage,
    });
  }

  Ok(())
}

/// Runs the reverse-order and then the forward-order sequence.
pub fn exercise<A: Arena>(heap: &mut Heap<A>) -> Result<(), DiagnosticError> {
  run_sequence(heap, FreeOrder::Reverse)?;
  run_sequence(heap, FreeOrder::Forward)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{arena::FixedArena, config::HeapConfig};

  #[test]
  fn test_exercise_empty_heap() {
    let mut heap = Heap::fixed(HeapConfig::default()).unwrap();

    exercise(&mut heap).unwrap();
    assert_eq!(heap.usage(), 0);
  }

  #[test]
  fn test_exercise_with_live_blocks() {
    let mut heap = Heap::fixed(HeapConfig::default()).unwrap();
    let live = heap.resize(None, 0, 100).unwrap();
    let baseline = heap.usage();

    exercise(&mut heap).unwrap();
    assert_eq!(heap.usage(), baseline);

    heap.resize(live, 100, 0).unwrap();
    assert_eq!(heap.usage(), 0);
  }

  #[test]
  fn test_exercise_reports_exhaustion() {
    let mut heap = Heap::new(FixedArena::new(100).unwrap());

    let err = exercise(&mut heap).unwrap_err();
    assert!(matches!(err, DiagnosticError::Alloc(AllocError::ArenaExhausted(_))));
  }

  #[test]
  fn test_leak_message() {
    let err = DiagnosticError::Leak {
      order: FreeOrder::Forward,
      baseline: 0,
      usage: 49,
    };

    assert_eq!(
      err.to_string(),
      "Forward free sequence left usage at 49 bytes, expected 0"
    );
  }
}
