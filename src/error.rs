use std::{error::Error, fmt};

/// The arena could not move its top by the requested delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaExhausted {
  pub requested: usize,
  pub top: usize,
}

impl fmt::Display for ArenaExhausted {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "arena cannot move its top ({} bytes) by {} bytes",
      self.top, self.requested
    )
  }
}

impl Error for ArenaExhausted {}

/// Failure reported by [`Heap`](crate::Heap) operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocError {
  /// Growing the arena failed.
  ArenaExhausted(ArenaExhausted),
  /// Releasing the tail block back to the arena failed.
  ShrinkFailed(ArenaExhausted),
}

impl fmt::Display for AllocError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      AllocError::ArenaExhausted(e) => write!(f, "allocation failed: {}", e),
      AllocError::ShrinkFailed(e) => write!(f, "tail release failed: {}", e),
    }
  }
}

impl Error for AllocError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      AllocError::ArenaExhausted(e) | AllocError::ShrinkFailed(e) => Some(e),
    }
  }
}

/// A structural property of the block list does not hold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
  /// A block does not start where the previous one ends.
  Gap { offset: usize, expected_start: usize },
  /// `tail` is not the last entry of the list.
  TailMismatch { tail: Option<usize>, last: Option<usize> },
  /// The last block does not end at the arena top.
  TopMismatch { end: usize, top: usize },
}

impl fmt::Display for InvariantViolation {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      InvariantViolation::Gap {
        offset,
        expected_start,
      } => write!(
        f,
        "block at {} does not start at {}",
        offset, expected_start
      ),
      InvariantViolation::TailMismatch { tail, last } => {
        write!(f, "tail is {:?} but last block is {:?}", tail, last)
      }
      InvariantViolation::TopMismatch { end, top } => {
        write!(f, "last block ends at {} but arena top is {}", end, top)
      }
    }
  }
}

impl Error for InvariantViolation {}
