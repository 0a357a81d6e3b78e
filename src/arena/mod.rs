//! Arena growth primitives.
//!
//! An arena is one contiguous region whose tail can be moved up or down by an
//! exact byte delta, like the program break moved by `sbrk(2)`:
//!
//! ```text
//!   offset 0                                  top              capacity
//!   ├───────────────── claimed ────────────────┤──── reserved ────┤
//!                                              │
//!                               grow(n) ──────►│◄────── shrink(n)
//! ```
//!
//! The heap never sees machine addresses: every block is named by its offset
//! from the arena base. Bases are aligned to [`ARENA_ALIGN`], so an offset
//! aligned to the header alignment is an aligned address as well.

use crate::{block::HEADER_ALIGN, error::ArenaExhausted};

mod fixed;
#[cfg(unix)]
mod mmap;

pub use fixed::FixedArena;
#[cfg(unix)]
pub use mmap::MmapArena;

/// Minimum alignment of every arena base address.
pub const ARENA_ALIGN: usize = if HEADER_ALIGN > 16 { HEADER_ALIGN } else { 16 };

pub trait Arena {
  /// Moves the top up by `delta` bytes, returning the previous top.
  fn grow(
    &mut self,
    delta: usize,
  ) -> Result<usize, ArenaExhausted>;

  /// Moves the top down by `delta` bytes.
  ///
  /// Callers only hand back bytes at the very top that they grew earlier.
  fn shrink(
    &mut self,
    delta: usize,
  ) -> Result<(), ArenaExhausted>;

  /// Current top, i.e. the number of claimed bytes.
  fn top(&self) -> usize;

  /// The claimed bytes `[0, top)`.
  fn bytes(&self) -> &[u8];

  fn bytes_mut(&mut self) -> &mut [u8];
}

/// Top after growing `top` by `delta` within `capacity`.
pub(crate) fn checked_grow(
  top: usize,
  delta: usize,
  capacity: usize,
) -> Result<usize, ArenaExhausted> {
  match top.checked_add(delta) {
    Some(new_top) if new_top <= capacity => Ok(new_top),
    _ => Err(ArenaExhausted {
      requested: delta,
      top,
    }),
  }
}

/// Top after shrinking `top` by `delta`.
pub(crate) fn checked_shrink(
  top: usize,
  delta: usize,
) -> Result<usize, ArenaExhausted> {
  top.checked_sub(delta).ok_or(ArenaExhausted {
    requested: delta,
    top,
  })
}
