use std::{
  alloc::{self, Layout},
  ptr::NonNull,
  slice,
};

use super::{ARENA_ALIGN, Arena, checked_grow, checked_shrink};
use crate::error::ArenaExhausted;

/// Arena carved out of one zeroed allocation of fixed capacity.
///
/// The whole capacity is reserved up front, so the base never moves and
/// growth past the capacity fails.
pub struct FixedArena {
  base: NonNull<u8>,
  layout: Layout,
  capacity: usize,
  top: usize,
}

impl FixedArena {
  /// Reserves `capacity` bytes from the global allocator.
  pub fn new(capacity: usize) -> Option<Self> {
    let layout = Layout::from_size_align(capacity.max(1), ARENA_ALIGN).ok()?;
    let base = NonNull::new(unsafe { alloc::alloc_zeroed(layout) })?;

    log::debug!(target: "alloc", "fixed arena reserved: {:p} ({} bytes)", base, capacity);

    Some(Self {
      base,
      layout,
      capacity,
      top: 0,
    })
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }
}

impl Arena for FixedArena {
  fn grow(
    &mut self,
    delta: usize,
  ) -> Result<usize, ArenaExhausted> {
    let old_top = self.top;
    self.top = checked_grow(self.top, delta, self.capacity)?;
    Ok(old_top)
  }

  fn shrink(
    &mut self,
    delta: usize,
  ) -> Result<(), ArenaExhausted> {
    self.top = checked_shrink(self.top, delta)?;
    Ok(())
  }

  fn top(&self) -> usize {
    self.top
  }

  fn bytes(&self) -> &[u8] {
    unsafe { slice::from_raw_parts(self.base.as_ptr(), self.top) }
  }

  fn bytes_mut(&mut self) -> &mut [u8] {
    unsafe { slice::from_raw_parts_mut(self.base.as_ptr(), self.top) }
  }
}

impl Drop for FixedArena {
  fn drop(&mut self) {
    log::debug!(target: "alloc", "fixed arena released: {:p}", self.base);
    unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_grow_and_shrink() {
    let mut arena = FixedArena::new(64).unwrap();

    assert_eq!(arena.top(), 0);
    assert_eq!(arena.grow(10).unwrap(), 0);
    assert_eq!(arena.grow(20).unwrap(), 10);
    assert_eq!(arena.top(), 30);
    assert_eq!(arena.bytes().len(), 30);

    arena.bytes_mut()[29] = 7;
    assert_eq!(arena.bytes()[29], 7);

    arena.shrink(20).unwrap();
    assert_eq!(arena.top(), 10);
    assert_eq!(arena.bytes().len(), 10);
  }

  #[test]
  fn test_exhaustion() {
    let mut arena = FixedArena::new(32).unwrap();

    assert_eq!(arena.grow(32).unwrap(), 0);
    assert_eq!(
      arena.grow(1),
      Err(ArenaExhausted {
        requested: 1,
        top: 32
      })
    );
    assert_eq!(arena.top(), 32);

    assert!(arena.shrink(33).is_err());
    assert_eq!(arena.top(), 32);
  }

  #[test]
  fn test_base_alignment() {
    let arena = FixedArena::new(8).unwrap();
    assert_eq!(arena.base.as_ptr() as usize % ARENA_ALIGN, 0);

    let mut empty = FixedArena::new(0).unwrap();
    assert!(empty.grow(1).is_err());
  }
}
