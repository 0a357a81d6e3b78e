use std::{ptr, slice};

use libc::{
  MADV_DONTNEED, MAP_ANONYMOUS, MAP_FAILED, MAP_NORESERVE, MAP_PRIVATE, PROT_READ, PROT_WRITE,
  c_int, c_void,
};

use super::{Arena, checked_grow, checked_shrink};
use crate::{align::checked_align_to, error::ArenaExhausted};

const PROT: c_int = PROT_READ | PROT_WRITE;
const FLAGS: c_int = MAP_NORESERVE | MAP_PRIVATE | MAP_ANONYMOUS;

fn page_size() -> usize {
  match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
    size if size > 0 => size as usize,
    _ => 4096,
  }
}

/// Arena backed by an anonymous memory mapping.
///
/// The mapping reserves address space only; pages are committed by the kernel
/// on first touch. Shrinking hands every page lying wholly above the new top
/// back to the OS.
pub struct MmapArena {
  base: *mut u8,
  reserved: usize,
  page_size: usize,
  top: usize,
}

impl MmapArena {
  /// Reserves at least `capacity` bytes of address space.
  pub fn new(capacity: usize) -> Option<Self> {
    let page_size = page_size();
    let reserved = checked_align_to(capacity.max(1), page_size)?;

    let base = unsafe { libc::mmap(ptr::null_mut(), reserved, PROT, FLAGS, -1, 0) };

    if base == MAP_FAILED {
      log::warn!(target: "alloc", "mmap of {} bytes failed", reserved);
      return None;
    }

    log::debug!(target: "alloc", "mmap arena reserved: {:p} ({} bytes)", base, reserved);

    Some(Self {
      base: base as *mut u8,
      reserved,
      page_size,
      top: 0,
    })
  }

  pub fn capacity(&self) -> usize {
    self.reserved
  }

  /// Returns the pages between `new_top` and `old_top` to the OS.
  fn release_pages(
    &self,
    new_top: usize,
    old_top: usize,
  ) {
    let start = crate::align_to!(new_top, self.page_size);
    let end = crate::align_to!(old_top, self.page_size);

    if end <= start {
      return;
    }

    let res = unsafe { libc::madvise(self.base.add(start) as *mut c_void, end - start, MADV_DONTNEED) };

    if res != 0 {
      log::warn!(target: "alloc", "madvise({:p}, {}) failed", unsafe { self.base.add(start) }, end - start);
    } else {
      log::trace!(target: "alloc", "released {} pages to the OS", (end - start) / self.page_size);
    }
  }
}

impl Arena for MmapArena {
  fn grow(
    &mut self,
    delta: usize,
  ) -> Result<usize, ArenaExhausted> {
    let old_top = self.top;
    self.top = checked_grow(self.top, delta, self.reserved)?;
    Ok(old_top)
  }

  fn shrink(
    &mut self,
    delta: usize,
  ) -> Result<(), ArenaExhausted> {
    let old_top = self.top;
    self.top = checked_shrink(self.top, delta)?;
    self.release_pages(self.top, old_top);
    Ok(())
  }

  fn top(&self) -> usize {
    self.top
  }

  fn bytes(&self) -> &[u8] {
    unsafe { slice::from_raw_parts(self.base, self.top) }
  }

  fn bytes_mut(&mut self) -> &mut [u8] {
    unsafe { slice::from_raw_parts_mut(self.base, self.top) }
  }
}

impl Drop for MmapArena {
  fn drop(&mut self) {
    log::debug!(target: "alloc", "mmap arena unmapped: {:p}", self.base);
    unsafe {
      libc::munmap(self.base as *mut c_void, self.reserved);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_reservation() {
    let arena = MmapArena::new(100).unwrap();

    assert!(arena.capacity() >= 100);
    assert_eq!(arena.capacity() % page_size(), 0);
    assert_eq!(arena.base as usize % page_size(), 0);
    assert_eq!(arena.top(), 0);
  }

  #[test]
  fn test_shrink_releases_pages() {
    let page = page_size();
    let mut arena = MmapArena::new(page * 4).unwrap();

    arena.grow(page * 3).unwrap();
    arena.bytes_mut().fill(0xAB);

    arena.shrink(page * 2 + 1).unwrap();
    assert_eq!(arena.top(), page - 1);
    assert!(arena.bytes().iter().all(|b| *b == 0xAB));

    arena.grow(page * 2 + 1).unwrap();
    assert_eq!(arena.bytes()[page - 2], 0xAB);

    // Linux hands released anonymous pages back zeroed.
    #[cfg(target_os = "linux")]
    assert!(arena.bytes()[page..].iter().all(|b| *b == 0));
  }

  #[test]
  fn test_exhaustion() {
    let mut arena = MmapArena::new(1).unwrap();
    let capacity = arena.capacity();

    assert_eq!(arena.grow(capacity).unwrap(), 0);
    assert!(arena.grow(1).is_err());
    assert!(arena.shrink(capacity + 1).is_err());
    assert_eq!(arena.top(), capacity);
  }

  #[test]
  fn test_oversized_reservation() {
    assert!(MmapArena::new(usize::MAX - 10).is_none());
    assert!(MmapArena::new(usize::MAX).is_none());
  }
}
