/// Rounds `value` up to the next multiple of `align`.
///
/// `align` must be a power of two.
///
/// # Examples
///
/// ```rust
/// use reallocator::align_to;
///
/// assert_eq!(align_to!(13, 8), 16);
/// assert_eq!(align_to!(16, 8), 16);
/// assert_eq!(align_to!(0, 16), 0);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

/// Bytes that must be skipped from `offset` to reach an `align` boundary.
pub const fn padding_for(
  offset: usize,
  align: usize,
) -> usize {
  align_to!(offset, align) - offset
}

/// Like [`align_to!`], but `None` when rounding up overflows.
pub const fn checked_align_to(
  value: usize,
  align: usize,
) -> Option<usize> {
  match value.checked_add(align - 1) {
    Some(bumped) => Some(bumped & !(align - 1)),
    None => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align_to() {
    for align in [8usize, 16, 32] {
      for i in 0..10 {
        let sizes = (align * i + 1)..=(align * (i + 1));

        for size in sizes {
          assert_eq!(align * (i + 1), align_to!(size, align));
        }
      }
    }
  }

  #[test]
  fn test_checked_align_to() {
    assert_eq!(checked_align_to(13, 8), Some(16));
    assert_eq!(checked_align_to(4096, 4096), Some(4096));
    assert_eq!(checked_align_to(usize::MAX - 10, 4096), None);
    assert_eq!(checked_align_to(usize::MAX, 1), Some(usize::MAX));
  }

  #[test]
  fn test_padding_for() {
    assert_eq!(padding_for(0, 8), 0);
    assert_eq!(padding_for(1, 8), 7);
    assert_eq!(padding_for(7, 8), 1);
    assert_eq!(padding_for(8, 8), 0);
    assert_eq!(padding_for(43, 16), 5);

    for offset in 0..64 {
      assert_eq!((offset + padding_for(offset, 8)) % 8, 0);
      assert!(padding_for(offset, 8) < 8);
    }
  }
}
