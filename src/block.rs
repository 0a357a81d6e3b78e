use std::mem;

const WORD: usize = mem::size_of::<usize>();

/// Size in bytes of the header written in front of every payload.
pub const HEADER_SIZE: usize = 4 * WORD;

/// Alignment of every header, and therefore of every payload.
pub const HEADER_ALIGN: usize = if mem::align_of::<usize>() > 8 {
  mem::align_of::<usize>()
} else {
  8
};

/// Encodes an absent `next` link.
const NIL: usize = usize::MAX;

/// Block metadata, stored in the arena right before the payload.
///
/// ```text
///   ┌─────────┬──────────┬──────────┬──────────┬──────────┬─────────────┐
///   │ padding │ padding  │   next   │   size   │  in_use  │   payload   │
///   │  bytes  │  (word)  │  (word)  │  (word)  │  (word)  │ size bytes  │
///   └─────────┴──────────┴──────────┴──────────┴──────────┴─────────────┘
///             ▲                                           ▲
///             └── header offset                           └── payload offset
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
  pub padding: usize,
  pub next: Option<usize>,
  pub size: usize,
  pub in_use: bool,
}

impl Block {
  pub fn new(
    padding: usize,
    size: usize,
  ) -> Self {
    Self {
      padding,
      next: None,
      size,
      in_use: true,
    }
  }

  /// Reads the header stored at `offset`.
  pub fn read(
    bytes: &[u8],
    offset: usize,
  ) -> Self {
    let word = |index: usize| {
      let start = offset + index * WORD;
      let mut buf = [0u8; WORD];
      buf.copy_from_slice(&bytes[start..start + WORD]);
      usize::from_ne_bytes(buf)
    };

    let next = word(1);

    Self {
      padding: word(0),
      next: if next == NIL { None } else { Some(next) },
      size: word(2),
      in_use: word(3) != 0,
    }
  }

  /// Writes this header at `offset`.
  pub fn write(
    &self,
    bytes: &mut [u8],
    offset: usize,
  ) {
    let words = [
      self.padding,
      self.next.unwrap_or(NIL),
      self.size,
      self.in_use as usize,
    ];

    for (index, value) in words.iter().enumerate() {
      let start = offset + index * WORD;
      bytes[start..start + WORD].copy_from_slice(&value.to_ne_bytes());
    }
  }

  /// Bytes of arena this block spans: padding, header and payload.
  pub fn footprint(&self) -> usize {
    self.padding + HEADER_SIZE + self.size
  }

  /// Offset of the first byte of the block's footprint.
  pub fn start(
    &self,
    offset: usize,
  ) -> usize {
    offset - self.padding
  }

  /// Offset one past the last payload byte.
  pub fn end(
    &self,
    offset: usize,
  ) -> usize {
    offset + HEADER_SIZE + self.size
  }
}

/// Payload offset of the block whose header lives at `offset`.
pub const fn payload_of(offset: usize) -> usize {
  offset + HEADER_SIZE
}

/// Header offset of the block owning the payload at `payload`.
pub const fn header_of(payload: usize) -> usize {
  payload - HEADER_SIZE
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_layout() {
    assert_eq!(HEADER_SIZE % HEADER_ALIGN, 0);
    assert!(HEADER_ALIGN >= 8);
    assert!(HEADER_ALIGN.is_power_of_two());
  }

  #[test]
  fn test_read_write() {
    let mut bytes = vec![0xFFu8; HEADER_SIZE * 3];

    let mut block = Block::new(3, 40);
    block.write(&mut bytes, 0);
    assert_eq!(Block::read(&bytes, 0), block);
    assert_eq!(Block::read(&bytes, 0).next, None);

    block.next = Some(HEADER_SIZE * 2);
    block.in_use = false;
    block.write(&mut bytes, HEADER_SIZE);

    let read = Block::read(&bytes, HEADER_SIZE);
    assert_eq!(read.padding, 3);
    assert_eq!(read.next, Some(HEADER_SIZE * 2));
    assert_eq!(read.size, 40);
    assert!(!read.in_use);
  }

  #[test]
  fn test_extent() {
    let block = Block::new(5, 11);
    let offset = 21;

    assert_eq!(block.footprint(), 5 + HEADER_SIZE + 11);
    assert_eq!(block.start(offset), 16);
    assert_eq!(block.end(offset), 21 + HEADER_SIZE + 11);
    assert_eq!(block.end(offset) - block.start(offset), block.footprint());
    assert_eq!(header_of(payload_of(offset)), offset);
  }
}
