use std::process;

use crate::{
  align::padding_for,
  arena::{Arena, FixedArena},
  block::{Block, HEADER_ALIGN, HEADER_SIZE, header_of, payload_of},
  config::{HeapConfig, OnExhaustion},
  error::{AllocError, ArenaExhausted, InvariantViolation},
};

#[cfg(unix)]
use crate::arena::MmapArena;

/// Handle to a payload handed out by a [`Heap`].
///
/// It is the payload's offset inside the heap's arena. A handle is only
/// meaningful for the heap that returned it, until it is freed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ptr(usize);

impl Ptr {
  pub fn offset(self) -> usize {
    self.0
  }
}

/// A first-fit, coalescing heap on top of an [`Arena`].
///
/// Blocks are threaded in address order from `head` to `tail`. Freed blocks
/// stay in the list for reuse; only the highest block is ever handed back to
/// the arena, once it is free and ends at the arena top.
pub struct Heap<A: Arena> {
  arena: A,
  config: HeapConfig,
  /// Arena top when the heap took over; blocks are laid out from here.
  base: usize,
  head: Option<usize>,
  tail: Option<usize>,
}

impl Heap<FixedArena> {
  /// Heap over a [`FixedArena`] of `config.arena_capacity` bytes.
  pub fn fixed(config: HeapConfig) -> Option<Self> {
    Some(Self::with_config(config.fixed_arena()?, config))
  }
}

#[cfg(unix)]
impl Heap<MmapArena> {
  /// Heap over an [`MmapArena`] reserving `config.arena_capacity` bytes.
  pub fn mmap(config: HeapConfig) -> Option<Self> {
    Some(Self::with_config(config.mmap_arena()?, config))
  }
}

impl<A: Arena> Heap<A> {
  pub fn new(arena: A) -> Self {
    Self::with_config(arena, HeapConfig::default())
  }

  pub fn with_config(
    arena: A,
    config: HeapConfig,
  ) -> Self {
    Self {
      base: arena.top(),
      arena,
      config,
      head: None,
      tail: None,
    }
  }

  pub fn arena(&self) -> &A {
    &self.arena
  }

  pub fn config(&self) -> &HeapConfig {
    &self.config
  }

  /// The single entry point for allocating, resizing and freeing.
  ///
  /// - `new_size == 0` frees `ptr` (if any) and returns `None`.
  /// - `ptr == None` allocates `new_size` zeroed bytes.
  /// - If `ptr`'s block already holds `new_size` bytes, `ptr` is returned as is.
  /// - Otherwise a new block is allocated, the first `old_size` bytes are
  ///   copied over and `ptr` is freed.
  ///
  /// `old_size` must not exceed the old block's capacity nor `new_size`;
  /// it is not checked.
  pub fn resize(
    &mut self,
    ptr: Option<Ptr>,
    old_size: usize,
    new_size: usize,
  ) -> Result<Option<Ptr>, AllocError> {
    self
      .try_resize(ptr, old_size, new_size)
      .map_err(|err| self.on_error(err))
  }

  fn try_resize(
    &mut self,
    ptr: Option<Ptr>,
    old_size: usize,
    new_size: usize,
  ) -> Result<Option<Ptr>, AllocError> {
    if new_size == 0 {
      if let Some(ptr) = ptr {
        self.deallocate(ptr)?;
      }
      return Ok(None);
    }

    let Some(ptr) = ptr else {
      return self.allocate(new_size).map(Some);
    };

    if self.capacity(ptr) >= new_size {
      return Ok(Some(ptr));
    }

    let new_ptr = self.allocate(new_size)?;
    self
      .arena
      .bytes_mut()
      .copy_within(ptr.0..ptr.0 + old_size, new_ptr.0);
    self.deallocate(ptr)?;

    Ok(Some(new_ptr))
  }

  fn on_error(
    &self,
    err: AllocError,
  ) -> AllocError {
    match self.config.on_exhaustion {
      OnExhaustion::Fail => err,
      OnExhaustion::Terminate => {
        log::error!(target: "alloc", "{}, terminating", err);
        process::exit(1);
      }
    }
  }

  /// Total bytes claimed from the arena by all blocks, free or not.
  pub fn usage(&self) -> usize {
    self.blocks().map(|block| block.footprint()).sum()
  }

  /// Usable bytes behind `ptr`; at least what was requested for it.
  pub fn capacity(
    &self,
    ptr: Ptr,
  ) -> usize {
    self.block(header_of(ptr.0)).size
  }

  /// The whole payload behind `ptr`.
  pub fn payload(
    &self,
    ptr: Ptr,
  ) -> &[u8] {
    let size = self.capacity(ptr);
    &self.arena.bytes()[ptr.0..ptr.0 + size]
  }

  pub fn payload_mut(
    &mut self,
    ptr: Ptr,
  ) -> &mut [u8] {
    let size = self.capacity(ptr);
    &mut self.arena.bytes_mut()[ptr.0..ptr.0 + size]
  }

  /// Walks the block list in address order.
  pub fn blocks(&self) -> Blocks<'_, A> {
    Blocks {
      heap: self,
      current: self.head,
    }
  }

  /// Checks that the blocks tile the arena from the heap's base up to the
  /// arena top and that `tail` is the last of them.
  pub fn verify(&self) -> Result<(), InvariantViolation> {
    let mut expected_start = self.base;
    let mut last = None;

    for block in self.blocks() {
      if block.offset.checked_sub(block.padding) != Some(expected_start) {
        return Err(InvariantViolation::Gap {
          offset: block.offset,
          expected_start,
        });
      }
      expected_start = block.end();
      last = Some(block.offset);
    }

    if last != self.tail {
      return Err(InvariantViolation::TailMismatch {
        tail: self.tail,
        last,
      });
    }

    if expected_start != self.arena.top() {
      return Err(InvariantViolation::TopMismatch {
        end: expected_start,
        top: self.arena.top(),
      });
    }

    Ok(())
  }

  fn block(
    &self,
    offset: usize,
  ) -> Block {
    Block::read(self.arena.bytes(), offset)
  }

  fn set_block(
    &mut self,
    offset: usize,
    block: &Block,
  ) {
    block.write(self.arena.bytes_mut(), offset);
  }

  fn zero_payload(
    &mut self,
    offset: usize,
    size: usize,
  ) {
    let start = payload_of(offset);
    self.arena.bytes_mut()[start..start + size].fill(0);
  }

  fn find_free_block(
    &self,
    size: usize,
  ) -> Option<usize> {
    self
      .blocks()
      .find(|block| !block.in_use && block.size >= size)
      .map(|block| block.offset)
  }

  fn allocate(
    &mut self,
    size: usize,
  ) -> Result<Ptr, AllocError> {
    if let Some(offset) = self.find_free_block(size) {
      let mut block = self.block(offset);
      block.in_use = true;
      self.set_block(offset, &block);
      self.zero_payload(offset, block.size);

      log::trace!(target: "alloc", "reused block at {} ({} bytes) for {} bytes", offset, block.size, size);

      return Ok(Ptr(payload_of(offset)));
    }

    let offset = self.grow(size)?;
    Ok(Ptr(payload_of(offset)))
  }

  /// Claims a new block at the arena top and links it after `tail`.
  fn grow(
    &mut self,
    size: usize,
  ) -> Result<usize, AllocError> {
    let delta = HEADER_SIZE
      .checked_add(size)
      .and_then(|n| n.checked_add(HEADER_ALIGN - 1))
      .ok_or(AllocError::ArenaExhausted(ArenaExhausted {
        requested: usize::MAX,
        top: self.arena.top(),
      }))?;

    let base = self.arena.grow(delta).map_err(AllocError::ArenaExhausted)?;

    let padding = padding_for(base, HEADER_ALIGN);
    let offset = base + padding;
    let block = Block::new(padding, size + (HEADER_ALIGN - 1 - padding));

    self.set_block(offset, &block);
    self.zero_payload(offset, block.size);

    match self.tail {
      Some(tail) => {
        let mut last = self.block(tail);
        last.next = Some(offset);
        self.set_block(tail, &last);
      }
      None => self.head = Some(offset),
    }
    self.tail = Some(offset);

    log::trace!(
      target: "alloc",
      "grew arena by {} bytes: block at {} (padding {}, size {})",
      delta,
      offset,
      padding,
      block.size
    );

    Ok(offset)
  }

  fn deallocate(
    &mut self,
    ptr: Ptr,
  ) -> Result<(), AllocError> {
    let offset = header_of(ptr.0);
    let mut block = self.block(offset);
    block.in_use = false;
    self.set_block(offset, &block);

    log::trace!(target: "alloc", "freed block at {} ({} bytes)", offset, block.size);

    self.coalesce();
    self.release_tail()
  }

  /// Merges every run of address-contiguous free blocks, scanning the whole
  /// list once.
  fn coalesce(&mut self) {
    let mut current = self.head;

    while let Some(offset) = current {
      let mut block = self.block(offset);
      let Some(next_offset) = block.next else {
        break;
      };
      let next = self.block(next_offset);

      if block.in_use || next.in_use || block.end(offset) != next.start(next_offset) {
        current = Some(next_offset);
        continue;
      }

      block.size += next.footprint();
      block.next = next.next;
      self.set_block(offset, &block);

      if self.tail == Some(next_offset) {
        self.tail = Some(offset);
      }

      log::trace!(target: "alloc", "merged block at {} into block at {} ({} bytes)", next_offset, offset, block.size);
    }
  }

  /// Hands the tail back to the arena if it is free and ends at the top.
  fn release_tail(&mut self) -> Result<(), AllocError> {
    let Some(tail) = self.tail else {
      return Ok(());
    };

    let block = self.block(tail);

    if block.in_use || block.end(tail) != self.arena.top() {
      return Ok(());
    }

    let previous = self.predecessor(tail);

    self
      .arena
      .shrink(block.footprint())
      .map_err(AllocError::ShrinkFailed)?;

    match previous {
      Some(offset) => {
        let mut last = self.block(offset);
        last.next = None;
        self.set_block(offset, &last);
        self.tail = Some(offset);
      }
      None => {
        self.head = None;
        self.tail = None;
      }
    }

    log::trace!(target: "alloc", "released tail at {} ({} bytes) to the arena", tail, block.footprint());

    Ok(())
  }

  fn predecessor(
    &self,
    offset: usize,
  ) -> Option<usize> {
    self
      .blocks()
      .find(|block| block.next == Some(offset))
      .map(|block| block.offset)
  }
}

/// Snapshot of one block, as seen by [`Heap::blocks`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
  /// Arena offset of the header.
  pub offset: usize,
  pub padding: usize,
  pub size: usize,
  pub in_use: bool,
  next: Option<usize>,
}

impl BlockInfo {
  pub fn payload(&self) -> Ptr {
    Ptr(payload_of(self.offset))
  }

  pub fn footprint(&self) -> usize {
    self.padding + HEADER_SIZE + self.size
  }

  /// Offset one past the last payload byte.
  pub fn end(&self) -> usize {
    payload_of(self.offset) + self.size
  }
}

pub struct Blocks<'a, A: Arena> {
  heap: &'a Heap<A>,
  current: Option<usize>,
}

impl<A: Arena> Iterator for Blocks<'_, A> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<Self::Item> {
    let offset = self.current?;
    let block = self.heap.block(offset);
    self.current = block.next;

    Some(BlockInfo {
      offset,
      padding: block.padding,
      size: block.size,
      in_use: block.in_use,
      next: block.next,
    })
  }
}
