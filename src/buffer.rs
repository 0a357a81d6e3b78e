use crate::{arena::Arena, error::AllocError, heap::Heap, heap::Ptr};

/// Next capacity for a buffer currently holding `capacity` bytes.
pub const fn grow_capacity(capacity: usize) -> usize {
  if capacity < 8 { 8 } else { capacity * 2 }
}

/// A growable byte buffer whose storage lives in a [`Heap`].
///
/// The buffer does not own the heap; every call that touches storage takes it
/// explicitly. Storage is released with [`ByteBuf::free`], not on drop.
#[derive(Debug, Default)]
pub struct ByteBuf {
  ptr: Option<Ptr>,
  len: usize,
  capacity: usize,
}

impl ByteBuf {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn push<A: Arena>(
    &mut self,
    heap: &mut Heap<A>,
    byte: u8,
  ) -> Result<(), AllocError> {
    let ptr = match self.ptr {
      Some(ptr) if self.len < self.capacity => ptr,
      _ => {
        let capacity = grow_capacity(self.capacity);
        let Some(ptr) = heap.resize(self.ptr, self.capacity, capacity)? else {
          unreachable!("non-zero resize always yields storage");
        };
        self.ptr = Some(ptr);
        self.capacity = capacity;
        ptr
      }
    };

    heap.payload_mut(ptr)[self.len] = byte;
    self.len += 1;

    Ok(())
  }

  pub fn extend_from_slice<A: Arena>(
    &mut self,
    heap: &mut Heap<A>,
    bytes: &[u8],
  ) -> Result<(), AllocError> {
    for byte in bytes {
      self.push(heap, *byte)?;
    }
    Ok(())
  }

  pub fn as_slice<'h, A: Arena>(
    &self,
    heap: &'h Heap<A>,
  ) -> &'h [u8] {
    match self.ptr {
      Some(ptr) => &heap.payload(ptr)[..self.len],
      None => &[],
    }
  }

  /// Hands the storage back to the heap and leaves the buffer empty.
  pub fn free<A: Arena>(
    &mut self,
    heap: &mut Heap<A>,
  ) -> Result<(), AllocError> {
    heap.resize(self.ptr.take(), self.capacity, 0)?;
    self.len = 0;
    self.capacity = 0;
    Ok(())
  }
}
