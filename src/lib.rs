//! # reallocator - A Free-List Heap on a Growable Arena
//!
//! This crate provides a manual heap allocator that manages one contiguous
//! arena whose top can be moved up and down, the way `sbrk(2)` moves the
//! program break. Allocation, resizing and freeing all go through a single
//! realloc-style entry point, [`Heap::resize`].
//!
//! ## Overview
//!
//! ```text
//!   Heap layout inside the arena:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                              ARENA                                   │
//!   │                                                                      │
//!   │   ┌──────┬────────┬──┬──────┬────────┬──────┬──────────┬─────────┐   │
//!   │   │ hdr  │ used   │p │ hdr  │ free   │ hdr  │ used     │         │   │
//!   │   └──────┴────────┴──┴──────┴────────┴──────┴──────────┴─────────┘   │
//!   │   ▲ head                                ▲ tail                   ▲   │
//!   │   │                                     │                        │   │
//!   │   └──────── next ──────►└──── next ────►┘                  Arena top │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   p = alignment padding in front of a header.
//! ```
//!
//! - **First-fit reuse**: allocation takes the first free block, in address
//!   order, that is large enough. Reused blocks are zeroed in full.
//! - **Growth**: when nothing fits, a new block is claimed at the arena top.
//! - **Coalescing**: every free merges all adjacent free blocks.
//! - **Tail release**: a free block ending at the arena top is handed back.
//!
//! ## Crate Structure
//!
//! ```text
//!   reallocator
//!   ├── align        - Alignment macro and padding arithmetic
//!   ├── arena        - Arena trait, FixedArena and MmapArena
//!   ├── block        - Block header layout (internal)
//!   ├── buffer       - ByteBuf, a growable buffer stored in a Heap
//!   ├── config       - HeapConfig and environment overrides
//!   ├── diagnostics  - Scripted allocate/free health checks
//!   ├── error        - Error types
//!   └── heap         - Heap, the allocator itself
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use reallocator::{FixedArena, Heap};
//!
//! let mut heap = Heap::new(FixedArena::new(4096).unwrap());
//!
//! // Allocate 16 zeroed bytes.
//! let ptr = heap.resize(None, 0, 16).unwrap().unwrap();
//! heap.payload_mut(ptr)[..5].copy_from_slice(b"hello");
//!
//! // Grow to 64 bytes, moving the first 16 bytes.
//! let ptr = heap.resize(Some(ptr), 16, 64).unwrap().unwrap();
//! assert_eq!(&heap.payload(ptr)[..5], b"hello");
//!
//! // Free it; the arena shrinks back to nothing.
//! assert_eq!(heap.resize(Some(ptr), 64, 0).unwrap(), None);
//! assert_eq!(heap.usage(), 0);
//! ```
//!
//! ## Block Layout
//!
//! ```text
//!   Single Block:
//!   ┌─────────┬───────────────────────┬────────────────────────────────┐
//!   │ padding │    Block Header       │         Payload                │
//!   │         │  ┌─────────────────┐  │                                │
//!   │         │  │ padding         │  │  ┌──────────────────────────┐  │
//!   │         │  │ next            │  │  │  size bytes, zeroed on   │  │
//!   │         │  │ size            │  │  │  every hand-out          │  │
//!   │         │  │ in_use          │  │  └──────────────────────────┘  │
//!   │         │  └─────────────────┘  │                                │
//!   └─────────┴───────────────────────┴────────────────────────────────┘
//!                                     ▲
//!                                     └── Ptr returned to the caller
//! ```
//!
//! Blocks are addressed by their offset in the arena, so a [`Ptr`] is an
//! offset and payloads are reached through [`Heap::payload`] and
//! [`Heap::payload_mut`].
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives
//! - **No splitting**: a large free block is handed out whole
//! - **No in-place shrinking**: shrink requests keep the block as is
//! - **Unchecked misuse**: double frees and foreign handles are not detected

pub mod align;
pub mod arena;
mod block;
pub mod buffer;
pub mod config;
pub mod diagnostics;
pub mod error;
mod heap;

pub use arena::{Arena, FixedArena};
#[cfg(unix)]
pub use arena::MmapArena;
pub use block::{HEADER_ALIGN, HEADER_SIZE};
pub use buffer::ByteBuf;
pub use config::{HeapConfig, OnExhaustion};
pub use error::{AllocError, ArenaExhausted, InvariantViolation};
pub use heap::{BlockInfo, Blocks, Heap, Ptr};
