//! # freealloc - A First-Fit Free-List Allocator
//!
//! This crate provides a **free-list allocator** that grows a single heap
//! region on demand (by default through the `sbrk` system call) and recycles
//! released blocks through an in-band linked list.
//!
//! ## Overview
//!
//! Every block carries a small header in front of its payload and a guard
//! value right after it:
//!
//! ```text
//!   Single Block:
//!   ┌──────────────────┬────────────────────────────┬────────────┬─────────┐
//!   │   Block Header   │          User Data         │   Guard    │ Padding │
//!   │  ┌────────────┐  │                            │ 0x01234567 │         │
//!   │  │ size: N    │  │      N bytes usable        │            │         │
//!   │  │ next: ptr  │  │                            │            │         │
//!   │  └────────────┘  │                            │            │         │
//!   │     16 bytes     │                            │  4 bytes   │ to 16   │
//!   └──────────────────┴────────────────────────────┴────────────┴─────────┘
//!                      ▲
//!                      └── Pointer returned to user (16-byte aligned)
//! ```
//!
//! Released blocks are pushed onto the front of the free list. The list is
//! not sorted; the `next` links follow release order while blocks sit
//! wherever they were carved in memory:
//!
//! ```text
//!   head ──► ┌───┐ ─────────────────────────► ┌───┐ ──► null
//!            │ C │ ◄─┐                        │ A │
//!            └───┘   │                        └───┘
//!
//!   Heap:   ┌─────┬─────┬─────┬─────┐
//!           │  A  │  B  │  C  │  D  │        A, C free; B, D in use
//!           └─────┴─────┴─────┴─────┘
//! ```
//!
//! Allocation takes the first free block that can be **split** into the
//! requested size plus a remainder with its own header; the remainder stays
//! on the list. If nothing qualifies the heap grows. Releasing a block
//! **coalesces** it with free blocks that touch it in memory, so releasing
//! `B` above leaves a single free block spanning `A`, `B` and `C`.
//!
//! ## Crate Structure
//!
//! ```text
//!   freealloc
//!   ├── align      - Block alignment (align! macro)
//!   ├── block      - Header layout, guard and splitting (internal)
//!   ├── free_list  - Free list and neighbor lookups (internal)
//!   ├── coalesce   - Merging of adjacent free blocks (internal)
//!   ├── heap       - Heap sources: Sbrk and Arena
//!   ├── allocator  - FreeListAllocator
//!   ├── global     - LockedAllocator (GlobalAlloc adapter)
//!   ├── config     - Corruption policy
//!   └── error      - AllocError
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use freealloc::{Arena, FreeListAllocator};
//!
//! let mut allocator = FreeListAllocator::new(Arena::with_capacity(4096));
//!
//! let ptr = allocator.allocate(8).unwrap().cast::<u64>();
//! unsafe {
//!     ptr.write(42);
//!     assert_eq!(ptr.read(), 42);
//!
//!     allocator.release(ptr.cast()).unwrap();
//! }
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded core**: `FreeListAllocator` has no locking; wrap it in
//!   `LockedAllocator` to share it
//! - **Grow-only heap**: memory is never handed back to the OS
//! - **Linear scans**: first-fit search and neighbor lookups walk the list
//! - **No over-aligned layouts**: alignment is fixed at 16 bytes
//!
//! ## Safety
//!
//! Releasing or resizing a pointer this allocator did not hand out, or using
//! a pointer after releasing it, is undefined behavior. Writing past a
//! payload is caught on release by the guard check, which aborts the process
//! unless [`CorruptionPolicy::Report`] is configured.

pub mod align;
mod allocator;
mod block;
mod coalesce;
mod config;
mod error;
mod free_list;
mod global;
mod heap;

pub use allocator::{FreeBlock, FreeListAllocator};
pub use block::{GUARD, GUARD_SIZE, HEADER_SIZE, checked_footprint, footprint};
pub use config::{Config, CorruptionPolicy, ON_CORRUPTION_VAR};
pub use error::AllocError;
pub use global::LockedAllocator;
pub use heap::{Arena, HeapSource, Sbrk};
