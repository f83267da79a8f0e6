//! Where new heap memory comes from.

use std::{alloc, ptr::NonNull};

use libc::{c_void, intptr_t, sbrk};

use crate::{
  align::{self, BLOCK_ALIGN},
  block::{self, Block},
};

/// Supplier of raw memory for the allocator.
///
/// The allocator never gives memory back, so a source only has to grow.
pub trait HeapSource {
  /// Extends the heap by `bytes`, returning the start of the new region or
  /// `None` if the request is refused.
  ///
  /// # Safety
  ///
  /// A returned region must be aligned to [`BLOCK_ALIGN`], valid for reads
  /// and writes of `bytes` bytes, and must not be handed out again.
  unsafe fn grow(
    &mut self,
    bytes: usize,
  ) -> Option<NonNull<u8>>;
}

/// The process program break, moved with `sbrk(2)`.
///
/// Nothing else in the process may shrink the break while blocks obtained
/// from it are in use.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sbrk;

impl HeapSource for Sbrk {
  unsafe fn grow(
    &mut self,
    bytes: usize,
  ) -> Option<NonNull<u8>> {
    unsafe {
      let current = sbrk(0);
      if current == usize::MAX as *mut c_void {
        return None;
      }

      let padding = align::checked_align(current as usize)? - current as usize;
      let increment = intptr_t::try_from(bytes.checked_add(padding)?).ok()?;

      let address = sbrk(increment);
      if address == usize::MAX as *mut c_void {
        return None;
      }

      NonNull::new((address as *mut u8).add(padding))
    }
  }
}

/// Fixed-capacity region reserved up front and handed out front to back.
///
/// Gives each allocator instance a private heap that cannot interfere with
/// the program break.
pub struct Arena {
  start: NonNull<u8>,
  capacity: usize,
  used: usize,
}

// The arena exclusively owns its region.
unsafe impl Send for Arena {}

impl Arena {
  /// Reserves `capacity` bytes, rounded up to [`BLOCK_ALIGN`].
  ///
  /// # Panics
  ///
  /// Panics if the rounded capacity is zero or overflows, and aborts through
  /// [`alloc::handle_alloc_error`] if the system allocator refuses.
  pub fn with_capacity(capacity: usize) -> Self {
    let capacity = align::checked_align(capacity.max(1)).expect("arena capacity overflows usize");
    let layout = Self::layout(capacity);

    let start = NonNull::new(unsafe { alloc::alloc(layout) }).unwrap_or_else(|| alloc::handle_alloc_error(layout));

    Self {
      start,
      capacity,
      used: 0,
    }
  }

  fn layout(capacity: usize) -> alloc::Layout {
    alloc::Layout::from_size_align(capacity, BLOCK_ALIGN).expect("arena capacity exceeds isize::MAX")
  }

  pub fn start(&self) -> NonNull<u8> {
    self.start
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bytes handed out so far.
  pub fn used(&self) -> usize {
    self.used
  }
}

impl HeapSource for Arena {
  unsafe fn grow(
    &mut self,
    bytes: usize,
  ) -> Option<NonNull<u8>> {
    let bytes = align::checked_align(bytes)?;
    if bytes > self.capacity - self.used {
      return None;
    }

    let address = unsafe { self.start.add(self.used) };
    self.used += bytes;
    Some(address)
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.start.as_ptr(), Self::layout(self.capacity)) }
  }
}

impl std::fmt::Debug for Arena {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    f.debug_struct("Arena")
      .field("start", &self.start)
      .field("capacity", &self.capacity)
      .field("used", &self.used)
      .finish()
  }
}

/// Grows the heap by one block able to hold `size` payload bytes.
///
/// The new block has no successor and is not on the free list.
pub(crate) fn extend<S: HeapSource>(
  source: &mut S,
  size: usize,
) -> Option<Block> {
  let bytes = block::checked_footprint(size)?;

  let Some(address) = (unsafe { source.grow(bytes) }) else {
    log::warn!("heap source refused to grow by {} bytes", bytes);
    return None;
  };

  log::debug!("heap grew by {} bytes at {:p}", bytes, address);

  Some(unsafe { Block::init(address, size) })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::footprint;

  struct Refuse;

  impl HeapSource for Refuse {
    unsafe fn grow(
      &mut self,
      _bytes: usize,
    ) -> Option<NonNull<u8>> {
      None
    }
  }

  #[test]
  fn test_arena_hands_out_contiguous_regions() {
    let mut arena = Arena::with_capacity(100);
    assert_eq!(arena.capacity(), 112);

    unsafe {
      let first = arena.grow(32).unwrap();
      let second = arena.grow(48).unwrap();

      assert_eq!(first, arena.start());
      assert_eq!(second.as_ptr() as usize, first.as_ptr() as usize + 32);
      assert_eq!(first.as_ptr() as usize % BLOCK_ALIGN, 0);
      assert_eq!(arena.used(), 80);

      assert!(arena.grow(48).is_none());
      assert_eq!(arena.used(), 80);
      assert!(arena.grow(32).is_some());
      assert_eq!(arena.used(), 112);
    }
  }

  #[test]
  fn test_extend_writes_fresh_header() {
    let mut arena = Arena::with_capacity(1024);

    let block = extend(&mut arena, 100).unwrap();

    assert_eq!(block.address(), arena.start().as_ptr() as usize);
    assert_eq!(block.size(), 100);
    assert_eq!(block.next(), None);
    assert_eq!(arena.used(), footprint(100));
  }

  #[test]
  fn test_extend_propagates_refusal() {
    assert!(extend(&mut Refuse, 16).is_none());
  }

  #[test]
  fn test_extend_rejects_unrepresentable_sizes() {
    let mut arena = Arena::with_capacity(64);

    assert!(extend(&mut arena, usize::MAX).is_none());
    assert_eq!(arena.used(), 0);
  }
}
