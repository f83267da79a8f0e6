use std::ptr::{self, NonNull};

use crate::{
  block::{self, Block},
  config::{Config, CorruptionPolicy},
  error::AllocError,
  free_list::FreeList,
  heap::{self, HeapSource},
};

/// Snapshot of one free-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
  /// Address of the block header.
  pub address: usize,
  /// Payload bytes the block can hold.
  pub size: usize,
}

/// First-fit free-list allocator over a growable heap.
///
/// Each instance owns its free list and heap source; instances never share
/// blocks. Not thread-safe, see [`LockedAllocator`](crate::LockedAllocator).
pub struct FreeListAllocator<S: HeapSource> {
  free: FreeList,
  source: S,
  config: Config,
}

// The allocator exclusively owns every block reachable from its free list.
unsafe impl<S: HeapSource + Send> Send for FreeListAllocator<S> {}

impl<S: HeapSource> FreeListAllocator<S> {
  pub const fn new(source: S) -> Self {
    Self::with_config(source, Config::DEFAULT)
  }

  pub const fn with_config(
    source: S,
    config: Config,
  ) -> Self {
    Self {
      free: FreeList::new(),
      source,
      config,
    }
  }

  pub fn config(&self) -> Config {
    self.config
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  /// Free-list entries in list order, most recently released first.
  pub fn free_blocks(&self) -> impl Iterator<Item = FreeBlock> + '_ {
    self.free.iter().map(|block| FreeBlock {
      address: block.address(),
      size: block.size(),
    })
  }

  /// Finds the first free block with room for `size` bytes plus a
  /// remainder, and carves the allocation out of it.
  fn take_first_fit(
    &mut self,
    size: usize,
  ) -> Option<Block> {
    for candidate in self.free.iter() {
      if candidate.size() < size {
        continue;
      }

      // Blocks that fit but would leave no room for a remainder header are
      // passed over rather than handed out whole.
      let Some(_remainder) = candidate.split(size) else {
        log::trace!(
          "skipping {:#x}: {} bytes cannot be split for {}",
          candidate.address(),
          candidate.size(),
          size
        );
        continue;
      };

      // The remainder now follows the candidate, so unlinking the candidate
      // leaves the remainder in its place.
      self.free.remove(candidate);
      return Some(candidate);
    }

    None
  }

  /// Allocates `size` bytes.
  ///
  /// The returned pointer is aligned to [`BLOCK_ALIGN`](crate::align::BLOCK_ALIGN).
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if block::checked_footprint(size).is_none() {
      log::error!("allocation of {} bytes cannot be represented", size);
      return Err(AllocError::OutOfMemory { requested: size });
    }

    let block = match self.take_first_fit(size) {
      Some(block) => block,
      None => heap::extend(&mut self.source, size).ok_or_else(|| {
        log::error!("allocation of {} bytes failed: heap cannot grow", size);
        AllocError::OutOfMemory { requested: size }
      })?,
    };

    block.write_guard();

    log::trace!("allocated {} bytes at {:p}", size, block.payload());

    Ok(block.payload())
  }

  /// Allocates `count * size` bytes, all set to zero.
  pub fn zero_allocate(
    &mut self,
    count: usize,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let total = count.checked_mul(size).ok_or(AllocError::SizeOverflow { count, size })?;

    let payload = self.allocate(total)?;
    unsafe { ptr::write_bytes(payload.as_ptr(), 0, total) };

    Ok(payload)
  }

  /// Payload bytes recorded for a live allocation.
  ///
  /// # Safety
  ///
  /// `payload` must be a live pointer returned by this allocator.
  pub unsafe fn usable_size(
    &self,
    payload: NonNull<u8>,
  ) -> usize {
    unsafe { Block::from_payload(payload) }.size()
  }

  /// Grows an allocation to at least `new_size` bytes.
  ///
  /// `None` behaves like [`allocate`](Self::allocate). When the block
  /// already records `new_size` bytes or more the same pointer comes back
  /// untouched; the recorded size is never reduced. Otherwise the contents
  /// move to a new block and the old one is released.
  ///
  /// # Safety
  ///
  /// `payload`, if given, must be a live pointer returned by this allocator.
  /// On a move it must not be used again.
  pub unsafe fn resize(
    &mut self,
    payload: Option<NonNull<u8>>,
    new_size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let Some(payload) = payload else {
      return self.allocate(new_size);
    };

    let old = unsafe { Block::from_payload(payload) };
    if old.size() >= new_size {
      return Ok(payload);
    }

    self.check_guard(old)?;

    let moved = self.allocate(new_size)?;
    unsafe {
      ptr::copy_nonoverlapping(payload.as_ptr(), moved.as_ptr(), old.size());
      self.release(payload)?;
    }

    Ok(moved)
  }

  /// Returns an allocation to the free list and merges it with free
  /// neighbors.
  ///
  /// An overwritten guard aborts the process, or under
  /// [`CorruptionPolicy::Report`] yields [`AllocError::Corruption`] and
  /// leaves the block out of the free list.
  ///
  /// # Safety
  ///
  /// `payload` must be a live pointer returned by this allocator and must
  /// not be used afterwards.
  pub unsafe fn release(
    &mut self,
    payload: NonNull<u8>,
  ) -> Result<(), AllocError> {
    let block = unsafe { Block::from_payload(payload) };
    self.check_guard(block)?;

    self.free.push_front(block);
    let merged = self.free.coalesce(block);

    log::trace!(
      "released {:p}, free block {:#x} now holds {} bytes",
      payload,
      merged.address(),
      merged.size()
    );

    Ok(())
  }

  fn check_guard(
    &self,
    block: Block,
  ) -> Result<(), AllocError> {
    let found = block.guard();
    if found == block::GUARD {
      return Ok(());
    }

    log::error!(
      "MEMORY CORRUPTION DETECTED: block {:#x} ({} bytes) guard reads {:#010x}",
      block.address(),
      block.size(),
      found
    );

    match self.config.on_corruption {
      CorruptionPolicy::Abort => std::process::abort(),
      CorruptionPolicy::Report => Err(AllocError::Corruption {
        address: block.address(),
        found,
      }),
    }
  }
}

impl<S: HeapSource> std::fmt::Debug for FreeListAllocator<S> {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    f.debug_struct("FreeListAllocator")
      .field("free", &self.free.iter().collect::<Vec<_>>())
      .field("config", &self.config)
      .finish_non_exhaustive()
  }
}
