//! In-band block layout.
//!
//! All address arithmetic on block headers lives here. The rest of the crate
//! works with [`Block`] handles and never computes header or guard offsets on
//! its own.
//!
//! ```text
//!   address                address + HEADER_SIZE + size
//!   │                      │
//!   ▼                      ▼
//!   ┌────────┬─────────────┬───────┬─────────┐
//!   │ Header │ payload     │ guard │ padding │
//!   └────────┴─────────────┴───────┴─────────┘
//!   ◄──────────────── footprint(size) ───────►
//! ```

use std::{mem, ptr, ptr::NonNull};

use crate::align;

/// Sentinel written right after every payload.
pub const GUARD: u32 = 0x0123_4567;

/// Size of the guard value in bytes.
pub const GUARD_SIZE: usize = mem::size_of::<u32>();

/// Size of the header that precedes every payload.
pub const HEADER_SIZE: usize = mem::size_of::<Header>();

#[repr(C, align(16))]
struct Header {
  size: usize,
  next: *mut Header,
}

const _: () = assert!(mem::align_of::<Header>() == align::BLOCK_ALIGN);

/// Number of heap bytes a block with a `size`-byte payload occupies.
///
/// Sizes stored in live headers always have a representable footprint.
pub const fn footprint(size: usize) -> usize {
  HEADER_SIZE + align!(size + GUARD_SIZE)
}

/// Like [`footprint`], for sizes that have not been validated yet.
pub const fn checked_footprint(size: usize) -> Option<usize> {
  let Some(with_guard) = size.checked_add(GUARD_SIZE) else {
    return None;
  };
  let Some(padded) = align::checked_align(with_guard) else {
    return None;
  };
  padded.checked_add(HEADER_SIZE)
}

/// Handle to a block header somewhere in the heap region.
///
/// A `Block` can only be obtained through the unsafe constructors below,
/// whose callers promise the header memory stays valid and exclusively owned
/// by the allocator for as long as the handle is used. The accessors rely on
/// that promise.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Block(NonNull<Header>);

impl Block {
  /// Writes a fresh header at `address`.
  ///
  /// # Safety
  ///
  /// `address` must be aligned to [`align::BLOCK_ALIGN`] and valid for
  /// writes of `footprint(size)` bytes.
  pub unsafe fn init(
    address: NonNull<u8>,
    size: usize,
  ) -> Self {
    let header = address.cast::<Header>();
    unsafe {
      header.as_ptr().write(Header {
        size,
        next: ptr::null_mut(),
      });
    }
    Self(header)
  }

  /// Recovers the block owning a payload pointer.
  ///
  /// # Safety
  ///
  /// `payload` must have been produced by [`Block::payload`].
  pub unsafe fn from_payload(payload: NonNull<u8>) -> Self {
    unsafe { Self(payload.sub(HEADER_SIZE).cast()) }
  }

  pub fn address(self) -> usize {
    self.0.as_ptr() as usize
  }

  pub fn size(self) -> usize {
    unsafe { (*self.0.as_ptr()).size }
  }

  pub fn set_size(
    self,
    size: usize,
  ) {
    unsafe { (*self.0.as_ptr()).size = size }
  }

  pub fn next(self) -> Option<Block> {
    NonNull::new(unsafe { (*self.0.as_ptr()).next }).map(Block)
  }

  pub fn set_next(
    self,
    next: Option<Block>,
  ) {
    let next = next.map_or(ptr::null_mut(), |block| block.0.as_ptr());
    unsafe { (*self.0.as_ptr()).next = next }
  }

  pub fn footprint(self) -> usize {
    footprint(self.size())
  }

  /// First address past this block, where a physical successor would start.
  pub fn end(self) -> usize {
    self.address() + self.footprint()
  }

  /// Start of the caller-visible region.
  pub fn payload(self) -> NonNull<u8> {
    unsafe { self.0.cast::<u8>().add(HEADER_SIZE) }
  }

  fn guard_ptr(self) -> *mut u32 {
    unsafe { self.payload().as_ptr().add(self.size()) as *mut u32 }
  }

  pub fn write_guard(self) {
    unsafe { self.guard_ptr().write_unaligned(GUARD) }
  }

  /// Value currently stored in the guard slot.
  pub fn guard(self) -> u32 {
    unsafe { self.guard_ptr().read_unaligned() }
  }

  /// Splits off the bytes past `footprint(size)` as a new block.
  ///
  /// Returns `None` when the leftover could not hold its own header and
  /// guard; the block is then left untouched. On success this block shrinks
  /// to `size`, the remainder takes over this block's `next` link and this
  /// block links to the remainder.
  pub fn split(
    self,
    size: usize,
  ) -> Option<Block> {
    let carved = checked_footprint(size)?;
    if self.size() < carved {
      return None;
    }

    let remainder = unsafe {
      let address = NonNull::new_unchecked((self.address() + carved) as *mut u8);
      Block::init(address, self.size() - carved)
    };
    remainder.set_next(self.next());

    self.set_size(size);
    self.set_next(Some(remainder));

    log::trace!(
      "split {:#x}: kept {} bytes, remainder {:#x} with {} bytes",
      self.address(),
      size,
      remainder.address(),
      remainder.size()
    );

    Some(remainder)
  }
}

impl std::fmt::Debug for Block {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    f.debug_struct("Block")
      .field("address", &format_args!("{:#x}", self.address()))
      .field("size", &self.size())
      .finish()
  }
}
