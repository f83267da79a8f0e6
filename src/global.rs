use std::{
  alloc::{GlobalAlloc, Layout},
  ptr::{self, NonNull},
};

use spin::Mutex;

use crate::{
  align::BLOCK_ALIGN,
  allocator::FreeListAllocator,
  config::Config,
  heap::{HeapSource, Sbrk},
};

/// A [`FreeListAllocator`] behind one spin lock, usable as
/// `#[global_allocator]`.
///
/// ```rust,ignore
/// use freealloc::{Config, LockedAllocator, Sbrk};
///
/// #[global_allocator]
/// static HEAP: LockedAllocator<Sbrk> = LockedAllocator::new(Sbrk, Config::DEFAULT);
/// ```
///
/// Layouts aligned beyond [`BLOCK_ALIGN`] are refused. Any installed logger
/// must not allocate, or it will re-enter the lock.
pub struct LockedAllocator<S: HeapSource> {
  inner: Mutex<FreeListAllocator<S>>,
}

impl<S: HeapSource> LockedAllocator<S> {
  pub const fn new(
    source: S,
    config: Config,
  ) -> Self {
    Self {
      inner: Mutex::new(FreeListAllocator::with_config(source, config)),
    }
  }

  /// Runs `f` with exclusive access to the wrapped allocator.
  pub fn with<R>(
    &self,
    f: impl FnOnce(&mut FreeListAllocator<S>) -> R,
  ) -> R {
    f(&mut self.inner.lock())
  }
}

impl LockedAllocator<Sbrk> {
  /// Allocator over the program break with default settings.
  pub const fn sbrk() -> Self {
    Self::new(Sbrk, Config::DEFAULT)
  }
}

unsafe impl<S: HeapSource + Send> GlobalAlloc for LockedAllocator<S> {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > BLOCK_ALIGN {
      return ptr::null_mut();
    }

    self.inner.lock().allocate(layout.size()).map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  unsafe fn alloc_zeroed(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > BLOCK_ALIGN {
      return ptr::null_mut();
    }

    self.inner.lock().zero_allocate(1, layout.size()).map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  unsafe fn dealloc(
    &self,
    address: *mut u8,
    _layout: Layout,
  ) {
    let Some(payload) = NonNull::new(address) else {
      return;
    };

    // Under the Report policy the corruption has already been logged and
    // there is no caller to hand it to.
    let _ = unsafe { self.inner.lock().release(payload) };
  }

  unsafe fn realloc(
    &self,
    address: *mut u8,
    layout: Layout,
    new_size: usize,
  ) -> *mut u8 {
    if layout.align() > BLOCK_ALIGN {
      return ptr::null_mut();
    }

    unsafe { self.inner.lock().resize(NonNull::new(address), new_size) }.map_or(ptr::null_mut(), NonNull::as_ptr)
  }
}
