use thiserror::Error;

/// Failures surfaced by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
  /// The heap source refused to grow, or the request cannot be represented.
  #[error("out of memory while allocating {requested} bytes")]
  OutOfMemory { requested: usize },
  /// `count * size` of a zeroed allocation does not fit in `usize`.
  #[error("zeroed allocation of {count} x {size} bytes overflows usize")]
  SizeOverflow { count: usize, size: usize },
  /// The guard after a payload was overwritten.
  #[error("memory corruption detected at {address:#x}: guard reads {found:#010x}")]
  Corruption { address: usize, found: u32 },
}
