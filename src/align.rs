/// Alignment of every block header, and therefore of every payload pointer.
pub const BLOCK_ALIGN: usize = 16;

/// Rounds the given size up to the next multiple of [`BLOCK_ALIGN`].
///
/// The expression must not overflow `usize` once padded; use
/// [`checked_align`] for sizes that come straight from a caller.
///
/// # Examples
///
/// ```rust
/// use freealloc::align;
///
/// assert_eq!(align!(0), 0);
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(32), 32);
/// assert_eq!(align!(33), 48);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::BLOCK_ALIGN - 1) & !($crate::align::BLOCK_ALIGN - 1)
  };
}

/// Same as [`align!`], but returns `None` instead of overflowing.
pub const fn checked_align(value: usize) -> Option<usize> {
  match value.checked_add(BLOCK_ALIGN - 1) {
    Some(padded) => Some(padded & !(BLOCK_ALIGN - 1)),
    None => None,
  }
}
