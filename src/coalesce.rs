use crate::{block::Block, free_list::FreeList};

impl FreeList {
  /// Merges a just-pushed `block` with its free physical neighbors.
  ///
  /// The predecessor is tried first; the successor is then looked up from
  /// the end of whatever block survived. Absorbed blocks are unlinked from
  /// the list, so each contiguous free run ends up as a single entry.
  /// Returns the surviving block.
  pub fn coalesce(
    &mut self,
    block: Block,
  ) -> Block {
    let mut block = block;

    if let Some(prev) = self.find_prev(block) {
      self.remove(block);
      prev.set_size(prev.size() + block.footprint());
      log::trace!("coalesced {:#x} into predecessor {:#x}", block.address(), prev.address());
      block = prev;
    }

    if let Some(next) = self.find_next(block) {
      self.remove(next);
      block.set_size(block.size() + next.footprint());
      log::trace!("coalesced successor {:#x} into {:#x}", next.address(), block.address());
    }

    block
  }
}
