use crate::block::Block;

/// Unused blocks, threaded through their own headers.
///
/// The chain is kept in insertion order (most recently pushed first), not in
/// address order, so the physical-neighbor queries scan the whole list.
pub(crate) struct FreeList {
  head: Option<Block>,
}

impl FreeList {
  pub const fn new() -> Self {
    Self { head: None }
  }

  pub fn iter(&self) -> Iter {
    Iter { current: self.head }
  }

  pub fn push_front(
    &mut self,
    block: Block,
  ) {
    block.set_next(self.head);
    self.head = Some(block);
  }

  /// Unlinks `block`. Does nothing when it is not a member.
  pub fn remove(
    &mut self,
    block: Block,
  ) {
    if self.head == Some(block) {
      self.head = block.next();
      return;
    }

    let mut current = self.head;
    while let Some(node) = current {
      if node.next() == Some(block) {
        node.set_next(block.next());
        return;
      }
      current = node.next();
    }
  }

  /// Free block that ends exactly where `block` starts.
  pub fn find_prev(
    &self,
    block: Block,
  ) -> Option<Block> {
    self.iter().find(|candidate| candidate.end() == block.address())
  }

  /// Free block that starts exactly where `block` ends.
  pub fn find_next(
    &self,
    block: Block,
  ) -> Option<Block> {
    let end = block.end();
    self.iter().find(|candidate| candidate.address() == end)
  }
}

pub(crate) struct Iter {
  current: Option<Block>,
}

impl Iterator for Iter {
  type Item = Block;

  fn next(&mut self) -> Option<Block> {
    let block = self.current?;
    self.current = block.next();
    Some(block)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::tests::Region;

  /// Three physically adjacent 64-byte blocks at offsets 0, 96 and 192.
  fn adjacent(region: &mut Region) -> [Block; 3] {
    unsafe {
      [
        Block::init(region.at(0), 64),
        Block::init(region.at(96), 64),
        Block::init(region.at(192), 64),
      ]
    }
  }

  #[test]
  fn test_push_front_is_lifo() {
    let mut region = Region::new();
    let [a, b, c] = adjacent(&mut region);
    let mut list = FreeList::new();
    assert_eq!(list.iter().next(), None);

    list.push_front(a);
    list.push_front(c);
    list.push_front(b);

    assert_eq!(list.iter().collect::<Vec<_>>(), vec![b, c, a]);
  }

  #[test]
  fn test_remove() {
    let mut region = Region::new();
    let [a, b, c] = adjacent(&mut region);
    let mut list = FreeList::new();
    list.push_front(a);
    list.push_front(b);
    list.push_front(c);

    list.remove(b);
    assert_eq!(list.iter().collect::<Vec<_>>(), vec![c, a]);

    list.remove(c);
    assert_eq!(list.iter().collect::<Vec<_>>(), vec![a]);

    list.remove(a);
    assert_eq!(list.iter().next(), None);
  }

  #[test]
  fn test_remove_absent_block_keeps_chain() {
    let mut region = Region::new();
    let [a, b, c] = adjacent(&mut region);
    let mut list = FreeList::new();
    list.push_front(a);
    list.push_front(c);

    list.remove(b);

    assert_eq!(list.iter().collect::<Vec<_>>(), vec![c, a]);
  }

  #[test]
  fn test_neighbors_follow_addresses_not_list_order() {
    let mut region = Region::new();
    let [a, b, c] = adjacent(&mut region);
    let mut list = FreeList::new();
    list.push_front(c);
    list.push_front(a);

    assert_eq!(list.find_prev(b), Some(a));
    assert_eq!(list.find_next(b), Some(c));
    assert_eq!(list.find_prev(a), None);
    assert_eq!(list.find_next(c), None);
  }

  #[test]
  fn test_neighbors_require_exact_contiguity() {
    let mut region = Region::new();
    let (a, b) = unsafe { (Block::init(region.at(0), 64), Block::init(region.at(112), 64)) };
    let mut list = FreeList::new();
    list.push_front(a);

    assert_eq!(list.find_prev(b), None);

    list.push_front(b);
    assert_eq!(list.find_next(a), None);
  }
}
