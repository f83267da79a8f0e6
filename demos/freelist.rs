use std::{io::Read, ptr, ptr::NonNull};

use freealloc::{FreeListAllocator, HEADER_SIZE, Sbrk};
use libc::sbrk;
use log::info;

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `htop`,
/// `gdb`, or just visually track how allocations change the program break.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn print_alloc(
  size: usize,
  addr: NonNull<u8>,
) {
  println!(
    "Allocated {} bytes, address = {:?}, header = {:#x}, program break = {:?}",
    size,
    addr,
    addr.as_ptr() as usize - HEADER_SIZE,
    unsafe { sbrk(0) }
  );
}

fn print_free_list(allocator: &FreeListAllocator<Sbrk>) {
  println!("Free list:");
  for block in allocator.free_blocks() {
    println!("  header = {:#x}, size = {}", block.address, block.size);
  }
}

fn main() -> Result<(), freealloc::AllocError> {
  pretty_env_logger::init();

  let mut allocator = FreeListAllocator::new(Sbrk);

  print_program_break("start");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Two neighbouring blocks of 64 bytes each.
  // --------------------------------------------------------------------
  let first = allocator.allocate(64)?;
  let second = allocator.allocate(64)?;
  println!("\n[1] Allocate two 64-byte blocks");
  print_alloc(64, first);
  print_alloc(64, second);

  unsafe { ptr::write_bytes(first.as_ptr(), 0xAB, 64) };
  info!("filled first block with 0xAB");

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Release the first block. On its own it is too small to be split
  //    for another 64-byte request.
  // --------------------------------------------------------------------
  unsafe { allocator.release(first)? };
  println!("\n[2] Released first block");
  print_free_list(&allocator);

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Release the second block. It touches the first one in memory, so
  //    the two are merged into one free block.
  // --------------------------------------------------------------------
  unsafe { allocator.release(second)? };
  println!("\n[3] Released second block (coalesced with the first)");
  print_free_list(&allocator);

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) A new 64-byte request now reuses the merged block.
  // --------------------------------------------------------------------
  let third = allocator.allocate(64)?;
  println!("\n[4] Allocate 64 bytes again");
  print_alloc(64, third);
  println!(
    "[4] third == first? {}",
    if third == first {
      "Yes, it reused the merged block"
    } else {
      "No, it allocated somewhere else"
    }
  );
  print_free_list(&allocator);

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) Resize beyond the recorded size: the contents move.
  // --------------------------------------------------------------------
  unsafe {
    ptr::write_bytes(third.as_ptr(), 0x5A, 64);
    let moved = allocator.resize(Some(third), 1024)?;
    println!("\n[5] Resize 64 -> 1024 bytes");
    print_alloc(1024, moved);
    println!("[5] first byte after move = 0x{:X}", moved.as_ptr().read());
  }

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 6) A large zeroed block to observe heap growth.
  // --------------------------------------------------------------------
  print_program_break("before large alloc");

  let big = allocator.zero_allocate(64, 1024)?;
  println!("\n[6] Zero-allocate 64 KiB");
  print_alloc(64 * 1024, big);

  print_program_break("after large alloc");
  block_until_enter_pressed();

  println!("\n[7] End of example. The heap only grows; the OS reclaims it when the process exits.");

  Ok(())
}
