use std::{env, process::Command};

use freealloc::{Arena, Config, CorruptionPolicy, FreeListAllocator};

const CHILD_VAR: &str = "FREEALLOC_CORRUPTION_CHILD";

/// Overwrites the guard of a live block and releases it. Only does anything
/// when re-executed by `test_guard_overwrite_aborts`.
#[test]
fn corrupt_and_release() {
  if env::var_os(CHILD_VAR).is_none() {
    return;
  }

  let mut allocator = FreeListAllocator::with_config(Arena::with_capacity(1024), Config::DEFAULT);
  let payload = allocator.allocate(100).unwrap();

  unsafe {
    payload.as_ptr().add(100).write(0xEE);
    let _ = allocator.release(payload);
  }

  // Reaching this point means the corruption went unnoticed.
  std::process::exit(0);
}

#[test]
fn test_guard_overwrite_aborts() {
  let status = Command::new(env::current_exe().unwrap())
    .args(["--exact", "corrupt_and_release", "--nocapture", "--test-threads=1"])
    .env(CHILD_VAR, "1")
    .status()
    .unwrap();

  assert!(!status.success());

  #[cfg(unix)]
  {
    use std::os::unix::process::ExitStatusExt;
    assert_eq!(status.signal(), Some(libc::SIGABRT));
  }
}

#[test]
fn test_report_policy_returns_error() {
  let config = Config::DEFAULT.with_corruption_policy(CorruptionPolicy::Report);
  let mut allocator = FreeListAllocator::with_config(Arena::with_capacity(1024), config);
  let payload = allocator.allocate(100).unwrap();

  unsafe {
    payload.as_ptr().add(100).write(0xEE);
    let error = allocator.release(payload).unwrap_err();

    assert!(error.to_string().starts_with("memory corruption detected"));
  }
  assert_eq!(allocator.free_blocks().count(), 0);
}

#[test]
fn test_writes_inside_payload_are_fine() {
  let mut allocator = FreeListAllocator::new(Arena::with_capacity(1024));
  let payload = allocator.allocate(100).unwrap();

  unsafe {
    std::ptr::write_bytes(payload.as_ptr(), 0xEE, 100);
    allocator.release(payload).unwrap();
  }
  assert_eq!(allocator.free_blocks().count(), 1);
}
