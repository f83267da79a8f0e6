use std::env;

/// Environment variable read by [`Config::from_env`].
pub const ON_CORRUPTION_VAR: &str = "FREEALLOC_ON_CORRUPTION";

/// What `release` does when it finds an overwritten guard.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionPolicy {
  /// Log the corruption and abort the process.
  #[default]
  Abort,
  /// Log the corruption and hand an [`AllocError::Corruption`] back to the
  /// caller. The corrupt block is not returned to the free list.
  ///
  /// [`AllocError::Corruption`]: crate::AllocError::Corruption
  Report,
}

impl CorruptionPolicy {
  fn parse(value: &str) -> Option<Self> {
    match value.trim().to_ascii_lowercase().as_str() {
      "abort" => Some(Self::Abort),
      "report" => Some(Self::Report),
      _ => None,
    }
  }
}

/// Allocator settings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  pub on_corruption: CorruptionPolicy,
}

impl Config {
  pub const DEFAULT: Config = Config {
    on_corruption: CorruptionPolicy::Abort,
  };

  pub const fn with_corruption_policy(
    mut self,
    policy: CorruptionPolicy,
  ) -> Self {
    self.on_corruption = policy;
    self
  }

  /// Builds a configuration from `FREEALLOC_ON_CORRUPTION` (`abort` or
  /// `report`). Unset or unrecognized values keep the default.
  ///
  /// This goes through the system allocator, so it is not suitable for
  /// setting up a global allocator instance.
  pub fn from_env() -> Self {
    let mut config = Self::DEFAULT;

    if let Ok(value) = env::var(ON_CORRUPTION_VAR) {
      match CorruptionPolicy::parse(&value) {
        Some(policy) => config.on_corruption = policy,
        None => log::warn!("ignoring {}={:?}, expected `abort` or `report`", ON_CORRUPTION_VAR, value),
      }
    }

    config
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_aborts() {
    assert_eq!(Config::default(), Config::DEFAULT);
    assert_eq!(Config::DEFAULT.on_corruption, CorruptionPolicy::Abort);
  }

  #[test]
  fn test_parse_policy() {
    assert_eq!(CorruptionPolicy::parse("abort"), Some(CorruptionPolicy::Abort));
    assert_eq!(CorruptionPolicy::parse(" Report\n"), Some(CorruptionPolicy::Report));
    assert_eq!(CorruptionPolicy::parse("panic"), None);
  }

  #[test]
  fn test_builder() {
    let config = Config::DEFAULT.with_corruption_policy(CorruptionPolicy::Report);
    assert_eq!(config.on_corruption, CorruptionPolicy::Report);
  }

  #[test]
  fn test_from_env() {
    // Nothing else in this test binary reads the variable.
    unsafe { env::set_var(ON_CORRUPTION_VAR, "REPORT") };
    assert_eq!(Config::from_env().on_corruption, CorruptionPolicy::Report);

    unsafe { env::set_var(ON_CORRUPTION_VAR, "sometimes") };
    assert_eq!(Config::from_env(), Config::DEFAULT);

    unsafe { env::remove_var(ON_CORRUPTION_VAR) };
    assert_eq!(Config::from_env(), Config::DEFAULT);
  }
}
