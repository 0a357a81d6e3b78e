use std::env;

use crate::arena::FixedArena;
#[cfg(unix)]
use crate::arena::MmapArena;

/// Environment variable overriding [`HeapConfig::arena_capacity`].
pub const ARENA_SIZE_VAR: &str = "REALLOCATOR_ARENA_SIZE";
/// Environment variable overriding [`HeapConfig::on_exhaustion`].
pub const ON_EXHAUSTION_VAR: &str = "REALLOCATOR_ON_EXHAUSTION";

const DEFAULT_ARENA_CAPACITY: usize = 1024 * 1024;

/// What the heap does when its arena cannot grow or shrink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnExhaustion {
  /// Hand the error back to the caller.
  #[default]
  Fail,
  /// Log the error and exit the process with status 1.
  Terminate,
}

impl OnExhaustion {
  fn parse(value: &str) -> Option<Self> {
    match value.trim().to_ascii_lowercase().as_str() {
      "fail" => Some(OnExhaustion::Fail),
      "terminate" | "exit" => Some(OnExhaustion::Terminate),
      _ => None,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapConfig {
  pub on_exhaustion: OnExhaustion,
  /// Bytes reserved by arenas built from this configuration.
  pub arena_capacity: usize,
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self {
      on_exhaustion: OnExhaustion::Fail,
      arena_capacity: DEFAULT_ARENA_CAPACITY,
    }
  }
}

impl HeapConfig {
  /// Defaults, overridden by `REALLOCATOR_ARENA_SIZE` and
  /// `REALLOCATOR_ON_EXHAUSTION` when they are set and parse.
  pub fn from_env() -> Self {
    let mut config = Self::default();

    if let Some(capacity) = env::var(ARENA_SIZE_VAR).ok().as_deref().and_then(parse_size) {
      config.arena_capacity = capacity;
    }

    if let Ok(value) = env::var(ON_EXHAUSTION_VAR) {
      match OnExhaustion::parse(&value) {
        Some(policy) => config.on_exhaustion = policy,
        None => log::warn!(target: "alloc", "ignoring {}={:?}", ON_EXHAUSTION_VAR, value),
      }
    }

    config
  }

  pub fn with_on_exhaustion(
    mut self,
    on_exhaustion: OnExhaustion,
  ) -> Self {
    self.on_exhaustion = on_exhaustion;
    self
  }

  pub fn with_arena_capacity(
    mut self,
    arena_capacity: usize,
  ) -> Self {
    self.arena_capacity = arena_capacity;
    self
  }

  pub fn fixed_arena(&self) -> Option<FixedArena> {
    FixedArena::new(self.arena_capacity)
  }

  #[cfg(unix)]
  pub fn mmap_arena(&self) -> Option<MmapArena> {
    MmapArena::new(self.arena_capacity)
  }
}

/// Parses a byte count with an optional `k`, `m` or `g` suffix, optionally
/// followed by `b`: `4096`, `64k`, `1MB`.
pub fn parse_size(value: &str) -> Option<usize> {
  let mut value = value.trim().to_ascii_lowercase();

  if value.len() > 1 && value.ends_with('b') {
    value.pop();
  }

  let factor = match value.chars().last()? {
    'k' => 1024,
    'm' => 1024 * 1024,
    'g' => 1024 * 1024 * 1024,
    _ => 1,
  };

  if factor != 1 {
    value.pop();
  }

  value.parse::<usize>().ok()?.checked_mul(factor)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_size() {
    assert_eq!(parse_size("4096"), Some(4096));
    assert_eq!(parse_size("64k"), Some(64 * 1024));
    assert_eq!(parse_size("64K"), Some(64 * 1024));
    assert_eq!(parse_size("1MB"), Some(1024 * 1024));
    assert_eq!(parse_size(" 2m "), Some(2 * 1024 * 1024));
    assert_eq!(parse_size("1g"), Some(1024 * 1024 * 1024));
    assert_eq!(parse_size("b"), None);
    assert_eq!(parse_size(""), None);
    assert_eq!(parse_size("lots"), None);
  }

  #[test]
  fn test_parse_on_exhaustion() {
    assert_eq!(OnExhaustion::parse("fail"), Some(OnExhaustion::Fail));
    assert_eq!(OnExhaustion::parse("Terminate"), Some(OnExhaustion::Terminate));
    assert_eq!(OnExhaustion::parse("maybe"), None);
  }

  #[test]
  fn test_from_env() {
    // Only this test touches these variables.
    unsafe {
      env::set_var(ARENA_SIZE_VAR, "64k");
      env::set_var(ON_EXHAUSTION_VAR, "terminate");
    }
    let config = HeapConfig::from_env();
    assert_eq!(config.arena_capacity, 64 * 1024);
    assert_eq!(config.on_exhaustion, OnExhaustion::Terminate);

    unsafe {
      env::set_var(ARENA_SIZE_VAR, "plenty");
      env::set_var(ON_EXHAUSTION_VAR, "sometimes");
    }
    assert_eq!(HeapConfig::from_env(), HeapConfig::default());

    unsafe {
      env::set_var(ARENA_SIZE_VAR, "18446744073709551000");
      env::remove_var(ON_EXHAUSTION_VAR);
    }
    let config = HeapConfig::from_env();
    assert_eq!(config.on_exhaustion, OnExhaustion::Fail);
    #[cfg(unix)]
    assert!(usize::BITS != 64 || config.mmap_arena().is_none());

    unsafe {
      env::remove_var(ARENA_SIZE_VAR);
    }
    assert_eq!(HeapConfig::from_env(), HeapConfig::default());
  }

  #[test]
  fn test_builder() {
    let config = HeapConfig::default()
      .with_arena_capacity(4096)
      .with_on_exhaustion(OnExhaustion::Terminate);

    assert_eq!(config.arena_capacity, 4096);
    assert_eq!(config.on_exhaustion, OnExhaustion::Terminate);
    assert_eq!(config.fixed_arena().unwrap().capacity(), 4096);
  }
}
