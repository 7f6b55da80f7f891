use std::env;

use crate::{AllocError, BlockCache, ConfigError};

/// Default size of the source window an engine searches for matches.
pub const DEFAULT_WINDOW_SIZE: usize = 1 << 26;
/// Default number of blocks the source window is split into.
pub const DEFAULT_SOURCE_BLOCKS: usize = 32;
/// Default size of each source block.
pub const DEFAULT_BLOCK_SIZE: usize = DEFAULT_WINDOW_SIZE / DEFAULT_SOURCE_BLOCKS;

/// Environment variable overriding [`WindowConfig::blocks`].
pub const BLOCKS_VAR: &str = "DELTAMEM_SOURCE_BLOCKS";
/// Environment variable overriding [`WindowConfig::block_size`].
pub const BLOCK_SIZE_VAR: &str = "DELTAMEM_BLOCK_SIZE";

/// Shape of the cached source window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WindowConfig {
  /// Maximum number of resident source blocks.
  pub blocks: usize,
  /// Size of each source block in bytes.
  pub block_size: usize,
}

impl Default for WindowConfig {
  fn default() -> Self {
    Self {
      blocks: DEFAULT_SOURCE_BLOCKS,
      block_size: DEFAULT_BLOCK_SIZE,
    }
  }
}

impl WindowConfig {
  pub const fn new(blocks: usize, block_size: usize) -> Self {
    Self { blocks, block_size }
  }

  /// Build a config from the environment, using the defaults for any
  /// variable that is not set.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|var| env::var(var).ok())
  }

  fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&'static str) -> Option<String>,
  {
    let defaults = Self::default();
    let config = Self {
      blocks: parse_size(BLOCKS_VAR, lookup(BLOCKS_VAR))?.unwrap_or(defaults.blocks),
      block_size: parse_size(BLOCK_SIZE_VAR, lookup(BLOCK_SIZE_VAR))?
        .unwrap_or(defaults.block_size),
    };

    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.blocks == 0 {
      return Err(ConfigError::Zero("blocks"));
    }
    if self.block_size == 0 {
      return Err(ConfigError::Zero("block_size"));
    }

    Ok(())
  }

  /// Total number of source bytes that can be resident at once.
  pub fn window_size(&self) -> usize {
    self.blocks.saturating_mul(self.block_size)
  }

  /// Allocate a cache with this shape.
  ///
  /// # Panics
  /// Panics if the config does not pass [`validate`](Self::validate).
  pub fn cache(&self) -> Result<BlockCache, AllocError> {
    BlockCache::new(self.blocks, self.block_size)
  }
}

fn parse_size(var: &'static str, value: Option<String>) -> Result<Option<usize>, ConfigError> {
  let value = match value {
    Some(value) => value,
    None => return Ok(None),
  };

  match value.trim().parse() {
    Ok(size) => Ok(Some(size)),
    Err(_) => Err(ConfigError::Invalid { var, value }),
  }
}
