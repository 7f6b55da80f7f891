use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// Memory for a cache arena or buffer growth could not be reserved.
///
/// The structure that reported it is left exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to reserve {requested} bytes")]
pub struct AllocError {
  requested: usize,
  #[source]
  source: TryReserveError,
}

impl AllocError {
  pub(crate) fn new(requested: usize, source: TryReserveError) -> Self {
    Self { requested, source }
  }

  /// The number of bytes that could not be reserved.
  pub fn requested(&self) -> usize {
    self.requested
  }
}

/// Failure to provide a source block.
#[derive(Debug, Error)]
pub enum WindowError {
  /// The block has been evicted and the source cannot be rewound to read it
  /// again.
  #[error("block {id} is too far back (next unread block is {next})")]
  TooFarBack { id: u64, next: u64 },
  /// The source ran out of data before the requested block was reached.
  #[error("source exhausted after {available} blocks while seeking block {id}")]
  SourceExhausted { id: u64, available: u64 },
  #[error(transparent)]
  Alloc(#[from] AllocError),
  #[error("failed to read source: {0}")]
  Io(#[from] io::Error),
}

/// Failure to hand produced output to the consumer.
#[derive(Debug, Error)]
pub enum OutputError {
  #[error("failed to write output: {0}")]
  Sink(#[from] io::Error),
  #[error(transparent)]
  Alloc(#[from] AllocError),
}

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("{var} is not a valid size: {value:?}")]
  Invalid { var: &'static str, value: String },
  #[error("{0} must be greater than zero")]
  Zero(&'static str),
}
