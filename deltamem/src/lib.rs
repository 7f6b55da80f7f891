//! Bounded-memory building blocks for a streaming delta compressor.
//!
//! - [`BlockCache`] keeps a fixed number of fixed-size source blocks and
//!   evicts the least recently used one.
//! - [`SourceWindow`] drives a [`BlockCache`] from a forward-only source,
//!   which is how a differencing engine gets at the source it compares
//!   against.
//! - [`StreamBuffer`] and [`OutputQueue`] hold produced output that the
//!   consumer has not asked for yet.
//!
//! None of the types are thread-safe; each is meant to be owned by a single
//! stream.

#[macro_use]
extern crate log;
#[macro_use]
extern crate metrics;

mod fixedvec;
mod error;

mod buffer;
mod cache;
mod config;
mod output;
mod window;

pub use crate::buffer::{BufferReader, StreamBuffer, MAX_WASTE, MIN_WASTE};
pub use crate::cache::{BlockCache, Entry};
pub use crate::config::{
  WindowConfig, BLOCKS_VAR, BLOCK_SIZE_VAR, DEFAULT_BLOCK_SIZE, DEFAULT_SOURCE_BLOCKS,
  DEFAULT_WINDOW_SIZE,
};
pub use crate::error::{AllocError, ConfigError, OutputError, WindowError};
pub use crate::output::{Demand, OutputQueue};
pub use crate::window::{BlockSource, SourceWindow};
