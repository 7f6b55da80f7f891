//! Forward-only access to a source stream through a [`BlockCache`].

use std::convert::TryFrom;
use std::io::{self, ErrorKind, Read};

use metrics::Counter;

use crate::{AllocError, BlockCache, Entry, WindowConfig, WindowError};

metric! {
  #[name = "deltamem.window.blocks_read"]
  static BLOCKS_READ: Counter = Counter::new();

  #[name = "deltamem.window.too_far_back"]
  static TOO_FAR_BACK: Counter = Counter::new();
}

/// A sequential reader of source data.
pub trait BlockSource {
  /// Read source bytes into `buf`.
  ///
  /// `offset` is the position within the source of the first byte wanted.
  /// Reads always continue where the previous successful one left off so
  /// sequential readers may ignore it. Returns the number of bytes read,
  /// which may be less than `buf.len()`; `0` means the source has ended.
  ///
  /// An error must not consume any bytes.
  fn read_block(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

impl<R: Read> BlockSource for R {
  fn read_block(&mut self, _offset: u64, buf: &mut [u8]) -> io::Result<usize> {
    self.read(buf)
  }
}

/// Provides source blocks to a differencing engine from a forward-only
/// source.
///
/// Blocks are read on demand, in order, and kept in a [`BlockCache`]. A
/// request for a block that has not been read yet reads every block up to and
/// including it. A request for a block that was read earlier but has since
/// been evicted fails with [`WindowError::TooFarBack`] since the source cannot
/// be rewound.
///
/// ```
/// use deltamem::{SourceWindow, WindowConfig, WindowError};
///
/// let source: &[u8] = b"0123456789";
/// let mut window = SourceWindow::new(WindowConfig::new(2, 4), source).unwrap();
///
/// assert_eq!(window.block(1).unwrap().data(), b"4567");
/// assert_eq!(window.block_at(9).unwrap().data(), b"89");
///
/// // Block 0 has been evicted by block 2.
/// assert!(matches!(window.block(0), Err(WindowError::TooFarBack { .. })));
/// assert!(matches!(window.block(3), Err(WindowError::SourceExhausted { .. })));
/// ```
pub struct SourceWindow<S> {
  cache: BlockCache,
  source: S,
  /// Id of the next block the source will produce.
  next: u64,
  /// Bytes of block `next` read so far, kept across failed reads.
  scratch: Vec<u8>,
  filled: usize,
}

impl<S: BlockSource> SourceWindow<S> {
  /// Create a window over `source`, allocating the cache described by
  /// `config` up front.
  ///
  /// # Panics
  /// Panics if `config` has zero blocks or a zero block size.
  pub fn new(config: WindowConfig, source: S) -> Result<Self, AllocError> {
    let cache = config.cache()?;

    let mut scratch = Vec::new();
    scratch
      .try_reserve_exact(config.block_size)
      .map_err(|e| AllocError::new(config.block_size, e))?;
    scratch.resize(config.block_size, 0);

    Ok(Self {
      cache,
      source,
      next: 0,
      scratch,
      filled: 0,
    })
  }

  #[inline]
  pub fn block_size(&self) -> usize {
    self.cache.block_size()
  }

  /// Number of source bytes that can be resident at once.
  pub fn window_size(&self) -> usize {
    self.cache.capacity().saturating_mul(self.cache.block_size())
  }

  /// Id of the next block that would be read from the source.
  pub fn next_unread(&self) -> u64 {
    self.next
  }

  pub fn cache(&self) -> &BlockCache {
    &self.cache
  }

  pub fn source_ref(&self) -> &S {
    &self.source
  }

  pub fn into_source(self) -> S {
    self.source
  }

  /// Get the block containing byte `offset` of the source.
  pub fn block_at(&mut self, offset: u64) -> Result<Entry<'_>, WindowError> {
    let block_size = u64::try_from(self.block_size()).unwrap_or(u64::MAX);
    self.block(offset / block_size)
  }

  /// Get block `id`, reading forward through the source if it has not been
  /// reached yet.
  pub fn block(&mut self, id: u64) -> Result<Entry<'_>, WindowError> {
    if !self.cache.contains(id) {
      if id < self.next {
        TOO_FAR_BACK.increment();
        debug!(
          "Source block {} requested after it was evicted (next unread block is {})",
          id, self.next
        );

        return Err(WindowError::TooFarBack {
          id,
          next: self.next,
        });
      }

      self.read_through(id)?;
    }

    match self.cache.get(id) {
      Some(entry) => Ok(entry),
      None => unreachable!("block {} was just cached", id),
    }
  }

  /// Read and cache every block from the next unread one through `id`.
  ///
  /// A read error leaves the partly read block in `scratch` so that a later
  /// call resumes exactly where the source stopped.
  fn read_through(&mut self, id: u64) -> Result<(), WindowError> {
    let block_size = self.block_size();

    while self.next <= id {
      let start = self.next.saturating_mul(u64::try_from(block_size).unwrap_or(u64::MAX));

      while self.filled < block_size {
        let offset = start.saturating_add(self.filled as u64);
        match self.source.read_block(offset, &mut self.scratch[self.filled..]) {
          Ok(0) => break,
          Ok(n) => self.filled += n,
          Err(e) if e.kind() == ErrorKind::Interrupted => continue,
          Err(e) => return Err(e.into()),
        }
      }

      if self.filled == 0 {
        debug!("Source ran out after {} blocks seeking block {}", self.next, id);

        return Err(WindowError::SourceExhausted {
          id,
          available: self.next,
        });
      }

      let len = std::mem::replace(&mut self.filled, 0);
      trace!("Read source block {} ({} bytes)", self.next, len);
      BLOCKS_READ.increment();

      self.cache.put(self.next, &self.scratch[..len]);
      self.next += 1;
    }

    Ok(())
  }
}
