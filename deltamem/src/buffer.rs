//! FIFO byte queue for output that has been produced but not yet consumed.

use std::io::{self, Read, Write};

use metrics::{Counter, Gauge};

use crate::AllocError;

/// Below this many consumed bytes the buffer always grows in place.
pub const MIN_WASTE: usize = 4096;
/// Once this many consumed bytes sit at the front of the buffer the next
/// append compacts it, regardless of how much is being added.
pub const MAX_WASTE: usize = 16 * 1024 * 1024;

const _: () = assert!(MIN_WASTE <= MAX_WASTE);

metric! {
  #[name = "deltamem.buffer.compactions"]
  static COMPACTIONS: Counter = Counter::new();

  #[name = "deltamem.buffer.pending_bytes"]
  static PENDING_BYTES: Gauge = Gauge::new();
}

/// An append-at-the-back, take-from-the-front byte queue.
///
/// Storage is one contiguous allocation that is only created by the first
/// append and is freed again as soon as the last byte is taken. Consumed
/// bytes are not discarded eagerly: an append either grows the allocation in
/// place, keeping the consumed prefix, or compacts the unconsumed tail into a
/// fresh allocation. The choice bounds the consumed prefix to [`MAX_WASTE`]
/// bytes while avoiding a copy of the live data on every call.
///
/// ```
/// use deltamem::StreamBuffer;
///
/// let mut buffer = StreamBuffer::new();
/// buffer.append(b"HELLO").unwrap();
///
/// let mut dest = [0; 3];
/// assert_eq!(buffer.take(&mut dest), 3);
/// assert_eq!(&dest, b"HEL");
/// assert_eq!(buffer.remaining(), 2);
/// ```
#[derive(Default)]
pub struct StreamBuffer {
  data: Vec<u8>,
  /// Start of the unconsumed bytes within `data`.
  offset: usize,
}

impl StreamBuffer {
  pub const fn new() -> Self {
    Self {
      data: Vec::new(),
      offset: 0,
    }
  }

  /// The number of bytes that can still be taken.
  #[inline]
  pub fn remaining(&self) -> usize {
    self.data.len() - self.offset
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.remaining() == 0
  }

  /// The bytes that have been appended but not yet taken.
  pub fn unconsumed(&self) -> &[u8] {
    &self.data[self.offset..]
  }

  /// Add `data` to the back of the queue.
  ///
  /// On failure to allocate the buffer is left unchanged.
  pub fn append(&mut self, data: &[u8]) -> Result<(), AllocError> {
    self.reserve(data.len())?;

    self.data.extend_from_slice(data);
    PENDING_BYTES.add_len(data.len());

    Ok(())
  }

  /// Make room to append `additional` more bytes without allocating.
  ///
  /// This makes the same grow-or-compact choice that [`append`] would, so an
  /// `append` of at most `additional` bytes that follows cannot fail.
  ///
  /// [`append`]: Self::append
  pub fn reserve(&mut self, additional: usize) -> Result<(), AllocError> {
    if additional == 0 {
      return Ok(());
    }

    let size = self.data.len();
    let waste = self.offset;

    if waste < MIN_WASTE || (waste < MAX_WASTE && waste > size / 4) {
      return self
        .data
        .try_reserve_exact(additional)
        .map_err(|e| AllocError::new(size.saturating_add(additional), e));
    }

    let remaining = size - waste;
    let mut compacted = Vec::new();
    compacted
      .try_reserve_exact(remaining.saturating_add(additional))
      .map_err(|e| AllocError::new(remaining.saturating_add(additional), e))?;
    compacted.extend_from_slice(&self.data[waste..]);

    debug!(
      "Compacting stream buffer: dropped {} consumed bytes, kept {}",
      waste, remaining
    );
    COMPACTIONS.increment();

    self.data = compacted;
    self.offset = 0;

    Ok(())
  }

  /// Move up to `dest.len()` bytes from the front of the queue into `dest`.
  ///
  /// Returns the number of bytes copied, which is less than requested only
  /// when the queue runs dry. Taking the final byte frees the storage.
  pub fn take(&mut self, dest: &mut [u8]) -> usize {
    let taken = self.remaining().min(dest.len());
    if taken == 0 {
      return 0;
    }

    dest[..taken].copy_from_slice(&self.data[self.offset..self.offset + taken]);
    self.offset += taken;
    PENDING_BYTES.sub_len(taken);

    if self.offset == self.data.len() {
      self.data = Vec::new();
      self.offset = 0;
    }

    taken
  }

  /// Take up to `max` bytes, appending them to `dest`.
  ///
  /// If `dest` cannot grow to fit them then nothing is taken.
  pub fn take_into(&mut self, dest: &mut Vec<u8>, max: usize) -> Result<usize, AllocError> {
    let len = self.remaining().min(max);
    let start = dest.len();
    dest
      .try_reserve(len)
      .map_err(|e| AllocError::new(start.saturating_add(len), e))?;
    dest.resize(start + len, 0);

    let taken = self.take(&mut dest[start..]);
    debug_assert_eq!(start + taken, dest.len());
    Ok(taken)
  }

  /// Borrow the buffer as an [`io::Read`] that takes from the front.
  ///
  /// `StreamBuffer` does not implement `Read` itself since `Read::take` would
  /// shadow [`take`](Self::take).
  pub fn reader(&mut self) -> BufferReader<'_> {
    BufferReader { buffer: self }
  }

  /// Drop all buffered bytes and free the storage.
  pub fn release(&mut self) {
    PENDING_BYTES.sub_len(self.remaining());

    self.data = Vec::new();
    self.offset = 0;
  }
}

impl Drop for StreamBuffer {
  fn drop(&mut self) {
    self.release();
  }
}

impl Write for StreamBuffer {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.append(buf).map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

/// Reading half of a [`StreamBuffer`], returned by
/// [`StreamBuffer::reader`].
pub struct BufferReader<'a> {
  buffer: &'a mut StreamBuffer,
}

impl Read for BufferReader<'_> {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    Ok(self.buffer.take(buf))
  }
}
