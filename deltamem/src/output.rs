//! Hands engine output to a consumer that may want less than is produced.

use std::io::{self, ErrorKind, Write};

use crate::{AllocError, OutputError, StreamBuffer};

/// How many more bytes the consumer wants from the current call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Demand {
  /// Everything the engine produces.
  Unbounded,
  /// At most this many more bytes.
  Bytes(usize),
}

impl Demand {
  /// `Bytes(n)` for `Some(n)`, `Unbounded` otherwise.
  pub fn from_limit(limit: Option<usize>) -> Self {
    match limit {
      Some(n) => Demand::Bytes(n),
      None => Demand::Unbounded,
    }
  }

  /// The number of bytes out of `available` that satisfy this demand.
  pub fn limit(&self, available: usize) -> usize {
    match *self {
      Demand::Unbounded => available,
      Demand::Bytes(n) => n.min(available),
    }
  }

  pub fn is_satisfied(&self) -> bool {
    *self == Demand::Bytes(0)
  }

  fn consume(&mut self, len: usize) {
    if let Demand::Bytes(n) = self {
      *n -= len;
    }
  }
}

/// Spill queue for engine output.
///
/// An engine produces output in chunks whose size it chooses. Whatever the
/// consumer asked for is written straight through to its sink and the
/// remainder is held in a [`StreamBuffer`] until the next call. Held output
/// always goes out before anything produced later.
///
/// ```
/// use deltamem::{Demand, OutputQueue};
///
/// let mut queue = OutputQueue::new();
/// let mut out = Vec::new();
/// let mut demand = Demand::Bytes(4);
///
/// queue.deliver(&mut out, b"produced", &mut demand).unwrap();
/// assert_eq!(out, b"prod");
/// assert_eq!(queue.pending(), 4);
///
/// let mut next = Vec::new();
/// queue.drain(&mut next, None).unwrap();
/// assert_eq!(next, b"uced");
/// ```
#[derive(Default)]
pub struct OutputQueue {
  held: StreamBuffer,
}

impl OutputQueue {
  pub const fn new() -> Self {
    Self {
      held: StreamBuffer::new(),
    }
  }

  /// The number of produced bytes not yet handed to the consumer.
  pub fn pending(&self) -> usize {
    self.held.remaining()
  }

  /// Move up to `wanted` held bytes (all of them for `None`) onto the end of
  /// `dest`. Returns the number of bytes moved.
  pub fn drain(&mut self, dest: &mut Vec<u8>, wanted: Option<usize>) -> Result<usize, AllocError> {
    let max = wanted.unwrap_or(usize::MAX);
    self.held.take_into(dest, max)
  }

  /// Pass freshly produced bytes towards the consumer.
  ///
  /// Up to `demand` bytes are written to `sink` and the demand is reduced
  /// accordingly; the rest are held for a later call. If output is already
  /// being held then all of `produced` is held behind it. Returns the number
  /// of bytes written to the sink.
  ///
  /// Space to hold all of `produced` is reserved before anything is written.
  /// If the sink fails part way then the demand is reduced by what it
  /// accepted, everything it did not accept is held, and the error is
  /// returned.
  pub fn deliver<W>(
    &mut self,
    mut sink: W,
    produced: &[u8],
    demand: &mut Demand,
  ) -> Result<usize, OutputError>
  where
    W: Write,
  {
    self.held.reserve(produced.len())?;

    let direct = match self.held.is_empty() {
      true => demand.limit(produced.len()),
      false => 0,
    };

    let mut written = 0;
    let mut result = Ok(());
    while written < direct {
      match sink.write(&produced[written..direct]) {
        Ok(0) => {
          result = Err(io::Error::new(
            ErrorKind::WriteZero,
            "output sink stopped accepting bytes",
          ));
          break;
        }
        Ok(n) => written += n,
        Err(e) if e.kind() == ErrorKind::Interrupted => continue,
        Err(e) => {
          result = Err(e);
          break;
        }
      }
    }

    demand.consume(written);
    self.held.append(&produced[written..])?;

    result?;
    Ok(written)
  }

  /// Drop any held output.
  pub fn clear(&mut self) {
    self.held.release();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io;

  struct FailingSink;

  impl Write for FailingSink {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
      Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn unbounded_demand_passes_everything_through() {
    let mut queue = OutputQueue::new();
    let mut out = Vec::new();
    let mut demand = Demand::Unbounded;

    assert_eq!(queue.deliver(&mut out, b"abc", &mut demand).unwrap(), 3);
    assert_eq!(queue.deliver(&mut out, b"def", &mut demand).unwrap(), 3);
    assert_eq!(out, b"abcdef");
    assert_eq!(queue.pending(), 0);
    assert_eq!(demand, Demand::Unbounded);
  }

  #[test]
  fn excess_is_held_in_order() {
    let mut queue = OutputQueue::new();
    let mut out = Vec::new();
    let mut demand = Demand::Bytes(2);

    queue.deliver(&mut out, b"abcd", &mut demand).unwrap();
    assert!(demand.is_satisfied());
    queue.deliver(&mut out, b"efg", &mut demand).unwrap();
    assert_eq!(out, b"ab");
    assert_eq!(queue.pending(), 5);

    // A later call drains what was held before accepting new output.
    let mut next = Vec::new();
    assert_eq!(queue.drain(&mut next, Some(3)).unwrap(), 3);
    let mut demand = Demand::Bytes(4);
    queue.deliver(&mut next, b"hi", &mut demand).unwrap();
    assert_eq!(next, b"cde");
    assert_eq!(demand, Demand::Bytes(4));

    queue.drain(&mut next, None).unwrap();
    assert_eq!(next, b"cdefghi");
    assert_eq!(queue.pending(), 0);
  }

  #[test]
  fn sink_errors_propagate() {
    let mut queue = OutputQueue::new();
    let mut demand = Demand::Unbounded;

    match queue.deliver(FailingSink, b"abc", &mut demand) {
      Err(OutputError::Sink(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
      other => panic!("unexpected {:?}", other),
    }
    assert_eq!(queue.pending(), 3);
    assert_eq!(demand, Demand::Unbounded);
  }

  /// Accepts `budget` bytes in total, then fails.
  struct ShortSink {
    accepted: Vec<u8>,
    budget: usize,
  }

  impl Write for ShortSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      if self.budget == 0 {
        return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
      }

      let n = buf.len().min(self.budget);
      self.accepted.extend_from_slice(&buf[..n]);
      self.budget -= n;
      Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn partial_sink_failure_holds_the_rest() {
    let mut queue = OutputQueue::new();
    let mut sink = ShortSink {
      accepted: Vec::new(),
      budget: 2,
    };
    let mut demand = Demand::Bytes(4);

    match queue.deliver(&mut sink, b"abcdefgh", &mut demand) {
      Err(OutputError::Sink(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
      other => panic!("unexpected {:?}", other),
    }
    assert_eq!(sink.accepted, b"ab");
    assert_eq!(demand, Demand::Bytes(2));
    assert_eq!(queue.pending(), 6);

    let mut next = Vec::new();
    queue.drain(&mut next, None).unwrap();
    assert_eq!(next, b"cdefgh");
  }

  #[test]
  fn sink_accepting_nothing_is_an_error() {
    let mut queue = OutputQueue::new();
    let mut demand = Demand::Unbounded;
    let mut full: &mut [u8] = &mut [];

    match queue.deliver(&mut full, b"abc", &mut demand) {
      Err(OutputError::Sink(e)) => assert_eq!(e.kind(), io::ErrorKind::WriteZero),
      other => panic!("unexpected {:?}", other),
    }
    assert_eq!(queue.pending(), 3);
  }

  #[test]
  fn demand_from_limit() {
    assert_eq!(Demand::from_limit(None), Demand::Unbounded);
    assert_eq!(Demand::from_limit(Some(7)), Demand::Bytes(7));
    assert_eq!(Demand::Bytes(7).limit(3), 3);
    assert_eq!(Demand::Unbounded.limit(3), 3);
    assert!(!Demand::Unbounded.is_satisfied());
  }

  #[test]
  fn clear_drops_held_output() {
    let mut queue = OutputQueue::new();
    let mut demand = Demand::Bytes(0);
    queue.deliver(io::sink(), b"abc", &mut demand).unwrap();
    assert_eq!(queue.pending(), 3);

    queue.clear();
    assert_eq!(queue.pending(), 0);
  }
}
