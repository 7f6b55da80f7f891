use crate::{Metric, Value};
use std::{
  any::Any,
  convert::TryFrom,
  sync::atomic::{AtomicU64, Ordering},
};

/// A monotonically increasing event count.
#[derive(Default, Debug)]
pub struct Counter(AtomicU64);

impl Counter {
  pub const fn new() -> Self {
    Self::with_value(0)
  }

  pub const fn with_value(value: u64) -> Self {
    Self(AtomicU64::new(value))
  }

  #[inline]
  pub fn increment(&self) {
    self.add(1);
  }

  #[inline]
  pub fn add(&self, value: u64) {
    self.0.fetch_add(value, Ordering::Relaxed);
  }

  /// Add a length or byte count. Saturates on targets where `usize` is wider
  /// than 64 bits.
  #[inline]
  pub fn add_len(&self, len: usize) {
    self.add(u64::try_from(len).unwrap_or(u64::MAX));
  }

  #[inline]
  pub fn value(&self) -> u64 {
    self.0.load(Ordering::Relaxed)
  }

  /// Reset the counter to zero, returning the previous value.
  #[inline]
  pub fn reset(&self) -> u64 {
    self.0.swap(0, Ordering::Relaxed)
  }
}

impl Metric for Counter {
  fn value(&self) -> Option<Value> {
    Some(Value::Unsigned(self.value()))
  }

  fn as_any(&self) -> Option<&dyn Any> {
    Some(self)
  }
}
