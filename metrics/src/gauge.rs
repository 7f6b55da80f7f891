use crate::{Metric, Value};
use std::{
  any::Any,
  convert::TryFrom,
  sync::atomic::{AtomicI64, Ordering},
};

/// A value that moves up and down, such as a number of bytes currently held.
#[derive(Default, Debug)]
pub struct Gauge(AtomicI64);

fn to_delta(len: usize) -> i64 {
  i64::try_from(len).unwrap_or(i64::MAX)
}

impl Gauge {
  pub const fn new() -> Self {
    Self(AtomicI64::new(0))
  }

  #[inline]
  pub fn add(&self, value: i64) {
    self.0.fetch_add(value, Ordering::Relaxed);
  }

  #[inline]
  pub fn sub(&self, value: i64) {
    self.0.fetch_sub(value, Ordering::Relaxed);
  }

  /// Raise the gauge by a length or byte count.
  #[inline]
  pub fn add_len(&self, len: usize) {
    self.add(to_delta(len));
  }

  /// Lower the gauge by a length or byte count.
  #[inline]
  pub fn sub_len(&self, len: usize) {
    self.sub(to_delta(len));
  }

  #[inline]
  pub fn value(&self) -> i64 {
    self.0.load(Ordering::Relaxed)
  }

  #[inline]
  pub fn set(&self, value: i64) -> i64 {
    self.0.swap(value, Ordering::Relaxed)
  }
}

impl Metric for Gauge {
  fn value(&self) -> Option<Value> {
    Some(Value::Signed(self.value()))
  }

  fn as_any(&self) -> Option<&dyn Any> {
    Some(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tracks_held_bytes() {
    let gauge = Gauge::new();
    gauge.add_len(100);
    gauge.sub_len(40);
    assert_eq!(gauge.value(), 60);

    gauge.sub_len(80);
    assert_eq!(gauge.value(), -20);
    assert_eq!(gauge.set(0), -20);
  }
}
