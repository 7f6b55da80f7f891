//! Statically registered process-wide metrics.
//!
//! Metrics are declared with the [`metric!`] macro and collected into a single
//! link-time slice, so anything linked into the final binary can be listed
//! through [`metrics()`] without a registration step at startup.
//!
//! ```
//! use metrics::{metric, Counter};
//!
//! metric! {
//!   #[name = "doc.blocks_read"]
//!   static BLOCKS_READ: Counter = Counter::new();
//! }
//!
//! BLOCKS_READ.add(2);
//! let entry = metrics::find("doc.blocks_read").unwrap();
//! assert!(entry.is_enabled());
//! ```

mod macros;

mod counter;
mod gauge;

use std::{any::Any, fmt, ops::Deref};

pub use crate::counter::Counter;
pub use crate::gauge::Gauge;

#[doc(hidden)]
pub mod export {
  pub use super::{Metric, MetricEntry};
  pub use tokenreplace::replace;

  pub extern crate linkme;

  #[linkme::distributed_slice]
  pub static METRICS: [MetricEntry] = [..];
}

/// Global interface to a metric.
///
/// Most use of metrics should use the directly declared statics.
pub trait Metric: Sync {
  /// Indicate whether this metric has been set up.
  ///
  /// Generally, if this returns `false` then the other methods on this
  /// trait should return `None`.
  fn is_enabled(&self) -> bool {
    true
  }

  /// Get the value of the metric at the current point in time.
  fn value(&self) -> Option<Value>;

  /// Get the current metric as an [`Any`] instance. This is meant to allow
  /// custom processing for known metric types.
  ///
  /// [`Any`]: std::any::Any
  fn as_any(&self) -> Option<&dyn Any>;
}

/// The value of a metric.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Value {
  Unsigned(u64),
  Signed(i64),
}

/// A statically declared metric entry.
pub struct MetricEntry {
  #[doc(hidden)]
  pub metric: &'static dyn Metric,
  #[doc(hidden)]
  pub name: &'static str,
}

impl MetricEntry {
  pub fn metric(&self) -> &'static dyn Metric {
    self.metric
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

/// Get a list of all globally created metrics.
pub fn metrics() -> &'static [MetricEntry] {
  &*crate::export::METRICS
}

/// Look up a metric by its registered name.
pub fn find(name: &str) -> Option<&'static MetricEntry> {
  metrics().iter().find(|entry| entry.name() == name)
}

impl Deref for MetricEntry {
  type Target = dyn Metric;

  fn deref(&self) -> &Self::Target {
    self.metric()
  }
}

impl fmt::Debug for MetricEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricEntry")
      .field("name", &self.name())
      .field("value", &self.metric().value())
      .finish()
  }
}
