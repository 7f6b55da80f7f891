/// Declare one or more metrics and register them in the global metric list.
///
/// Each static may be preceded by `#[name = "..."]` to set the name it is
/// registered under. Without it the metric is named after its module path and
/// identifier (e.g. `my_crate::cache::HITS`).
///
/// ```
/// use metrics::{metric, Counter, Gauge};
///
/// metric! {
///   #[name = "doc.macro.pending"]
///   pub static PENDING: Gauge = Gauge::new();
///
///   static EVENTS: Counter = Counter::new();
/// }
///
/// PENDING.add(5);
/// EVENTS.increment();
/// assert_eq!(PENDING.value(), 5);
/// ```
#[macro_export]
macro_rules! metric {
  () => {};
  {
    #[name = $name:literal]
    $( #[$attr:meta] )*
    $vis:vis static $ident:ident : $ty:ty = $init:expr;
    $( $rest:tt )*
  } => {
    $crate::__declare_metric! {
      $name;
      $( #[$attr] )*
      $vis static $ident : $ty = $init;
    }
    $crate::metric! { $( $rest )* }
  };
  {
    $( #[$attr:meta] )*
    $vis:vis static $ident:ident : $ty:ty = $init:expr;
    $( $rest:tt )*
  } => {
    $crate::__declare_metric! {
      concat!(module_path!(), "::", stringify!($ident));
      $( #[$attr] )*
      $vis static $ident : $ty = $init;
    }
    $crate::metric! { $( $rest )* }
  };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __declare_metric {
  {
    $name:expr;
    $( #[$attr:meta] )*
    $vis:vis static $ident:ident : $ty:ty = $init:expr;
  } => {
    $( #[$attr] )*
    $vis static $ident : $ty = $init;

    const _: () = {
      #[$crate::export::linkme::distributed_slice($crate::export::METRICS)]
      #[$crate::export::replace(linkme, metrics::export::linkme)]
      static ENTRY: $crate::export::MetricEntry = $crate::export::MetricEntry {
        metric: &$ident,
        name: $name,
      };
    };
  };
}
