//! Error types surfaced by filters and subscription handles.

use thiserror::Error;

/// Boxed error returned by fallible predicates.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// A fallible filter predicate failed while a value was being evaluated.
///
/// The value is always rejected when this happens. The error reaches the
/// handler registered with [`Filter::add_error_handler`], or the log when no
/// handler is set.
///
/// [`Filter::add_error_handler`]: crate::filter::Filter::add_error_handler
#[derive(Debug, Error)]
pub enum FilterError {
  #[error("filter step {step} failed: {source}")]
  Predicate {
    /// Index of the failing step in its chain.
    step: usize,
    #[source]
    source: BoxError,
  },
}

impl FilterError {
  /// Index of the step that produced the error.
  pub fn step(&self) -> usize {
    match self {
      FilterError::Predicate { step, .. } => *step,
    }
  }
}

/// Misuse of a subscription handle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionError {
  #[error("subscription is already closed")]
  Closed,
}
