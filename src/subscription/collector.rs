use smallvec::SmallVec;

use super::SubscriptionLike;

/// Groups subscriptions, possibly of different observables, so they can be
/// released together.
///
/// Once destroyed, anything handed to [`Collector::collect`] is unsubscribed
/// immediately.
///
/// ```
/// use rxlite::prelude::*;
///
/// let numbers = Observable::new(0);
/// let names = Observable::new(String::new());
///
/// let mut collector = Collector::new();
/// collector.collect(numbers.subscribe(|_| {}).unwrap());
/// collector.collect(names.subscribe(|_| {}).unwrap());
/// assert_eq!(collector.len(), 2);
///
/// collector.unsubscribe_all();
/// assert!(numbers.is_empty() && names.is_empty());
/// ```
#[derive(Default)]
pub struct Collector {
  destroyed: bool,
  teardown: SmallVec<[Box<dyn SubscriptionLike>; 4]>,
}

impl Collector {
  pub fn new() -> Self { Self::default() }

  pub fn collect<S: SubscriptionLike + 'static>(&mut self, subscription: S) {
    if self.destroyed {
      subscription.unsubscribe();
    } else {
      self.teardown.retain(|s| !s.is_closed());
      self.teardown.push(Box::new(subscription));
    }
  }

  /// Unsubscribe `subscription` and forget every closed entry.
  pub fn unsubscribe<S: SubscriptionLike>(&mut self, subscription: &S) {
    subscription.unsubscribe();
    self.teardown.retain(|s| !s.is_closed());
  }

  pub fn unsubscribe_all(&mut self) {
    for subscription in self.teardown.drain(..) {
      subscription.unsubscribe();
    }
  }

  /// Number of collected subscriptions that are still open.
  pub fn len(&self) -> usize { self.teardown.iter().filter(|s| !s.is_closed()).count() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn destroy(&mut self) {
    self.unsubscribe_all();
    self.destroyed = true;
  }

  #[inline]
  pub fn is_destroyed(&self) -> bool { self.destroyed }
}

impl std::fmt::Debug for Collector {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Collector")
      .field("destroyed", &self.destroyed)
      .field("len", &self.len())
      .finish()
  }
}
