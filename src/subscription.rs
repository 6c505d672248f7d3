use std::{
  fmt::{Debug, Formatter},
  rc::Weak,
};

use crate::{
  error::SubscriptionError,
  observable::registry::{self, SharedCore, SlotRef},
};

mod collector;
pub use collector::Collector;

/// Handle returned by `subscribe` to allow unsubscribing.
pub trait SubscriptionLike {
  /// Stop delivering to the subscribed listener. Calling it again is a no-op.
  fn unsubscribe(&self);

  fn is_closed(&self) -> bool;
}

/// Capability to detach one listener from the observable that issued it.
///
/// The handle is cheap to clone; all clones control the same registration.
/// Dropping a handle does **not** unsubscribe.
pub struct Subscription<T> {
  source: Weak<SharedCore<T>>,
  slot: SlotRef<T>,
}

impl<T> Subscription<T> {
  pub(crate) fn new(source: Weak<SharedCore<T>>, slot: SlotRef<T>) -> Self {
    Self { source, slot }
  }

  /// Remove the listener from its observable. Idempotent.
  pub fn unsubscribe(&self) {
    match self.source.upgrade() {
      Some(shared) => registry::remove(&shared, &self.slot),
      None => {
        self.slot.close();
      }
    }
  }

  #[inline]
  pub fn is_closed(&self) -> bool { self.slot.is_closed() }

  /// Dispatch priority inside an
  /// [`OrderedObservable`](crate::observable::OrderedObservable); lower runs
  /// first. Plain observables store it but never look at it.
  #[inline]
  pub fn order(&self) -> i64 { self.slot.order() }

  /// Change the dispatch priority. The new order takes effect from the next
  /// emission.
  pub fn set_order(&self, order: i64) -> Result<(), SubscriptionError> {
    if self.is_closed() {
      tracing::debug!(order, "set_order on a closed subscription");
      return Err(SubscriptionError::Closed);
    }
    self.slot.set_order(order);
    if let Some(shared) = self.source.upgrade() {
      shared.borrow_mut().mark_dirty();
    }
    Ok(())
  }
}

impl<T> SubscriptionLike for Subscription<T> {
  #[inline]
  fn unsubscribe(&self) { Subscription::unsubscribe(self) }

  #[inline]
  fn is_closed(&self) -> bool { Subscription::is_closed(self) }
}

impl<T> Clone for Subscription<T> {
  fn clone(&self) -> Self { Self { source: self.source.clone(), slot: self.slot.clone() } }
}

impl<T> Debug for Subscription<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("is_closed", &self.is_closed())
      .field("order", &self.order())
      .finish()
  }
}
