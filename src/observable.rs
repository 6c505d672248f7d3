//! Hot, synchronous observables.
//!
//! Both [`Observable`] and [`OrderedObservable`] are cheap handles over one
//! shared core: cloning a handle gives another way to reach the same value,
//! subscribers and filter. Delivery happens inside `next`, on the caller's
//! stack, in registry order for [`Observable`] and ascending
//! [`Subscription::order`] for [`OrderedObservable`].

use std::{fmt, rc::Rc};

use smallvec::SmallVec;

use crate::{filter::Filter, pipe::Pipe, subscription::Subscription};

pub(crate) mod registry;
pub use registry::Listener;
use registry::{Core, Entry, SharedCore};

/// A value holder pushing every new value to its subscribers.
///
/// Subscribers are kept in an unordered registry: removing one may change the
/// relative order of the others.
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// let seen = Rc::new(RefCell::new(vec![]));
/// let c_seen = seen.clone();
///
/// let temperature = Observable::new(20);
/// let subscription = temperature
///   .subscribe(move |v| c_seen.borrow_mut().push(*v))
///   .unwrap();
///
/// temperature.next(21);
/// subscription.unsubscribe();
/// temperature.next(22);
///
/// assert_eq!(temperature.value(), 22);
/// assert_eq!(*seen.borrow(), vec![21]);
/// ```
pub struct Observable<T>(Rc<SharedCore<T>>);

/// An [`Observable`] delivering to subscribers in ascending
/// [`Subscription::order`], ties resolved by subscribe order.
///
/// The registry is re-sorted lazily: only an emission that follows a
/// subscribe, a reordering unsubscribe or a [`Subscription::set_order`] pays
/// for a sort.
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// let log = Rc::new(RefCell::new(vec![]));
/// let obs = OrderedObservable::new(());
///
/// let c_log = log.clone();
/// obs.subscribe_with_order(move |_| c_log.borrow_mut().push("last"), 10);
/// let c_log = log.clone();
/// obs.subscribe_with_order(move |_| c_log.borrow_mut().push("first"), -1);
///
/// obs.next(());
/// assert_eq!(*log.borrow(), vec!["first", "last"]);
/// ```
pub struct OrderedObservable<T>(Rc<SharedCore<T>>);

macro_rules! impl_observable {
  ($name:ident, $ordered:expr) => {
    impl<T: Clone + 'static> $name<T> {
      /// Create an observable whose current value is `value`.
      pub fn new(value: T) -> Self { Self(Core::shared(value, $ordered)) }

      /// Clone of the last pushed value, or the initial one.
      pub fn value(&self) -> T { self.0.borrow().value().clone() }

      /// Number of registered subscriptions.
      pub fn len(&self) -> usize { self.0.borrow().len() }

      pub fn is_empty(&self) -> bool { self.len() == 0 }

      /// Register `listener`. Returns `None` once the observable is
      /// destroyed.
      pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Option<Subscription<T>> {
        registry::subscribe(&self.0, Entry::Single(Box::new(listener)), 0)
      }

      /// Register several listeners as one subscription. They run in the
      /// given order on every delivery and are unsubscribed together.
      ///
      /// Returns `None` for an empty batch.
      pub fn subscribe_all<I>(&self, listeners: I) -> Option<Subscription<T>>
      where
        I: IntoIterator<Item = Listener<T>>,
      {
        let batch: SmallVec<[Listener<T>; 4]> = listeners.into_iter().collect();
        if batch.is_empty() {
          tracing::debug!("empty listener batch ignored");
          return None;
        }
        registry::subscribe(&self.0, Entry::Batch(batch), 0)
      }

      /// Set the current value and push it to every subscriber, unless the
      /// attached filter rejects it. A rejected value still becomes the
      /// current value.
      pub fn next(&self, value: T) { registry::next(&self.0, value) }

      /// Call [`next`](Self::next) for each value in turn.
      pub fn stream<I: IntoIterator<Item = T>>(&self, values: I) {
        for value in values {
          self.next(value);
        }
      }

      /// The observable-level filter, created on first call.
      ///
      /// A destroyed observable returns a detached filter that gates nothing.
      pub fn add_filter(&self) -> Filter<T> {
        let mut core = self.0.borrow_mut();
        if core.is_destroyed() {
          tracing::debug!("add_filter on a destroyed observable returns a detached filter");
          return Filter::new();
        }
        core.filter_or_insert()
      }

      /// Start a per-subscription operator chain. Returns `None` once the
      /// observable is destroyed.
      pub fn pipe(&self) -> Option<Pipe<T>> {
        if self.is_destroyed() {
          return None;
        }
        Some(Pipe::new(Rc::downgrade(&self.0)))
      }

      /// Close every subscription; the observable stays usable.
      pub fn unsubscribe_all(&self) {
        let slots = self.0.borrow_mut().take_subscribers();
        drop(slots);
      }

      /// Close every subscription and drop the filter. Afterwards `next` is
      /// ignored and no new subscription can be made.
      pub fn destroy(&self) {
        let released = self.0.borrow_mut().destroy();
        drop(released);
      }

      pub fn is_destroyed(&self) -> bool { self.0.borrow().is_destroyed() }
    }

    impl<T: Clone + Default + 'static> Default for $name<T> {
      fn default() -> Self { Self::new(T::default()) }
    }

    impl<T> Clone for $name<T> {
      fn clone(&self) -> Self { Self(self.0.clone()) }
    }

    impl<T> fmt::Debug for $name<T> {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.0.borrow();
        f.debug_struct(stringify!($name))
          .field("subscribers", &core.len())
          .field("destroyed", &core.is_destroyed())
          .finish()
      }
    }
  };
}

impl_observable!(Observable, false);
impl_observable!(OrderedObservable, true);

impl<T: Clone + 'static> OrderedObservable<T> {
  /// Register `listener` with an explicit dispatch `order`.
  pub fn subscribe_with_order(
    &self,
    listener: impl Fn(&T) + 'static,
    order: i64,
  ) -> Option<Subscription<T>> {
    registry::subscribe(&self.0, Entry::Single(Box::new(listener)), order)
  }

  /// Sort the registry by order now instead of on the next emission.
  pub fn sort_by_order(&self) { self.0.borrow_mut().sort_by_order(); }

  /// Whether the next emission will re-sort the registry.
  pub fn needs_resorting(&self) -> bool { self.0.borrow().needs_resorting() }
}
