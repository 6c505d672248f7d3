//! Subscriber registry and emission loop shared by [`Observable`] and
//! [`OrderedObservable`].
//!
//! # Re-entrancy
//!
//! No borrow of the core is held while user code runs. `next` copies the
//! live slots into an inline snapshot, releases the registry, and then walks
//! the snapshot, skipping slots that were closed in the meantime. That gives:
//!
//! - nested `next` calls recurse normally;
//! - every slot live when the pass starts, and not closed during it, is
//!   visited exactly once;
//! - slots subscribed during a pass only see later emissions.
//!
//! [`Observable`]: super::Observable
//! [`OrderedObservable`]: super::OrderedObservable

use std::{
  cell::{Cell, RefCell},
  mem,
  rc::Rc,
};

use smallvec::SmallVec;

use crate::{
  filter::Filter,
  subscription::Subscription,
  util::{quick_delete_at, QuickDelete},
};

/// A boxed subscriber callback.
pub type Listener<T> = Box<dyn Fn(&T)>;

/// A compiled pipe: receives the value and a callback detaching its own
/// subscription.
pub(crate) type PipedListener<T> = Box<dyn Fn(&T, &dyn Fn())>;

pub(crate) type SharedCore<T> = RefCell<Core<T>>;

/// What a registry slot calls on delivery.
pub(crate) enum Entry<T> {
  Single(Listener<T>),
  /// Several listeners sharing one slot, invoked in order.
  Batch(SmallVec<[Listener<T>; 4]>),
  Piped(PipedListener<T>),
}

pub(crate) struct Slot<T> {
  seq: u64,
  order: Cell<i64>,
  closed: Cell<bool>,
  entry: Entry<T>,
}

/// Shared pointer to a slot, compared by identity.
pub(crate) struct SlotRef<T>(Rc<Slot<T>>);

impl<T> Clone for SlotRef<T> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> PartialEq for SlotRef<T> {
  fn eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl<T> SlotRef<T> {
  #[inline]
  pub fn is_closed(&self) -> bool { self.0.closed.get() }

  /// Mark closed; returns whether it was open.
  #[inline]
  pub fn close(&self) -> bool { !self.0.closed.replace(true) }

  #[inline]
  pub fn order(&self) -> i64 { self.0.order.get() }

  #[inline]
  pub fn set_order(&self, order: i64) { self.0.order.set(order) }

  fn sort_key(&self) -> (i64, u64) { (self.0.order.get(), self.0.seq) }

  fn deliver(&self, shared: &Rc<SharedCore<T>>, value: &T) {
    if self.is_closed() {
      return;
    }
    match &self.0.entry {
      Entry::Single(listener) => listener(value),
      Entry::Batch(listeners) => {
        for listener in listeners {
          if self.is_closed() {
            break;
          }
          listener(value);
        }
      }
      Entry::Piped(run) => run(value, &|| remove(shared, self)),
    }
  }
}

pub(crate) struct Core<T> {
  value: T,
  subscribers: SmallVec<[SlotRef<T>; 2]>,
  filter: Option<Filter<T>>,
  ordered: bool,
  needs_resorting: bool,
  next_seq: u64,
  destroyed: bool,
  #[cfg(test)]
  pub sort_passes: usize,
}

impl<T> Core<T> {
  pub fn shared(value: T, ordered: bool) -> Rc<SharedCore<T>> {
    Rc::new(RefCell::new(Core {
      value,
      subscribers: SmallVec::new(),
      filter: None,
      ordered,
      needs_resorting: false,
      next_seq: 0,
      destroyed: false,
      #[cfg(test)]
      sort_passes: 0,
    }))
  }

  #[inline]
  pub fn value(&self) -> &T { &self.value }

  #[inline]
  pub fn len(&self) -> usize { self.subscribers.len() }

  #[inline]
  pub fn is_destroyed(&self) -> bool { self.destroyed }

  #[inline]
  pub fn needs_resorting(&self) -> bool { self.needs_resorting }

  pub fn mark_dirty(&mut self) {
    if self.ordered {
      self.needs_resorting = true;
    }
  }

  /// Stable sort by `order`, ties broken by subscribe sequence.
  pub fn sort_by_order(&mut self) {
    self.subscribers.sort_by_key(SlotRef::sort_key);
    self.needs_resorting = false;
    #[cfg(test)]
    {
      self.sort_passes += 1;
    }
    tracing::trace!(subscribers = self.subscribers.len(), "registry re-sorted");
  }

  /// The observable-level filter, created on first use.
  pub fn filter_or_insert(&mut self) -> Filter<T>
  where
    T: 'static,
  {
    self.filter.get_or_insert_with(Filter::new).clone()
  }

  /// Close every slot and hand them back so the caller can drop them after
  /// releasing the borrow.
  pub fn take_subscribers(&mut self) -> SmallVec<[SlotRef<T>; 2]> {
    let slots = mem::take(&mut self.subscribers);
    for slot in &slots {
      slot.close();
    }
    self.needs_resorting = false;
    slots
  }

  pub fn destroy(&mut self) -> (SmallVec<[SlotRef<T>; 2]>, Option<Filter<T>>) {
    self.destroyed = true;
    (self.take_subscribers(), self.filter.take())
  }
}

/// Register `entry`; `None` once the observable is destroyed.
pub(crate) fn subscribe<T>(
  shared: &Rc<SharedCore<T>>,
  entry: Entry<T>,
  order: i64,
) -> Option<Subscription<T>> {
  let mut core = shared.borrow_mut();
  if core.destroyed {
    tracing::debug!("subscribe on a destroyed observable ignored");
    return None;
  }

  let seq = core.next_seq;
  core.next_seq += 1;
  let slot = SlotRef(Rc::new(Slot {
    seq,
    order: Cell::new(order),
    closed: Cell::new(false),
    entry,
  }));
  core.subscribers.push(slot.clone());
  core.mark_dirty();
  tracing::trace!(seq, order, subscribers = core.subscribers.len(), "subscribed");

  Some(Subscription::new(Rc::downgrade(shared), slot))
}

/// Close `slot` and drop it from the registry. Idempotent.
pub(crate) fn remove<T>(shared: &SharedCore<T>, slot: &SlotRef<T>) {
  if !slot.close() {
    return;
  }
  let mut core = shared.borrow_mut();
  let Some(index) = core.subscribers.position_of(slot) else {
    return;
  };
  let moved = index + 1 != core.subscribers.len();
  quick_delete_at(&mut core.subscribers, index);
  if moved {
    core.mark_dirty();
  }
  tracing::trace!(seq = slot.0.seq, subscribers = core.subscribers.len(), "unsubscribed");
}

/// Store `value` as current, gate it through the filter, and deliver it.
pub(crate) fn next<T: Clone + 'static>(shared: &Rc<SharedCore<T>>, value: T) {
  let (previous, filter) = {
    let mut core = shared.borrow_mut();
    if core.destroyed {
      tracing::debug!("next on a destroyed observable ignored");
      return;
    }
    let previous = mem::replace(&mut core.value, value.clone());
    (previous, core.filter.clone())
  };
  drop(previous);

  if let Some(filter) = filter {
    if !filter.is_empty() && filter.process_chain(&value).is_none() {
      return;
    }
  }

  let snapshot: SmallVec<[SlotRef<T>; 8]> = {
    let mut core = shared.borrow_mut();
    if core.needs_resorting {
      core.sort_by_order();
    }
    core.subscribers.iter().cloned().collect()
  };

  for slot in &snapshot {
    slot.deliver(shared, &value);
  }
}
