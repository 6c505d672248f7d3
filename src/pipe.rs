use std::rc::Weak;

use crate::{
  chain::{Chain, ChainFlags, Outcome, Predicate, Step},
  observable::registry::{self, Entry, SharedCore},
  subscription::Subscription,
  switch_case::PipeSwitchCase,
};

/// Continuation handed to a pipe stage: receives the stage's payload and the
/// flags of the running evaluation.
type Deliver<'d, P> = &'d mut dyn FnMut(&P, &mut ChainFlags) -> Outcome;

/// Everything upstream of the current chain, compiled into one call.
type Head<T, P> = Box<dyn for<'d> Fn(&T, &mut ChainFlags, Deliver<'d, P>) -> Outcome>;

fn head<T, P, F>(f: F) -> Head<T, P>
where
  F: for<'d> Fn(&T, &mut ChainFlags, Deliver<'d, P>) -> Outcome + 'static,
{
  Box::new(f)
}

/// A per-subscription operator chain.
///
/// Operators are appended in call order and evaluated in that order for every
/// emission. [`Pipe::subscribe`] consumes the pipe, so one pipe always backs
/// exactly one subscription.
///
/// Operators are expected to be infallible. A panic in a predicate, a mapping
/// or the listener unwinds to the caller of `next`; unlike
/// [`Filter`](crate::filter::Filter) nothing is caught here.
///
/// # Example
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxlite::prelude::*;
///
/// let seen = Rc::new(RefCell::new(vec![]));
/// let c_seen = seen.clone();
///
/// let obs = Observable::new(0);
/// obs
///   .pipe()
///   .unwrap()
///   .refine(|v| v % 2 == 0)
///   .then(|v| format!("Value: {v}"))
///   .subscribe(move |s| c_seen.borrow_mut().push(s.clone()));
///
/// obs.stream(0..5);
/// assert_eq!(*seen.borrow(), vec!["Value: 0", "Value: 2", "Value: 4"]);
/// ```
pub struct Pipe<T, P = T> {
  source: Weak<SharedCore<T>>,
  head: Head<T, P>,
  chain: Chain<P>,
}

impl<T: 'static> Pipe<T> {
  pub(crate) fn new(source: Weak<SharedCore<T>>) -> Self {
    Pipe {
      source,
      head: head(|value, flags, deliver| deliver(value, flags)),
      chain: Chain::default(),
    }
  }
}

impl<T: 'static, P: 'static> Pipe<T, P> {
  /// Deliver only payloads for which `predicate` holds.
  pub fn refine(self, predicate: impl Fn(&P) -> bool + 'static) -> Self {
    self.push_step(Step::Emit(Box::new(predicate)))
  }

  /// Alias of [`Pipe::refine`].
  #[inline]
  pub fn emit_by_positive(self, predicate: impl Fn(&P) -> bool + 'static) -> Self {
    self.refine(predicate)
  }

  /// Deliver only payloads for which `predicate` does not hold.
  pub fn emit_by_negative(self, predicate: impl Fn(&P) -> bool + 'static) -> Self {
    self.refine(move |v| !predicate(v))
  }

  /// Deliver only payloads that `f` maps onto an equal value.
  pub fn emit_match(self, f: impl Fn(&P) -> P + 'static) -> Self
  where
    P: PartialEq,
  {
    self.refine(move |v| f(v) == *v)
  }

  /// Dispose the subscription, without delivering, on the first payload for
  /// which `predicate` holds.
  pub fn unsubscribe_by_positive(self, predicate: impl Fn(&P) -> bool + 'static) -> Self {
    self.push_step(Step::UnsubscribeWhen(Box::new(predicate)))
  }

  /// Dispose the subscription, without delivering, on the first payload for
  /// which `predicate` does not hold.
  pub fn unsubscribe_by_negative(self, predicate: impl Fn(&P) -> bool + 'static) -> Self {
    self.unsubscribe_by_positive(move |v| !predicate(v))
  }

  /// Deliver the next payload that reaches this point, then dispose the
  /// subscription. Operators after `set_once` other than `then` are skipped.
  pub fn set_once(self) -> Self { self.push_step(Step::Once) }

  /// Append one [`Pipe::refine`] step per predicate.
  pub fn push_refiners<I>(self, predicates: I) -> Self
  where
    I: IntoIterator<Item = Predicate<P>>,
  {
    predicates
      .into_iter()
      .fold(self, |pipe, predicate| pipe.push_step(Step::Emit(predicate)))
  }

  /// Open an OR group: the first matching case accepts the payload and skips
  /// the remaining gating operators; no match rejects it.
  pub fn switch(mut self) -> PipeSwitchCase<T, P> {
    let group = self.chain.open_group();
    PipeSwitchCase::new(self, group)
  }

  /// Replace the payload with `map(payload)`.
  ///
  /// Mappings always run for a payload that got this far, even after a
  /// matched case or `set_once` skipped the gating operators in between.
  pub fn then<U: 'static>(self, map: impl Fn(&P) -> U + 'static) -> Pipe<T, U> {
    let Pipe { source, head: upstream, chain } = self;
    Pipe {
      source,
      head: head(move |value, flags, deliver| {
        upstream(value, flags, &mut |payload: &P, flags: &mut ChainFlags| {
          match chain.run(payload, flags) {
            Outcome::Deliver => deliver(&map(payload), flags),
            other => other,
          }
        })
      }),
      chain: Chain::default(),
    }
  }

  /// Run the operators against `value` without subscribing and hand the
  /// final payload to `listener`.
  ///
  /// Returns the listener's result, or `None` when the value was rejected.
  /// Nothing is bound here, so an unsubscribe request counts as a rejection
  /// and `set_once` simply delivers.
  pub fn process_chain<R>(&self, value: &T, listener: impl FnOnce(&P) -> R) -> Option<R> {
    let mut listener = Some(listener);
    let mut delivered = None;
    (self.head)(value, &mut ChainFlags::default(), &mut |payload: &P, flags: &mut ChainFlags| {
      let outcome = self.chain.run(payload, flags);
      if let Outcome::Deliver = outcome {
        delivered = listener.take().map(|listener| listener(payload));
      }
      outcome
    });
    delivered
  }

  /// Bind the compiled chain to `listener` and register it on the source
  /// observable.
  ///
  /// Returns `None` when the observable has been dropped or destroyed.
  pub fn subscribe(self, listener: impl Fn(&P) + 'static) -> Option<Subscription<T>> {
    let Pipe { source, head: upstream, chain } = self;
    let Some(source) = source.upgrade() else {
      tracing::debug!("pipe subscribed after its observable was dropped");
      return None;
    };

    let run = move |value: &T, detach: &dyn Fn()| {
      let mut flags = ChainFlags::default();
      let outcome = upstream(value, &mut flags, &mut |payload: &P, flags: &mut ChainFlags| {
        let outcome = chain.run(payload, flags);
        if let Outcome::Deliver = outcome {
          if flags.is_once {
            detach();
          }
          listener(payload);
        }
        outcome
      });
      match outcome {
        Outcome::Unsubscribe => detach(),
        Outcome::Fault(err) => tracing::error!(error = %err, "pipe step faulted"),
        Outcome::Deliver | Outcome::Reject => {}
      }
    };
    registry::subscribe(&source, Entry::Piped(Box::new(run)), 0)
  }

  pub(crate) fn push_step(mut self, step: Step<P>) -> Self {
    self.chain.push(step);
    self
  }
}

#[cfg(test)]
mod test {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  fn collector<V: 'static>() -> (Rc<RefCell<Vec<V>>>, impl Fn(&V) + 'static)
  where
    V: Clone,
  {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    (seen, move |v: &V| c_seen.borrow_mut().push(v.clone()))
  }

  #[test]
  fn refine_then_map() {
    let obs = Observable::new(0_i32);
    let (seen, listener) = collector::<String>();
    obs
      .pipe()
      .unwrap()
      .refine(|v| v % 2 == 0)
      .then(|v| format!("Value: {v}"))
      .subscribe(listener);

    obs.stream(0..100);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 50);
    assert_eq!(seen[0], "Value: 0");
    assert_eq!(seen[49], "Value: 98");
  }

  #[test]
  fn map_never_runs_for_rejected_values() {
    let mapped = Rc::new(RefCell::new(0));
    let c_mapped = mapped.clone();

    let obs = Observable::new(0_i32);
    obs
      .pipe()
      .unwrap()
      .refine(|v| *v > 2)
      .then(move |v| {
        *c_mapped.borrow_mut() += 1;
        *v
      })
      .subscribe(|_| {});

    obs.stream(0..5);
    assert_eq!(*mapped.borrow(), 2);
  }

  #[test]
  fn emit_by_negative() {
    let obs = Observable::new(0_i32);
    let (seen, listener) = collector::<i32>();
    obs
      .pipe()
      .unwrap()
      .emit_by_negative(|v| v % 3 == 0)
      .subscribe(listener);

    obs.stream(0..7);
    assert_eq!(*seen.borrow(), vec![1, 2, 4, 5]);
  }

  #[test]
  fn emit_match_keeps_fixed_points() {
    let obs = Observable::new(0_i32);
    let (seen, listener) = collector::<i32>();
    obs
      .pipe()
      .unwrap()
      .emit_match(|v| v.abs())
      .subscribe(listener);

    obs.stream([-2, 3, -1, 0]);
    assert_eq!(*seen.borrow(), vec![3, 0]);
  }

  #[test]
  fn set_once_delivers_exactly_once() {
    let obs = Observable::new(0_i32);
    let (seen, listener) = collector::<i32>();
    let subscription = obs
      .pipe()
      .unwrap()
      .refine(|v| *v > 1)
      .set_once()
      .subscribe(listener)
      .unwrap();

    obs.stream(0..5);
    assert_eq!(*seen.borrow(), vec![2]);
    assert!(subscription.is_closed());
    assert!(obs.is_empty());

    subscription.unsubscribe();
    assert!(subscription.is_closed());
  }

  #[test]
  fn set_once_is_not_reentered_by_nested_emission() {
    let obs = Observable::new(0_i32);
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let c_obs = obs.clone();
    obs
      .pipe()
      .unwrap()
      .set_once()
      .subscribe(move |v| {
        c_seen.borrow_mut().push(*v);
        c_obs.next(v + 1);
      });

    obs.next(1);
    assert_eq!(*seen.borrow(), vec![1]);
  }

  #[test]
  fn unsubscribe_by_positive_skips_trigger_value() {
    let obs = Observable::new(0_i32);
    let (seen, listener) = collector::<i32>();
    let subscription = obs
      .pipe()
      .unwrap()
      .unsubscribe_by_positive(|v| *v == 3)
      .subscribe(listener)
      .unwrap();

    obs.stream(0..6);
    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    assert!(subscription.is_closed());
  }

  #[test]
  fn unsubscribe_by_negative() {
    let obs = Observable::new(0_i32);
    let (seen, listener) = collector::<i32>();
    obs
      .pipe()
      .unwrap()
      .unsubscribe_by_negative(|v| *v < 2)
      .subscribe(listener);

    obs.stream(0..6);
    assert_eq!(*seen.borrow(), vec![0, 1]);
    assert!(obs.is_empty());
  }

  #[test]
  fn push_refiners_is_and() {
    let obs = Observable::new(0_i32);
    let (seen, listener) = collector::<i32>();
    let refiners: Vec<Predicate<i32>> = vec![Box::new(|v: &i32| *v > 2), Box::new(|v: &i32| v % 2 == 1)];
    obs.pipe().unwrap().push_refiners(refiners).subscribe(listener);

    obs.stream(0..10);
    assert_eq!(*seen.borrow(), vec![3, 5, 7, 9]);
  }

  #[test]
  fn switch_first_match_wins() {
    let obs = Observable::new(0_i32);
    let (seen, listener) = collector::<i32>();
    obs
      .pipe()
      .unwrap()
      .switch()
      .case(|v| *v == 1)
      .or(|v| *v == 4)
      .any_of(vec![Box::new(|v: &i32| *v > 8) as Predicate<i32>])
      .subscribe(listener);

    obs.stream(0..11);
    assert_eq!(*seen.borrow(), vec![1, 4, 9, 10]);
  }

  #[test]
  fn map_applies_after_set_once_break() {
    let obs = Observable::new(0_i32);
    let (seen, listener) = collector::<i32>();
    obs
      .pipe()
      .unwrap()
      .set_once()
      .refine(|_| false)
      .then(|v| v * 2)
      .subscribe(listener);

    obs.stream([3, 4]);
    assert_eq!(*seen.borrow(), vec![6]);
  }

  #[test]
  fn switch_over_mapped_payload() {
    let obs = Observable::new(0_i32);
    let (seen, listener) = collector::<i32>();
    obs
      .pipe()
      .unwrap()
      .then(|v| v * 10)
      .switch()
      .case(|v| *v == 20)
      .subscribe(listener);

    obs.stream(0..4);
    assert_eq!(*seen.borrow(), vec![20]);
  }

  #[test]
  fn gating_after_map_sees_mapped_payload() {
    let obs = Observable::new(0_i32);
    let (seen, listener) = collector::<usize>();
    obs
      .pipe()
      .unwrap()
      .then(|v: &i32| v.to_string())
      .refine(|s| s.len() > 1)
      .then(|s| s.len())
      .subscribe(listener);

    obs.stream([5, 12, 7, 300]);
    assert_eq!(*seen.borrow(), vec![2, 3]);
  }

  #[test]
  fn process_chain_without_subscribing() {
    let obs = Observable::new(0_i32);
    let pipe = obs
      .pipe()
      .unwrap()
      .refine(|v| *v > 0)
      .unsubscribe_by_positive(|v| *v == 5)
      .then(|v| v * 2);

    assert_eq!(pipe.process_chain(&3, |v| *v + 1), Some(7));
    assert_eq!(pipe.process_chain(&-1, |v| *v), None);
    assert_eq!(pipe.process_chain(&5, |v| *v), None);
    assert!(obs.is_empty());
  }

  #[test]
  fn subscribe_after_drop_is_none() {
    let obs = Observable::new(0_i32);
    let pipe = obs.pipe().unwrap();
    drop(obs);
    assert!(pipe.subscribe(|_| {}).is_none());
  }
}
