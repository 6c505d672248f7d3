use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
  chain::{Chain, ChainFlags, Outcome, Predicate, Step},
  error::{BoxError, FilterError},
  switch_case::FilterSwitchCase,
};

type ErrorHandler<T> = Rc<dyn Fn(&FilterError, &T)>;

/// A predicate chain gating every emission of an observable before any
/// subscriber sees it.
///
/// `Filter` is a shared handle: the one returned by
/// [`Observable::add_filter`](crate::observable::Observable::add_filter) and
/// the copy kept by the observable configure the same chain.
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
/// obs.add_filter().filter(|v| *v > 0).filter(|v| v % 2 == 0);
/// obs.subscribe(move |v| c_seen.borrow_mut().push(*v));
///
/// obs.stream([-2, 1, 2, 3, 4]);
/// assert_eq!(*seen.borrow(), vec![2, 4]);
/// ```
pub struct Filter<T>(Rc<RefCell<FilterCore<T>>>);

struct FilterCore<T> {
  chain: Chain<T>,
  error_handler: Option<ErrorHandler<T>>,
}

impl<T> Default for Filter<T> {
  fn default() -> Self {
    Self(Rc::new(RefCell::new(FilterCore { chain: Chain::default(), error_handler: None })))
  }
}

impl<T> Clone for Filter<T> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> fmt::Debug for Filter<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let core = self.0.borrow();
    f.debug_struct("Filter")
      .field("steps", &core.chain.len())
      .field("has_error_handler", &core.error_handler.is_some())
      .finish()
  }
}

impl<T: 'static> Filter<T> {
  /// Create a detached filter.
  pub fn new() -> Self { Self::default() }

  /// Append an AND step: values for which `predicate` is false are rejected.
  pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> &Self {
    self.push_step(Step::Emit(Box::new(predicate)));
    self
  }

  /// Append a fallible AND step.
  ///
  /// An `Err` rejects the value and is routed to the error handler, see
  /// [`Filter::add_error_handler`].
  pub fn try_filter<E>(&self, predicate: impl Fn(&T) -> Result<bool, E> + 'static) -> &Self
  where
    E: Into<BoxError> + 'static,
  {
    self.push_step(Step::TryEmit(Box::new(move |v: &T| -> Result<bool, BoxError> {
      predicate(v).map_err(Into::into)
    })));
    self
  }

  /// Open an OR group on this chain. The first matching case accepts the
  /// value; if none matches, the value is rejected.
  pub fn switch(&self) -> FilterSwitchCase<T> {
    let group = self.0.borrow_mut().chain.open_group();
    FilterSwitchCase::new(self.clone(), group)
  }

  /// Receive errors raised by fallible predicates together with the rejected
  /// value. Replaces any previously registered handler.
  ///
  /// Without a handler the error is logged at `warn` level.
  pub fn add_error_handler(&self, handler: impl Fn(&FilterError, &T) + 'static) -> &Self {
    self.0.borrow_mut().error_handler = Some(Rc::new(handler));
    self
  }

  /// True while no step has been appended.
  pub fn is_empty(&self) -> bool { self.0.borrow().chain.is_empty() }

  /// Evaluate the chain for `value`.
  ///
  /// Returns the payload when accepted and `None` when rejected. Errors from
  /// fallible predicates never escape: they are reported and count as a
  /// rejection.
  pub fn process_chain<'v>(&self, value: &'v T) -> Option<&'v T> {
    let outcome = {
      let core = self.0.borrow();
      core.chain.run(value, &mut ChainFlags::default())
    };

    match outcome {
      Outcome::Deliver => Some(value),
      Outcome::Reject | Outcome::Unsubscribe => None,
      Outcome::Fault(err) => {
        let handler = self.0.borrow().error_handler.clone();
        match handler {
          Some(handler) => handler(&err, value),
          None => {
            tracing::warn!(step = err.step(), error = %err, "filter predicate failed, value rejected")
          }
        }
        None
      }
    }
  }

  pub(crate) fn push_step(&self, step: Step<T>) { self.0.borrow_mut().chain.push(step); }

  pub(crate) fn push_case(&self, group: usize, condition: Predicate<T>) {
    self.push_step(Step::Case { group, condition });
  }
}
