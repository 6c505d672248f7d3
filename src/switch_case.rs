//! OR-branching builders opened by `switch()` on a filter or a pipe.
//!
//! Every `case` appends one branch to the underlying chain. Branches of one
//! `switch()` are tried in order: the first match accepts the value and skips
//! everything after it, and running out of branches rejects the value.

use crate::{
  chain::{Predicate, Step},
  filter::Filter,
  pipe::Pipe,
  subscription::Subscription,
};

/// Branch builder over an observable-level [`Filter`].
pub struct FilterSwitchCase<T> {
  filter: Filter<T>,
  group: usize,
}

impl<T: 'static> FilterSwitchCase<T> {
  pub(crate) fn new(filter: Filter<T>, group: usize) -> Self { Self { filter, group } }

  /// Append a branch.
  pub fn case(&self, condition: impl Fn(&T) -> bool + 'static) -> &Self {
    self.filter.push_case(self.group, Box::new(condition));
    self
  }

  /// Alias of [`FilterSwitchCase::case`].
  #[inline]
  pub fn or(&self, condition: impl Fn(&T) -> bool + 'static) -> &Self { self.case(condition) }

  /// Append several branches at once.
  pub fn any_of<I>(&self, conditions: I) -> &Self
  where
    I: IntoIterator<Item = Predicate<T>>,
  {
    for condition in conditions {
      self.filter.push_case(self.group, condition);
    }
    self
  }

  /// Alias of [`FilterSwitchCase::any_of`].
  #[inline]
  pub fn push_cases<I>(&self, conditions: I) -> &Self
  where
    I: IntoIterator<Item = Predicate<T>>,
  {
    self.any_of(conditions)
  }
}

/// Branch builder over a [`Pipe`]; finish it with
/// [`PipeSwitchCase::subscribe`].
pub struct PipeSwitchCase<T, P = T> {
  pipe: Pipe<T, P>,
  group: usize,
}

impl<T: 'static, P: 'static> PipeSwitchCase<T, P> {
  pub(crate) fn new(pipe: Pipe<T, P>, group: usize) -> Self { Self { pipe, group } }

  /// Append a branch.
  pub fn case(self, condition: impl Fn(&P) -> bool + 'static) -> Self {
    self.push(Box::new(condition))
  }

  /// Alias of [`PipeSwitchCase::case`].
  #[inline]
  pub fn or(self, condition: impl Fn(&P) -> bool + 'static) -> Self { self.case(condition) }

  /// Append several branches at once.
  pub fn any_of<I>(self, conditions: I) -> Self
  where
    I: IntoIterator<Item = Predicate<P>>,
  {
    conditions
      .into_iter()
      .fold(self, |this, condition| this.push(condition))
  }

  /// Alias of [`PipeSwitchCase::any_of`].
  #[inline]
  pub fn push_cases<I>(self, conditions: I) -> Self
  where
    I: IntoIterator<Item = Predicate<P>>,
  {
    self.any_of(conditions)
  }

  /// Bind the pipe to `listener`, see [`Pipe::subscribe`].
  pub fn subscribe(self, listener: impl Fn(&P) + 'static) -> Option<Subscription<T>> {
    self.pipe.subscribe(listener)
  }

  fn push(self, condition: Predicate<P>) -> Self {
    let Self { pipe, group } = self;
    Self { pipe: pipe.push_step(Step::Case { group, condition }), group }
  }
}
