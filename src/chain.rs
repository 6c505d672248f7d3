//! The step engine shared by [`Filter`](crate::filter::Filter) and
//! [`Pipe`](crate::pipe::Pipe).
//!
//! A chain is a flat list of tagged steps evaluated by a single loop against
//! one payload. Every evaluation threads a fresh [`ChainFlags`] record through
//! the steps; the record lives on the caller's stack, so nested evaluations of
//! the same chain never observe each other's state.

use crate::error::{BoxError, FilterError};

/// A boxed predicate over a chain payload.
pub type Predicate<P> = Box<dyn Fn(&P) -> bool>;

pub(crate) type TryPredicate<P> = Box<dyn Fn(&P) -> Result<bool, BoxError>>;

/// Control flags of one in-flight evaluation.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ChainFlags {
  /// The current step accepted the payload.
  pub is_available: bool,
  /// Skip the remaining steps but still deliver.
  pub is_break_chain: bool,
  /// Dispose the subscription instead of delivering.
  pub is_need_unsubscribe: bool,
  /// Dispose the subscription right before delivering.
  pub is_once: bool,
}

pub(crate) enum Step<P> {
  /// Accept when the predicate holds.
  Emit(Predicate<P>),
  /// Accept when the predicate returns `Ok(true)`; `Err` faults the run.
  TryEmit(TryPredicate<P>),
  /// Always accept, request disposal when the predicate holds.
  UnsubscribeWhen(Predicate<P>),
  /// Accept, stop evaluating and dispose around the delivery.
  Once,
  /// One branch of an OR group opened by `switch()`.
  Case { group: usize, condition: Predicate<P> },
}

/// Terminal state of one evaluation.
#[derive(Debug)]
pub(crate) enum Outcome {
  Deliver,
  Reject,
  Unsubscribe,
  Fault(FilterError),
}

pub(crate) struct Chain<P> {
  steps: Vec<Step<P>>,
  groups: usize,
}

impl<P> Default for Chain<P> {
  fn default() -> Self { Self { steps: Vec::new(), groups: 0 } }
}

impl<P> Chain<P> {
  #[inline]
  pub fn push(&mut self, step: Step<P>) { self.steps.push(step); }

  /// Start a new switch group and return its id.
  pub fn open_group(&mut self) -> usize {
    let group = self.groups;
    self.groups += 1;
    group
  }

  #[inline]
  pub fn is_empty(&self) -> bool { self.steps.is_empty() }

  #[inline]
  pub fn len(&self) -> usize { self.steps.len() }

  /// Evaluate every step in order against `payload`.
  ///
  /// Steps left by an earlier break (`flags.is_break_chain`) are skipped, so
  /// a break in one chain also short-circuits chains evaluated after it with
  /// the same flags.
  pub fn run(&self, payload: &P, flags: &mut ChainFlags) -> Outcome {
    for (index, step) in self.steps.iter().enumerate() {
      if flags.is_break_chain {
        break;
      }
      flags.is_available = false;
      flags.is_need_unsubscribe = false;

      match step {
        Step::Emit(predicate) => flags.is_available = predicate(payload),
        Step::TryEmit(predicate) => match predicate(payload) {
          Ok(accepted) => flags.is_available = accepted,
          Err(source) => return Outcome::Fault(FilterError::Predicate { step: index, source }),
        },
        Step::UnsubscribeWhen(predicate) => {
          flags.is_available = true;
          flags.is_need_unsubscribe = predicate(payload);
        }
        Step::Once => {
          flags.is_available = true;
          flags.is_break_chain = true;
          flags.is_once = true;
        }
        Step::Case { group, condition } => {
          flags.is_available = true;
          if condition(payload) {
            flags.is_break_chain = true;
          } else if self.is_last_case(index, *group) {
            // exhausted the group without a match
            flags.is_available = false;
          }
        }
      }

      if flags.is_need_unsubscribe {
        return Outcome::Unsubscribe;
      }
      if !flags.is_available {
        return Outcome::Reject;
      }
    }
    Outcome::Deliver
  }

  fn is_last_case(&self, index: usize, group: usize) -> bool {
    !matches!(
      self.steps.get(index + 1),
      Some(Step::Case { group: next, .. }) if *next == group
    )
  }
}
