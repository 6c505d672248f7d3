//! Prelude module for convenient imports

pub use crate::{
  chain::Predicate,
  error::{BoxError, FilterError, SubscriptionError},
  filter::Filter,
  observable::{Listener, Observable, OrderedObservable},
  pipe::Pipe,
  subscription::{Collector, Subscription, SubscriptionLike},
  switch_case::{FilterSwitchCase, PipeSwitchCase},
};
