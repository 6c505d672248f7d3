//! # rxlite: synchronous observables with declarative chains
//!
//! A small push-based event dispatcher. Producers hold an [`Observable`] and
//! call `next`; every live subscriber is invoked before `next` returns.
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use rxlite::prelude::*;
//!
//! let seen = Rc::new(RefCell::new(vec![]));
//! let c_seen = seen.clone();
//!
//! let obs = Observable::new(0);
//! obs
//!   .pipe()
//!   .unwrap()
//!   .refine(|v| v % 2 == 0)
//!   .then(|v| v * 10)
//!   .subscribe(move |v| c_seen.borrow_mut().push(*v));
//!
//! obs.stream(1..=4);
//! assert_eq!(*seen.borrow(), vec![20, 40]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Current value plus an unordered subscriber registry |
//! | [`OrderedObservable`] | Delivers in ascending subscription order, re-sorting lazily |
//! | [`Filter`] | Observable-wide gate: AND steps, OR switches, error handling |
//! | [`Pipe`] | Per-subscription operators: refine, map, once, auto-unsubscribe |
//! | [`Subscription`] | Handle to detach one listener |
//! | [`Collector`] | Releases many subscriptions at once |
//!
//! ## Re-entrancy
//!
//! Listeners may call `next`, `subscribe` or `unsubscribe` on the observable
//! that is currently delivering. Nested emissions recurse; a subscriber
//! removed mid-pass is not called again; one added mid-pass starts with the
//! next emission.
//!
//! ## Logging
//!
//! Diagnostics go through [`tracing`]; nothing is printed unless the
//! application installs a subscriber.
//!
//! [`Observable`]: observable::Observable
//! [`OrderedObservable`]: observable::OrderedObservable
//! [`Filter`]: filter::Filter
//! [`Pipe`]: pipe::Pipe
//! [`Subscription`]: subscription::Subscription
//! [`Collector`]: subscription::Collector

mod chain;
pub mod error;
pub mod filter;
pub mod observable;
pub mod pipe;
pub mod prelude;
pub mod subscription;
pub mod switch_case;
pub mod util;

pub use chain::Predicate;
pub use prelude::*;
