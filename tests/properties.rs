//! Property tests for quick deletion, chain semantics and ordered dispatch.

use std::{cell::RefCell, rc::Rc};

use proptest::prelude::*;
use rxlite::{
  prelude::*,
  util::{quick_delete, quick_delete_at},
};

proptest! {
  #[test]
  fn quick_delete_keeps_membership(
    mut items in prop::collection::vec(any::<u8>(), 1..32),
    pick in any::<prop::sample::Index>(),
  ) {
    let original = items.clone();
    let target = original[pick.index(original.len())];

    prop_assert!(quick_delete(&mut items, &target));
    prop_assert_eq!(items.len(), original.len() - 1);

    let mut expected = original.clone();
    let at = expected.iter().position(|v| *v == target).unwrap();
    expected.remove(at);
    let mut got = items.clone();
    got.sort_unstable();
    expected.sort_unstable();
    prop_assert_eq!(got, expected);
  }

  #[test]
  fn quick_delete_absent_is_noop(
    mut items in prop::collection::vec(0..100u8, 0..32),
    target in 100..=255u8,
  ) {
    let original = items.clone();
    prop_assert!(!quick_delete(&mut items, &target));
    prop_assert_eq!(items, original);
  }

  #[test]
  fn quick_delete_at_out_of_range(mut items in prop::collection::vec(any::<u8>(), 0..16)) {
    let len = items.len();
    prop_assert!(!quick_delete_at(&mut items, len));
    prop_assert_eq!(items.len(), len);
  }

  #[test]
  fn filter_steps_are_and(
    thresholds in prop::collection::vec(-50..50i32, 1..6),
    value in -60..60i32,
  ) {
    let filter = Filter::new();
    for t in thresholds.clone() {
      filter.filter(move |v: &i32| *v > t);
    }
    let expected = thresholds.iter().all(|t| value > *t);
    prop_assert_eq!(filter.process_chain(&value).is_some(), expected);
  }

  #[test]
  fn switch_cases_are_or(
    targets in prop::collection::vec(0..20i32, 1..6),
    value in 0..20i32,
  ) {
    let filter = Filter::new();
    let cases: Vec<Predicate<i32>> = targets
      .iter()
      .map(|t| {
        let t = *t;
        Box::new(move |v: &i32| *v == t) as Predicate<i32>
      })
      .collect();
    filter.switch().push_cases(cases);

    prop_assert_eq!(filter.process_chain(&value).is_some(), targets.contains(&value));
  }

  #[test]
  fn ordered_dispatch_is_non_decreasing(
    orders in prop::collection::vec(-5..5i64, 1..12),
    removals in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
  ) {
    let obs = OrderedObservable::new(());
    let seen = Rc::new(RefCell::new(Vec::new()));

    let mut handles = Vec::new();
    for (seq, order) in orders.iter().copied().enumerate() {
      let c_seen = seen.clone();
      let handle = obs
        .subscribe_with_order(move |_| c_seen.borrow_mut().push((order, seq)), order)
        .unwrap();
      handles.push(handle);
    }
    for index in removals {
      handles[index.index(handles.len())].unsubscribe();
    }

    obs.next(());

    let seen = seen.borrow();
    let live = handles.iter().filter(|h| !h.is_closed()).count();
    prop_assert_eq!(seen.len(), live);
    // order ascending, ties in subscribe order
    prop_assert!(seen.windows(2).all(|w| w[0] < w[1]));
    prop_assert!(!obs.needs_resorting());
  }
}
