//! Unordered removal helpers shared by every subscriber registry.

use smallvec::{Array, SmallVec};

/// A contiguous container that can drop one element by moving its last
/// element into the freed slot.
///
/// The relative order of the surviving elements is **not** preserved: after
/// removing index `i`, the former last element lives at `i`.
pub trait QuickDelete {
  type Item;

  fn len(&self) -> usize;

  fn position_of(&self, target: &Self::Item) -> Option<usize>
  where
    Self::Item: PartialEq;

  /// Swap the element at `index` with the last one and truncate.
  fn swap_remove_at(&mut self, index: usize) -> Self::Item;
}

impl<T> QuickDelete for Vec<T> {
  type Item = T;

  #[inline]
  fn len(&self) -> usize { Vec::len(self) }

  #[inline]
  fn position_of(&self, target: &T) -> Option<usize>
  where
    T: PartialEq,
  {
    self.iter().position(|v| v == target)
  }

  #[inline]
  fn swap_remove_at(&mut self, index: usize) -> T { self.swap_remove(index) }
}

impl<A: Array> QuickDelete for SmallVec<A> {
  type Item = A::Item;

  #[inline]
  fn len(&self) -> usize { SmallVec::len(self) }

  #[inline]
  fn position_of(&self, target: &A::Item) -> Option<usize>
  where
    A::Item: PartialEq,
  {
    self.iter().position(|v| v == target)
  }

  #[inline]
  fn swap_remove_at(&mut self, index: usize) -> A::Item { self.swap_remove(index) }
}

/// Remove `target` from `container` in O(1) after an O(n) lookup.
///
/// Returns `false` and leaves the container untouched when `target` is
/// absent.
///
/// ```
/// use rxlite::util::quick_delete;
///
/// let mut v = vec![1, 2, 3, 4];
/// assert!(quick_delete(&mut v, &2));
/// assert_eq!(v, vec![1, 4, 3]);
/// assert!(!quick_delete(&mut v, &7));
/// ```
pub fn quick_delete<C>(container: &mut C, target: &C::Item) -> bool
where
  C: QuickDelete,
  C::Item: PartialEq,
{
  match container.position_of(target) {
    Some(index) => {
      container.swap_remove_at(index);
      true
    }
    None => false,
  }
}

/// Remove the element at `index` in O(1). Out of range indices return
/// `false`.
pub fn quick_delete_at<C: QuickDelete>(container: &mut C, index: usize) -> bool {
  if index < container.len() {
    container.swap_remove_at(index);
    true
  } else {
    false
  }
}
