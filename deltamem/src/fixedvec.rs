use std::collections::TryReserveError;
use std::fmt;
use std::mem::MaybeUninit;
use std::ops::{Deref, DerefMut};

fn try_make_boxed_slice<T>(capacity: usize) -> Result<Box<[MaybeUninit<T>]>, TryReserveError> {
  let mut vec = Vec::new();
  vec.try_reserve_exact(capacity)?;
  // Safe since element type is MaybeUninit<T> and we've just guaranteed
  // that the vector has the correct capacity.
  unsafe { vec.set_len(capacity) };

  Ok(vec.into_boxed_slice())
}

/// A vector whose storage is allocated once, up front, and never grows.
///
/// Used for the cache's slot records and its id-ordered index so that every
/// allocation the cache makes happens at construction time.
pub(crate) struct FixedVec<T> {
  data: Box<[MaybeUninit<T>]>,
  size: usize,
}

impl<T> FixedVec<T> {
  /// Construct a new, empty `FixedVec<T>` able to hold `capacity` elements.
  ///
  /// Reports the allocation failure instead of aborting.
  pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
    Ok(Self {
      data: try_make_boxed_slice(capacity)?,
      size: 0,
    })
  }

  /// Returns the maximum number of elements this fixedvec can store.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.data.len()
  }

  /// Returns the number of elements that can be inserted into this `FixedVec`
  /// before it runs out of capacity.
  #[inline]
  pub fn available(&self) -> usize {
    self.capacity() - self.size
  }

  /// Clears the vector, removing all values.
  pub fn clear(&mut self) {
    let len = self.size;
    self.size = 0;

    if std::mem::needs_drop::<T>() {
      for i in 0..len {
        unsafe { std::ptr::drop_in_place(self.as_mut_ptr().add(i)) };
      }
    }
  }

  #[inline]
  pub fn as_slice(&self) -> &[T] {
    unsafe { std::slice::from_raw_parts(self.as_ptr(), self.size) }
  }

  #[inline]
  pub fn as_mut_slice(&mut self) -> &mut [T] {
    unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), self.size) }
  }

  #[inline]
  fn as_ptr(&self) -> *const T {
    self.data.as_ptr() as _
  }

  #[inline]
  fn as_mut_ptr(&mut self) -> *mut T {
    self.data.as_mut_ptr() as _
  }

  /// Appends an element to the back of the vector.
  ///
  /// If there is not enough capacity to fit another element then it returns
  /// an error with the provided element.
  pub fn push(&mut self, value: T) -> Result<(), T> {
    if self.available() == 0 {
      return Err(value);
    }

    unsafe { std::ptr::write(self.as_mut_ptr().add(self.size), value) };
    self.size += 1;

    Ok(())
  }

  /// Inserts an element at position `index`, shifting all elements after it
  /// to the right.
  ///
  /// # Panics
  /// Panics if `index > len` or if `available == 0`.
  pub fn insert(&mut self, index: usize, element: T) {
    assert!(index <= self.size);
    assert!(self.available() > 0);

    unsafe {
      let elem = self.as_mut_ptr().add(index);
      std::ptr::copy(elem, elem.add(1), self.size - index);
      std::ptr::write(elem, element);
    }

    self.size += 1;
  }

  /// Moves the element at `from` so that it ends up at `to`, shifting the
  /// elements in between by one position towards `from`.
  ///
  /// Only the segment between the two positions is touched.
  ///
  /// # Panics
  /// Panics if either index is out of bounds.
  pub fn relocate(&mut self, from: usize, to: usize) {
    let slice = self.as_mut_slice();
    assert!(from < slice.len() && to < slice.len());

    if from < to {
      slice[from..=to].rotate_left(1);
    } else if to < from {
      slice[to..=from].rotate_right(1);
    }
  }
}

impl<T> Drop for FixedVec<T> {
  fn drop(&mut self) {
    self.clear();
  }
}

impl<T> Deref for FixedVec<T> {
  type Target = [T];

  #[inline]
  fn deref(&self) -> &Self::Target {
    self.as_slice()
  }
}

impl<T> DerefMut for FixedVec<T> {
  #[inline]
  fn deref_mut(&mut self) -> &mut Self::Target {
    self.as_mut_slice()
  }
}

impl<T: fmt::Debug> fmt::Debug for FixedVec<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.deref().fmt(f)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::rc::Rc;

  fn filled(values: &[u32]) -> FixedVec<u32> {
    let mut vec = FixedVec::try_with_capacity(8).unwrap();
    for &v in values {
      vec.push(v).unwrap();
    }
    vec
  }

  #[test]
  fn push_until_full() {
    let mut vec = FixedVec::try_with_capacity(2).unwrap();
    assert_eq!(vec.push(1u8), Ok(()));
    assert_eq!(vec.push(2), Ok(()));
    assert_eq!(vec.push(3), Err(3));
    assert_eq!(vec.available(), 0);
    assert_eq!(&*vec, &[1, 2]);
  }

  #[test]
  fn insert_shifts_right() {
    let mut vec = filled(&[1, 3, 4]);
    vec.insert(1, 2);
    vec.insert(4, 5);
    assert_eq!(&*vec, &[1, 2, 3, 4, 5]);
  }

  #[test]
  fn relocate_forwards_and_backwards() {
    let mut vec = filled(&[0, 1, 2, 3, 4]);
    vec.relocate(1, 3);
    assert_eq!(&*vec, &[0, 2, 3, 1, 4]);

    vec.relocate(4, 0);
    assert_eq!(&*vec, &[4, 0, 2, 3, 1]);

    vec.relocate(2, 2);
    assert_eq!(&*vec, &[4, 0, 2, 3, 1]);
  }

  #[test]
  fn drops_elements() {
    let value = Rc::new(());
    {
      let mut vec = FixedVec::try_with_capacity(4).unwrap();
      vec.push(Rc::clone(&value)).unwrap();
      vec.push(Rc::clone(&value)).unwrap();
      assert_eq!(Rc::strong_count(&value), 3);
    }
    assert_eq!(Rc::strong_count(&value), 1);
  }

  #[test]
  fn absurd_capacity_reports_failure() {
    assert!(FixedVec::<u64>::try_with_capacity(usize::MAX / 2).is_err());
  }
}
