use std::collections::TryReserveError;

use crate::fixedvec::FixedVec;

const NIL: usize = usize::MAX;

#[derive(Copy, Clone, Debug)]
struct Link {
  prev: usize,
  next: usize,
}

/// Doubly-linked usage list over slot indices.
///
/// Links are stored in a parallel array indexed by slot, with `NIL` marking
/// the ends of the list. The head is the most recently used slot and the
/// tail is the next one to be evicted.
pub(super) struct Recency {
  links: FixedVec<Link>,
  head: usize,
  tail: usize,
}

impl Recency {
  pub fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
    Ok(Self {
      links: FixedVec::try_with_capacity(capacity)?,
      head: NIL,
      tail: NIL,
    })
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.links.len()
  }

  pub fn head(&self) -> Option<usize> {
    match self.head {
      NIL => None,
      head => Some(head),
    }
  }

  pub fn tail(&self) -> Option<usize> {
    match self.tail {
      NIL => None,
      tail => Some(tail),
    }
  }

  /// Start tracking the next unused slot, placing it at the head of the list.
  ///
  /// Returns the index of the newly tracked slot.
  ///
  /// # Panics
  /// Panics if every slot is already tracked.
  pub fn push_front(&mut self) -> usize {
    let slot = self.links.len();
    let link = Link {
      prev: NIL,
      next: self.head,
    };

    if self.links.push(link).is_err() {
      panic!("recency list is already tracking {} slots", slot);
    }

    self.attach_head(slot);
    slot
  }

  /// Move `slot` to the head of the list.
  pub fn promote(&mut self, slot: usize) {
    if self.head == slot {
      return;
    }

    self.unlink(slot);
    self.links[slot] = Link {
      prev: NIL,
      next: self.head,
    };
    self.attach_head(slot);
  }

  /// Iterate over the tracked slots from most to least recently used.
  pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
    std::iter::successors(self.head(), move |&slot| match self.links[slot].next {
      NIL => None,
      next => Some(next),
    })
  }

  fn attach_head(&mut self, slot: usize) {
    match self.head {
      NIL => self.tail = slot,
      head => self.links[head].prev = slot,
    }

    self.head = slot;
  }

  fn unlink(&mut self, slot: usize) {
    let Link { prev, next } = self.links[slot];

    match prev {
      NIL => self.head = next,
      prev => self.links[prev].next = next,
    }
    match next {
      NIL => self.tail = prev,
      next => self.links[next].prev = prev,
    }
  }
}
