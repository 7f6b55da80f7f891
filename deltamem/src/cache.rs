//! Fixed-capacity least-recently-used cache of source blocks.

mod recency;

use std::fmt;
use std::mem::size_of;

use metrics::Counter;

use self::recency::Recency;
use crate::fixedvec::FixedVec;
use crate::AllocError;

metric! {
  #[name = "deltamem.cache.hits"]
  static HITS: Counter = Counter::new();

  #[name = "deltamem.cache.misses"]
  static MISSES: Counter = Counter::new();

  #[name = "deltamem.cache.evictions"]
  static EVICTIONS: Counter = Counter::new();
}

/// Identity of the block currently held by a slot.
#[derive(Copy, Clone, Debug)]
struct Slot {
  id: u64,
  size: usize,
}

/// A view of one cached block.
///
/// The entry borrows the cache, so it cannot outlive the next call that
/// modifies it.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Entry<'a> {
  id: u64,
  data: &'a [u8],
}

impl<'a> Entry<'a> {
  #[inline]
  pub fn id(&self) -> u64 {
    self.id
  }

  #[inline]
  pub fn data(&self) -> &'a [u8] {
    self.data
  }

  #[inline]
  pub fn size(&self) -> usize {
    self.data.len()
  }
}

impl AsRef<[u8]> for Entry<'_> {
  fn as_ref(&self) -> &[u8] {
    self.data
  }
}

impl fmt::Debug for Entry<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Entry")
      .field("id", &self.id)
      .field("size", &self.size())
      .finish()
  }
}

/// A cache holding at most `capacity` blocks of at most `block_size` bytes
/// each, evicting the least recently used block when full.
///
/// Blocks are kept in two independent orders. An index of slots sorted by
/// block id gives `O(log n)` lookup and `O(1)` access to the lowest and
/// highest resident ids. A usage list decides which block is replaced next.
/// All storage is allocated by [`BlockCache::new`]; afterwards a slot's
/// storage region is only ever reassigned to a different block id.
///
/// ```
/// use deltamem::BlockCache;
///
/// let mut cache = BlockCache::new(3, 8).unwrap();
/// cache.put(0, b"AAAAAAAA");
/// cache.put(1, b"BBBBBBBB");
/// cache.put(2, b"CCCCCCCC");
///
/// // Touching block 0 makes block 1 the least recently used.
/// assert!(cache.get(0).is_some());
/// cache.put(3, b"DDDDDDDD");
///
/// assert!(cache.get(1).is_none());
/// assert_eq!(cache.ids().collect::<Vec<_>>(), [0, 2, 3]);
/// assert_eq!(cache.first().unwrap().id(), 0);
/// assert_eq!(cache.last().unwrap().id(), 3);
/// ```
pub struct BlockCache {
  arena: Box<[u8]>,
  block_size: usize,
  /// Slot `i` owns `arena[i * block_size..(i + 1) * block_size]`.
  slots: FixedVec<Slot>,
  /// Indices into `slots`, sorted by block id.
  order: FixedVec<usize>,
  recency: Recency,
}

impl BlockCache {
  /// Allocate a cache for `blocks` blocks of `block_size` bytes.
  ///
  /// Every allocation the cache will ever make happens here. If any of them
  /// fail then nothing is kept.
  ///
  /// # Panics
  /// Panics if `blocks` or `block_size` is zero.
  pub fn new(blocks: usize, block_size: usize) -> Result<Self, AllocError> {
    assert_ne!(blocks, 0, "a block cache must hold at least one block");
    assert_ne!(block_size, 0, "cache blocks must not be empty");

    let len = blocks.saturating_mul(block_size);
    let mut arena = Vec::new();
    arena
      .try_reserve_exact(len)
      .map_err(|e| AllocError::new(len, e))?;
    arena.resize(len, 0);

    let slots = FixedVec::try_with_capacity(blocks)
      .map_err(|e| AllocError::new(blocks.saturating_mul(size_of::<Slot>()), e))?;
    let order = FixedVec::try_with_capacity(blocks)
      .map_err(|e| AllocError::new(blocks.saturating_mul(size_of::<usize>()), e))?;
    let recency = Recency::try_with_capacity(blocks)
      .map_err(|e| AllocError::new(blocks.saturating_mul(2 * size_of::<usize>()), e))?;

    Ok(Self {
      arena: arena.into_boxed_slice(),
      block_size,
      slots,
      order,
      recency,
    })
  }

  /// The maximum number of blocks the cache can hold.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.order.capacity()
  }

  /// The number of blocks currently resident.
  #[inline]
  pub fn len(&self) -> usize {
    self.order.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  /// The maximum size of a single block.
  #[inline]
  pub fn block_size(&self) -> usize {
    self.block_size
  }

  /// Look up a block, marking it as the most recently used on a hit.
  pub fn get(&mut self, id: u64) -> Option<Entry<'_>> {
    match self.find(id) {
      Ok(pos) => {
        HITS.increment();

        let slot = self.order[pos];
        self.recency.promote(slot);
        Some(self.entry(slot))
      }
      Err(_) => {
        MISSES.increment();
        None
      }
    }
  }

  /// Look up a block without changing its position in the usage order.
  pub fn peek(&self, id: u64) -> Option<Entry<'_>> {
    self.find(id).ok().map(|pos| self.entry(self.order[pos]))
  }

  pub fn contains(&self, id: u64) -> bool {
    self.find(id).is_ok()
  }

  /// Store `data` as block `id` and mark it as the most recently used.
  ///
  /// An existing block with the same id is overwritten in place. Otherwise,
  /// if the cache is full, the least recently used block is evicted and its
  /// storage reused.
  ///
  /// # Panics
  /// Panics if `data` is longer than the cache's block size.
  pub fn put(&mut self, id: u64, data: &[u8]) -> Entry<'_> {
    assert!(
      data.len() <= self.block_size,
      "block {} is {} bytes but the cache block size is {}",
      id,
      data.len(),
      self.block_size
    );

    let slot = match self.find(id) {
      Ok(pos) => {
        let slot = self.order[pos];
        self.recency.promote(slot);
        slot
      }
      Err(pos) if self.order.available() > 0 => self.insert_unused(pos),
      Err(pos) => self.evict_into(pos),
    };

    self.slots[slot] = Slot {
      id,
      size: data.len(),
    };

    let start = slot * self.block_size;
    self.arena[start..start + data.len()].copy_from_slice(data);

    self.entry(slot)
  }

  /// The resident block with the lowest id. Does not affect usage order.
  pub fn first(&self) -> Option<Entry<'_>> {
    self.order.first().map(|&slot| self.entry(slot))
  }

  /// The resident block with the highest id. Does not affect usage order.
  pub fn last(&self) -> Option<Entry<'_>> {
    self.order.last().map(|&slot| self.entry(slot))
  }

  /// Resident block ids in ascending order.
  pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
    self.order.iter().map(move |&slot| self.slots[slot].id)
  }

  /// Resident block ids from most to least recently used.
  pub fn recency(&self) -> impl Iterator<Item = u64> + '_ {
    self.recency.iter().map(move |slot| self.slots[slot].id)
  }

  fn find(&self, id: u64) -> Result<usize, usize> {
    let slots = &self.slots;
    self.order.binary_search_by_key(&id, |&slot| slots[slot].id)
  }

  fn entry(&self, slot: usize) -> Entry<'_> {
    let Slot { id, size } = self.slots[slot];
    let start = slot * self.block_size;

    Entry {
      id,
      data: &self.arena[start..start + size],
    }
  }

  /// Claim the next never-used slot and index it at `pos`.
  fn insert_unused(&mut self, pos: usize) -> usize {
    let slot = self.recency.push_front();
    debug_assert_eq!(slot, self.slots.len());

    if self.slots.push(Slot { id: 0, size: 0 }).is_err() {
      unreachable!("slot records are sized to the recency list");
    }
    self.order.insert(pos, slot);

    slot
  }

  /// Reassign the least recently used slot so that it is indexed at `pos`.
  ///
  /// `pos` is the insertion point computed while the victim is still indexed.
  fn evict_into(&mut self, pos: usize) -> usize {
    let victim = match self.recency.tail() {
      Some(victim) => victim,
      None => unreachable!("a full cache has a least recently used slot"),
    };
    let victim_id = self.slots[victim].id;
    let victim_pos = match self.find(victim_id) {
      Ok(victim_pos) => victim_pos,
      Err(_) => unreachable!("block {} is tracked but not indexed", victim_id),
    };

    trace!("Evicting block {} from slot {}", victim_id, victim);
    EVICTIONS.increment();

    let target = if victim_pos < pos { pos - 1 } else { pos };
    self.order.relocate(victim_pos, target);
    self.recency.promote(victim);

    victim
  }
}

impl fmt::Debug for BlockCache {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BlockCache")
      .field("capacity", &self.capacity())
      .field("block_size", &self.block_size)
      .field("len", &self.len())
      .field("ids", &self.ids().collect::<Vec<_>>())
      .finish()
  }
}
