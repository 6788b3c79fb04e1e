//! Ordered set of variants: a hash table whose slots are AVL trees.
//!
//! Each slot tree is keyed by the cross-type total order, so slot-level
//! lookups stay logarithmic even when many values collide on one hash. The
//! hash seed is drawn at construction and re-drawn on every rehash.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, hash_map::RandomState},
    hash::{BuildHasher, Hash, Hasher},
    sync::Arc,
};

use super::set_tree::{SetTree, TreeIter};
use crate::runtime::variant::{Variant, implicit_ordering};

const INITIAL_SLOTS: usize = 8;
const MAX_LOAD: usize = 4;

#[derive(Debug, Clone)]
struct SetBody {
    slots: Vec<SetTree>,
    len: usize,
    seed: u64,
}

/// Insertion-order-independent set of unique variants.
///
/// Cloning is O(1); mutation copies the body if it is shared.
#[derive(Debug, Clone)]
pub struct OrderedSet {
    body: Arc<SetBody>,
}

fn fresh_seed() -> u64 {
    RandomState::new().hash_one(0x9e37_79b9_7f4a_7c15u64)
}

/// splitmix64 finalizer.
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

impl SetBody {
    fn with_slots(slot_count: usize) -> Self {
        Self {
            slots: vec![SetTree::default(); slot_count],
            len: 0,
            seed: fresh_seed(),
        }
    }

    fn slot_of(&self, value: &Variant) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        value.hash(&mut hasher);
        (mix(hasher.finish() ^ self.seed) % self.slots.len() as u64) as usize
    }

    fn insert(&mut self, value: Variant) -> bool {
        if self.len + 1 > self.slots.len() * MAX_LOAD {
            self.rehash(self.slots.len() * 2);
        }
        let slot = self.slot_of(&value);
        let inserted = self.slots[slot].insert(value);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    fn remove(&mut self, value: &Variant) -> bool {
        let slot = self.slot_of(value);
        let removed = self.slots[slot].remove(value);
        if removed {
            self.len -= 1;
        }
        removed
    }

    fn contains(&self, value: &Variant) -> bool {
        self.slots[self.slot_of(value)].contains(value)
    }

    fn rehash(&mut self, slot_count: usize) {
        let old = std::mem::take(&mut self.slots);
        self.slots = vec![SetTree::default(); slot_count];
        self.seed = fresh_seed();
        for tree in old {
            for value in tree.into_values() {
                let slot = self.slot_of(&value);
                self.slots[slot].insert(value);
            }
        }
    }
}

impl Default for OrderedSet {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderedSet {
    pub fn new() -> Self {
        Self {
            body: Arc::new(SetBody::with_slots(INITIAL_SLOTS)),
        }
    }

    pub fn len(&self) -> usize {
        self.body.len
    }

    pub fn is_empty(&self) -> bool {
        self.body.len == 0
    }

    /// Returns `true` when the value was not already present.
    pub fn insert(&mut self, value: Variant) -> bool {
        if self.contains(&value) {
            return false;
        }
        Arc::make_mut(&mut self.body).insert(value)
    }

    pub fn remove(&mut self, value: &Variant) -> bool {
        if !self.contains(value) {
            return false;
        }
        Arc::make_mut(&mut self.body).remove(value)
    }

    pub fn contains(&self, value: &Variant) -> bool {
        self.body.contains(value)
    }

    /// Elements in ascending order, merged lazily from the slot trees.
    pub fn iter(&self) -> Iter<'_> {
        let heads = self
            .body
            .slots
            .iter()
            .filter_map(|tree| {
                let mut rest = tree.iter();
                rest.next().map(|value| Head { value, rest })
            })
            .collect();
        Iter {
            heads,
            remaining: self.body.len,
        }
    }

    pub fn to_vec(&self) -> Vec<Variant> {
        self.iter().cloned().collect()
    }

    pub fn first(&self) -> Option<Variant> {
        self.body
            .slots
            .iter()
            .filter_map(|tree| tree.iter().next())
            .min_by(|a, b| implicit_ordering(a, b))
            .cloned()
    }

    pub fn union(&self, other: &OrderedSet) -> OrderedSet {
        let (mut result, smaller) = if self.len() >= other.len() {
            (self.clone(), other)
        } else {
            (other.clone(), self)
        };
        result.unite_with(smaller);
        result
    }

    pub fn intersection(&self, other: &OrderedSet) -> OrderedSet {
        let (smaller, larger) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        smaller
            .iter()
            .filter(|value| larger.contains(value))
            .cloned()
            .collect()
    }

    pub fn difference(&self, other: &OrderedSet) -> OrderedSet {
        self.iter()
            .filter(|value| !other.contains(value))
            .cloned()
            .collect()
    }

    pub fn unite_with(&mut self, other: &OrderedSet) {
        for value in other.iter() {
            self.insert(value.clone());
        }
    }

    pub fn intersect_with(&mut self, other: &OrderedSet) {
        let doomed: Vec<Variant> = self
            .iter()
            .filter(|value| !other.contains(value))
            .cloned()
            .collect();
        for value in &doomed {
            self.remove(value);
        }
    }

    pub fn subtract(&mut self, other: &OrderedSet) {
        for value in other.iter() {
            self.remove(value);
        }
    }

    /// Lexicographic order over the ascending sequences, smaller set first on
    /// a common prefix.
    pub fn relative_order(&self, other: &OrderedSet) -> Ordering {
        if Arc::ptr_eq(&self.body, &other.body) {
            return Ordering::Equal;
        }
        for (left, right) in self.iter().zip(other.iter()) {
            let ordering = implicit_ordering(left, right);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.len().cmp(&other.len())
    }

    /// `(min_depth, max_depth)` of every non-empty slot tree.
    pub fn tree_depths(&self) -> Vec<(usize, usize)> {
        self.body
            .slots
            .iter()
            .filter(|tree| !tree.is_empty())
            .map(SetTree::depths)
            .collect()
    }

    pub fn slot_count(&self) -> usize {
        self.body.slots.len()
    }

    /// Sum of the slot tree sizes. Always equal to [`Self::len`].
    pub fn counted_len(&self) -> usize {
        self.body.slots.iter().map(SetTree::len).sum()
    }
}

/// Smallest unconsumed value of one slot tree.
struct Head<'a> {
    value: &'a Variant,
    rest: TreeIter<'a>,
}

impl PartialEq for Head<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head<'_> {}

impl PartialOrd for Head<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reversed so that the max-heap yields the smallest value first.
impl Ord for Head<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        implicit_ordering(other.value, self.value)
    }
}

/// Ascending iterator over an [`OrderedSet`].
pub struct Iter<'a> {
    heads: BinaryHeap<Head<'a>>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Variant;

    fn next(&mut self) -> Option<&'a Variant> {
        let mut head = self.heads.pop()?;
        let value = head.value;
        if let Some(next) = head.rest.next() {
            head.value = next;
            self.heads.push(head);
        }
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a OrderedSet {
    type Item = &'a Variant;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl FromIterator<Variant> for OrderedSet {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        let mut set = OrderedSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl Extend<Variant> for OrderedSet {
    fn extend<I: IntoIterator<Item = Variant>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}
