//! Hash set without per-slot ordering.

use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
};

const INITIAL_BUCKETS: usize = 7;

/// Numerator/denominator of the maximum load factor (3/4).
const LOAD_NUMERATOR: usize = 3;
const LOAD_DENOMINATOR: usize = 4;

/// Smallest prime `>= n`. Returns 2 for `n <= 2`.
pub fn calculate_next_prime(n: usize) -> usize {
    if n <= 2 {
        return 2;
    }
    let mut candidate = if n % 2 == 0 { n + 1 } else { n };
    loop {
        if is_prime(candidate) {
            return candidate;
        }
        candidate += 2;
    }
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut divisor = 3;
    while divisor <= n / divisor {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// Chained hash set with a prime bucket count.
///
/// When an insertion would exceed the load factor the table grows to the
/// next prime at or above twice the current bucket count.
#[derive(Debug, Clone)]
pub struct UnorderedSet<T> {
    buckets: Vec<Vec<T>>,
    len: usize,
    hasher: RandomState,
}

impl<T: Hash + Eq> Default for UnorderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq> UnorderedSet<T> {
    pub fn new() -> Self {
        Self::with_buckets(INITIAL_BUCKETS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let needed = capacity * LOAD_DENOMINATOR / LOAD_NUMERATOR + 1;
        Self::with_buckets(calculate_next_prime(needed.max(INITIAL_BUCKETS)))
    }

    fn with_buckets(count: usize) -> Self {
        let mut buckets = Vec::with_capacity(count);
        buckets.resize_with(count, Vec::new);
        Self {
            buckets,
            len: 0,
            hasher: RandomState::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_of(&self, value: &T) -> usize {
        (self.hasher.hash_one(value) % self.buckets.len() as u64) as usize
    }

    pub fn contains(&self, value: &T) -> bool {
        self.buckets[self.bucket_of(value)].contains(value)
    }

    /// Returns `true` when the value was not already present.
    pub fn insert(&mut self, value: T) -> bool {
        if self.contains(&value) {
            return false;
        }
        if (self.len + 1) * LOAD_DENOMINATOR > self.buckets.len() * LOAD_NUMERATOR {
            self.resize(calculate_next_prime(self.buckets.len() * 2));
        }
        let bucket = self.bucket_of(&value);
        self.buckets[bucket].push(value);
        self.len += 1;
        true
    }

    pub fn remove(&mut self, value: &T) -> bool {
        let bucket = self.bucket_of(value);
        let chain = &mut self.buckets[bucket];
        match chain.iter().position(|entry| entry == value) {
            Some(index) => {
                chain.swap_remove(index);
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buckets.iter().flatten()
    }

    pub fn clear(&mut self) {
        for chain in &mut self.buckets {
            chain.clear();
        }
        self.len = 0;
    }

    fn resize(&mut self, count: usize) {
        let old = std::mem::take(&mut self.buckets);
        self.buckets.resize_with(count, Vec::new);
        for value in old.into_iter().flatten() {
            let bucket = self.bucket_of(&value);
            self.buckets[bucket].push(value);
        }
    }
}

impl<T: Hash + Eq> FromIterator<T> for UnorderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = UnorderedSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}
