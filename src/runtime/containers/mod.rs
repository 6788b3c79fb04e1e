//! Container values referenced through [`crate::runtime::variant::Variant`].

mod ordered_set;
mod range;
mod set_tree;
mod tuple;
mod unordered_set;

pub use ordered_set::{Iter as OrderedSetIter, OrderedSet};
pub use range::{Range, RangeIter};
pub use tuple::Tuple;
pub use unordered_set::{UnorderedSet, calculate_next_prime};

#[cfg(test)]
mod ordered_set_test;
