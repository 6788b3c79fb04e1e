use crate::runtime::{
    containers::{OrderedSet, Tuple},
    error::{RuntimeError, RuntimeResult},
    policy::raise,
    variant::Variant,
};

/// Lazy arithmetic sequence `first, second, ..` that stops at or before `last`.
///
/// The step is `second - first`. A range whose step points away from `last`
/// is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    first: i64,
    step: i64,
    last: i64,
}

impl Range {
    /// Builds `first, second, .., last`. A zero step, or one that does not
    /// fit in an `i64`, raises `InvalidParameterValue` and falls back to the
    /// empty range.
    pub fn new(first: i64, second: i64, last: i64) -> RuntimeResult<Self> {
        match second.checked_sub(first) {
            Some(0) => raise(
                RuntimeError::invalid_parameter("range step must be non-zero"),
                Range::empty(),
            ),
            Some(step) => Ok(Self { first, step, last }),
            None => raise(
                RuntimeError::invalid_parameter(format!(
                    "range step from {} to {} overflows",
                    first, second
                )),
                Range::empty(),
            ),
        }
    }

    /// Unit-step range `first..=last`.
    pub fn inclusive(first: i64, last: i64) -> Self {
        Self {
            first,
            step: 1,
            last,
        }
    }

    pub fn empty() -> Self {
        Self {
            first: 1,
            step: 1,
            last: 0,
        }
    }

    pub fn first(&self) -> i64 {
        self.first
    }

    pub fn second(&self) -> i64 {
        self.first.wrapping_add(self.step)
    }

    pub fn last(&self) -> i64 {
        self.last
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// Number of elements, in O(1).
    pub fn size(&self) -> usize {
        let span = self.last as i128 - self.first as i128;
        let step = self.step as i128;
        if span != 0 && span.signum() != step.signum() {
            return 0;
        }
        usize::try_from(span / step + 1).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Membership test, in O(1).
    pub fn contains(&self, value: i64) -> bool {
        if self.is_empty() {
            return false;
        }
        let offset = value as i128 - self.first as i128;
        let span = self.last as i128 - self.first as i128;
        let step = self.step as i128;
        let within = if step > 0 {
            offset >= 0 && offset <= span
        } else {
            offset <= 0 && offset >= span
        };
        within && offset % step == 0
    }

    /// Element at a 1-based index.
    pub fn at(&self, index: i64) -> RuntimeResult<i64> {
        let size = self.size();
        match usize::try_from(index) {
            Ok(position) if position >= 1 && position <= size => {
                let value = self.first as i128 + (position as i128 - 1) * self.step as i128;
                Ok(value as i64)
            }
            _ => raise(
                RuntimeError::invalid_parameter(format!(
                    "range index {} out of range 1..={}",
                    index, size
                )),
                0,
            ),
        }
    }

    /// The last element actually produced, which may differ from `last`.
    pub fn final_value(&self) -> Option<i64> {
        let size = self.size();
        (size > 0).then(|| (self.first as i128 + (size as i128 - 1) * self.step as i128) as i64)
    }

    pub fn iter(&self) -> RangeIter {
        RangeIter {
            next: self.first,
            step: self.step,
            remaining: self.size(),
        }
    }

    pub fn to_tuple(&self) -> Tuple {
        self.iter().map(Variant::Integer).collect()
    }

    pub fn to_set(&self) -> OrderedSet {
        self.iter().map(Variant::Integer).collect()
    }
}

impl IntoIterator for Range {
    type Item = i64;
    type IntoIter = RangeIter;

    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct RangeIter {
    next: i64,
    step: i64,
    remaining: usize,
}

impl Iterator for RangeIter {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.next;
        self.remaining -= 1;
        self.next = self.next.wrapping_add(self.step);
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for RangeIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_and_membership_follow_the_step() {
        let range = Range::new(1, 3, 10).unwrap();
        assert_eq!(range.size(), 5);
        assert!(range.contains(9));
        assert!(!range.contains(10));
        assert!(!range.contains(-1));
        assert_eq!(range.final_value(), Some(9));
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn descending_ranges() {
        let range = Range::new(10, 7, 0).unwrap();
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![10, 7, 4, 1]);
        assert!(range.contains(4));
        assert!(!range.contains(0));
        assert_eq!(range.at(2).unwrap(), 7);
    }

    #[test]
    fn step_away_from_last_is_empty() {
        let range = Range::new(5, 6, 1).unwrap();
        assert!(range.is_empty());
        assert_eq!(range.iter().count(), 0);
        assert!(!range.contains(5));
        assert_eq!(range.final_value(), None);
    }

    #[test]
    fn single_element_range() {
        let range = Range::inclusive(4, 4);
        assert_eq!(range.size(), 1);
        assert!(range.contains(4));
    }

    #[test]
    fn zero_step_is_rejected() {
        assert!(matches!(
            Range::new(3, 3, 9),
            Err(RuntimeError::InvalidParameterValue(_))
        ));
    }

    #[test]
    fn unrepresentable_step_is_rejected() {
        assert!(matches!(
            Range::new(i64::MIN, i64::MAX, 0),
            Err(RuntimeError::InvalidParameterValue(_))
        ));
        assert!(matches!(
            Range::new(i64::MAX, -2, i64::MIN),
            Err(RuntimeError::InvalidParameterValue(_))
        ));
        let widest = Range::new(i64::MIN, -1, i64::MAX).unwrap();
        assert_eq!(widest.step(), i64::MAX);
        assert_eq!(widest.second(), -1);
    }

    #[test]
    fn extreme_bounds_do_not_overflow() {
        let range = Range::inclusive(i64::MIN, i64::MAX);
        assert_eq!(range.size(), usize::MAX);
        assert!(range.contains(0));
        assert_eq!(range.at(1).unwrap(), i64::MIN);
    }

    #[test]
    fn conversions_keep_order() {
        let range = Range::new(3, 2, 1).unwrap();
        assert_eq!(range.to_tuple().len(), 3);
        let set = range.to_set();
        let values: Vec<_> = set.iter().cloned().collect();
        assert_eq!(
            values,
            vec![Variant::Integer(1), Variant::Integer(2), Variant::Integer(3)]
        );
    }
}
