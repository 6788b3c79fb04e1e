use std::cmp::Ordering;

use crate::runtime::{
    containers::{OrderedSet, Tuple},
    scalar::Complex,
    variant::Variant,
};

fn ints(values: impl IntoIterator<Item = i64>) -> OrderedSet {
    values.into_iter().map(Variant::Integer).collect()
}

fn assert_balanced(set: &OrderedSet) {
    for (min_depth, max_depth) in set.tree_depths() {
        assert!(
            min_depth * 2 >= max_depth || max_depth <= min_depth + 1,
            "unbalanced slot tree: min {} max {}",
            min_depth,
            max_depth
        );
    }
    assert_eq!(set.counted_len(), set.len());
}

#[test]
fn iteration_is_ascending_regardless_of_insertion_order() {
    let forward = ints([5, 1, 4, 2, 3]);
    let values: Vec<Variant> = forward.to_vec();
    assert_eq!(values, (1..=5).map(Variant::Integer).collect::<Vec<_>>());

    let reverse = ints([3, 2, 4, 1, 5]);
    assert_eq!(forward.relative_order(&reverse), Ordering::Equal);
}

#[test]
fn merged_iteration_spans_every_slot() {
    let set = ints((0..500).map(|i| (i * 7919) % 1000));
    assert!(set.slot_count() > 8);

    let mut iter = set.iter();
    assert_eq!(iter.len(), 500);
    let first = iter.next().cloned();
    assert_eq!(first, Some(Variant::Integer(0)));
    assert_eq!(iter.len(), 499);

    let values = set.to_vec();
    assert_eq!(values.len(), 500);
    for pair in values.windows(2) {
        assert_eq!(pair[0].cmp(&pair[1]), Ordering::Less);
    }
    assert_eq!((&set).into_iter().count(), 500);

    let mut larger = set.clone();
    larger.insert(Variant::Integer(5000));
    assert_eq!(set.relative_order(&larger), Ordering::Less);
}

#[test]
fn numerically_equal_values_collapse() {
    let mut set = OrderedSet::new();
    assert!(set.insert(Variant::Integer(2)));
    assert!(!set.insert(Variant::Real(2.0)));
    assert!(!set.insert(Variant::Complex(Complex::new(1.0, 1.0))));
    assert!(set.insert(Variant::Real(f64::NAN)));
    assert!(!set.insert(Variant::Complex(Complex::new(f64::NAN, 0.0))));
    assert_eq!(set.len(), 2);
    assert!(!set.contains(&Variant::Boolean(false)));
}

#[test]
fn mixed_tags_sort_by_tag_after_numbers() {
    let set: OrderedSet = vec![
        Variant::Tuple(Tuple::from("a")),
        Variant::Integer(7),
        Variant::None,
        Variant::Set(OrderedSet::new()),
        Variant::Real(-1.5),
    ]
    .into_iter()
    .collect();
    let tags: Vec<_> = set.iter().map(|v| v.value_type()).collect();
    let mut sorted = tags.clone();
    sorted.sort();
    assert_eq!(tags, sorted);
    assert_eq!(set.first(), Some(Variant::None));
}

#[test]
fn tree_depth_invariant_holds_through_growth_and_removal() {
    let mut set = OrderedSet::new();
    for value in 0..2_000 {
        set.insert(Variant::Integer((value * 7919) % 2_003));
        if value % 97 == 0 {
            assert_balanced(&set);
        }
    }
    assert!(set.slot_count() > 8);
    assert_balanced(&set);

    for value in (0..2_003).step_by(3) {
        set.remove(&Variant::Integer(value));
    }
    assert_balanced(&set);
    assert!(!set.contains(&Variant::Integer(0)));
}

#[test]
fn set_algebra_returns_new_sets() {
    let a = ints([1, 2, 3, 4]);
    let b = ints([3, 4, 5]);

    assert_eq!(a.union(&b).to_vec(), ints(1..=5).to_vec());
    assert_eq!(a.intersection(&b).to_vec(), ints([3, 4]).to_vec());
    assert_eq!(a.difference(&b).to_vec(), ints([1, 2]).to_vec());
    assert_eq!(a.len(), 4);
    assert_eq!(b.len(), 3);
}

#[test]
fn in_place_algebra_mutates_receiver_only() {
    let b = ints([3, 4, 5]);

    let mut united = ints([1, 2]);
    united.unite_with(&b);
    assert_eq!(united.len(), 5);

    let mut intersected = ints([1, 3, 5, 7]);
    intersected.intersect_with(&b);
    assert_eq!(intersected.to_vec(), ints([3, 5]).to_vec());

    let mut subtracted = ints([1, 3, 5, 7]);
    subtracted.subtract(&b);
    assert_eq!(subtracted.to_vec(), ints([1, 7]).to_vec());
    assert_eq!(b.len(), 3);
}

#[test]
fn clones_copy_on_write() {
    let original = ints([1, 2, 3]);
    let mut copy = original.clone();
    copy.insert(Variant::Integer(4));
    copy.remove(&Variant::Integer(1));
    assert_eq!(original.to_vec(), ints([1, 2, 3]).to_vec());
    assert_eq!(copy.to_vec(), ints([2, 3, 4]).to_vec());
}

#[test]
fn relative_order_is_lexicographic() {
    assert_eq!(ints([1, 2]).relative_order(&ints([1, 3])), Ordering::Less);
    assert_eq!(ints([1, 2]).relative_order(&ints([1, 2, 3])), Ordering::Less);
    assert_eq!(ints([4]).relative_order(&ints([1, 2, 3])), Ordering::Greater);
    assert_eq!(OrderedSet::new().relative_order(&OrderedSet::new()), Ordering::Equal);
}
