//! AVL tree of variants, used as one slot of an [`super::OrderedSet`].

use std::cmp::Ordering;

use crate::runtime::variant::{Variant, implicit_ordering};

#[derive(Debug, Clone)]
struct Node {
    value: Variant,
    height: u8,
    left: Link,
    right: Link,
}

type Link = Option<Box<Node>>;

#[derive(Debug, Clone, Default)]
pub(crate) struct SetTree {
    root: Link,
    len: usize,
}

fn height(link: &Link) -> u8 {
    link.as_ref().map_or(0, |node| node.height)
}

impl Node {
    fn leaf(value: Variant) -> Box<Node> {
        Box::new(Node {
            value,
            height: 1,
            left: None,
            right: None,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance_factor(&self) -> i16 {
        height(&self.left) as i16 - height(&self.right) as i16
    }
}

fn rotate_right(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update_height();
    pivot.right = Some(node);
    pivot.update_height();
    pivot
}

fn rotate_left(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update_height();
    pivot.left = Some(node);
    pivot.update_height();
    pivot
}

fn rebalance(mut node: Box<Node>) -> Box<Node> {
    node.update_height();
    let balance = node.balance_factor();
    if balance > 1 {
        if node.left.as_ref().is_some_and(|left| left.balance_factor() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if node.right.as_ref().is_some_and(|right| right.balance_factor() > 0) {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }
    node
}

fn insert(link: Link, value: Variant, inserted: &mut bool) -> Box<Node> {
    let Some(mut node) = link else {
        *inserted = true;
        return Node::leaf(value);
    };
    match implicit_ordering(&value, &node.value) {
        Ordering::Less => node.left = Some(insert(node.left.take(), value, inserted)),
        Ordering::Greater => node.right = Some(insert(node.right.take(), value, inserted)),
        Ordering::Equal => return node,
    }
    rebalance(node)
}

fn take_min(mut node: Box<Node>) -> (Link, Variant) {
    match node.left.take() {
        None => (node.right.take(), node.value),
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

fn remove(link: Link, value: &Variant, removed: &mut bool) -> Link {
    let mut node = link?;
    match implicit_ordering(value, &node.value) {
        Ordering::Less => node.left = remove(node.left.take(), value, removed),
        Ordering::Greater => node.right = remove(node.right.take(), value, removed),
        Ordering::Equal => {
            *removed = true;
            match (node.left.take(), node.right.take()) {
                (None, None) => return None,
                (Some(child), None) | (None, Some(child)) => return Some(child),
                (Some(left), Some(right)) => {
                    let (rest, successor) = take_min(right);
                    node.value = successor;
                    node.left = Some(left);
                    node.right = rest;
                }
            }
        }
    }
    Some(rebalance(node))
}

fn min_depth(link: &Link) -> usize {
    match link {
        None => 0,
        Some(node) => 1 + min_depth(&node.left).min(min_depth(&node.right)),
    }
}

impl SetTree {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` when the value was not already present.
    pub(crate) fn insert(&mut self, value: Variant) -> bool {
        let mut inserted = false;
        self.root = Some(insert(self.root.take(), value, &mut inserted));
        if inserted {
            self.len += 1;
        }
        inserted
    }

    pub(crate) fn remove(&mut self, value: &Variant) -> bool {
        let mut removed = false;
        self.root = remove(self.root.take(), value, &mut removed);
        if removed {
            self.len -= 1;
        }
        removed
    }

    pub(crate) fn contains(&self, value: &Variant) -> bool {
        let mut cursor = &self.root;
        while let Some(node) = cursor {
            match implicit_ordering(value, &node.value) {
                Ordering::Less => cursor = &node.left,
                Ordering::Greater => cursor = &node.right,
                Ordering::Equal => return true,
            }
        }
        false
    }

    /// In-order traversal.
    pub(crate) fn iter(&self) -> TreeIter<'_> {
        let mut iter = TreeIter { stack: Vec::new() };
        iter.push_left(&self.root);
        iter
    }

    /// Shortest and longest root-to-leaf path lengths, counted in nodes.
    pub(crate) fn depths(&self) -> (usize, usize) {
        (min_depth(&self.root), height(&self.root) as usize)
    }

    pub(crate) fn into_values(self) -> Vec<Variant> {
        fn drain(link: Link, out: &mut Vec<Variant>) {
            if let Some(node) = link {
                let node = *node;
                drain(node.left, out);
                out.push(node.value);
                drain(node.right, out);
            }
        }
        let mut out = Vec::with_capacity(self.len);
        drain(self.root, &mut out);
        out
    }
}

pub(crate) struct TreeIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> TreeIter<'a> {
    fn push_left(&mut self, mut link: &'a Link) {
        while let Some(node) = link {
            self.stack.push(node);
            link = &node.left;
        }
    }
}

impl<'a> Iterator for TreeIter<'a> {
    type Item = &'a Variant;

    fn next(&mut self) -> Option<&'a Variant> {
        let node = self.stack.pop()?;
        self.push_left(&node.right);
        Some(&node.value)
    }
}
