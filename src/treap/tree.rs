use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::treap::node::{Node, NodeId, NodeRef, Side};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::ptr;

/// Result of walking the search path of a key.
pub enum Search<T, U> {
    Empty,
    Found(*mut Node<T, U>),
    Vacant(*mut Node<T, U>, Side),
}

pub fn compare<T: PartialOrd>(a: &T, b: &T) -> Result<Ordering> {
    a.partial_cmp(b).ok_or(Error::InvalidKey)
}

/// A key that is not equal to itself (e.g. NaN) has no place in the ordering.
pub fn check_key<T: PartialOrd>(key: &T) -> Result<()> {
    match key.partial_cmp(key) {
        Some(Ordering::Equal) => Ok(()),
        _ => Err(Error::InvalidKey),
    }
}

unsafe fn size_of<T, U>(node: *const Node<T, U>) -> usize {
    if node.is_null() {
        0
    } else {
        (*node).size
    }
}

unsafe fn update<T, U>(node: *mut Node<T, U>) {
    (*node).size = 1 + size_of((*node).left) + size_of((*node).right);
}

unsafe fn side_of<T, U>(node: *mut Node<T, U>) -> Option<(*mut Node<T, U>, Side)> {
    let parent = (*node).parent;
    if parent.is_null() {
        None
    } else if (*parent).left == node {
        Some((parent, Side::Left))
    } else {
        Some((parent, Side::Right))
    }
}

/// Returns the 1-based ascending rank of `node` by walking its parent links to the root.
pub fn rank<T, U>(node: &Node<T, U>) -> usize {
    unsafe {
        let mut rank = size_of(node.left) + 1;
        let mut current = node as *const Node<T, U>;
        while !(*current).parent.is_null() {
            let parent = (*current).parent as *const Node<T, U>;
            if (*parent).right as *const Node<T, U> == current {
                rank += size_of((*parent).left) + 1;
            }
            current = parent;
        }
        rank
    }
}

/// Nodes of a treap, linked by owning child pointers and non-owning parent pointers.
///
/// Every node reachable from `root` is owned by the tree and freed when the tree is dropped.
/// Split and merge hand subtrees between trees by relinking their roots, so no node is ever
/// copied.
pub struct Tree<T, U> {
    pub root: *mut Node<T, U>,
    marker: PhantomData<Box<Node<T, U>>>,
}

impl<T, U> Tree<T, U> {
    pub fn new() -> Self {
        Self::from_root(ptr::null_mut())
    }

    /// Takes ownership of a detached subtree.
    pub fn from_root(root: *mut Node<T, U>) -> Self {
        Tree {
            root,
            marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        unsafe { size_of(self.root) }
    }

    pub fn node_ref(&self, node: *mut Node<T, U>) -> NodeRef<T, U> {
        NodeRef::new(node)
    }

    pub fn entry_mut(&mut self, node: *mut Node<T, U>) -> &mut Entry<T, U> {
        unsafe {
            (*node)
                .entry
                .as_mut()
                .expect("Expected a node with an entry.")
        }
    }

    /// Returns the node behind `id` if it is a live, non-pivot node of this tree.
    pub fn resolve(&self, id: &NodeId<T, U>) -> Option<*mut Node<T, U>> {
        let node = id.resolve()?;
        unsafe {
            if (*node).entry.is_none() {
                return None;
            }
            let mut top = node;
            while !(*top).parent.is_null() {
                top = (*top).parent;
            }
            if top == self.root {
                Some(node)
            } else {
                None
            }
        }
    }

    fn resize_ancestors(&mut self, from: *mut Node<T, U>, grow: bool) {
        let mut current = from;
        while !current.is_null() {
            unsafe {
                if grow {
                    (*current).size += 1;
                } else {
                    (*current).size -= 1;
                }
                current = (*current).parent;
            }
        }
    }

    /// Links a detached leaf under `location`, or makes it the root of an empty tree, and counts it
    /// in the size of every ancestor.
    pub fn attach(&mut self, node: *mut Node<T, U>, location: Option<(*mut Node<T, U>, Side)>) {
        match location {
            Some((parent, side)) => {
                unsafe {
                    (*parent).set_child(side, node);
                    (*node).parent = parent;
                }
                self.resize_ancestors(parent, true);
            },
            None => self.root = node,
        }
    }

    /// Makes `pivot` the root with `left` and `right` as its subtrees. The subtrees must be
    /// detached roots.
    pub fn join(&mut self, pivot: *mut Node<T, U>, left: *mut Node<T, U>, right: *mut Node<T, U>) {
        unsafe {
            (*pivot).left = left;
            (*pivot).right = right;
            for &child in &[left, right] {
                if !child.is_null() {
                    (*child).parent = pivot;
                }
            }
            (*pivot).parent = ptr::null_mut();
            update(pivot);
        }
        self.root = pivot;
    }

    /// Frees the keyless pivot at the root and returns its subtrees as detached roots, leaving the
    /// tree empty.
    pub fn release_root(&mut self) -> (*mut Node<T, U>, *mut Node<T, U>) {
        debug_assert!(!self.root.is_null());
        let pivot = unsafe { Node::free(self.root) };
        debug_assert!(pivot.entry.is_none());
        self.root = ptr::null_mut();
        for &child in &[pivot.left, pivot.right] {
            if !child.is_null() {
                unsafe { (*child).parent = ptr::null_mut() };
            }
        }
        (pivot.left, pivot.right)
    }

    /// Swaps `pivot` with its parent while preserving the in-order sequence. Only the sizes of the
    /// two rotated nodes change.
    pub fn rotate(&mut self, pivot: *mut Node<T, U>) {
        unsafe {
            let (parent, side) = match side_of(pivot) {
                Some(location) => location,
                None => return,
            };
            let grandparent = side_of(parent);

            let inner = (*pivot).child(side.flip());
            (*parent).set_child(side, inner);
            if !inner.is_null() {
                (*inner).parent = parent;
            }
            (*pivot).set_child(side.flip(), parent);
            (*parent).parent = pivot;

            match grandparent {
                Some((node, side)) => {
                    (*node).set_child(side, pivot);
                    (*pivot).parent = node;
                },
                None => {
                    (*pivot).parent = ptr::null_mut();
                    self.root = pivot;
                },
            }

            update(parent);
            update(pivot);
        }
    }

    /// Rotates `node` up until the heap property holds for it.
    pub fn sift_up(&mut self, node: *mut Node<T, U>) {
        unsafe {
            while let Some((parent, _)) = side_of(node) {
                if (*node).priority >= (*parent).priority {
                    break;
                }
                self.rotate(node);
            }
        }
    }

    /// Rotates `node` up to the root regardless of priorities.
    pub fn rotate_to_root(&mut self, node: *mut Node<T, U>) {
        while unsafe { !(*node).parent.is_null() } {
            self.rotate(node);
        }
    }

    /// Rotates `node` down to a leaf, always lifting the child with the lower priority, then
    /// unlinks and frees it.
    pub fn unlink(&mut self, node: *mut Node<T, U>) -> Node<T, U> {
        unsafe {
            loop {
                let (left, right) = ((*node).left, (*node).right);
                let child = match (left.is_null(), right.is_null()) {
                    (true, true) => break,
                    (false, true) => left,
                    (true, false) => right,
                    (false, false) => {
                        if (*left).priority > (*right).priority {
                            right
                        } else {
                            left
                        }
                    },
                };
                self.rotate(child);
            }

            match side_of(node) {
                Some((parent, side)) => {
                    (*parent).set_child(side, ptr::null_mut());
                    self.resize_ancestors(parent, false);
                },
                None => self.root = ptr::null_mut(),
            }
            Node::free(node)
        }
    }

    /// Returns the node with the 1-based ascending `rank`.
    pub fn select(&self, rank: usize) -> Option<*mut Node<T, U>> {
        if rank < 1 || rank > self.len() {
            return None;
        }
        let mut rank = rank;
        let mut current = self.root;
        unsafe {
            while !current.is_null() {
                let left_size = size_of((*current).left);
                match rank.cmp(&(left_size + 1)) {
                    Ordering::Equal => return Some(current),
                    Ordering::Less => current = (*current).left,
                    Ordering::Greater => {
                        rank -= left_size + 1;
                        current = (*current).right;
                    },
                }
            }
        }
        None
    }
}

impl<T: PartialOrd, U> Tree<T, U> {
    /// Walks from the root towards `key`, returning the matching node or the last node visited
    /// together with the side `key` would attach on.
    pub fn locate(&self, key: &T) -> Result<Search<T, U>> {
        if self.root.is_null() {
            return Ok(Search::Empty);
        }
        let mut current = self.root;
        loop {
            let node = unsafe { &*current };
            let side = match compare(key, node.key())? {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return Ok(Search::Found(current)),
            };
            let next = node.child(side);
            if next.is_null() {
                return Ok(Search::Vacant(current, side));
            }
            current = next;
        }
    }

    /// Returns where a key just below `key` would attach: every node with a key `>= key` is passed
    /// on the left, so the location never coincides with an existing key.
    pub fn locate_split(&self, key: &T) -> Result<Option<(*mut Node<T, U>, Side)>> {
        let mut location = None;
        let mut current = self.root;
        while !current.is_null() {
            let node = unsafe { &*current };
            let side = match compare(key, node.key())? {
                Ordering::Greater => Side::Right,
                Ordering::Less | Ordering::Equal => Side::Left,
            };
            location = Some((current, side));
            current = node.child(side);
        }
        Ok(location)
    }

    /// Pushes every node of the subtree rooted at `node` with `lo <= key <= hi` onto `found` in
    /// ascending order, skipping subtrees that cannot intersect the range.
    pub fn collect_range(
        &self,
        node: *mut Node<T, U>,
        lo: &T,
        hi: &T,
        found: &mut Vec<*mut Node<T, U>>,
    ) -> Result<()> {
        if node.is_null() {
            return Ok(());
        }
        let (left, right, key) = unsafe { ((*node).left, (*node).right, (*node).key()) };
        if compare(key, lo)? == Ordering::Less {
            return self.collect_range(right, lo, hi, found);
        }
        if compare(key, hi)? == Ordering::Greater {
            return self.collect_range(left, lo, hi, found);
        }
        self.collect_range(left, lo, hi, found)?;
        found.push(node);
        self.collect_range(right, lo, hi, found)
    }
}

impl<T, U> Drop for Tree<T, U> {
    fn drop(&mut self) {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if node.is_null() {
                continue;
            }
            let node = unsafe { Node::free(node) };
            stack.push(node.left);
            stack.push(node.right);
        }
    }
}

#[cfg(test)]
impl<T: PartialOrd + ::std::fmt::Debug, U> Tree<T, U> {
    /// Asserts ordering, heap, size and parent-link invariants over the whole tree.
    pub fn assert_invariants(&self) {
        if !self.root.is_null() {
            assert!(unsafe { (*self.root).parent.is_null() });
            let size = self.check_subtree(self.root, None, None);
            assert_eq!(size, self.len());
        }
    }

    fn check_subtree(&self, node: *mut Node<T, U>, lower: Option<&T>, upper: Option<&T>) -> usize {
        let node_ref = unsafe { &*node };
        let key = node_ref.key();
        if let Some(lower) = lower {
            assert!(lower < key, "{:?} is not above {:?}", key, lower);
        }
        if let Some(upper) = upper {
            assert!(key < upper, "{:?} is not below {:?}", key, upper);
        }

        let mut size = 1;
        for &(child, side) in &[(node_ref.left, Side::Left), (node_ref.right, Side::Right)] {
            if child.is_null() {
                continue;
            }
            let child_ref = unsafe { &*child };
            assert_eq!(child_ref.parent, node);
            assert!(node_ref.priority <= child_ref.priority);
            size += match side {
                Side::Left => self.check_subtree(child, lower, Some(key)),
                Side::Right => self.check_subtree(child, Some(key), upper),
            };
        }
        assert_eq!(node_ref.size, size);
        size
    }
}
