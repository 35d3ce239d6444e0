use crate::entry::Entry;
use crate::treap::tree;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn flip(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// A struct representing an internal node of a treap.
///
/// Nodes are heap allocated and owned by the tree that links them: `left` and `right` own their
/// subtrees, `parent` is a non-owning back pointer. A null pointer stands for an absent link.
/// `entry` is `None` only for the transient pivot that split and merge rotate through the tree.
pub struct Node<T, U> {
    pub entry: Option<Entry<T, U>>,
    pub priority: f64,
    pub size: usize,
    pub left: *mut Node<T, U>,
    pub right: *mut Node<T, U>,
    pub parent: *mut Node<T, U>,
    // Dropped together with the node, which invalidates every `NodeId` of it.
    anchor: Rc<()>,
}

impl<T, U> Node<T, U> {
    fn allocate(entry: Option<Entry<T, U>>, priority: f64) -> *mut Self {
        Box::into_raw(Box::new(Node {
            entry,
            priority,
            size: 1,
            left: ptr::null_mut(),
            right: ptr::null_mut(),
            parent: ptr::null_mut(),
            anchor: Rc::new(()),
        }))
    }

    pub fn new(key: T, data: Option<U>, priority: f64) -> *mut Self {
        Self::allocate(Some(Entry { key, data }), priority)
    }

    pub fn pivot(priority: f64) -> *mut Self {
        Self::allocate(None, priority)
    }

    /// Takes back ownership of a node allocated by `new` or `pivot`. The node must be unlinked.
    pub unsafe fn free(node: *mut Self) -> Self {
        *Box::from_raw(node)
    }

    pub fn child(&self, side: Side) -> *mut Self {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set_child(&mut self, side: Side, child: *mut Self) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }

    pub fn key(&self) -> &T {
        &self
            .entry
            .as_ref()
            .expect("Expected a node with an entry.")
            .key
    }
}

/// A handle to a node of a `Treap<T, U>`.
///
/// A handle stays valid while its node is in some treap, including after the node moves to
/// another treap through a split or merge. A treap only accepts handles of its own nodes, so a
/// handle to a removed node or to a node of another treap is rejected.
pub struct NodeId<T, U> {
    node: *mut Node<T, U>,
    anchor: Weak<()>,
}

impl<T, U> NodeId<T, U> {
    /// `node` must point to a live node.
    pub(crate) fn new(node: *mut Node<T, U>) -> Self {
        NodeId {
            node,
            anchor: Rc::downgrade(unsafe { &(*node).anchor }),
        }
    }

    /// Returns the node if it has not been freed.
    pub(crate) fn resolve(&self) -> Option<*mut Node<T, U>> {
        self.anchor.upgrade().map(|_| self.node)
    }
}

impl<T, U> Clone for NodeId<T, U> {
    fn clone(&self) -> Self {
        NodeId {
            node: self.node,
            anchor: self.anchor.clone(),
        }
    }
}

impl<T, U> PartialEq for NodeId<T, U> {
    fn eq(&self, other: &NodeId<T, U>) -> bool {
        Weak::ptr_eq(&self.anchor, &other.anchor)
    }
}

impl<T, U> Eq for NodeId<T, U> {}

impl<T, U> fmt::Debug for NodeId<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("NodeId").field(&self.node).finish()
    }
}

/// A read-only view of a node of a `Treap<T, U>`.
///
/// The view exposes the key and payload of the node. Priorities, subtree sizes and child links are
/// private to the treap.
pub struct NodeRef<'a, T, U> {
    node: *mut Node<T, U>,
    marker: PhantomData<&'a Node<T, U>>,
}

impl<'a, T, U> NodeRef<'a, T, U> {
    /// `node` must stay alive and unmodified for `'a`.
    pub(crate) fn new(node: *mut Node<T, U>) -> Self {
        NodeRef {
            node,
            marker: PhantomData,
        }
    }

    fn node(&self) -> &'a Node<T, U> {
        unsafe { &*self.node }
    }

    /// Returns the handle of the node. The handle can be passed to `Treap::remove_node` and stays
    /// valid until the node is removed.
    pub fn id(&self) -> NodeId<T, U> {
        NodeId::new(self.node)
    }

    /// Returns the key of the node.
    pub fn key(&self) -> &'a T {
        self.node().key()
    }

    /// Returns the payload of the node, or `None` if the node was inserted without one.
    pub fn data(&self) -> Option<&'a U> {
        self.node()
            .entry
            .as_ref()
            .and_then(|entry| entry.data.as_ref())
    }

    /// Returns the 1-based ascending rank of the node.
    pub fn rank(&self) -> usize {
        tree::rank(self.node())
    }
}

impl<'a, T, U> Clone for NodeRef<'a, T, U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T, U> Copy for NodeRef<'a, T, U> {}

impl<'a, T, U> PartialEq for NodeRef<'a, T, U> {
    fn eq(&self, other: &NodeRef<'a, T, U>) -> bool {
        self.node == other.node
    }
}

impl<'a, T, U> fmt::Debug for NodeRef<'a, T, U>
where
    T: fmt::Debug,
    U: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("data", &self.data())
            .finish()
    }
}
