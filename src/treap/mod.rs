//! Probabilistic binary search tree where each node also maintains the heap invariant and the
//! size of its subtree.

mod map;
mod node;
mod tree;

pub use self::map::{Iter, Treap, TreapConfig};
pub use self::node::{NodeId, NodeRef};
