//! An ordered map implemented by a treap, with order-statistics (rank) queries, range queries,
//! and whole-tree split and merge.
//!
//! # Examples
//!
//! ```
//! use rank_treap::Treap;
//!
//! let mut t = Treap::new();
//! for key in 0..100 {
//!     t.insert(key, Some(key * 2)).unwrap();
//! }
//!
//! let (left, right) = t.split(&50).unwrap();
//! assert_eq!(left.size(), 50);
//! assert_eq!(right.find_rank(1).map(|node| *node.key()), Some(50));
//!
//! let t = Treap::merge(left, right).unwrap();
//! assert_eq!(t.size(), 100);
//! assert_eq!(t.find(&50).unwrap().and_then(|node| node.data()), Some(&100));
//! ```

mod entry;
mod error;
pub mod treap;

pub use crate::error::{Error, Result};
pub use crate::treap::{NodeId, NodeRef, Treap, TreapConfig};
