use std::result;
use thiserror::Error;

/// Errors returned by fallible treap operations.
///
/// Every operation that returns one of these errors leaves the treap exactly as it was.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// A key or bound cannot be placed in the key ordering, e.g. `f64::NAN`.
    #[error("key is not comparable with the keys of the treap")]
    InvalidKey,
    /// The key is already present in the treap.
    #[error("key already exists in the treap")]
    DuplicateKey,
    /// The lower bound of a range query is not less than its upper bound.
    #[error("lower bound of the range must be less than its upper bound")]
    InvalidRange,
    /// The key or node handle does not refer to a node of the treap.
    #[error("key or node does not exist in the treap")]
    NotFound,
    /// The keys of the left treap do not all precede the keys of the right treap.
    #[error("every key of the left treap must be less than every key of the right treap")]
    InvalidOperation,
}

pub type Result<T> = result::Result<T, Error>;
