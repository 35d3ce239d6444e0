use crate::error::{Error, Result};
use crate::treap::node::{Node, NodeId, NodeRef};
use crate::treap::tree::{self, Search, Tree};
use log::{debug, trace};
use rand::{self, Rng, SeedableRng, XorShiftRng};
use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ops::ControlFlow;
use std::ptr;

/// Construction parameters for a `Treap<T, U>`.
///
/// # Examples
///
/// ```
/// use rank_treap::{Treap, TreapConfig};
///
/// let config = TreapConfig {
///     seed: Some([1, 2, 3, 4]),
/// };
/// let mut t: Treap<u32, ()> = Treap::with_config(config);
/// t.insert(1, None).unwrap();
/// assert_eq!(t.size(), 1);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TreapConfig {
    /// Seed of the priority generator. `None` seeds it from the operating system.
    pub seed: Option<[u32; 4]>,
}

/// An ordered map with rank queries implemented by a treap.
///
/// A treap is a tree that satisfies both the binary search tree property and a heap property. Each
/// node has a key, an optional payload, and a priority. The key of any node is greater than all
/// keys in its left subtree and less than all keys occurring in its right subtree. The priority of
/// a node is less than the priority of all nodes in its subtrees. By randomly generating
/// priorities, the expected height of the tree is proportional to the logarithm of the number of
/// keys.
///
/// Every node also stores the size of its subtree, which answers rank queries in `O(log N)`
/// expected time. Nodes point to their parents, so a node can be removed or ranked directly
/// through its `NodeId`. Splitting and merging relink the nodes along a single root-to-leaf path
/// and never copy a node, so both take `O(log N)` expected time.
///
/// Keys only need to implement `PartialOrd`; a key that cannot be compared, such as `f64::NAN`, is
/// rejected with `Error::InvalidKey`.
///
/// # Examples
///
/// ```
/// use rank_treap::Treap;
///
/// let mut t = Treap::new();
/// t.insert(5, Some("five")).unwrap();
/// t.insert(2, Some("two")).unwrap();
/// t.insert(7, None).unwrap();
///
/// assert_eq!(t.find(&5).unwrap().and_then(|node| node.data()), Some(&"five"));
/// assert_eq!(t.find_rank(1).map(|node| *node.key()), Some(2));
/// assert_eq!(t.size(), 3);
///
/// let keys: Vec<i32> = t.find_range(&3, &7).unwrap().iter().map(|node| *node.key()).collect();
/// assert_eq!(keys, vec![5, 7]);
///
/// assert_eq!(t.remove(&2), Ok((2, Some("two"))));
/// assert!(t.remove(&2).is_err());
/// ```
pub struct Treap<T, U> {
    tree: Tree<T, U>,
    rng: XorShiftRng,
}

impl<T: PartialOrd, U> Treap<T, U> {
    /// Constructs a new, empty `Treap<T, U>` with priorities seeded from the operating system.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    ///
    /// let t: Treap<u32, u32> = Treap::new();
    /// assert!(t.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_config(TreapConfig::default())
    }

    /// Constructs a new, empty `Treap<T, U>` whose priorities are generated deterministically from
    /// `seed`.
    ///
    /// # Panics
    ///
    /// Panics if `seed` is all zeros.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    ///
    /// let t: Treap<u32, u32> = Treap::with_seed([1, 1, 1, 1]);
    /// assert_eq!(t.size(), 0);
    /// ```
    pub fn with_seed(seed: [u32; 4]) -> Self {
        Self::with_config(TreapConfig { seed: Some(seed) })
    }

    /// Constructs a new, empty `Treap<T, U>` from a `TreapConfig`.
    ///
    /// # Panics
    ///
    /// Panics if the configured seed is all zeros.
    pub fn with_config(config: TreapConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => XorShiftRng::from_seed(seed),
            None => rand::weak_rng(),
        };
        Self::from_tree(Tree::new(), rng)
    }

    fn from_tree(tree: Tree<T, U>, rng: XorShiftRng) -> Self {
        Treap { tree, rng }
    }

    /// Inserts a key with an optional payload into the treap and returns the handle of the new
    /// node. `None` means that no payload was supplied; `Some` payloads are stored as given, even
    /// if they are empty or zero.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKey` if the key cannot be compared and `Error::DuplicateKey` if the
    /// key already exists. The treap is unchanged on error.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::{Error, Treap};
    ///
    /// let mut t = Treap::new();
    /// let id = t.insert(1.5, Some(0)).unwrap();
    /// assert_eq!(t.get(&id).and_then(|node| node.data()), Some(&0));
    /// assert_eq!(t.insert(1.5, None), Err(Error::DuplicateKey));
    /// assert_eq!(t.insert(std::f64::NAN, None), Err(Error::InvalidKey));
    /// ```
    pub fn insert(&mut self, key: T, data: Option<U>) -> Result<NodeId<T, U>> {
        tree::check_key(&key)?;
        let location = match self.tree.locate(&key)? {
            Search::Found(_) => return Err(Error::DuplicateKey),
            Search::Vacant(parent, side) => Some((parent, side)),
            Search::Empty => None,
        };

        let priority = self.rng.gen::<f64>();
        let node = Node::new(key, data, priority);
        self.tree.attach(node, location);
        self.tree.sift_up(node);
        trace!("inserted node with priority {}, treap size is now {}", priority, self.size());
        Ok(self.tree.node_ref(node).id())
    }

    /// Returns the node with a particular key, or `None` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKey` if the key cannot be compared.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// t.insert(1, Some(10)).unwrap();
    /// assert_eq!(t.find(&1).unwrap().map(|node| *node.key()), Some(1));
    /// assert!(t.find(&2).unwrap().is_none());
    /// ```
    pub fn find(&self, key: &T) -> Result<Option<NodeRef<T, U>>> {
        tree::check_key(key)?;
        match self.tree.locate(key)? {
            Search::Found(node) => Ok(Some(self.tree.node_ref(node))),
            _ => Ok(None),
        }
    }

    /// Returns every node with `lo <= key <= hi` in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKey` if a bound cannot be compared and `Error::InvalidRange` if `lo`
    /// is not less than `hi`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::{Error, Treap};
    ///
    /// let mut t = Treap::new();
    /// for key in 0..10 {
    ///     t.insert(key, None::<()>).unwrap();
    /// }
    /// let keys: Vec<u32> = t.find_range(&3, &5).unwrap().iter().map(|node| *node.key()).collect();
    /// assert_eq!(keys, vec![3, 4, 5]);
    /// assert_eq!(t.find_range(&5, &5).unwrap_err(), Error::InvalidRange);
    /// ```
    pub fn find_range(&self, lo: &T, hi: &T) -> Result<Vec<NodeRef<T, U>>> {
        tree::check_key(lo)?;
        tree::check_key(hi)?;
        if tree::compare(lo, hi)? != Ordering::Less {
            return Err(Error::InvalidRange);
        }

        let mut found = Vec::new();
        self.tree.collect_range(self.tree.root, lo, hi, &mut found)?;
        Ok(found.into_iter().map(|node| self.tree.node_ref(node)).collect())
    }

    /// Returns the node with a particular 1-based ascending rank, or `None` if `rank` is zero or
    /// greater than the size of the treap.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// t.insert(5, None::<()>).unwrap();
    /// t.insert(2, None).unwrap();
    /// assert_eq!(t.find_rank(1).map(|node| *node.key()), Some(2));
    /// assert_eq!(t.find_rank(2).map(|node| *node.key()), Some(5));
    /// assert!(t.find_rank(0).is_none());
    /// assert!(t.find_rank(3).is_none());
    /// ```
    pub fn find_rank(&self, rank: usize) -> Option<NodeRef<T, U>> {
        self.tree.select(rank).map(|node| self.tree.node_ref(node))
    }

    /// Returns `true` if the key exists in the treap.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKey` if the key cannot be compared.
    pub fn contains(&self, key: &T) -> Result<bool> {
        self.find(key).map(|node| node.is_some())
    }

    /// Returns a mutable reference to the payload of a key, or `None` if the key does not exist
    /// or was inserted without a payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKey` if the key cannot be compared.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// t.insert(1, Some("one")).unwrap();
    /// *t.get_mut(&1).unwrap().unwrap() = "uno";
    /// assert_eq!(t.find(&1).unwrap().and_then(|node| node.data()), Some(&"uno"));
    /// ```
    pub fn get_mut(&mut self, key: &T) -> Result<Option<&mut U>> {
        tree::check_key(key)?;
        match self.tree.locate(key)? {
            Search::Found(node) => Ok(self.tree.entry_mut(node).data.as_mut()),
            _ => Ok(None),
        }
    }

    /// Removes the node with a particular key and returns its key and payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKey` if the key cannot be compared and `Error::NotFound` if the key
    /// does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::{Error, Treap};
    ///
    /// let mut t = Treap::new();
    /// t.insert(1, Some(1)).unwrap();
    /// assert_eq!(t.remove(&1), Ok((1, Some(1))));
    /// assert_eq!(t.remove(&1), Err(Error::NotFound));
    /// ```
    pub fn remove(&mut self, key: &T) -> Result<(T, Option<U>)> {
        tree::check_key(key)?;
        match self.tree.locate(key)? {
            Search::Found(node) => Ok(self.unlink(node)),
            _ => Err(Error::NotFound),
        }
    }

    /// Removes a node through its handle and returns its key and payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the handle does not refer to a node of this treap, for example
    /// because the node was already removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::{Error, Treap};
    ///
    /// let mut t = Treap::new();
    /// let id = t.insert(1, None::<()>).unwrap();
    /// assert_eq!(t.remove_node(&id), Ok((1, None)));
    /// assert_eq!(t.remove_node(&id), Err(Error::NotFound));
    /// ```
    pub fn remove_node(&mut self, id: &NodeId<T, U>) -> Result<(T, Option<U>)> {
        let node = self.tree.resolve(id).ok_or(Error::NotFound)?;
        Ok(self.unlink(node))
    }

    fn unlink(&mut self, node: *mut Node<T, U>) -> (T, Option<U>) {
        let Node { entry, .. } = self.tree.unlink(node);
        trace!("removed node, treap size is now {}", self.size());
        entry
            .expect("Expected a node with an entry.")
            .into_pair()
    }

    /// Visits every node in ascending key order together with its 0-based position. The traversal
    /// stops as soon as `visit` returns `ControlFlow::Break`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    /// use std::ops::ControlFlow;
    ///
    /// let mut t = Treap::new();
    /// for key in 0..10 {
    ///     t.insert(key, None::<()>).unwrap();
    /// }
    ///
    /// let mut visited = Vec::new();
    /// t.traverse(|node, ordinal| {
    ///     visited.push((*node.key(), ordinal));
    ///     if ordinal == 2 {
    ///         ControlFlow::Break(())
    ///     } else {
    ///         ControlFlow::Continue(())
    ///     }
    /// });
    /// assert_eq!(visited, vec![(0, 0), (1, 1), (2, 2)]);
    /// ```
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(NodeRef<T, U>, usize) -> ControlFlow<()>,
    {
        for (ordinal, node) in self.iter().enumerate() {
            if visit(node, ordinal).is_break() {
                break;
            }
        }
    }

    /// Splits the treap into two treaps: the first holds every key less than `key` and the second
    /// every key greater than or equal to `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKey` if the key cannot be compared. The treap is consumed either way;
    /// use `split_off` to keep it on error.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// for key in 0..100 {
    ///     t.insert(key, None::<()>).unwrap();
    /// }
    /// let (left, right) = t.split(&50).unwrap();
    /// assert_eq!(left.size(), 50);
    /// assert_eq!(right.size(), 50);
    /// assert_eq!(left.max().map(|node| *node.key()), Some(49));
    /// assert_eq!(right.min().map(|node| *node.key()), Some(50));
    /// ```
    pub fn split(self, key: &T) -> Result<(Self, Self)> {
        let mut left = self;
        let right = left.split_off(key)?;
        Ok((left, right))
    }

    /// Moves every key greater than or equal to `key` into a new treap and returns it. Only the
    /// nodes on the search path of `key` are relinked, and handles of the moved nodes stay valid
    /// for the returned treap.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidKey` if the key cannot be compared. The treap is unchanged on error.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// for key in 0..10 {
    ///     t.insert(key, None::<()>).unwrap();
    /// }
    /// let id = t.find(&8).unwrap().unwrap().id();
    /// let right = t.split_off(&7).unwrap();
    /// assert_eq!(t.size(), 7);
    /// assert_eq!(right.size(), 3);
    /// assert_eq!(right.rank(&id), Some(2));
    /// ```
    pub fn split_off(&mut self, key: &T) -> Result<Self> {
        tree::check_key(key)?;
        let location = self.tree.locate_split(key)?;

        let pivot = Node::pivot(f64::NEG_INFINITY);
        self.tree.attach(pivot, location);
        self.tree.rotate_to_root(pivot);
        let (left, right) = self.tree.release_root();
        self.tree.root = left;
        let other = Tree::from_root(right);
        debug!("split treap into {} and {} nodes", self.size(), other.len());

        let rng = self.rng.gen::<XorShiftRng>();
        Ok(Self::from_tree(other, rng))
    }

    /// Merges two treaps into one. Every key of `left` must be less than every key of `right`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOperation` if the key ranges overlap. Both treaps are consumed either
    /// way; use `append` to keep them on error.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    ///
    /// let mut left = Treap::new();
    /// let mut right = Treap::new();
    /// left.insert(1, Some("a")).unwrap();
    /// right.insert(2, Some("b")).unwrap();
    ///
    /// let merged = Treap::merge(left, right).unwrap();
    /// assert_eq!(merged.size(), 2);
    /// assert_eq!(merged.find_rank(2).and_then(|node| node.data()), Some(&"b"));
    /// ```
    pub fn merge(left: Self, right: Self) -> Result<Self> {
        let mut left = left;
        let mut right = right;
        left.append(&mut right)?;
        Ok(left)
    }

    /// Moves every node of `other` into `self`, leaving `other` empty. Every key of `self` must be
    /// less than every key of `other`. Only the nodes along the seam of the two treaps are
    /// relinked, and handles of the moved nodes stay valid for `self`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOperation` if the key ranges overlap. Neither treap is changed on
    /// error.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::{Error, Treap};
    ///
    /// let mut left = Treap::new();
    /// let mut right = Treap::new();
    /// left.insert(2, None::<()>).unwrap();
    /// right.insert(1, None).unwrap();
    /// assert_eq!(left.append(&mut right), Err(Error::InvalidOperation));
    ///
    /// right.remove(&1).unwrap();
    /// right.insert(3, None).unwrap();
    /// left.append(&mut right).unwrap();
    /// assert_eq!(left.size(), 2);
    /// assert!(right.is_empty());
    /// ```
    pub fn append(&mut self, other: &mut Self) -> Result<()> {
        let ordered = match (self.max(), other.min()) {
            (Some(max), Some(min)) => max.key().partial_cmp(min.key()) == Some(Ordering::Less),
            _ => true,
        };
        if !ordered {
            return Err(Error::InvalidOperation);
        }

        let left_size = self.size();
        let right_size = other.size();
        let left = mem::replace(&mut self.tree.root, ptr::null_mut());
        let right = mem::replace(&mut other.tree.root, ptr::null_mut());

        let pivot = Node::pivot(f64::NEG_INFINITY);
        self.tree.join(pivot, left, right);
        self.tree.unlink(pivot);
        debug!("merged treaps of {} and {} nodes", left_size, right_size);
        Ok(())
    }

    /// Removes every node from the treap.
    pub fn clear(&mut self) {
        self.tree = Tree::new();
    }
}

impl<T, U> Treap<T, U> {
    /// Returns the number of nodes in the treap.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// t.insert(1, Some(1)).unwrap();
    /// assert_eq!(t.size(), 1);
    /// ```
    pub fn size(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the treap contains no nodes.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the root node of the treap, or `None` if the treap is empty.
    pub fn root(&self) -> Option<NodeRef<T, U>> {
        if self.tree.root.is_null() {
            None
        } else {
            Some(self.tree.node_ref(self.tree.root))
        }
    }

    /// Resolves a handle to its node. Returns `None` if the handle does not refer to a node of this
    /// treap.
    pub fn get(&self, id: &NodeId<T, U>) -> Option<NodeRef<T, U>> {
        self.tree.resolve(id).map(|node| self.tree.node_ref(node))
    }

    /// Returns a mutable reference to the payload of the node behind a handle, or `None` if the
    /// handle does not refer to a node of this treap or the node has no payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// let id = t.insert(1, Some(10)).unwrap();
    /// *t.data_mut(&id).unwrap() += 1;
    /// assert_eq!(t.get(&id).and_then(|node| node.data()), Some(&11));
    /// ```
    pub fn data_mut(&mut self, id: &NodeId<T, U>) -> Option<&mut U> {
        let node = self.tree.resolve(id)?;
        self.tree.entry_mut(node).data.as_mut()
    }

    /// Returns the 1-based ascending rank of the node behind a handle.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// t.insert(10, None::<()>).unwrap();
    /// let id = t.insert(20, None).unwrap();
    /// t.insert(30, None).unwrap();
    /// assert_eq!(t.rank(&id), Some(2));
    /// ```
    pub fn rank(&self, id: &NodeId<T, U>) -> Option<usize> {
        self.get(id).map(|node| node.rank())
    }

    /// Returns the node with the smallest key, or `None` if the treap is empty.
    pub fn min(&self) -> Option<NodeRef<T, U>> {
        self.tree.select(1).map(|node| self.tree.node_ref(node))
    }

    /// Returns the node with the largest key, or `None` if the treap is empty.
    pub fn max(&self) -> Option<NodeRef<T, U>> {
        self.tree.select(self.size()).map(|node| self.tree.node_ref(node))
    }

    /// Returns an iterator over the treap. The iterator yields nodes using in-order traversal.
    ///
    /// # Examples
    ///
    /// ```
    /// use rank_treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// t.insert(3, Some(4)).unwrap();
    /// t.insert(1, Some(2)).unwrap();
    ///
    /// let mut iterator = t.iter();
    /// assert_eq!(iterator.next().map(|node| (*node.key(), node.data())), Some((1, Some(&2))));
    /// assert_eq!(iterator.next().map(|node| (*node.key(), node.data())), Some((3, Some(&4))));
    /// assert!(iterator.next().is_none());
    /// ```
    pub fn iter(&self) -> Iter<T, U> {
        Iter {
            tree: &self.tree,
            current: self.tree.root,
            stack: Vec::new(),
        }
    }
}

impl<'a, T: 'a, U: 'a> IntoIterator for &'a Treap<T, U> {
    type Item = NodeRef<'a, T, U>;
    type IntoIter = Iter<'a, T, U>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator for `Treap<T, U>`
///
/// This iterator traverses the nodes of a treap in-order.
pub struct Iter<'a, T: 'a, U: 'a> {
    tree: &'a Tree<T, U>,
    current: *mut Node<T, U>,
    stack: Vec<*mut Node<T, U>>,
}

impl<'a, T: 'a, U: 'a> Iterator for Iter<'a, T, U> {
    type Item = NodeRef<'a, T, U>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.current.is_null() {
            self.stack.push(self.current);
            self.current = unsafe { (*self.current).left };
        }
        self.stack.pop().map(|node| {
            self.current = unsafe { (*node).right };
            self.tree.node_ref(node)
        })
    }
}

impl<T: PartialOrd, U> Default for Treap<T, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, U> fmt::Debug for Treap<T, U>
where
    T: fmt::Debug,
    U: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|node| (node.key(), node.data())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Treap, TreapConfig};
    use crate::error::Error;
    use std::cmp::Ordering;
    use std::ops::ControlFlow;

    fn keys<U>(tree: &Treap<u32, U>) -> Vec<u32> {
        tree.iter().map(|node| *node.key()).collect()
    }

    fn filled(range: ::std::ops::Range<u32>) -> Treap<u32, u32> {
        let mut tree = Treap::with_seed([1, 1, 1, 1]);
        for key in range {
            tree.insert(key, Some(key * 10)).unwrap();
            tree.tree.assert_invariants();
        }
        tree
    }

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Version {
        major: u32,
        minor: u32,
    }

    // Versions only compare when both components move in the same direction.
    impl PartialOrd for Version {
        fn partial_cmp(&self, other: &Version) -> Option<Ordering> {
            match (self.major.cmp(&other.major), self.minor.cmp(&other.minor)) {
                (major, minor) if major == minor => Some(major),
                (Ordering::Equal, minor) => Some(minor),
                (major, Ordering::Equal) => Some(major),
                _ => None,
            }
        }
    }

    fn version(major: u32, minor: u32) -> Version {
        Version { major, minor }
    }

    #[test]
    fn test_size_empty() {
        let tree: Treap<u32, u32> = Treap::new();
        assert_eq!(tree.size(), 0);
        assert!(tree.root().is_none());
        assert!(tree.find_rank(1).is_none());
    }

    #[test]
    fn test_min_max_empty() {
        let tree: Treap<u32, u32> = Treap::new();
        assert!(tree.min().is_none());
        assert!(tree.max().is_none());
    }

    #[test]
    fn test_insert() {
        let mut tree = Treap::new();
        let id = tree.insert(1, Some(1)).unwrap();
        assert_eq!(tree.contains(&1), Ok(true));
        assert_eq!(tree.get(&id).map(|node| *node.key()), Some(1));
        assert_eq!(tree.root().map(|node| node.id()), Some(id));
    }

    #[test]
    fn test_insert_duplicate() {
        let mut tree = Treap::new();
        tree.insert(9001, None::<()>).unwrap();
        assert_eq!(tree.insert(9001, None), Err(Error::DuplicateKey));
        assert_eq!(tree.size(), 1);
    }

    #[test]
    fn test_insert_invalid_key() {
        let mut tree = Treap::new();
        tree.insert(1.0, None::<()>).unwrap();
        assert_eq!(tree.insert(::std::f64::NAN, None), Err(Error::InvalidKey));
        assert_eq!(tree.find(&::std::f64::NAN).unwrap_err(), Error::InvalidKey);
        assert_eq!(tree.size(), 1);
    }

    #[test]
    fn test_key_incomparable_with_path() {
        let mut tree = Treap::with_seed([1, 1, 1, 1]);
        for step in 1..4 {
            tree.insert(version(step, step), Some(step)).unwrap();
        }
        let stray = version(0, 5);

        assert_eq!(tree.insert(stray, None), Err(Error::InvalidKey));
        assert_eq!(tree.find(&stray).unwrap_err(), Error::InvalidKey);
        assert_eq!(tree.contains(&stray), Err(Error::InvalidKey));
        assert_eq!(tree.remove(&stray), Err(Error::InvalidKey));
        assert_eq!(
            tree.find_range(&version(0, 0), &stray).unwrap_err(),
            Error::InvalidKey,
        );
        assert_eq!(tree.split_off(&stray).unwrap_err(), Error::InvalidKey);

        assert_eq!(tree.size(), 3);
        tree.tree.assert_invariants();
        let keys: Vec<Version> = tree.iter().map(|node| *node.key()).collect();
        assert_eq!(keys, vec![version(1, 1), version(2, 2), version(3, 3)]);
    }

    #[test]
    fn test_insert_keeps_invariants() {
        let tree = filled(0..200);
        assert_eq!(keys(&tree), (0..200).collect::<Vec<u32>>());
    }

    #[test]
    fn test_insert_reverse_order() {
        let mut tree = Treap::with_seed([2, 3, 5, 7]);
        for key in (0..200).rev() {
            tree.insert(key, None::<()>).unwrap();
        }
        tree.tree.assert_invariants();
        assert_eq!(tree.size(), 200);
    }

    #[test]
    fn test_find() {
        let tree = filled(0..10);
        let node = tree.find(&4).unwrap().unwrap();
        assert_eq!(*node.key(), 4);
        assert_eq!(node.data(), Some(&40));
        assert!(tree.find(&10).unwrap().is_none());
    }

    #[test]
    fn test_find_range() {
        let tree = filled(0..100);
        let found: Vec<u32> = tree
            .find_range(&95, &100)
            .unwrap()
            .iter()
            .map(|node| *node.key())
            .collect();
        assert_eq!(found, vec![95, 96, 97, 98, 99]);
        assert!(tree.find_range(&200, &300).unwrap().is_empty());
        assert_eq!(tree.find_range(&5, &4).unwrap_err(), Error::InvalidRange);
    }

    #[test]
    fn test_find_range_invalid_bound() {
        let mut tree = Treap::new();
        tree.insert(1.0, None::<()>).unwrap();
        assert_eq!(
            tree.find_range(&::std::f64::NAN, &2.0).unwrap_err(),
            Error::InvalidKey,
        );
        assert_eq!(
            tree.find_range(&0.0, &::std::f64::NAN).unwrap_err(),
            Error::InvalidKey,
        );
    }

    #[test]
    fn test_find_rank() {
        let tree = filled(0..50);
        for rank in 1..=50 {
            assert_eq!(tree.find_rank(rank).map(|node| *node.key()), Some(rank as u32 - 1));
        }
        assert!(tree.find_rank(0).is_none());
        assert!(tree.find_rank(51).is_none());
    }

    #[test]
    fn test_queries_are_repeatable() {
        let tree = filled(0..50);
        assert_eq!(tree.find(&7).unwrap(), tree.find(&7).unwrap());
        assert_eq!(tree.find_rank(9), tree.find_rank(9));
        assert_eq!(tree.find_range(&3, &30).unwrap(), tree.find_range(&3, &30).unwrap());
    }

    #[test]
    fn test_rank() {
        let mut tree = filled(0..30);
        let id = tree.insert(100, None).unwrap();
        assert_eq!(tree.rank(&id), Some(31));
        for (index, node) in tree.iter().enumerate() {
            assert_eq!(node.rank(), index + 1);
        }
    }

    #[test]
    fn test_remove() {
        let mut tree = filled(0..100);
        for key in (0..100).filter(|key| key % 3 == 0) {
            assert_eq!(tree.remove(&key), Ok((key, Some(key * 10))));
            tree.tree.assert_invariants();
        }
        assert_eq!(tree.size(), 66);
        assert_eq!(tree.find(&3).unwrap(), None);
        assert_eq!(tree.find(&4).unwrap().map(|node| *node.key()), Some(4));
    }

    #[test]
    fn test_remove_missing_key() {
        let mut tree = filled(0..10);
        assert_eq!(tree.remove(&10), Err(Error::NotFound));
        assert_eq!(tree.size(), 10);
        tree.tree.assert_invariants();
    }

    #[test]
    fn test_remove_node() {
        let mut tree = filled(0..10);
        let id = tree.find(&5).unwrap().unwrap().id();
        assert_eq!(tree.remove_node(&id), Ok((5, Some(50))));
        assert_eq!(tree.remove_node(&id), Err(Error::NotFound));
        assert!(tree.get(&id).is_none());
        tree.tree.assert_invariants();
    }

    #[test]
    fn test_remove_node_foreign_handle() {
        let mut tree = filled(0..10);
        let other = filled(0..10);
        let id = other.find(&5).unwrap().unwrap().id();
        assert_eq!(tree.remove_node(&id), Err(Error::NotFound));
        assert_eq!(tree.size(), 10);
    }

    #[test]
    fn test_remove_all() {
        let mut tree = filled(0..20);
        for key in 0..20 {
            tree.remove(&key).unwrap();
            tree.tree.assert_invariants();
        }
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
    }

    #[test]
    fn test_get_mut() {
        let mut tree = filled(0..5);
        *tree.get_mut(&2).unwrap().unwrap() = 7;
        assert_eq!(tree.find(&2).unwrap().and_then(|node| node.data()), Some(&7));
        assert!(tree.get_mut(&7).unwrap().is_none());

        let id = tree.find(&3).unwrap().unwrap().id();
        *tree.data_mut(&id).unwrap() += 1;
        assert_eq!(tree.find(&3).unwrap().and_then(|node| node.data()), Some(&31));
    }

    #[test]
    fn test_data_mut_without_payload() {
        let mut tree = Treap::new();
        let id = tree.insert(1, None::<u32>).unwrap();
        assert!(tree.data_mut(&id).is_none());
        assert!(tree.get_mut(&1).unwrap().is_none());

        tree.remove_node(&id).unwrap();
        assert!(tree.data_mut(&id).is_none());
    }

    #[test]
    fn test_traverse() {
        let tree = filled(0..100);
        let mut visited = 0;
        tree.traverse(|node, ordinal| {
            assert_eq!(*node.key() as usize, ordinal);
            visited += 1;
            ControlFlow::Continue(())
        });
        assert_eq!(visited, 100);
    }

    #[test]
    fn test_traverse_stops_early() {
        let tree = filled(0..100);
        let mut visited = Vec::new();
        tree.traverse(|node, _| {
            visited.push(*node.key());
            if *node.key() == 9 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(visited, (0..10).collect::<Vec<u32>>());
    }

    #[test]
    fn test_split() {
        let tree = filled(0..100);
        let (left, right) = tree.split(&50).unwrap();
        left.tree.assert_invariants();
        right.tree.assert_invariants();
        assert_eq!(keys(&left), (0..50).collect::<Vec<u32>>());
        assert_eq!(keys(&right), (50..100).collect::<Vec<u32>>());
    }

    #[test]
    fn test_split_at_missing_key() {
        let tree = filled(0..10);
        let (left, right) = tree.split(&20).unwrap();
        assert_eq!(left.size(), 10);
        assert!(right.is_empty());

        let tree = filled(5..10);
        let (left, right) = tree.split(&0).unwrap();
        assert!(left.is_empty());
        assert_eq!(right.size(), 5);
        right.tree.assert_invariants();
    }

    #[test]
    fn test_split_empty() {
        let tree: Treap<u32, u32> = Treap::new();
        let (left, right) = tree.split(&1).unwrap();
        assert!(left.is_empty());
        assert!(right.is_empty());
    }

    #[test]
    fn test_split_off_keeps_handles() {
        let mut tree = filled(0..100);
        let kept = tree.find(&10).unwrap().unwrap().id();
        let moved = tree.find(&95).unwrap().unwrap().id();
        let mut right = tree.split_off(&90).unwrap();
        assert_eq!(right.size(), 10);

        assert_eq!(tree.get(&kept).map(|node| *node.key()), Some(10));
        assert!(right.get(&kept).is_none());
        assert!(tree.get(&moved).is_none());
        assert_eq!(right.rank(&moved), Some(6));
        assert_eq!(right.remove_node(&moved), Ok((95, Some(950))));
        right.tree.assert_invariants();
    }

    #[test]
    fn test_split_off_invalid_key() {
        let mut tree = Treap::new();
        tree.insert(1.0, None::<()>).unwrap();
        assert_eq!(tree.split_off(&::std::f64::NAN).unwrap_err(), Error::InvalidKey);
        assert_eq!(tree.size(), 1);
        tree.tree.assert_invariants();
    }

    #[test]
    fn test_merge() {
        let left = filled(0..30);
        let right = filled(30..100);
        let merged = Treap::merge(left, right).unwrap();
        merged.tree.assert_invariants();
        assert_eq!(keys(&merged), (0..100).collect::<Vec<u32>>());
        assert_eq!(merged.find(&50).unwrap().and_then(|node| node.data()), Some(&500));
    }

    #[test]
    fn test_merge_smaller_right() {
        let left = filled(0..90);
        let right = filled(90..100);
        let merged = Treap::merge(left, right).unwrap();
        merged.tree.assert_invariants();
        assert_eq!(merged.size(), 100);
    }

    #[test]
    fn test_merge_with_empty() {
        let merged = Treap::merge(filled(0..10), Treap::new()).unwrap();
        assert_eq!(merged.size(), 10);
        let merged = Treap::merge(Treap::new(), filled(0..10)).unwrap();
        assert_eq!(merged.size(), 10);
        merged.tree.assert_invariants();
    }

    #[test]
    fn test_append_keeps_handles() {
        let mut left = filled(0..50);
        let mut right = filled(50..100);
        let id = right.find(&75).unwrap().unwrap().id();
        left.append(&mut right).unwrap();
        assert!(right.is_empty());
        assert!(right.get(&id).is_none());
        assert_eq!(left.rank(&id), Some(76));
        left.tree.assert_invariants();
    }

    #[test]
    fn test_append_overlapping() {
        let mut left = filled(0..10);
        let mut right = filled(5..15);
        assert_eq!(left.append(&mut right), Err(Error::InvalidOperation));
        assert_eq!(left.size(), 10);
        assert_eq!(right.size(), 10);
        left.tree.assert_invariants();
        right.tree.assert_invariants();
    }

    #[test]
    fn test_split_then_merge() {
        let tree = filled(0..100);
        let (left, right) = tree.split(&37).unwrap();
        let merged = Treap::merge(left, right).unwrap();
        merged.tree.assert_invariants();
        assert_eq!(merged.size(), 100);
        for node in merged.iter() {
            assert_eq!(node.data(), Some(&(*node.key() * 10)));
        }
    }

    #[test]
    fn test_clear() {
        let mut tree = filled(0..10);
        let id = tree.find(&3).unwrap().unwrap().id();
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.get(&id).is_none());
        tree.insert(1, None).unwrap();
        assert_eq!(tree.size(), 1);
    }

    #[test]
    fn test_config() {
        let config = TreapConfig {
            seed: Some([4, 3, 2, 1]),
        };
        let mut first = Treap::with_config(config);
        let mut second = Treap::with_config(config);
        for key in 0..50 {
            first.insert(key, None::<()>).unwrap();
            second.insert(key, None::<()>).unwrap();
        }
        first.tree.assert_invariants();
        assert_eq!(
            first.root().map(|node| *node.key()),
            second.root().map(|node| *node.key()),
        );
    }

    #[test]
    fn test_debug() {
        let mut tree = Treap::new();
        tree.insert(2, Some("b")).unwrap();
        tree.insert(1, None).unwrap();
        assert_eq!(format!("{:?}", tree), "{1: None, 2: Some(\"b\")}");
    }
}
