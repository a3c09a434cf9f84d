use std::collections::BTreeSet;

use crate::StateId;

use super::IoPair;

/// Identifies a node of a [`DiscriminationTree`]. Inner nodes and leaves are stored separately, so
/// the index is only meaningful together with the kind of node.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub enum NodeId {
    /// An inner node, which splits its states by an [`IoPair`].
    Inner(usize),
    /// A terminal node.
    Leaf(usize),
}
pub use NodeId::*;

impl NodeId {
    /// Returns the index if `self` points to an inner node.
    pub fn try_inner(&self) -> Option<usize> {
        let Self::Inner(n) = self else {
            return None;
        };
        Some(*n)
    }

    /// Returns the index if `self` points to a leaf.
    pub fn try_leaf(&self) -> Option<usize> {
        let Self::Leaf(n) = self else {
            return None;
        };
        Some(*n)
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (a, b) = match self {
            NodeId::Inner(n) => ("N", n),
            NodeId::Leaf(n) => ("L", n),
        };
        write!(f, "{a}({b})")
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct InnerNode<Q> {
    parent: Option<NodeId>,
    states: BTreeSet<Q>,
    discriminator: IoPair,
    // matching, then not matching
    subtree: [NodeId; 2],
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct LeafNode<Q> {
    parent: Option<NodeId>,
    states: BTreeSet<Q>,
}

/// A binary tree over blocks of states. Every inner node holds the [`IoPair`] that splits its block
/// into the states that match the pair and the ones that do not, which are the blocks of its two
/// children. Leaves hold blocks that consist of a single state or that no single pair splits.
///
/// Nodes are kept in an arena and refer to each other through [`NodeId`]s.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DiscriminationTree<Q: StateId = u32> {
    inner: Vec<InnerNode<Q>>,
    leaves: Vec<LeafNode<Q>>,
    root: NodeId,
}

impl<Q: StateId> DiscriminationTree<Q> {
    pub(crate) fn empty() -> Self {
        Self {
            inner: vec![],
            leaves: vec![],
            root: Leaf(0),
        }
    }

    pub(crate) fn add_leaf(&mut self, parent: Option<NodeId>, states: BTreeSet<Q>) -> NodeId {
        self.leaves.push(LeafNode { parent, states });
        Leaf(self.leaves.len() - 1)
    }

    /// Adds an inner node whose successors point back to itself until they are set through
    /// [`Self::set_successor`].
    pub(crate) fn add_inner(
        &mut self,
        parent: Option<NodeId>,
        states: BTreeSet<Q>,
        discriminator: IoPair,
    ) -> NodeId {
        let id = Inner(self.inner.len());
        self.inner.push(InnerNode {
            parent,
            states,
            discriminator,
            subtree: [id, id],
        });
        id
    }

    pub(crate) fn set_successor(&mut self, node: &NodeId, matching: bool, child: NodeId) {
        if let Some(subtree) = self.try_successors_mut(node) {
            subtree[if matching { 0 } else { 1 }] = child;
        }
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    fn try_successors_mut(&mut self, node: &NodeId) -> Option<&mut [NodeId; 2]> {
        let inner = node.try_inner()?;
        assert!(inner < self.inner.len(), "invalid inner node index");
        Some(&mut self.inner[inner].subtree)
    }

    /// The root, whose block consists of all states.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The number of inner nodes.
    pub fn inner_len(&self) -> usize {
        self.inner.len()
    }

    /// The number of leaves.
    pub fn leaf_len(&self) -> usize {
        self.leaves.len()
    }

    /// Returns true if `node` is a leaf.
    pub fn is_terminal(&self, node: &NodeId) -> bool {
        node.try_leaf().is_some()
    }

    /// The block of states that `node` represents.
    pub fn states(&self, node: &NodeId) -> &BTreeSet<Q> {
        match node {
            NodeId::Inner(n) => {
                assert!(*n < self.inner.len(), "invalid inner node index");
                &self.inner[*n].states
            }
            NodeId::Leaf(n) => {
                assert!(*n < self.leaves.len(), "invalid leaf index");
                &self.leaves[*n].states
            }
        }
    }

    /// The pair by which the states of `node` are split, if `node` is an inner node.
    pub fn try_discriminator(&self, node: &NodeId) -> Option<IoPair> {
        let inner = node.try_inner()?;
        assert!(inner < self.inner.len(), "invalid inner node index");
        Some(self.inner[inner].discriminator)
    }

    /// The children of an inner node, the one whose states match the discriminator comes first.
    pub fn try_successors(&self, node: &NodeId) -> Option<&[NodeId; 2]> {
        let inner = node.try_inner()?;
        assert!(inner < self.inner.len(), "invalid inner node index");
        Some(&self.inner[inner].subtree)
    }

    /// The parent of `node`, which is `None` only for the root.
    pub fn try_parent(&self, node: &NodeId) -> Option<NodeId> {
        match node {
            NodeId::Inner(n) => {
                assert!(*n < self.inner.len(), "invalid inner node index");
                self.inner[*n].parent
            }
            NodeId::Leaf(n) => {
                assert!(*n < self.leaves.len(), "invalid leaf index");
                self.leaves[*n].parent
            }
        }
    }

    /// Collects the ancestors of `node`, starting with its parent and ending with the root.
    pub fn ancestors_vec(&self, node: &NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = *node;
        while let Some(parent) = self.try_parent(&current) {
            ancestors.push(parent);
            current = parent;
        }
        ancestors
    }

    /// Returns the deepest node that is an ancestor of (or equal to) both `a` and `b`.
    pub fn lowest_common_ancestor(&self, a: &NodeId, b: &NodeId) -> NodeId {
        if a == b {
            return *a;
        }
        let ancestors_a = self.ancestors_vec(a);
        if ancestors_a.contains(b) {
            return *b;
        }

        let mut current = *b;
        while let Some(parent) = self.try_parent(&current) {
            if parent == *a || ancestors_a.contains(&parent) {
                return parent;
            }
            current = parent;
        }

        self.root
    }

    /// Iterates over all leaves in the order in which they were created.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.leaves.len()).map(Leaf)
    }

    /// Iterates over all inner nodes in the order in which they were created.
    pub fn inner_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.inner.len()).map(Inner)
    }

    /// Finds the leaf whose block contains `state`.
    pub fn leaf_of(&self, state: Q) -> Option<NodeId> {
        self.leaves().find(|l| self.states(l).contains(&state))
    }

    /// The number of inner nodes on the longest path from the root to a leaf.
    pub fn depth(&self) -> usize {
        self.leaves()
            .map(|l| self.ancestors_vec(&l).len())
            .max()
            .unwrap_or(0)
    }

    /// Returns the pair that tells `p` and `q` apart, which is the discriminator of the lowest common
    /// ancestor of their leaves. Gives back `None` if both states share a leaf or one of them does
    /// not occur in the tree.
    pub fn separating_pair(&self, p: Q, q: Q) -> Option<IoPair> {
        let (lp, lq) = (self.leaf_of(p)?, self.leaf_of(q)?);
        if lp == lq {
            return None;
        }
        self.try_discriminator(&self.lowest_common_ancestor(&lp, &lq))
    }

    /// The blocks of leaves that hold more than one state, which are the blocks that no single
    /// input/output pair separates. Their states may still be told apart by longer input words.
    pub fn unsplit_blocks(&self) -> Vec<&BTreeSet<Q>> {
        self.leaves
            .iter()
            .map(|l| &l.states)
            .filter(|states| states.len() > 1)
            .collect()
    }
}
