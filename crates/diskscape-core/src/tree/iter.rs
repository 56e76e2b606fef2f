//! Traversal iterators over the arena tree.
//!
//! All iterators yield `NodeId`s and borrow the tree immutably; callers that
//! need to mutate during a traversal collect the ids first.

use super::{NodeId, Tree};

/// Walks `next_sibling` links from a starting node.
pub struct Siblings<'a, T> {
    tree: &'a Tree<T>,
    current: Option<NodeId>,
}

impl<'a, T> Siblings<'a, T> {
    pub(super) fn new(tree: &'a Tree<T>, start: Option<NodeId>) -> Self {
        Self {
            tree,
            current: start,
        }
    }
}

impl<T> Iterator for Siblings<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.tree.node(id).next_sibling();
        Some(id)
    }
}

/// Pre-order traversal: a node is visited before any of its descendants.
pub struct PreOrder<'a, T> {
    tree: &'a Tree<T>,
    start: NodeId,
    current: Option<NodeId>,
}

impl<'a, T> PreOrder<'a, T> {
    pub(super) fn new(tree: &'a Tree<T>, start: NodeId) -> Self {
        Self {
            tree,
            start,
            current: Some(start),
        }
    }

    /// Step to the next node that is not a descendant of `id`, without
    /// leaving the subtree rooted at `start`.
    fn next_non_descendant(&self, mut id: NodeId) -> Option<NodeId> {
        loop {
            if id == self.start {
                return None;
            }
            if let Some(sibling) = self.tree.node(id).next_sibling() {
                return Some(sibling);
            }
            id = self.tree.node(id).parent()?;
        }
    }
}

impl<T> Iterator for PreOrder<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = match self.tree.node(id).first_child() {
            Some(child) => Some(child),
            None => self.next_non_descendant(id),
        };
        Some(id)
    }
}

/// Post-order traversal: every descendant is visited before its parent.
pub struct PostOrder<'a, T> {
    tree: &'a Tree<T>,
    start: NodeId,
    current: Option<NodeId>,
}

impl<'a, T> PostOrder<'a, T> {
    pub(super) fn new(tree: &'a Tree<T>, start: NodeId) -> Self {
        Self {
            tree,
            start,
            current: Some(deepest_first_leaf(tree, start)),
        }
    }
}

impl<T> Iterator for PostOrder<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = if id == self.start {
            None
        } else {
            match self.tree.node(id).next_sibling() {
                Some(sibling) => Some(deepest_first_leaf(self.tree, sibling)),
                None => self.tree.node(id).parent(),
            }
        };
        Some(id)
    }
}

/// Left-to-right traversal of leaves only (nodes without children).
pub struct Leaves<'a, T> {
    inner: PostOrder<'a, T>,
}

impl<'a, T> Leaves<'a, T> {
    pub(super) fn new(tree: &'a Tree<T>, start: NodeId) -> Self {
        Self {
            inner: PostOrder::new(tree, start),
        }
    }
}

impl<T> Iterator for Leaves<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let tree = self.inner.tree;
        self.inner.find(|&id| !tree.node(id).has_children())
    }
}

/// Descend `first_child` links until reaching a leaf.
fn deepest_first_leaf<T>(tree: &Tree<T>, mut id: NodeId) -> NodeId {
    while let Some(child) = tree.node(id).first_child() {
        id = child;
    }
    id
}
