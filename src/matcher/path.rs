use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::PathError;
use crate::node::Node;

/// A non-empty chain of nodes, each a child of its predecessor.
///
/// The last node is the leaf a matcher is evaluated against; the rest give it
/// ancestry, so matchers can look at parents.
#[derive(Debug, Clone)]
pub struct Path {
    nodes: Vec<Rc<Node>>,
}

impl Path {
    /// Validates the parent/child chain of `nodes`.
    pub fn new<I: IntoIterator<Item = Rc<Node>>>(nodes: I) -> Result<Path, PathError> {
        let nodes: Vec<Rc<Node>> = nodes.into_iter().collect();
        if nodes.is_empty() {
            return Err(PathError::Empty);
        }
        for (index, pair) in nodes.windows(2).enumerate() {
            if !pair[0].has_child(&pair[1]) {
                return Err(PathError::Broken { index: index + 1 });
            }
        }
        Ok(Path { nodes })
    }

    /// A path consisting of `root` alone.
    pub fn from_root(root: Rc<Node>) -> Path {
        Path { nodes: vec![root] }
    }

    pub fn root(&self) -> &Rc<Node> {
        &self.nodes[0]
    }

    pub fn leaf(&self) -> &Rc<Node> {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Number of ancestors of the leaf.
    pub fn depth(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn nodes(&self) -> &[Rc<Node>] {
        &self.nodes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rc<Node>> {
        self.nodes.iter()
    }

    /// Extends the path by `child`, which must be a child of the leaf.
    pub fn for_child(&self, child: &Rc<Node>) -> Result<Path, PathError> {
        if !self.leaf().has_child(child) {
            return Err(PathError::NotAChild);
        }
        Ok(self.for_child_unchecked(Rc::clone(child)))
    }

    /// Extends the path by a node known to be one of the leaf's children.
    pub(crate) fn for_child_unchecked(&self, child: Rc<Node>) -> Path {
        let mut nodes = Vec::with_capacity(self.nodes.len() + 1);
        nodes.extend(self.nodes.iter().cloned());
        nodes.push(child);
        Path { nodes }
    }

    /// The path without its leaf, `None` at the root.
    pub fn for_parent(&self) -> Option<Path> {
        if self.nodes.len() == 1 {
            return None;
        }
        Some(Path {
            nodes: self.nodes[..self.nodes.len() - 1].to_vec(),
        })
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.nodes.len() == other.nodes.len()
            && self
                .nodes
                .iter()
                .zip(&other.nodes)
                .all(|(a, b)| Rc::ptr_eq(a, b) || **a == **b)
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for node in &self.nodes {
            node.hash(state);
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(node.value().unwrap_or("null"))?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Rc<Node>;
    type IntoIter = std::slice::Iter<'a, Rc<Node>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
