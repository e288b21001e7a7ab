use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use strum_macros::{Display, EnumIter, EnumString};

use super::context::MatchContext;
use super::node_matcher::NodeMatcher;
use super::path::Path;
use crate::node::Node;

/// Receives every path of a traversal; returning `false` stops it.
pub trait PathVisitor {
    fn visit(&mut self, path: &Path) -> bool;
}

impl<F: FnMut(&Path) -> bool> PathVisitor for F {
    fn visit(&mut self, path: &Path) -> bool {
        self(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum TraversalOrder {
    BreadthFirst,
    DepthFirst,
}

struct Siblings {
    parent: Path,
    children: VecDeque<Rc<Node>>,
}

/// Pending paths, kept as batches of siblings under a common parent.
#[derive(Default)]
pub(crate) struct PathStack {
    current: Option<Siblings>,
    queue: VecDeque<Siblings>,
}

impl PathStack {
    fn current_is_empty(&self) -> bool {
        self.current
            .as_ref()
            .map_or(true, |siblings| siblings.children.is_empty())
    }

    fn batch(parent: &Path) -> Option<Siblings> {
        let children = parent.leaf().children();
        if children.is_empty() {
            return None;
        }
        Some(Siblings {
            parent: parent.clone(),
            children: children.iter().cloned().collect(),
        })
    }

    /// Schedules the children of `parent` before everything pending.
    pub(crate) fn prepend(&mut self, parent: &Path) {
        if let Some(batch) = Self::batch(parent) {
            if !self.current_is_empty() {
                if let Some(current) = self.current.take() {
                    self.queue.push_front(current);
                }
            }
            self.current = Some(batch);
        }
    }

    /// Schedules the children of `parent` after everything pending.
    pub(crate) fn append(&mut self, parent: &Path) {
        if let Some(batch) = Self::batch(parent) {
            if self.queue.is_empty() && self.current_is_empty() {
                self.current = Some(batch);
            } else {
                self.queue.push_back(batch);
            }
        }
    }

    pub(crate) fn poll(&mut self) -> Option<Path> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if let Some(child) = current.children.pop_front() {
                    return Some(current.parent.for_child_unchecked(child));
                }
            }
            self.current = Some(self.queue.pop_front()?);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.current_is_empty() && self.queue.is_empty()
    }
}

impl fmt::Display for PathStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PathStack[")?;
        for (i, siblings) in self.current.iter().chain(self.queue.iter()).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str("[")?;
            for (j, child) in siblings.children.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}/{}", siblings.parent, child.value().unwrap_or("null"))?;
            }
            f.write_str("]")?;
        }
        f.write_str("]")
    }
}

fn traverse_with<V: PathVisitor + ?Sized>(
    path: &Path,
    visitor: &mut V,
    schedule: fn(&mut PathStack, &Path),
) {
    if !visitor.visit(path) {
        return;
    }
    let mut stack = PathStack::default();
    schedule(&mut stack, path);
    while let Some(next) = stack.poll() {
        tracing::trace!(target: "jamon::traverse", path = %next, pending = %stack, "visit");
        if !visitor.visit(&next) {
            return;
        }
        schedule(&mut stack, &next);
    }
}

/// Visits `path`, then every descendant level by level.
pub fn traverse_breadth_first<V: PathVisitor + ?Sized>(path: &Path, visitor: &mut V) {
    traverse_with(path, visitor, PathStack::append)
}

/// Visits `path`, then every descendant in pre-order.
pub fn traverse_depth_first<V: PathVisitor + ?Sized>(path: &Path, visitor: &mut V) {
    traverse_with(path, visitor, PathStack::prepend)
}

pub fn traverse<V: PathVisitor + ?Sized>(order: TraversalOrder, path: &Path, visitor: &mut V) {
    match order {
        TraversalOrder::BreadthFirst => traverse_breadth_first(path, visitor),
        TraversalOrder::DepthFirst => traverse_depth_first(path, visitor),
    }
}

/// The first path under `path`, in `order`, whose leaf matches `matcher`.
/// All candidates share one match memo.
pub fn find_first(order: TraversalOrder, matcher: &NodeMatcher, path: &Path) -> Option<Path> {
    let context = MatchContext::new(path.clone());
    let mut found = None;
    traverse(order, path, &mut |candidate: &Path| {
        if context.at(candidate.clone()).matches(matcher) {
            found = Some(candidate.clone());
            return false;
        }
        true
    });
    tracing::debug!(target: "jamon::traverse", %order, %matcher, found = found.is_some(), "find first");
    found
}

pub fn find_first_bf(matcher: &NodeMatcher, path: &Path) -> Option<Path> {
    find_first(TraversalOrder::BreadthFirst, matcher, path)
}

pub fn find_first_df(matcher: &NodeMatcher, path: &Path) -> Option<Path> {
    find_first(TraversalOrder::DepthFirst, matcher, path)
}
