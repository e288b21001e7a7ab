use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::context::MatchContext;
use crate::node::{Attachment, Payload};

/// A named, custom test over a node property.
///
/// Two predicates are equal only when they share the same closure, which is
/// what makes them usable as memo keys.
pub struct NodePredicate<T: ?Sized> {
    name: String,
    test: Rc<dyn Fn(Option<&T>) -> bool>,
}

impl<T: ?Sized> NodePredicate<T> {
    pub fn new<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(Option<&T>) -> bool + 'static,
    {
        Self {
            name: name.into(),
            test: Rc::new(test),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn test(&self, value: Option<&T>) -> bool {
        (self.test)(value)
    }

    fn address(&self) -> *const () {
        Rc::as_ptr(&self.test) as *const ()
    }
}

impl<T: ?Sized> Clone for NodePredicate<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            test: Rc::clone(&self.test),
        }
    }
}

impl<T: ?Sized> PartialEq for NodePredicate<T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.address(), other.address())
    }
}

impl<T: ?Sized> Eq for NodePredicate<T> {}

impl<T: ?Sized> Hash for NodePredicate<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for NodePredicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodePredicate({})", self.name)
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum MatcherKind {
    ChildCount(usize),
    ForEachChild(NodeMatcher),
    ForParent(NodeMatcher),
    Attachment(Option<Attachment>),
    Value(Option<String>),
    TestAttachment(NodePredicate<Attachment>),
    TestValue(NodePredicate<str>),
    Children(Vec<NodeMatcher>),
    And(Vec<NodeMatcher>),
    Or(Vec<NodeMatcher>),
}

/// Declarative predicate over a node in the context of its path.
///
/// Matchers compare and hash by their parameters, so equal matchers share
/// memo entries during a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeMatcher(Rc<MatcherKind>);

impl NodeMatcher {
    fn from_kind(kind: MatcherKind) -> Self {
        NodeMatcher(Rc::new(kind))
    }

    /// Evaluates the matcher against the leaf of `context`, without consulting
    /// the memo for this matcher itself.
    pub(crate) fn evaluate(&self, context: &MatchContext) -> bool {
        let node = context.path().leaf();
        match &*self.0 {
            MatcherKind::ChildCount(count) => node.children().len() == *count,
            MatcherKind::ForEachChild(matcher) => node
                .children()
                .iter()
                .all(|child| context.for_child(child).matches(matcher)),
            MatcherKind::ForParent(matcher) => context
                .for_parent()
                .map_or(false, |parent| parent.matches(matcher)),
            MatcherKind::Attachment(expected) => node.attachment() == expected.as_ref(),
            MatcherKind::Value(expected) => node.value() == expected.as_deref(),
            MatcherKind::TestAttachment(predicate) => predicate.test(node.attachment()),
            MatcherKind::TestValue(predicate) => predicate.test(node.value()),
            MatcherKind::Children(matchers) => {
                let children = node.children();
                children.len() == matchers.len()
                    && children
                        .iter()
                        .zip(matchers)
                        .all(|(child, matcher)| context.for_child(child).matches(matcher))
            }
            MatcherKind::And(matchers) => matchers.iter().all(|matcher| context.matches(matcher)),
            MatcherKind::Or(matchers) => matchers.iter().any(|matcher| context.matches(matcher)),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, matchers: &[NodeMatcher]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, matcher) in matchers.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", matcher)?;
    }
    f.write_str(")")
}

impl fmt::Display for NodeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            MatcherKind::ChildCount(count) => write!(f, "childCount({})", count),
            MatcherKind::ForEachChild(matcher) => write!(f, "forEachChild({})", matcher),
            MatcherKind::ForParent(matcher) => write!(f, "forParent({})", matcher),
            MatcherKind::Attachment(Some(attachment)) => write!(f, "attachment({:?})", attachment),
            MatcherKind::Attachment(None) => f.write_str("attachment(null)"),
            MatcherKind::Value(Some(value)) => write!(f, "value({:?})", value),
            MatcherKind::Value(None) => f.write_str("value(null)"),
            MatcherKind::TestAttachment(predicate) => {
                write!(f, "testAttachment({})", predicate.name())
            }
            MatcherKind::TestValue(predicate) => write!(f, "testValue({})", predicate.name()),
            MatcherKind::Children(matchers) => write_list(f, "children", matchers),
            MatcherKind::And(matchers) => write_list(f, "and", matchers),
            MatcherKind::Or(matchers) => write_list(f, "or", matchers),
        }
    }
}

/// Matches nodes with exactly `count` children.
pub fn child_count(count: usize) -> NodeMatcher {
    NodeMatcher::from_kind(MatcherKind::ChildCount(count))
}

/// Matches when every child matches `matcher`. Vacuously true for leaves.
pub fn for_each_child(matcher: NodeMatcher) -> NodeMatcher {
    NodeMatcher::from_kind(MatcherKind::ForEachChild(matcher))
}

/// Matches when the parent matches `matcher`. Never matches at the root.
pub fn for_parent(matcher: NodeMatcher) -> NodeMatcher {
    NodeMatcher::from_kind(MatcherKind::ForParent(matcher))
}

/// Matches nodes whose attachment equals `value`.
pub fn attachment<T: Payload>(value: T) -> NodeMatcher {
    attachment_of(Some(Attachment::new(value)))
}

/// Matches nodes whose attachment equals `expected`; `None` matches nodes
/// without an attachment.
pub fn attachment_of(expected: Option<Attachment>) -> NodeMatcher {
    NodeMatcher::from_kind(MatcherKind::Attachment(expected))
}

pub fn no_attachment() -> NodeMatcher {
    attachment_of(None)
}

/// Matches nodes whose value equals `expected`.
pub fn value(expected: &str) -> NodeMatcher {
    value_of(Some(expected))
}

pub fn value_of(expected: Option<&str>) -> NodeMatcher {
    NodeMatcher::from_kind(MatcherKind::Value(expected.map(str::to_string)))
}

pub fn no_value() -> NodeMatcher {
    value_of(None)
}

pub fn test_attachment<F>(name: &str, test: F) -> NodeMatcher
where
    F: Fn(Option<&Attachment>) -> bool + 'static,
{
    NodeMatcher::from_kind(MatcherKind::TestAttachment(NodePredicate::new(name, test)))
}

pub fn test_value<F>(name: &str, test: F) -> NodeMatcher
where
    F: Fn(Option<&str>) -> bool + 'static,
{
    NodeMatcher::from_kind(MatcherKind::TestValue(NodePredicate::new(name, test)))
}

/// Matches the children positionally; the child count must equal the number
/// of matchers.
pub fn children<I: IntoIterator<Item = NodeMatcher>>(matchers: I) -> NodeMatcher {
    NodeMatcher::from_kind(MatcherKind::Children(matchers.into_iter().collect()))
}

/// Conjunction, true when empty.
pub fn and<I: IntoIterator<Item = NodeMatcher>>(matchers: I) -> NodeMatcher {
    NodeMatcher::from_kind(MatcherKind::And(matchers.into_iter().collect()))
}

/// Disjunction, false when empty.
pub fn or<I: IntoIterator<Item = NodeMatcher>>(matchers: I) -> NodeMatcher {
    NodeMatcher::from_kind(MatcherKind::Or(matchers.into_iter().collect()))
}

/// `and(attachment, value, children)` in one call.
pub fn node<I: IntoIterator<Item = NodeMatcher>>(
    attachment: Option<Attachment>,
    value: Option<&str>,
    children_matchers: I,
) -> NodeMatcher {
    and([
        attachment_of(attachment),
        value_of(value),
        children(children_matchers),
    ])
}

/// A node with no value, no attachment and no children.
pub fn empty() -> NodeMatcher {
    and([no_value(), no_attachment(), child_count(0)])
}
