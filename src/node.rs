//! # Parse Tree Nodes
//!
//! A [`Node`] is the immutable result of a successful parse: an optional span
//! over the input, an optional text value, an optional opaque [`Attachment`]
//! and an ordered list of children. Nodes are assembled through a
//! [`NodeBuilder`] and frozen into an `Rc<Node>` once complete, after which
//! they can be shared between the packrat memo table and the tree.
//!
//! Equality comes in two flavours:
//!
//! * [`Node::shallow_eq`] compares span, value and attachment.
//! * `==` additionally compares the children recursively.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Half-open `[start, end)` range of input offsets (in characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.start, self.end)
    }
}

/// Values that can be attached to a node.
///
/// Implemented for every `'static` type with `Debug` and `PartialEq`, so
/// grammar authors normally attach plain enums or structs.
pub trait Payload: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn Payload) -> bool;
}

impl<T: Any + fmt::Debug + PartialEq> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Payload) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// An opaque, shareable payload stored on a [`Node`].
///
/// Two attachments are equal when they hold the same type and the values
/// compare equal.
#[derive(Clone)]
pub struct Attachment(Rc<dyn Payload>);

impl Attachment {
    pub fn new<T: Payload>(value: T) -> Self {
        // an attachment of an attachment is the attachment itself
        if let Some(attachment) = (&value as &dyn Any).downcast_ref::<Attachment>() {
            return attachment.clone();
        }
        Attachment(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.as_ref().as_any().is::<T>()
    }
}

impl PartialEq for Attachment {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.0.as_ref().dyn_eq(other.0.as_ref())
    }
}

impl Eq for Attachment {}

impl Hash for Attachment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // equal payloads always share a type, so the type is a valid hash
        self.0.as_ref().as_any().type_id().hash(state);
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}

type FactoryFn = dyn Fn(Option<&str>, &[Rc<Node>]) -> Option<Attachment>;

/// Computes the attachment of a node from its text and children.
#[derive(Clone)]
pub struct AttachmentFactory {
    label: String,
    create: Rc<FactoryFn>,
}

impl AttachmentFactory {
    pub fn new<F>(label: impl Into<String>, create: F) -> Self
    where
        F: Fn(Option<&str>, &[Rc<Node>]) -> Option<Attachment> + 'static,
    {
        Self {
            label: label.into(),
            create: Rc::new(create),
        }
    }

    /// A factory that always yields `value`.
    pub fn constant<T: Payload>(value: T) -> Self {
        let attachment = Attachment::new(value);
        Self {
            label: format!("{:?}", attachment),
            create: Rc::new(move |_, _| Some(attachment.clone())),
        }
    }

    pub fn create(&self, text: Option<&str>, children: &[Rc<Node>]) -> Option<Attachment> {
        (self.create)(text, children)
    }
}

impl fmt::Debug for AttachmentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttachmentFactory({})", self.label)
    }
}

impl fmt::Display for AttachmentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Rewrites the value of a node, used by `replace`.
#[derive(Clone)]
pub struct Translator(Rc<dyn Fn(&str) -> String>);

impl Translator {
    pub fn new<F: Fn(&str) -> String + 'static>(translate: F) -> Self {
        Translator(Rc::new(translate))
    }

    pub fn constant(replacement: impl Into<String>) -> Self {
        let replacement = replacement.into();
        Translator(Rc::new(move |_| replacement.clone()))
    }

    pub fn translate(&self, input: &str) -> String {
        (self.0)(input)
    }
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Translator")
    }
}

/// Immutable parse tree node.
#[derive(Debug, Clone)]
pub struct Node {
    span: Option<Span>,
    value: Option<String>,
    attachment: Option<Attachment>,
    children: Vec<Rc<Node>>,
}

impl Node {
    pub fn builder() -> NodeBuilder {
        NodeBuilder::new()
    }

    /// A childless node holding `value`, without span or attachment.
    pub fn leaf(value: impl Into<String>) -> Rc<Node> {
        NodeBuilder::new().value(value).build()
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn start(&self) -> Option<usize> {
        self.span.map(|s| s.start)
    }

    pub fn end(&self) -> Option<usize> {
        self.span.map(|s| s.end)
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    /// Downcasts the attachment, if any, to `T`.
    pub fn attachment_as<T: Any>(&self) -> Option<&T> {
        self.attachment.as_ref().and_then(|a| a.downcast_ref::<T>())
    }

    pub fn children(&self) -> &[Rc<Node>] {
        &self.children
    }

    pub fn first_child(&self) -> Option<&Rc<Node>> {
        self.children.first()
    }

    /// Compares span, value and attachment, ignoring children.
    pub fn shallow_eq(&self, other: &Node) -> bool {
        self.span == other.span && self.value == other.value && self.attachment == other.attachment
    }

    /// Whether `node` is one of this node's direct children.
    pub fn has_child(&self, node: &Rc<Node>) -> bool {
        self.children
            .iter()
            .any(|child| Rc::ptr_eq(child, node) || **child == **node)
    }

    /// A builder holding this node's span, value, attachment and children.
    pub fn to_builder(&self) -> NodeBuilder {
        NodeBuilder {
            span: self.span,
            value: self.value.clone(),
            attachment: self.attachment.clone(),
            factory: None,
            children: self.children.clone(),
        }
    }

    /// Multi-line rendering of the subtree.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into("", &mut out);
        out
    }

    fn dump_into(&self, prefix: &str, out: &mut String) {
        out.push_str("Node[");
        if let Some(attachment) = &self.attachment {
            out.push_str(&format!("attachment={:?}", attachment));
        }
        if self.attachment.is_some() && self.value.is_some() {
            out.push_str(", ");
        }
        if let Some(value) = &self.value {
            out.push_str(&format!("value=\"{}\"", value));
        }
        if (self.value.is_some() || self.attachment.is_some()) && !self.children.is_empty() {
            out.push_str(", ");
        }
        if !self.children.is_empty() {
            let inner = format!("{}    ", prefix);
            out.push_str("children={\n");
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                out.push_str(&inner);
                child.dump_into(&inner, out);
            }
            out.push('}');
        }
        out.push(']');
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.shallow_eq(other) && self.children == other.children
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.attachment.hash(state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "N[{}", span)?,
            None => f.write_str("N[(unset)")?,
        }
        if let Some(attachment) = &self.attachment {
            write!(f, ", attach={:?}", attachment)?;
        }
        if let Some(value) = &self.value {
            write!(f, ", val=\"{}\"", value)?;
        }
        if !self.children.is_empty() {
            f.write_str(", child={")?;
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", child)?;
            }
            f.write_str("}")?;
        }
        f.write_str("]")
    }
}

/// Mutable node under construction.
///
/// Combinators append children to a builder while they consume input and
/// freeze it with [`NodeBuilder::build`] once the production succeeded.
#[derive(Debug, Clone, Default)]
pub struct NodeBuilder {
    span: Option<Span>,
    value: Option<String>,
    attachment: Option<Attachment>,
    factory: Option<AttachmentFactory>,
    children: Vec<Rc<Node>>,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn span(mut self, start: usize, end: usize) -> Self {
        self.span = Some(Span::new(start, end));
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn attachment<T: Payload>(mut self, attachment: T) -> Self {
        self.attachment = Some(Attachment::new(attachment));
        self
    }

    /// Computes the attachment from value and children when the node is built.
    pub fn attachment_factory(mut self, factory: AttachmentFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn child(mut self, node: Rc<Node>) -> Self {
        self.children.push(node);
        self
    }

    pub fn children<I: IntoIterator<Item = Rc<Node>>>(mut self, nodes: I) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn push(&mut self, node: Rc<Node>) {
        self.children.push(node);
    }

    pub fn extend<I: IntoIterator<Item = Rc<Node>>>(&mut self, nodes: I) {
        self.children.extend(nodes);
    }

    pub fn set_span(&mut self, start: usize, end: usize) {
        self.span = Some(Span::new(start, end));
    }

    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub fn set_attachment(&mut self, attachment: Option<Attachment>) {
        self.attachment = attachment;
    }

    pub fn current_children(&self) -> &[Rc<Node>] {
        &self.children
    }

    /// Drops children appended after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.children.truncate(len);
    }

    pub fn build(self) -> Rc<Node> {
        let attachment = match &self.factory {
            Some(factory) => factory.create(self.value.as_deref(), &self.children),
            None => self.attachment,
        };
        Rc::new(Node {
            span: self.span,
            value: self.value,
            attachment,
            children: self.children,
        })
    }
}
