use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::node::{AttachmentFactory, NodeBuilder, Payload};

pub type ParseResult<T = Cursor> = Result<T, ParseError>;

/// The unit of parsing.
///
/// A consumer reads a prefix of `input`, appends the nodes it produces to
/// `parent` and returns the cursor after the consumed prefix. On failure
/// nothing it produced may remain in `parent`.
pub trait Consumer: fmt::Display {
    fn consume(&self, input: &Cursor, parent: &mut NodeBuilder) -> ParseResult;
}

/// A consumer that produces a result node of its own and can therefore carry
/// an attachment.
pub trait Attachable: Consumer {
    /// A copy of this parser whose result nodes get their attachment from
    /// `factory`. The copy memoizes independently of the original.
    fn with_factory(&self, factory: AttachmentFactory) -> Parser;
}

/// Type-erased handle to any consumer.
#[derive(Clone)]
pub struct Rule(Rc<dyn Consumer>);

impl Rule {
    pub fn new<C: Consumer + 'static>(consumer: C) -> Self {
        Rule(Rc::new(consumer))
    }
}

impl Consumer for Rule {
    fn consume(&self, input: &Cursor, parent: &mut NodeBuilder) -> ParseResult {
        self.0.consume(input, parent)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule({})", self.0)
    }
}

/// Handle to an [`Attachable`] consumer.
#[derive(Clone)]
pub struct Parser {
    consumer: Rc<dyn Consumer>,
    attachable: Rc<dyn Attachable>,
}

impl Parser {
    pub fn new<A: Attachable + 'static>(parser: A) -> Self {
        let parser = Rc::new(parser);
        Self {
            consumer: parser.clone(),
            attachable: parser,
        }
    }

    /// Binds a constant attachment to every node this parser produces.
    pub fn attach<T: Payload>(&self, value: T) -> Parser {
        self.attachable.with_factory(AttachmentFactory::constant(value))
    }

    /// Binds a computed attachment to every node this parser produces.
    pub fn attachment_factory(&self, factory: AttachmentFactory) -> Parser {
        self.attachable.with_factory(factory)
    }

    pub fn rule(&self) -> Rule {
        Rule(self.consumer.clone())
    }
}

impl Consumer for Parser {
    fn consume(&self, input: &Cursor, parent: &mut NodeBuilder) -> ParseResult {
        self.consumer.consume(input, parent)
    }
}

impl fmt::Display for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.consumer)
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parser({})", self.consumer)
    }
}

/// Forward declaration of a rule, bound once the rule exists.
///
/// References are the only way to express recursive grammars. Clones share
/// the same target. A reference has no node of its own, so it cannot carry an
/// attachment.
#[derive(Clone, Default)]
pub struct Reference {
    target: Rc<RefCell<Option<Rule>>>,
}

impl Reference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_target(&self, target: impl Into<Rule>) {
        *self.target.borrow_mut() = Some(target.into());
    }

    pub fn is_bound(&self) -> bool {
        self.target.borrow().is_some()
    }

    pub fn rule(&self) -> Rule {
        Rule(Rc::new(self.clone()))
    }
}

impl Consumer for Reference {
    fn consume(&self, input: &Cursor, parent: &mut NodeBuilder) -> ParseResult {
        // release the borrow before descending, the target may lead back here
        let target = self.target.borrow().clone();
        match target {
            Some(target) => target.consume(input, parent),
            None => Err(ParseError::inconsistent(
                "reference consumed before its target was set",
                input.start(),
            )),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("reference[]")
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference(bound: {})", self.is_bound())
    }
}

impl From<Parser> for Rule {
    fn from(parser: Parser) -> Self {
        Rule(parser.consumer)
    }
}

impl From<&Parser> for Rule {
    fn from(parser: &Parser) -> Self {
        parser.rule()
    }
}

impl From<&Rule> for Rule {
    fn from(rule: &Rule) -> Self {
        rule.clone()
    }
}

impl From<Reference> for Rule {
    fn from(reference: Reference) -> Self {
        Rule(Rc::new(reference))
    }
}

impl From<&Reference> for Rule {
    fn from(reference: &Reference) -> Self {
        reference.rule()
    }
}
