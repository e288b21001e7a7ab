use std::fmt;
use std::rc::Rc;

use super::core::{Attachable, Consumer, ParseResult, Parser, Rule};
use crate::chars::CharClass;
use crate::cursor::{ConsumerId, Cursor};
use crate::error::ParseError;
use crate::node::{AttachmentFactory, Node, NodeBuilder, Translator};

/// Matching logic of a memoizing parser.
///
/// [`Memoized`] runs `produce` against a fresh node on a memo miss, stamps the
/// node with the consumed span and stores it. `apply` then hands the node to
/// the parent, both after a fresh match and on every later memo hit.
pub trait Production: fmt::Display {
    fn produce(&self, input: &Cursor, me: &mut NodeBuilder) -> ParseResult;

    fn apply(&self, parent: &mut NodeBuilder, me: &Rc<Node>) {
        parent.push(Rc::clone(me));
    }

    /// The same production with `factory` computing its attachments.
    fn attached(&self, factory: AttachmentFactory) -> Parser;
}

/// Packrat wrapper around a [`Production`], memoized under its own id.
pub struct Memoized<P> {
    id: ConsumerId,
    production: P,
}

impl<P: Production> Memoized<P> {
    pub fn new(production: P) -> Self {
        Self {
            id: ConsumerId::fresh(),
            production,
        }
    }

    pub fn id(&self) -> ConsumerId {
        self.id
    }
}

impl<P: Production> Consumer for Memoized<P> {
    fn consume(&self, input: &Cursor, parent: &mut NodeBuilder) -> ParseResult {
        if let Some(me) = input.recall(self.id)? {
            self.production.apply(parent, &me);
            return Ok(input.splice(me.end().unwrap_or(input.start())));
        }

        let mut me = NodeBuilder::new();
        match self.production.produce(input, &mut me) {
            Ok(remaining) => {
                me.set_span(input.start(), remaining.start());
                let me = input.remember(self.id, me.build())?;
                self.production.apply(parent, &me);
                Ok(remaining)
            }
            Err(error) if error.is_recoverable() => {
                input.remember_failure(self.id, &error)?;
                Err(error)
            }
            Err(error) => Err(error),
        }
    }
}

impl<P: Production> fmt::Display for Memoized<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.production)
    }
}

impl<P: Production> Attachable for Memoized<P> {
    fn with_factory(&self, factory: AttachmentFactory) -> Parser {
        self.production.attached(factory)
    }
}

/// Sets the attachment of `me` from the text matched between `input` and `rest`.
fn attach_matched(
    factory: &Option<AttachmentFactory>,
    input: &Cursor,
    rest: &Cursor,
    me: &mut NodeBuilder,
) {
    if let Some(factory) = factory {
        let text = input.slice(input.start(), rest.start());
        let attachment = factory.create(Some(&text), me.current_children());
        me.set_attachment(attachment);
    }
}

fn write_head(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    factory: &Option<AttachmentFactory>,
) -> fmt::Result {
    write!(f, "{}[", name)?;
    if let Some(factory) = factory {
        write!(f, "{}, ", factory)?;
    }
    Ok(())
}

fn write_rules(f: &mut fmt::Formatter<'_>, rules: &[Rule]) -> fmt::Result {
    f.write_str("{")?;
    for (i, rule) in rules.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", rule)?;
    }
    f.write_str("}")
}

// Sequence: every parser in order, all results under one node
pub struct Sequence {
    parsers: Vec<Rule>,
    factory: Option<AttachmentFactory>,
}

impl Sequence {
    pub fn new(parsers: Vec<Rule>) -> Self {
        Self {
            parsers,
            factory: None,
        }
    }
}

impl Production for Sequence {
    fn produce(&self, input: &Cursor, me: &mut NodeBuilder) -> ParseResult {
        let mut cursor = input.clone();
        for parser in &self.parsers {
            cursor = parser.consume(&cursor, me).map_err(|error| {
                if error.is_recoverable() {
                    error.with_context("Sequence failed")
                } else {
                    error
                }
            })?;
        }
        attach_matched(&self.factory, input, &cursor, me);
        Ok(cursor)
    }

    fn attached(&self, factory: AttachmentFactory) -> Parser {
        Parser::new(Memoized::new(Sequence {
            parsers: self.parsers.clone(),
            factory: Some(factory),
        }))
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_head(f, "sequence", &self.factory)?;
        write_rules(f, &self.parsers)?;
        f.write_str("]")
    }
}

// Alternative: the first parser that matches at the original position wins
pub struct Alternative {
    parsers: Vec<Rule>,
    factory: Option<AttachmentFactory>,
}

impl Alternative {
    /// # Panics
    ///
    /// Panics if `parsers` is empty.
    pub fn new(parsers: Vec<Rule>) -> Self {
        assert!(
            !parsers.is_empty(),
            "At least one parser required as argument"
        );
        Self {
            parsers,
            factory: None,
        }
    }
}

impl Production for Alternative {
    fn produce(&self, input: &Cursor, me: &mut NodeBuilder) -> ParseResult {
        for parser in &self.parsers {
            let mark = me.current_children().len();
            match parser.consume(input, me) {
                Ok(rest) => {
                    attach_matched(&self.factory, input, &rest, me);
                    return Ok(rest);
                }
                Err(error) if error.is_recoverable() => {
                    me.truncate(mark);
                    tracing::trace!(target: "jamon::alternative", position = input.start(), %error, "branch failed");
                }
                Err(error) => return Err(error),
            }
        }
        tracing::debug!(target: "jamon::alternative", position = input.start(), "no alternative matched");
        Err(ParseError::no_alternative(input.start()))
    }

    fn attached(&self, factory: AttachmentFactory) -> Parser {
        Parser::new(Memoized::new(Alternative {
            parsers: self.parsers.clone(),
            factory: Some(factory),
        }))
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_head(f, "alternative", &self.factory)?;
        write_rules(f, &self.parsers)?;
        f.write_str("]")
    }
}

// Repeat: greedy, bounded repetition
pub struct Repeat {
    parser: Rule,
    min: usize,
    max: Option<usize>,
    factory: Option<AttachmentFactory>,
}

impl Repeat {
    /// `max: None` repeats without upper bound.
    pub fn new(min: usize, max: Option<usize>, parser: Rule) -> Self {
        Self {
            parser,
            min,
            max,
            factory: None,
        }
    }
}

impl Production for Repeat {
    fn produce(&self, input: &Cursor, me: &mut NodeBuilder) -> ParseResult {
        let mut cursor = input.clone();
        let mut count = 0;
        while self.max.map_or(true, |max| count < max) {
            let mark = me.current_children().len();
            match self.parser.consume(&cursor, me) {
                Ok(rest) => {
                    count += 1;
                    let advanced = rest.start() > cursor.start();
                    cursor = rest;
                    // unbounded, a zero-width match repeats forever and so meets any minimum
                    if !advanced && self.max.is_none() {
                        count = count.max(self.min);
                        break;
                    }
                }
                Err(error) if error.is_recoverable() => {
                    me.truncate(mark);
                    tracing::debug!(target: "jamon::repeat", position = cursor.start(), count, %error, "repetition stopped");
                    break;
                }
                Err(error) => return Err(error),
            }
        }
        if count < self.min {
            return Err(ParseError::mismatch(
                format!("Out of bounds ({} < {})", count, self.min),
                input.start(),
            ));
        }
        attach_matched(&self.factory, input, &cursor, me);
        Ok(cursor)
    }

    fn attached(&self, factory: AttachmentFactory) -> Parser {
        Parser::new(Memoized::new(Repeat {
            parser: self.parser.clone(),
            min: self.min,
            max: self.max,
            factory: Some(factory),
        }))
    }
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_head(f, "repeat", &self.factory)?;
        match self.max {
            Some(max) => write!(f, "{}, {}, {}]", self.min, max, self.parser),
            None => write!(f, "{}, -1, {}]", self.min, self.parser),
        }
    }
}

/// Hands the children of the inner parser's node to the parent directly.
pub struct Lift {
    parser: Rule,
}

impl Lift {
    pub fn new(parser: Rule) -> Self {
        Self { parser }
    }
}

impl Production for Lift {
    fn produce(&self, input: &Cursor, me: &mut NodeBuilder) -> ParseResult {
        self.parser.consume(input, me)
    }

    fn apply(&self, parent: &mut NodeBuilder, me: &Rc<Node>) {
        for child in me.children() {
            parent.extend(child.children().iter().cloned());
        }
    }

    fn attached(&self, factory: AttachmentFactory) -> Parser {
        Parser::new(Memoized::new(LiftReplace {
            parser: self.parser.clone(),
            factory,
        }))
    }
}

impl fmt::Display for Lift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lift[{}]", self.parser)
    }
}

/// A lift that recomputes the attachment of every lifted node.
pub struct LiftReplace {
    parser: Rule,
    factory: AttachmentFactory,
}

impl Production for LiftReplace {
    fn produce(&self, input: &Cursor, me: &mut NodeBuilder) -> ParseResult {
        self.parser.consume(input, me)
    }

    fn apply(&self, parent: &mut NodeBuilder, me: &Rc<Node>) {
        for child in me.children() {
            for lifted in child.children() {
                let mut node = lifted.to_builder();
                node.set_attachment(self.factory.create(lifted.value(), lifted.children()));
                parent.push(node.build());
            }
        }
    }

    fn attached(&self, factory: AttachmentFactory) -> Parser {
        Parser::new(Memoized::new(LiftReplace {
            parser: self.parser.clone(),
            factory,
        }))
    }
}

impl fmt::Display for LiftReplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lift[{}, {}]", self.factory, self.parser)
    }
}

/// Collapses the inner parser's subtree into one node holding the
/// concatenated values.
pub struct Join {
    parser: Rule,
    joint: String,
    factory: Option<AttachmentFactory>,
}

impl Join {
    pub fn new(parser: Rule, joint: impl Into<String>) -> Self {
        Self {
            parser,
            joint: joint.into(),
            factory: None,
        }
    }
}

impl Production for Join {
    fn produce(&self, input: &Cursor, me: &mut NodeBuilder) -> ParseResult {
        let mut inner = NodeBuilder::new();
        let rest = self.parser.consume(input, &mut inner)?;
        let joined = join_values(&self.joint, inner.current_children());
        if let Some(factory) = &self.factory {
            me.set_attachment(factory.create(Some(&joined), inner.current_children()));
        }
        me.set_value(Some(joined));
        Ok(rest)
    }

    fn attached(&self, factory: AttachmentFactory) -> Parser {
        Parser::new(Memoized::new(Join {
            parser: self.parser.clone(),
            joint: self.joint.clone(),
            factory: Some(factory),
        }))
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_head(f, "join", &self.factory)?;
        write!(f, "{}]", self.parser)
    }
}

/// Concatenates the values of `nodes` and their descendants, `joint` between
/// siblings. Valueless nodes contribute only their descendants.
pub fn join_values(joint: &str, nodes: &[Rc<Node>]) -> String {
    let mut out = String::new();
    join_into("", joint, nodes, &mut out);
    out
}

fn join_into(prefix: &str, joint: &str, nodes: &[Rc<Node>], out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        out.push_str(if i == 0 { prefix } else { joint });
        match node.value() {
            Some(value) => {
                out.push_str(value);
                join_into(joint, joint, node.children(), out);
            }
            None => join_into("", joint, node.children(), out),
        }
    }
}

/// Runs the inner parser and keeps its node, without advancing.
pub struct Preserve {
    parser: Rule,
    factory: Option<AttachmentFactory>,
}

impl Preserve {
    pub fn new(parser: Rule) -> Self {
        Self {
            parser,
            factory: None,
        }
    }
}

impl Production for Preserve {
    fn produce(&self, input: &Cursor, me: &mut NodeBuilder) -> ParseResult {
        let rest = self.parser.consume(input, me)?;
        attach_matched(&self.factory, input, &rest, me);
        Ok(input.clone())
    }

    fn attached(&self, factory: AttachmentFactory) -> Parser {
        Parser::new(Memoized::new(Preserve {
            parser: self.parser.clone(),
            factory: Some(factory),
        }))
    }
}

impl fmt::Display for Preserve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_head(f, "preserve", &self.factory)?;
        write!(f, "{}]", self.parser)
    }
}

// Exact: a literal token
#[derive(Clone)]
pub struct Exact {
    token: String,
    length: usize,
    factory: Option<AttachmentFactory>,
}

impl Exact {
    /// An empty token always matches without consuming input.
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            length: token.chars().count(),
            token,
            factory: None,
        }
    }
}

impl Consumer for Exact {
    fn consume(&self, input: &Cursor, parent: &mut NodeBuilder) -> ParseResult {
        let matched = input.len() >= self.length
            && self
                .token
                .chars()
                .enumerate()
                .all(|(i, ch)| input.char_at(i) == Some(ch));
        if !matched {
            return Err(ParseError::mismatch(
                format!("Token mismatch ({})", self.token),
                input.start(),
            ));
        }

        let end = input.start() + self.length;
        let mut me = Node::builder()
            .span(input.start(), end)
            .value(self.token.clone());
        if let Some(factory) = &self.factory {
            me.set_attachment(factory.create(Some(&self.token), &[]));
        }
        parent.push(me.build());
        Ok(input.splice(end))
    }
}

impl Attachable for Exact {
    fn with_factory(&self, factory: AttachmentFactory) -> Parser {
        Parser::new(Exact {
            factory: Some(factory),
            ..self.clone()
        })
    }
}

impl fmt::Display for Exact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_head(f, "exact", &self.factory)?;
        write!(f, "\"{}\"]", self.token)
    }
}

// Matches: a run of characters accepted by a classifier
#[derive(Clone)]
pub struct Matches {
    min: usize,
    max: Option<usize>,
    class: CharClass,
    factory: Option<AttachmentFactory>,
}

impl Matches {
    pub fn new(min: usize, max: Option<usize>, class: CharClass) -> Self {
        Self {
            min,
            max,
            class,
            factory: None,
        }
    }
}

impl Consumer for Matches {
    fn consume(&self, input: &Cursor, parent: &mut NodeBuilder) -> ParseResult {
        let limit = self.max.map_or(input.len(), |max| max.min(input.len()));
        let count = (0..limit)
            .take_while(|&i| input.char_at(i).is_some_and(|ch| self.class.matches(ch)))
            .count();
        if count < self.min {
            return Err(ParseError::mismatch(
                format!("Match count out of bounds ({} < {})", count, self.min),
                input.start(),
            ));
        }

        let text = input.text(count);
        let end = input.start() + count;
        let mut me = Node::builder().span(input.start(), end);
        if let Some(factory) = &self.factory {
            me.set_attachment(factory.create(Some(&text), &[]));
        }
        me.set_value(Some(text));
        parent.push(me.build());
        Ok(input.splice(end))
    }
}

impl Attachable for Matches {
    fn with_factory(&self, factory: AttachmentFactory) -> Parser {
        Parser::new(Matches {
            factory: Some(factory),
            ..self.clone()
        })
    }
}

impl fmt::Display for Matches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_head(f, "matches", &self.factory)?;
        match self.max {
            Some(max) => write!(f, "{}, {}, {}]", self.min, max, self.class),
            None => write!(f, "{}, -1, {}]", self.min, self.class),
        }
    }
}

pub struct EndOfInput;

impl Consumer for EndOfInput {
    fn consume(&self, input: &Cursor, _parent: &mut NodeBuilder) -> ParseResult {
        if !input.is_empty() {
            return Err(ParseError::mismatch("End of input expected", input.start()));
        }
        Ok(input.clone())
    }
}

impl fmt::Display for EndOfInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("endOfInput")
    }
}

/// Consumes like the inner parser but drops everything it produced.
pub struct Skip {
    parser: Rule,
}

impl Skip {
    pub fn new(parser: Rule) -> Self {
        Self { parser }
    }
}

impl Consumer for Skip {
    fn consume(&self, input: &Cursor, _parent: &mut NodeBuilder) -> ParseResult {
        self.parser.consume(input, &mut NodeBuilder::new())
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ignore[{}]", self.parser)
    }
}

/// Turns recoverable failures of the inner parser into fatal ones.
pub struct Require {
    parser: Rule,
}

impl Require {
    pub fn new(parser: Rule) -> Self {
        Self { parser }
    }
}

impl Consumer for Require {
    fn consume(&self, input: &Cursor, parent: &mut NodeBuilder) -> ParseResult {
        self.parser
            .consume(input, parent)
            .map_err(ParseError::escalate)
    }
}

impl fmt::Display for Require {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "require[{}]", self.parser)
    }
}

/// Names the inner parser in failure contexts.
pub struct Group {
    name: String,
    parser: Rule,
}

impl Group {
    pub fn new(name: impl Into<String>, parser: Rule) -> Self {
        Self {
            name: name.into(),
            parser,
        }
    }
}

impl Consumer for Group {
    fn consume(&self, input: &Cursor, parent: &mut NodeBuilder) -> ParseResult {
        self.parser
            .consume(input, parent)
            .map_err(|error| error.with_context(&self.name))
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group[name=\"{}\", parser={}]", self.name, self.parser)
    }
}

/// Re-emits the single node of the inner parser with a translated value.
pub struct Replace {
    parser: Rule,
    translator: Translator,
}

impl Replace {
    pub fn new(parser: Rule, translator: Translator) -> Self {
        Self { parser, translator }
    }
}

impl Consumer for Replace {
    fn consume(&self, input: &Cursor, parent: &mut NodeBuilder) -> ParseResult {
        let mut inner = NodeBuilder::new();
        let rest = self.parser.consume(input, &mut inner)?;
        let [node] = inner.current_children() else {
            return Err(ParseError::inconsistent(
                format!(
                    "replace expects exactly one node, got {}",
                    inner.current_children().len()
                ),
                input.start(),
            ));
        };

        // valueless nodes are translated from their source text
        let source = match node.value() {
            Some(value) => value.to_string(),
            None => input.slice(input.start(), rest.start()),
        };
        let mut me = Node::builder()
            .span(input.start(), rest.start())
            .value(self.translator.translate(&source))
            .children(node.children().iter().cloned());
        me.set_attachment(node.attachment().cloned());
        parent.push(me.build());
        Ok(rest)
    }
}

impl fmt::Display for Replace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "replace[{}]", self.parser)
    }
}
