//! Grammar construction functions.
//!
//! Functions returning [`Parser`] produce a node of their own and accept
//! attachments; functions returning [`Rule`] only gate or reshape input.
//! Names prefixed with `l` lift their result into the enclosing node.

use super::combinators::*;
use super::core::{Parser, Reference, Rule};
use crate::chars::{self, CharClass};
use crate::node::Translator;

fn collect<I>(parsers: I) -> Vec<Rule>
where
    I: IntoIterator,
    I::Item: Into<Rule>,
{
    parsers.into_iter().map(Into::into).collect()
}

/// Matches `token` literally.
pub fn exact(token: &str) -> Parser {
    Parser::new(Exact::new(token))
}

/// Matches the first of `tokens` that matches, in the order given.
///
/// # Panics
///
/// Panics if `tokens` is empty.
pub fn one_of(tokens: &[&str]) -> Parser {
    lalternative(tokens.iter().map(|token| exact(token)))
}

/// Greedily matches between `min` and `max` characters accepted by `class`.
pub fn matches(min: usize, max: Option<usize>, class: CharClass) -> Parser {
    Parser::new(Matches::new(min, max, class))
}

pub fn matches1(class: CharClass) -> Parser {
    matches(1, None, class)
}

pub fn matches_min(min: usize, class: CharClass) -> Parser {
    matches(min, None, class)
}

pub fn matches_chars(min: usize, max: Option<usize>, chars: &[char]) -> Parser {
    matches(min, max, chars::one_of_chars(chars))
}

pub fn sequence<I>(parsers: I) -> Parser
where
    I: IntoIterator,
    I::Item: Into<Rule>,
{
    Parser::new(Memoized::new(Sequence::new(collect(parsers))))
}

pub fn lsequence<I>(parsers: I) -> Parser
where
    I: IntoIterator,
    I::Item: Into<Rule>,
{
    lift(sequence(parsers))
}

/// Ordered choice.
///
/// # Panics
///
/// Panics if `parsers` is empty.
pub fn alternative<I>(parsers: I) -> Parser
where
    I: IntoIterator,
    I::Item: Into<Rule>,
{
    Parser::new(Memoized::new(Alternative::new(collect(parsers))))
}

pub fn lalternative<I>(parsers: I) -> Parser
where
    I: IntoIterator,
    I::Item: Into<Rule>,
{
    lift(alternative(parsers))
}

/// Repeats `parser` between `min` and `max` times; `max: None` is unbounded.
pub fn repeat(min: usize, max: Option<usize>, parser: impl Into<Rule>) -> Parser {
    Parser::new(Memoized::new(Repeat::new(min, max, parser.into())))
}

pub fn repeat0(parser: impl Into<Rule>) -> Parser {
    repeat(0, None, parser)
}

pub fn repeat_min(min: usize, parser: impl Into<Rule>) -> Parser {
    repeat(min, None, parser)
}

pub fn lrepeat(min: usize, max: Option<usize>, parser: impl Into<Rule>) -> Parser {
    lift(repeat(min, max, parser))
}

pub fn lrepeat0(parser: impl Into<Rule>) -> Parser {
    lift(repeat0(parser))
}

pub fn optional(parser: impl Into<Rule>) -> Parser {
    repeat(0, Some(1), parser)
}

pub fn loptional(parser: impl Into<Rule>) -> Parser {
    lift(optional(parser))
}

/// Replaces the node of `parser` by its children.
///
/// Attaching to a lift recomputes the attachment of every lifted node from
/// that node's own value and children.
pub fn lift(parser: impl Into<Rule>) -> Parser {
    Parser::new(Memoized::new(Lift::new(parser.into())))
}

/// Collapses the subtree of `parser` into one node holding all its values.
pub fn join(parser: impl Into<Rule>) -> Parser {
    join_with(parser, "")
}

pub fn join_with(parser: impl Into<Rule>, joint: &str) -> Parser {
    Parser::new(Memoized::new(Join::new(parser.into(), joint)))
}

/// Runs `parser` and keeps its node without consuming input.
pub fn preserve(parser: impl Into<Rule>) -> Parser {
    Parser::new(Memoized::new(Preserve::new(parser.into())))
}

/// Lookahead: succeeds where `parser` does, producing and consuming nothing.
pub fn peek(parser: impl Into<Rule>) -> Rule {
    skip(preserve(parser))
}

pub fn skip(parser: impl Into<Rule>) -> Rule {
    Rule::new(Skip::new(parser.into()))
}

pub fn skip_token(token: &str) -> Rule {
    skip(exact(token))
}

pub fn skip_class(class: CharClass) -> Rule {
    skip(matches1(class))
}

/// Skips any run, possibly empty, of characters accepted by `class`.
pub fn ignore(class: CharClass) -> Rule {
    skip(matches(0, None, class))
}

/// `parser` surrounded by optional non-newline whitespace.
pub fn strip(parser: impl Into<Rule>) -> Parser {
    strip_with(parser, chars::white())
}

pub fn strip_with(parser: impl Into<Rule>, class: CharClass) -> Parser {
    lsequence([ignore(class.clone()), parser.into(), ignore(class)])
}

/// Makes every recoverable failure of `parser` fatal.
pub fn require(parser: impl Into<Rule>) -> Rule {
    Rule::new(Require::new(parser.into()))
}

pub fn group(name: &str, parser: impl Into<Rule>) -> Rule {
    Rule::new(Group::new(name, parser.into()))
}

pub fn end_of_input() -> Rule {
    Rule::new(EndOfInput)
}

/// `parser` followed by the end of input.
pub fn terminal(parser: impl Into<Rule>) -> Parser {
    let parser: Rule = parser.into();
    lsequence([parser, end_of_input()])
}

pub fn reference() -> Reference {
    Reference::new()
}

/// Replaces the value of the single node `parser` produces with `replacement`.
pub fn replace(parser: impl Into<Rule>, replacement: &str) -> Rule {
    replace_with(parser, Translator::constant(replacement))
}

pub fn replace_with(parser: impl Into<Rule>, translator: Translator) -> Rule {
    Rule::new(Replace::new(parser.into(), translator))
}

/// `item` between the literal delimiters `left` and `right`.
pub fn between(left: &str, item: impl Into<Rule>, right: &str) -> Parser {
    sequence([skip_token(left), item.into(), skip_token(right)])
}

pub fn lbetween(left: &str, item: impl Into<Rule>, right: &str) -> Parser {
    sequence([skip_token(left), lift(item).into(), skip_token(right)])
}

/// At least `min` occurrences of `item`, separated by `delimiter`.
pub fn delimited_sequence(
    min: usize,
    item: impl Into<Rule>,
    delimiter: impl Into<Rule>,
) -> Parser {
    let item = item.into();
    let delimiter = delimiter.into();
    let tail = lsequence([delimiter, item.clone()]);
    if min == 0 {
        return sequence([loptional(lsequence([item, lrepeat0(tail).into()]))]);
    }
    sequence([item, lrepeat(min - 1, None, tail).into()])
}

pub fn delimited_by(min: usize, item: impl Into<Rule>, token: &str) -> Parser {
    delimited_sequence(min, item, skip_token(token))
}
