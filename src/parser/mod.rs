//! # Parser-Combinator Engine
//!
//! Grammars are built at run time by composing [`Consumer`]s with the
//! functions in [`prelude`]. Every composite parser memoizes its result per
//! input offset (packrat parsing), so shared and recursive rules are matched
//! at most once per position.
//!
//! ```ignore
//! use jamon::chars;
//! use jamon::parser::{parse, prelude::*};
//!
//! let number = matches1(chars::digit()).attach("number");
//! let list = lbetween("[", delimited_by(0, strip(&number), ","), "]");
//! let tree = parse(&list, "[1, 2, 3]")?;
//! assert_eq!(tree.children().len(), 3);
//! ```

pub mod combinators;
pub mod core;
pub mod prelude;

pub use self::core::{Attachable, Consumer, ParseResult, Parser, Reference, Rule};

use std::rc::Rc;

use crate::config::ParserConfig;
use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::node::{Node, NodeBuilder};

/// Builds an array of [`Rule`]s from consumers of different types.
///
/// ```ignore
/// let call = sequence(rules![&name, skip_token("("), &args, skip_token(")")]);
/// ```
#[macro_export]
macro_rules! rules {
    ($($rule:expr),* $(,)?) => {
        [$($crate::parser::Rule::from($rule)),*]
    };
}

/// Parses all of `text` and returns the node the consumer produced.
pub fn parse<C: Consumer + ?Sized>(consumer: &C, text: &str) -> ParseResult<Rc<Node>> {
    parse_with(&ParserConfig::default(), consumer, text)
}

/// Parses a prefix of `text`, ignoring whatever the consumer left behind.
pub fn sloppy_parse<C: Consumer + ?Sized>(consumer: &C, text: &str) -> ParseResult<Rc<Node>> {
    parse_with(&ParserConfig::sloppy(), consumer, text)
}

pub fn parse_with<C: Consumer + ?Sized>(
    config: &ParserConfig,
    consumer: &C,
    text: &str,
) -> ParseResult<Rc<Node>> {
    tracing::debug!(target: "jamon::parse", length = text.len(), "parse started");
    let input = Cursor::with_capacity(text, config.memo_capacity);
    let mut root = NodeBuilder::new();

    let remaining = consumer.consume(&input, &mut root).map_err(|error| {
        if error.is_fatal() {
            tracing::warn!(target: "jamon::parse", %error, "parse aborted");
        }
        error
    })?;

    if config.require_complete_input && !remaining.is_empty() {
        return Err(ParseError::RemainingInput {
            remaining: remaining.preview(config.error_preview_chars),
            position: remaining.start(),
            context: None,
        });
    }

    tracing::debug!(
        target: "jamon::parse",
        consumed = remaining.start(),
        memo_entries = input.memo_len(),
        memo_hits = input.memo_hits(),
        "parse finished"
    );
    root.build()
        .first_child()
        .cloned()
        .ok_or_else(|| ParseError::mismatch("No node produced", remaining.start()))
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use super::*;
    use crate::chars;

    #[test]
    fn test_remaining_input() {
        let digits = matches1(chars::digit());
        match parse(&digits, "12ab") {
            Err(ParseError::RemainingInput {
                remaining,
                position,
                ..
            }) => {
                assert_eq!(remaining, "ab");
                assert_eq!(position, 2);
            }
            other => panic!("expected remaining input, got {:?}", other),
        }
        assert_eq!(sloppy_parse(&digits, "12ab").unwrap().value(), Some("12"));
    }

    #[test]
    fn test_remaining_preview_is_limited() {
        let config = ParserConfig {
            error_preview_chars: 3,
            ..ParserConfig::default()
        };
        let error = parse_with(&config, &exact("a"), "abcdefgh").unwrap_err();
        assert!(matches!(error, ParseError::RemainingInput { ref remaining, .. } if remaining == "bcd"));
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_no_node_produced() {
        assert!(matches!(
            parse(&skip_token("a"), "a"),
            Err(ParseError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let expr = reference();
        let atom = lalternative(rules![
            matches1(chars::digit()),
            between("(", &expr, ")")
        ]);
        let sum = delimited_by(1, &atom, "+");
        expr.set_target(&sum);

        let first = parse(&expr, "1+(2+3)+4").unwrap();
        let second = parse(&expr, "1+(2+3)+4").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_through_dyn_consumer() {
        let rule: Rule = exact("a").into();
        let consumer: &dyn Consumer = &rule;
        assert!(parse(consumer, "a").is_ok());
    }
}
