//! # JAMON: Run-Time Parser Combinators
//!
//! JAMON builds parsers by composing small consumers at run time and verifies
//! the resulting trees with declarative matchers.
//!
//! ## Technical Foundations
//!
//! ### 1. Packrat Parsing
//! Every composite parser remembers its result per input offset, so shared and
//! recursive rules run in bounded time:
//! - Parse position and memo table ([`cursor`])
//! - Result tree ([`node`])
//!
//! ### 2. Consumer Algebra
//! Grammars are values assembled from combinators:
//! - Traits and handles ([`parser::core`])
//! - Combinators ([`parser::combinators`])
//! - Construction functions ([`parser::prelude`])
//! - Character classifiers ([`chars`])
//!
//! ### 3. Tree Verification
//! Parse trees are checked against structural predicates evaluated in the
//! context of their ancestors:
//! - Paths, matchers and traversal ([`matcher`])
//!
//! ## Processing Pipeline
//!
//! ```text
//! Grammar (Rule) + Text → Cursor → Consumers → Node tree → NodeMatcher checks
//! ```
//!
//! Failures are reported through [`error::ParseError`]: recoverable mismatches
//! drive backtracking, fatal failures abort the parse.

pub mod chars;
pub mod config;
pub mod cursor;
pub mod error;
pub mod matcher;
pub mod node;
pub mod parser;

// Re-exports
pub use config::ParserConfig;
pub use error::{Error, ParseError, PathError, Result};
pub use node::{Attachment, AttachmentFactory, Node, NodeBuilder, Span, Translator};
pub use parser::{parse, parse_with, sloppy_parse, Attachable, Consumer, Parser, Reference, Rule};
