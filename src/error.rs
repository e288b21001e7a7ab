//! # Error Types
//!
//! Parsing distinguishes three kinds of failure:
//!
//! * **Recoverable** failures ([`ParseError::Mismatch`], [`ParseError::NoAlternative`],
//!   [`ParseError::RemainingInput`]) mean "this production does not match here".
//!   Ordered choice tries its next branch and repetition stops on them.
//! * **Fatal** failures ([`ParseError::Fatal`]) mean the grammar committed to a
//!   production and it failed afterwards. Nothing backtracks past them.
//! * **Inconsistencies** ([`ParseError::Inconsistent`]) are bugs in a grammar or
//!   in the memoization substrate. They abort the parse like fatal failures.

use thiserror::Error;

/// Error type for parsing operations.
///
/// Every variant carries the input offset where it was raised and an optional
/// context chain built by [`ParseError::with_context`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A token, classifier or bound did not match
    #[error("Mismatch: {message} at position {position}, context: {context:?}")]
    Mismatch {
        message: String,
        position: usize,
        context: Option<String>,
    },
    /// No branch of an ordered choice matched
    #[error("No alternative matched at position {position}, context: {context:?}")]
    NoAlternative {
        position: usize,
        context: Option<String>,
    },
    /// The root consumer succeeded without consuming the whole input
    #[error("Remaining characters: \"{remaining}\" at position {position}, context: {context:?}")]
    RemainingInput {
        remaining: String,
        position: usize,
        context: Option<String>,
    },
    /// A committed production failed
    #[error("Fatal: {message} at position {position}, context: {context:?}")]
    Fatal {
        message: String,
        position: usize,
        context: Option<String>,
        cause: Option<Box<ParseError>>,
    },
    /// Internal consistency violation
    #[error("Inconsistent: {message} at position {position}")]
    Inconsistent { message: String, position: usize },
}

impl ParseError {
    pub fn mismatch(message: impl Into<String>, position: usize) -> Self {
        ParseError::Mismatch {
            message: message.into(),
            position,
            context: None,
        }
    }

    pub fn no_alternative(position: usize) -> Self {
        ParseError::NoAlternative {
            position,
            context: None,
        }
    }

    pub fn inconsistent(message: impl Into<String>, position: usize) -> Self {
        ParseError::Inconsistent {
            message: message.into(),
            position,
        }
    }

    /// Prepends `ctx` to the context chain.
    ///
    /// Inconsistencies carry no context and are returned unchanged.
    pub fn with_context(self, ctx: &str) -> Self {
        let chain = |context: Option<String>| match context {
            Some(c) => Some(format!("{} -> {}", ctx, c)),
            None => Some(ctx.to_string()),
        };
        match self {
            ParseError::Mismatch {
                message,
                position,
                context,
            } => ParseError::Mismatch {
                message,
                position,
                context: chain(context),
            },
            ParseError::NoAlternative { position, context } => ParseError::NoAlternative {
                position,
                context: chain(context),
            },
            ParseError::RemainingInput {
                remaining,
                position,
                context,
            } => ParseError::RemainingInput {
                remaining,
                position,
                context: chain(context),
            },
            ParseError::Fatal {
                message,
                position,
                context,
                cause,
            } => ParseError::Fatal {
                message,
                position,
                context: chain(context),
                cause,
            },
            inconsistent @ ParseError::Inconsistent { .. } => inconsistent,
        }
    }

    /// Turns a recoverable failure into a fatal one that keeps it as cause.
    ///
    /// Fatal failures and inconsistencies are returned unchanged.
    pub fn escalate(self) -> Self {
        if !self.is_recoverable() {
            return self;
        }
        ParseError::Fatal {
            message: self.message(),
            position: self.position(),
            context: self.context().map(str::to_string),
            cause: Some(Box::new(self)),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ParseError::Mismatch { .. }
                | ParseError::NoAlternative { .. }
                | ParseError::RemainingInput { .. }
        )
    }

    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    pub fn position(&self) -> usize {
        match self {
            ParseError::Mismatch { position, .. } => *position,
            ParseError::NoAlternative { position, .. } => *position,
            ParseError::RemainingInput { position, .. } => *position,
            ParseError::Fatal { position, .. } => *position,
            ParseError::Inconsistent { position, .. } => *position,
        }
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            ParseError::Mismatch { context, .. }
            | ParseError::NoAlternative { context, .. }
            | ParseError::RemainingInput { context, .. }
            | ParseError::Fatal { context, .. } => context.as_deref(),
            ParseError::Inconsistent { .. } => None,
        }
    }

    /// The human-readable message without position and context.
    pub fn message(&self) -> String {
        match self {
            ParseError::Mismatch { message, .. } => message.clone(),
            ParseError::NoAlternative { .. } => "No matching alternative".to_string(),
            ParseError::RemainingInput { remaining, .. } => {
                format!("Remaining characters: {}", remaining)
            }
            ParseError::Fatal { message, .. } => message.clone(),
            ParseError::Inconsistent { message, .. } => message.clone(),
        }
    }
}

/// Errors raised while building or extending a [`Path`](crate::matcher::Path).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Broken path: a path needs at least one node")]
    Empty,
    #[error("Broken path: node {index} is not a child of its predecessor")]
    Broken { index: usize },
    #[error("Provided node is not a child of the last node in the path")]
    NotAChild,
}

/// Errors raised while loading a [`ParserConfig`](crate::config::ParserConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to open config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Path error: {0}")]
    Path(#[from] PathError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Match failed: {0}")]
    Unmatched(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_chain() {
        let err = ParseError::mismatch("Token mismatch (a)", 3)
            .with_context("inner")
            .with_context("outer");
        assert_eq!(err.context(), Some("outer -> inner"));
        assert_eq!(err.position(), 3);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_escalate() {
        let err = ParseError::no_alternative(7).escalate();
        match &err {
            ParseError::Fatal {
                position, cause, ..
            } => {
                assert_eq!(*position, 7);
                assert_eq!(cause.as_deref(), Some(&ParseError::no_alternative(7)));
            }
            other => panic!("expected fatal, got {:?}", other),
        }
        assert!(err.is_fatal());

        // escalating twice keeps the first escalation
        assert_eq!(err.clone().escalate(), err);

        let named = ParseError::mismatch("Token mismatch (x)", 2).with_context("name");
        assert_eq!(named.escalate().context(), Some("name"));
    }

    #[test]
    fn test_inconsistent_ignores_context() {
        let err = ParseError::inconsistent("bad memo", 0);
        assert_eq!(err.clone().with_context("group"), err);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_path_error_display() {
        assert_eq!(
            PathError::Broken { index: 2 }.to_string(),
            "Broken path: node 2 is not a child of its predecessor"
        );
    }
}
