use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

use crate::error::ConfigError;

/// Settings for a top-level parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Fail with a recoverable error if the root consumer leaves input behind.
    #[serde(default = "default_true")]
    pub require_complete_input: bool,

    /// Initial capacity of the packrat memo table.
    #[serde(default = "default_memo_capacity")]
    pub memo_capacity: usize,

    /// Number of characters of remaining input quoted in diagnostics.
    #[serde(default = "default_error_preview_chars")]
    pub error_preview_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            require_complete_input: default_true(),
            memo_capacity: default_memo_capacity(),
            error_preview_chars: default_error_preview_chars(),
        }
    }
}

impl ParserConfig {
    /// The configuration used by [`sloppy_parse`](crate::parser::sloppy_parse).
    pub fn sloppy() -> Self {
        Self {
            require_complete_input: false,
            ..Self::default()
        }
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> Result<T, ConfigError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, ConfigError> {
    let config = serde_json::from_str(s)?;
    Ok(config)
}

fn default_true() -> bool {
    true
}
fn default_memo_capacity() -> usize {
    64
}
fn default_error_preview_chars() -> usize {
    16
}
