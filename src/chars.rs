//! # Character Classifiers
//!
//! Pure predicates over a single character, used by the `matches` family of
//! parsers. Classifiers compose with [`not`], [`and`] and [`or`].
//!
//! ```ignore
//! use jamon::chars;
//!
//! let hex = chars::digit_radix(16);
//! let word = chars::or(vec![chars::letter(), chars::one_of_chars(&['_', '-'])]);
//! assert!(hex.matches('f'));
//! assert!(!word.matches(' '));
//! ```

use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CharClass {
    Letter,
    /// Whitespace other than line terminators
    White,
    Newline,
    IdentifierStart,
    IdentifierPart,
    Upper,
    Lower,
    /// ASCII decimal digit
    Digit,
    DigitRadix(u32),
    Control,
    Set(BTreeSet<char>),
    Not(Box<CharClass>),
    And(Vec<CharClass>),
    Or(Vec<CharClass>),
}

impl CharClass {
    pub fn matches(&self, ch: char) -> bool {
        match self {
            CharClass::Letter => ch.is_alphabetic(),
            CharClass::White => ch.is_whitespace() && ch != '\n' && ch != '\r',
            CharClass::Newline => ch == '\n' || ch == '\r',
            CharClass::IdentifierStart => ch.is_alphabetic() || ch == '_' || ch == '$',
            CharClass::IdentifierPart => ch.is_alphanumeric() || ch == '_' || ch == '$',
            CharClass::Upper => ch.is_uppercase(),
            CharClass::Lower => ch.is_lowercase(),
            CharClass::Digit => ch.is_ascii_digit(),
            CharClass::DigitRadix(radix) => {
                (2..=36).contains(radix) && ch.to_digit(*radix).is_some()
            }
            CharClass::Control => ch.is_control(),
            CharClass::Set(set) => set.contains(&ch),
            CharClass::Not(inner) => !inner.matches(ch),
            CharClass::And(all) => all.iter().all(|c| c.matches(ch)),
            CharClass::Or(any) => any.iter().any(|c| c.matches(ch)),
        }
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharClass::Letter => f.write_str("match[alpha]"),
            CharClass::White => f.write_str("match[white]"),
            CharClass::Newline => f.write_str("match[newline]"),
            CharClass::IdentifierStart => f.write_str("match[identifierStart]"),
            CharClass::IdentifierPart => f.write_str("match[identifierPart]"),
            CharClass::Upper => f.write_str("match[uppercase]"),
            CharClass::Lower => f.write_str("match[lowercase]"),
            CharClass::Digit => f.write_str("match[digits]"),
            CharClass::DigitRadix(radix) => write!(f, "match[digits of base {}]", radix),
            CharClass::Control => f.write_str("match[control]"),
            CharClass::Set(set) => write!(f, "match[{:?}]", set),
            CharClass::Not(inner) => write!(f, "not({})", inner),
            CharClass::And(all) => write_list(f, "and", all),
            CharClass::Or(any) => write_list(f, "or", any),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, items: &[CharClass]) -> fmt::Result {
    write!(f, "{}([", name)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("])")
}

pub fn letter() -> CharClass {
    CharClass::Letter
}

/// Whitespace that does not end a line.
pub fn white() -> CharClass {
    CharClass::White
}

/// `\r` or `\n`.
pub fn newline() -> CharClass {
    CharClass::Newline
}

pub fn identifier_start() -> CharClass {
    CharClass::IdentifierStart
}

pub fn identifier_part() -> CharClass {
    CharClass::IdentifierPart
}

pub fn upper() -> CharClass {
    CharClass::Upper
}

pub fn lower() -> CharClass {
    CharClass::Lower
}

/// ASCII decimal digits `0-9` only; other Unicode decimal digits do not match.
pub fn digit() -> CharClass {
    CharClass::Digit
}

/// ASCII digits and letters valid in `radix` (see [`char::to_digit`]).
/// Radixes outside `2..=36` match nothing.
pub fn digit_radix(radix: u32) -> CharClass {
    CharClass::DigitRadix(radix)
}

pub fn control() -> CharClass {
    CharClass::Control
}

pub fn one_of_chars(chars: &[char]) -> CharClass {
    CharClass::Set(chars.iter().copied().collect())
}

pub fn none_of(chars: &[char]) -> CharClass {
    not(one_of_chars(chars))
}

pub fn not(class: CharClass) -> CharClass {
    CharClass::Not(Box::new(class))
}

/// Conjunction; `and(vec![])` accepts every character.
pub fn and(classes: Vec<CharClass>) -> CharClass {
    CharClass::And(classes)
}

/// Disjunction; `or(vec![])` accepts no character.
pub fn or(classes: Vec<CharClass>) -> CharClass {
    CharClass::Or(classes)
}
