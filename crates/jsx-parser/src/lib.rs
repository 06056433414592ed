//! JSX Parser
//!
//! Turns the scanner's flat token sequence into a [`Program`]: plain code
//! passes through as opaque [`RawCode`] leaves, and each element becomes an
//! [`Element`] carrying its properties and children.
//!
//! Plain-code regions are never parsed, so open/close balance can only be
//! checked once over the whole token stream.

pub mod ast;
pub mod parser;

pub use ast::{Child, Element, FragmentPart, Node, Program, Property, PropertyValue, RawCode};
pub use parser::Parser;

use jsx_lexer::{Location, TokenKind};

/// Parser error. Token-level variants carry the token index and source location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(
        "Parse error at {location}: closing element `</{found}>` does not match \
         opening element `<{expected}>` (token #{index})"
    )]
    MismatchedCloseTag {
        expected: String,
        found: String,
        index: usize,
        location: Location,
    },

    #[error("Parse error at {location}: tokens are out of order, found {kind:?} (token #{index})")]
    UnexpectedToken {
        kind: TokenKind,
        index: usize,
        location: Location,
    },

    #[error(
        "Parse error at {location}: unexpected {kind:?} in a braced expression \
         holding elements (token #{index})"
    )]
    UnexpectedPropertyToken {
        kind: TokenKind,
        index: usize,
        location: Location,
    },

    #[error("Parse error at {location}: braced expression containing elements is never closed")]
    UnterminatedProperty { location: Location },

    #[error(
        "Parse error: the number of opening elements ({starts}) does not match \
         the number of closing elements ({ends})"
    )]
    UnbalancedElements { starts: usize, ends: usize },

    #[error(
        "Parse error: call count exceeded the limit of {limit}; \
         raise `max_recursion_calls` if the source is large but valid"
    )]
    LimitExceeded { limit: usize },
}

impl ParseError {
    /// Source location of the error, when one is known.
    pub fn location(&self) -> Option<&Location> {
        match self {
            ParseError::MismatchedCloseTag { location, .. }
            | ParseError::UnexpectedToken { location, .. }
            | ParseError::UnexpectedPropertyToken { location, .. }
            | ParseError::UnterminatedProperty { location } => Some(location),
            ParseError::UnbalancedElements { .. } | ParseError::LimitExceeded { .. } => None,
        }
    }
}
