//! JSX Lexer
//!
//! First two stages of the compiler: a length-preserving comment stripper
//! and a character-state-machine tokenizer that splits script source into
//! plain code and element tokens.
//!
//! ```text
//! source → strip_comments() → Scanner::tokenize() → Vec<Token>
//! ```
//!
//! # Example
//!
//! ```
//! use jsx_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("return <br/>", 1000).unwrap();
//! assert_eq!(tokens[1].kind, TokenKind::ElementStart);
//! ```

pub mod directives;
pub mod location;
pub mod lookahead;
pub mod preprocess;
pub mod scanner;
pub mod token;

pub use directives::Directives;
pub use location::Location;
pub use preprocess::strip_comments;
pub use scanner::{is_spread_property, Scanner};
pub use token::{Token, TokenKind};

/// Default ceiling for recursive element scans and parser walks.
pub const DEFAULT_MAX_RECURSION_CALLS: usize = 1000;

/// Default component substituted for the empty tag name of `<>`.
pub const DEFAULT_FRAGMENT_IDENTIFIER: &str = "React.Fragment";

/// Lexer error. Malformed-markup variants carry the source location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("Lexer error at {location}: unhandled character in element properties `{value}`")]
    UnhandledProperty { value: String, location: Location },

    #[error("Lexer error at {location}: found a `/` in element `{value}` that is not part of `/>`")]
    MalformedElement { value: String, location: Location },

    #[error("Lexer error: endless loop detected after {iterations} iterations")]
    EndlessLoop { iterations: usize },

    #[error(
        "Lexer error: call count exceeded the limit of {limit}; \
         raise `max_recursion_calls` if the source is large but valid"
    )]
    LimitExceeded { limit: usize },
}

impl LexerError {
    /// Source location of the error, when one is known.
    pub fn location(&self) -> Option<&Location> {
        match self {
            LexerError::UnhandledProperty { location, .. }
            | LexerError::MalformedElement { location, .. } => Some(location),
            LexerError::EndlessLoop { .. } | LexerError::LimitExceeded { .. } => None,
        }
    }
}
