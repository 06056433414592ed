//! JSX Code Generator
//!
//! Final stage of the compiler plus the facade that sequences all stages.
//!
//! ```text
//! source → strip_comments() → Scanner::tokenize() → Parser::parse() → Generator::generate() → String
//! ```
//!
//! # Example
//!
//! ```
//! use jsx_codegen::{CompileOptions, Compiler};
//!
//! let compiler = Compiler::new(CompileOptions::default());
//! let js = compiler.compile_to_string("return <div>text</div>").unwrap();
//! assert_eq!(js, r#"return React.createElement("div", null, "text")"#);
//! ```

pub mod component;
pub mod compiler;
pub mod entities;
pub mod generate;
pub mod options;

pub use component::{ComponentError, Evaluator};
pub use compiler::{compile, is_already_compiled, Compiler};
pub use generate::Generator;
pub use jsx_lexer::{DEFAULT_FRAGMENT_IDENTIFIER, DEFAULT_MAX_RECURSION_CALLS};
pub use options::CompileOptions;

use jsx_lexer::{LexerError, Location};
use jsx_parser::ParseError;

/// Any error raised while compiling one source text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lexer(#[from] LexerError),

    #[error(transparent)]
    Parser(#[from] ParseError),
}

impl CompileError {
    /// Source location of the error, when one is known.
    pub fn location(&self) -> Option<&Location> {
        match self {
            CompileError::Lexer(e) => e.location(),
            CompileError::Parser(e) => e.location(),
        }
    }
}
