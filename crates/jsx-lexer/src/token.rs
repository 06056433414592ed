use serde::Serialize;

/// Token classification.
///
/// Plain code outside of markup is a single `Code` token per region; every
/// other kind only appears between an `ElementStart` and its `ElementEnd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Script text copied through verbatim.
    Code,
    /// Opening tag text, e.g. `<div` or `<Foo>` or `<>`.
    ElementStart,
    /// Closing tag text, e.g. `</div>` or `/>`.
    ElementEnd,
    PropName,
    /// Quoted (already JSON-escaped) or braced property value.
    PropValue,
    ChildText,
    ChildCode,
    ChildWhitespace,
    /// Code that precedes the first nested element of a braced region,
    /// either a property value or a child expression.
    FragmentStart,
    /// Code that follows the last nested element of a braced region.
    FragmentEnd,
}

/// A token produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Char offset of the token in the source.
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
        }
    }
}

/// Strip the first `<`, `/` and `>` from raw tag text, leaving the tag name.
///
/// `<div` → `div`, `</div>` → `div`, `/>` → ``, `<>` → ``.
pub fn tag_name(text: &str) -> String {
    text.replacen('<', "", 1)
        .replacen('/', "", 1)
        .replacen('>', "", 1)
}
