//! Abstract Syntax Tree for compiled source.
//!
//! Three node kinds: the [`Program`] root, opaque [`RawCode`] and
//! [`Element`]. Everything derives `Serialize` so the tree can be dumped
//! for inspection.

use serde::Serialize;

/// Root of one compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub body: Vec<Node>,
}

/// A top-level node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "node", rename_all = "snake_case")]
pub enum Node {
    Code(RawCode),
    Element(Element),
}

/// Script text copied through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawCode {
    pub text: String,
    /// Char offset in the source.
    pub offset: usize,
    pub depth: usize,
}

/// A markup element, compiled into one factory call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    /// Tag name; the fragment identifier for `<>`.
    pub name: String,
    /// Capitalized or dotted names are emitted as expressions, not strings.
    pub is_component: bool,
    pub props: Vec<Property>,
    pub children: Vec<Child>,
    /// Number of enclosing elements, used for output indentation.
    pub depth: usize,
    pub offset: usize,
}

impl Element {
    /// Whether `name` refers to a component rather than an intrinsic tag.
    pub fn is_component_name(name: &str) -> bool {
        name.starts_with(|c: char| c.is_ascii_uppercase()) || name.contains('.')
    }
}

/// An element property. A missing value means boolean `true`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub value: Option<PropertyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// A quoted literal (already escaped) or braced code.
    Code(RawCode),
    /// `x={<B/>}`
    Element(Box<Element>),
    /// Braced code interleaved with elements, e.g. `x={c ? <B/> : <C/>}`.
    Fragment(Vec<FragmentPart>),
}

/// One piece of a braced region that holds elements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FragmentPart {
    Code(RawCode),
    Element(Element),
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Child {
    /// Literal text, untrimmed.
    Text(String),
    /// Braced code with the braces and surrounding whitespace removed.
    Code(String),
    Whitespace(String),
    Element(Element),
    /// One braced region interleaving code with elements, e.g.
    /// `{items.map(i => <li>{i}</li>)}`. Always a single argument.
    Expression(Vec<FragmentPart>),
}

impl Child {
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Child::Whitespace(_))
    }
}
