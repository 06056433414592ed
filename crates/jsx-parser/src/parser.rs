//! Token-stream parser.
//!
//! A single forward pass with no backtracking and no native recursion: open
//! elements live on an explicit stack, so nesting depth is bounded only by
//! the call ceiling. A braced region that interleaves code with elements,
//! whether a property value or a child expression, is collected as a list of
//! [`FragmentPart`]s on the element that owns it.

use crate::ast::{Child, Element, FragmentPart, Node, Program, Property, PropertyValue, RawCode};
use crate::ParseError;
use jsx_lexer::token::tag_name;
use jsx_lexer::{
    Location, Token, TokenKind, DEFAULT_FRAGMENT_IDENTIFIER, DEFAULT_MAX_RECURSION_CALLS,
};
use tracing::trace;

/// An element whose start token has been consumed.
struct OpenElement {
    element: Element,
    /// Property waiting for the element that follows it as its value.
    pending: Option<String>,
    region: Option<OpenRegion>,
}

/// A braced region of the innermost open element that holds elements.
struct OpenRegion {
    /// Property the region is the value of; `None` for a child expression.
    property: Option<String>,
    parts: Vec<FragmentPart>,
    /// Depth of the region's code; its elements sit one level deeper.
    depth: usize,
    /// Token index of the region's `FragmentStart`.
    start: usize,
}

/// Token-stream parser.
///
/// Holds the per-compilation counters: calls (checked against the ceiling)
/// and element start/end totals (checked once at the end).
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
    fragment: String,
    calls: usize,
    max_calls: usize,
    starts: usize,
    ends: usize,
    body: Vec<Node>,
    stack: Vec<OpenElement>,
}

impl<'a> Parser<'a> {
    /// Create a parser. `source` is only used to resolve error locations.
    pub fn new(tokens: Vec<Token>, source: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            fragment: String::from(DEFAULT_FRAGMENT_IDENTIFIER),
            calls: 0,
            max_calls: DEFAULT_MAX_RECURSION_CALLS,
            starts: 0,
            ends: 0,
            body: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Identifier substituted for the empty tag name of `<>`.
    pub fn fragment_identifier(mut self, name: impl Into<String>) -> Self {
        self.fragment = name.into();
        self
    }

    pub fn max_recursion_calls(mut self, limit: usize) -> Self {
        self.max_calls = limit;
        self
    }

    /// Parse the full token stream into a program.
    pub fn parse(mut self) -> Result<Program, ParseError> {
        while self.pos < self.tokens.len() {
            let index = self.pos;
            self.pos += 1;

            let in_region = self.stack.last().map(|open| open.region.is_some());
            match in_region {
                None => self.top_level_token(index)?,
                Some(false) => self.element_token(index)?,
                Some(true) => self.region_token(index)?,
            }
        }

        if let Some(start) = self
            .stack
            .iter()
            .rev()
            .find_map(|open| open.region.as_ref().map(|region| region.start))
        {
            return Err(ParseError::UnterminatedProperty {
                location: self.locate(start),
            });
        }

        if self.starts != self.ends {
            return Err(ParseError::UnbalancedElements {
                starts: self.starts,
                ends: self.ends,
            });
        }

        Ok(Program { body: self.body })
    }

    // =========================================================================
    // Token dispatch
    // =========================================================================

    /// A token outside every element.
    fn top_level_token(&mut self, index: usize) -> Result<(), ParseError> {
        match self.tokens[index].kind {
            TokenKind::Code => {
                self.enter()?;
                let code = self.raw_code(index, 0);
                self.body.push(Node::Code(code));
                Ok(())
            }
            TokenKind::ElementStart => self.open_element(index, 0),
            kind => Err(self.unexpected(kind, index)),
        }
    }

    /// A token directly inside the innermost open element.
    fn element_token(&mut self, index: usize) -> Result<(), ParseError> {
        let kind = self.tokens[index].kind;
        let Some(open) = self.stack.last_mut() else {
            return Err(self.unexpected(kind, index));
        };
        let depth = open.element.depth;

        match kind {
            TokenKind::ElementStart => return self.open_element(index, depth + 1),
            TokenKind::PropName => {
                let name = std::mem::take(&mut self.tokens[index].text);
                return self.property(name, depth);
            }
            TokenKind::ChildCode => {
                let code = strip_braces(self.tokens[index].text.trim());
                if !code.is_empty() {
                    let code = code.to_string();
                    open.element.children.push(Child::Code(code));
                }
            }
            TokenKind::ChildText => {
                let text = std::mem::take(&mut self.tokens[index].text);
                if !text.trim().is_empty() {
                    open.element.children.push(Child::Text(text));
                }
            }
            TokenKind::ChildWhitespace => {
                let space = std::mem::take(&mut self.tokens[index].text);
                open.element.children.push(Child::Whitespace(space));
            }
            TokenKind::FragmentStart => return self.open_region(index, None, depth),
            TokenKind::ElementEnd => return self.close_element(index),
            TokenKind::Code | TokenKind::PropValue | TokenKind::FragmentEnd => {
                return Err(self.unexpected(kind, index));
            }
        }
        Ok(())
    }

    /// A token inside an open braced region: nested elements, interleaved
    /// code, and the closing boundary.
    fn region_token(&mut self, index: usize) -> Result<(), ParseError> {
        let kind = self.tokens[index].kind;
        let Some(region) = self.stack.last().and_then(|open| open.region.as_ref()) else {
            return Err(self.unexpected(kind, index));
        };
        let depth = region.depth;

        match kind {
            TokenKind::ElementStart => self.open_element(index, depth + 1),
            TokenKind::PropValue | TokenKind::ChildCode => {
                let code = self.raw_code(index, depth);
                self.push_part(FragmentPart::Code(code));
                Ok(())
            }
            TokenKind::FragmentEnd => {
                let code = self.raw_code(index, depth);
                self.push_part(FragmentPart::Code(code));
                self.close_region();
                Ok(())
            }
            kind => Err(ParseError::UnexpectedPropertyToken {
                kind,
                index,
                location: self.locate(index),
            }),
        }
    }

    // =========================================================================
    // Elements
    // =========================================================================

    fn open_element(&mut self, index: usize, depth: usize) -> Result<(), ParseError> {
        self.enter()?;
        self.starts += 1;

        let start = &self.tokens[index];
        let mut name = tag_name(&start.text);
        if name.is_empty() {
            name = self.fragment.clone();
        }
        trace!(%name, depth, offset = start.offset, "element");

        let element = Element {
            is_component: Element::is_component_name(&name),
            name,
            props: Vec::new(),
            children: Vec::new(),
            depth,
            offset: start.offset,
        };
        self.stack.push(OpenElement {
            element,
            pending: None,
            region: None,
        });
        Ok(())
    }

    fn close_element(&mut self, index: usize) -> Result<(), ParseError> {
        let Some(open) = self.stack.pop() else {
            return Err(self.unexpected(TokenKind::ElementEnd, index));
        };

        let found = tag_name(&self.tokens[index].text);
        if !found.is_empty() && found != open.element.name {
            return Err(ParseError::MismatchedCloseTag {
                expected: open.element.name,
                found,
                index,
                location: self.locate(index),
            });
        }
        self.ends += 1;

        let element = open.element;
        match self.stack.last_mut() {
            None => self.body.push(Node::Element(element)),
            Some(parent) => {
                if let Some(region) = parent.region.as_mut() {
                    region.parts.push(FragmentPart::Element(element));
                } else if let Some(name) = parent.pending.take() {
                    parent.element.props.push(Property {
                        name,
                        value: Some(PropertyValue::Element(Box::new(element))),
                    });
                } else {
                    parent.element.children.push(Child::Element(element));
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Properties and braced regions
    // =========================================================================

    /// Pair a property name with the token that follows it as its value.
    fn property(&mut self, name: String, depth: usize) -> Result<(), ParseError> {
        let index = self.pos;
        let next = self.tokens.get(index).map(|token| token.kind);

        let value = match next {
            Some(TokenKind::PropValue | TokenKind::Code) => {
                self.pos += 1;
                Some(PropertyValue::Code(self.raw_code(index, depth)))
            }
            Some(TokenKind::ElementStart) => {
                if let Some(open) = self.stack.last_mut() {
                    open.pending = Some(name);
                }
                return Ok(());
            }
            Some(TokenKind::FragmentStart) => {
                self.pos += 1;
                return self.open_region(index, Some(name), depth + 1);
            }
            _ => None,
        };

        if let Some(open) = self.stack.last_mut() {
            open.element.props.push(Property { name, value });
        }
        Ok(())
    }

    /// Open a braced region at the `FragmentStart` token `index`.
    fn open_region(
        &mut self,
        index: usize,
        property: Option<String>,
        depth: usize,
    ) -> Result<(), ParseError> {
        self.enter()?;
        let first = self.raw_code(index, depth);
        if let Some(open) = self.stack.last_mut() {
            open.region = Some(OpenRegion {
                property,
                parts: vec![FragmentPart::Code(first)],
                depth,
                start: index,
            });
        }
        Ok(())
    }

    fn push_part(&mut self, part: FragmentPart) {
        if let Some(region) = self.stack.last_mut().and_then(|open| open.region.as_mut()) {
            region.parts.push(part);
        }
    }

    /// Attach the finished region to its element as a property value or a child.
    fn close_region(&mut self) {
        let Some(open) = self.stack.last_mut() else {
            return;
        };
        let Some(region) = open.region.take() else {
            return;
        };

        match region.property {
            Some(name) => open.element.props.push(Property {
                name,
                value: Some(PropertyValue::Fragment(region.parts)),
            }),
            None => open.element.children.push(Child::Expression(region.parts)),
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn enter(&mut self) -> Result<(), ParseError> {
        self.calls += 1;
        if self.calls > self.max_calls {
            return Err(ParseError::LimitExceeded {
                limit: self.max_calls,
            });
        }
        Ok(())
    }

    /// Take the text of token `index` as raw code.
    fn raw_code(&mut self, index: usize, depth: usize) -> RawCode {
        let token = &mut self.tokens[index];
        RawCode {
            text: std::mem::take(&mut token.text),
            offset: token.offset,
            depth,
        }
    }

    fn unexpected(&self, kind: TokenKind, index: usize) -> ParseError {
        ParseError::UnexpectedToken {
            kind,
            index,
            location: self.locate(index),
        }
    }

    fn locate(&self, index: usize) -> Location {
        let offset = self.tokens.get(index).map_or(0, |t| t.offset);
        Location::locate(self.source, offset)
    }
}

/// Drop one leading `{` and one trailing `}`.
fn strip_braces(code: &str) -> &str {
    let code = code.strip_prefix('{').unwrap_or(code);
    code.strip_suffix('}').unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsx_lexer::Scanner;
    use pretty_assertions::assert_eq;

    fn try_parse(source: &str) -> Result<Program, ParseError> {
        let tokens = Scanner::tokenize(source, DEFAULT_MAX_RECURSION_CALLS).unwrap();
        Parser::new(tokens, source).parse()
    }

    fn parse(source: &str) -> Program {
        try_parse(source).unwrap()
    }

    fn first_element(program: &Program) -> &Element {
        program
            .body
            .iter()
            .find_map(|node| match node {
                Node::Element(el) => Some(el),
                Node::Code(_) => None,
            })
            .expect("program has an element")
    }

    fn child_element(child: &Child) -> &Element {
        match child {
            Child::Element(el) => el,
            other => panic!("Expected Element child, got {other:?}"),
        }
    }

    // =========================================================================
    // Program structure
    // =========================================================================

    #[test]
    fn test_empty_program() {
        assert_eq!(parse(""), Program { body: vec![] });
    }

    #[test]
    fn test_code_only() {
        let program = parse("let x = 1;");
        assert_eq!(
            program.body,
            vec![Node::Code(RawCode {
                text: "let x = 1;".into(),
                offset: 0,
                depth: 0,
            })]
        );
    }

    #[test]
    fn test_code_around_element() {
        let program = parse("return <div>text</div>;");
        assert_eq!(program.body.len(), 3);
        assert!(matches!(&program.body[0], Node::Code(c) if c.text == "return "));
        assert!(matches!(&program.body[2], Node::Code(c) if c.text == ";"));

        let div = first_element(&program);
        assert_eq!(div.name, "div");
        assert!(!div.is_component);
        assert_eq!(div.offset, 7);
        assert_eq!(div.children, vec![Child::Text("text".into())]);
    }

    // =========================================================================
    // Tag names
    // =========================================================================

    #[test]
    fn test_component_names() {
        assert!(first_element(&parse("<Foo/>")).is_component);
        assert!(first_element(&parse("<ui.button/>")).is_component);
        assert!(!first_element(&parse("<foo/>")).is_component);
    }

    #[test]
    fn test_fragment_uses_identifier() {
        let tokens = Scanner::tokenize("<>a</>", 1000).unwrap();
        let program = Parser::new(tokens, "<>a</>")
            .fragment_identifier("Vue.Fragment")
            .parse()
            .unwrap();
        let el = first_element(&program);
        assert_eq!(el.name, "Vue.Fragment");
        assert!(el.is_component);
    }

    #[test]
    fn test_default_fragment_identifier() {
        assert_eq!(
            first_element(&parse("<></>")).name,
            DEFAULT_FRAGMENT_IDENTIFIER
        );
    }

    // =========================================================================
    // Properties
    // =========================================================================

    #[test]
    fn test_props() {
        let program = parse(r#"<a href="x" id={y} disabled {...rest}/>"#);
        let el = first_element(&program);
        let names: Vec<&str> = el.props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["href", "id", "disabled", "{...rest}"]);

        assert!(matches!(&el.props[0].value, Some(PropertyValue::Code(c)) if c.text == "\"x\""));
        assert!(matches!(&el.props[1].value, Some(PropertyValue::Code(c)) if c.text == "y"));
        assert_eq!(el.props[2].value, None);
        assert_eq!(el.props[3].value, None);
    }

    #[test]
    fn test_element_prop() {
        let program = parse("<A icon={<Icon/>}/>");
        let el = first_element(&program);
        match &el.props[0].value {
            Some(PropertyValue::Element(icon)) => {
                assert_eq!(icon.name, "Icon");
                assert_eq!(icon.depth, 1);
            }
            other => panic!("Expected element value, got {other:?}"),
        }
    }

    #[test]
    fn test_fragment_prop() {
        let program = parse("<A x={c ? <B/> : <C/>}/>");
        let el = first_element(&program);
        let Some(PropertyValue::Fragment(parts)) = &el.props[0].value else {
            panic!("Expected fragment value, got {:?}", el.props[0].value);
        };
        let shape: Vec<String> = parts
            .iter()
            .map(|part| match part {
                FragmentPart::Code(c) => format!("code:{}", c.text),
                FragmentPart::Element(e) => format!("el:{}@{}", e.name, e.depth),
            })
            .collect();
        assert_eq!(shape, vec!["code:c ? ", "el:B@2", "code: : ", "el:C@2", "code:"]);
    }

    // =========================================================================
    // Children
    // =========================================================================

    #[test]
    fn test_children_kinds() {
        let program = parse("<p>\n  hi {name}\n  <b>x</b>\n</p>");
        let p = first_element(&program);
        assert_eq!(p.children.len(), 5);
        assert_eq!(p.children[0], Child::Text("\n  hi ".into()));
        assert_eq!(p.children[1], Child::Code("name".into()));
        assert_eq!(p.children[2], Child::Whitespace("\n  ".into()));
        assert_eq!(child_element(&p.children[3]).name, "b");
        assert_eq!(child_element(&p.children[3]).depth, 1);
        assert!(p.children[4].is_whitespace());
    }

    #[test]
    fn test_empty_braced_child_code_dropped() {
        let p = parse("<p>{{}}</p>");
        assert_eq!(first_element(&p).children, vec![]);
    }

    #[test]
    fn test_child_expression_is_one_child() {
        let program = parse("<ul>{a.map(x => <li/>)}{b}<hr/></ul>");
        let ul = first_element(&program);
        assert_eq!(ul.children.len(), 3);

        let Child::Expression(parts) = &ul.children[0] else {
            panic!("Expected expression child, got {:?}", ul.children[0]);
        };
        let shape: Vec<String> = parts
            .iter()
            .map(|part| match part {
                FragmentPart::Code(c) => format!("code:{}", c.text),
                FragmentPart::Element(e) => format!("el:{}@{}", e.name, e.depth),
            })
            .collect();
        assert_eq!(shape, vec!["code:a.map(x => ", "el:li@1", "code:)"]);

        assert_eq!(ul.children[1], Child::Code("b".into()));
        assert_eq!(child_element(&ul.children[2]).name, "hr");
    }

    #[test]
    fn test_nested_depth() {
        let program = parse("<a><b><c/></b></a>");
        let a = first_element(&program);
        let b = child_element(&a.children[0]);
        let c = child_element(&b.children[0]);
        assert_eq!((a.depth, b.depth, c.depth), (0, 1, 2));
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_mismatched_close_tag() {
        let err = try_parse("<div>\n  text\n</span>").unwrap_err();
        match &err {
            ParseError::MismatchedCloseTag {
                expected,
                found,
                index,
                location,
            } => {
                assert_eq!(expected, "div");
                assert_eq!(found, "span");
                assert_eq!(*index, 2);
                assert_eq!(location.line, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("</span>"));
        assert!(message.contains("<div>"));
    }

    #[test]
    fn test_unbalanced_elements() {
        let err = try_parse("<div>text").unwrap_err();
        assert_eq!(err, ParseError::UnbalancedElements { starts: 1, ends: 0 });
        assert_eq!(err.location(), None);
    }

    #[test]
    fn test_unexpected_top_level_token() {
        let tokens = vec![Token::new(TokenKind::ChildText, "x", 0)];
        let err = Parser::new(tokens, "x").parse().unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken {
                kind: TokenKind::ChildText,
                index: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_unexpected_property_token() {
        let tokens = vec![
            Token::new(TokenKind::ElementStart, "<a", 0),
            Token::new(TokenKind::PropName, "x", 3),
            Token::new(TokenKind::FragmentStart, "c && ", 6),
            Token::new(TokenKind::ChildText, "oops", 11),
        ];
        let err = Parser::new(tokens, "<a x={c && oops").parse().unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedPropertyToken { index: 3, .. }
        ));
    }

    #[test]
    fn test_unterminated_property() {
        let tokens = vec![
            Token::new(TokenKind::ElementStart, "<a", 0),
            Token::new(TokenKind::PropName, "x", 3),
            Token::new(TokenKind::FragmentStart, "c && ", 6),
        ];
        let err = Parser::new(tokens, "<a x={c && ").parse().unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedProperty { .. }));
    }

    #[test]
    fn test_unterminated_child_expression() {
        let err = try_parse("<a>{x && <b/>").unwrap_err();
        match err {
            ParseError::UnterminatedProperty { location } => assert_eq!(location.column, 5),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_stray_fragment_end_in_children() {
        let tokens = vec![
            Token::new(TokenKind::ElementStart, "<a>", 0),
            Token::new(TokenKind::FragmentEnd, ")", 3),
        ];
        let err = Parser::new(tokens, "<a>)").parse().unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken {
                kind: TokenKind::FragmentEnd,
                index: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_deep_nesting_on_small_stack() {
        let depth = 999;
        let source = format!("{}x{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || {
                let program = try_parse(&source)?;
                let mut el = first_element(&program);
                let mut levels = 1;
                while let Some(Child::Element(child)) = el.children.first() {
                    el = child;
                    levels += 1;
                }
                Ok::<_, ParseError>((levels, el.depth))
            })
            .unwrap();
        assert_eq!(handle.join().unwrap(), Ok((999, 998)));
    }

    #[test]
    fn test_call_ceiling() {
        let source = "<a><b><c/></b></a>";
        let tokens = Scanner::tokenize(source, 1000).unwrap();
        assert!(Parser::new(tokens.clone(), source)
            .max_recursion_calls(3)
            .parse()
            .is_ok());
        let err = Parser::new(tokens, source)
            .max_recursion_calls(2)
            .parse()
            .unwrap_err();
        assert_eq!(err, ParseError::LimitExceeded { limit: 2 });
    }
}
