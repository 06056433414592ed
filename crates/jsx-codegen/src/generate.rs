//! Factory-call code generation.
//!
//! One pass over the [`Program`]: raw code is copied through and every
//! element becomes `factory(tag, props, ...children)`. Formatting follows
//! fixed rules so output is stable across runs:
//!
//! - Elements below the top level start on a new line indented by
//!   8 + 4 × depth spaces, unless they are generated inline as part of a
//!   larger property or child expression.
//! - Property objects longer than 80 characters put one property per line.
//! - Leading and trailing whitespace-only children are dropped.
//! - Each child is one argument; a braced region holding elements, such as
//!   `{items.map(i => <li/>)}`, becomes a single expression argument.

use crate::entities::decode_entities;
use jsx_lexer::is_spread_property;
use jsx_parser::{Child, Element, FragmentPart, Node, Program, PropertyValue};

/// Property text longer than this is broken one property per line.
const MAX_INLINE_PROPS: usize = 80;

const STRICT_MODE: &str = "\"use strict\";\n";

/// Code generator for a single compilation.
pub struct Generator<'a> {
    factory: &'a str,
    strict_mode: bool,
}

impl<'a> Generator<'a> {
    pub fn new(factory: &'a str) -> Self {
        Self {
            factory,
            strict_mode: false,
        }
    }

    /// Prepend a strict-mode directive unless the output already has one.
    pub fn strict_mode(mut self, enabled: bool) -> Self {
        self.strict_mode = enabled;
        self
    }

    /// Generate the code for a whole program.
    pub fn generate(&self, program: &Program) -> String {
        let js: String = program
            .body
            .iter()
            .map(|node| match node {
                Node::Code(code) => code.text.clone(),
                Node::Element(el) => self.element(el, false),
            })
            .collect();

        if self.strict_mode && !js.contains("\"use strict\"") && !js.contains("'use strict'") {
            format!("{STRICT_MODE}{js}")
        } else {
            js
        }
    }

    // =========================================================================
    // Elements
    // =========================================================================

    /// Generate one element tree. Nested elements are generated first from an
    /// explicit stack, then spliced into their parent in document order.
    fn element(&self, root: &Element, inline: bool) -> String {
        let mut stack = vec![Pending::new(root, inline)];

        while let Some(top) = stack.pop() {
            if let Some(&(next, inline)) = top.nested.get(top.done.len()) {
                stack.push(top);
                stack.push(Pending::new(next, inline));
                continue;
            }

            let js = self.compose(top);
            match stack.last_mut() {
                Some(parent) => parent.done.push(js),
                None => return js,
            }
        }

        String::new()
    }

    /// Build `factory(tag, props, ...children)` once every nested element is generated.
    fn compose(&self, pending: Pending<'_>) -> String {
        let el = pending.element;
        let mut nested = pending.done.into_iter();

        let mut js = String::new();
        if el.depth > 0 {
            if pending.inline {
                js.push(' ');
            } else {
                js.push('\n');
                js.push_str(&" ".repeat(8 + el.depth * 4));
            }
        }

        let tag = if el.is_component {
            el.name.clone()
        } else {
            quote(&el.name)
        };
        js.push_str(self.factory);
        js.push('(');
        js.push_str(&tag);
        js.push_str(", ");
        js.push_str(&props(el, pending.inline, &mut nested));
        js.push_str(&children(el, &mut nested));
        js.push(')');
        js
    }
}

/// An element whose nested elements are still being generated.
struct Pending<'p> {
    element: &'p Element,
    inline: bool,
    /// Elements nested in properties, then in children, in document order.
    nested: Vec<(&'p Element, bool)>,
    done: Vec<String>,
}

impl<'p> Pending<'p> {
    fn new(element: &'p Element, inline: bool) -> Self {
        let mut nested: Vec<(&'p Element, bool)> = Vec::new();
        for prop in &element.props {
            match &prop.value {
                Some(PropertyValue::Element(el)) => nested.push((&**el, true)),
                Some(PropertyValue::Fragment(parts)) => nested.extend(part_elements(parts)),
                Some(PropertyValue::Code(_)) | None => {}
            }
        }
        for child in &element.children {
            match child {
                Child::Element(el) => nested.push((el, false)),
                Child::Expression(parts) => nested.extend(part_elements(parts)),
                Child::Text(_) | Child::Code(_) | Child::Whitespace(_) => {}
            }
        }

        Self {
            element,
            inline,
            nested,
            done: Vec::new(),
        }
    }
}

/// Elements of a braced region; they are always generated inline.
fn part_elements(parts: &[FragmentPart]) -> impl Iterator<Item = (&Element, bool)> {
    parts.iter().filter_map(|part| match part {
        FragmentPart::Element(el) => Some((el, true)),
        FragmentPart::Code(_) => None,
    })
}

// =========================================================================
// Properties
// =========================================================================

fn props(el: &Element, inline: bool, nested: &mut impl Iterator<Item = String>) -> String {
    if el.props.is_empty() {
        return String::from("null");
    }

    let last = el.props.len() - 1;
    let mut items: Vec<String> = Vec::with_capacity(el.props.len());
    for (i, prop) in el.props.iter().enumerate() {
        let value = match &prop.value {
            Some(PropertyValue::Code(code)) => code.text.clone(),
            Some(PropertyValue::Element(_)) => nested.next().unwrap_or_default(),
            Some(PropertyValue::Fragment(parts)) => parts
                .iter()
                .map(|part| match part {
                    FragmentPart::Code(code) => code.text.clone(),
                    FragmentPart::Element(_) => nested.next().unwrap_or_default(),
                })
                .collect(),
            None => String::from("true"),
        };
        let mut name = prop.name.trim().to_string();
        if name.contains('-') {
            name = quote(&name);
        }
        let separator = if i == last { "" } else { ", " };

        if value == "true" && is_spread_property(&name) {
            // `{...rest}` → `...rest`
            let mut inner = name.chars();
            inner.next();
            inner.next_back();
            items.push(format!("{}{separator}", inner.as_str()));
        } else {
            items.push(format!("{name}: {value}{separator}"));
        }
    }

    let length: usize = items.iter().map(|item| item.chars().count()).sum();
    let mut js = String::from("{");
    if length > MAX_INLINE_PROPS {
        let mut indent = String::from("\n");
        if !inline {
            indent.push_str(&" ".repeat(12 + el.depth * 4));
        }
        js.push_str(&indent);
        js.push_str(&items.join(&indent));
    } else {
        js.push_str(&items.concat());
    }
    js.push('}');
    js
}

// =========================================================================
// Children
// =========================================================================

/// Generate the children arguments, including the leading `, `.
///
/// Every child is exactly one argument; a braced region never spans two.
fn children(el: &Element, nested: &mut impl Iterator<Item = String>) -> String {
    let children = &el.children;
    let count = children.len();
    // Whitespace between elements alone carries no meaning.
    let has_content = children
        .iter()
        .any(|child| matches!(child, Child::Text(_) | Child::Code(_) | Child::Expression(_)));

    let mut args: Vec<String> = Vec::with_capacity(count);
    for (i, child) in children.iter().enumerate() {
        match child {
            Child::Text(text) => {
                let decoded = if text.contains('&') {
                    decode_entities(text)
                } else {
                    text.clone()
                };
                let trimmed = if count == 1 {
                    decoded.trim()
                } else if i == count - 1 {
                    decoded.trim_end()
                } else if i == 0 {
                    decoded.trim_start()
                } else {
                    decoded.as_str()
                };
                args.push(quote(trimmed));
            }
            Child::Code(code) => args.push(code.clone()),
            Child::Expression(parts) => args.push(expression(parts, nested)),
            Child::Element(_) => args.extend(nested.next()),
            Child::Whitespace(space) => {
                if has_content && i != 0 && i != count - 1 {
                    args.push(quote(space));
                }
            }
        }
    }

    if args.is_empty() {
        String::new()
    } else {
        format!(", {}", args.join(", "))
    }
}

/// Join a braced child region into one expression, e.g.
/// `items.map(i => factory("li", null, i))`.
fn expression(parts: &[FragmentPart], nested: &mut impl Iterator<Item = String>) -> String {
    let mut js = String::new();
    for part in parts {
        match part {
            FragmentPart::Code(code) => js.push_str(&code.text),
            FragmentPart::Element(_) => {
                // Inline elements bring their own leading space.
                js.truncate(js.trim_end().len());
                js.push_str(&nested.next().unwrap_or_default());
            }
        }
    }
    js.trim().to_string()
}

/// Quote text as a double-quoted string literal.
fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}
