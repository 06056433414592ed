use crate::lookahead;
use crate::preprocess;
use crate::token::{Token, TokenKind};
use crate::{LexerError, Location};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

static BARE_PROPERTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]*$").expect("bare property pattern is valid"));

static SPREAD_PROPERTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\.\.\.(.+)\}").expect("spread property pattern is valid"));

/// Whether a property name is a spread pattern such as `{...props}`.
pub fn is_spread_property(name: &str) -> bool {
    SPREAD_PROPERTY.is_match(name)
}

/// Whether unquoted attribute text may stand alone as a boolean or spread property.
fn is_bare_property(text: &str) -> bool {
    BARE_PROPERTY.is_match(text) || is_spread_property(text)
}

/// What the element scanner is currently reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// `<name` or `</name`, up to whitespace, `/>` or `>`.
    TagName,
    /// Between the tag name and `>`.
    Attributes,
    /// Text, whitespace and `{code}` between the open and close tags.
    Children,
}

/// Brace state of one open element's children.
#[derive(Debug, Default)]
struct Frame {
    in_code: bool,
    depth: usize,
    /// A `FragmentStart` was emitted for the current braced region.
    fragment_open: bool,
}

/// Attribute state of the element whose open tag is being read.
#[derive(Debug, Default)]
struct AttrState {
    /// A property name was emitted and its value is pending.
    has_prop: bool,
    quote: Option<char>,
    in_code: bool,
    depth: usize,
    /// A `FragmentStart` was emitted for the current braced value.
    fragment_open: bool,
    /// Token index of a nested element that began the braced value.
    element_mark: Option<usize>,
}

impl AttrState {
    fn value_kind(&self) -> TokenKind {
        if self.has_prop {
            TokenKind::PropValue
        } else {
            TokenKind::PropName
        }
    }
}

/// State of one element scan. Elements nested as children share it through
/// `frames`; elements nested in property values get their own, stacked.
struct ElementState {
    mode: Mode,
    value: String,
    closing: bool,
    frames: Vec<Frame>,
    attrs: AttrState,
}

impl ElementState {
    fn new() -> Self {
        Self {
            mode: Mode::TagName,
            value: String::from("<"),
            closing: false,
            frames: Vec::new(),
            attrs: AttrState::default(),
        }
    }

    /// Pop the innermost element; the scan is done once none remain open.
    fn close(&mut self, next: usize) -> Step {
        self.frames.pop();
        self.closing = false;
        self.value.clear();
        if self.frames.is_empty() {
            Step::Done(next)
        } else {
            self.mode = Mode::Children;
            Step::Next(next)
        }
    }
}

enum Step {
    /// Continue at this position.
    Next(usize),
    /// An element nested in a braced property value opens at this `<`.
    Nest(usize),
    /// The outermost element closed; scanning resumes at this position.
    Done(usize),
}

/// Source scanner.
///
/// Splits comment-stripped source into plain code and element tokens.
/// Plain code is located with the shared `<` lookahead; each element is read
/// by a character state machine that keeps a frame per open element, and
/// stacks a fresh state for every element nested inside a braced property
/// value.
///
/// Two guards bound the work: an iteration counter that can never exceed the
/// input length on forward progress, and a call counter checked against the
/// configured recursion ceiling.
pub struct Scanner<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
    iterations: usize,
    calls: usize,
    max_calls: usize,
}

impl<'a> Scanner<'a> {
    /// Create a scanner over `source`. Comments are stripped immediately.
    fn new(source: &'a str, max_recursion_calls: usize) -> Self {
        let stripped = preprocess::strip_comments(source);
        Self {
            source,
            chars: stripped.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
            iterations: 0,
            calls: 0,
            max_calls: max_recursion_calls,
        }
    }

    /// Tokenize the entire source.
    pub fn tokenize(source: &str, max_recursion_calls: usize) -> Result<Vec<Token>, LexerError> {
        let mut scanner = Scanner::new(source, max_recursion_calls);
        scanner.scan_tokens()?;
        Ok(scanner.tokens)
    }

    fn scan_tokens(&mut self) -> Result<(), LexerError> {
        while self.pos < self.chars.len() {
            self.tick()?;

            let Some(start) = self.next_element_start() else {
                self.emit_code(self.pos, self.chars.len());
                break;
            };

            if start > self.pos {
                self.emit_code(self.pos, start);
            }
            self.pos = self.scan_element(start)?;
        }
        Ok(())
    }

    /// Find the next `<` that opens markup, skipping string literals.
    fn next_element_start(&self) -> Option<usize> {
        let mut quote: Option<char> = None;
        let mut pos = self.pos;

        while pos + 1 < self.chars.len() {
            let ch = self.chars[pos];
            match quote {
                Some(q) => {
                    if ch == q && (q == '`' || self.prev(pos) != Some('\\')) {
                        quote = None;
                    }
                }
                None => match ch {
                    '"' | '\'' | '`' => quote = Some(ch),
                    '<' if lookahead::starts_element(&self.chars, pos) => return Some(pos),
                    _ => {}
                },
            }
            pos += 1;
        }

        None
    }

    // --- Elements ---

    /// Scan the element whose `<` is at `start`, with all of its children
    /// and property-value elements. Returns the position just past its final `>`.
    fn scan_element(&mut self, start: usize) -> Result<usize, LexerError> {
        self.enter(start)?;
        let mut stack = vec![ElementState::new()];
        let mut pos = start + 1;

        while pos < self.chars.len() {
            self.tick()?;
            let Some(el) = stack.last_mut() else {
                break;
            };
            let step = match el.mode {
                Mode::TagName => self.scan_tag_name(el, pos)?,
                Mode::Attributes => self.scan_attribute(el, pos)?,
                Mode::Children => self.scan_child(el, pos),
            };
            match step {
                Step::Next(next) => pos = next,
                Step::Nest(at) => {
                    self.enter(at)?;
                    stack.push(ElementState::new());
                    pos = at + 1;
                }
                Step::Done(end) => {
                    stack.pop();
                    if stack.is_empty() {
                        return Ok(end);
                    }
                    pos = end;
                }
            }
        }

        // Unclosed at end of input; the parser reports the imbalance.
        Ok(pos)
    }

    /// Count one element scan against the ceiling.
    fn enter(&mut self, offset: usize) -> Result<(), LexerError> {
        self.calls += 1;
        if self.calls > self.max_calls {
            return Err(LexerError::LimitExceeded {
                limit: self.max_calls,
            });
        }
        trace!(offset, "scanning element");
        Ok(())
    }

    fn scan_tag_name(&mut self, el: &mut ElementState, pos: usize) -> Result<Step, LexerError> {
        match self.chars[pos] {
            '/' if el.value == "<" => {
                el.closing = true;
                el.value.push('/');
            }
            '/' if !el.closing && self.peek(pos + 1) == Some('>') => {
                self.open_element(el, pos);
                self.emit(TokenKind::ElementEnd, "/>", pos);
                return Ok(el.close(pos + 2));
            }
            '/' => {
                return Err(LexerError::MalformedElement {
                    value: el.value.clone(),
                    location: self.locate(pos),
                });
            }
            '>' => {
                el.value.push('>');
                if el.closing {
                    let text = std::mem::take(&mut el.value);
                    let offset = start_of(&text, pos + 1);
                    trace!(tag = %text, offset, "element end");
                    self.emit(TokenKind::ElementEnd, text, offset);
                    return Ok(el.close(pos + 1));
                }
                self.open_element(el, pos + 1);
                el.mode = Mode::Children;
            }
            ' ' | '\t' | '\r' | '\n' => {
                // `</div >`: whitespace inside a closing tag is insignificant.
                if !el.closing {
                    self.open_element(el, pos);
                    el.attrs = AttrState::default();
                    el.mode = Mode::Attributes;
                }
            }
            c => el.value.push(c),
        }
        Ok(Step::Next(pos + 1))
    }

    /// Emit the pending tag text as an element start and open a frame for it.
    fn open_element(&mut self, el: &mut ElementState, end: usize) {
        let text = std::mem::take(&mut el.value);
        let offset = start_of(&text, end);
        trace!(tag = %text, offset, "element start");
        self.emit(TokenKind::ElementStart, text, offset);
        el.frames.push(Frame::default());
    }

    // --- Attributes ---

    fn scan_attribute(&mut self, el: &mut ElementState, pos: usize) -> Result<Step, LexerError> {
        let ch = self.chars[pos];

        if let Some(quote) = el.attrs.quote {
            if ch == quote {
                el.attrs.quote = None;
                let kind = el.attrs.value_kind();
                let value = std::mem::take(&mut el.value);
                let offset = start_of(&value, pos);
                self.emit(kind, quote_string(&value), offset);
                el.attrs.has_prop = false;
            } else {
                el.value.push(ch);
            }
            return Ok(Step::Next(pos + 1));
        }

        match ch {
            '=' if !el.attrs.in_code => {
                let name = std::mem::take(&mut el.value);
                if !name.trim().is_empty() {
                    let offset = start_of(&name, pos);
                    self.emit(TokenKind::PropName, name, offset);
                    el.attrs.has_prop = true;
                } else if self
                    .tokens
                    .last()
                    .is_some_and(|t| t.kind == TokenKind::PropName)
                {
                    // `name = "value"`
                    el.attrs.has_prop = true;
                }
                return Ok(self.open_value(el, pos + 1));
            }
            '}' if el.attrs.in_code => {
                if el.attrs.depth == 0 {
                    self.close_prop_code(el, pos);
                    return Ok(Step::Next(pos + 1));
                }
                el.attrs.depth -= 1;
            }
            ' ' | '\t' | '\r' | '\n' if !el.attrs.in_code => {
                let value = std::mem::take(&mut el.value);
                if !value.trim().is_empty() {
                    let kind = el.attrs.value_kind();
                    let offset = start_of(&value, pos);
                    self.emit(kind, value, offset);
                    el.attrs.has_prop = false;
                }
                return Ok(Step::Next(pos + 1));
            }
            '/' if !el.attrs.in_code && self.peek(pos + 1) == Some('>') => {
                self.finish_attributes(el, pos)?;
                self.emit(TokenKind::ElementEnd, "/>", pos);
                return Ok(el.close(pos + 2));
            }
            '<' if el.attrs.in_code && lookahead::starts_element(&self.chars, pos) => {
                self.mark_prop_element(el, pos);
                return Ok(Step::Nest(pos));
            }
            '{' if el.attrs.in_code => el.attrs.depth += 1,
            '>' if !el.attrs.in_code => {
                self.finish_attributes(el, pos)?;
                el.mode = Mode::Children;
                return Ok(Step::Next(pos + 1));
            }
            _ => {}
        }

        el.value.push(ch);
        Ok(Step::Next(pos + 1))
    }

    /// After `=`: enter a quoted or braced value if one follows (spaces allowed).
    fn open_value(&self, el: &mut ElementState, pos: usize) -> Step {
        let mut next = pos;
        while matches!(self.peek(next), Some(' ' | '\t' | '\r' | '\n')) {
            next += 1;
        }
        match self.peek(next) {
            Some(q @ ('"' | '\'')) => {
                el.attrs.quote = Some(q);
                Step::Next(next + 1)
            }
            Some('{') => {
                el.attrs.in_code = true;
                el.attrs.depth = 0;
                Step::Next(next + 1)
            }
            _ => Step::Next(pos),
        }
    }

    /// Handle the `}` that ends a braced property value.
    fn close_prop_code(&mut self, el: &mut ElementState, pos: usize) {
        let code = std::mem::take(&mut el.value);
        let offset = start_of(&code, pos);
        let has_code = !code.trim().is_empty();

        if el.attrs.fragment_open {
            self.emit(TokenKind::FragmentEnd, code, offset);
        } else if let Some(mark) = el.attrs.element_mark {
            // `{<A/> || fallback}`
            if has_code {
                self.insert_fragment_start(mark);
                self.emit(TokenKind::FragmentEnd, code, offset);
            }
        } else if has_code {
            self.emit(TokenKind::PropValue, code, offset);
        }

        el.attrs.in_code = false;
        el.attrs.fragment_open = false;
        el.attrs.element_mark = None;
        el.attrs.has_prop = false;
    }

    /// Flush the code that precedes a nested element inside a braced property value.
    fn mark_prop_element(&mut self, el: &mut ElementState, pos: usize) {
        let code = std::mem::take(&mut el.value);
        let offset = start_of(&code, pos);
        let has_code = !code.trim().is_empty();

        if el.attrs.fragment_open {
            if has_code {
                self.emit(TokenKind::PropValue, code, offset);
            }
        } else if let Some(mark) = el.attrs.element_mark {
            if has_code {
                self.insert_fragment_start(mark);
                el.attrs.fragment_open = true;
                el.attrs.element_mark = None;
                self.emit(TokenKind::PropValue, code, offset);
            }
        } else if has_code {
            self.emit(TokenKind::FragmentStart, code, offset);
            el.attrs.fragment_open = true;
        } else {
            el.attrs.element_mark = Some(self.tokens.len());
        }
    }

    fn insert_fragment_start(&mut self, mark: usize) {
        let offset = self.tokens.get(mark).map_or(0, |t| t.offset);
        self.tokens
            .insert(mark, Token::new(TokenKind::FragmentStart, "", offset));
    }

    /// Flush trailing attribute text at `>` or `/>`: it must be a bare name or a spread.
    fn finish_attributes(&mut self, el: &mut ElementState, pos: usize) -> Result<(), LexerError> {
        let value = std::mem::take(&mut el.value);
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let offset = start_of(&value, pos);
        if !is_bare_property(trimmed) {
            return Err(LexerError::UnhandledProperty {
                value: trimmed.to_string(),
                location: self.locate(offset),
            });
        }

        let kind = el.attrs.value_kind();
        el.attrs.has_prop = false;
        self.emit(kind, trimmed, offset);
        Ok(())
    }

    // --- Children ---

    fn scan_child(&mut self, el: &mut ElementState, pos: usize) -> Step {
        let ch = self.chars[pos];
        let Some(frame) = el.frames.last_mut() else {
            return Step::Done(pos);
        };

        match ch {
            '}' if frame.in_code && frame.depth == 0 => {
                frame.in_code = false;
                if std::mem::take(&mut frame.fragment_open) {
                    // `{items.map(i => <li/>)}`
                    self.emit_region_code(el, pos, TokenKind::FragmentEnd);
                } else {
                    self.flush_child(el, pos, TokenKind::ChildCode);
                }
                return Step::Next(pos + 1);
            }
            '}' if frame.in_code => frame.depth -= 1,
            '{' if frame.in_code => frame.depth += 1,
            '{' => {
                frame.in_code = true;
                frame.depth = 0;
                self.flush_child(el, pos, TokenKind::ChildText);
                return Step::Next(pos + 1);
            }
            '<' if lookahead::starts_child_tag(&self.chars, pos) => {
                if !frame.in_code {
                    self.flush_child(el, pos, TokenKind::ChildText);
                } else if frame.fragment_open {
                    if !el.value.is_empty() {
                        self.emit_region_code(el, pos, TokenKind::ChildCode);
                    }
                } else {
                    frame.fragment_open = true;
                    self.emit_region_code(el, pos, TokenKind::FragmentStart);
                }
                el.value.push('<');
                el.mode = Mode::TagName;
                return Step::Next(pos + 1);
            }
            _ => {}
        }

        el.value.push(ch);
        Step::Next(pos + 1)
    }

    /// Emit pending child text ending at `end`; whitespace-only runs get their own kind.
    fn flush_child(&mut self, el: &mut ElementState, end: usize, kind: TokenKind) {
        let value = std::mem::take(&mut el.value);
        if value.is_empty() {
            return;
        }
        let kind = if value.trim().is_empty() {
            TokenKind::ChildWhitespace
        } else {
            kind
        };
        let offset = start_of(&value, end);
        self.emit(kind, value, offset);
    }

    /// Emit pending code of a braced child region that holds elements.
    /// Unlike `flush_child`, whitespace and empty text keep their kind.
    fn emit_region_code(&mut self, el: &mut ElementState, end: usize, kind: TokenKind) {
        let value = std::mem::take(&mut el.value);
        let offset = start_of(&value, end);
        self.emit(kind, value, offset);
    }

    // --- Helpers ---

    fn emit(&mut self, kind: TokenKind, text: impl Into<String>, offset: usize) {
        self.tokens.push(Token::new(kind, text, offset));
    }

    fn emit_code(&mut self, start: usize, end: usize) {
        let text: String = self.chars[start..end].iter().collect();
        self.emit(TokenKind::Code, text, start);
    }

    /// Runaway-loop guard: every iteration consumes input, so the count can
    /// only pass the input length if a state transition stops advancing.
    fn tick(&mut self) -> Result<(), LexerError> {
        self.iterations += 1;
        if self.iterations > self.chars.len() {
            return Err(LexerError::EndlessLoop {
                iterations: self.iterations,
            });
        }
        Ok(())
    }

    fn peek(&self, pos: usize) -> Option<char> {
        self.chars.get(pos).copied()
    }

    fn prev(&self, pos: usize) -> Option<char> {
        pos.checked_sub(1).and_then(|i| self.peek(i))
    }

    fn locate(&self, offset: usize) -> Location {
        Location::locate(self.source, offset)
    }
}

/// Start offset of `text` when it ends (exclusive) at `end`.
fn start_of(text: &str, end: usize) -> usize {
    end.saturating_sub(text.chars().count())
}

/// Quote a value as a double-quoted string literal.
fn quote_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
