//! Comment stripping.
//!
//! Every comment character is replaced with a space (newlines are kept), so
//! the output has exactly as many chars as the input and every later offset
//! still resolves to the original line and column. This also means the
//! tokenizer never has to know about comments.
//!
//! A `/` only starts a comment in code context: outside of markup, or inside
//! a braced region of an element. Within markup text `http://example.com` is
//! just text.

use crate::lookahead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    /// `{/* ... */}` inside an element body.
    MarkupComment,
    LineComment,
    BlockComment,
    SingleQuote,
    DoubleQuote,
    Template,
}

/// Replace comments with whitespace, preserving length and line breaks.
pub fn strip_comments(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = chars.clone();
    let mut state = State::Code;
    // Open elements, and open braces within the innermost element.
    let mut elements: usize = 0;
    let mut braces: usize = 0;
    let mut pos = 0;

    let at = |i: usize| chars.get(i).copied();
    let prev = |i: usize| if i == 0 { None } else { chars.get(i - 1).copied() };

    while pos < chars.len() {
        let ch = chars[pos];

        match state {
            State::MarkupComment => {
                if ch == '*' && at(pos + 1) == Some('/') && at(pos + 2) == Some('}') {
                    blank(&mut out, pos, 3);
                    pos += 3;
                    state = State::Code;
                    continue;
                }
                if ch != '\n' {
                    out[pos] = ' ';
                }
            }
            State::LineComment => {
                if ch == '\n' {
                    state = State::Code;
                } else {
                    out[pos] = ' ';
                }
            }
            State::BlockComment => {
                if ch == '*' && at(pos + 1) == Some('/') {
                    blank(&mut out, pos, 2);
                    pos += 2;
                    state = State::Code;
                    continue;
                }
                if ch != '\n' {
                    out[pos] = ' ';
                }
            }
            State::DoubleQuote => {
                if ch == '"' && prev(pos) != Some('\\') {
                    state = State::Code;
                }
            }
            State::SingleQuote => {
                if ch == '\'' && prev(pos) != Some('\\') {
                    state = State::Code;
                }
            }
            State::Template => {
                if ch == '`' {
                    state = State::Code;
                }
            }
            State::Code => {
                let in_code = elements == 0 || braces > 0;
                match ch {
                    '{' if elements > 0 && at(pos + 1) == Some('/') && at(pos + 2) == Some('*') => {
                        blank(&mut out, pos, 3);
                        pos += 3;
                        state = State::MarkupComment;
                        continue;
                    }
                    '{' if elements > 0 => braces += 1,
                    '}' if elements > 0 && braces > 0 => braces -= 1,
                    '/' if in_code => {
                        let next = match at(pos + 1) {
                            Some('/') => Some(State::LineComment),
                            Some('*') => Some(State::BlockComment),
                            _ => None,
                        };
                        if let Some(next) = next {
                            blank(&mut out, pos, 2);
                            pos += 2;
                            state = next;
                            continue;
                        }
                    }
                    '"' if in_code => state = State::DoubleQuote,
                    '\'' if in_code => state = State::SingleQuote,
                    '`' if in_code => state = State::Template,
                    '<' => {
                        if lookahead::starts_element(&chars, pos) {
                            elements += 1;
                        } else if at(pos + 1) == Some('/') {
                            elements = elements.saturating_sub(1);
                        }
                    }
                    // `/>` closes a self-closing tag; `</>` was already counted at its `<`.
                    '>' if elements > 0
                        && prev(pos) == Some('/')
                        && (pos < 2 || chars[pos - 2] != '<') =>
                    {
                        elements -= 1;
                    }
                    _ => {}
                }
            }
        }

        pos += 1;
    }

    out.into_iter().collect()
}

fn blank(out: &mut [char], start: usize, len: usize) {
    for c in out.iter_mut().skip(start).take(len) {
        if *c != '\n' {
            *c = ' ';
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_same_length(input: &str) {
        assert_eq!(
            strip_comments(input).chars().count(),
            input.chars().count(),
            "length changed for {input:?}"
        );
    }

    // =========================================================================
    // Script comments
    // =========================================================================

    #[test]
    fn test_no_comments() {
        assert_eq!(strip_comments("let a = 1;"), "let a = 1;");
    }

    #[test]
    fn test_line_comment() {
        assert_eq!(strip_comments("a; // note\nb;"), "a;        \nb;");
    }

    #[test]
    fn test_block_comment() {
        assert_eq!(strip_comments("a /* x */ b"), "a         b");
    }

    #[test]
    fn test_block_comment_keeps_newlines() {
        assert_eq!(strip_comments("/* a\nb */c"), "    \n    c");
    }

    #[test]
    fn test_division_is_kept() {
        assert_eq!(strip_comments("a = b / c;"), "a = b / c;");
    }

    #[test]
    fn test_comment_markers_in_strings() {
        let input = r#"a = "//x"; b = '/*'; c = `//`;"#;
        assert_eq!(strip_comments(input), input);
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let input = r#"a = "\" // still string"; // gone"#;
        assert_eq!(strip_comments(input), r#"a = "\" // still string";        "#);
    }

    // =========================================================================
    // Markup
    // =========================================================================

    #[test]
    fn test_url_in_markup_text() {
        let input = "return <a>http://example.com</a>";
        assert_eq!(strip_comments(input), input);
    }

    #[test]
    fn test_comment_in_braced_child() {
        assert_eq!(
            strip_comments("<div>{x // n\n}</div>"),
            "<div>{x     \n}</div>"
        );
    }

    #[test]
    fn test_markup_comment() {
        assert_eq!(
            strip_comments("<div>{/* hi */}</div>"),
            "<div>          </div>"
        );
    }

    #[test]
    fn test_comment_after_self_closing_element() {
        assert_eq!(strip_comments("<br/> // x"), "<br/>     ");
    }

    #[test]
    fn test_comment_after_fragment() {
        assert_eq!(strip_comments("<>a</> // x"), "<>a</>     ");
    }

    #[test]
    fn test_apostrophe_in_markup_text() {
        assert_eq!(
            strip_comments("<p>Don't</p>; // x"),
            "<p>Don't</p>;     "
        );
    }

    #[test]
    fn test_comparison_is_not_markup() {
        assert_eq!(strip_comments("if (a<b) {} // x"), "if (a<b) {}     ");
    }

    #[test]
    fn test_length_preserved() {
        assert_same_length("/* é */ return <div>{/* ü */}</div> // ñ");
        assert_same_length("// unterminated");
        assert_same_length("/* unterminated");
    }
}
