//! Tag-versus-expression lookahead.
//!
//! Both the comment stripper and the scanner must agree on whether a `<`
//! opens markup or is a comparison, so the rule lives here once. It is a
//! quick character-class check rather than exact script syntax; its
//! boundaries are relied upon and must not be generalized.

/// Returns `true` when the `<` at `start` looks like a less-than operator.
///
/// Scanning begins two characters after the `<`. Name characters are skipped
/// until a space has been seen; a `>` or a name character after a space means
/// markup. Reaching `)`, `&`, `|`, `?` or `;` first means an expression,
/// e.g. `a<b)` or `i<len;`.
pub fn is_expression(chars: &[char], start: usize) -> bool {
    let mut seen_space = false;

    for &ch in chars.iter().skip(start + 2) {
        match ch {
            c if c.is_ascii_alphanumeric() || c == '_' || c == '/' => {
                if seen_space {
                    break;
                }
            }
            '>' => break,
            ' ' => seen_space = true,
            ')' | '&' | '|' | '?' | ';' => return true,
            _ => {}
        }
    }

    false
}

/// Whether the `<` at `pos` opens an element in code context: `<name` or `<>`.
pub fn starts_element(chars: &[char], pos: usize) -> bool {
    matches!(chars.get(pos + 1), Some(c) if c.is_ascii_alphabetic() || *c == '>')
        && !is_expression(chars, pos)
}

/// Whether the `<` at `pos` opens a tag among element children.
/// Unlike [`starts_element`] this also accepts closing tags (`</`).
pub fn starts_child_tag(chars: &[char], pos: usize) -> bool {
    matches!(chars.get(pos + 1), Some(c) if c.is_ascii_alphabetic() || *c == '>' || *c == '/')
        && !is_expression(chars, pos)
}
