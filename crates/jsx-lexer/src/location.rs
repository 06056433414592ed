use serde::Serialize;
use std::fmt;

/// A resolved position in source text, used for diagnostics.
///
/// Offsets are char offsets; because comment stripping preserves length,
/// an offset into the stripped text resolves against the original source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
    /// The full source line, trimmed.
    pub text: String,
}

impl Location {
    /// Resolve a char offset against `source`. Offsets past the end clamp to it.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut line_start = 0;
        let mut count = 0;

        for (i, ch) in source.chars().enumerate() {
            if i >= offset {
                break;
            }
            count = i + 1;
            if ch == '\n' {
                line += 1;
                line_start = i + 1;
            }
        }

        let text: String = source
            .chars()
            .skip(line_start)
            .take_while(|&c| c != '\n')
            .collect();

        Self {
            offset,
            line,
            column: count - line_start + 1,
            text: text.trim().to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)?;
        if !self.text.is_empty() {
            write!(f, " (`{}`)", self.text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_char() {
        let loc = Location::locate("abc", 0);
        assert_eq!((loc.line, loc.column), (1, 1));
        assert_eq!(loc.text, "abc");
    }

    #[test]
    fn test_second_line() {
        let loc = Location::locate("let a = 1;\n  return <div>\n", 20);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 10);
        assert_eq!(loc.text, "return <div>");
    }

    #[test]
    fn test_offset_past_end() {
        let loc = Location::locate("ab\ncd", 99);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 3);
    }

    #[test]
    fn test_display() {
        let loc = Location::locate("x\n  <a/b>", 5);
        assert_eq!(loc.to_string(), "line 2, column 4 (`<a/b>`)");
    }
}
