//! In-source pragma comments.
//!
//! `// @jsx h` selects the element factory and `/** @jsxFrag Fragment */`
//! the fragment identifier for one compilation. Directives are read from the
//! original source, before comments are stripped.

use once_cell::sync::Lazy;
use regex::Regex;

static FACTORY_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(//|/\*|/\*\*)\s+@jsx\s+([a-zA-Z.]+)").expect("factory directive pattern is valid")
});

static FRAGMENT_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(//|/\*|/\*\*)\s+@jsxFrag\s+([a-zA-Z.]+)")
        .expect("fragment directive pattern is valid")
});

/// Identifiers selected by directive comments. `None` means use the configured default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    pub factory: Option<String>,
    pub fragment: Option<String>,
}

impl Directives {
    /// Scan `source` for the first `@jsx` and `@jsxFrag` directives.
    pub fn scan(source: &str) -> Self {
        Self {
            factory: capture(&FACTORY_DIRECTIVE, source),
            fragment: capture(&FRAGMENT_DIRECTIVE, source),
        }
    }
}

fn capture(pattern: &Regex, source: &str) -> Option<String> {
    pattern
        .captures(source)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_directives() {
        assert_eq!(Directives::scan("return <div/>"), Directives::default());
    }

    #[test]
    fn test_line_comment_factory() {
        let d = Directives::scan("// @jsx preact.h\nreturn <div/>");
        assert_eq!(d.factory.as_deref(), Some("preact.h"));
        assert_eq!(d.fragment, None);
    }

    #[test]
    fn test_block_comment_fragment() {
        let d = Directives::scan("/** @jsxFrag Vue.Fragment */");
        assert_eq!(d.fragment.as_deref(), Some("Vue.Fragment"));
        assert_eq!(d.factory, None);
    }

    #[test]
    fn test_both_directives() {
        let d = Directives::scan("/* @jsx h */\n/* @jsxFrag Frag */");
        assert_eq!(d.factory.as_deref(), Some("h"));
        assert_eq!(d.fragment.as_deref(), Some("Frag"));
    }

    #[test]
    fn test_directive_requires_whitespace() {
        assert_eq!(Directives::scan("//@jsx h").factory, None);
    }
}
