use jsx_lexer::{DEFAULT_FRAGMENT_IDENTIFIER, DEFAULT_MAX_RECURSION_CALLS};
use serde::Deserialize;

/// Compiler configuration.
///
/// Deserializes from camelCase keys with every field optional, so a
/// partial JS options object maps directly onto it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Element factory used when no `@jsx` directive is present.
    pub factory_identifier: String,
    /// Fragment component used when no `@jsxFrag` directive is present.
    pub fragment_identifier: String,
    /// Ceiling on recursive calls per stage per compilation.
    pub max_recursion_calls: usize,
    /// Prepend `"use strict";` unless the output already contains it.
    #[serde(alias = "prependStrictModeDirective")]
    pub prepend_strict_mode: bool,
    /// Return single-line, already-compiled looking input unchanged.
    pub skip_if_already_compiled: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            factory_identifier: String::from("React.createElement"),
            fragment_identifier: String::from(DEFAULT_FRAGMENT_IDENTIFIER),
            max_recursion_calls: DEFAULT_MAX_RECURSION_CALLS,
            prepend_strict_mode: false,
            skip_if_already_compiled: true,
        }
    }
}
