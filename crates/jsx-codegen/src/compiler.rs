//! Compiler facade: bypass check, directives, and the four stages in order.

use crate::component::{ComponentError, Evaluator};
use crate::generate::Generator;
use crate::options::CompileOptions;
use crate::CompileError;
use jsx_lexer::{Directives, Scanner, Token};
use jsx_parser::{Parser, Program};
use tracing::{debug, instrument};

/// Whether `source` looks like output that has already been compiled:
/// a single line containing `if(` or a minified `}render(){return`.
pub fn is_already_compiled(source: &str) -> bool {
    !source.contains('\n') && (source.contains("if(") || source.contains("}render(){return"))
}

/// Compile `source` with `options`.
pub fn compile(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    Compiler::new(options.clone()).compile_to_string(source)
}

/// Source-to-source compiler.
///
/// Holds only immutable configuration; all lexer and parser state is
/// created per call, so one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Compile source text into plain script text.
    #[instrument(skip(self, source), fields(len = source.len()))]
    pub fn compile_to_string(&self, source: &str) -> Result<String, CompileError> {
        if self.options.skip_if_already_compiled && is_already_compiled(source) {
            debug!("source looks already compiled, returning it unchanged");
            return Ok(source.to_string());
        }

        let directives = Directives::scan(source);
        let program = self.parse_with(source, &directives)?;
        let factory = directives
            .factory
            .as_deref()
            .unwrap_or(&self.options.factory_identifier);

        let output = Generator::new(factory)
            .strict_mode(self.options.prepend_strict_mode)
            .generate(&program);
        debug!(len = output.len(), factory, "generated");
        Ok(output)
    }

    /// Run the lexer stages only.
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, CompileError> {
        let tokens = Scanner::tokenize(source, self.options.max_recursion_calls)?;
        debug!(count = tokens.len(), ?tokens, "tokenized");
        Ok(tokens)
    }

    /// Run the lexer and parser stages.
    pub fn parse(&self, source: &str) -> Result<Program, CompileError> {
        self.parse_with(source, &Directives::scan(source))
    }

    /// Compile `source` and hand the generated body to `evaluator`.
    pub fn compile_to_component<E: Evaluator>(
        &self,
        evaluator: &E,
        context: E::Context,
        source: &str,
    ) -> Result<E::Component, ComponentError<E::Error>> {
        let body = self.compile_to_string(source)?;
        evaluator
            .evaluate(context, &body)
            .map_err(ComponentError::Evaluate)
    }

    fn parse_with(&self, source: &str, directives: &Directives) -> Result<Program, CompileError> {
        let tokens = self.tokenize(source)?;
        let fragment = directives
            .fragment
            .as_deref()
            .unwrap_or(&self.options.fragment_identifier);

        let program = Parser::new(tokens, source)
            .fragment_identifier(fragment)
            .max_recursion_calls(self.options.max_recursion_calls)
            .parse()?;
        debug!(nodes = program.body.len(), ?program, "parsed");
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_already_compiled_signatures() {
        assert!(is_already_compiled("if(a){b()}"));
        assert!(is_already_compiled("class A{x(){}render(){return h(\"a\")}}"));
        assert!(!is_already_compiled("if(a){\nb()}"));
        assert!(!is_already_compiled("return <div/>"));
    }

    #[test]
    fn test_bypass_can_be_disabled() {
        let source = "if(a) x = <b/>";
        let compiler = Compiler::new(CompileOptions {
            skip_if_already_compiled: false,
            ..CompileOptions::default()
        });
        assert_eq!(
            compiler.compile_to_string(source).unwrap(),
            "if(a) x = React.createElement(\"b\", null)"
        );
        assert_eq!(Compiler::default().compile_to_string(source).unwrap(), source);
    }

    #[test]
    fn test_parse_uses_fragment_directive() {
        let source = "/** @jsxFrag Frag */\nreturn <></>";
        let program = Compiler::default().parse(source).unwrap();
        let name = program.body.iter().find_map(|node| match node {
            jsx_parser::Node::Element(el) => Some(el.name.clone()),
            jsx_parser::Node::Code(_) => None,
        });
        assert_eq!(name.as_deref(), Some("Frag"));
    }

    #[test]
    fn test_tokenize_reports_lexer_error() {
        let err = Compiler::default().tokenize("<a x=[1]/>").unwrap_err();
        assert!(matches!(err, CompileError::Lexer(_)));
        assert_eq!(err.location().map(|l| l.column), Some(6));
    }
}
