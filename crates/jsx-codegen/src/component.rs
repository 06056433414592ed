//! Turning generated code into a callable component.
//!
//! Evaluation is environment specific (a JS engine, a sandboxed
//! interpreter), so it sits behind the [`Evaluator`] trait.

use crate::CompileError;

/// Builds a callable component from a generated code body.
///
/// The body is written to run with the context names, the factory
/// namespace, and `props` in scope, and to `return` the element tree.
pub trait Evaluator {
    /// Names and values made available to the body.
    type Context;
    /// The callable produced, typically `props → element`.
    type Component;
    type Error;

    fn evaluate(&self, context: Self::Context, body: &str) -> Result<Self::Component, Self::Error>;
}

/// Failure to compile or to evaluate a component.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError<E> {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Evaluation error: {0}")]
    Evaluate(E),
}
