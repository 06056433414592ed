//! WASM bindings for the compiler.
//!
//! Exposes `compile()` and `compileToComponent()` to JavaScript via
//! wasm-bindgen. Options are a plain object with the camelCase keys of
//! [`CompileOptions`]; any key may be omitted.

use js_sys::{Array, Function, Object, Reflect};
use jsx_codegen::{CompileOptions, Compiler, ComponentError, Evaluator};
use wasm_bindgen::prelude::*;

/// Compile source text to plain script text. Throws on error.
#[wasm_bindgen]
pub fn compile(source: &str, options: JsValue) -> Result<String, JsError> {
    let options = options_from_js(options)?;
    compile_with(source, options).map_err(|e| JsError::new(&e))
}

/// Compile source text into a `props => element` function.
///
/// The generated body runs with every key of `context` in scope as a
/// parameter, `React` bound to `factory_namespace`, and `props`.
#[wasm_bindgen(js_name = compileToComponent)]
pub fn compile_to_component(
    context: Object,
    source: &str,
    factory_namespace: JsValue,
    options: JsValue,
) -> Result<Function, JsValue> {
    let compiler = Compiler::new(options_from_js(options)?);
    let evaluator = FunctionEvaluator { factory_namespace };

    compiler
        .compile_to_component(&evaluator, context, source)
        .map_err(|e| match e {
            ComponentError::Compile(e) => JsError::new(&e.to_string()).into(),
            ComponentError::Evaluate(value) => value,
        })
}

/// Get the compiler version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn options_from_js(value: JsValue) -> Result<CompileOptions, JsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(CompileOptions::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsError::new(&format!("Invalid options: {e}")))
}

fn compile_with(source: &str, options: CompileOptions) -> Result<String, String> {
    Compiler::new(options)
        .compile_to_string(source)
        .map_err(|e| e.to_string())
}

/// Parameter list for the generated function: context keys, then `React`, then `props`.
fn parameter_list(context_keys: &[String]) -> String {
    context_keys
        .iter()
        .map(String::as_str)
        .chain(["React", "props"])
        .collect::<Vec<_>>()
        .join(",")
}

/// Builds components with the host's `Function` constructor.
struct FunctionEvaluator {
    factory_namespace: JsValue,
}

impl Evaluator for FunctionEvaluator {
    type Context = Object;
    type Component = Function;
    type Error = JsValue;

    fn evaluate(&self, context: Object, body: &str) -> Result<Function, JsValue> {
        let keys: Vec<String> = Object::keys(&context)
            .iter()
            .filter_map(|key| key.as_string())
            .collect();
        let func = Function::new_with_args(&parameter_list(&keys), body);

        // func.bind(null, ...Object.values(context), React)
        let bind_args = Array::of1(&JsValue::NULL)
            .concat(&Object::values(&context))
            .concat(&Array::of1(&self.factory_namespace));
        let bind: Function = Reflect::get(&func, &JsValue::from_str("bind"))?.dyn_into()?;
        bind.apply(&func, &bind_args)?.dyn_into::<Function>()
    }
}
