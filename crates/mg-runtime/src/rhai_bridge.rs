use std::collections::BTreeSet;

use rhai::{
    CallFnOptions, Dynamic, Engine, EvalAltResult, FuncArgs, ImmutableString, ParseError, Scope,
    AST, FLOAT, INT,
};

pub(crate) fn parse_error_message(filename: &str, error: &ParseError) -> String {
    format!("{}: {}", filename, error)
}

pub(crate) fn runtime_error_message(context: &str, error: &EvalAltResult) -> String {
    format!("{}: {}", context, error)
}

/// `(name, arity)` of every script function defined in `ast`.
pub(crate) fn function_signatures(ast: &AST) -> BTreeSet<(String, usize)> {
    ast.iter_functions()
        .map(|function| (function.name.to_string(), function.params.len()))
        .collect()
}

/// Calls a script function without re-running the program's top-level
/// statements and without leaking its locals into `scope`.
pub(crate) fn call_script_function(
    engine: &Engine,
    scope: &mut Scope,
    ast: &AST,
    name: &str,
    args: impl FuncArgs,
) -> Result<Dynamic, Box<EvalAltResult>> {
    let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
    engine.call_fn_with_options::<Dynamic>(options, scope, ast, name, args)
}

/// Script truthiness: `()` and `false` are false, numbers are true when non-zero,
/// anything else is true.
pub(crate) fn is_truthy(value: &Dynamic) -> bool {
    if value.is_unit() {
        return false;
    }
    if let Ok(flag) = value.as_bool() {
        return flag;
    }
    if let Ok(number) = value.as_int() {
        return number != 0;
    }
    if let Ok(number) = value.as_float() {
        return number != 0.0;
    }
    true
}

pub(crate) fn dynamic_to_text(value: &Dynamic) -> String {
    if value.is::<ImmutableString>() {
        return value.clone().cast::<ImmutableString>().to_string();
    }
    if value.is::<FLOAT>() {
        let number = value.clone().cast::<FLOAT>();
        if number.fract().abs() < f64::EPSILON {
            return (number as INT).to_string();
        }
    }
    value.to_string()
}
