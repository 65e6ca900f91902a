//! Parse, compile and evaluate mathematical expressions.
//!
//! The pipeline has three stages, each usable on its own:
//!
//! - [`parse`] turns source text into an expression tree ([`Node`]),
//! - [`compile`] turns a tree into a reusable evaluator ([`Expr`]),
//! - [`Expr::eval`] runs it against a caller-owned [`Scope`].
//!
//! [`eval`] and [`eval_with_scope`] run the whole pipeline in one call:
//!
//! ```
//! use mathex::{eval, Value};
//!
//! assert_eq!(eval("2 + 3 * 4").unwrap(), Value::Num(14.0));
//! ```

use std::fmt;

pub use mathex_builtins::{
    format_number, Builtin, Complex64, Constant, Matrix, Unit, UserFunction, Value,
};
pub use mathex_compiler::{compile, compile_with, CompileError, EvalError, Expr};
pub use mathex_lexer::{tokenize, tokenize_detailed, SpannedToken, Token};
pub use mathex_parser::{
    parse, parse_with_options, Node, ParseError, ParseOptions,
};
pub use mathex_runtime::{
    call_builtin, default_namespace, Entry, Namespace, RawFn, Scope,
};
pub use mathex_typed::{clear_cache, typed, DispatchError, TypedError, TypedFunction};

/// Any error from the parse, compile or eval stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Parse(ParseError),
    Compile(CompileError),
    Eval(EvalError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "{e}"),
            Error::Compile(e) => write!(f, "{e}"),
            Error::Eval(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Self {
        Error::Compile(e)
    }
}

impl From<EvalError> for Error {
    fn from(e: EvalError) -> Self {
        Error::Eval(e)
    }
}

/// Parse, compile and evaluate `src` against a fresh scope.
pub fn eval(src: &str) -> Result<Value, Error> {
    let mut scope = Scope::new();
    eval_with_scope(src, &mut scope)
}

/// Parse, compile and evaluate `src` against `scope`. Assignments in the
/// expression write through to the scope.
pub fn eval_with_scope(src: &str, scope: &mut Scope) -> Result<Value, Error> {
    let node = parse(src)?;
    let expr = compile(&node)?;
    Ok(expr.eval(scope)?)
}
