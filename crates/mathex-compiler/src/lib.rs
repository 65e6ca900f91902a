//! Compile expression trees into reusable evaluators.
//!
//! Compilation walks the tree once and produces a tree of closures; an
//! [`Expr`] can then be evaluated many times against different scopes
//! without touching the AST again. Name resolution against the namespace
//! happens at compile time where possible (operator functions), at eval
//! time where it must (free symbols, user functions in scope).

mod compiler;

use mathex_builtins::Value;
use mathex_parser::Node;
use mathex_runtime::{default_namespace, Namespace, Scope};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// An error detected while compiling, before any evaluation happens.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    fn new(message: impl Into<String>) -> Self {
        CompileError { message: message.into() }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompileError {}

/// An error raised during evaluation of a compiled expression.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A free symbol resolved against neither scope nor namespace.
    UndefinedSymbol(String),
    /// A function call failed: unknown function, dispatch failure, or an
    /// error from the implementation itself.
    Function(String),
    /// An index was out of range, non-integer, or dimensionally wrong.
    Index(String),
    /// The caller-supplied scope is invalid.
    Scope(String),
    /// A value had the wrong type for the position it was used in.
    Type(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UndefinedSymbol(name) => write!(f, "Undefined symbol {name}"),
            EvalError::Function(msg)
            | EvalError::Index(msg)
            | EvalError::Scope(msg)
            | EvalError::Type(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Mutable state threaded through one evaluation: the caller's scope,
/// call frames for user-defined functions, and the stack of dimension
/// extents the `end` symbol resolves against inside indices.
pub struct EvalContext<'a> {
    pub(crate) scope: &'a mut Scope,
    pub(crate) namespace: Arc<Namespace>,
    pub(crate) frames: Vec<HashMap<String, Value>>,
    pub(crate) end_stack: Vec<usize>,
}

impl<'a> EvalContext<'a> {
    /// Resolve a name against call frames (innermost first), then the
    /// caller's scope. Namespace entries are not consulted here.
    pub(crate) fn lookup_local(&self, name: &str) -> Option<Value> {
        for frame in self.frames.iter().rev() {
            if let Some(v) = frame.get(name) {
                return Some(v.clone());
            }
        }
        self.scope.get(name).cloned()
    }

    /// Bind a name in the innermost frame, or the scope at top level.
    pub(crate) fn assign(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        match self.frames.last_mut() {
            Some(frame) => {
                if name == "end" {
                    return Err(EvalError::Scope(
                        "Cannot assign to \"end\", it is a reserved keyword".to_string(),
                    ));
                }
                frame.insert(name.to_string(), value);
                Ok(())
            }
            None => self.scope.set(name, value).map_err(EvalError::Scope),
        }
    }
}

pub(crate) type Thunk = Arc<dyn Fn(&mut EvalContext) -> Result<Value, EvalError> + Send + Sync>;

/// Compile-time environment: which names are bound as function parameters
/// (and therefore resolve dynamically) and whether `end` is legal here.
#[derive(Clone)]
pub(crate) struct CompileCtx {
    pub namespace: Arc<Namespace>,
    pub params: HashSet<String>,
    pub allow_end: bool,
}

/// A compiled expression, ready to evaluate against any scope.
pub struct Expr {
    thunk: Thunk,
    namespace: Arc<Namespace>,
}

impl Expr {
    /// Evaluate against `scope`. The scope is validated first; assignments
    /// in the expression write through to it.
    pub fn eval(&self, scope: &mut Scope) -> Result<Value, EvalError> {
        scope.validate().map_err(EvalError::Scope)?;
        let mut ctx = EvalContext {
            scope,
            namespace: self.namespace.clone(),
            frames: Vec::new(),
            end_stack: Vec::new(),
        };
        (self.thunk)(&mut ctx)
    }

    pub fn namespace(&self) -> &Arc<Namespace> {
        &self.namespace
    }
}

/// Compile against the default namespace.
pub fn compile(node: &Node) -> Result<Expr, CompileError> {
    compile_with(node, default_namespace())
}

/// Compile against a caller-assembled namespace.
pub fn compile_with(node: &Node, namespace: Arc<Namespace>) -> Result<Expr, CompileError> {
    let ctx = CompileCtx {
        namespace: namespace.clone(),
        params: HashSet::new(),
        allow_end: false,
    };
    let thunk = compiler::compile_node(node, &ctx)?;
    log::trace!("compiled expression");
    Ok(Expr { thunk, namespace })
}
