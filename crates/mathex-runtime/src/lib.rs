//! Concrete builtin implementations (arithmetic, comparison, logical,
//! bitwise, matrix, units) registered per typed signature, plus the
//! namespace the compiled evaluator resolves names against.

mod arithmetic;
mod bitwise;
mod comparison;
mod constants;
mod logical;
mod matrices;
mod units;

pub use arithmetic::scalar_add;

use mathex_builtins::{builtins, constants as registered_constants, Value};
use mathex_parser::Node;
use mathex_typed::{merge, typed, TypedError, TypedFunction};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

/// A raw-argument function: receives the unevaluated argument expressions
/// and the live scope instead of evaluated values.
pub type RawFn = fn(&[Node], &mut Scope) -> Result<Value, String>;

/// The caller-owned variable scope. Assignments write through to it.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject scopes binding reserved keywords; checked before every eval.
    pub fn validate(&self) -> Result<(), String> {
        if self.vars.contains_key("end") {
            return Err(
                "Scope contains an illegal symbol, \"end\" is a reserved keyword".to_string(),
            );
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), String> {
        if name == "end" {
            return Err("Cannot assign to \"end\", it is a reserved keyword".to_string());
        }
        self.vars.insert(name.to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.vars.keys()
    }
}

#[derive(Clone)]
pub enum Entry {
    Function(Arc<TypedFunction>),
    Raw(RawFn),
    Constant(Value),
}

/// Name → entry map the evaluator resolves free symbols against.
#[derive(Clone, Default)]
pub struct Namespace {
    entries: HashMap<String, Entry>,
}

impl Namespace {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble the namespace from everything submitted to the inventory
    /// registry: typed builtins merged by name, then constants.
    pub fn with_builtins() -> Result<Self, TypedError> {
        let mut by_name: HashMap<&'static str, Vec<(&'static str, mathex_typed::Impl)>> =
            HashMap::new();
        for b in builtins() {
            by_name
                .entry(b.name)
                .or_default()
                .push((b.signature, b.implementation));
        }
        let mut entries = HashMap::new();
        // deterministic construction order
        let mut names: Vec<&'static str> = by_name.keys().copied().collect();
        names.sort_unstable();
        for name in names {
            let mut sigs = by_name.remove(name).unwrap_or_default();
            sigs.sort_by_key(|(s, _)| *s);
            let f = typed(name, &sigs)?;
            entries.insert(name.to_string(), Entry::Function(f));
        }
        for c in registered_constants() {
            entries.insert(c.name.to_string(), Entry::Constant((c.value)()));
        }
        log::debug!("namespace built with {} entries", entries.len());
        Ok(Namespace { entries })
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up a typed function by name.
    pub fn function(&self, name: &str) -> Option<Arc<TypedFunction>> {
        match self.entries.get(name) {
            Some(Entry::Function(f)) => Some(f.clone()),
            _ => None,
        }
    }

    pub fn register_function(&mut self, f: Arc<TypedFunction>) -> Result<(), TypedError> {
        let name = f.name().to_string();
        let merged = match self.entries.get(&name) {
            Some(Entry::Function(existing)) => merge(&name, &[existing.clone(), f])?,
            _ => f,
        };
        self.entries.insert(name, Entry::Function(merged));
        Ok(())
    }

    /// Register a raw-argument function under `name`.
    pub fn register_raw(&mut self, name: &str, f: RawFn) {
        self.entries.insert(name.to_string(), Entry::Raw(f));
    }

    pub fn register_constant(&mut self, name: &str, value: Value) {
        self.entries.insert(name.to_string(), Entry::Constant(value));
    }
}

static DEFAULT: Lazy<Arc<Namespace>> = Lazy::new(|| {
    Arc::new(Namespace::with_builtins().expect("builtin signature registry is well-formed"))
});

/// The shared namespace holding every registered builtin and constant.
pub fn default_namespace() -> Arc<Namespace> {
    DEFAULT.clone()
}

/// Call a builtin from the default namespace by name.
pub fn call_builtin(name: &str, args: &[Value]) -> Result<Value, String> {
    match default_namespace().get(name) {
        Some(Entry::Function(f)) => f.call(args).map_err(|e| e.to_string()),
        Some(Entry::Constant(v)) if args.is_empty() => Ok(v.clone()),
        _ => Err(format!("Undefined function {name}")),
    }
}
