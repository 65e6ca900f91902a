//! Typed multiple-dispatch: a named set of (type signature, implementation)
//! pairs compiled into one callable that picks the best match for the
//! runtime argument types, applying implicit conversions where declared.

mod signature;
mod tree;

pub use signature::{parse_signature, type_index, Conversion, Impl, CONVERSIONS, TYPES};

use mathex_builtins::Value;
use once_cell::sync::Lazy;
use signature::{compare, expand, ExpandedSig};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A call that could not be routed to any implementation.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    TooFewArgs {
        name: String,
        supplied: usize,
        index: usize,
        expected: Vec<String>,
    },
    TooManyArgs {
        name: String,
        supplied: usize,
        expected: usize,
    },
    WrongType {
        name: String,
        supplied: usize,
        index: usize,
        actual: String,
        expected: Vec<String>,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::TooFewArgs { name, index, expected, .. } => write!(
                f,
                "Too few arguments in function {name} (expected: {}, index: {index})",
                expected.join(" or ")
            ),
            DispatchError::TooManyArgs { name, supplied, expected } => write!(
                f,
                "Too many arguments in function {name} (expected: {expected}, actual: {supplied})"
            ),
            DispatchError::WrongType { name, index, actual, expected, .. } => write!(
                f,
                "Unexpected type of argument in function {name} (expected: {}, actual: {actual}, index: {index})",
                expected.join(" or ")
            ),
        }
    }
}

impl std::error::Error for DispatchError {}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedError {
    /// Signature-string or construction problem.
    Signature(String),
    Dispatch(DispatchError),
    /// An implementation ran and failed.
    Runtime(String),
}

impl fmt::Display for TypedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedError::Signature(msg) | TypedError::Runtime(msg) => write!(f, "{msg}"),
            TypedError::Dispatch(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TypedError {}

impl From<DispatchError> for TypedError {
    fn from(e: DispatchError) -> Self {
        TypedError::Dispatch(e)
    }
}

/// A dispatching function. Immutable once built; share via `Arc`.
pub struct TypedFunction {
    name: String,
    /// Expanded signatures in precedence order; kept for error reporting.
    sigs: Vec<ExpandedSig>,
    tree: tree::TreeNode,
    /// The declared, non-converting signatures for introspection and
    /// merging: normalized signature string -> implementation.
    exact: Vec<(String, Impl)>,
}

impl fmt::Debug for TypedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sigs: Vec<&str> = self.exact.iter().map(|(s, _)| s.as_str()).collect();
        write!(
            f,
            "TypedFunction {{ name: {:?}, signatures: {:?} }}",
            self.name, sigs
        )
    }
}

impl TypedFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The normalized non-converting signature map.
    pub fn signatures(&self) -> &[(String, Impl)] {
        &self.exact
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, TypedError> {
        match self.tree.dispatch(args) {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(TypedError::Runtime(message)),
            None => Err(self.explain_failure(args).into()),
        }
    }

    /// Reconstruct the most useful error for a failed dispatch: wrong arity
    /// when no signature accepts this many arguments, otherwise the wrong
    /// type at the deepest argument position any signature reaches.
    fn explain_failure(&self, args: &[Value]) -> DispatchError {
        let arity_ok = self.sigs.iter().any(|s| match &s.variadic {
            Some(_) => args.len() > s.params.len(),
            None => args.len() == s.params.len(),
        });
        if !arity_ok {
            let max_arity = self
                .sigs
                .iter()
                .map(|s| s.params.len() + usize::from(s.variadic.is_some()))
                .max()
                .unwrap_or(0);
            if args.len() > max_arity && self.sigs.iter().all(|s| s.variadic.is_none()) {
                return DispatchError::TooManyArgs {
                    name: self.name.clone(),
                    supplied: args.len(),
                    expected: max_arity,
                };
            }
            // too few: report the types wanted at the first missing position
            let mut expected = Vec::new();
            for sig in &self.sigs {
                if sig.prefix_len(args) == args.len() {
                    if let Some(t) = sig.type_at(args.len()) {
                        push_unique(&mut expected, t);
                    }
                }
            }
            return DispatchError::TooFewArgs {
                name: self.name.clone(),
                supplied: args.len(),
                index: args.len(),
                expected,
            };
        }

        // find the deepest position any arity-compatible signature matches to
        let mut best_index = 0;
        for sig in &self.sigs {
            best_index = best_index.max(sig.prefix_len(args));
        }
        let mut expected = Vec::new();
        for sig in &self.sigs {
            if sig.prefix_len(args) >= best_index {
                if let Some(t) = sig.type_at(best_index) {
                    push_unique(&mut expected, t);
                }
            }
        }
        DispatchError::WrongType {
            name: self.name.clone(),
            supplied: args.len(),
            index: best_index,
            actual: args
                .get(best_index)
                .map(|v| v.type_name().to_string())
                .unwrap_or_default(),
            expected,
        }
    }
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

impl ExpandedSig {
    /// How many leading call arguments this signature accepts.
    fn prefix_len(&self, args: &[Value]) -> usize {
        for (i, arg) in args.iter().enumerate() {
            let accepted = match self.params.get(i) {
                Some(p) => p.type_name == arg.type_name() || p.type_name == "any",
                None => match &self.variadic {
                    Some(v) => {
                        let actual = arg.type_name();
                        v.types.iter().any(|t| t == actual || t == "any")
                            || v.conversions.iter().any(|(from, _)| from == actual)
                    }
                    None => false,
                },
            };
            if !accepted {
                return i;
            }
        }
        args.len()
    }

    /// The declared type at argument position `i`, if this signature has one.
    fn type_at(&self, i: usize) -> Option<String> {
        match self.params.get(i) {
            Some(p) => Some(p.type_name.clone()),
            None => self.variadic.as_ref().map(|v| v.types.join(" or ")),
        }
    }
}

fn cache_key(name: &str, entries: &[(&str, Impl)]) -> String {
    let mut key = String::from(name);
    for (sig, imp) in entries {
        key.push(';');
        key.push_str(sig);
        key.push('@');
        key.push_str(&format!("{:x}", *imp as usize));
    }
    key
}

static CACHE: Lazy<Mutex<HashMap<String, Arc<TypedFunction>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Drop all memoized dispatchers.
pub fn clear_cache() {
    CACHE.lock().unwrap().clear();
}

/// Build (or fetch from the memo cache) a dispatcher for the given
/// signature map. Entry order does not affect dispatch results.
pub fn typed(name: &str, entries: &[(&str, Impl)]) -> Result<Arc<TypedFunction>, TypedError> {
    let key = cache_key(name, entries);
    if let Some(hit) = CACHE.lock().unwrap().get(&key) {
        log::debug!("typed dispatcher cache hit for '{name}'");
        return Ok(hit.clone());
    }
    let built = Arc::new(build_typed(name, entries)?);
    CACHE.lock().unwrap().insert(key, built.clone());
    Ok(built)
}

fn build_typed(name: &str, entries: &[(&str, Impl)]) -> Result<TypedFunction, TypedError> {
    let mut sigs: Vec<ExpandedSig> = Vec::new();
    let mut exact: Vec<(String, Impl)> = Vec::new();
    for (sig_str, imp) in entries {
        let params = parse_signature(sig_str).map_err(TypedError::Signature)?;
        let expanded = expand(&params, *imp);
        for sig in &expanded {
            if sig.conversion_count() == 0 {
                let key = sig.type_key();
                if let Some((_, existing)) = exact.iter().find(|(k, _)| *k == key) {
                    if !std::ptr::fn_addr_eq(*existing, *imp) {
                        return Err(TypedError::Signature(format!(
                            "Signature \"{key}\" is defined twice"
                        )));
                    }
                } else {
                    exact.push((key, *imp));
                }
            }
        }
        sigs.extend(expanded);
    }

    sigs.sort_by(compare);
    // after sorting, keep the most specific entry per literal type tuple;
    // an exact signature always shadows one synthesized via conversions
    let mut seen: Vec<String> = Vec::new();
    sigs.retain(|s| {
        let key = s.type_key();
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });

    log::debug!(
        "built typed dispatcher '{}' with {} expanded signatures",
        name,
        sigs.len()
    );
    let tree = tree::build(&sigs);
    Ok(TypedFunction {
        name: name.to_string(),
        sigs,
        tree,
        exact,
    })
}

/// Union of the overloads of several typed functions. Disagreeing on an
/// identical signature is an error.
pub fn merge(name: &str, fns: &[Arc<TypedFunction>]) -> Result<Arc<TypedFunction>, TypedError> {
    let mut entries: Vec<(String, Impl)> = Vec::new();
    for f in fns {
        for (sig, imp) in f.signatures() {
            if let Some((_, existing)) = entries.iter().find(|(s, _)| s == sig) {
                if !std::ptr::fn_addr_eq(*existing, *imp) {
                    return Err(TypedError::Signature(format!(
                        "Signature \"{sig}\" is defined twice"
                    )));
                }
            } else {
                entries.push((sig.clone(), *imp));
            }
        }
    }
    let borrowed: Vec<(&str, Impl)> = entries.iter().map(|(s, i)| (s.as_str(), *i)).collect();
    typed(name, &borrowed)
}

/// Exact-match lookup of one implementation by signature; no fuzzy
/// matching and no conversions.
pub fn find(f: &TypedFunction, spec: &str) -> Option<Impl> {
    let params = parse_signature(spec).ok()?;
    let normalized = params
        .iter()
        .map(|p| {
            let types = p.types.join("|");
            if p.variadic {
                format!("...{types}")
            } else {
                types
            }
        })
        .collect::<Vec<_>>()
        .join(",");
    f.signatures()
        .iter()
        .find(|(sig, _)| *sig == normalized)
        .map(|(_, imp)| *imp)
}

/// One-shot application of a registered conversion.
pub fn convert(value: &Value, target: &str) -> Result<Value, TypedError> {
    if value.type_name() == target {
        return Ok(value.clone());
    }
    let actual = value.type_name();
    match CONVERSIONS
        .iter()
        .find(|c| c.from == actual && c.to == target)
    {
        Some(c) => (c.convert)(value).map_err(TypedError::Runtime),
        None => Err(TypedError::Runtime(format!(
            "cannot convert {actual} to {target}"
        ))),
    }
}
