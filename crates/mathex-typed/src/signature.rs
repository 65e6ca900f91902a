//! Signature strings, their expansion into single-type tuples, and the
//! global precedence ordering used to build the dispatch tree.

use mathex_builtins::{Complex64, Value};
use std::cmp::Ordering;

/// One concrete implementation behind a typed function.
pub type Impl = fn(&[Value]) -> Result<Value, String>;

/// Fixed global type order; concrete types come before `any`.
pub const TYPES: &[&str] = &[
    "number",
    "Complex",
    "boolean",
    "string",
    "Matrix",
    "Unit",
    "Function",
    "ResultSet",
    "null",
    // Object sorts after every concrete type but before the wildcard
    "Object",
    "any",
];

pub fn type_index(name: &str) -> Option<usize> {
    TYPES.iter().position(|t| *t == name)
}

/// An implicit conversion rule. Declaration order doubles as preference
/// order when several conversions could satisfy one parameter.
pub struct Conversion {
    pub from: &'static str,
    pub to: &'static str,
    pub convert: fn(&Value) -> Result<Value, String>,
}

fn boolean_to_number(v: &Value) -> Result<Value, String> {
    match v {
        Value::Bool(b) => Ok(Value::Num(if *b { 1.0 } else { 0.0 })),
        other => Err(format!("cannot convert {} to number", other.type_name())),
    }
}

fn number_to_complex(v: &Value) -> Result<Value, String> {
    match v {
        Value::Num(n) => Ok(Value::Complex(Complex64::new(*n, 0.0))),
        other => Err(format!("cannot convert {} to Complex", other.type_name())),
    }
}

fn boolean_to_complex(v: &Value) -> Result<Value, String> {
    match v {
        Value::Bool(b) => Ok(Value::Complex(Complex64::new(
            if *b { 1.0 } else { 0.0 },
            0.0,
        ))),
        other => Err(format!("cannot convert {} to Complex", other.type_name())),
    }
}

pub const CONVERSIONS: &[Conversion] = &[
    Conversion { from: "boolean", to: "number", convert: boolean_to_number },
    Conversion { from: "number", to: "Complex", convert: number_to_complex },
    Conversion { from: "boolean", to: "Complex", convert: boolean_to_complex },
];

/// One parameter of a signature string: alternatives plus variadic flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedParam {
    pub types: Vec<String>,
    pub variadic: bool,
}

/// Split a signature string (`"number|boolean, ...any"`) into parameters.
pub fn parse_signature(signature: &str) -> Result<Vec<ParsedParam>, String> {
    let trimmed = signature.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let parts: Vec<&str> = trimmed.split(',').collect();
    let count = parts.len();
    let mut params = Vec::with_capacity(count);
    for (i, part) in parts.into_iter().enumerate() {
        let mut part = part.trim();
        let variadic = part.starts_with("...");
        if variadic {
            if i + 1 != count {
                return Err(format!(
                    "Unexpected variadic parameter \"{part}\" (only allowed in last position)"
                ));
            }
            part = part[3..].trim();
        }
        let mut types = Vec::new();
        for t in part.split('|') {
            let t = t.trim();
            if type_index(t).is_none() {
                return Err(format!("Unknown type \"{t}\" in signature \"{signature}\""));
            }
            types.push(t.to_string());
        }
        params.push(ParsedParam { types, variadic });
    }
    Ok(params)
}

/// A single-type match for one fixed parameter after expansion. A set
/// `conversion` means the argument is converted before dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamMatch {
    pub type_name: String,
    pub conversion: Option<usize>,
}

/// The trailing variadic parameter keeps its full alternative set; each call
/// argument is checked (and possibly converted) individually.
#[derive(Debug, Clone, PartialEq)]
pub struct VariadicMatch {
    pub types: Vec<String>,
    /// (from-type, conversion index) pairs reaching one of `types`.
    pub conversions: Vec<(String, usize)>,
}

#[derive(Clone)]
pub struct ExpandedSig {
    pub params: Vec<ParamMatch>,
    pub variadic: Option<VariadicMatch>,
    pub implementation: Impl,
}

impl ExpandedSig {
    pub fn arity(&self) -> usize {
        self.params.len() + usize::from(self.variadic.is_some())
    }

    pub fn conversion_count(&self) -> usize {
        self.params.iter().filter(|p| p.conversion.is_some()).count()
    }

    /// Literal type tuple, the deduplication key.
    pub fn type_key(&self) -> String {
        let mut parts: Vec<String> = self.params.iter().map(|p| p.type_name.clone()).collect();
        if let Some(v) = &self.variadic {
            parts.push(format!("...{}", v.types.join("|")));
        }
        parts.join(",")
    }
}

fn applicable_conversions(types: &[String]) -> Vec<(String, usize)> {
    let mut out = Vec::new();
    for (ci, c) in CONVERSIONS.iter().enumerate() {
        if types.iter().any(|t| t == c.to) && !types.iter().any(|t| t == c.from) {
            out.push((c.from.to_string(), ci));
        }
    }
    out
}

/// Explode alternatives into the cartesian product of single-type
/// signatures and synthesize one extra signature per reachable conversion.
pub fn expand(params: &[ParsedParam], implementation: Impl) -> Vec<ExpandedSig> {
    let (fixed, variadic) = match params.last() {
        Some(last) if last.variadic => (
            &params[..params.len() - 1],
            Some(VariadicMatch {
                types: last.types.clone(),
                conversions: applicable_conversions(&last.types),
            }),
        ),
        _ => (params, None),
    };

    // per-parameter choices: exact alternatives first, conversions after
    let choices: Vec<Vec<ParamMatch>> = fixed
        .iter()
        .map(|p| {
            let mut c: Vec<ParamMatch> = p
                .types
                .iter()
                .map(|t| ParamMatch {
                    type_name: t.clone(),
                    conversion: None,
                })
                .collect();
            for (from, ci) in applicable_conversions(&p.types) {
                c.push(ParamMatch {
                    type_name: from,
                    conversion: Some(ci),
                });
            }
            c
        })
        .collect();

    let mut out = Vec::new();
    let mut current = Vec::with_capacity(choices.len());
    cartesian(&choices, &mut current, &mut |params| {
        out.push(ExpandedSig {
            params: params.to_vec(),
            variadic: variadic.clone(),
            implementation,
        });
    });
    out
}

fn cartesian(
    choices: &[Vec<ParamMatch>],
    current: &mut Vec<ParamMatch>,
    emit: &mut dyn FnMut(&[ParamMatch]),
) {
    match choices.split_first() {
        None => emit(current),
        Some((first, rest)) => {
            for choice in first {
                current.push(choice.clone());
                cartesian(rest, current, emit);
                current.pop();
            }
        }
    }
}

fn param_rank(p: &ParamMatch) -> (usize, usize) {
    match p.conversion {
        // exact matches order by the global type list
        None => (0, type_index(&p.type_name).unwrap_or(usize::MAX)),
        // conversions order by declaration
        Some(ci) => (1, ci),
    }
}

/// Global precedence: fewer parameters, non-variadic before variadic, fewer
/// conversions, then parameter-by-parameter type order.
pub fn compare(a: &ExpandedSig, b: &ExpandedSig) -> Ordering {
    a.arity()
        .cmp(&b.arity())
        .then_with(|| a.variadic.is_some().cmp(&b.variadic.is_some()))
        .then_with(|| a.conversion_count().cmp(&b.conversion_count()))
        .then_with(|| {
            for (pa, pb) in a.params.iter().zip(b.params.iter()) {
                let ord = param_rank(pa).cmp(&param_rank(pb));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        })
        .then_with(|| variadic_rank(a).cmp(&variadic_rank(b)))
}

fn variadic_rank(sig: &ExpandedSig) -> Vec<usize> {
    match &sig.variadic {
        Some(v) => v
            .types
            .iter()
            .map(|t| type_index(t).unwrap_or(usize::MAX))
            .collect(),
        None => Vec::new(),
    }
}
