pub use inventory;
pub use num_complex::Complex64;

use mathex_parser::Node;
use std::convert::TryFrom;
use std::fmt;
use std::sync::Arc;

mod matrix;
mod unit;

pub use matrix::Matrix;
pub use unit::{find_unit, is_unit_name, Quantity, Unit, UnitDef};

/// Runtime value. Every expression evaluates to one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Complex(Complex64),
    Bool(bool),
    Str(String),
    Matrix(Matrix),
    Unit(Unit),
    /// An object literal `{key: value}`; keys kept sorted for
    /// deterministic display and equality
    Object(std::collections::BTreeMap<String, Value>),
    /// A user-defined function created by `f(x) = ...`
    Function(Arc<UserFunction>),
    /// Results of a multi-statement block; only visible statements included
    ResultSet(Vec<Value>),
    Null,
}

/// A function defined in the expression language. The body is kept as an
/// AST so calls can be evaluated against the scope of the call site.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: Node,
}

impl Value {
    /// Materialize a numeric literal from its source text. This is the
    /// seam where an alternative numeric backend would plug in; only the
    /// `f64` backend is wired up.
    pub fn from_literal(text: &str) -> Result<Value, String> {
        text.parse::<f64>()
            .map(Value::Num)
            .map_err(|_| format!("Invalid number literal \"{text}\""))
    }

    /// The type name used by the dispatcher and in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Complex(_) => "Complex",
            Value::Bool(_) => "boolean",
            Value::Str(_) => "string",
            Value::Matrix(_) => "Matrix",
            Value::Unit(_) => "Unit",
            Value::Object(_) => "Object",
            Value::Function(_) => "Function",
            Value::ResultSet(_) => "ResultSet",
            Value::Null => "null",
        }
    }
}

// From implementations for Value
impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Num(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Complex64> for Value {
    fn from(c: Complex64) -> Self {
        Value::Complex(c)
    }
}

impl From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Value::Matrix(m)
    }
}

impl From<Unit> for Value {
    fn from(u: Unit) -> Self {
        Value::Unit(u)
    }
}

// TryFrom implementations for extracting native types
impl TryFrom<&Value> for f64 {
    type Error = String;
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Num(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            _ => Err(format!("cannot convert {} to number", v.type_name())),
        }
    }
}

impl TryFrom<&Value> for Complex64 {
    type Error = String;
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Complex(c) => Ok(*c),
            Value::Num(n) => Ok(Complex64::new(*n, 0.0)),
            Value::Bool(b) => Ok(Complex64::new(if *b { 1.0 } else { 0.0 }, 0.0)),
            _ => Err(format!("cannot convert {} to Complex", v.type_name())),
        }
    }
}

impl TryFrom<&Value> for bool {
    type Error = String;
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Bool(b) => Ok(*b),
            _ => Err(format!("cannot convert {} to boolean", v.type_name())),
        }
    }
}

impl TryFrom<&Value> for String {
    type Error = String;
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Str(s) => Ok(s.clone()),
            _ => Err(format!("cannot convert {} to string", v.type_name())),
        }
    }
}

impl TryFrom<&Value> for Matrix {
    type Error = String;
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Matrix(m) => Ok(m.clone()),
            _ => Err(format!("cannot convert {} to Matrix", v.type_name())),
        }
    }
}

/// A builtin function implementation for one typed signature. Entries with
/// the same name are merged into a single dispatched function when the
/// namespace is assembled.
#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    /// Comma-separated parameter types; `|` for alternatives, a leading
    /// `...` on the last parameter for variadics, e.g. `"number|boolean"`.
    pub signature: &'static str,
    pub implementation: fn(&[Value]) -> Result<Value, String>,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin {{ name: {:?}, signature: {:?} }}", self.name, self.signature)
    }
}

/// A named constant exposed in the default namespace.
#[derive(Debug, Clone)]
pub struct Constant {
    pub name: &'static str,
    pub value: fn() -> Value,
}

inventory::collect!(Builtin);
inventory::collect!(Constant);

pub fn builtins() -> Vec<&'static Builtin> {
    inventory::iter::<Builtin>().collect()
}

pub fn constants() -> Vec<&'static Constant> {
    inventory::iter::<Constant>().collect()
}

pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_negative() {
            "-Infinity"
        } else {
            "Infinity"
        }
        .to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    // round to 14 significant digits so binary representation drift
    // (e.g. 5.08 * 0.01 / 0.0254) does not leak into display
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(13 - magnitude);
    let value = if factor.is_finite() && factor > 0.0 {
        (value * factor).round() / factor
    } else {
        value
    };
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

fn format_complex(c: &Complex64) -> String {
    if c.im == 0.0 {
        return format_number(c.re);
    }
    let im = if c.im == 1.0 {
        "i".to_string()
    } else if c.im == -1.0 {
        "-i".to_string()
    } else {
        format!("{}i", format_number(c.im))
    };
    if c.re == 0.0 {
        im
    } else if c.im < 0.0 {
        format!("{} - {}", format_number(c.re), im.trim_start_matches('-'))
    } else {
        format!("{} + {}", format_number(c.re), im)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(n) => write!(f, "{}", format_number(*n)),
            Value::Complex(c) => write!(f, "{}", format_complex(c)),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::Matrix(m) => write!(f, "{m}"),
            Value::Unit(u) => write!(f, "{u}"),
            Value::Object(props) => {
                write!(f, "{{")?;
                for (i, (k, v)) in props.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => {
                write!(f, "{}({}) = {}", func.name, func.params.join(", "), func.body)
            }
            Value::ResultSet(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Null => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names() {
        assert_eq!(Value::Num(1.0).type_name(), "number");
        assert_eq!(Value::Complex(Complex64::new(0.0, 1.0)).type_name(), "Complex");
        assert_eq!(Value::Bool(true).type_name(), "boolean");
        assert_eq!(Value::Str("x".into()).type_name(), "string");
        assert_eq!(Value::Null.type_name(), "null");
    }

    #[test]
    fn display_numbers() {
        assert_eq!(Value::Num(14.0).to_string(), "14");
        assert_eq!(Value::Num(0.5).to_string(), "0.5");
        assert_eq!(Value::Num(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Num(f64::INFINITY).to_string(), "Infinity");
    }

    #[test]
    fn display_rounds_away_representation_drift() {
        assert_eq!(Value::Num(2.000_000_000_000_000_4).to_string(), "2");
        assert_eq!(Value::Num(0.1 + 0.2).to_string(), "0.3");
    }

    #[test]
    fn display_complex() {
        assert_eq!(Value::Complex(Complex64::new(2.0, 3.0)).to_string(), "2 + 3i");
        assert_eq!(Value::Complex(Complex64::new(2.0, -3.0)).to_string(), "2 - 3i");
        assert_eq!(Value::Complex(Complex64::new(0.0, 1.0)).to_string(), "i");
        assert_eq!(Value::Complex(Complex64::new(0.0, -2.5)).to_string(), "-2.5i");
        assert_eq!(Value::Complex(Complex64::new(4.0, 0.0)).to_string(), "4");
    }

    #[test]
    fn numeric_coercions() {
        assert_eq!(f64::try_from(&Value::Num(2.5)).unwrap(), 2.5);
        assert_eq!(f64::try_from(&Value::Bool(true)).unwrap(), 1.0);
        assert!(f64::try_from(&Value::Str("x".into())).is_err());
        let c = Complex64::try_from(&Value::Num(2.0)).unwrap();
        assert_eq!(c, Complex64::new(2.0, 0.0));
    }
}
