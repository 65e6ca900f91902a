//! Scalar and mixed arithmetic builtins.

use crate::matrices;
use mathex_builtins::{Builtin, Complex64, Unit, Value};

fn as_number(v: &Value) -> Result<f64, String> {
    match v {
        Value::Num(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(format!("unexpected {} in arithmetic", other.type_name())),
    }
}

fn as_complex(v: &Value) -> Result<Complex64, String> {
    match v {
        Value::Complex(c) => Ok(*c),
        _ => Ok(Complex64::new(as_number(v)?, 0.0)),
    }
}

fn is_complex(v: &Value) -> bool {
    matches!(v, Value::Complex(_))
}

/// Collapse a complex scalar back to a real number when its imaginary
/// part vanished (so `(2+3i) - 3i` displays as `2`).
fn simplify(c: Complex64) -> Value {
    if c.im == 0.0 {
        Value::Num(c.re)
    } else {
        Value::Complex(c)
    }
}

// Scalar kernels shared with matrix broadcasting.

pub fn scalar_add(a: &Value, b: &Value) -> Result<Value, String> {
    if is_complex(a) || is_complex(b) {
        Ok(simplify(as_complex(a)? + as_complex(b)?))
    } else {
        Ok(Value::Num(as_number(a)? + as_number(b)?))
    }
}

pub fn scalar_subtract(a: &Value, b: &Value) -> Result<Value, String> {
    if is_complex(a) || is_complex(b) {
        Ok(simplify(as_complex(a)? - as_complex(b)?))
    } else {
        Ok(Value::Num(as_number(a)? - as_number(b)?))
    }
}

pub fn scalar_multiply(a: &Value, b: &Value) -> Result<Value, String> {
    if is_complex(a) || is_complex(b) {
        Ok(simplify(as_complex(a)? * as_complex(b)?))
    } else {
        Ok(Value::Num(as_number(a)? * as_number(b)?))
    }
}

pub fn scalar_divide(a: &Value, b: &Value) -> Result<Value, String> {
    if is_complex(a) || is_complex(b) {
        Ok(simplify(as_complex(a)? / as_complex(b)?))
    } else {
        Ok(Value::Num(as_number(a)? / as_number(b)?))
    }
}

/// Real power, escalating to the complex plane for a negative base and a
/// fractional exponent.
pub fn scalar_pow(a: &Value, b: &Value) -> Result<Value, String> {
    if is_complex(a) || is_complex(b) {
        return Ok(simplify(as_complex(a)?.powc(as_complex(b)?)));
    }
    let (base, exp) = (as_number(a)?, as_number(b)?);
    if base < 0.0 && exp.fract() != 0.0 {
        return Ok(simplify(Complex64::new(base, 0.0).powc(Complex64::new(exp, 0.0))));
    }
    Ok(Value::Num(base.powf(exp)))
}

// number/Complex entries

fn add_scalars(args: &[Value]) -> Result<Value, String> {
    scalar_add(&args[0], &args[1])
}

fn subtract_scalars(args: &[Value]) -> Result<Value, String> {
    scalar_subtract(&args[0], &args[1])
}

fn multiply_scalars(args: &[Value]) -> Result<Value, String> {
    scalar_multiply(&args[0], &args[1])
}

fn divide_scalars(args: &[Value]) -> Result<Value, String> {
    scalar_divide(&args[0], &args[1])
}

fn pow_scalars(args: &[Value]) -> Result<Value, String> {
    scalar_pow(&args[0], &args[1])
}

/// `x mod y`, result takes the sign of the divisor; `y == 0` yields `x`.
fn mod_numbers(args: &[Value]) -> Result<Value, String> {
    let (x, y) = (as_number(&args[0])?, as_number(&args[1])?);
    if y == 0.0 {
        return Ok(Value::Num(x));
    }
    Ok(Value::Num(x - y * (x / y).floor()))
}

fn unary_minus(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Complex(c) => Ok(Value::Complex(-c)),
        v => Ok(Value::Num(-as_number(v)?)),
    }
}

fn unary_minus_matrix(args: &[Value]) -> Result<Value, String> {
    matrices::map_matrix(&args[0], |v| unary_minus(std::slice::from_ref(v)))
}

fn unary_minus_unit(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Unit(u) => Ok(Value::Unit(Unit { value: -u.value, unit: u.unit })),
        other => Err(format!("unexpected {}", other.type_name())),
    }
}

fn unary_plus(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Complex(c) => Ok(Value::Complex(*c)),
        v => Ok(Value::Num(as_number(v)?)),
    }
}

/// Factorial of a non-negative integer.
fn factorial_number(args: &[Value]) -> Result<Value, String> {
    let n = as_number(&args[0])?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err("factorial is only defined for non-negative integers".to_string());
    }
    let mut result = 1.0;
    let mut k = 2.0;
    while k <= n {
        result *= k;
        k += 1.0;
    }
    Ok(Value::Num(result))
}

fn abs_value(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Complex(c) => Ok(Value::Num(c.norm())),
        v => Ok(Value::Num(as_number(v)?.abs())),
    }
}

fn abs_matrix(args: &[Value]) -> Result<Value, String> {
    matrices::map_matrix(&args[0], |v| abs_value(std::slice::from_ref(v)))
}

fn sqrt_value(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Complex(c) => Ok(simplify(c.sqrt())),
        v => {
            let n = as_number(v)?;
            if n < 0.0 {
                Ok(Value::Complex(Complex64::new(0.0, (-n).sqrt())))
            } else {
                Ok(Value::Num(n.sqrt()))
            }
        }
    }
}

// unit arithmetic

fn add_units(args: &[Value]) -> Result<Value, String> {
    match (&args[0], &args[1]) {
        (Value::Unit(a), Value::Unit(b)) => {
            if a.unit.quantity != b.unit.quantity {
                return Err(format!(
                    "Units do not match ('{}' != '{}')",
                    a.unit.name, b.unit.name
                ));
            }
            Ok(Value::Unit(Unit { value: a.value + b.value, unit: a.unit }))
        }
        _ => Err("expected units".to_string()),
    }
}

fn subtract_units(args: &[Value]) -> Result<Value, String> {
    match (&args[0], &args[1]) {
        (Value::Unit(a), Value::Unit(b)) => {
            if a.unit.quantity != b.unit.quantity {
                return Err(format!(
                    "Units do not match ('{}' != '{}')",
                    a.unit.name, b.unit.name
                ));
            }
            Ok(Value::Unit(Unit { value: a.value - b.value, unit: a.unit }))
        }
        _ => Err("expected units".to_string()),
    }
}

fn multiply_number_unit(args: &[Value]) -> Result<Value, String> {
    match (&args[0], &args[1]) {
        (v, Value::Unit(u)) => Ok(Value::Unit(Unit {
            value: as_number(v)? * u.value,
            unit: u.unit,
        })),
        _ => Err("expected number and unit".to_string()),
    }
}

fn multiply_unit_number(args: &[Value]) -> Result<Value, String> {
    match (&args[0], &args[1]) {
        (Value::Unit(u), v) => Ok(Value::Unit(Unit {
            value: u.value * as_number(v)?,
            unit: u.unit,
        })),
        _ => Err("expected unit and number".to_string()),
    }
}

fn divide_unit_number(args: &[Value]) -> Result<Value, String> {
    match (&args[0], &args[1]) {
        (Value::Unit(u), v) => Ok(Value::Unit(Unit {
            value: u.value / as_number(v)?,
            unit: u.unit,
        })),
        _ => Err("expected unit and number".to_string()),
    }
}

inventory::submit! { Builtin { name: "add", signature: "Complex, Complex", implementation: add_scalars } }
inventory::submit! { Builtin { name: "add", signature: "number, number", implementation: add_scalars } }
inventory::submit! { Builtin { name: "add", signature: "Unit, Unit", implementation: add_units } }
inventory::submit! { Builtin { name: "subtract", signature: "Complex, Complex", implementation: subtract_scalars } }
inventory::submit! { Builtin { name: "subtract", signature: "number, number", implementation: subtract_scalars } }
inventory::submit! { Builtin { name: "subtract", signature: "Unit, Unit", implementation: subtract_units } }
inventory::submit! { Builtin { name: "multiply", signature: "Complex, Complex", implementation: multiply_scalars } }
inventory::submit! { Builtin { name: "multiply", signature: "number, number", implementation: multiply_scalars } }
inventory::submit! { Builtin { name: "multiply", signature: "number, Unit", implementation: multiply_number_unit } }
inventory::submit! { Builtin { name: "multiply", signature: "Unit, number", implementation: multiply_unit_number } }
inventory::submit! { Builtin { name: "divide", signature: "Complex, Complex", implementation: divide_scalars } }
inventory::submit! { Builtin { name: "divide", signature: "number, number", implementation: divide_scalars } }
inventory::submit! { Builtin { name: "divide", signature: "Unit, number", implementation: divide_unit_number } }
inventory::submit! { Builtin { name: "pow", signature: "Complex, Complex", implementation: pow_scalars } }
inventory::submit! { Builtin { name: "pow", signature: "number, number", implementation: pow_scalars } }
inventory::submit! { Builtin { name: "mod", signature: "number, number", implementation: mod_numbers } }
inventory::submit! { Builtin { name: "unaryMinus", signature: "number|Complex", implementation: unary_minus } }
inventory::submit! { Builtin { name: "unaryMinus", signature: "Matrix", implementation: unary_minus_matrix } }
inventory::submit! { Builtin { name: "unaryMinus", signature: "Unit", implementation: unary_minus_unit } }
inventory::submit! { Builtin { name: "unaryPlus", signature: "number|Complex", implementation: unary_plus } }
inventory::submit! { Builtin { name: "factorial", signature: "number", implementation: factorial_number } }
inventory::submit! { Builtin { name: "abs", signature: "number|Complex", implementation: abs_value } }
inventory::submit! { Builtin { name: "abs", signature: "Matrix", implementation: abs_matrix } }
inventory::submit! { Builtin { name: "sqrt", signature: "number|Complex", implementation: sqrt_value } }
