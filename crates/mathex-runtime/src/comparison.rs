//! Comparison builtins. Numeric comparisons yield booleans; matrix
//! comparisons apply elementwise.

use crate::matrices::broadcast;
use mathex_builtins::{Builtin, Value};

fn as_number(v: &Value) -> Result<f64, String> {
    match v {
        Value::Num(n) => Ok(*n),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(format!("unexpected {} in comparison", other.type_name())),
    }
}

fn scalar_equal(a: &Value, b: &Value) -> Result<Value, String> {
    let eq = match (a, b) {
        (Value::Complex(x), Value::Complex(y)) => x == y,
        (Value::Complex(x), y) => x.im == 0.0 && x.re == as_number(y)?,
        (x, Value::Complex(y)) => y.im == 0.0 && y.re == as_number(x)?,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (x, y) => as_number(x)? == as_number(y)?,
    };
    Ok(Value::Bool(eq))
}

fn scalar_unequal(a: &Value, b: &Value) -> Result<Value, String> {
    match scalar_equal(a, b)? {
        Value::Bool(eq) => Ok(Value::Bool(!eq)),
        other => Ok(other),
    }
}

fn cmp_op(op: fn(f64, f64) -> bool) -> impl Fn(&Value, &Value) -> Result<Value, String> {
    move |a, b| Ok(Value::Bool(op(as_number(a)?, as_number(b)?)))
}

fn equal_impl(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], scalar_equal)
}

fn unequal_impl(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], scalar_unequal)
}

fn smaller_impl(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], |a, b| cmp_op(|x, y| x < y)(a, b))
}

fn larger_impl(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], |a, b| cmp_op(|x, y| x > y)(a, b))
}

fn smaller_eq_impl(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], |a, b| cmp_op(|x, y| x <= y)(a, b))
}

fn larger_eq_impl(args: &[Value]) -> Result<Value, String> {
    broadcast(&args[0], &args[1], |a, b| cmp_op(|x, y| x >= y)(a, b))
}

const CMP_SIG: &str = "number|Matrix, number|Matrix";
const EQ_SIG: &str = "number|Complex|string|null|Matrix, number|Complex|string|null|Matrix";

inventory::submit! { Builtin { name: "equal", signature: EQ_SIG, implementation: equal_impl } }
inventory::submit! { Builtin { name: "unequal", signature: EQ_SIG, implementation: unequal_impl } }
inventory::submit! { Builtin { name: "smaller", signature: CMP_SIG, implementation: smaller_impl } }
inventory::submit! { Builtin { name: "larger", signature: CMP_SIG, implementation: larger_impl } }
inventory::submit! { Builtin { name: "smallerEq", signature: CMP_SIG, implementation: smaller_eq_impl } }
inventory::submit! { Builtin { name: "largerEq", signature: CMP_SIG, implementation: larger_eq_impl } }
