//! Logical builtins over booleans and numbers (nonzero is truthy).

use mathex_builtins::{Builtin, Value};

fn truthy(v: &Value) -> Result<bool, String> {
    match v {
        Value::Bool(b) => Ok(*b),
        Value::Num(n) => Ok(*n != 0.0),
        other => Err(format!("unexpected {} in logical operation", other.type_name())),
    }
}

fn and_impl(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(truthy(&args[0])? && truthy(&args[1])?))
}

fn or_impl(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(truthy(&args[0])? || truthy(&args[1])?))
}

fn xor_impl(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(truthy(&args[0])? != truthy(&args[1])?))
}

fn not_impl(args: &[Value]) -> Result<Value, String> {
    Ok(Value::Bool(!truthy(&args[0])?))
}

const SIG2: &str = "number|boolean, number|boolean";

inventory::submit! { Builtin { name: "and", signature: SIG2, implementation: and_impl } }
inventory::submit! { Builtin { name: "or", signature: SIG2, implementation: or_impl } }
inventory::submit! { Builtin { name: "xor", signature: SIG2, implementation: xor_impl } }
inventory::submit! { Builtin { name: "not", signature: "number|boolean", implementation: not_impl } }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_table() {
        assert_eq!(
            and_impl(&[Value::Bool(true), Value::Bool(false)]).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            or_impl(&[Value::Bool(true), Value::Bool(false)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            xor_impl(&[Value::Bool(true), Value::Bool(true)]).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(not_impl(&[Value::Bool(false)]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn numbers_are_truthy_when_nonzero() {
        assert_eq!(
            and_impl(&[Value::Num(2.0), Value::Num(3.0)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(not_impl(&[Value::Num(0.0)]).unwrap(), Value::Bool(true));
    }
}
