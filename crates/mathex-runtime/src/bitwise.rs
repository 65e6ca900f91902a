//! Bitwise builtins; arguments must be integers.

use mathex_builtins::{Builtin, Value};

fn as_integer(v: &Value, func: &str) -> Result<i64, String> {
    match v {
        Value::Num(n) if n.fract() == 0.0 => Ok(*n as i64),
        Value::Bool(b) => Ok(i64::from(*b)),
        _ => Err(format!("Integers expected in function {func}")),
    }
}

fn bit_and(args: &[Value]) -> Result<Value, String> {
    let (x, y) = (as_integer(&args[0], "bitAnd")?, as_integer(&args[1], "bitAnd")?);
    Ok(Value::Num((x & y) as f64))
}

fn bit_or(args: &[Value]) -> Result<Value, String> {
    let (x, y) = (as_integer(&args[0], "bitOr")?, as_integer(&args[1], "bitOr")?);
    Ok(Value::Num((x | y) as f64))
}

fn bit_xor(args: &[Value]) -> Result<Value, String> {
    let (x, y) = (as_integer(&args[0], "bitXor")?, as_integer(&args[1], "bitXor")?);
    Ok(Value::Num((x ^ y) as f64))
}

fn bit_not(args: &[Value]) -> Result<Value, String> {
    let x = as_integer(&args[0], "bitNot")?;
    Ok(Value::Num(!x as f64))
}

fn left_shift(args: &[Value]) -> Result<Value, String> {
    let (x, y) = (
        as_integer(&args[0], "leftShift")?,
        as_integer(&args[1], "leftShift")?,
    );
    Ok(Value::Num(((x as i32) << (y as u32 & 31)) as f64))
}

fn right_arith_shift(args: &[Value]) -> Result<Value, String> {
    let (x, y) = (
        as_integer(&args[0], "rightArithShift")?,
        as_integer(&args[1], "rightArithShift")?,
    );
    Ok(Value::Num(((x as i32) >> (y as u32 & 31)) as f64))
}

/// Logical (zero-fill) right shift over the 32-bit representation.
fn right_log_shift(args: &[Value]) -> Result<Value, String> {
    let (x, y) = (
        as_integer(&args[0], "rightLogShift")?,
        as_integer(&args[1], "rightLogShift")?,
    );
    Ok(Value::Num(((x as i32 as u32) >> (y as u32 & 31)) as f64))
}

const SIG2: &str = "number, number";

inventory::submit! { Builtin { name: "bitAnd", signature: SIG2, implementation: bit_and } }
inventory::submit! { Builtin { name: "bitOr", signature: SIG2, implementation: bit_or } }
inventory::submit! { Builtin { name: "bitXor", signature: SIG2, implementation: bit_xor } }
inventory::submit! { Builtin { name: "bitNot", signature: "number", implementation: bit_not } }
inventory::submit! { Builtin { name: "leftShift", signature: SIG2, implementation: left_shift } }
inventory::submit! { Builtin { name: "rightArithShift", signature: SIG2, implementation: right_arith_shift } }
inventory::submit! { Builtin { name: "rightLogShift", signature: SIG2, implementation: right_log_shift } }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_ops() {
        assert_eq!(bit_and(&[Value::Num(12.0), Value::Num(10.0)]).unwrap(), Value::Num(8.0));
        assert_eq!(bit_or(&[Value::Num(12.0), Value::Num(10.0)]).unwrap(), Value::Num(14.0));
        assert_eq!(bit_xor(&[Value::Num(12.0), Value::Num(10.0)]).unwrap(), Value::Num(6.0));
        assert_eq!(bit_not(&[Value::Num(5.0)]).unwrap(), Value::Num(-6.0));
    }

    #[test]
    fn shifts() {
        assert_eq!(left_shift(&[Value::Num(1.0), Value::Num(4.0)]).unwrap(), Value::Num(16.0));
        assert_eq!(
            right_arith_shift(&[Value::Num(-8.0), Value::Num(1.0)]).unwrap(),
            Value::Num(-4.0)
        );
        // zero-fill shift treats the operand as unsigned 32-bit
        assert_eq!(
            right_log_shift(&[Value::Num(-8.0), Value::Num(1.0)]).unwrap(),
            Value::Num(2147483644.0)
        );
    }

    #[test]
    fn non_integers_are_rejected() {
        let err = bit_and(&[Value::Num(1.5), Value::Num(1.0)]).unwrap_err();
        assert_eq!(err, "Integers expected in function bitAnd");
    }
}
