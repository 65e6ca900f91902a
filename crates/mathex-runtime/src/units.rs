//! Unit conversion builtin (`to`, also reached by the `in` operator).

use mathex_builtins::{Builtin, Value};

fn to_impl(args: &[Value]) -> Result<Value, String> {
    match (&args[0], &args[1]) {
        (Value::Unit(value), Value::Unit(target)) => {
            let converted = value.to(target.unit.name)?;
            Ok(Value::Unit(converted))
        }
        _ => Err("expected units".to_string()),
    }
}

/// `5 to cm` with a bare number on the left is meaningless without a
/// source unit; report it rather than guessing one.
fn to_number_impl(args: &[Value]) -> Result<Value, String> {
    match &args[1] {
        Value::Unit(target) => Err(format!(
            "Units do not match ('' != '{}')",
            target.unit.name
        )),
        _ => Err("expected units".to_string()),
    }
}

inventory::submit! { Builtin { name: "to", signature: "Unit, Unit", implementation: to_impl } }
inventory::submit! { Builtin { name: "to", signature: "number, Unit", implementation: to_number_impl } }

#[cfg(test)]
mod tests {
    use super::*;
    use mathex_builtins::Unit;

    #[test]
    fn converts_between_compatible_units() {
        let v = Value::Unit(Unit::new(2.0, "inch").unwrap());
        let target = Value::Unit(Unit::new(1.0, "cm").unwrap());
        match to_impl(&[v, target]).unwrap() {
            Value::Unit(u) => {
                assert_eq!(u.unit.name, "cm");
                assert!((u.to_number() - 5.08).abs() < 1e-12);
            }
            other => panic!("expected unit, got {other:?}"),
        }
    }

    #[test]
    fn incompatible_units_error() {
        let v = Value::Unit(Unit::new(2.0, "inch").unwrap());
        let target = Value::Unit(Unit::new(1.0, "kg").unwrap());
        assert!(to_impl(&[v, target]).is_err());
    }
}
