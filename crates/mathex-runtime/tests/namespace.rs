use mathex_builtins::{Complex64, Unit, Value};
use mathex_runtime::{call_builtin, default_namespace, Entry, Namespace, Scope};

#[test]
fn namespace_exposes_registered_builtins() {
    let ns = default_namespace();
    for name in [
        "add", "subtract", "multiply", "divide", "pow", "mod", "factorial", "not", "and", "or",
        "xor", "bitAnd", "bitOr", "bitXor", "bitNot", "leftShift", "rightArithShift",
        "rightLogShift", "equal", "unequal", "smaller", "larger", "smallerEq", "largerEq",
        "dotMultiply", "dotDivide", "dotPow", "unaryMinus", "unaryPlus", "ctranspose", "to",
        "abs", "sqrt", "size",
    ] {
        assert!(
            matches!(ns.get(name), Some(Entry::Function(_))),
            "missing builtin {name}"
        );
    }
    for name in ["pi", "e", "tau", "phi", "Infinity", "NaN", "i", "true", "false", "null"] {
        assert!(
            matches!(ns.get(name), Some(Entry::Constant(_))),
            "missing constant {name}"
        );
    }
}

#[test]
fn call_builtin_dispatches() {
    assert_eq!(
        call_builtin("add", &[Value::Num(2.0), Value::Num(3.0)]).unwrap(),
        Value::Num(5.0)
    );
    assert_eq!(
        call_builtin("pow", &[Value::Num(2.0), Value::Num(9.0)]).unwrap(),
        Value::Num(512.0)
    );
    assert!(call_builtin("nosuch", &[]).is_err());
}

#[test]
fn mixed_number_complex_addition_converts() {
    let result = call_builtin(
        "add",
        &[Value::Num(1.0), Value::Complex(Complex64::new(0.0, 2.0))],
    )
    .unwrap();
    assert_eq!(result, Value::Complex(Complex64::new(1.0, 2.0)));
}

#[test]
fn number_times_unit_scales() {
    let result = call_builtin(
        "multiply",
        &[Value::Num(2.0), Value::Unit(Unit::new(1.0, "in").unwrap())],
    )
    .unwrap();
    match result {
        Value::Unit(u) => {
            assert_eq!(u.unit.name, "in");
            assert!((u.to_number() - 2.0).abs() < 1e-12);
        }
        other => panic!("expected unit, got {other:?}"),
    }
}

#[test]
fn unit_conversion_via_to() {
    let v = Value::Unit(Unit::new(5.08, "cm").unwrap());
    let target = Value::Unit(Unit::new(1.0, "inch").unwrap());
    match call_builtin("to", &[v, target]).unwrap() {
        Value::Unit(u) => {
            assert_eq!(u.unit.name, "inch");
            assert!((u.to_number() - 2.0).abs() < 1e-12);
        }
        other => panic!("expected unit, got {other:?}"),
    }
}

#[test]
fn scope_rejects_reserved_keyword() {
    let mut scope = Scope::new();
    scope.set("x", Value::Num(1.0)).unwrap();
    assert!(scope.validate().is_ok());
    assert!(scope.set("end", Value::Num(1.0)).is_err());
}

#[test]
fn raw_functions_can_be_registered() {
    fn argcount(nodes: &[mathex_parser::Node], _scope: &mut Scope) -> Result<Value, String> {
        Ok(Value::Num(nodes.len() as f64))
    }
    let mut ns = Namespace::empty();
    ns.register_raw("argcount", argcount);
    assert!(matches!(ns.get("argcount"), Some(Entry::Raw(_))));
}
