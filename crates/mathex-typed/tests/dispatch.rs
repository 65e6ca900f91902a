use mathex_builtins::{Complex64, Value};
use mathex_typed::{clear_cache, convert, find, merge, typed, DispatchError, TypedError};

fn number_impl(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Num(n) => Ok(Value::Num(n + 1.0)),
        other => Err(format!("expected number, got {}", other.type_name())),
    }
}

fn complex_impl(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Complex(c) => Ok(Value::Complex(c + Complex64::new(1.0, 0.0))),
        other => Err(format!("expected Complex, got {}", other.type_name())),
    }
}

fn string_impl(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Str(s) => Ok(Value::Str(s.to_uppercase())),
        other => Err(format!("expected string, got {}", other.type_name())),
    }
}

fn sum_impl(args: &[Value]) -> Result<Value, String> {
    let mut total = 0.0;
    for a in args {
        match a {
            Value::Num(n) => total += n,
            other => return Err(format!("expected number, got {}", other.type_name())),
        }
    }
    Ok(Value::Num(total))
}

fn two_arg_impl(args: &[Value]) -> Result<Value, String> {
    match (&args[0], &args[1]) {
        (Value::Num(a), Value::Num(b)) => Ok(Value::Num(a * b)),
        _ => Err("expected numbers".to_string()),
    }
}

#[test]
fn dispatches_on_runtime_type() {
    let f = typed("f", &[("number", number_impl), ("string", string_impl)]).unwrap();
    assert_eq!(f.call(&[Value::Num(2.0)]).unwrap(), Value::Num(3.0));
    assert_eq!(
        f.call(&[Value::Str("ab".into())]).unwrap(),
        Value::Str("AB".into())
    );
}

#[test]
fn dispatch_is_deterministic_across_registration_order() {
    let a = typed("g", &[("number", number_impl), ("Complex", complex_impl)]).unwrap();
    let b = typed("g", &[("Complex", complex_impl), ("number", number_impl)]).unwrap();
    for f in [a, b] {
        assert_eq!(f.call(&[Value::Num(1.0)]).unwrap(), Value::Num(2.0));
        assert_eq!(
            f.call(&[Value::Complex(Complex64::new(1.0, 1.0))]).unwrap(),
            Value::Complex(Complex64::new(2.0, 1.0))
        );
    }
}

#[test]
fn exact_match_wins_over_conversion() {
    // a plain number must select (number), never number->Complex
    let f = typed("h", &[("Complex", complex_impl), ("number", number_impl)]).unwrap();
    assert_eq!(f.call(&[Value::Num(5.0)]).unwrap(), Value::Num(6.0));
}

#[test]
fn conversion_applies_when_no_exact_match() {
    let f = typed("c", &[("Complex", complex_impl)]).unwrap();
    // number reaches the Complex implementation through number->Complex
    assert_eq!(
        f.call(&[Value::Num(2.0)]).unwrap(),
        Value::Complex(Complex64::new(3.0, 0.0))
    );
    // boolean reaches it too, via boolean->Complex
    assert_eq!(
        f.call(&[Value::Bool(true)]).unwrap(),
        Value::Complex(Complex64::new(2.0, 0.0))
    );
}

#[test]
fn wrong_type_error_names_index_and_actual_type() {
    let f = typed("f", &[("number", number_impl)]).unwrap();
    match f.call(&[Value::Str("x".into())]) {
        Err(TypedError::Dispatch(DispatchError::WrongType { name, index, actual, .. })) => {
            assert_eq!(name, "f");
            assert_eq!(index, 0);
            assert_eq!(actual, "string");
        }
        other => panic!("expected dispatch error, got {other:?}"),
    }
    let msg = f.call(&[Value::Str("x".into())]).unwrap_err().to_string();
    assert!(msg.contains("index: 0"), "{msg}");
    assert!(msg.contains("actual: string"), "{msg}");
}

#[test]
fn wrong_type_error_at_second_argument() {
    let f = typed("mul", &[("number, number", two_arg_impl)]).unwrap();
    match f.call(&[Value::Num(1.0), Value::Str("x".into())]) {
        Err(TypedError::Dispatch(DispatchError::WrongType { index, actual, .. })) => {
            assert_eq!(index, 1);
            assert_eq!(actual, "string");
        }
        other => panic!("expected dispatch error, got {other:?}"),
    }
}

#[test]
fn arity_errors_are_distinguished_from_type_errors() {
    let f = typed("mul", &[("number, number", two_arg_impl)]).unwrap();
    match f.call(&[Value::Num(1.0)]) {
        Err(TypedError::Dispatch(DispatchError::TooFewArgs { index, .. })) => {
            assert_eq!(index, 1);
        }
        other => panic!("expected too-few error, got {other:?}"),
    }
    match f.call(&[Value::Num(1.0), Value::Num(2.0), Value::Num(3.0)]) {
        Err(TypedError::Dispatch(DispatchError::TooManyArgs { supplied, expected, .. })) => {
            assert_eq!(supplied, 3);
            assert_eq!(expected, 2);
        }
        other => panic!("expected too-many error, got {other:?}"),
    }
}

#[test]
fn variadic_signatures_consume_the_tail() {
    let f = typed("sum", &[("...number", sum_impl)]).unwrap();
    assert_eq!(
        f.call(&[Value::Num(1.0), Value::Num(2.0), Value::Num(3.5)]).unwrap(),
        Value::Num(6.5)
    );
    // conversions apply per element
    assert_eq!(
        f.call(&[Value::Num(1.0), Value::Bool(true)]).unwrap(),
        Value::Num(2.0)
    );
    assert!(f.call(&[]).is_err());
}

#[test]
fn alternatives_expand_to_both_types() {
    let f = typed("n", &[("number|string", number_impl)]).unwrap();
    assert!(f.call(&[Value::Num(1.0)]).is_ok());
    // the string alternative routes to the same implementation
    assert!(f.call(&[Value::Str("x".into())]).unwrap_err().to_string().contains("expected number"));
}

#[test]
fn duplicate_signature_with_different_impl_is_rejected() {
    let err = typed("dup", &[("number", number_impl), ("number", sum_impl)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Signature \"number\" is defined twice"
    );
}

#[test]
fn debug_formatting_names_the_function_and_signatures() {
    // Result combinators like unwrap_err need the Ok side to be Debug
    let f = typed("dbg", &[("number", number_impl)]).unwrap();
    let rendered = format!("{f:?}");
    assert!(rendered.contains("dbg"), "{rendered}");
    assert!(rendered.contains("number"), "{rendered}");
}

#[test]
fn merge_unions_overloads() {
    let a = typed("m", &[("number", number_impl)]).unwrap();
    let b = typed("m", &[("string", string_impl)]).unwrap();
    let merged = merge("m", &[a, b]).unwrap();
    assert!(merged.call(&[Value::Num(1.0)]).is_ok());
    assert!(merged.call(&[Value::Str("x".into())]).is_ok());
}

#[test]
fn merge_rejects_conflicting_duplicates() {
    let a = typed("m2", &[("number", number_impl)]).unwrap();
    let b = typed("m2", &[("number", sum_impl)]).unwrap();
    assert!(merge("m2", &[a, b]).is_err());
}

#[test]
fn find_is_exact_only() {
    let f = typed("ff", &[("number", number_impl), ("string", string_impl)]).unwrap();
    assert_eq!(find(&f, "number"), Some(number_impl as mathex_typed::Impl));
    assert_eq!(find(&f, "string"), Some(string_impl as mathex_typed::Impl));
    assert_eq!(find(&f, "Complex"), None);
}

#[test]
fn convert_applies_registered_conversions_only() {
    assert_eq!(
        convert(&Value::Bool(true), "number").unwrap(),
        Value::Num(1.0)
    );
    assert_eq!(
        convert(&Value::Num(2.0), "Complex").unwrap(),
        Value::Complex(Complex64::new(2.0, 0.0))
    );
    // identity
    assert_eq!(convert(&Value::Num(2.0), "number").unwrap(), Value::Num(2.0));
    assert!(convert(&Value::Str("x".into()), "number").is_err());
}

#[test]
fn cache_returns_identical_dispatcher() {
    let entries: &[(&str, mathex_typed::Impl)] = &[("number", number_impl)];
    let a = typed("cached", entries).unwrap();
    let b = typed("cached", entries).unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
    clear_cache();
    let c = typed("cached", entries).unwrap();
    assert!(!std::sync::Arc::ptr_eq(&a, &c));
    assert!(c.call(&[Value::Num(1.0)]).is_ok());
}

#[test]
fn signatures_expose_the_declared_map() {
    let f = typed("sig", &[("number, number", two_arg_impl)]).unwrap();
    let sigs: Vec<&str> = f.signatures().iter().map(|(s, _)| s.as_str()).collect();
    assert_eq!(sigs, vec!["number,number"]);
}

#[test]
fn any_matches_everything_but_loses_to_concrete_types() {
    fn any_impl(_: &[Value]) -> Result<Value, String> {
        Ok(Value::Null)
    }
    let f = typed("a", &[("any", any_impl), ("number", number_impl)]).unwrap();
    assert_eq!(f.call(&[Value::Num(1.0)]).unwrap(), Value::Num(2.0));
    assert_eq!(f.call(&[Value::Str("s".into())]).unwrap(), Value::Null);
}
