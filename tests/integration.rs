use mathex::{compile, eval, eval_with_scope, parse, Error, EvalError, Scope, Value};

#[test]
fn end_to_end_arithmetic() {
    assert_eq!(eval("2 + 3 * 4").unwrap(), Value::Num(14.0));
    assert_eq!(eval("2 ^ 3 ^ 2").unwrap(), Value::Num(512.0));
}

#[test]
fn implicit_multiplication_against_a_scope() {
    let mut scope = Scope::new();
    scope.set("a", Value::Num(5.0)).unwrap();
    assert_eq!(eval_with_scope("2a", &mut scope).unwrap(), Value::Num(10.0));
}

#[test]
fn statement_sequences_return_visible_results() {
    assert_eq!(
        eval("a = 3; b = 4; a * b").unwrap(),
        Value::ResultSet(vec![Value::Num(12.0)])
    );
}

#[test]
fn matrix_indexing_is_one_based() {
    assert_eq!(eval("[1, 2; 3, 4][1, 1]").unwrap(), Value::Num(1.0));
    assert_eq!(eval("[1, 2; 3, 4][2, 2]").unwrap(), Value::Num(4.0));
}

#[test]
fn functions_defined_and_called_in_one_expression() {
    assert_eq!(
        eval("f(x) = x ^ 2; f(3)").unwrap(),
        Value::ResultSet(vec![Value::Num(9.0)])
    );
}

#[test]
fn parse_errors_carry_character_positions() {
    let err = parse("2 +").unwrap_err();
    assert_eq!(err.to_string(), "Unexpected end of expression (char 4)");
}

#[test]
fn dispatch_errors_name_the_offending_argument() {
    let err = eval("add(2, \"x\")").unwrap_err().to_string();
    assert!(err.contains("Unexpected type of argument in function add"), "{err}");
    assert!(err.contains("actual: string, index: 1"), "{err}");
}

#[test]
fn unit_conversion_expression() {
    assert_eq!(eval("5.08 cm in inch").unwrap().to_string(), "2 inch");
}

#[test]
fn trees_round_trip_through_display() {
    for src in ["2 + 3 * 4", "(2 + 3) * 4", "a = 3", "x < 2 ? 1 : -1"] {
        assert_eq!(parse(src).unwrap().to_string(), src);
    }
}

#[test]
fn compiled_expressions_do_not_leak_state() {
    let expr = compile(&parse("x + 1").unwrap()).unwrap();
    let mut s1 = Scope::new();
    s1.set("x", Value::Num(1.0)).unwrap();
    let mut s2 = Scope::new();
    s2.set("x", Value::Num(10.0)).unwrap();
    assert_eq!(expr.eval(&mut s1).unwrap(), Value::Num(2.0));
    assert_eq!(expr.eval(&mut s2).unwrap(), Value::Num(11.0));
    // the second evaluation must not have touched the first scope
    assert_eq!(s1.get("x"), Some(&Value::Num(1.0)));
}

#[test]
fn errors_keep_their_stage() {
    assert!(matches!(eval("2 +"), Err(Error::Parse(_))));
    assert!(matches!(
        eval("q"),
        Err(Error::Eval(EvalError::UndefinedSymbol(_)))
    ));
}
