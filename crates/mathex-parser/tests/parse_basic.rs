use mathex_parser::{parse, BlockItem, ConstantKind, Node};

fn num(v: &str) -> Node {
    Node::Constant {
        value: v.to_string(),
        kind: ConstantKind::Number,
    }
}

fn sym(name: &str) -> Node {
    Node::Symbol {
        name: name.to_string(),
    }
}

fn op2(op: &str, func: &str, left: Node, right: Node) -> Node {
    Node::Operator {
        op: op.to_string(),
        func: func.to_string(),
        args: vec![left, right],
        implicit: false,
    }
}

fn op1(op: &str, func: &str, arg: Node) -> Node {
    Node::Operator {
        op: op.to_string(),
        func: func.to_string(),
        args: vec![arg],
        implicit: false,
    }
}

fn imp_mul(left: Node, right: Node) -> Node {
    Node::Operator {
        op: "*".to_string(),
        func: "multiply".to_string(),
        args: vec![left, right],
        implicit: true,
    }
}

#[test]
fn addition_binds_weaker_than_multiplication() {
    assert_eq!(
        parse("2 + 3 * 4").unwrap(),
        op2("+", "add", num("2"), op2("*", "multiply", num("3"), num("4")))
    );
}

#[test]
fn power_is_right_associative() {
    assert_eq!(
        parse("2^3^2").unwrap(),
        op2("^", "pow", num("2"), op2("^", "pow", num("3"), num("2")))
    );
}

#[test]
fn power_binds_tighter_than_unary_minus() {
    // -2^2 is -(2^2)
    assert_eq!(
        parse("-2^2").unwrap(),
        op1("-", "unaryMinus", op2("^", "pow", num("2"), num("2")))
    );
}

#[test]
fn power_accepts_unary_exponent() {
    assert_eq!(
        parse("2^-3").unwrap(),
        op2("^", "pow", num("2"), op1("-", "unaryMinus", num("3")))
    );
}

#[test]
fn subtraction_is_left_associative() {
    assert_eq!(
        parse("8 - 3 - 2").unwrap(),
        op2("-", "subtract", op2("-", "subtract", num("8"), num("3")), num("2"))
    );
}

#[test]
fn implicit_multiplication_number_symbol() {
    assert_eq!(parse("2a").unwrap(), imp_mul(num("2"), sym("a")));
    assert_eq!(parse("2 a").unwrap(), imp_mul(num("2"), sym("a")));
}

#[test]
fn implicit_multiplication_before_parenthesis() {
    assert_eq!(
        parse("2(a + 1)").unwrap(),
        imp_mul(
            num("2"),
            Node::Parenthesis {
                inner: Box::new(op2("+", "add", sym("a"), num("1"))),
            }
        )
    );
}

#[test]
fn parenthesized_value_followed_by_parens_multiplies() {
    // only symbols and accessors are callable, so `(a)(b)` multiplies
    let parsed = parse("(a)(b)").unwrap();
    assert!(matches!(
        parsed,
        Node::Operator { ref func, implicit: true, .. } if func == "multiply"
    ));
}

#[test]
fn symbol_followed_by_parens_is_a_call() {
    assert_eq!(
        parse("f(2, x)").unwrap(),
        Node::Function {
            callee: Box::new(sym("f")),
            args: vec![num("2"), sym("x")],
        }
    );
}

#[test]
fn number_after_factorial_multiplies_implicitly() {
    assert_eq!(
        parse("3! 4").unwrap(),
        imp_mul(op1("!", "factorial", num("3")), num("4"))
    );
}

#[test]
fn implicit_multiplication_chain() {
    // 2 a b => (2 a) b, left associative
    assert_eq!(
        parse("2 a b").unwrap(),
        imp_mul(imp_mul(num("2"), sym("a")), sym("b"))
    );
}

#[test]
fn constant_followed_by_in_is_implicit_unit() {
    assert_eq!(parse("2 in").unwrap(), imp_mul(num("2"), sym("in")));
}

#[test]
fn unit_conversion_uses_to_function() {
    assert_eq!(
        parse("x to cm").unwrap(),
        op2("to", "to", sym("x"), sym("cm"))
    );
    // `in` after a non-constant is a conversion as well
    assert_eq!(
        parse("2 cm in").unwrap(),
        imp_mul(imp_mul(num("2"), sym("cm")), sym("in"))
    );
}

#[test]
fn named_operators_parse() {
    assert_eq!(
        parse("7 mod 3").unwrap(),
        op2("mod", "mod", num("7"), num("3"))
    );
    assert_eq!(
        parse("a and b or c").unwrap(),
        op2("or", "or", op2("and", "and", sym("a"), sym("b")), sym("c"))
    );
    assert_eq!(parse("not x").unwrap(), op1("not", "not", sym("x")));
}

#[test]
fn relational_and_shift_precedence() {
    // a + b << 2 == c parses as ((a + b) << 2) == c
    assert_eq!(
        parse("a + b << 2 == c").unwrap(),
        op2(
            "==",
            "equal",
            op2(
                "<<",
                "leftShift",
                op2("+", "add", sym("a"), sym("b")),
                num("2")
            ),
            sym("c")
        )
    );
}

#[test]
fn conditional_expression() {
    assert_eq!(
        parse("a > 0 ? 1 : -1").unwrap(),
        Node::Conditional {
            condition: Box::new(op2(">", "larger", sym("a"), num("0"))),
            if_true: Box::new(num("1")),
            if_false: Box::new(op1("-", "unaryMinus", num("1"))),
        }
    );
}

#[test]
fn conditional_false_part_may_be_a_range() {
    // the colon after `1` terminates the conditional; `2:4` is a range
    assert_eq!(
        parse("x ? 1 : 2:4").unwrap(),
        Node::Conditional {
            condition: Box::new(sym("x")),
            if_true: Box::new(num("1")),
            if_false: Box::new(Node::Range {
                start: Box::new(num("2")),
                end: Box::new(num("4")),
                step: None,
            }),
        }
    );
}

#[test]
fn conditional_missing_false_part() {
    let err = parse("a ? 1").unwrap_err();
    assert!(err.message.contains("False part of conditional expression"));
}

#[test]
fn ranges() {
    assert_eq!(
        parse("1:10").unwrap(),
        Node::Range {
            start: Box::new(num("1")),
            end: Box::new(num("10")),
            step: None,
        }
    );
    assert_eq!(
        parse("0:2:10").unwrap(),
        Node::Range {
            start: Box::new(num("0")),
            end: Box::new(num("10")),
            step: Some(Box::new(num("2"))),
        }
    );
}

#[test]
fn range_with_implicit_bounds() {
    // `:4` starts at one
    assert_eq!(
        parse(":4").unwrap(),
        Node::Range {
            start: Box::new(num("1")),
            end: Box::new(num("4")),
            step: None,
        }
    );
    // `a[2:]` runs to the end of the dimension
    assert_eq!(
        parse("a[2:]").unwrap(),
        Node::Accessor {
            object: Box::new(sym("a")),
            index: Box::new(Node::Index {
                dimensions: vec![Node::Range {
                    start: Box::new(num("2")),
                    end: Box::new(sym("end")),
                    step: None,
                }],
                dot_notation: false,
            }),
        }
    );
}

#[test]
fn matrix_literals() {
    assert_eq!(
        parse("[1, 2, 3]").unwrap(),
        Node::Array {
            items: vec![num("1"), num("2"), num("3")],
        }
    );
    assert_eq!(
        parse("[1, 2; 3, 4]").unwrap(),
        Node::Array {
            items: vec![
                Node::Array { items: vec![num("1"), num("2")] },
                Node::Array { items: vec![num("3"), num("4")] },
            ],
        }
    );
    assert_eq!(parse("[]").unwrap(), Node::Array { items: vec![] });
}

#[test]
fn matrix_column_mismatch() {
    let err = parse("[1, 2; 3]").unwrap_err();
    assert!(err.message.contains("Column dimensions mismatch"));
}

#[test]
fn matrix_may_span_lines() {
    assert_eq!(
        parse("[1, 2;\n 3, 4]").unwrap(),
        parse("[1, 2; 3, 4]").unwrap()
    );
}

#[test]
fn object_literals() {
    assert_eq!(
        parse("{a: 1, \"b c\": 2}").unwrap(),
        Node::Object {
            properties: vec![
                ("a".to_string(), num("1")),
                ("b c".to_string(), num("2")),
            ],
        }
    );
}

#[test]
fn property_access() {
    assert_eq!(
        parse("obj.prop").unwrap(),
        Node::Accessor {
            object: Box::new(sym("obj")),
            index: Box::new(Node::Index {
                dimensions: vec![Node::Constant {
                    value: "prop".to_string(),
                    kind: ConstantKind::String,
                }],
                dot_notation: true,
            }),
        }
    );
}

#[test]
fn assignments() {
    assert_eq!(
        parse("x = 3").unwrap(),
        Node::Assignment {
            object: Box::new(sym("x")),
            index: None,
            value: Box::new(num("3")),
        }
    );
    // chained assignment is right associative
    assert_eq!(
        parse("a = b = 3").unwrap(),
        Node::Assignment {
            object: Box::new(sym("a")),
            index: None,
            value: Box::new(Node::Assignment {
                object: Box::new(sym("b")),
                index: None,
                value: Box::new(num("3")),
            }),
        }
    );
}

#[test]
fn indexed_assignment() {
    assert_eq!(
        parse("a[1] = 4").unwrap(),
        Node::Assignment {
            object: Box::new(sym("a")),
            index: Some(Box::new(Node::Index {
                dimensions: vec![num("1")],
                dot_notation: false,
            })),
            value: Box::new(num("4")),
        }
    );
}

#[test]
fn function_assignment() {
    assert_eq!(
        parse("f(x) = x^2").unwrap(),
        Node::FunctionAssignment {
            name: "f".to_string(),
            params: vec!["x".to_string()],
            body: Box::new(op2("^", "pow", sym("x"), num("2"))),
        }
    );
}

#[test]
fn invalid_assignment_target() {
    let err = parse("2 = 3").unwrap_err();
    assert!(err.message.contains("Invalid left hand side"));
    let err = parse("f(2) = 3").unwrap_err();
    assert!(err.message.contains("Invalid left hand side"));
}

#[test]
fn block_visibility() {
    let parsed = parse("a = 3; b = 4; a * b").unwrap();
    match parsed {
        Node::Block { blocks } => {
            assert_eq!(blocks.len(), 3);
            assert!(!blocks[0].visible);
            assert!(!blocks[1].visible);
            assert!(blocks[2].visible);
        }
        other => panic!("expected block, got {other:?}"),
    }
}

#[test]
fn newline_separates_statements() {
    let parsed = parse("1 + 1\n2 + 2").unwrap();
    match parsed {
        Node::Block { blocks } => {
            assert_eq!(blocks.len(), 2);
            assert!(blocks.iter().all(|b| b.visible));
        }
        other => panic!("expected block, got {other:?}"),
    }
}

#[test]
fn single_statement_with_trailing_semicolon() {
    assert_eq!(
        parse("x = 1;").unwrap(),
        Node::Block {
            blocks: vec![BlockItem {
                node: Node::Assignment {
                    object: Box::new(sym("x")),
                    index: None,
                    value: Box::new(num("1")),
                },
                visible: false,
            }],
        }
    );
}

#[test]
fn strings_parse_with_escapes() {
    assert_eq!(
        parse(r#""hello\nworld""#).unwrap(),
        Node::Constant {
            value: "hello\nworld".to_string(),
            kind: ConstantKind::String,
        }
    );
}

#[test]
fn string_indexing() {
    let parsed = parse(r#""hello"[1]"#).unwrap();
    assert!(matches!(parsed, Node::Accessor { .. }));
}

#[test]
fn error_reports_character_position() {
    let err = parse("2 +").unwrap_err();
    assert_eq!(err.message, "Unexpected end of expression");
    assert_eq!(err.char_index, 4);
    assert_eq!(format!("{err}"), "Unexpected end of expression (char 4)");
}

#[test]
fn error_on_missing_closing_paren() {
    let err = parse("(2 + 3").unwrap_err();
    assert_eq!(err.message, "Parenthesis ) expected");
}

#[test]
fn error_on_malformed_exponent() {
    let err = parse("2e").unwrap_err();
    assert!(err.message.starts_with("Digit expected"));
    assert_eq!(err.char_index, 1);
}

#[test]
fn error_on_trailing_garbage() {
    let err = parse("2 @ 3").unwrap_err();
    assert!(err.message.starts_with("Unexpected part"));
    assert_eq!(err.char_index, 3);
}

#[test]
fn empty_input_is_an_error() {
    assert!(parse("").is_err());
    assert!(parse("   ").is_err());
}

#[test]
fn char_positions_count_characters_not_bytes() {
    // alpha is two bytes; the error column is still character based
    let err = parse("α +").unwrap_err();
    assert_eq!(err.char_index, 4);
}
