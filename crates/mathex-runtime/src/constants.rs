//! Named constants exposed in the default namespace.

use mathex_builtins::{Complex64, Constant, Value};

fn pi() -> Value {
    Value::Num(std::f64::consts::PI)
}

fn e() -> Value {
    Value::Num(std::f64::consts::E)
}

fn tau() -> Value {
    Value::Num(std::f64::consts::TAU)
}

/// The golden ratio, (1 + sqrt(5)) / 2.
fn phi() -> Value {
    Value::Num(1.618_033_988_749_895)
}

fn infinity() -> Value {
    Value::Num(f64::INFINITY)
}

fn nan() -> Value {
    Value::Num(f64::NAN)
}

fn imaginary_unit() -> Value {
    Value::Complex(Complex64::new(0.0, 1.0))
}

fn true_value() -> Value {
    Value::Bool(true)
}

fn false_value() -> Value {
    Value::Bool(false)
}

fn null_value() -> Value {
    Value::Null
}

inventory::submit! { Constant { name: "pi", value: pi } }
inventory::submit! { Constant { name: "e", value: e } }
inventory::submit! { Constant { name: "tau", value: tau } }
inventory::submit! { Constant { name: "phi", value: phi } }
inventory::submit! { Constant { name: "Infinity", value: infinity } }
inventory::submit! { Constant { name: "NaN", value: nan } }
inventory::submit! { Constant { name: "i", value: imaginary_unit } }
inventory::submit! { Constant { name: "true", value: true_value } }
inventory::submit! { Constant { name: "false", value: false_value } }
inventory::submit! { Constant { name: "null", value: null_value } }
