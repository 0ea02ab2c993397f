use pfa_core::Value;

use crate::test_utils::{err, ok};

#[test]
fn addition_keeps_integer_type() {
    assert_eq!(ok("+", vec![Value::Int(2), Value::Int(3)]), Value::Int(5));
    assert_eq!(ok("+", vec![Value::Long(2), Value::Int(3)]), Value::Long(5));
}

#[test]
fn mixed_arithmetic_promotes() {
    assert_eq!(ok("+", vec![Value::Int(2), Value::Double(0.5)]), Value::Double(2.5));
    assert_eq!(ok("*", vec![Value::Float(1.5), Value::Int(2)]), Value::Float(3.0));
}

#[test]
fn integer_overflow_is_an_error() {
    assert_eq!(err("+", vec![Value::Int(i32::MAX), Value::Int(1)]), "int overflow");
    assert_eq!(err("u-", vec![Value::Long(i64::MIN)]), "long overflow");
    assert_eq!(err("**", vec![Value::Int(2), Value::Int(31)]), "int overflow");
}

#[test]
fn division_is_floating() {
    assert_eq!(ok("/", vec![Value::Int(7), Value::Int(2)]), Value::Double(3.5));
    assert_eq!(ok("/", vec![Value::Int(1), Value::Int(0)]), Value::Double(f64::INFINITY));
}

#[test]
fn floor_division_rounds_down() {
    assert_eq!(ok("//", vec![Value::Int(7), Value::Int(2)]), Value::Int(3));
    assert_eq!(ok("//", vec![Value::Int(-7), Value::Int(2)]), Value::Int(-4));
    assert_eq!(ok("//", vec![Value::Long(7), Value::Int(-2)]), Value::Long(-4));
    assert_eq!(err("//", vec![Value::Int(1), Value::Int(0)]), "integer division by zero");
}

#[test]
fn modulo_follows_divisor_sign() {
    assert_eq!(ok("%", vec![Value::Int(-7), Value::Int(3)]), Value::Int(2));
    assert_eq!(ok("%", vec![Value::Int(7), Value::Int(-3)]), Value::Int(-2));
    assert_eq!(ok("%%", vec![Value::Int(-7), Value::Int(3)]), Value::Int(-1));
    assert_eq!(ok("%", vec![Value::Double(-1.5), Value::Double(1.0)]), Value::Double(0.5));
}

#[test]
fn power_handles_negative_exponents() {
    assert_eq!(ok("**", vec![Value::Int(3), Value::Int(4)]), Value::Int(81));
    assert_eq!(ok("**", vec![Value::Int(2), Value::Int(-1)]), Value::Int(0));
    assert_eq!(ok("**", vec![Value::Double(2.0), Value::Int(-1)]), Value::Double(0.5));
}

#[test]
fn comparisons_use_wider_type() {
    assert_eq!(ok("<", vec![Value::Int(1), Value::Double(1.5)]), Value::Boolean(true));
    assert_eq!(ok("==", vec![Value::Int(2), Value::Double(2.0)]), Value::Boolean(true));
    assert_eq!(ok("cmp", vec![Value::from("b"), Value::from("a")]), Value::Int(1));
    assert_eq!(ok("max", vec![Value::Int(4), Value::Long(9)]), Value::Long(9));
    assert_eq!(ok("min", vec![Value::from("x"), Value::from("y")]), Value::from("x"));
}

#[test]
fn nan_is_not_comparable() {
    let message = err("<", vec![Value::Double(f64::NAN), Value::Double(1.0)]);
    assert_eq!(message, "values of type double are not comparable");
}

#[test]
fn logic_operators() {
    let t = Value::Boolean(true);
    let f = Value::Boolean(false);

    assert_eq!(ok("&&", vec![t.clone(), f.clone()]), f);
    assert_eq!(ok("||", vec![t.clone(), f.clone()]), t);
    assert_eq!(ok("^^", vec![t.clone(), t.clone()]), f);
    assert_eq!(ok("!", vec![f]), t);
}
