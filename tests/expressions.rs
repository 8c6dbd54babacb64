mod common;

use common::{get, run_ok};
use embercore::value::string::SharedStr;
use embercore::value::Value;

fn vstr(s: &str) -> Value {
    Value::Str(SharedStr::new(s.to_string()))
}

/// spec.md §8 scenario 1: operator precedence and short-circuiting read as
/// `(((2 * -3) + 1) < 0) && (2 >= 1)`.
#[test]
fn precedence_matches_c_like_ladder() {
    let env = run_ok("var r = 2 * -3 + 1 < 0 && 2 >= 1;");
    assert_eq!(get(&env, "r"), Value::bool(true));
}

#[test]
fn mixed_int_float_arithmetic_promotes_to_float() {
    let env = run_ok("var a = 1 + 2.5; var b = 3 / 2; var c = 3.0 / 2;");
    assert_eq!(get(&env, "a"), Value::Float(3.5));
    assert_eq!(get(&env, "b"), Value::Int(1));
    assert_eq!(get(&env, "c"), Value::Float(1.5));
}

#[test]
fn string_concat_and_repeat() {
    let env = run_ok(
        r#"
        var a = "x=" + 3;
        var b = "ab" * 3;
        var c = "ab" * -1;
        "#,
    );
    assert_eq!(get(&env, "a"), vstr("x=3"));
    assert_eq!(get(&env, "b"), vstr("ababab"));
    assert_eq!(get(&env, "c"), vstr(""));
}

#[test]
fn none_equality_is_exclusive() {
    let env = run_ok(
        r#"
        var a = none == none;
        var b = none == 0;
        var c = 1 != "1";
        "#,
    );
    assert_eq!(get(&env, "a"), Value::bool(true));
    assert_eq!(get(&env, "b"), Value::bool(false));
    assert_eq!(get(&env, "c"), Value::bool(true));
}

#[test]
fn division_by_zero_is_an_error() {
    let (_, result) = common::run("var a = 1 / 0;");
    assert!(result.is_err());
}
