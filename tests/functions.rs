mod common;

use common::{get, run_ok};
use embercore::eval::EvalErrorKind;
use embercore::value::Value;

#[test]
fn named_function_declaration_and_call() {
    let env = run_ok(
        r#"
        func add(a, b) { return a + b; }
        var r = add(2, 3);
        "#,
    );
    assert_eq!(get(&env, "r"), Value::Int(5));
}

#[test]
fn anonymous_expr_body_function() {
    let env = run_ok("var square = func(x) => x * x; var r = square(6);");
    assert_eq!(get(&env, "r"), Value::Int(36));
}

/// spec.md §4.3: `func [captures](params) body` snapshots captured names
/// at closure-creation time; later mutation of the outer binding must not
/// be visible inside the closure.
#[test]
fn capture_list_snapshots_at_closure_creation() {
    let env = run_ok(
        r#"
        var n = 10;
        var addN = func [n](x) => x + n;
        n = 999;
        var r = addN(5);
        "#,
    );
    assert_eq!(get(&env, "r"), Value::Int(15));
}

/// spec.md §8 invariant 9 / scenario-adjacent: a `pure` function may use
/// its own parameters and const-root names but not an enclosing mutable
/// variable.
#[test]
fn pure_function_rejects_mutable_closure_state() {
    let (_, result) = common::run(
        r#"
        var n = 10;
        pure func bad(x) { return x + n; }
        var r = bad(1);
        "#,
    );
    let err = result.expect_err("pure function must not see mutable globals");
    assert!(matches!(
        err.kind,
        EvalErrorKind::UndefinedVariable { in_pure_function: true, .. }
    ));
}

#[test]
fn pure_function_may_use_const_root_and_params() {
    let env = run_ok(
        r#"
        const factor = 3;
        pure func scale(x) { return x * factor; }
        var r = scale(4);
        "#,
    );
    assert_eq!(get(&env, "r"), Value::Int(12));
}

#[test]
fn arity_mismatch_is_an_error() {
    let (_, result) = common::run("func f(a, b) { return a + b; } var r = f(1);");
    assert!(result.is_err());
}

#[test]
fn recursive_named_function_ackermann_like() {
    let env = run_ok(
        r#"
        func fact(n) {
            if (n <= 1) { return 1; }
            return n * fact(n - 1);
        }
        var r = fact(5);
        "#,
    );
    assert_eq!(get(&env, "r"), Value::Int(120));
}

#[test]
fn multi_target_assignment_distributes_array_positionally() {
    let env = run_ok("var a, b, c = [1, 2];");
    assert_eq!(get(&env, "a"), Value::Int(1));
    assert_eq!(get(&env, "b"), Value::Int(2));
    assert_eq!(get(&env, "c"), Value::None);
}

#[test]
fn multi_target_assignment_broadcasts_non_array_rvalue() {
    let env = run_ok("var a, b = 7;");
    assert_eq!(get(&env, "a"), Value::Int(7));
    assert_eq!(get(&env, "b"), Value::Int(7));
}

#[test]
fn compound_assignment_applies_per_target() {
    let env = run_ok("var a = 1; var b = 2; a, b += 10;");
    assert_eq!(get(&env, "a"), Value::Int(11));
    assert_eq!(get(&env, "b"), Value::Int(12));
}
