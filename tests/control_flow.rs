mod common;

use common::{get, run_ok};
use embercore::value::Value;

/// spec.md §8 scenario 3: a `return` inside `try` still runs `finally`
/// before the call actually returns.
#[test]
fn finally_runs_on_return() {
    let env = run_ok(
        r#"
        var g = 0;
        func f { try { return 42; } finally { g = 1; } }
        var r = f();
        assert(r == 42);
        assert(g == 1);
        "#,
    );
    assert_eq!(get(&env, "r"), Value::Int(42));
    assert_eq!(get(&env, "g"), Value::Int(1));
}

/// spec.md §8 invariant 7: nested `finally` blocks run innermost-first on
/// every exit path.
#[test]
fn nested_finally_runs_innermost_first() {
    let env = run_ok(
        r#"
        var order = [];
        try {
            try {
                throw exception("boom");
            } finally {
                append(order, "inner");
            }
        } catch {
        } finally {
            append(order, "outer");
        }
        "#,
    );
    assert_eq!(
        get(&env, "order"),
        Value::Array(embercore::value::array::Array::from_values(vec![
            Value::Str(embercore::value::string::SharedStr::new("inner".to_string())),
            Value::Str(embercore::value::string::SharedStr::new("outer".to_string())),
        ]))
    );
}

#[test]
fn finally_runs_on_normal_completion_and_break() {
    let env = run_ok(
        r#"
        var touched = 0;
        while (true) {
            try {
                break;
            } finally {
                touched += 1;
            }
        }
        "#,
    );
    assert_eq!(get(&env, "touched"), Value::Int(1));
}

#[test]
fn continue_restarts_the_condition_check() {
    let env = run_ok(
        r#"
        var sum = 0;
        var i = 0;
        while (i < 5) {
            i += 1;
            if (i == 3) { continue; }
            sum += i;
        }
        "#,
    );
    assert_eq!(get(&env, "sum"), Value::Int(1 + 2 + 4 + 5));
}

/// spec.md §8 scenario 4: a custom exception carries a name and a payload,
/// recovered via `exdata`/`exname`, and `catch (Name as e)` binds it.
#[test]
fn custom_exception_with_payload() {
    let env = run_ok(
        r#"
        var got = none;
        try {
            throw exception("myerr", 1234);
        } catch (myerr as e) {
            got = exdata(e);
        }
        "#,
    );
    assert_eq!(get(&env, "got"), Value::Int(1234));
}

#[test]
fn catch_matches_by_name_and_falls_through_otherwise() {
    let (_, result) = common::run(
        r#"
        try {
            throw exception("other", none);
        } catch (myerr) {
        }
        "#,
    );
    assert!(result.is_err());
}

#[test]
fn rethrow_propagates_to_an_outer_catch() {
    let env = run_ok(
        r#"
        var outer_name = "";
        try {
            try {
                throw exception("boom", 7);
            } catch (boom as e) {
                rethrow;
            }
        } catch (boom as e) {
            outer_name = exname(e);
        }
        "#,
    );
    assert_eq!(
        get(&env, "outer_name"),
        Value::Str(embercore::value::string::SharedStr::new("boom".to_string()))
    );
}

#[test]
fn for_loop_counts_as_expected() {
    let env = run_ok(
        r#"
        var sum = 0;
        for (var i = 0; i < 5; i += 1) {
            sum += i;
        }
        "#,
    );
    assert_eq!(get(&env, "sum"), Value::Int(0 + 1 + 2 + 3 + 4));
}
