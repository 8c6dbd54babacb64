mod common;

use common::{get, run_ok};
use embercore::builtins::BuiltinTable;
use embercore::lexer::lex_source;
use embercore::parser::parse;
use embercore::syntax::{ExprKind, StmtKind};
use embercore::value::Value;

/// spec.md §8 invariant 8: `const k = 2; const p = k * 3;` folds `p` to a
/// literal integer `6` in the syntax tree itself, not merely at eval time.
#[test]
fn const_declarations_fold_through_the_parser() {
    let builtins = BuiltinTable::reference();
    let tokens = lex_source("const k = 2; const p = k * 3;").expect("lex");
    let program = parse(tokens, true, &builtins).expect("parse");

    let p_decl = program
        .iter()
        .find_map(|s| match &s.kind {
            StmtKind::ConstDecl { name, init } if name == "p" => Some(init),
            _ => None,
        })
        .expect("const p declaration");
    assert!(matches!(p_decl.kind, ExprKind::Int(6)));
}

#[test]
fn folding_disabled_leaves_the_expression_unfolded() {
    let builtins = BuiltinTable::reference();
    let tokens = lex_source("const k = 2; const p = k * 3;").expect("lex");
    let program = parse(tokens, false, &builtins).expect("parse");
    let p_decl = program
        .iter()
        .find_map(|s| match &s.kind {
            StmtKind::ConstDecl { name, init } if name == "p" => Some(init),
            _ => None,
        })
        .expect("const p declaration");
    assert!(!matches!(p_decl.kind, ExprKind::Int(_)));
}

#[test]
fn shadowing_a_const_in_an_enclosing_scope_is_rejected() {
    let builtins = BuiltinTable::reference();
    let tokens = lex_source("const k = 2; { var k = 3; }").expect("lex");
    assert!(parse(tokens, true, &builtins).is_err());
}

#[test]
fn shadowing_a_builtin_name_is_rejected() {
    let builtins = BuiltinTable::reference();
    let tokens = lex_source("var print = 1;").expect("lex");
    assert!(parse(tokens, true, &builtins).is_err());
}

#[test]
fn redeclaring_in_the_same_scope_is_rejected() {
    let builtins = BuiltinTable::reference();
    let tokens = lex_source("var a = 1; var a = 2;").expect("lex");
    assert!(parse(tokens, true, &builtins).is_err());
}

#[test]
fn non_const_expr_in_const_decl_is_rejected() {
    let builtins = BuiltinTable::reference();
    let tokens = lex_source("var x = 1; const k = x + 1;").expect("lex");
    assert!(parse(tokens, true, &builtins).is_err());
}

#[test]
fn assigning_to_a_const_binding_is_an_evaluator_error() {
    let (_, result) = common::run("const k = 2; k = 3;");
    assert!(result.is_err());
}

/// spec.md §8 invariant 2: cloning any immutable value compares equal to
/// the original.
#[test]
fn clone_compares_equal_to_the_original() {
    let env = run_ok(
        r#"
        var a = [1, {"x": 2}, "s"];
        var b = clone(a);
        assert(a == b);
        "#,
    );
    assert_eq!(get(&env, "a"), get(&env, "b"));
}

/// spec.md §8 invariant 1: `v == v` for all values except NaN.
#[test]
fn value_equals_itself() {
    let env = run_ok(
        r#"
        var r1 = 1 == 1;
        var r2 = "s" == "s";
        var r3 = [1,2] == [1,2];
        var r4 = none == none;
        "#,
    );
    assert_eq!(get(&env, "r1"), Value::bool(true));
    assert_eq!(get(&env, "r2"), Value::bool(true));
    assert_eq!(get(&env, "r3"), Value::bool(true));
    assert_eq!(get(&env, "r4"), Value::bool(true));
}
