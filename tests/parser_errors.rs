use embercore::builtins::BuiltinTable;
use embercore::lexer::lex_source;
use embercore::parser::parse;

fn parse_src(src: &str) -> Result<Vec<embercore::syntax::Stmt>, embercore::parser::ParseError> {
    let builtins = BuiltinTable::reference();
    let tokens = lex_source(src).expect("lex");
    parse(tokens, true, &builtins)
}

#[test]
fn try_without_catch_or_finally_is_rejected() {
    assert!(parse_src("try { var a = 1; }").is_err());
}

#[test]
fn catch_anything_must_be_last() {
    assert!(parse_src("try { } catch { } catch (foo) { }").is_err());
}

#[test]
fn two_catch_anything_clauses_are_rejected() {
    assert!(parse_src("try { } catch { } catch { }").is_err());
}

/// `rethrow` with no currently-handled exception on the stack is treated as
/// a no-op rather than an error (nothing to propagate).
#[test]
fn rethrow_outside_a_catch_is_a_no_op() {
    assert!(parse_src("rethrow;").is_ok());
    let builtins = BuiltinTable::reference();
    let tokens = lex_source("rethrow;").expect("lex");
    let program = parse(tokens, true, &builtins).expect("parse");
    let const_root = embercore::env::Environment::root();
    builtins.install(&const_root);
    let scope = embercore::env::Environment::child(&const_root);
    assert!(embercore::eval::evaluate(&program, &scope).is_ok());
}

#[test]
fn mismatched_parens_are_a_syntax_error() {
    assert!(parse_src("var a = (1 + 2;").is_err());
}

#[test]
fn pure_function_with_captures_is_rejected() {
    assert!(parse_src("var n = 1; var f = pure func [n](x) => x + n;").is_err());
}

#[test]
fn well_formed_program_parses() {
    assert!(parse_src(
        r#"
        func fib(n) {
            if (n < 2) { return n; }
            return fib(n - 1) + fib(n - 2);
        }
        var r = fib(10);
        "#
    )
    .is_ok());
}
