//! Shared harness for the black-box scenario tests in this directory.
//!
//! Mirrors the teacher's `test-utils` crate in spirit (one small helper
//! that runs a source snippet end-to-end and hands the test back
//! something to assert on) but adapted to this crate's in-process
//! lex -> parse -> eval pipeline instead of shelling out to a compiled
//! binary: there is no CLI in this crate's scope (spec.md's "external
//! collaborators").

use std::sync::Once;

use embercore::builtins::BuiltinTable;
use embercore::env::Environment;
use embercore::eval::{evaluate, EvalError};
use embercore::lexer::lex_source;
use embercore::parser::parse;
use embercore::value::Value;

static LOGGER_INIT: Once = Once::new();

/// Installs the same `log`/`simple_logger` pairing the teacher's own binary
/// wires up in `main` (`simple_logger::init_with_level(...)`), so a failing
/// scenario's `log::trace!`/`log::debug!`/`log::warn!` calls in
/// `eval/mod.rs` show up in `cargo test -- --nocapture` instead of going
/// nowhere. Guarded by `Once` since every test in a binary shares one
/// process and `simple_logger` panics on a second `init`.
fn init_logging() {
    LOGGER_INIT.call_once(|| {
        simple_logger::init_with_level(log::Level::Trace).ok();
    });
}

/// Runs `src` to completion with the reference built-in table installed,
/// returning the root scope (for inspecting bindings) and the evaluator's
/// outcome. Scenarios that should fully succeed call `.expect_ok()` on the
/// result; scenarios checking error behavior inspect the `Err` directly.
#[allow(dead_code)]
pub fn run(src: &str) -> (Environment, Result<(), EvalError>) {
    init_logging();
    let builtins = BuiltinTable::reference();
    let tokens = lex_source(src).expect("lex");
    let program = parse(tokens, true, &builtins).expect("parse");
    let const_root = Environment::root();
    builtins.install(&const_root);
    let root_scope = Environment::child(&const_root);
    let result = evaluate(&program, &root_scope);
    (root_scope, result)
}

/// Same as [`run`] but with const-folding disabled, for scenarios that
/// need to observe pre-fold behavior.
#[allow(dead_code)]
pub fn run_no_fold(src: &str) -> (Environment, Result<(), EvalError>) {
    init_logging();
    let builtins = BuiltinTable::reference();
    let tokens = lex_source(src).expect("lex");
    let program = parse(tokens, false, &builtins).expect("parse");
    let const_root = Environment::root();
    builtins.install(&const_root);
    let root_scope = Environment::child(&const_root);
    let result = evaluate(&program, &root_scope);
    (root_scope, result)
}

#[allow(dead_code)]
pub fn get(env: &Environment, name: &str) -> Value {
    env.lookup(name)
        .unwrap_or_else(|| panic!("'{name}' is not bound"))
        .borrow()
        .value
        .clone()
}

/// Runs `src` and panics with the eval error's `Display` output if it
/// didn't complete successfully -- most scenarios drive their own
/// assertions via the script's own `assert(...)` calls, so a bare success
/// is the thing worth checking from the Rust side.
#[allow(dead_code)]
pub fn run_ok(src: &str) -> Environment {
    let (env, result) = run(src);
    if let Err(e) = result {
        panic!("program failed: {e}");
    }
    env
}
