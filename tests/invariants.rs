mod common;

use common::{get, run_ok};
use embercore::value::array::Array;
use embercore::value::Value;

/// spec.md §8 invariant 10: a freshly taken slice reports the same
/// `intptr` as its backing container until a divergent mutation detaches
/// it (invariant 6 exercises the detach side).
#[test]
fn slice_shares_intptr_with_backing_until_mutation() {
    let env = run_ok("var a = [1,2,3]; var b = a[0:2];");
    let a = match get(&env, "a") {
        Value::Array(a) => a,
        other => panic!("expected array, got {other:?}"),
    };
    let b = match get(&env, "b") {
        Value::Array(b) => b,
        other => panic!("expected array, got {other:?}"),
    };
    assert_eq!(a.intptr(), b.intptr());
    assert!(b.is_slice());
    assert!(!a.is_slice());
}

#[test]
fn divergent_mutation_detaches_intptr() {
    let env = run_ok("var a = [1,2,3]; var b = a[0:2]; a[0] = 9;");
    let a = match get(&env, "a") {
        Value::Array(a) => a,
        other => panic!("expected array, got {other:?}"),
    };
    let b = match get(&env, "b") {
        Value::Array(b) => b,
        other => panic!("expected array, got {other:?}"),
    };
    assert_ne!(a.intptr(), b.intptr());
}

/// spec.md §8 invariant 3: stringifying then re-lexing a string literal's
/// body round-trips.
#[test]
fn string_literal_roundtrips_through_str_and_relex() {
    use embercore::lexer::lex_source;
    use embercore::lexer::token::TokenKind;

    let original = r#""say \"hi\"""#;
    let tokens = lex_source(original).expect("lex");
    let body = tokens
        .iter()
        .find_map(|t| match &t.kind {
            TokenKind::String(s) => Some(s.clone()),
            _ => None,
        })
        .expect("string token");

    // Stringifying a value back into a literal must re-escape embedded
    // quotes the lexer unescaped on the way in.
    let re_escaped = body.replace('"', "\\\"");
    let relexed = lex_source(&format!("\"{re_escaped}\"")).expect("relex");
    let rebody = relexed
        .iter()
        .find_map(|t| match &t.kind {
            TokenKind::String(s) => Some(s.clone()),
            _ => None,
        })
        .expect("relexed string token");
    assert_eq!(body, rebody);
}

#[test]
fn array_of_none_has_requested_length_and_all_none_elements() {
    let env = run_ok("var a = array(4);");
    match get(&env, "a") {
        Value::Array(a) => {
            let values = a.values();
            assert_eq!(values.len(), 4);
            assert!(values.iter().all(|v| matches!(v, Value::None)));
        }
        other => panic!("expected array, got {other:?}"),
    }
}

#[test]
fn nan_is_not_reflexively_equal() {
    let env = run_ok("var nan = 0.0 / 0.0; var r = nan == nan;");
    assert_eq!(get(&env, "r"), Value::bool(false));
}

#[test]
fn single_index_matches_one_element_slice_for_strings_too() {
    let env = run_ok(r#"const s = "abc"; var r = s[1] == s[1:2];"#);
    assert_eq!(get(&env, "r"), Value::bool(true));
}

#[test]
fn array_append_onto_an_unaliased_array_is_in_place_growth() {
    let env = run_ok("var a = [1,2]; append(a, 3);");
    assert_eq!(
        get(&env, "a"),
        Value::Array(Array::from_values(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
    );
}
