use embercore::lexer::lex_source;
use embercore::lexer::token::{Keyword, Op, TokenKind};

fn kinds(src: &str) -> Vec<TokenKind> {
    lex_source(src)
        .expect("lex")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn numbers_integers_and_floats() {
    assert_eq!(
        kinds("1 2.5 3.5e2 10"),
        vec![
            TokenKind::Integer(1),
            TokenKind::Float(2.5),
            TokenKind::Float(3.5e2),
            TokenKind::Integer(10),
        ]
    );
}

#[test]
fn identifiers_and_keywords_are_distinguished() {
    assert_eq!(
        kinds("foo if else bar123"),
        vec![
            TokenKind::Identifier("foo".to_string()),
            TokenKind::Keyword(Keyword::If),
            TokenKind::Keyword(Keyword::Else),
            TokenKind::Identifier("bar123".to_string()),
        ]
    );
}

#[test]
fn comments_terminate_the_rest_of_the_line() {
    assert_eq!(
        kinds("1 + 2 # ignored rest"),
        vec![
            TokenKind::Integer(1),
            TokenKind::Operator(Op::Plus),
            TokenKind::Integer(2),
        ]
    );
}

#[test]
fn two_char_operators_require_a_valid_one_char_prefix() {
    assert_eq!(
        kinds("a == b"),
        vec![
            TokenKind::Identifier("a".to_string()),
            TokenKind::Operator(Op::Eq),
            TokenKind::Identifier("b".to_string()),
        ]
    );
    assert_eq!(
        kinds("a != b"),
        vec![
            TokenKind::Identifier("a".to_string()),
            TokenKind::Operator(Op::NotEq),
            TokenKind::Identifier("b".to_string()),
        ]
    );
}

#[test]
fn string_literal_passes_through_non_quote_escapes() {
    assert_eq!(
        kinds(r#""a\nb""#),
        vec![TokenKind::String("a\\nb".to_string())]
    );
}

#[test]
fn escaped_quote_does_not_terminate_the_string() {
    assert_eq!(
        kinds(r#""a\"b""#),
        vec![TokenKind::String("a\"b".to_string())]
    );
}

#[test]
fn unterminated_string_is_an_invalid_token_error() {
    let result = lex_source("\"unterminated");
    assert!(result.is_err());
}

#[test]
fn two_unrecognized_characters_in_a_row_is_an_invalid_token() {
    let result = lex_source("@$");
    assert!(result.is_err());
}

#[test]
fn a_lone_unrecognized_character_lexes_as_an_unknown_token() {
    assert_eq!(kinds("@"), vec![TokenKind::Unknown("@".to_string())]);
}
