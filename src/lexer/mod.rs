//! A small character-by-character state machine that turns one logical
//! source line into a token list. Driven one line at a time (rather than
//! over the whole source at once) so an embedder can lex incrementally;
//! [`lex_source`] is a convenience that drives it over every line of a
//! complete program and stitches the results together.

pub mod error;
pub mod token;

pub use error::{LexError, LexResult};
pub use token::{Keyword, Op, Token, TokenKind};

use crate::location::{Location, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Integer,
    Float,
    Identifier,
    Str,
    Unknown,
}

struct Ctx {
    line_number: usize,
    i: usize,
    tok_start: usize,
    float_exp: bool,
    state: State,
}

impl Ctx {
    fn span_at(&self, col0: usize) -> Span {
        Span::point(Location::new(self.line_number, col0 + 1))
    }

    fn invalid_token(&self, bytes: &[u8]) -> LexError {
        let end = (self.i + 1).min(bytes.len());
        let text = String::from_utf8_lossy(&bytes[self.tok_start..end]).into_owned();
        LexError::new(text, self.span_at(self.tok_start))
    }

    fn accept_token(&mut self, bytes: &[u8], out: &mut Vec<Token>) {
        if self.state == State::None {
            return;
        }
        let text = String::from_utf8_lossy(&bytes[self.tok_start..self.i]).into_owned();
        let span = self.span_at(self.tok_start);
        let kind = match self.state {
            State::Identifier => match Keyword::from_str(&text) {
                Some(kw) => TokenKind::Keyword(kw),
                None => TokenKind::Identifier(text),
            },
            State::Integer => TokenKind::Integer(
                text.parse()
                    .expect("lexer only admits digit sequences into Integer state"),
            ),
            State::Float => TokenKind::Float(
                text.parse()
                    .expect("lexer only admits well-formed lexemes into Float state"),
            ),
            State::Str => TokenKind::String(unescape_quotes(&text)),
            State::Unknown => TokenKind::Unknown(text),
            State::None => unreachable!(),
        };
        out.push(Token::new(kind, span));
    }

    fn handle_in_str(&mut self, bytes: &[u8], out: &mut Vec<Token>) -> LexResult<()> {
        let c = bytes[self.i] as char;
        if c == '"' {
            self.accept_token(bytes, out);
            self.state = State::None;
        } else if c == '\\' {
            if self.i == bytes.len() - 1 {
                return Err(self.invalid_token(bytes));
            }
            if bytes[self.i + 1] as char == '"' {
                self.i += 1;
            }
        }
        Ok(())
    }

    fn handle_space_or_op(&mut self, bytes: &[u8], out: &mut Vec<Token>) {
        let c = bytes[self.i] as char;
        if self.state != State::None {
            self.accept_token(bytes, out);
            self.state = State::None;
        }
        if c.is_whitespace() {
            return;
        }
        let start = self.i;
        let op = if self.i + 1 < bytes.len() {
            let two = Op::from_two_chars(c, bytes[self.i + 1] as char);
            if let Some(op) = two {
                self.i += 1;
                op
            } else {
                Op::from_one_char(c).expect("caller only dispatches here for operator chars")
            }
        } else {
            Op::from_one_char(c).expect("caller only dispatches here for operator chars")
        };
        out.push(Token::new(TokenKind::Operator(op), self.span_at(start)));
    }

    fn handle_alphanum(&mut self, bytes: &[u8]) -> LexResult<()> {
        let c = bytes[self.i] as char;
        match self.state {
            State::None => {
                self.tok_start = self.i;
                self.state = if c.is_ascii_digit() {
                    State::Integer
                } else {
                    State::Identifier
                };
            }
            State::Integer => {
                if c == '.' || c == 'e' {
                    self.state = State::Float;
                    self.float_exp = c == 'e';
                } else if !c.is_ascii_digit() {
                    return Err(self.invalid_token(bytes));
                }
            }
            State::Float => {
                if c == 'e' {
                    if self.float_exp {
                        return Err(self.invalid_token(bytes));
                    }
                    self.float_exp = true;
                } else if !c.is_ascii_digit() {
                    return Err(self.invalid_token(bytes));
                }
            }
            State::Identifier | State::Unknown | State::Str => {}
        }
        Ok(())
    }

    fn handle_other(&mut self, bytes: &[u8]) -> LexResult<()> {
        let c = bytes[self.i] as char;
        match self.state {
            State::None => {
                if c == '"' {
                    self.state = State::Str;
                    self.tok_start = self.i + 1;
                } else {
                    self.tok_start = self.i;
                    self.state = State::Unknown;
                }
                Ok(())
            }
            _ => Err(self.invalid_token(bytes)),
        }
    }
}

/// `\"` is unescaped to a literal quote; every other backslash sequence is
/// passed through untouched, matching the lexer's own handling of `\\`
/// inside a string body (it only special-cases `\"`).
fn unescape_quotes(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&'"') {
            out.push('"');
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Lexes one logical source line, appending its tokens to `out`. `#` starts
/// a line comment that ends tokenization for the rest of the line.
pub fn lex_line(line: &str, line_number: usize, out: &mut Vec<Token>) -> LexResult<()> {
    let bytes = line.as_bytes();
    let mut ctx = Ctx {
        line_number,
        i: 0,
        tok_start: 0,
        float_exp: false,
        state: State::None,
    };

    while ctx.i < bytes.len() {
        let c = bytes[ctx.i] as char;

        if ctx.state == State::Str {
            ctx.handle_in_str(bytes, out)?;
        } else {
            if c == '#' {
                break;
            }
            if ctx.state == State::None {
                ctx.tok_start = ctx.i;
            }

            let is_op = Op::from_one_char(c).is_some();
            let in_integer = ctx.state == State::Integer;

            if c.is_whitespace() || (is_op && (!in_integer || c != '.')) {
                ctx.handle_space_or_op(bytes, out);
            } else if c.is_alphanumeric() || c == '_' || c == '.' {
                ctx.handle_alphanum(bytes)?;
            } else {
                ctx.handle_other(bytes)?;
            }
        }

        ctx.i += 1;
    }

    if ctx.state != State::None {
        if ctx.state == State::Str {
            ctx.tok_start -= 1;
            ctx.i = bytes.len();
            return Err(ctx.invalid_token(bytes));
        }
        ctx.i = bytes.len();
        ctx.accept_token(bytes, out);
    }

    Ok(())
}

/// Lexes a whole program, line by line.
pub fn lex_source(source: &str) -> LexResult<Vec<Token>> {
    let mut out = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        lex_line(line, idx + 1, &mut out)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex_source(src)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_integer_and_float() {
        assert_eq!(kinds("42"), vec![TokenKind::Integer(42)]);
        assert_eq!(kinds("3.14"), vec![TokenKind::Float(3.14)]);
        assert_eq!(kinds("2e3"), vec![TokenKind::Float(2e3)]);
    }

    #[test]
    fn rejects_two_exponents() {
        assert!(lex_line("1e2e3", 1, &mut Vec::new()).is_err());
    }

    #[test]
    fn two_char_operator_requires_one_char_prefix() {
        assert_eq!(
            kinds("<="),
            vec![TokenKind::Operator(Op::Le)]
        );
        assert_eq!(
            kinds("=="),
            vec![TokenKind::Operator(Op::Eq)]
        );
    }

    #[test]
    fn keywords_are_reclassified() {
        assert_eq!(kinds("while"), vec![TokenKind::Keyword(Keyword::While)]);
        assert_eq!(
            kinds("whilex"),
            vec![TokenKind::Identifier("whilex".to_string())]
        );
    }

    #[test]
    fn strings_pass_through_escaped_quote() {
        assert_eq!(
            kinds(r#""a\"b""#),
            vec![TokenKind::String("a\"b".to_string())]
        );
    }

    #[test]
    fn unterminated_string_is_invalid() {
        assert!(lex_line("\"abc", 1, &mut Vec::new()).is_err());
    }

    #[test]
    fn comment_truncates_the_line() {
        assert_eq!(kinds("1 + 2 # trailing"), {
            let mut v = Vec::new();
            lex_line("1 + 2", 1, &mut v).unwrap();
            v.into_iter().map(|t| t.kind).collect::<Vec<_>>()
        });
    }

    #[test]
    fn member_dot_is_an_operator_outside_a_number() {
        assert_eq!(
            kinds("x.y"),
            vec![
                TokenKind::Identifier("x".to_string()),
                TokenKind::Operator(Op::Dot),
                TokenKind::Identifier("y".to_string()),
            ]
        );
    }
}
