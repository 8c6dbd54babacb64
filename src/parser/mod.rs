//! Recursive-descent parser with one-token lookahead and integrated
//! constant folding (spec.md §4.3).
//!
//! The grammar is a precedence ladder (primary/postfix at the top,
//! assignment at the bottom) implemented as a chain of methods rather than
//! fourteen near-identical `parse_eN` functions; [`Parser::parse_binary_level`]
//! is the "generic template" spec.md §4.3 describes, parametrized per level
//! by the operator set it accepts.

pub mod const_env;
pub mod error;

use std::collections::HashSet;
use std::rc::Rc;

use crate::builtins::BuiltinTable;
use crate::env::Environment;
use crate::lexer::token::{Keyword, Op, Token, TokenKind};
use crate::location::{Location, Span};
use crate::syntax::{AssignOp, BinOp, CatchClause, Expr, ExprKind, FuncBody, FuncDecl, Stmt, StmtKind, UnOp};

pub use error::{ParseError, ParseResult};

/// Parses a complete token stream into a program (a flat list of top-level
/// statements, implicitly wrapped the way a top-level `{ }` block would
/// be). `const_eval_enabled` lets a driver disable folding for
/// `--disable-const-eval`/`--show-syntax-tree` debugging, per spec.md §6.
pub fn parse(
    tokens: Vec<Token>,
    const_eval_enabled: bool,
    builtins: &BuiltinTable,
) -> ParseResult<Vec<Stmt>> {
    let mut parser = Parser::new(tokens, const_eval_enabled);
    builtins.install(&parser.const_env);
    parser.parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    const_eval_enabled: bool,
    const_env: Environment,
    scopes: Vec<HashSet<String>>,
}

impl Parser {
    fn new(tokens: Vec<Token>, const_eval_enabled: bool) -> Self {
        Self {
            tokens,
            pos: 0,
            const_eval_enabled,
            const_env: Environment::root(),
            scopes: vec![HashSet::new()],
        }
    }

    // -- token stream helpers -------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn current_span(&self) -> Span {
        self.peek()
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(Location::UNKNOWN))
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_op(&self, op: Op) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Operator(o)) if *o == op)
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Keyword(k)) if *k == kw)
    }

    fn accept_op(&mut self, op: Op) -> bool {
        if self.at_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn accept_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: Op) -> ParseResult<Span> {
        let span = self.current_span();
        if self.accept_op(op) {
            Ok(span)
        } else {
            Err(self.unexpected(&format!("expected '{}'", op.lexeme())))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek_kind().cloned() {
            Some(TokenKind::Identifier(name)) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("expected identifier")),
        }
    }

    fn unexpected(&self, message: &str) -> ParseError {
        match self.peek().cloned() {
            Some(tok) => ParseError::expected_token(message, tok.span, tok),
            None => ParseError::new(format!("{message}, found end of input"), self.current_span()),
        }
    }

    fn end_loc(&self) -> Location {
        if self.pos == 0 {
            return Location::UNKNOWN;
        }
        self.tokens[self.pos - 1].span.end
    }

    // -- scope bookkeeping (parser-side, mirrors declaration rules) ---------

    fn push_scope(&mut self) {
        self.scopes.push(HashSet::new());
        self.const_env = Environment::child(&self.const_env);
    }

    fn pop_scope(&mut self, saved_const_env: Environment) {
        self.scopes.pop();
        self.const_env = saved_const_env;
    }

    fn declare_name(&mut self, name: &str, span: Span) -> ParseResult<()> {
        if self.scopes.last().unwrap().contains(name) {
            return Err(ParseError::new(
                format!("'{name}' is already defined in this scope"),
                span,
            ));
        }
        if self.const_env.is_const_anywhere(name) {
            return Err(ParseError::new(
                format!("cannot shadow const or builtin '{name}'"),
                span,
            ));
        }
        self.scopes.last_mut().unwrap().insert(name.to_string());
        Ok(())
    }

    // -- program / statements -------------------------------------------------

    fn parse_program(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;

        if self.at_op(Op::Semi) {
            self.advance();
            return Ok(Stmt::new(StmtKind::Nop, Span::new(start, self.end_loc())));
        }
        if self.at_op(Op::LBrace) {
            return self.parse_block();
        }
        if self.at_keyword(Keyword::If) {
            return self.parse_if();
        }
        if self.at_keyword(Keyword::While) {
            return self.parse_while();
        }
        if self.at_keyword(Keyword::For) {
            return self.parse_for();
        }
        if self.at_keyword(Keyword::Foreach) {
            return self.parse_foreach();
        }
        if self.at_keyword(Keyword::Break) {
            self.advance();
            self.expect_op(Op::Semi)?;
            return Ok(Stmt::new(StmtKind::Break, Span::new(start, self.end_loc())));
        }
        if self.at_keyword(Keyword::Continue) {
            self.advance();
            self.expect_op(Op::Semi)?;
            return Ok(Stmt::new(StmtKind::Continue, Span::new(start, self.end_loc())));
        }
        if self.at_keyword(Keyword::Return) {
            self.advance();
            let value = if self.at_op(Op::Semi) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect_op(Op::Semi)?;
            return Ok(Stmt::new(StmtKind::Return(value), Span::new(start, self.end_loc())));
        }
        if self.at_keyword(Keyword::Throw) {
            self.advance();
            let value = self.parse_expr()?;
            self.expect_op(Op::Semi)?;
            return Ok(Stmt::new(StmtKind::Throw(value), Span::new(start, self.end_loc())));
        }
        if self.at_keyword(Keyword::Rethrow) {
            self.advance();
            self.expect_op(Op::Semi)?;
            return Ok(Stmt::new(StmtKind::Rethrow, Span::new(start, self.end_loc())));
        }
        if self.at_keyword(Keyword::Try) {
            return self.parse_try();
        }
        if self.at_keyword(Keyword::Var) {
            return self.parse_var_decl();
        }
        if self.at_keyword(Keyword::Const) {
            return self.parse_const_decl();
        }
        if self.at_keyword(Keyword::Func) || self.at_keyword(Keyword::Pure) {
            return self.parse_func_decl_stmt();
        }

        let expr = self.parse_expr()?;
        self.expect_op(Op::Semi)?;
        Ok(Stmt::new(StmtKind::Expr(expr), Span::new(start, self.end_loc())))
    }

    fn parse_block(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;
        self.expect_op(Op::LBrace)?;
        let saved = self.const_env.clone();
        self.push_scope();
        let mut stmts = Vec::new();
        while !self.at_op(Op::RBrace) {
            if self.peek().is_none() {
                return Err(self.unexpected("unterminated block, expected '}'"));
            }
            stmts.push(self.parse_stmt()?);
        }
        self.expect_op(Op::RBrace)?;
        self.pop_scope(saved);
        Ok(Stmt::new(StmtKind::Block(stmts), Span::new(start, self.end_loc())))
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;
        self.advance();
        self.expect_op(Op::LParen)?;
        let cond = self.parse_expr()?;
        self.expect_op(Op::RParen)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.accept_keyword(Keyword::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            Span::new(start, self.end_loc()),
        ))
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;
        self.advance();
        self.expect_op(Op::LParen)?;
        let cond = self.parse_expr()?;
        self.expect_op(Op::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::new(StmtKind::While { cond, body }, Span::new(start, self.end_loc())))
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;
        self.advance();
        self.expect_op(Op::LParen)?;

        let saved = self.const_env.clone();
        self.push_scope();

        let init = if self.at_op(Op::Semi) {
            None
        } else if self.at_keyword(Keyword::Var) {
            Some(Box::new(self.parse_var_decl_inner()?))
        } else {
            let span_start = self.current_span().start;
            let e = self.parse_expr()?;
            Some(Box::new(Stmt::new(StmtKind::Expr(e), Span::new(span_start, self.end_loc()))))
        };
        self.expect_op(Op::Semi)?;

        let cond = if self.at_op(Op::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_op(Op::Semi)?;

        let step = if self.at_op(Op::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_op(Op::RParen)?;

        let body = Box::new(self.parse_stmt()?);
        self.pop_scope(saved);

        Ok(Stmt::new(
            StmtKind::For {
                init,
                cond,
                step,
                body,
            },
            Span::new(start, self.end_loc()),
        ))
    }

    fn parse_foreach(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;
        self.advance();
        self.expect_op(Op::LParen)?;

        let indexed = self.accept_keyword(Keyword::Indexed);
        // `var` before the bound identifiers is accepted but not required
        // to keep `foreach (var k, v in d)` and `foreach (k, v in d)` both
        // readable; either way the identifiers are fresh bindings local to
        // the loop body.
        self.accept_keyword(Keyword::Var);

        let mut idents = vec![self.expect_ident()?];
        while self.accept_op(Op::Comma) {
            self.accept_keyword(Keyword::Var);
            idents.push(self.expect_ident()?);
        }

        if !self.accept_keyword(Keyword::In) {
            return Err(self.unexpected("expected 'in'"));
        }
        let iter = self.parse_expr()?;
        self.expect_op(Op::RParen)?;

        let saved = self.const_env.clone();
        self.push_scope();
        for id in &idents {
            self.declare_name(id, start_span(start, self.end_loc()))?;
        }
        let body = Box::new(self.parse_stmt()?);
        self.pop_scope(saved);

        Ok(Stmt::new(
            StmtKind::Foreach {
                idents,
                indexed,
                iter,
                body,
            },
            Span::new(start, self.end_loc()),
        ))
    }

    fn parse_try(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;
        self.advance();
        let try_block = Box::new(self.parse_block()?);

        let mut catches = Vec::new();
        let mut seen_catch_all = false;
        while self.at_keyword(Keyword::Catch) {
            let catch_start = self.current_span().start;
            self.advance();

            if seen_catch_all {
                return Err(ParseError::new(
                    "a catch-anything clause must be the last catch",
                    Span::new(catch_start, catch_start),
                ));
            }

            let (names, bind) = if self.accept_op(Op::LParen) {
                let mut names = vec![self.expect_ident()?];
                while self.accept_op(Op::Comma) {
                    names.push(self.expect_ident()?);
                }
                let bind = if self.accept_keyword(Keyword::As) {
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                self.expect_op(Op::RParen)?;
                (Some(names), bind)
            } else {
                seen_catch_all = true;
                (None, None)
            };

            let saved = self.const_env.clone();
            self.push_scope();
            if let Some(name) = &bind {
                self.declare_name(name, self.current_span())?;
            }
            let body = self.parse_block_raw()?;
            self.pop_scope(saved);

            catches.push(CatchClause {
                names,
                bind,
                body,
                span: Span::new(catch_start, self.end_loc()),
            });
        }

        let finally = if self.accept_keyword(Keyword::Finally) {
            Some(Box::new(self.parse_block()?))
        } else {
            None
        };

        if catches.is_empty() && finally.is_none() {
            return Err(ParseError::new(
                "'try' must be followed by at least one 'catch' or a 'finally'",
                Span::new(start, self.end_loc()),
            ));
        }

        Ok(Stmt::new(
            StmtKind::TryCatchFinally {
                try_block,
                catches,
                finally,
            },
            Span::new(start, self.end_loc()),
        ))
    }

    /// Like [`Parser::parse_block`] but returns the raw `Stmt` (used for a
    /// catch body, where the surrounding scope push/pop is already handled
    /// by the caller so the bound exception identifier is visible inside).
    fn parse_block_raw(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;
        self.expect_op(Op::LBrace)?;
        let mut stmts = Vec::new();
        while !self.at_op(Op::RBrace) {
            if self.peek().is_none() {
                return Err(self.unexpected("unterminated block, expected '}'"));
            }
            stmts.push(self.parse_stmt()?);
        }
        self.expect_op(Op::RBrace)?;
        Ok(Stmt::new(StmtKind::Block(stmts), Span::new(start, self.end_loc())))
    }

    fn parse_var_decl(&mut self) -> ParseResult<Stmt> {
        let stmt = self.parse_var_decl_inner()?;
        self.expect_op(Op::Semi)?;
        Ok(stmt)
    }

    fn parse_var_decl_inner(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;
        self.advance();
        let name = self.expect_ident()?;
        self.declare_name(&name, Span::new(start, self.current_span().start))?;
        let init = if self.accept_op(Op::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Stmt::new(StmtKind::VarDecl { name, init }, Span::new(start, self.end_loc())))
    }

    fn parse_const_decl(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;
        self.advance();
        let name = self.expect_ident()?;
        self.declare_name(&name, Span::new(start, self.current_span().start))?;
        self.expect_op(Op::Assign)?;
        let init = self.parse_expr()?;
        self.expect_op(Op::Semi)?;

        if !init.is_const {
            return Err(ParseError::new(
                format!("the expression initializing const '{name}' is not const"),
                init.span,
            ));
        }

        let value = const_env::try_fold_container(&self.const_env, &init)
            .ok_or_else(|| ParseError::new(format!("cannot fold const '{name}' at parse time"), init.span))?;
        self.const_env.declare(&name, value, true);

        Ok(Stmt::new(StmtKind::ConstDecl { name, init }, Span::new(start, self.end_loc())))
    }

    fn parse_func_decl_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;
        let is_pure = self.accept_keyword(Keyword::Pure);
        if !self.accept_keyword(Keyword::Func) {
            return Err(self.unexpected("expected 'func'"));
        }
        let name = self.expect_ident()?;
        self.declare_name(&name, Span::new(start, self.current_span().start))?;

        let decl = self.parse_func_tail(Some(name), is_pure, start)?;
        Ok(Stmt::new(StmtKind::FuncDecl(Rc::new(decl)), Span::new(start, self.end_loc())))
    }

    /// Parses the `[captures](params) body` tail shared by named
    /// declarations and anonymous function expressions; `name` is `None`
    /// for the latter.
    fn parse_func_tail(&mut self, name: Option<String>, is_pure: bool, start: Location) -> ParseResult<FuncDecl> {
        let captures = if name.is_none() && self.at_op(Op::LBracket) {
            if is_pure {
                return Err(ParseError::new(
                    "capture lists are not allowed on pure functions",
                    self.current_span(),
                ));
            }
            self.advance();
            let mut names = Vec::new();
            if !self.at_op(Op::RBracket) {
                names.push(self.expect_ident()?);
                while self.accept_op(Op::Comma) {
                    names.push(self.expect_ident()?);
                }
            }
            self.expect_op(Op::RBracket)?;
            Some(names)
        } else {
            None
        };

        // A zero-parameter named function may drop the parens entirely
        // (`func f { ... }`, spec.md §8 scenario 3); anonymous functions
        // always spell out `()`/`(params)` since there'd be nothing left
        // to distinguish `func => expr` from a bare block otherwise.
        let mut params = Vec::new();
        if name.is_some() && !self.at_op(Op::LParen) {
            // no parameter list at all
        } else {
            self.expect_op(Op::LParen)?;
            if !self.at_op(Op::RParen) {
                params.push(self.expect_ident()?);
                while self.accept_op(Op::Comma) {
                    params.push(self.expect_ident()?);
                }
            }
            self.expect_op(Op::RParen)?;
        }

        let mut seen = HashSet::new();
        for p in &params {
            if !seen.insert(p.clone()) {
                return Err(ParseError::new(
                    format!("duplicate parameter '{p}'"),
                    self.current_span(),
                ));
            }
        }

        let saved = self.const_env.clone();
        self.push_scope();
        for p in &params {
            self.scopes.last_mut().unwrap().insert(p.clone());
        }
        if let Some(cs) = &captures {
            for c in cs {
                self.scopes.last_mut().unwrap().insert(c.clone());
            }
        }

        let body = if self.accept_op(Op::FatArrow) {
            let e = self.parse_expr()?;
            self.expect_op(Op::Semi).ok();
            FuncBody::Expr(e)
        } else if self.at_op(Op::LBrace) {
            match self.parse_block_raw()?.kind {
                StmtKind::Block(stmts) => FuncBody::Block(stmts),
                _ => unreachable!(),
            }
        } else {
            self.pop_scope(saved);
            return Err(self.unexpected("expected '{' block or '=>' expression"));
        };

        self.pop_scope(saved);

        Ok(FuncDecl {
            name,
            params,
            captures,
            is_pure,
            body,
            span: Span::new(start, self.end_loc()),
        })
    }

    // -- expressions ------------------------------------------------------

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let lhs = self.parse_or()?;

        if matches!(lhs.kind, ExprKind::Ident(_)) && self.at_op(Op::Comma) {
            let mut targets = vec![ident_name(&lhs)];
            while self.accept_op(Op::Comma) {
                targets.push(self.expect_ident()?);
            }
            let op = self.expect_assign_op()?;
            let value = Box::new(self.parse_assignment()?);
            return Ok(Expr::new(
                ExprKind::MultiAssign { targets, op, value },
                Span::new(start, self.end_loc()),
                false,
            ));
        }

        if let Some(op) = self.peek_assign_op() {
            self.advance();
            if !is_lvalue_expr(&lhs) {
                return Err(ParseError::new("left side of assignment is not an l-value", lhs.span));
            }
            let value = Box::new(self.parse_assignment()?);
            return Ok(Expr::new(
                ExprKind::Assign {
                    target: Box::new(lhs),
                    op,
                    value,
                },
                Span::new(start, self.end_loc()),
                false,
            ));
        }

        Ok(lhs)
    }

    fn peek_assign_op(&self) -> Option<AssignOp> {
        match self.peek_kind() {
            Some(TokenKind::Operator(Op::Assign)) => Some(AssignOp::Assign),
            Some(TokenKind::Operator(Op::PlusEq)) => Some(AssignOp::AddAssign),
            Some(TokenKind::Operator(Op::MinusEq)) => Some(AssignOp::SubAssign),
            Some(TokenKind::Operator(Op::StarEq)) => Some(AssignOp::MulAssign),
            Some(TokenKind::Operator(Op::SlashEq)) => Some(AssignOp::DivAssign),
            Some(TokenKind::Operator(Op::PercentEq)) => Some(AssignOp::ModAssign),
            _ => None,
        }
    }

    fn expect_assign_op(&mut self) -> ParseResult<AssignOp> {
        match self.peek_assign_op() {
            Some(op) => {
                self.advance();
                Ok(op)
            }
            None => Err(self.unexpected("expected an assignment operator")),
        }
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.accept_op(Op::OrOr) {
            let rhs = self.parse_and()?;
            lhs = self.combine_binary(BinOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.accept_op(Op::AndAnd) {
            let rhs = self.parse_equality()?;
            lhs = self.combine_binary(BinOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = if self.accept_op(Op::Eq) {
                BinOp::Eq
            } else if self.accept_op(Op::NotEq) {
                BinOp::NotEq
            } else {
                break;
            };
            let rhs = self.parse_relational()?;
            lhs = self.combine_binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = if self.accept_op(Op::Le) {
                BinOp::Le
            } else if self.accept_op(Op::Ge) {
                BinOp::Ge
            } else if self.accept_op(Op::Lt) {
                BinOp::Lt
            } else if self.accept_op(Op::Gt) {
                BinOp::Gt
            } else {
                break;
            };
            let rhs = self.parse_additive()?;
            lhs = self.combine_binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = if self.accept_op(Op::Plus) {
                BinOp::Add
            } else if self.accept_op(Op::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let rhs = self.parse_multiplicative()?;
            lhs = self.combine_binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = if self.accept_op(Op::Star) {
                BinOp::Mul
            } else if self.accept_op(Op::Slash) {
                BinOp::Div
            } else if self.accept_op(Op::Percent) {
                BinOp::Mod
            } else {
                break;
            };
            let rhs = self.parse_unary()?;
            lhs = self.combine_binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let op = if self.accept_op(Op::Minus) {
            Some(UnOp::Neg)
        } else if self.accept_op(Op::Bang) {
            Some(UnOp::Not)
        } else {
            None
        };
        match op {
            Some(op) => {
                let operand = self.parse_unary()?;
                let is_const = operand.is_const;
                let span = Span::new(start, self.end_loc());
                let mut expr = Expr::new(ExprKind::Unary(op, Box::new(operand)), span, is_const);
                if self.const_eval_enabled && is_const {
                    self.try_fold_in_place(&mut expr);
                }
                Ok(expr)
            }
            None => self.parse_postfix(),
        }
    }

    fn combine_binary(&mut self, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        let is_const = lhs.is_const && rhs.is_const;
        let span = Span::new(lhs.span.start, rhs.span.end);
        let mut expr = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), span, is_const);
        if self.const_eval_enabled && is_const {
            self.try_fold_in_place(&mut expr);
        }
        expr
    }

    fn try_fold_in_place(&mut self, expr: &mut Expr) {
        if let Some(value) = const_env::try_fold(&self.const_env, expr) {
            if let Some(literal) = literal_from_value(&value, expr.span) {
                *expr = literal;
            }
        }
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let mut node = self.parse_primary()?;
        loop {
            if self.accept_op(Op::Dot) {
                let name = self.expect_ident()?;
                node = Expr::new(
                    ExprKind::Member(Box::new(node), name),
                    Span::new(start, self.end_loc()),
                    false,
                );
            } else if self.accept_op(Op::LParen) {
                let mut args = Vec::new();
                if !self.at_op(Op::RParen) {
                    args.push(self.parse_assignment()?);
                    while self.accept_op(Op::Comma) {
                        args.push(self.parse_assignment()?);
                    }
                }
                self.expect_op(Op::RParen)?;
                node = Expr::new(ExprKind::Call(Box::new(node), args), Span::new(start, self.end_loc()), false);
            } else if self.accept_op(Op::LBracket) {
                if self.accept_op(Op::Colon) {
                    let end = if self.at_op(Op::RBracket) {
                        None
                    } else {
                        Some(Box::new(self.parse_assignment()?))
                    };
                    self.expect_op(Op::RBracket)?;
                    node = Expr::new(
                        ExprKind::Slice(Box::new(node), None, end),
                        Span::new(start, self.end_loc()),
                        false,
                    );
                } else {
                    let first = self.parse_assignment()?;
                    if self.accept_op(Op::Colon) {
                        let end = if self.at_op(Op::RBracket) {
                            None
                        } else {
                            Some(Box::new(self.parse_assignment()?))
                        };
                        self.expect_op(Op::RBracket)?;
                        node = Expr::new(
                            ExprKind::Slice(Box::new(node), Some(Box::new(first)), end),
                            Span::new(start, self.end_loc()),
                            false,
                        );
                    } else {
                        self.expect_op(Op::RBracket)?;
                        node = Expr::new(
                            ExprKind::Index(Box::new(node), Box::new(first)),
                            Span::new(start, self.end_loc()),
                            false,
                        );
                    }
                }
            } else {
                break;
            }
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let Some(tok) = self.peek().cloned() else {
            return Err(ParseError::new("unexpected end of input", self.current_span()));
        };

        match tok.kind {
            TokenKind::Integer(i) => {
                self.advance();
                Ok(Expr::literal(ExprKind::Int(i), tok.span))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expr::literal(ExprKind::Float(f), tok.span))
            }
            TokenKind::String(s) => {
                self.advance();
                let body = unescape::unescape(&s).unwrap_or(s);
                Ok(Expr::literal(ExprKind::Str(body), tok.span))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::literal(ExprKind::Bool(true), tok.span))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::literal(ExprKind::Bool(false), tok.span))
            }
            TokenKind::Keyword(Keyword::None) => {
                self.advance();
                Ok(Expr::literal(ExprKind::None, tok.span))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                let is_const = self.const_env.is_const_anywhere(&name);
                Ok(Expr::new(ExprKind::Ident(name), tok.span, is_const))
            }
            TokenKind::Operator(Op::LParen) => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect_op(Op::RParen)?;
                let is_const = inner.is_const;
                Ok(Expr::new(inner.kind, Span::new(start, self.end_loc()), is_const))
            }
            TokenKind::Operator(Op::LBracket) => self.parse_array_lit(start),
            TokenKind::Operator(Op::LBrace) => self.parse_dict_lit(start),
            TokenKind::Keyword(Keyword::Func) | TokenKind::Keyword(Keyword::Pure) => {
                let is_pure = self.accept_keyword(Keyword::Pure);
                if !self.accept_keyword(Keyword::Func) {
                    return Err(self.unexpected("expected 'func'"));
                }
                let decl = self.parse_func_tail(None, is_pure, start)?;
                Ok(Expr::new(ExprKind::FuncExpr(Rc::new(decl)), Span::new(start, self.end_loc()), false))
            }
            _ => Err(self.unexpected("expected an expression")),
        }
    }

    fn parse_array_lit(&mut self, start: Location) -> ParseResult<Expr> {
        self.advance();
        let mut elems = Vec::new();
        let mut is_const = true;
        if !self.at_op(Op::RBracket) {
            let e = self.parse_assignment()?;
            is_const &= e.is_const;
            elems.push(e);
            while self.accept_op(Op::Comma) {
                if self.at_op(Op::RBracket) {
                    break;
                }
                let e = self.parse_assignment()?;
                is_const &= e.is_const;
                elems.push(e);
            }
        }
        self.expect_op(Op::RBracket)?;
        Ok(Expr::new(ExprKind::ArrayLit(elems), Span::new(start, self.end_loc()), is_const))
    }

    fn parse_dict_lit(&mut self, start: Location) -> ParseResult<Expr> {
        self.advance();
        let mut pairs = Vec::new();
        let mut is_const = true;
        if !self.at_op(Op::RBrace) {
            loop {
                let key = self.parse_assignment()?;
                self.expect_op(Op::Colon)?;
                let value = self.parse_assignment()?;
                is_const &= key.is_const && value.is_const;
                pairs.push((key, value));
                if !self.accept_op(Op::Comma) {
                    break;
                }
                if self.at_op(Op::RBrace) {
                    break;
                }
            }
        }
        self.expect_op(Op::RBrace)?;
        Ok(Expr::new(ExprKind::DictLit(pairs), Span::new(start, self.end_loc()), is_const))
    }
}

fn start_span(start: Location, end: Location) -> Span {
    Span::new(start, end)
}

fn ident_name(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Ident(name) => name.clone(),
        _ => unreachable!("caller only calls this when lhs.kind is Ident"),
    }
}

fn is_lvalue_expr(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Ident(_) | ExprKind::Member(_, _) | ExprKind::Index(_, _)
    )
}

/// Builds the literal node a folded scalar collapses to. Returns `None`
/// for a shared-container result (array/dict/function/exception/builtin) --
/// there's no literal node that represents an already-evaluated array or
/// dict without re-stringifying it and losing its type (spec.md §4.4: `a +
/// a` on arrays must stay an array), so the caller leaves the original
/// subtree in place and lets the evaluator produce the same value at
/// runtime instead.
fn literal_from_value(value: &crate::value::Value, span: Span) -> Option<Expr> {
    use crate::value::Value;
    match value {
        Value::Int(i) => Some(Expr::literal(ExprKind::Int(*i), span)),
        Value::Float(f) => Some(Expr::literal(ExprKind::Float(*f), span)),
        Value::None => Some(Expr::literal(ExprKind::None, span)),
        Value::Str(s) => Some(Expr::literal(ExprKind::Str(s.as_str().to_string()), span)),
        _ => None,
    }
}
