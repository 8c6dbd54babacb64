//! The syntax tree produced by [`crate::parser`]: a precedence ladder of
//! expression nodes plus a small statement grammar, mirroring the node
//! kinds enumerated in spec.md §4.2 ("Syntax tree"). Each node is a plain
//! struct/enum with a discriminator, rather than a class hierarchy with a
//! parallel `AstNode` virtual dispatch table, so the evaluator can `match`
//! directly.

mod expr;
mod stmt;

pub use expr::{AssignOp, BinOp, Expr, ExprKind, UnOp};
pub use stmt::{CatchClause, FuncBody, FuncDecl, Stmt, StmtKind};
