//! Core lexer, parser and tree-walking evaluator for a small embeddable
//! scripting language: lex a source string, parse it (with integrated
//! constant folding) into a syntax tree, then walk that tree against a
//! chain of lexically scoped environments.
//!
//! An embedder typically drives the three stages directly:
//!
//! ```no_run
//! use embercore::builtins::BuiltinTable;
//! use embercore::env::Environment;
//! use embercore::lexer::lex_source;
//! use embercore::parser::parse;
//!
//! let builtins = BuiltinTable::reference();
//! let tokens = lex_source("print(1 + 1);").unwrap();
//! let program = parse(tokens, true, &builtins).unwrap();
//!
//! let root = Environment::root();
//! builtins.install(&root);
//! let scope = Environment::child(&root);
//! embercore::eval::evaluate(&program, &scope).unwrap();
//! ```

pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod location;
pub mod parser;
pub mod syntax;
pub mod value;
