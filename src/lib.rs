//! # Zen
//! This crate contains the core of Zen, a small dynamically-typed scripting
//! language with a tree-walking evaluator and a formal-logic sub-language
//! for quantifiers, predicates, and three-valued truth.
//!
//! ## Overview of evaluation
//! Source code is represented as a [`common::source::Source`]: a reference
//! to some code together with the path it came from. Regions of source are
//! marked with [`common::span::Span`]s -- reference-counted pointers back
//! into the `Source` plus an offset/length pair -- which the lexer and
//! parser attach to everything they produce so that later errors can point
//! at the exact offending text.
//!
//! The first phase is lexing: [`compiler::lex::Lexer::lex`] turns a
//! `Source` into a flat stream of [`common::span::Spanned`]
//! [`compiler::token::Token`]s, erroring out with a [`compiler::syntax::Syntax`]
//! on malformed input (an unterminated string, an unrecognized character).
//!
//! The second phase is parsing: [`compiler::parse::Parser::parse`] consumes
//! that token stream and produces a single [`compiler::ast::AST`] node (a
//! `Compound` of top-level statements), again failing with `Syntax` rather
//! than a runtime error -- static errors never become first-class `Value`s.
//!
//! The third phase is evaluation: [`eval::evaluator::Evaluator`] walks the
//! AST directly (there is no bytecode step) against a [`construct::scope::Scope`]
//! chain, producing [`common::value::Value`]s. Program-level faults (a type
//! mismatch, an undefined name, a user `throw`) become first-class `Error`
//! values that propagate through expressions per the evaluator's control-flow
//! `Signal`; only a lexer/parser failure or a genuine system fault escapes
//! as a Rust `Err`.

pub mod common;
pub mod compiler;
pub mod construct;
pub mod eval;
pub mod operators;

pub use common::{
    closure::Closure,
    source::Source,
    span::Spanned,
    value::{Value, ValueRef},
};
pub use compiler::{ast::AST, lex::Lexer, parse::Parser, syntax::Syntax};
pub use construct::scope::Scope;
pub use eval::evaluator::{Evaluator, Signal};

use std::rc::Rc;

/// Lexes, parses, and evaluates `source` in a fresh global scope, returning
/// the value of the final top-level statement. This is the function
/// `main.rs`'s file-mode and REPL both build on.
pub fn run(source: Rc<Source>, scope: &Scope) -> Result<ValueRef, Syntax> {
    let tokens = Lexer::lex(Rc::clone(&source))?;
    let ast = Parser::parse(tokens, Rc::clone(&source))?;
    let mut evaluator = Evaluator::new();
    match evaluator.eval(&ast, scope) {
        Signal::Normal(value) => Ok(value),
        // a bare top-level `return`/`break` has nothing to propagate into;
        // its value is simply the program's result at that point.
        Signal::Return(value) => Ok(value),
        Signal::Break(value) => Ok(value),
        Signal::Throw(value) => Ok(value),
    }
}
