use crate::{
    common::span::Spanned,
    compiler::ast::{Param, AST},
    construct::scope::Scope,
};

/// A function value: a reference to its defining `FunctionDefinition`/`Lambda`
/// AST node together with the scope that was live at the point of
/// definition. Calling the function pushes a fresh frame parented on
/// `captured`, not on the caller's scope -- this is what makes it a closure
/// rather than a bare function pointer.
#[derive(Debug, Clone)]
pub struct Closure {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: Spanned<AST>,
    pub captured: Scope,
}

impl Closure {
    pub fn new(name: Option<String>, params: Vec<Param>, body: Spanned<AST>, captured: Scope) -> Closure {
        Closure { name, params, body, captured }
    }
}

impl PartialEq for Closure {
    /// Closures compare by reference identity at the `Value` level (see
    /// `Value::equals`); structural equality here exists only so `Closure`
    /// can sit inside a `#[derive(PartialEq)]` enum, and is intentionally
    /// conservative: no two distinct closures are ever "equal" by this impl.
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}
