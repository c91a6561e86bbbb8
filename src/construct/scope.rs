use std::{cell::RefCell, rc::Rc};

use crate::common::{ordered_map::OrderedMap, value::ValueRef};

/// A single frame: an insertion-ordered mapping from name to value-handle,
/// plus a link to its parent frame (`None` for the global frame).
#[derive(Debug)]
struct Frame {
    vars: OrderedMap<ValueRef>,
    parent: Option<Scope>,
}

/// A chain of frames. Cloning a `Scope` clones the handle, not the chain --
/// this is exactly how a closure captures its defining environment: the
/// `Scope` a `Function` value stores is a cheap `Rc` clone of the frame that
/// was live when the function was defined.
#[derive(Debug, Clone)]
pub struct Scope(Rc<RefCell<Frame>>);

impl Scope {
    /// Creates a fresh global scope with no parent.
    pub fn global() -> Scope {
        Scope(Rc::new(RefCell::new(Frame { vars: OrderedMap::new(), parent: None })))
    }

    /// Pushes a new frame whose parent is `self`. Used both for lexical
    /// blocks and -- critically -- for function invocation, where the new
    /// frame's parent is the function's *captured* scope, not the caller's.
    pub fn child(&self) -> Scope {
        Scope(Rc::new(RefCell::new(Frame {
            vars: OrderedMap::new(),
            parent: Some(self.clone()),
        })))
    }

    /// Binds `name` in the innermost (this) frame, overwriting any existing
    /// binding of the same name in this frame (shadowing any binding further
    /// up the chain).
    pub fn define(&self, name: &str, value: ValueRef) {
        self.0.borrow_mut().vars.set(name, value);
    }

    /// Looks up `name`, walking from this frame toward the root.
    pub fn get(&self, name: &str) -> Option<ValueRef> {
        let frame = self.0.borrow();
        if let Some(value) = frame.vars.get(name) {
            return Some(Rc::clone(value));
        }
        frame.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Rebinds an existing `name` in place, wherever in the chain it's
    /// bound. Returns `false` (and binds nothing) if `name` is not bound
    /// anywhere in the chain -- the caller is expected to surface this as a
    /// `NameError`.
    pub fn assign(&self, name: &str, value: ValueRef) -> bool {
        let mut frame = self.0.borrow_mut();
        if frame.vars.has(name) {
            frame.vars.set(name, value);
            return true;
        }
        match &frame.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        let frame = self.0.borrow();
        frame.vars.has(name) || frame.parent.as_ref().is_some_and(|p| p.is_defined(name))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::value::Value;

    fn val(n: f64) -> ValueRef {
        Rc::new(RefCell::new(Value::Number(n)))
    }

    #[test]
    fn lookup_walks_to_parent() {
        let global = Scope::global();
        global.define("x", val(1.0));
        let inner = global.child();
        assert_eq!(inner.get("x").unwrap().borrow().clone(), Value::Number(1.0));
    }

    #[test]
    fn shadowing_does_not_clobber_parent() {
        let global = Scope::global();
        global.define("x", val(1.0));
        let inner = global.child();
        inner.define("x", val(2.0));
        assert_eq!(inner.get("x").unwrap().borrow().clone(), Value::Number(2.0));
        assert_eq!(global.get("x").unwrap().borrow().clone(), Value::Number(1.0));
    }

    #[test]
    fn assign_rebinds_in_the_defining_frame() {
        let global = Scope::global();
        global.define("x", val(1.0));
        let inner = global.child();
        assert!(inner.assign("x", val(9.0)));
        assert_eq!(global.get("x").unwrap().borrow().clone(), Value::Number(9.0));
    }

    #[test]
    fn assign_to_unbound_name_fails() {
        let global = Scope::global();
        assert!(!global.assign("nope", val(1.0)));
    }

    #[test]
    fn function_invocation_parents_on_captured_scope_not_caller() {
        let defining = Scope::global();
        defining.define("captured", val(42.0));

        let caller = Scope::global();
        caller.define("captured", val(0.0));

        let call_frame = defining.child();
        assert_eq!(call_frame.get("captured").unwrap().borrow().clone(), Value::Number(42.0));
    }
}
