//! The tree-walking evaluator: the third pipeline phase, consuming an `AST`
//! directly against a `Scope` chain with no bytecode step in between. One
//! `eval` match arm per `AST` variant; everything that isn't a pure
//! expression (return/throw/try-catch) rides out through `Signal` instead of
//! a Rust `Result`, since a thrown value is ordinary program data, not a
//! host-level fault.

use std::rc::Rc;

use crate::{
    common::{
        closure::Closure,
        source::Source,
        span::Spanned,
        value::{ClassDef, Instance, Value, ValueRef},
    },
    compiler::{
        ast::{BinOp, ConnectiveKind, Param, QuantifierKind, Relation, UnOp, AST},
        lex::Lexer,
        parse::Parser,
    },
    construct::scope::Scope,
    eval::{builtins, fileref},
    operators,
};

/// What an evaluation step produced, and whether it's an ordinary value or a
/// control-flow jump that needs to keep propagating outward. `Break` has no
/// producing syntax (there's no `break` statement in this language) but is
/// kept here to match a control-flow signal shape general enough for it --
/// nothing ever constructs one.
pub enum Signal {
    Normal(ValueRef),
    Return(ValueRef),
    Break(ValueRef),
    Throw(ValueRef),
}

/// Unwraps a `Signal` to its value if `Normal`, otherwise returns the
/// non-normal signal straight out of the enclosing function.
macro_rules! propagate {
    ($signal:expr) => {
        match $signal {
            Signal::Normal(value) => value,
            other => return other,
        }
    };
}

/// Like `propagate!`, for helpers (e.g. `eval_list`) that report a
/// non-`Normal` signal as `Err` rather than returning `Signal` directly.
macro_rules! unwrap_list {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(signal) => return signal,
        }
    };
}

pub struct Evaluator {}

impl Evaluator {
    pub fn new() -> Evaluator {
        Evaluator {}
    }

    pub fn eval(&mut self, ast: &Spanned<AST>, scope: &Scope) -> Signal {
        match &ast.item {
            AST::Number(n) => Signal::Normal(Value::new_number(*n)),
            AST::Boolean(b) => Signal::Normal(Value::new_boolean(*b)),
            AST::String(s) => Signal::Normal(Value::new_string(s.clone())),
            AST::Null => Signal::Normal(Value::new_null()),
            AST::Undecidable => Signal::Normal(Value::new_null()),

            AST::Variable(name) => match scope.get(name) {
                Some(value) => Signal::Normal(value),
                None => Signal::Normal(name_error(name)),
            },

            AST::VariableDefinition { name, value } => {
                let value = propagate!(self.eval(value, scope));
                scope.define(name, value);
                Signal::Normal(Value::new_null())
            }

            AST::Assignment { lvalue, rvalue } => {
                let value = propagate!(self.eval(rvalue, scope));
                self.assign(lvalue, value, scope)
            }

            AST::BinaryOp { op, left, right } => self.binary_op(*op, left, right, scope),

            AST::UnaryOp { op, operand } => {
                let value = propagate!(self.eval(operand, scope));
                if let Value::Error(_) = &*value.borrow() {
                    return Signal::Normal(value);
                }
                Signal::Normal(match op {
                    UnOp::Neg => match operators::coerce_number(&value.borrow()) {
                        Some(n) => Value::new_number(-n),
                        None => type_error("unary -", &value),
                    },
                    UnOp::Not => Value::new_boolean(!value.borrow().truthy()),
                })
            }

            AST::FunctionDefinition { name, params, body } => {
                let closure = Closure::new(name.clone(), params.clone(), (**body).clone(), scope.clone());
                let value = Value::new_function(closure);
                if let Some(name) = name {
                    scope.define(name, Rc::clone(&value));
                }
                Signal::Normal(value)
            }

            AST::Lambda { params, body } => {
                let closure = Closure::new(None, params.clone(), (**body).clone(), scope.clone());
                Signal::Normal(Value::new_function(closure))
            }

            AST::Spread(_) => Signal::Normal(type_error_msg("spread is only valid inside an array literal or call arguments")),

            AST::Array(items) => {
                let values = unwrap_list!(self.eval_list(items, scope));
                Signal::Normal(Value::new_array(values))
            }

            AST::Object(entries) => {
                let mut map = crate::common::ordered_map::OrderedMap::new();
                for (key, value) in entries {
                    let value = propagate!(self.eval(value, scope));
                    map.set(key, value);
                }
                Signal::Normal(Value::new_object(map))
            }

            AST::PropertyAccess { object, property } => {
                let target = propagate!(self.eval(object, scope));
                Signal::Normal(self.property_access(&target, property))
            }

            AST::If { condition, then_branch, else_branch } => {
                let cond = propagate!(self.eval(condition, scope));
                if let Value::Error(_) = &*cond.borrow() {
                    return Signal::Normal(cond);
                }
                if cond.borrow().truthy() {
                    self.eval(then_branch, &scope.child())
                } else if let Some(else_branch) = else_branch {
                    self.eval(else_branch, &scope.child())
                } else {
                    Signal::Normal(Value::new_null())
                }
            }

            AST::While { condition, body } => {
                loop {
                    let cond = propagate!(self.eval(condition, scope));
                    if let Value::Error(_) = &*cond.borrow() {
                        return Signal::Normal(cond);
                    }
                    if !cond.borrow().truthy() {
                        break;
                    }
                    propagate!(self.eval(body, &scope.child()));
                }
                Signal::Normal(Value::new_null())
            }

            AST::For { variable, iterable, body } => {
                let iterable = propagate!(self.eval(iterable, scope));
                let items = match &*iterable.borrow() {
                    Value::Array(items) => items.borrow().clone(),
                    _ => return Signal::Normal(type_error_msg("for..in requires an array")),
                };
                for item in items {
                    let iteration_scope = scope.child();
                    iteration_scope.define(variable, item);
                    propagate!(self.eval(body, &iteration_scope));
                }
                Signal::Normal(Value::new_null())
            }

            AST::Return(value) => {
                let value = match value {
                    Some(value) => propagate!(self.eval(value, scope)),
                    None => Value::new_null(),
                };
                Signal::Return(value)
            }

            AST::Throw(value) => {
                let value = propagate!(self.eval(value, scope));
                Signal::Throw(value)
            }

            AST::TryCatch { try_body, exception_var, catch_body } => match self.eval(try_body, &scope.child()) {
                Signal::Throw(value) => {
                    let catch_scope = scope.child();
                    catch_scope.define(exception_var, value);
                    self.eval(catch_body, &catch_scope)
                }
                other => other,
            },

            AST::ClassDefinition { name, parent, methods } => {
                let parent_value = match parent {
                    Some(parent_name) => match scope.get(parent_name) {
                        Some(value) => Some(value),
                        None => return Signal::Normal(name_error(parent_name)),
                    },
                    None => None,
                };

                let mut method_map = crate::common::ordered_map::OrderedMap::new();
                for method in methods {
                    let AST::FunctionDefinition { name: Some(method_name), params, body } = &method.item else {
                        return Signal::Normal(type_error_msg("class methods must be named function definitions"));
                    };
                    let closure = Closure::new(Some(method_name.clone()), params.clone(), (**body).clone(), scope.clone());
                    let value = Value::new_function(closure);
                    method_map.set(method_name, value);
                }

                let class = Value::new_class(ClassDef {
                    name: name.clone(),
                    parent: parent_value,
                    methods: method_map,
                });
                scope.define(name, Rc::clone(&class));
                Signal::Normal(class)
            }

            AST::New { class_name, args } => {
                let Some(class) = scope.get(class_name) else {
                    return Signal::Normal(name_error(class_name));
                };
                if !matches!(&*class.borrow(), Value::Class(_)) {
                    return Signal::Normal(type_error_msg(&format!("'{}' is not a class", class_name)));
                }
                let args = unwrap_list!(self.eval_list(args, scope));

                let instance = Value::new_instance(Instance { class: Rc::clone(&class), properties: crate::common::ordered_map::OrderedMap::new() });

                // `lookup_method` walks the parent chain, so a subclass
                // without its own `init` inherits its parent's constructor.
                if let Some(constructor) = self.lookup_method(&class, "init") {
                    propagate!(self.invoke(&constructor, args, Some(Rc::clone(&instance))));
                }
                Signal::Normal(instance)
            }

            AST::Import { path, bindings } => self.import(path, bindings, scope),

            AST::Export { name } => {
                if scope.is_defined(name) {
                    Signal::Normal(Value::new_null())
                } else {
                    Signal::Normal(name_error(name))
                }
            }

            AST::Compound(statements) => {
                let mut last = Value::new_null();
                for statement in statements {
                    last = propagate!(self.eval(statement, scope));
                }
                Signal::Normal(last)
            }

            AST::LogicalQuantifier { kind, variable, domain, body } => self.quantifier(*kind, variable, domain.as_deref(), body, scope),

            AST::LogicalPredicate { name, args } => {
                let Some(callee) = scope.get(name) else {
                    return Signal::Normal(name_error(name));
                };
                let args = unwrap_list!(self.eval_list(args, scope));
                self.invoke(&callee, args, None)
            }

            AST::LogicalConnective { kind, operands } => self.connective(*kind, operands, scope),

            AST::MathEquation { relation, left, right } => {
                let left = propagate!(self.eval(left, scope));
                let right = propagate!(self.eval(right, scope));
                if let Some(err) = propagate_error(&[&left, &right]) {
                    return Signal::Normal(err);
                }
                Signal::Normal(match relation {
                    Relation::Eq => operators::equality(false, &left, &right),
                    Relation::NotEq => operators::equality(true, &left, &right),
                    Relation::Lt => operators::ordering("<", &left, &right),
                    Relation::Gt => operators::ordering(">", &left, &right),
                    Relation::LtEq => operators::ordering("<=", &left, &right),
                    Relation::GtEq => operators::ordering(">=", &left, &right),
                })
            }

            AST::FileReference { path, property_path } => Signal::Normal(fileref::get(path, property_path)),

            AST::FileGet { path, property_path } => {
                let path_value = propagate!(self.eval(path, scope));
                let path = path_value.borrow().to_string();
                Signal::Normal(fileref::get(&path, property_path))
            }

            AST::FilePut { path, property_path, value } => {
                let path_value = propagate!(self.eval(path, scope));
                let path = path_value.borrow().to_string();
                let value = propagate!(self.eval(value, scope));
                Signal::Normal(fileref::put(&path, property_path, value))
            }

            AST::FunctionCall { callee, args } => self.call(callee, args, scope),
        }
    }

    fn assign(&mut self, lvalue: &Spanned<AST>, value: ValueRef, scope: &Scope) -> Signal {
        match &lvalue.item {
            AST::Variable(name) => {
                if scope.assign(name, Rc::clone(&value)) {
                    Signal::Normal(value)
                } else {
                    Signal::Normal(name_error(name))
                }
            }
            AST::PropertyAccess { object, property } => {
                let target = propagate!(self.eval(object, scope));
                let set = match &*target.borrow() {
                    Value::Object(_) => target.borrow().object_set(property, Rc::clone(&value)),
                    Value::Instance(inst) => {
                        inst.borrow_mut().properties.set(property, Rc::clone(&value));
                        true
                    }
                    _ => false,
                };
                if set {
                    Signal::Normal(value)
                } else {
                    Signal::Normal(type_error_msg("assignment target is not an object or instance"))
                }
            }
            _ => Signal::Normal(type_error_msg("invalid assignment target")),
        }
    }

    /// Evaluates a statement/argument list, splicing in `Spread` elements'
    /// array contents. Shared by `Array` literals and call/constructor
    /// argument lists -- the one place spread-expansion logic lives. A
    /// non-`Normal` signal from any element short-circuits the whole list.
    fn eval_list(&mut self, items: &[Spanned<AST>], scope: &Scope) -> Result<Vec<ValueRef>, Signal> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if let AST::Spread(inner) = &item.item {
                let spread = match self.eval(inner, scope) {
                    Signal::Normal(value) => value,
                    other => return Err(other),
                };
                let elements = match &*spread.borrow() {
                    Value::Array(elements) => elements.borrow().clone(),
                    _ => return Err(Signal::Normal(type_error_msg("spread target must be an array"))),
                };
                out.extend(elements);
            } else {
                match self.eval(item, scope) {
                    Signal::Normal(value) => out.push(value),
                    other => return Err(other),
                }
            }
        }
        Ok(out)
    }

    fn property_access(&self, target: &ValueRef, property: &str) -> ValueRef {
        match &*target.borrow() {
            Value::Object(_) => target.borrow().object_get(property).unwrap_or_else(Value::new_null),
            Value::Array(_) => match property {
                "length" => Value::new_number(target.borrow().array_len().unwrap_or(0) as f64),
                _ => Value::new_null(),
            },
            Value::String(s) => match property {
                "length" => Value::new_number(s.len() as f64),
                _ => Value::new_null(),
            },
            Value::Instance(inst) => {
                let inst = inst.borrow();
                if let Some(value) = inst.properties.get(property) {
                    return Rc::clone(value);
                }
                self.lookup_method(&inst.class, property).unwrap_or_else(Value::new_null)
            }
            Value::Class(def) => def.borrow().methods.get(property).cloned().unwrap_or_else(Value::new_null),
            Value::Error(e) => match property {
                "message" => Value::new_string(e.message.clone()),
                "code" => e.code.map(|c| Value::new_number(c as f64)).unwrap_or_else(Value::new_null),
                _ => Value::new_null(),
            },
            _ => type_error_msg(&format!("cannot access property '{}' on a {}", property, target.borrow().type_name())),
        }
    }

    /// Walks `class`'s parent chain looking for a method, satisfying
    /// single inheritance for `PropertyAccess` on an `Instance`.
    fn lookup_method(&self, class: &ValueRef, name: &str) -> Option<ValueRef> {
        let Value::Class(def) = &*class.borrow() else { return None };
        let def = def.borrow();
        if let Some(method) = def.methods.get(name) {
            return Some(Rc::clone(method));
        }
        def.parent.as_ref().and_then(|parent| self.lookup_method(parent, name))
    }

    fn call(&mut self, callee: &Spanned<AST>, args: &[Spanned<AST>], scope: &Scope) -> Signal {
        // `print(...)` and the other natively-dispatched names shadow
        // user-defined bindings of the same name, per the builtins table.
        if let AST::Variable(name) = &callee.item {
            if builtins::is_builtin(name) {
                let args = unwrap_list!(self.eval_list(args, scope));
                return Signal::Normal(builtins::call(name, args));
            }
        }

        if let AST::PropertyAccess { object, property } = &callee.item {
            let target = propagate!(self.eval(object, scope));
            let method = self.property_access(&target, property);
            if let Value::Error(_) = &*method.borrow() {
                return Signal::Normal(method);
            }
            let args = unwrap_list!(self.eval_list(args, scope));
            return self.invoke(&method, args, Some(target));
        }

        let func = propagate!(self.eval(callee, scope));
        if let Value::Error(_) = &*func.borrow() {
            return Signal::Normal(func);
        }
        let args = unwrap_list!(self.eval_list(args, scope));
        self.invoke(&func, args, None)
    }

    /// Calls a `Function` value, optionally binding `this` in the pushed
    /// frame first (used by method calls and constructors; an ordinary
    /// function call passes `None`).
    fn invoke(&mut self, func: &ValueRef, args: Vec<ValueRef>, this: Option<ValueRef>) -> Signal {
        let closure = match &*func.borrow() {
            Value::Function(closure) => Rc::clone(closure),
            _ => return Signal::Normal(type_error_msg(&format!("'{}' is not callable", func.borrow().type_name()))),
        };

        let call_scope = closure.captured.child();
        if let Some(this) = this {
            call_scope.define("this", this);
        }
        self.bind_params(&closure.params, args, &call_scope);

        match self.eval(&closure.body, &call_scope) {
            Signal::Return(value) => Signal::Normal(value),
            Signal::Normal(_) => Signal::Normal(Value::new_null()),
            other => other,
        }
    }

    /// Binds `args` against `params` left to right. A trailing `Spread`
    /// param (guaranteed last by the parser) collects whatever remains;
    /// missing named params bind to `null`, extra arguments beyond a
    /// non-spread parameter list are discarded.
    fn bind_params(&self, params: &[Param], args: Vec<ValueRef>, scope: &Scope) {
        let mut args = args.into_iter();
        for param in params {
            match param {
                Param::Named(name) => {
                    scope.define(name, args.next().unwrap_or_else(Value::new_null));
                }
                Param::Spread(name) => {
                    scope.define(name, Value::new_array(args.by_ref().collect()));
                }
            }
        }
    }

    fn binary_op(&mut self, op: BinOp, left: &Spanned<AST>, right: &Spanned<AST>, scope: &Scope) -> Signal {
        // `and`/`or` short-circuit and must stay lazy on the right operand,
        // so they're handled inline rather than through `operators::boolean_*`
        // (threading a `Signal` back out through that function's `FnOnce`
        // thunk would need a side channel; duplicating its rules here keeps
        // control flow, and Signal propagation through a lazy RHS, simple).
        if matches!(op, BinOp::And | BinOp::Or) {
            let left_value = propagate!(self.eval(left, scope));
            if let Value::Error(_) = &*left_value.borrow() {
                return Signal::Normal(left_value);
            }
            return match op {
                BinOp::And => {
                    if matches!(&*left_value.borrow(), Value::Null) {
                        return Signal::Normal(Value::new_null());
                    }
                    if !left_value.borrow().truthy() {
                        return Signal::Normal(left_value);
                    }
                    let right_value = propagate!(self.eval(right, scope));
                    Signal::Normal(if matches!(&*right_value.borrow(), Value::Null) {
                        Value::new_null()
                    } else {
                        right_value
                    })
                }
                BinOp::Or => {
                    if left_value.borrow().truthy() {
                        return Signal::Normal(left_value);
                    }
                    if matches!(&*left_value.borrow(), Value::Null) {
                        return Signal::Normal(Value::new_null());
                    }
                    let right_value = propagate!(self.eval(right, scope));
                    Signal::Normal(if matches!(&*right_value.borrow(), Value::Null) {
                        Value::new_null()
                    } else {
                        right_value
                    })
                }
                _ => unreachable!(),
            };
        }

        let left = propagate!(self.eval(left, scope));
        let right = propagate!(self.eval(right, scope));
        if let Some(err) = propagate_error(&[&left, &right]) {
            return Signal::Normal(err);
        }

        Signal::Normal(match op {
            BinOp::Add => operators::arithmetic('+', &left, &right),
            BinOp::Sub => operators::arithmetic('-', &left, &right),
            BinOp::Mul => operators::arithmetic('*', &left, &right),
            BinOp::Div => operators::arithmetic('/', &left, &right),
            BinOp::Mod => operators::arithmetic('%', &left, &right),
            BinOp::Eq => operators::equality(false, &left, &right),
            BinOp::NotEq => operators::equality(true, &left, &right),
            BinOp::Lt => operators::ordering("<", &left, &right),
            BinOp::Gt => operators::ordering(">", &left, &right),
            BinOp::LtEq => operators::ordering("<=", &left, &right),
            BinOp::GtEq => operators::ordering(">=", &left, &right),
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        })
    }

    fn connective(&mut self, kind: ConnectiveKind, operands: &[Spanned<AST>], scope: &Scope) -> Signal {
        if let ConnectiveKind::Not = kind {
            let value = propagate!(self.eval(&operands[0], scope));
            if let Value::Error(_) = &*value.borrow() {
                return Signal::Normal(value);
            }
            return Signal::Normal(operators::three_valued_not(&value));
        }

        let left = propagate!(self.eval(&operands[0], scope));
        let right = propagate!(self.eval(&operands[1], scope));
        if let Some(err) = propagate_error(&[&left, &right]) {
            return Signal::Normal(err);
        }
        Signal::Normal(match kind {
            ConnectiveKind::And => operators::lukasiewicz_and(&left, &right),
            ConnectiveKind::Or => operators::lukasiewicz_or(&left, &right),
            ConnectiveKind::Implies => operators::implication(&left, &right),
            // No formula is given for the biconditional directly; built as
            // the conjunction of both implications, which collapses to the
            // expected truth table in the two-valued case.
            ConnectiveKind::Iff => {
                let forward = operators::implication(&left, &right);
                let backward = operators::implication(&right, &left);
                operators::lukasiewicz_and(&forward, &backward)
            }
            ConnectiveKind::Not => unreachable!("handled above"),
        })
    }

    /// Folds the quantified variable over `domain`'s elements (or, if there
    /// is no explicit domain, a single iteration binding it to `null`),
    /// combining with `kleene_and`/`kleene_or` starting from the identity
    /// element -- this gives vacuous truth (`forall` over `[]` is `true`,
    /// `exists` over `[]` is `false`) without special-casing the empty case.
    fn quantifier(
        &mut self,
        kind: QuantifierKind,
        variable: &str,
        domain: Option<&Spanned<AST>>,
        body: &Spanned<AST>,
        scope: &Scope,
    ) -> Signal {
        let elements = match domain {
            Some(domain) => {
                let domain_value = propagate!(self.eval(domain, scope));
                match &*domain_value.borrow() {
                    Value::Array(items) => items.borrow().clone(),
                    _ => return Signal::Normal(type_error_msg("quantifier domain must be an array")),
                }
            }
            None => vec![Value::new_null()],
        };

        let mut acc = match kind {
            QuantifierKind::Universal => Value::new_boolean(true),
            QuantifierKind::Existential => Value::new_boolean(false),
        };

        for element in elements {
            let iteration_scope = scope.child();
            iteration_scope.define(variable, element);
            let body_value = propagate!(self.eval(body, &iteration_scope));
            if let Value::Error(_) = &*body_value.borrow() {
                return Signal::Normal(body_value);
            }
            acc = match kind {
                QuantifierKind::Universal => operators::kleene_and(&acc, &body_value),
                QuantifierKind::Existential => operators::kleene_or(&acc, &body_value),
            };
        }

        Signal::Normal(acc)
    }

    /// Reads, lexes, parses, and evaluates `path` into a fresh module scope
    /// (deliberately *not* nested under the importing scope, so a module's
    /// own top-level bindings can't leak beyond what's explicitly imported),
    /// then copies the requested `bindings` into `scope`. An empty bindings
    /// list runs the module purely for its side effects.
    fn import(&mut self, path: &str, bindings: &[String], scope: &Scope) -> Signal {
        let source = match Source::path(std::path::Path::new(path)) {
            Ok(source) => source,
            Err(e) => return Signal::Normal(Value::new_error(format!("could not import '{}': {}", path, e), Some(operators::error_code::IO_ERROR))),
        };
        let tokens = match Lexer::lex(Rc::clone(&source)) {
            Ok(tokens) => tokens,
            Err(e) => return Signal::Normal(Value::new_error(format!("syntax error in '{}': {}", path, e.reason), Some(operators::error_code::IO_ERROR))),
        };
        let ast = match Parser::parse(tokens, Rc::clone(&source)) {
            Ok(ast) => ast,
            Err(e) => return Signal::Normal(Value::new_error(format!("syntax error in '{}': {}", path, e.reason), Some(operators::error_code::IO_ERROR))),
        };

        let module_scope = Scope::global();
        propagate!(self.eval(&ast, &module_scope));

        for name in bindings {
            match module_scope.get(name) {
                Some(value) => scope.define(name, value),
                None => return Signal::Normal(name_error(name)),
            }
        }
        Signal::Normal(Value::new_null())
    }
}

impl Default for Evaluator {
    fn default() -> Evaluator {
        Evaluator::new()
    }
}

fn name_error(name: &str) -> ValueRef {
    Value::new_error(format!("undefined name '{}'", name), Some(operators::error_code::NAME_ERROR))
}

fn type_error(op: &str, value: &ValueRef) -> ValueRef {
    Value::new_error(format!("invalid operand for {}: {}", op, value.borrow().type_name()), Some(operators::error_code::TYPE_ERROR))
}

fn type_error_msg(message: &str) -> ValueRef {
    Value::new_error(message.to_string(), Some(operators::error_code::TYPE_ERROR))
}

/// Any operator with an `Error` operand returns that `Error` untouched,
/// rather than compounding it into a new message (§7).
fn propagate_error(values: &[&ValueRef]) -> Option<ValueRef> {
    values.iter().find(|v| matches!(&*v.borrow(), Value::Error(_))).map(|v| Rc::clone(v))
}
