//! The runtime `Value` type: a tagged union over every kind of data a Zen
//! program can produce, plus the operations the rest of the interpreter
//! builds on (`§4.1`). Reference counting is realized directly with `Rc`
//! rather than a hand-rolled allocator: there is no explicit `ref`/`unref`
//! pair here, since `Rc::clone`/drop already are that contract, and no
//! `new_<kind>` ever fails -- a `Value`-constructing *operation* that can
//! fail for a program-level reason (a file too large to read, say) returns
//! a Zen `Error` value instead, never a Rust `None`.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::common::{closure::Closure, ordered_map::OrderedMap};

pub type ValueRef = Rc<RefCell<Value>>;
pub type Array = Rc<RefCell<Vec<ValueRef>>>;
pub type Object = Rc<RefCell<OrderedMap<ValueRef>>>;

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub parent: Option<ValueRef>,
    pub methods: OrderedMap<ValueRef>,
}

#[derive(Debug, Clone)]
pub struct Instance {
    pub class: ValueRef,
    pub properties: OrderedMap<ValueRef>,
}

#[derive(Debug, Clone)]
pub struct ErrorValue {
    pub message: String,
    pub code: Option<i64>,
}

#[derive(Debug, Clone)]
pub enum Value {
    /// Also stands in for `undecidable` -- the distilled value model has no
    /// separate undecidable kind, so the `undecidable` literal evaluates to
    /// this, and three-valued logic treats `Null` as the third truth value.
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
    Function(Rc<Closure>),
    Error(Rc<ErrorValue>),
    Class(Rc<RefCell<ClassDef>>),
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    pub fn new_null() -> ValueRef {
        Rc::new(RefCell::new(Value::Null))
    }

    pub fn new_boolean(b: bool) -> ValueRef {
        Rc::new(RefCell::new(Value::Boolean(b)))
    }

    pub fn new_number(n: f64) -> ValueRef {
        Rc::new(RefCell::new(Value::Number(n)))
    }

    pub fn new_string(s: impl Into<String>) -> ValueRef {
        Rc::new(RefCell::new(Value::String(s.into())))
    }

    pub fn new_array(items: Vec<ValueRef>) -> ValueRef {
        Rc::new(RefCell::new(Value::Array(Rc::new(RefCell::new(items)))))
    }

    pub fn new_object(entries: OrderedMap<ValueRef>) -> ValueRef {
        Rc::new(RefCell::new(Value::Object(Rc::new(RefCell::new(entries)))))
    }

    pub fn new_function(closure: Closure) -> ValueRef {
        Rc::new(RefCell::new(Value::Function(Rc::new(closure))))
    }

    pub fn new_error(message: impl Into<String>, code: Option<i64>) -> ValueRef {
        Rc::new(RefCell::new(Value::Error(Rc::new(ErrorValue { message: message.into(), code }))))
    }

    pub fn new_class(def: ClassDef) -> ValueRef {
        Rc::new(RefCell::new(Value::Class(Rc::new(RefCell::new(def)))))
    }

    pub fn new_instance(instance: Instance) -> ValueRef {
        Rc::new(RefCell::new(Value::Instance(Rc::new(RefCell::new(instance)))))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Error(_) => "error",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Null | Value::Error(_) => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.borrow().is_empty(),
            Value::Object(map) => !map.borrow().is_empty(),
            Value::Function(_) | Value::Class(_) | Value::Instance(_) => true,
        }
    }

    /// Structural equality for scalars, reference equality for containers.
    /// Number follows plain IEEE `==`, so `NaN` never equals itself.
    pub fn equals(a: &ValueRef, b: &ValueRef) -> bool {
        use Value::*;
        match (&*a.borrow(), &*b.borrow()) {
            (Null, Null) => true,
            (Boolean(x), Boolean(y)) => x == y,
            (Number(x), Number(y)) => x == y,
            (String(x), String(y)) => x == y,
            (Array(x), Array(y)) => Rc::ptr_eq(x, y),
            (Object(x), Object(y)) => Rc::ptr_eq(x, y),
            (Function(x), Function(y)) => Rc::ptr_eq(x, y),
            (Error(x), Error(y)) => Rc::ptr_eq(x, y),
            (Class(x), Class(y)) => Rc::ptr_eq(x, y),
            (Instance(x), Instance(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }

    /// Deep copy for Array/Object/Instance; Function/Class hand back a new
    /// handle sharing the same underlying closure/class; scalars copy their
    /// payload.
    pub fn copy(v: &ValueRef) -> ValueRef {
        let copied = match &*v.borrow() {
            Value::Null => Value::Null,
            Value::Boolean(b) => Value::Boolean(*b),
            Value::Number(n) => Value::Number(*n),
            Value::String(s) => Value::String(s.clone()),
            Value::Array(items) => {
                let copied: Vec<ValueRef> = items.borrow().iter().map(Value::copy).collect();
                Value::Array(Rc::new(RefCell::new(copied)))
            }
            Value::Object(map) => {
                let copied: OrderedMap<ValueRef> =
                    map.borrow().iter().map(|(k, v)| (k.clone(), Value::copy(v))).collect();
                Value::Object(Rc::new(RefCell::new(copied)))
            }
            Value::Function(closure) => Value::Function(Rc::clone(closure)),
            Value::Error(e) => Value::Error(Rc::new((**e).clone())),
            Value::Class(c) => Value::Class(Rc::clone(c)),
            Value::Instance(inst) => {
                let inst = inst.borrow();
                let copied_props: OrderedMap<ValueRef> =
                    inst.properties.iter().map(|(k, v)| (k.clone(), Value::copy(v))).collect();
                Value::Instance(Rc::new(RefCell::new(Instance {
                    class: Rc::clone(&inst.class),
                    properties: copied_props,
                })))
            }
        };
        Rc::new(RefCell::new(copied))
    }

    // -- Array operations -------------------------------------------------

    pub fn array_push(&self, item: ValueRef) -> bool {
        match self {
            Value::Array(items) => {
                items.borrow_mut().push(item);
                true
            }
            _ => false,
        }
    }

    pub fn array_get(&self, index: usize) -> Option<ValueRef> {
        match self {
            Value::Array(items) => items.borrow().get(index).cloned(),
            _ => None,
        }
    }

    pub fn array_set(&self, index: usize, item: ValueRef) -> bool {
        match self {
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                if index < items.len() {
                    items[index] = item;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    pub fn array_len(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(items.borrow().len()),
            _ => None,
        }
    }

    // -- Object operations -------------------------------------------------

    pub fn object_set(&self, key: &str, value: ValueRef) -> bool {
        match self {
            Value::Object(map) => {
                map.borrow_mut().set(key, value);
                true
            }
            _ => false,
        }
    }

    pub fn object_get(&self, key: &str) -> Option<ValueRef> {
        match self {
            Value::Object(map) => map.borrow().get(key).cloned(),
            _ => None,
        }
    }

    pub fn object_has(&self, key: &str) -> bool {
        match self {
            Value::Object(map) => map.borrow().has(key),
            _ => false,
        }
    }

    pub fn object_delete(&self, key: &str) -> Option<ValueRef> {
        match self {
            Value::Object(map) => map.borrow_mut().delete(key),
            _ => None,
        }
    }

    pub fn object_keys(&self) -> Option<ValueRef> {
        match self {
            Value::Object(map) => {
                let keys = map.borrow().keys().map(Value::new_string).collect();
                Some(Value::new_array(keys))
            }
            _ => None,
        }
    }

    pub fn object_values(&self) -> Option<ValueRef> {
        match self {
            Value::Object(map) => {
                let values = map.borrow().values().cloned().collect();
                Some(Value::new_array(values))
            }
            _ => None,
        }
    }

    pub fn object_entries(&self) -> Option<ValueRef> {
        match self {
            Value::Object(map) => {
                let entries = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| Value::new_array(vec![Value::new_string(k.clone()), Rc::clone(v)]))
                    .collect();
                Some(Value::new_array(entries))
            }
            _ => None,
        }
    }

    /// Dot-path lookup against nested objects, e.g. `get_path(["a", "b"])`
    /// for `a.b`. Fails (returns `None`) on a missing key or a non-object
    /// intermediate.
    pub fn object_get_path(&self, path: &[&str]) -> Option<ValueRef> {
        let Value::Object(map) = self else { return None };
        if path.is_empty() {
            return None;
        }
        let mut current = Rc::clone(map);
        for (i, segment) in path.iter().enumerate() {
            let next = current.borrow().get(segment).cloned()?;
            if i == path.len() - 1 {
                return Some(next);
            }
            let borrowed = next.borrow();
            match &*borrowed {
                Value::Object(inner) => {
                    let inner = Rc::clone(inner);
                    drop(borrowed);
                    current = inner;
                }
                _ => return None,
            }
        }
        None
    }

    /// Dot-path assignment, creating intermediate objects as needed. Fails
    /// if an intermediate segment already exists and is not an object.
    pub fn object_set_path(&self, path: &[&str], value: ValueRef) -> Result<(), ()> {
        let Value::Object(map) = self else { return Err(()) };
        if path.is_empty() {
            return Err(());
        }
        if path.len() == 1 {
            map.borrow_mut().set(path[0], value);
            return Ok(());
        }

        let next = {
            let mut map = map.borrow_mut();
            match map.get(path[0]) {
                Some(existing) => {
                    if !matches!(&*existing.borrow(), Value::Object(_)) {
                        return Err(());
                    }
                    Rc::clone(existing)
                }
                None => {
                    let fresh = Value::new_object(OrderedMap::new());
                    map.set(path[0], Rc::clone(&fresh));
                    fresh
                }
            }
        };
        next.borrow().object_set_path(&path[1..], value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item.borrow())?;
                }
                write!(f, "]")
            }
            Value::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v.borrow())?;
                }
                write!(f, "}}")
            }
            Value::Function(_) => write!(f, "[function]"),
            Value::Error(e) => write!(f, "[error: {}]", e.message),
            Value::Class(c) => write!(f, "[class {}]", c.borrow().name),
            Value::Instance(inst) => {
                let inst = inst.borrow();
                let name = match &*inst.class.borrow() {
                    Value::Class(c) => c.borrow().name.clone(),
                    _ => "?".to_string(),
                };
                write!(f, "[instance of {}]", name)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn to_string_matches_canonical_forms() {
        assert_eq!(Value::new_null().borrow().to_string(), "null");
        assert_eq!(Value::new_boolean(true).borrow().to_string(), "true");
        assert_eq!(Value::new_number(3.0).borrow().to_string(), "3");
        assert_eq!(Value::new_string("hi").borrow().to_string(), "hi");
        let err = Value::new_error("boom", None);
        assert_eq!(err.borrow().to_string(), "[error: boom]");
    }

    #[test]
    fn array_to_string_is_bracketed_and_comma_separated() {
        let arr = Value::new_array(vec![Value::new_number(1.0), Value::new_number(2.0)]);
        assert_eq!(arr.borrow().to_string(), "[1, 2]");
    }

    #[test]
    fn nan_does_not_equal_itself() {
        let nan = Value::new_number(f64::NAN);
        assert!(!Value::equals(&nan, &nan));
    }

    #[test]
    fn arrays_compare_by_reference_not_structure() {
        let a = Value::new_array(vec![Value::new_number(1.0)]);
        let b = Value::new_array(vec![Value::new_number(1.0)]);
        assert!(!Value::equals(&a, &b));
        assert!(Value::equals(&a, &a));
    }

    #[test]
    fn copy_of_array_is_an_independent_subtree() {
        let original = Value::new_array(vec![Value::new_number(1.0)]);
        let duplicate = Value::copy(&original);
        duplicate.borrow().array_set(0, Value::new_number(99.0));
        assert_eq!(original.borrow().array_get(0).unwrap().borrow().to_string(), "1");
    }

    #[test]
    fn truthiness_rules() {
        assert!(!Value::new_null().borrow().truthy());
        assert!(!Value::new_number(0.0).borrow().truthy());
        assert!(!Value::new_number(f64::NAN).borrow().truthy());
        assert!(Value::new_number(-1.0).borrow().truthy());
        assert!(!Value::new_string("").borrow().truthy());
        assert!(Value::new_string("x").borrow().truthy());
        assert!(!Value::new_array(vec![]).borrow().truthy());
    }

    #[test]
    fn dot_path_creates_intermediate_objects() {
        let root = Value::new_object(OrderedMap::new());
        root.borrow().object_set_path(&["a", "b"], Value::new_number(9.0)).unwrap();
        let got = root.borrow().object_get_path(&["a", "b"]).unwrap();
        assert_eq!(got.borrow().to_string(), "9");
    }

    #[test]
    fn dot_path_set_fails_on_non_object_intermediate() {
        let root = Value::new_object(OrderedMap::new());
        root.borrow().object_set("a", Value::new_number(1.0));
        assert!(root.borrow().object_set_path(&["a", "b"], Value::new_number(2.0)).is_err());
    }
}
