//! Arithmetic, comparison, boolean, and logic operators. Every function here
//! is pure: it takes borrowed `Value`s and hands back a fresh `ValueRef`,
//! never mutating an operand. The evaluator is the only caller; keeping the
//! numeric and truthiness rules out of `eval::evaluator` is what lets each
//! operator be exercised directly in tests below without standing up a
//! `Scope` or running the parser.

use crate::common::value::{Value, ValueRef};

/// Error codes assigned to built-in failure kinds (§7's taxonomy). These are
/// this implementation's own numbering -- the distilled spec names the
/// kinds but not their integers -- and are queryable via `toNumber` on the
/// resulting `Error` value.
pub mod error_code {
    pub const NAME_ERROR: i64 = 1;
    pub const TYPE_ERROR: i64 = 2;
    pub const ARITY_ERROR: i64 = 3;
    pub const ARITHMETIC_ERROR: i64 = 4;
    pub const RANGE_ERROR: i64 = 5;
    pub const IO_ERROR: i64 = 6;
    pub const USER_ERROR: i64 = 7;
}

pub(crate) fn coerce_number(v: &Value) -> Option<f64> {
    match v {
        Value::Null => Some(0.0),
        Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => Some(*n),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn type_error(op: &str, a: &Value, b: &Value) -> ValueRef {
    Value::new_error(
        format!("unsupported operand kinds for {}: {} and {}", op, a.type_name(), b.type_name()),
        Some(error_code::TYPE_ERROR),
    )
}

/// `+ - * / %`. `+` concatenates (via `Display`, i.e. `to_string`) when
/// either operand is a `String`; every other combination coerces through
/// `coerce_number`.
pub fn arithmetic(op: char, a: &ValueRef, b: &ValueRef) -> ValueRef {
    let (ab, bb) = (a.borrow(), b.borrow());

    if op == '+' && (matches!(&*ab, Value::String(_)) || matches!(&*bb, Value::String(_))) {
        return Value::new_string(format!("{}{}", *ab, *bb));
    }

    let (Some(x), Some(y)) = (coerce_number(&ab), coerce_number(&bb)) else {
        return type_error("arithmetic", &ab, &bb);
    };

    let result = match op {
        '+' => x + y,
        '-' => x - y,
        '*' => x * y,
        '/' => x / y,
        '%' => {
            if y == 0.0 {
                return Value::new_error("modulo by zero", Some(error_code::ARITHMETIC_ERROR));
            }
            x % y
        }
        _ => unreachable!("arithmetic called with non-arithmetic operator"),
    };

    // Division by zero is ordinary IEEE-754 infinity, not overflow -- only
    // `+ - *` producing an infinite result from finite operands indicates a
    // genuine magnitude overflow.
    if op != '/' && result.is_infinite() && !x.is_infinite() && !y.is_infinite() {
        return Value::new_error("arithmetic overflow", Some(error_code::ARITHMETIC_ERROR));
    }

    Value::new_number(result)
}

/// `== !=`: structural equality per `Value::equals`, with no coercion.
pub fn equality(negate: bool, a: &ValueRef, b: &ValueRef) -> ValueRef {
    let eq = Value::equals(a, b);
    Value::new_boolean(if negate { !eq } else { eq })
}

/// `< > <= >=`. Same-kind `Number`/`String` compare directly; mixed kinds
/// coerce to number if both sides convert, else produce a `TypeError`.
pub fn ordering(op: &str, a: &ValueRef, b: &ValueRef) -> ValueRef {
    let (ab, bb) = (a.borrow(), b.borrow());

    let ordering = match (&*ab, &*bb) {
        (Value::String(x), Value::String(y)) => x.partial_cmp(y),
        _ => match (coerce_number(&ab), coerce_number(&bb)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    };

    let Some(ordering) = ordering else {
        return type_error("comparison", &ab, &bb);
    };

    use std::cmp::Ordering::*;
    let result = match op {
        "<" => ordering == Less,
        ">" => ordering == Greater,
        "<=" => matches!(ordering, Less | Equal),
        ">=" => matches!(ordering, Greater | Equal),
        _ => unreachable!("ordering called with non-ordering operator"),
    };
    Value::new_boolean(result)
}

/// Short-circuit `AND`/`OR`. Preserves whichever operand value decided the
/// result (not coerced to `Boolean`), and propagates `Null` ("undecidable")
/// if either operand is `Null` and the other didn't already short-circuit.
pub fn boolean_and(left: &ValueRef, right: impl FnOnce() -> ValueRef) -> ValueRef {
    if matches!(&*left.borrow(), Value::Null) {
        return Value::new_null();
    }
    if !left.borrow().truthy() {
        return left.clone();
    }
    let r = right();
    if matches!(&*r.borrow(), Value::Null) {
        return Value::new_null();
    }
    r
}

pub fn boolean_or(left: &ValueRef, right: impl FnOnce() -> ValueRef) -> ValueRef {
    if left.borrow().truthy() {
        return left.clone();
    }
    if matches!(&*left.borrow(), Value::Null) {
        return Value::new_null();
    }
    let r = right();
    if matches!(&*r.borrow(), Value::Null) {
        return Value::new_null();
    }
    r
}

// -- Three-valued logic --------------------------------------------------

/// {true -> +1, null -> 0, false -> -1}, as specified for the three-valued
/// operators. Non-Boolean/Null operands are treated as `Null` (undecidable).
fn trit(v: &Value) -> i8 {
    match v {
        Value::Boolean(true) => 1,
        Value::Boolean(false) => -1,
        _ => 0,
    }
}

fn from_trit(t: i8) -> ValueRef {
    match t.signum() {
        1 => Value::new_boolean(true),
        -1 => Value::new_boolean(false),
        _ => Value::new_null(),
    }
}

pub fn three_valued_not(v: &ValueRef) -> ValueRef {
    from_trit(-trit(&v.borrow()))
}

pub fn lukasiewicz_and(a: &ValueRef, b: &ValueRef) -> ValueRef {
    from_trit(trit(&a.borrow()).min(trit(&b.borrow())))
}

pub fn lukasiewicz_or(a: &ValueRef, b: &ValueRef) -> ValueRef {
    from_trit(trit(&a.borrow()).max(trit(&b.borrow())))
}

pub fn kleene_and(a: &ValueRef, b: &ValueRef) -> ValueRef {
    let (x, y) = (trit(&a.borrow()), trit(&b.borrow()));
    if x == -1 || y == -1 {
        Value::new_boolean(false)
    } else if x == 1 && y == 1 {
        Value::new_boolean(true)
    } else {
        Value::new_null()
    }
}

pub fn kleene_or(a: &ValueRef, b: &ValueRef) -> ValueRef {
    let (x, y) = (trit(&a.borrow()), trit(&b.borrow()));
    if x == 1 || y == 1 {
        Value::new_boolean(true)
    } else if x == -1 && y == -1 {
        Value::new_boolean(false)
    } else {
        Value::new_null()
    }
}

/// Łukasiewicz implication `min(1, 1-a+b)`, applied after affine-mapping the
/// `{+1,0,-1}` trit encoding to the `[0,1]` scale the formula is stated over
/// (`{-1,0,1} -> {0,0.5,1}`) and mapping the result back. A direct trit-space
/// `max(1-a, b)` can never produce `false` for a true antecedent, which this
/// avoids.
pub fn implication(a: &ValueRef, b: &ValueRef) -> ValueRef {
    let (pa, pb) = ((trit(&a.borrow()) as f64 + 1.0) / 2.0, (trit(&b.borrow()) as f64 + 1.0) / 2.0);
    let p = (1.0 - pa + pb).clamp(0.0, 1.0);
    from_trit((p * 2.0 - 1.0).round() as i8)
}

// -- Specialized / probabilistic operators -------------------------------

pub fn probabilistic_and(a: &ValueRef, b: &ValueRef, pa: f64, pb: f64) -> ValueRef {
    let (av, bv) = (a.borrow(), b.borrow());
    if matches!(&*av, Value::Null) || matches!(&*bv, Value::Null) {
        let product = pa * pb;
        if product < 0.1 {
            return Value::new_boolean(false);
        }
        if product > 0.9 {
            return Value::new_boolean(true);
        }
        return Value::new_null();
    }
    Value::new_boolean(av.truthy() && bv.truthy())
}

/// `votes` is an array of Boolean/Null values. Returns `Null` if the
/// null-fraction exceeds 0.3; otherwise `true`/`false` once a side reaches
/// `threshold`, else `Null`.
pub fn consensus(votes: &[ValueRef], threshold: f64) -> ValueRef {
    if votes.is_empty() {
        return Value::new_null();
    }
    let total = votes.len() as f64;
    let (mut trues, mut falses, mut nulls) = (0.0, 0.0, 0.0);
    for v in votes {
        match trit(&v.borrow()) {
            1 => trues += 1.0,
            -1 => falses += 1.0,
            _ => nulls += 1.0,
        }
    }
    if nulls / total > 0.3 {
        return Value::new_null();
    }
    if trues / total >= threshold {
        return Value::new_boolean(true);
    }
    if falses / total >= threshold {
        return Value::new_boolean(false);
    }
    Value::new_null()
}

pub fn eventually(cond: &ValueRef, horizon: f64) -> ValueRef {
    let cv = cond.borrow();
    if let Value::Boolean(b) = &*cv {
        return Value::new_boolean(*b);
    }
    if horizon <= 0.0 {
        return Value::new_null();
    }
    if horizon > 100.0 {
        return Value::new_boolean(true);
    }
    Value::new_null()
}

pub fn fuzzy_membership(degree: f64) -> ValueRef {
    if degree >= 0.8 {
        Value::new_boolean(true)
    } else if degree <= 0.2 {
        Value::new_boolean(false)
    } else {
        Value::new_null()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn b(v: bool) -> ValueRef {
        Value::new_boolean(v)
    }
    fn n() -> ValueRef {
        Value::new_null()
    }

    #[test]
    fn plus_concatenates_when_a_string_is_involved() {
        let result = arithmetic('+', &Value::new_string("x = "), &Value::new_number(1.0));
        assert_eq!(result.borrow().to_string(), "x = 1");
    }

    #[test]
    fn division_by_zero_follows_ieee() {
        assert_eq!(arithmetic('/', &Value::new_number(1.0), &Value::new_number(0.0)).borrow().to_string(), "inf");
        assert_eq!(arithmetic('/', &Value::new_number(-1.0), &Value::new_number(0.0)).borrow().to_string(), "-inf");
    }

    #[test]
    fn modulo_by_zero_is_an_error() {
        assert_eq!(arithmetic('%', &Value::new_number(1.0), &Value::new_number(0.0)).borrow().type_name(), "error");
    }

    #[test]
    fn multiplication_overflow_to_infinity_is_an_error_unlike_division_by_zero() {
        let huge = Value::new_number(f64::MAX);
        assert_eq!(arithmetic('*', &huge, &huge).borrow().type_name(), "error");
        assert_eq!(arithmetic('/', &Value::new_number(1.0), &Value::new_number(0.0)).borrow().type_name(), "number");
    }

    #[test]
    fn and_preserves_first_falsy_operand_value() {
        let zero = Value::new_number(0.0);
        let result = boolean_and(&zero, || Value::new_boolean(true));
        assert_eq!(result.borrow().to_string(), "0");
    }

    #[test]
    fn and_with_null_operand_is_undecidable() {
        assert!(matches!(&*boolean_and(&n(), || b(true)).borrow(), Value::Null));
        assert!(matches!(&*boolean_and(&b(true), || n()).borrow(), Value::Null));
    }

    #[test]
    fn lukasiewicz_or_matches_max_encoding_all_nine_cases() {
        let trits = |v: &ValueRef| trit(&v.borrow());
        for a in [b(true), b(false), n()] {
            for c in [b(true), b(false), n()] {
                let expected = trits(&a).max(trits(&c));
                assert_eq!(trit(&lukasiewicz_or(&a, &c).borrow()), expected);
            }
        }
    }

    #[test]
    fn implication_is_false_only_for_a_true_antecedent_and_false_consequent() {
        assert_eq!(implication(&b(true), &b(false)).borrow().to_string(), "false");
        assert_eq!(implication(&b(true), &b(true)).borrow().to_string(), "true");
        assert_eq!(implication(&b(false), &b(false)).borrow().to_string(), "true");
        assert_eq!(implication(&b(false), &b(true)).borrow().to_string(), "true");
    }

    #[test]
    fn kleene_and_any_false_dominates() {
        assert_eq!(kleene_and(&b(false), &n()).borrow().to_string(), "false");
    }

    #[test]
    fn consensus_requires_low_null_fraction() {
        let votes = vec![n(), n(), b(true)];
        assert!(matches!(&*consensus(&votes, 0.5).borrow(), Value::Null));
    }

    #[test]
    fn fuzzy_membership_thresholds() {
        assert_eq!(fuzzy_membership(0.9).borrow().to_string(), "true");
        assert_eq!(fuzzy_membership(0.1).borrow().to_string(), "false");
        assert!(matches!(&*fuzzy_membership(0.5).borrow(), Value::Null));
    }
}
