//! The native functions every program gets without an `import`: `print`,
//! type/conversion helpers, the logging quartet, and the JSON/YAML bridge
//! (§6). The evaluator checks `is_builtin` before consulting scope, so a
//! user binding of the same name is shadowed rather than overriding these --
//! matching the dispatch-table note that builtins are resolved natively.

use crate::{
    common::value::{Value, ValueRef},
    eval::{json, logging::LogLevel, logging},
    operators::error_code,
};

const NAMES: &[&str] = &[
    "print", "input", "len", "type", "typeOf", "toString", "toNumber", "toBoolean", "isType",
    "parseInt", "parseFloat",
    "logDebug", "logInfo", "logWarn", "logError", "logSetLevel",
    "jsonParse", "jsonStringify", "jsonPretty", "loadJsonFile", "loadYamlFile",
    "probabilisticAnd", "consensus", "eventually", "fuzzyMembership",
];

pub fn is_builtin(name: &str) -> bool {
    NAMES.contains(&name)
}

pub fn call(name: &str, args: Vec<ValueRef>) -> ValueRef {
    match name {
        "print" => print_builtin(&args),
        "input" => input_builtin(&args),
        "len" => len_builtin(&args),
        "type" | "typeOf" => args.first().map(|v| Value::new_string(v.borrow().type_name())).unwrap_or_else(Value::new_null),
        "toString" => to_string_builtin(&args),
        "toNumber" => to_number_builtin(&args),
        "toBoolean" => Value::new_boolean(args.first().is_some_and(|v| v.borrow().truthy())),
        "isType" => is_type_builtin(&args),
        "parseInt" => parse_int_builtin(&args),
        "parseFloat" => parse_float_builtin(&args),
        "logDebug" => emit_log(LogLevel::Debug, &args),
        "logInfo" => emit_log(LogLevel::Info, &args),
        "logWarn" => emit_log(LogLevel::Warn, &args),
        "logError" => emit_log(LogLevel::Error, &args),
        "logSetLevel" => log_set_level_builtin(&args),
        "jsonParse" => wrap_io(args.first().map(|v| json::parse(&v.borrow().to_string())).unwrap_or_else(|| Ok(Value::new_null()))),
        "jsonStringify" => match args.first() {
            Some(v) => wrap_io(json::stringify(v).map(Value::new_string)),
            None => Value::new_string(""),
        },
        "jsonPretty" => {
            let indent = args.get(1).and_then(|v| crate::operators::coerce_number(&v.borrow())).unwrap_or(2.0) as usize;
            match args.first() {
                Some(v) => wrap_io(json::pretty(v, indent).map(Value::new_string)),
                None => Value::new_string(""),
            }
        }
        "loadJsonFile" => match args.first() {
            Some(v) => wrap_io(json::load_json_file(&v.borrow().to_string())),
            None => arity_error("loadJsonFile", 1, 0),
        },
        "loadYamlFile" => match args.first() {
            Some(v) => wrap_io(json::load_yaml_file(&v.borrow().to_string())),
            None => arity_error("loadYamlFile", 1, 0),
        },
        "probabilisticAnd" => probabilistic_and_builtin(&args),
        "consensus" => consensus_builtin(&args),
        "eventually" => eventually_builtin(&args),
        "fuzzyMembership" => fuzzy_membership_builtin(&args),
        _ => unreachable!("call dispatched for a name not in NAMES"),
    }
}

fn arity_error(name: &str, expected: usize, got: usize) -> ValueRef {
    Value::new_error(format!("{} expects {} argument(s), got {}", name, expected, got), Some(error_code::ARITY_ERROR))
}

fn wrap_io(result: Result<ValueRef, json::IoError>) -> ValueRef {
    match result {
        Ok(value) => value,
        Err(e) => Value::new_error(e.to_string(), Some(error_code::IO_ERROR)),
    }
}

fn print_builtin(args: &[ValueRef]) -> ValueRef {
    let line: Vec<String> = args.iter().map(|v| v.borrow().to_string()).collect();
    println!("{}", line.join(" "));
    Value::new_null()
}

fn input_builtin(args: &[ValueRef]) -> ValueRef {
    use std::io::Write;
    if let Some(prompt) = args.first() {
        print!("{}", prompt.borrow());
        let _ = std::io::stdout().flush();
    }
    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) => Value::new_null(),
        Ok(_) => Value::new_string(line.trim_end_matches(['\n', '\r']).to_string()),
        Err(e) => Value::new_error(format!("input failed: {}", e), Some(error_code::IO_ERROR)),
    }
}

/// Strings measure by byte length (the runtime value model describes a
/// string as a byte sequence); arrays and objects by element/key count.
fn len_builtin(args: &[ValueRef]) -> ValueRef {
    let Some(v) = args.first() else { return arity_error("len", 1, 0) };
    match &*v.borrow() {
        Value::String(s) => Value::new_number(s.len() as f64),
        Value::Array(items) => Value::new_number(items.borrow().len() as f64),
        Value::Object(map) => Value::new_number(map.borrow().len() as f64),
        other => Value::new_error(format!("len is not defined for {}", other.type_name()), Some(error_code::TYPE_ERROR)),
    }
}

fn to_string_builtin(args: &[ValueRef]) -> ValueRef {
    let Some(v) = args.first() else { return Value::new_string("") };
    match &*v.borrow() {
        Value::Error(e) => Value::new_string(format!("Error: {}", e.message)),
        other => Value::new_string(other.to_string()),
    }
}

/// On an `Error`, returns its code (or `-1` when unspecified), per §7's
/// "numeric code queryable via toNumber" rule; otherwise the usual coercion.
fn to_number_builtin(args: &[ValueRef]) -> ValueRef {
    let Some(v) = args.first() else { return Value::new_number(0.0) };
    if let Value::Error(e) = &*v.borrow() {
        return Value::new_number(e.code.unwrap_or(-1) as f64);
    }
    match crate::operators::coerce_number(&v.borrow()) {
        Some(n) => Value::new_number(n),
        None => Value::new_number(f64::NAN),
    }
}

fn is_type_builtin(args: &[ValueRef]) -> ValueRef {
    let (Some(v), Some(name)) = (args.first(), args.get(1)) else {
        return arity_error("isType", 2, args.len());
    };
    Value::new_boolean(v.borrow().type_name() == name.borrow().to_string())
}

/// `parseInt("x")` (and any other unparseable input) yields `0`; an
/// out-of-range base is a `RangeError` rather than a silent clamp (scenario
/// I: `parseInt("1", 1)` -> `Error "base must be between 2 and 36"`).
fn parse_int_builtin(args: &[ValueRef]) -> ValueRef {
    let Some(v) = args.first() else { return arity_error("parseInt", 1, 0) };
    let s = v.borrow().to_string();
    let base = args.get(1).and_then(|v| crate::operators::coerce_number(&v.borrow())).unwrap_or(10.0) as i64;
    if !(2..=36).contains(&base) {
        return Value::new_error("base must be between 2 and 36", Some(error_code::RANGE_ERROR));
    }
    let trimmed = s.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    match i64::from_str_radix(digits, base as u32) {
        Ok(n) => Value::new_number(sign * n as f64),
        Err(_) => Value::new_number(0.0),
    }
}

/// Unlike `parseInt`, the distilled spec doesn't pin down a failure value;
/// `NaN` is chosen to mirror the host language's own float parse failure.
fn parse_float_builtin(args: &[ValueRef]) -> ValueRef {
    let Some(v) = args.first() else { return arity_error("parseFloat", 1, 0) };
    let s = v.borrow().to_string();
    Value::new_number(s.trim().parse::<f64>().unwrap_or(f64::NAN))
}

fn emit_log(level: LogLevel, args: &[ValueRef]) -> ValueRef {
    let message: Vec<String> = args.iter().map(|v| v.borrow().to_string()).collect();
    logging::log(level, &message.join(" "));
    Value::new_null()
}

/// Accepts either a level name (`"debug"`/`"info"`/`"warn"`/`"error"`) or
/// its numeric encoding (`0..3`), matching §4.7's "encoded 0..3" note.
fn log_set_level_builtin(args: &[ValueRef]) -> ValueRef {
    let Some(v) = args.first() else { return arity_error("logSetLevel", 1, 0) };
    let ok = match &*v.borrow() {
        Value::Number(n) => {
            let level = match *n as i64 {
                0 => "debug",
                1 => "info",
                2 => "warn",
                _ => "error",
            };
            logging::set_level(level)
        }
        Value::String(s) => logging::set_level(s),
        _ => false,
    };
    if ok {
        Value::new_null()
    } else {
        Value::new_error("logSetLevel expects a level name or 0..3", Some(error_code::TYPE_ERROR))
    }
}

fn number_arg(args: &[ValueRef], i: usize, default: f64) -> f64 {
    args.get(i).and_then(|v| crate::operators::coerce_number(&v.borrow())).unwrap_or(default)
}

fn probabilistic_and_builtin(args: &[ValueRef]) -> ValueRef {
    let (Some(a), Some(b)) = (args.first(), args.get(1)) else {
        return arity_error("probabilisticAnd", 4, args.len());
    };
    crate::operators::probabilistic_and(a, b, number_arg(args, 2, 0.0), number_arg(args, 3, 0.0))
}

fn consensus_builtin(args: &[ValueRef]) -> ValueRef {
    let Some(votes) = args.first() else { return arity_error("consensus", 2, 0) };
    let Value::Array(items) = &*votes.borrow() else {
        return Value::new_error("consensus expects an array of votes", Some(error_code::TYPE_ERROR));
    };
    let votes = items.borrow().clone();
    crate::operators::consensus(&votes, number_arg(args, 1, 0.5))
}

fn eventually_builtin(args: &[ValueRef]) -> ValueRef {
    let Some(cond) = args.first() else { return arity_error("eventually", 2, 0) };
    crate::operators::eventually(cond, number_arg(args, 1, 0.0))
}

fn fuzzy_membership_builtin(args: &[ValueRef]) -> ValueRef {
    if args.is_empty() {
        return arity_error("fuzzyMembership", 1, 0);
    }
    crate::operators::fuzzy_membership(number_arg(args, args.len() - 1, 0.0))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_int_on_unparseable_input_yields_zero() {
        assert_eq!(parse_int_builtin(&[Value::new_string("x")]).borrow().to_string(), "0");
    }

    #[test]
    fn parse_int_honors_a_base_argument() {
        assert_eq!(parse_int_builtin(&[Value::new_string("ff"), Value::new_number(16.0)]).borrow().to_string(), "255");
    }

    #[test]
    fn parse_int_rejects_an_out_of_range_base() {
        let result = parse_int_builtin(&[Value::new_string("1"), Value::new_number(1.0)]);
        assert_eq!(result.borrow().type_name(), "error");
    }

    #[test]
    fn len_of_string_is_byte_length() {
        assert_eq!(len_builtin(&[Value::new_string("héllo")]).borrow().to_string(), "6");
    }

    #[test]
    fn to_string_of_error_uses_the_error_prefix_form() {
        let err = Value::new_error("boom", Some(2));
        assert_eq!(to_string_builtin(&[err]).borrow().to_string(), "Error: boom");
    }

    #[test]
    fn to_number_of_error_returns_its_code_or_negative_one() {
        assert_eq!(to_number_builtin(&[Value::new_error("boom", Some(5))]).borrow().to_string(), "5");
        assert_eq!(to_number_builtin(&[Value::new_error("boom", None)]).borrow().to_string(), "-1");
    }
}
