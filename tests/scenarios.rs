//! End-to-end scenarios run through [`zen::run`] against a single scope, one
//! per test -- mirroring how the CLI and REPL both invoke the pipeline.

use zen::{Scope, Source, Value};

fn run(source: &str) -> String {
    let scope = Scope::global();
    match zen::run(Source::source(source), &scope) {
        Ok(value) => value.borrow().to_string(),
        Err(e) => panic!("unexpected syntax error: {}", e),
    }
}

fn run_in(scope: &Scope, source: &str) -> String {
    match zen::run(Source::source(source), scope) {
        Ok(value) => value.borrow().to_string(),
        Err(e) => panic!("unexpected syntax error: {}", e),
    }
}

#[test]
fn scenario_a_addition_across_statements() {
    assert_eq!(run("set x 10\nset y 20\nx + y"), "30");
}

#[test]
fn scenario_b_array_length() {
    assert_eq!(run("set a [1, 2, 3]\nlen(a)"), "3");
}

#[test]
fn scenario_c_function_definition_and_call() {
    assert_eq!(run("function add(x, y) { return x + y }\nadd(2, 3)"), "5");
}

#[test]
fn scenario_d_and_with_an_undecidable_operand_is_undecidable() {
    assert_eq!(run("set u null\nu and true"), "null");
}

#[test]
fn scenario_f_dotted_property_read_and_write() {
    let scope = Scope::global();
    assert_eq!(run_in(&scope, "set o {\"a\": 1, \"b\": {\"c\": 2}}\no.b.c"), "2");
    assert_eq!(run_in(&scope, "set o.b.c 9\no.b.c"), "9");
}

#[test]
fn scenario_g_try_catch_recovers_a_thrown_value() {
    assert_eq!(run("try { throw \"boom\" } catch (e) { e }"), "boom");
}

#[test]
fn scenario_i_parse_int_exact_behaviors() {
    assert_eq!(run("parseInt(\"ff\", 16)"), "255");
    assert_eq!(run("parseInt(\"10\", 2)"), "2");
    assert_eq!(run("parseInt(\"x\")"), "0");
    let scope = Scope::global();
    let result = match zen::run(Source::source("parseInt(\"1\", 1)"), &scope) {
        Ok(value) => value,
        Err(e) => panic!("unexpected syntax error: {}", e),
    };
    assert!(matches!(&*result.borrow(), Value::Error(_)));
}

#[test]
fn scenario_j_division_and_modulo_edge_cases() {
    assert_eq!(run("1 / 0"), "inf");
    assert_eq!(run("-1 / 0"), "-inf");
    assert_eq!(run("0 / 0"), "NaN");
    let scope = Scope::global();
    let result = match zen::run(Source::source("5 % 0"), &scope) {
        Ok(value) => value,
        Err(e) => panic!("unexpected syntax error: {}", e),
    };
    assert!(matches!(&*result.borrow(), Value::Error(_)));
}

#[test]
fn while_loop_accumulates_across_iterations() {
    assert_eq!(run("set i 0\nset total 0\nwhile i < 5 { total = total + i\ni = i + 1 }\ntotal"), "10");
}

#[test]
fn for_loop_iterates_an_array() {
    assert_eq!(run("set total 0\nfor x in [1, 2, 3] { total = total + x }\ntotal"), "6");
}

#[test]
fn classes_support_single_inheritance_and_a_constructor() {
    let source = r#"
        class Animal {
            function init(name) { set this.name name }
            function speak() { return this.name + " makes a sound" }
        }
        class Dog extends Animal {
            function speak() { return this.name + " barks" }
        }
        set d new Dog("Rex")
        d.speak()
    "#;
    assert_eq!(run(source), "Rex barks");
}

#[test]
fn lambdas_close_over_their_defining_scope() {
    let source = r#"
        function makeAdder(n) {
            return function(x) { return x + n }
        }
        set addFive makeAdder(5)
        addFive(10)
    "#;
    assert_eq!(run(source), "15");
}

#[test]
fn spread_collects_trailing_call_arguments() {
    let source = r#"
        function sum(...xs) {
            set total 0
            for x in xs { total = total + x }
            return total
        }
        sum(1, 2, 3, 4)
    "#;
    assert_eq!(run(source), "10");
}

#[test]
fn universal_quantifier_is_vacuously_true_over_an_empty_domain() {
    assert_eq!(run("forall x in [] : x > 0"), "true");
}

#[test]
fn existential_quantifier_is_false_over_an_empty_domain() {
    assert_eq!(run("exists x in [] : x > 0"), "false");
}

#[test]
fn universal_quantifier_over_a_domain_of_positives() {
    assert_eq!(run("forall x in [1, 2, 3] : x > 0"), "true");
}

#[test]
fn existential_quantifier_finds_a_negative_example() {
    assert_eq!(run("exists x in [1, -2, 3] : x < 0"), "true");
}

#[test]
fn logical_implication_three_valued_truth_table() {
    // a true antecedent with a false consequent is the one combination that
    // falsifies the implication; every other combination holds.
    assert_eq!(run("forall x in [true] : x implies false"), "false");
    assert_eq!(run("forall x in [false] : x implies false"), "true");
    assert_eq!(run("forall x in [null] : x implies true"), "true");
}

#[test]
fn json_round_trips_through_a_zen_object() {
    assert_eq!(run(r#"jsonStringify(jsonParse("{\"a\":1,\"b\":[true,null]}"))"#), r#"{"a":1,"b":[true,null]}"#);
}

#[test]
fn error_propagates_through_an_enclosing_expression_untouched() {
    assert_eq!(run("(1 / \"x\") + 1"), "[error: unsupported operand kinds for arithmetic: number and string]");
}

#[test]
fn consensus_returns_undecidable_when_votes_are_too_mixed() {
    assert_eq!(run("consensus([true, false, true], 0.8)"), "null");
}

#[test]
fn consensus_returns_true_once_the_threshold_is_met() {
    assert_eq!(run("consensus([true, true, true, false], 0.5)"), "true");
}

#[test]
fn eventually_resolves_past_its_horizon() {
    assert_eq!(run("eventually(null, 200)"), "true");
    assert_eq!(run("eventually(null, 0)"), "null");
}

#[test]
fn fuzzy_membership_thresholds_hold() {
    assert_eq!(run("fuzzyMembership(0.9)"), "true");
    assert_eq!(run("fuzzyMembership(0.1)"), "false");
    assert_eq!(run("fuzzyMembership(0.5)"), "null");
}
