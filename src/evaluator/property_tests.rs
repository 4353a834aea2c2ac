//! Property tests for condition evaluation
//!
//! Covers case-insensitive equality, AND/OR as true conjunction/disjunction
//! and IsEmpty/IsNotEmpty being exact negations.

use proptest::prelude::*;

use super::RuleEvaluator;
use crate::ast::{Condition, ConditionOperator, Value};
use crate::data::WorkflowFormData;
use crate::diagnostics::CollectingSink;

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators for property tests
// ═══════════════════════════════════════════════════════════════════════════

fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i32..1000).prop_map(|n| Value::Number(n as f64)),
        "[a-zA-Z ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(2, 8, 4, |inner| {
        // Lists nest at most two levels deep.
        prop::collection::vec(inner, 0..4).prop_map(Value::List)
    })
}

fn operator_strategy() -> impl Strategy<Value = ConditionOperator> {
    prop::sample::select(ConditionOperator::ALL.to_vec())
}

/// A simple leaf over one of three fields.
fn leaf_strategy() -> impl Strategy<Value = Condition> {
    (
        prop::sample::select(vec!["a", "b", "c"]),
        operator_strategy(),
        value_strategy(),
    )
        .prop_map(|(field, op, value)| Condition::leaf(field, op, value))
}

fn data_strategy() -> impl Strategy<Value = WorkflowFormData> {
    (value_strategy(), value_strategy(), value_strategy()).prop_map(|(a, b, c)| {
        WorkflowFormData::for_module("main", [("a", a), ("b", b), ("c", c)])
    })
}

fn evaluator() -> RuleEvaluator {
    RuleEvaluator::with_sink(CollectingSink::new())
}

// ═══════════════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn prop_equals_ignores_string_case(text in "[a-zA-Z]{1,12}") {
        let evaluator = evaluator();
        let condition = Condition::leaf("province", ConditionOperator::Equals, text.to_lowercase());
        let upper = WorkflowFormData::for_module("main", [("province", text.to_uppercase())]);
        let original = WorkflowFormData::for_module("main", [("province", text.clone())]);

        prop_assert!(evaluator.evaluate(&condition, &upper));
        prop_assert_eq!(
            evaluator.evaluate(&condition, &upper),
            evaluator.evaluate(&condition, &original)
        );
    }

    #[test]
    fn prop_and_is_conjunction(c1 in leaf_strategy(), c2 in leaf_strategy(), data in data_strategy()) {
        let evaluator = evaluator();
        let expected = evaluator.evaluate(&c1, &data) && evaluator.evaluate(&c2, &data);
        prop_assert_eq!(evaluator.evaluate(&Condition::and(vec![c1, c2]), &data), expected);
    }

    #[test]
    fn prop_or_is_disjunction(c1 in leaf_strategy(), c2 in leaf_strategy(), data in data_strategy()) {
        let evaluator = evaluator();
        let expected = evaluator.evaluate(&c1, &data) || evaluator.evaluate(&c2, &data);
        prop_assert_eq!(evaluator.evaluate(&Condition::or(vec![c1, c2]), &data), expected);
    }

    #[test]
    fn prop_not_negates_first_child(c1 in leaf_strategy(), data in data_strategy()) {
        let evaluator = evaluator();
        let expected = !evaluator.evaluate(&c1, &data);
        prop_assert_eq!(evaluator.evaluate(&Condition::not(c1), &data), expected);
    }

    #[test]
    fn prop_is_not_empty_negates_is_empty(value in value_strategy()) {
        let evaluator = evaluator();
        let data = WorkflowFormData::for_module("main", [("a", value)]);
        let empty = Condition::leaf("a", ConditionOperator::IsEmpty, Value::Null);
        let not_empty = Condition::leaf("a", ConditionOperator::IsNotEmpty, Value::Null);
        prop_assert_eq!(evaluator.evaluate(&empty, &data), !evaluator.evaluate(&not_empty, &data));
    }
}
