//! Tests for condition and rule evaluation.
mod common;
use common::*;
use jouken::prelude::*;

#[test]
fn test_equals_is_case_insensitive() {
    let evaluator = RuleEvaluator::new();
    let condition = Condition::leaf("province", ConditionOperator::Equals, "ontario");

    for entered in ["Ontario", "ONTARIO", "ontario"] {
        let data = WorkflowFormData::for_module("Address", [("province", entered)]);
        assert!(
            evaluator.evaluate(&condition, &data),
            "failed for {}",
            entered
        );
    }
}

#[test]
fn test_qualified_reference_reads_other_module() {
    let evaluator = RuleEvaluator::new();
    let mut data = WorkflowFormData::new("Employment");
    data.insert("Applicant", "age", 16);
    data.insert("Employment", "age", 40);

    let qualified = Condition::leaf("Applicant.age", ConditionOperator::LessThan, 18);
    let unqualified = Condition::leaf("age", ConditionOperator::LessThan, 18);

    assert!(evaluator.evaluate(&qualified, &data));
    assert!(!evaluator.evaluate(&unqualified, &data));
}

#[test]
fn test_unknown_module_prefix_falls_back_to_dotted_field() {
    let evaluator = RuleEvaluator::new();
    let data = WorkflowFormData::for_module("Applicant", [("contact.email", "a@b.c")]);

    let condition = Condition::leaf("contact.email", ConditionOperator::IsNotEmpty, Value::Null);
    assert!(evaluator.evaluate(&condition, &data));
}

#[test]
fn test_missing_field_is_null() {
    let evaluator = RuleEvaluator::new();
    let data = WorkflowFormData::new("Applicant");

    assert!(evaluator.evaluate(
        &Condition::leaf("nickname", ConditionOperator::IsNull, Value::Null),
        &data,
    ));
    assert!(evaluator.evaluate(
        &Condition::leaf("nickname", ConditionOperator::IsEmpty, Value::Null),
        &data,
    ));
}

#[test]
fn test_type_mismatch_is_false_and_reported() {
    let sink = CollectingSink::new();
    let evaluator = RuleEvaluator::with_sink(sink.clone());
    let data = WorkflowFormData::for_module("Applicant", [("age", "sixteen")]);

    let condition = Condition::leaf("age", ConditionOperator::GreaterThan, 18);
    assert!(!evaluator.evaluate(&condition, &data));
    assert_eq!(sink.count(DiagnosticKind::LeafFailure), 1);

    // A failed leaf is false, so its negation holds.
    assert!(evaluator.evaluate(&Condition::not(condition), &data));
}

#[test]
fn test_malformed_conditions_are_false() {
    let sink = CollectingSink::new();
    let evaluator = RuleEvaluator::with_sink(sink.clone());
    let data = create_applicant_data(16);

    assert!(!evaluator.evaluate(&Condition::and(vec![]), &data));
    assert!(!evaluator.evaluate(
        &Condition::leaf("  ", ConditionOperator::IsNull, Value::Null),
        &data,
    ));
    assert_eq!(sink.count(DiagnosticKind::MalformedCondition), 2);

    let messages: Vec<String> = sink.diagnostics().into_iter().map(|d| d.message).collect();
    assert_eq!(
        messages[0],
        "Malformed condition: AND group has no conditions; evaluated as false"
    );
}

#[test]
fn test_not_uses_only_first_child() {
    let sink = CollectingSink::new();
    let evaluator = RuleEvaluator::with_sink(sink.clone());
    let data = create_applicant_data(16);

    let condition = Condition::Group {
        logical_op: LogicalOp::Not,
        conditions: vec![
            Condition::leaf("age", ConditionOperator::GreaterThan, 18),
            Condition::leaf("age", ConditionOperator::LessThan, 18),
        ],
    };
    assert!(evaluator.evaluate(&condition, &data));
    assert_eq!(sink.count(DiagnosticKind::TooManyNotOperands), 1);
}

#[test]
fn test_and_short_circuits_in_trace() {
    let evaluator = RuleEvaluator::new();
    let data = create_applicant_data(30);

    let condition = Condition::and(vec![
        Condition::leaf("age", ConditionOperator::LessThan, 18),
        Condition::leaf("age", ConditionOperator::GreaterThan, 5),
    ]);
    let trace = evaluator.trace(&condition, &data);

    assert!(!trace.get_outcome());
    let EvaluationTrace::Group { children, .. } = &trace else {
        panic!("expected a group trace, got {:?}", trace);
    };
    assert!(matches!(children[1], EvaluationTrace::NotEvaluated));
    assert_eq!(TraceFormatter::format_trace(&trace), "$age (was 30) < 18");
}

#[test]
fn test_reason_parenthesizes_nested_groups() {
    let evaluator = RuleEvaluator::new();
    let data = WorkflowFormData::for_module(
        "Address",
        [("province", Value::from("QC")), ("postal", Value::from("H2X"))],
    );

    let condition = Condition::and(vec![
        Condition::or(vec![
            Condition::leaf("province", ConditionOperator::Equals, "ON"),
            Condition::leaf("province", ConditionOperator::In, vec!["QC", "NB"]),
        ]),
        Condition::leaf("postal", ConditionOperator::StartsWith, "h"),
    ]);
    let trace = evaluator.trace(&condition, &data);

    assert!(trace.get_outcome());
    assert_eq!(
        TraceFormatter::format_trace(&trace),
        "($province (was \"QC\") == \"ON\" OR $province (was \"QC\") IN [\"QC\", \"NB\"]) \
         AND $postal (was \"H2X\") STARTS WITH \"h\""
    );
}

#[test]
fn test_evaluate_rules_orders_by_priority() {
    let evaluator = RuleEvaluator::new();
    let data = create_applicant_data(16);
    let condition = Condition::leaf("age", ConditionOperator::LessThan, 18);

    let p50 = ConditionalRule::new("p50", RuleAction::SetOptional, condition.clone())
        .with_target_field("parentalConsent")
        .with_priority(50);
    let p10 = ConditionalRule::new("p10", RuleAction::SetRequired, condition.clone())
        .with_target_field("parentalConsent")
        .with_priority(10);
    let inactive = ConditionalRule::new("off", RuleAction::Hide, condition)
        .with_target_field("parentalConsent")
        .with_priority(1)
        .inactive();

    let rules = vec![p50, inactive, p10];
    let triggered: Vec<&str> = evaluator
        .evaluate_rules(&rules, &data)
        .iter()
        .map(|r| r.rule.id.as_str())
        .collect();
    assert_eq!(triggered, vec!["p10", "p50"]);
}

#[test]
fn test_equal_priorities_keep_input_order() {
    let evaluator = RuleEvaluator::new();
    let data = create_applicant_data(16);
    let always = Condition::leaf("age", ConditionOperator::IsNotNull, Value::Null);

    let rules: Vec<ConditionalRule> = ["c", "a", "b"]
        .into_iter()
        .map(|id| ConditionalRule::new(id, RuleAction::Show, always.clone()))
        .map(|rule| rule.with_target_field("x"))
        .collect();
    let ids: Vec<String> = evaluator
        .evaluate_rules(&rules, &data)
        .into_iter()
        .map(|r| r.rule.id.clone())
        .collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn test_evaluate_rule_reports_inactive_and_missing_target() {
    let sink = CollectingSink::new();
    let evaluator = RuleEvaluator::with_sink(sink.clone());
    let data = create_applicant_data(16);

    let inactive = create_minor_consent_rule().inactive();
    let result = evaluator.evaluate_rule(&inactive, &data);
    assert!(!result.triggered);
    assert_eq!(
        result.error_message.as_deref(),
        Some("Rule 'consent-for-minors' is inactive")
    );

    let untargeted = ConditionalRule::new(
        "no-target",
        RuleAction::Show,
        Condition::leaf("age", ConditionOperator::LessThan, 18),
    );
    let result = evaluator.evaluate_rule(&untargeted, &data);
    assert!(!result.triggered);
    assert!(result.error_message.unwrap().contains("no matching target"));
    assert_eq!(sink.count(DiagnosticKind::RuleFailure), 1);
}

#[test]
fn test_broken_rule_does_not_stop_the_batch() {
    let evaluator = RuleEvaluator::with_sink(CollectingSink::new());
    let data = create_applicant_data(16);

    let broken = ConditionalRule::new(
        "broken",
        RuleAction::Show,
        Condition::leaf("age", ConditionOperator::GreaterThan, "abc"),
    )
    .with_target_field("x")
    .with_priority(1);
    let rules = vec![broken, create_minor_consent_rule()];

    let triggered = evaluator.evaluate_rules(&rules, &data);
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].rule.id, "consent-for-minors");

    let result = evaluator.evaluate_rule(&rules[0], &data);
    assert!(result.error_message.unwrap().contains("incompatible types"));
}
