//! Unit tests for values, conditions, references and rule validation.
use chrono::NaiveDate;
use jouken::prelude::*;
use jouken::rules::{IssueSeverity, validate_condition, validate_rule};

#[test]
fn test_value_from_json() {
    let value = Value::from_json(serde_json::json!(["a", 1, true, null, {"k": 1}]));
    assert_eq!(
        value,
        Value::List(vec![
            Value::String("a".into()),
            Value::Number(1.0),
            Value::Bool(true),
            Value::Null,
            Value::Null,
        ])
    );
}

#[test]
fn test_value_display() {
    assert_eq!(Value::from(18).to_string(), "18");
    assert_eq!(Value::from(2.5).to_string(), "2.5");
    assert_eq!(Value::from("ON").to_string(), "\"ON\"");
    assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(Value::from(date).to_string(), "2024-02-29");
}

#[test]
fn test_condition_display() {
    let condition = Condition::and(vec![
        Condition::or(vec![
            Condition::leaf("a", ConditionOperator::Equals, 1),
            Condition::leaf("b", ConditionOperator::IsEmpty, Value::Null),
        ]),
        Condition::not(Condition::leaf("Applicant.c", ConditionOperator::In, vec!["x"])),
    ]);
    assert_eq!(
        condition.to_string(),
        "($a == 1 OR $b IS EMPTY) AND NOT $Applicant.c IN [\"x\"]"
    );
}

#[test]
fn test_condition_shape_predicates() {
    let is_null = |field: &str| Condition::leaf(field, ConditionOperator::IsNull, Value::Null);
    assert!(is_null("a").is_simple());
    assert!(!is_null("").is_simple());
    assert!(Condition::not(is_null("a")).is_complex());
    assert!(!Condition::or(vec![]).is_complex());
}

#[test]
fn test_referenced_modules_are_sorted_and_unique() {
    let condition = Condition::and(vec![
        Condition::leaf("Employment.salary", ConditionOperator::GreaterThan, 0),
        Condition::leaf("Applicant.age", ConditionOperator::LessThan, 18),
        Condition::leaf("Applicant.name", ConditionOperator::IsNotEmpty, Value::Null),
        Condition::leaf("localField", ConditionOperator::IsNotEmpty, Value::Null),
    ]);
    let modules: Vec<String> = condition.referenced_modules().into_iter().collect();
    assert_eq!(modules, vec!["Applicant", "Employment"]);
}

#[test]
fn test_field_reference_parsing() {
    let reference = FieldReference::parse("Applicant.age").unwrap();
    assert_eq!(reference.module_key.as_deref(), Some("Applicant"));
    assert_eq!(reference.field_id, "age");
    assert!(FieldReference::parse("   ").is_err());
    assert!(!FieldReference::parse(".hidden").unwrap().is_qualified());
}

#[test]
fn test_operator_names_parse_case_insensitively() {
    assert_eq!(
        "greaterthanorequal".parse::<ConditionOperator>().unwrap(),
        ConditionOperator::GreaterThanOrEqual
    );
    assert_eq!("OR".parse::<LogicalOp>().unwrap(), LogicalOp::Or);
    assert_eq!(
        "SetRequired".parse::<RuleAction>().unwrap(),
        RuleAction::SetRequired
    );
    assert!("sometimes".parse::<RuleAction>().is_err());
}

#[test]
fn test_validate_condition_flags_authoring_problems() {
    let condition = Condition::and(vec![
        Condition::Group {
            logical_op: LogicalOp::Not,
            conditions: vec![
                Condition::leaf("a", ConditionOperator::IsNull, Value::Null),
                Condition::leaf("b", ConditionOperator::IsNull, Value::Null),
            ],
        },
        Condition::leaf("province", ConditionOperator::In, "ON"),
        Condition::or(vec![]),
    ]);
    let issues = validate_condition(&condition);

    let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(paths, vec!["root.0", "root.1", "root.2"]);
    assert_eq!(issues[0].severity, IssueSeverity::Warning);
    assert_eq!(issues[1].severity, IssueSeverity::Warning);
    assert_eq!(issues[2].severity, IssueSeverity::Error);
}

#[test]
fn test_validate_rule_requires_target() {
    let rule = ConditionalRule::new(
        "jump",
        RuleAction::GoToStep,
        Condition::leaf("age", ConditionOperator::LessThan, 18),
    );
    let issues = validate_rule(&rule);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, IssueSeverity::Error);

    assert!(validate_rule(&rule.with_target_module("Review")).is_empty());
}
