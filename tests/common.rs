//! Common test utilities for building schemas, rules and form data.
use jouken::prelude::*;

/// The applicant module used across tests.
///
/// Tree: `age` and `guardianSection` at the root, `parentalConsent` (required)
/// under the section.
#[allow(dead_code)]
pub fn create_applicant_fields() -> Vec<FormFieldSchema> {
    vec![
        FormFieldSchema::new("age")
            .with_label("Age")
            .with_type("number")
            .with_order(1)
            .required(),
        FormFieldSchema::new("guardianSection")
            .with_label("Guardian")
            .with_type("section")
            .with_order(2),
        FormFieldSchema::new("parentalConsent")
            .with_label("Parental consent")
            .with_type("checkbox")
            .with_parent("guardianSection")
            .with_order(1)
            .required(),
    ]
}

/// `age < 18` -> show `parentalConsent`.
#[allow(dead_code)]
pub fn create_minor_consent_rule() -> ConditionalRule {
    ConditionalRule::new(
        "consent-for-minors",
        RuleAction::Show,
        Condition::leaf("age", ConditionOperator::LessThan, 18),
    )
    .with_target_field("parentalConsent")
}

/// `age >= 18` -> hide `guardianSection`.
#[allow(dead_code)]
pub fn create_adult_hide_rule() -> ConditionalRule {
    ConditionalRule::new(
        "hide-guardian-for-adults",
        RuleAction::Hide,
        Condition::leaf("age", ConditionOperator::GreaterThanOrEqual, 18),
    )
    .with_target_field("guardianSection")
}

/// A snapshot of the `Applicant` module holding only `age`.
#[allow(dead_code)]
pub fn create_applicant_data(age: i32) -> WorkflowFormData {
    WorkflowFormData::for_module("Applicant", [("age", age)])
}

/// Four steps: Applicant, Guardian, Employment, Review.
///
/// - adults skip the Guardian step
/// - `employed == false` jumps straight to Review
/// - `withdraw == true` completes the workflow
#[allow(dead_code)]
pub fn create_application_workflow() -> WorkflowSchema {
    let step = |key: &str, title: &str| WorkflowStep {
        module_key: key.to_string(),
        title: title.to_string(),
    };

    WorkflowSchema {
        key: "application".to_string(),
        steps: vec![
            step("Applicant", "About you"),
            step("Guardian", "Guardian details"),
            step("Employment", "Employment"),
            step("Review", "Review"),
        ],
        workflow_rules: vec![
            ConditionalRule::new(
                "skip-guardian",
                RuleAction::SkipStep,
                Condition::leaf("Applicant.age", ConditionOperator::GreaterThanOrEqual, 18),
            )
            .with_target_module("Guardian"),
            ConditionalRule::new(
                "unemployed-to-review",
                RuleAction::GoToStep,
                Condition::leaf("Applicant.employed", ConditionOperator::Equals, false),
            )
            .with_target_step(4),
            ConditionalRule::new(
                "withdraw",
                RuleAction::CompleteWorkflow,
                Condition::leaf("Applicant.withdraw", ConditionOperator::Equals, true),
            )
            .with_priority(1),
        ],
    }
}

/// Workflow data for the applicant step, with `Applicant` as the current module.
#[allow(dead_code)]
pub fn create_workflow_data(age: i32, employed: bool) -> WorkflowFormData {
    let mut data = WorkflowFormData::new("Applicant");
    data.insert("Applicant", "age", age);
    data.insert("Applicant", "employed", employed);
    data
}
