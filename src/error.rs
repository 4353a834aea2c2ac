use crate::ast::{ConditionOperator, Value};
use thiserror::Error;

/// Errors raised while parsing a field reference such as `"Applicant.age"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Invalid field reference '{0}': reference must not be empty")]
    InvalidReference(String),
}

/// Failures of a single leaf comparison.
///
/// These never escape `RuleEvaluator::evaluate`: the leaf evaluates to `false`
/// and the failure is reported to the diagnostics sink.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Cannot apply '{operator}' to '{left}' and '{right}': incompatible types")]
    TypeMismatch {
        operator: ConditionOperator,
        left: Value,
        right: Value,
    },

    #[error("Cannot apply '{operator}' when an operand is null")]
    NullComparison { operator: ConditionOperator },

    #[error("Malformed condition: {0}")]
    MalformedCondition(String),

    #[error(transparent)]
    InvalidReference(#[from] ReferenceError),
}

/// Rule-level failures, captured into `RuleEvaluationResult::error_message`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Rule '{rule_id}' has action '{action}' but no matching target")]
    MissingTarget { rule_id: String, action: String },

    #[error("Rule '{0}' is inactive")]
    Inactive(String),
}

/// Structural defects in a module's flat field list.
///
/// Reported as validation data by `validate_hierarchy`; never raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyIssue {
    #[error("Field at position {index} has an empty id")]
    EmptyId { index: usize },

    #[error("Duplicate field id '{id}'")]
    DuplicateId { id: String },

    #[error("Field '{id}' references itself as its parent")]
    SelfReference { id: String },

    #[error("Parent cycle detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Field '{id}' references missing parent '{parent_id}'")]
    OrphanedParent { id: String, parent_id: String },
}

/// Errors produced by a `CodeSetProvider`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeSetError {
    #[error("Code set '{0}' not found")]
    NotFound(String),

    #[error("Code set provider failed: {0}")]
    Provider(String),
}

/// Errors converting persisted JSON into engine types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Failed to parse JSON: {0}")]
    Json(String),

    #[error("Unknown condition operator '{0}'")]
    InvalidOperator(String),

    #[error("Unknown logical operator '{0}'")]
    InvalidLogicalOp(String),

    #[error("Unknown rule action '{0}'")]
    UnknownAction(String),
}

/// Errors saving or loading a `CompiledRuleSet`.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("Serialization failed: {0}")]
    Encode(String),

    #[error("Deserialization failed: {0}")]
    Decode(String),

    #[error("I/O error on '{path}': {message}")]
    Io { path: String, message: String },
}
