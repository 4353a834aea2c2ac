use super::ConditionalRule;
use crate::ast::{Condition, ConditionOperator, LogicalOp, Value};
use crate::reference::FieldReference;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// An authoring problem found in a condition tree or rule.
///
/// `path` locates the node: `root` for the top, `root.1.0` for the first child
/// of the second child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionIssue {
    pub severity: IssueSeverity,
    pub path: String,
    pub message: String,
}

impl fmt::Display for ConditionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}: {}", self.severity, self.path, self.message)
    }
}

/// Checks a condition tree for shapes the evaluator can only treat as `false`
/// or can only partly honor. Evaluation itself is not affected.
pub fn validate_condition(condition: &Condition) -> Vec<ConditionIssue> {
    let mut issues = Vec::new();
    walk(condition, "root".to_string(), &mut issues);
    issues
}

/// Validates the rule's condition and that its action has a usable target.
pub fn validate_rule(rule: &ConditionalRule) -> Vec<ConditionIssue> {
    let mut issues = validate_condition(&rule.condition);
    if let Err(e) = rule.target() {
        issues.push(ConditionIssue {
            severity: IssueSeverity::Error,
            path: format!("rule '{}'", rule.id),
            message: e.to_string(),
        });
    }
    issues
}

fn walk(condition: &Condition, path: String, issues: &mut Vec<ConditionIssue>) {
    let mut push = |severity, message: String| {
        issues.push(ConditionIssue {
            severity,
            path: path.clone(),
            message,
        })
    };

    match condition {
        Condition::Leaf {
            field,
            operator,
            value,
        } => {
            if let Err(e) = FieldReference::parse(field) {
                push(IssueSeverity::Error, e.to_string());
            }
            if matches!(operator, ConditionOperator::In | ConditionOperator::NotIn)
                && !matches!(value, Value::List(_))
            {
                push(
                    IssueSeverity::Warning,
                    format!(
                        "'{}' expects a list value but got {}",
                        operator,
                        value.type_name()
                    ),
                );
            }
            if operator.is_ordering() && matches!(value, Value::List(_) | Value::Bool(_)) {
                push(
                    IssueSeverity::Warning,
                    format!("'{}' cannot order a {} value", operator, value.type_name()),
                );
            }
        }
        Condition::Group {
            logical_op,
            conditions,
        } => {
            if conditions.is_empty() {
                push(
                    IssueSeverity::Error,
                    format!("{} group has no conditions", logical_op),
                );
            }
            if *logical_op == LogicalOp::Not && conditions.len() > 1 {
                push(
                    IssueSeverity::Warning,
                    format!(
                        "NOT group has {} conditions; only the first is evaluated",
                        conditions.len()
                    ),
                );
            }
            for (i, child) in conditions.iter().enumerate() {
                walk(child, format!("{}.{}", path, i), issues);
            }
        }
    }
}
