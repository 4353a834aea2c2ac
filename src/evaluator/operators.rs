use crate::ast::{ConditionOperator, Value};
use crate::error::EvaluationError;
use std::cmp::Ordering;

/// Applies `operator` to the field's current value and the condition's expected value.
pub(crate) fn apply(
    operator: ConditionOperator,
    actual: &Value,
    expected: &Value,
) -> Result<bool, EvaluationError> {
    let outcome = match operator {
        ConditionOperator::Equals => loosely_equal(actual, expected),
        ConditionOperator::NotEquals => !loosely_equal(actual, expected),

        ConditionOperator::GreaterThan => compare(operator, actual, expected)?.is_gt(),
        ConditionOperator::GreaterThanOrEqual => compare(operator, actual, expected)?.is_ge(),
        ConditionOperator::LessThan => compare(operator, actual, expected)?.is_lt(),
        ConditionOperator::LessThanOrEqual => compare(operator, actual, expected)?.is_le(),

        ConditionOperator::Contains => contains(actual, expected),
        ConditionOperator::NotContains => !contains(actual, expected),

        ConditionOperator::StartsWith => match (actual, expected) {
            (Value::String(s), Value::String(prefix)) => {
                s.to_lowercase().starts_with(&prefix.to_lowercase())
            }
            _ => false,
        },
        ConditionOperator::EndsWith => match (actual, expected) {
            (Value::String(s), Value::String(suffix)) => {
                s.to_lowercase().ends_with(&suffix.to_lowercase())
            }
            _ => false,
        },

        ConditionOperator::In => membership(actual, expected).unwrap_or(false),
        ConditionOperator::NotIn => membership(actual, expected).is_some_and(|found| !found),

        ConditionOperator::IsNull => actual.is_null(),
        ConditionOperator::IsNotNull => !actual.is_null(),
        ConditionOperator::IsEmpty => actual.is_empty(),
        ConditionOperator::IsNotEmpty => !actual.is_empty(),
    };
    Ok(outcome)
}

/// The equality rule shared by `Equals`, `Contains` on lists and `In`.
///
/// Null only equals null, strings compare case-insensitively, numbers as `f64`,
/// and everything else structurally.
pub fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(x), Value::String(y)) => x.to_lowercase() == y.to_lowercase(),
        (Value::Number(x), Value::Number(y)) => x == y,
        _ => a == b,
    }
}

fn compare(
    operator: ConditionOperator,
    a: &Value,
    b: &Value,
) -> Result<Ordering, EvaluationError> {
    let mismatch = || EvaluationError::TypeMismatch {
        operator,
        left: a.clone(),
        right: b.clone(),
    };

    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => Err(EvaluationError::NullComparison { operator }),
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).ok_or_else(mismatch),
        (Value::String(x), Value::String(y)) => Ok(x.to_lowercase().cmp(&y.to_lowercase())),
        (Value::Date(x), Value::Date(y)) => Ok(x.cmp(y)),
        (Value::DateTime(x), Value::DateTime(y)) => Ok(x.cmp(y)),
        _ => Err(mismatch()),
    }
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::String(haystack), Value::String(needle)) => {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }
        (Value::List(items), _) => items.iter().any(|item| loosely_equal(item, expected)),
        _ => false,
    }
}

/// `None` when membership is undefined: a null field or a non-list expected value.
fn membership(actual: &Value, expected: &Value) -> Option<bool> {
    if actual.is_null() {
        return None;
    }
    expected
        .as_list()
        .map(|items| items.iter().any(|item| loosely_equal(actual, item)))
}
