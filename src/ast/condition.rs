use super::Value;
use crate::error::ConversionError;
use crate::reference::FieldReference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The closed operator vocabulary of a leaf condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
}

impl ConditionOperator {
    pub const ALL: [ConditionOperator; 16] = [
        ConditionOperator::Equals,
        ConditionOperator::NotEquals,
        ConditionOperator::GreaterThan,
        ConditionOperator::GreaterThanOrEqual,
        ConditionOperator::LessThan,
        ConditionOperator::LessThanOrEqual,
        ConditionOperator::Contains,
        ConditionOperator::NotContains,
        ConditionOperator::StartsWith,
        ConditionOperator::EndsWith,
        ConditionOperator::In,
        ConditionOperator::NotIn,
        ConditionOperator::IsNull,
        ConditionOperator::IsNotNull,
        ConditionOperator::IsEmpty,
        ConditionOperator::IsNotEmpty,
    ];

    /// Operators that order their operands (`>`, `>=`, `<`, `<=`).
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            ConditionOperator::GreaterThan
                | ConditionOperator::GreaterThanOrEqual
                | ConditionOperator::LessThan
                | ConditionOperator::LessThanOrEqual
        )
    }

    /// Operators that only inspect the field value and ignore the expected value.
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            ConditionOperator::IsNull
                | ConditionOperator::IsNotNull
                | ConditionOperator::IsEmpty
                | ConditionOperator::IsNotEmpty
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ConditionOperator::Equals => "==",
            ConditionOperator::NotEquals => "!=",
            ConditionOperator::GreaterThan => ">",
            ConditionOperator::GreaterThanOrEqual => ">=",
            ConditionOperator::LessThan => "<",
            ConditionOperator::LessThanOrEqual => "<=",
            ConditionOperator::Contains => "CONTAINS",
            ConditionOperator::NotContains => "NOT CONTAINS",
            ConditionOperator::StartsWith => "STARTS WITH",
            ConditionOperator::EndsWith => "ENDS WITH",
            ConditionOperator::In => "IN",
            ConditionOperator::NotIn => "NOT IN",
            ConditionOperator::IsNull => "IS NULL",
            ConditionOperator::IsNotNull => "IS NOT NULL",
            ConditionOperator::IsEmpty => "IS EMPTY",
            ConditionOperator::IsNotEmpty => "IS NOT EMPTY",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ConditionOperator {
    type Err = ConversionError;

    /// Accepts the persisted enum names in any casing (`"GreaterThan"`, `"greaterthan"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| format!("{:?}", op).eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConversionError::InvalidOperator(s.to_string()))
    }
}

/// How the children of a group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "AND"),
            LogicalOp::Or => write!(f, "OR"),
            LogicalOp::Not => write!(f, "NOT"),
        }
    }
}

impl FromStr for LogicalOp {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(LogicalOp::And),
            "or" => Ok(LogicalOp::Or),
            "not" => Ok(LogicalOp::Not),
            _ => Err(ConversionError::InvalidLogicalOp(s.to_string())),
        }
    }
}

/// A boolean expression tree over field values.
///
/// A node is either a leaf comparison or a logical group. A `Not` group is unary:
/// only its first child is evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Leaf {
        field: String,
        operator: ConditionOperator,
        value: Value,
    },
    Group {
        logical_op: LogicalOp,
        conditions: Vec<Condition>,
    },
}

impl Condition {
    pub fn leaf(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<Value>,
    ) -> Self {
        Condition::Leaf {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Condition::Group {
            logical_op: LogicalOp::And,
            conditions,
        }
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Condition::Group {
            logical_op: LogicalOp::Or,
            conditions,
        }
    }

    pub fn not(condition: Condition) -> Self {
        Condition::Group {
            logical_op: LogicalOp::Not,
            conditions: vec![condition],
        }
    }

    /// A leaf with a non-blank field reference.
    pub fn is_simple(&self) -> bool {
        matches!(self, Condition::Leaf { field, .. } if !field.trim().is_empty())
    }

    /// A group with at least one child.
    pub fn is_complex(&self) -> bool {
        matches!(self, Condition::Group { conditions, .. } if !conditions.is_empty())
    }

    /// Collects every field reference used by the leaves of this tree.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, fields: &mut Vec<&'a str>) {
        match self {
            Condition::Leaf { field, .. } => fields.push(field),
            Condition::Group { conditions, .. } => {
                for child in conditions {
                    child.collect_fields(fields);
                }
            }
        }
    }

    /// Module keys this condition reads from, sorted and deduplicated.
    /// Unqualified references (current module) are not included.
    pub fn referenced_modules(&self) -> BTreeSet<String> {
        self.referenced_fields()
            .into_iter()
            .filter_map(|field| FieldReference::parse(field).ok())
            .filter_map(|reference| reference.module_key)
            .collect()
    }

    fn precedence(&self) -> u8 {
        match self {
            Condition::Group {
                logical_op: LogicalOp::Or,
                ..
            } => 1,
            Condition::Group {
                logical_op: LogicalOp::And,
                ..
            } => 2,
            Condition::Group {
                logical_op: LogicalOp::Not,
                ..
            } => 3,
            Condition::Leaf { .. } => 4,
        }
    }

    fn fmt_with_precedence(
        &self,
        f: &mut fmt::Formatter<'_>,
        parent_precedence: u8,
    ) -> fmt::Result {
        let current_precedence = self.precedence();
        let needs_parens = current_precedence < parent_precedence;
        if needs_parens {
            write!(f, "(")?;
        }

        match self {
            Condition::Leaf {
                field,
                operator,
                value,
            } => {
                if operator.is_unary() {
                    write!(f, "${} {}", field, operator)?;
                } else {
                    write!(f, "${} {} {}", field, operator, value)?;
                }
            }
            Condition::Group {
                logical_op: LogicalOp::Not,
                conditions,
            } => {
                write!(f, "NOT ")?;
                match conditions.first() {
                    Some(child) => child.fmt_with_precedence(f, current_precedence + 1)?,
                    None => write!(f, "<empty>")?,
                }
            }
            Condition::Group {
                logical_op,
                conditions,
            } => {
                if conditions.is_empty() {
                    write!(f, "<empty {}>", logical_op)?;
                }
                for (i, child) in conditions.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", logical_op)?;
                    }
                    child.fmt_with_precedence(f, current_precedence + 1)?;
                }
            }
        }

        if needs_parens {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with_precedence(f, 0)
    }
}

