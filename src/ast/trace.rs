use super::{ConditionOperator, LogicalOp, Value};
use crate::error::EvaluationError;

/// A record of how a condition was evaluated, including the values each leaf saw.
#[derive(Debug, Clone)]
pub enum EvaluationTrace {
    Leaf {
        source: String,
        operator: ConditionOperator,
        actual: Value,
        expected: Value,
        outcome: bool,
    },
    /// A leaf whose comparison could not be performed. Counts as `false`.
    Failed {
        source: String,
        error: EvaluationError,
    },
    Group {
        logical_op: LogicalOp,
        children: Vec<EvaluationTrace>,
        outcome: bool,
    },
    /// A node that is neither a usable leaf nor a non-empty group. Counts as `false`.
    Malformed { reason: String },
    /// A child skipped by short-circuiting.
    NotEvaluated,
}

impl EvaluationTrace {
    pub fn get_outcome(&self) -> bool {
        match self {
            EvaluationTrace::Leaf { outcome, .. } | EvaluationTrace::Group { outcome, .. } => {
                *outcome
            }
            EvaluationTrace::Failed { .. }
            | EvaluationTrace::Malformed { .. }
            | EvaluationTrace::NotEvaluated => false,
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            EvaluationTrace::Group { logical_op, .. } => match logical_op {
                LogicalOp::Or => 1,
                LogicalOp::And => 2,
                LogicalOp::Not => 3,
            },
            _ => 4,
        }
    }

    /// Leaf failures recorded anywhere in the tree.
    pub fn failures(&self) -> Vec<&EvaluationError> {
        let mut found = Vec::new();
        self.collect_failures(&mut found);
        found
    }

    fn collect_failures<'a>(&'a self, found: &mut Vec<&'a EvaluationError>) {
        match self {
            EvaluationTrace::Failed { error, .. } => found.push(error),
            EvaluationTrace::Group { children, .. } => {
                for child in children {
                    child.collect_failures(found);
                }
            }
            _ => {}
        }
    }
}
