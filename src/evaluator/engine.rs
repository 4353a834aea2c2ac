use super::operators;
use crate::ast::{Condition, EvaluationTrace, LogicalOp};
use crate::data::WorkflowFormData;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::error::EvaluationError;
use crate::reference::FieldReference;

/// The core recursive engine for evaluating one condition tree against one data snapshot.
pub(super) struct ConditionEngine<'a> {
    data: &'a WorkflowFormData,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> ConditionEngine<'a> {
    pub(super) fn new(data: &'a WorkflowFormData, sink: &'a dyn DiagnosticSink) -> Self {
        Self { data, sink }
    }

    pub(super) fn evaluate(&self, condition: &Condition) -> EvaluationTrace {
        match condition {
            Condition::Leaf { .. } if !condition.is_simple() => {
                self.malformed("leaf condition has an empty field reference")
            }
            Condition::Group { logical_op, .. } if !condition.is_complex() => {
                self.malformed(&format!("{} group has no conditions", logical_op))
            }

            Condition::Leaf {
                field,
                operator,
                value,
            } => {
                let source = format!("${}", field);
                let outcome = FieldReference::parse(field)
                    .map_err(EvaluationError::from)
                    .and_then(|reference| {
                        let actual = self.data.resolve(&reference);
                        operators::apply(*operator, actual, value).map(|outcome| (actual, outcome))
                    });

                match outcome {
                    Ok((actual, outcome)) => EvaluationTrace::Leaf {
                        source,
                        operator: *operator,
                        actual: actual.clone(),
                        expected: value.clone(),
                        outcome,
                    },
                    Err(error) => {
                        self.sink.record(Diagnostic::warning(
                            DiagnosticKind::LeafFailure,
                            format!("Condition on '{}' evaluated as false: {}", field, error),
                        ));
                        EvaluationTrace::Failed { source, error }
                    }
                }
            }

            Condition::Group {
                logical_op: LogicalOp::Not,
                conditions,
            } => {
                if conditions.len() > 1 {
                    self.sink.record(Diagnostic::warning(
                        DiagnosticKind::TooManyNotOperands,
                        format!(
                            "NOT group has {} conditions; only the first is evaluated",
                            conditions.len()
                        ),
                    ));
                }
                let child = self.evaluate(&conditions[0]);
                let outcome = !child.get_outcome();
                EvaluationTrace::Group {
                    logical_op: LogicalOp::Not,
                    children: vec![child],
                    outcome,
                }
            }

            Condition::Group {
                logical_op,
                conditions,
            } => {
                // AND stops at the first false child, OR at the first true one.
                let decisive = *logical_op == LogicalOp::Or;
                let mut children = Vec::with_capacity(conditions.len());
                let mut outcome = !decisive;

                for child in conditions {
                    if outcome != !decisive {
                        children.push(EvaluationTrace::NotEvaluated);
                        continue;
                    }
                    let trace = self.evaluate(child);
                    if trace.get_outcome() == decisive {
                        outcome = decisive;
                    }
                    children.push(trace);
                }

                EvaluationTrace::Group {
                    logical_op: *logical_op,
                    children,
                    outcome,
                }
            }
        }
    }

    fn malformed(&self, reason: &str) -> EvaluationTrace {
        let error = EvaluationError::MalformedCondition(reason.to_string());
        self.sink.record(Diagnostic::warning(
            DiagnosticKind::MalformedCondition,
            format!("{}; evaluated as false", error),
        ));
        EvaluationTrace::Malformed {
            reason: reason.to_string(),
        }
    }
}
