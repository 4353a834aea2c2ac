use crate::ast::{EvaluationTrace, LogicalOp};

/// Formats evaluation traces into human-readable strings
pub struct TraceFormatter;

impl TraceFormatter {
    /// Format an evaluation trace into a human-readable explanation.
    ///
    /// Children skipped by short-circuiting are left out, so the result only
    /// shows the parts that decided the outcome.
    pub fn format_trace(trace: &EvaluationTrace) -> String {
        Self::format_recursive(trace, 0)
    }

    /// Recursively formats the trace, adding parentheses only when necessary.
    fn format_recursive(trace: &EvaluationTrace, parent_precedence: u8) -> String {
        let current_precedence = trace.precedence();
        let needs_parens = current_precedence < parent_precedence;

        let body = match trace {
            EvaluationTrace::Leaf {
                source,
                operator,
                actual,
                expected,
                ..
            } => {
                if operator.is_unary() {
                    format!("{} (was {}) {}", source, actual, operator)
                } else {
                    format!("{} (was {}) {} {}", source, actual, operator, expected)
                }
            }
            EvaluationTrace::Failed { source, error } => format!("{} [failed: {}]", source, error),
            EvaluationTrace::Malformed { reason } => format!("<malformed: {}>", reason),
            EvaluationTrace::Group {
                logical_op: LogicalOp::Not,
                children,
                ..
            } => {
                let child = children
                    .first()
                    .map(|c| Self::format_recursive(c, current_precedence + 1))
                    .unwrap_or_default();
                format!("NOT {}", child)
            }
            EvaluationTrace::Group {
                logical_op,
                children,
                ..
            } => children
                .iter()
                .filter(|c| !matches!(c, EvaluationTrace::NotEvaluated))
                .map(|c| Self::format_recursive(c, current_precedence + 1))
                .collect::<Vec<_>>()
                .join(&format!(" {} ", logical_op)),
            EvaluationTrace::NotEvaluated => String::new(),
        };

        if needs_parens {
            format!("({})", body)
        } else {
            body
        }
    }
}
