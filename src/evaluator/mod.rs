use crate::ast::{Condition, EvaluationTrace};
use crate::data::WorkflowFormData;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, default_sink};
use crate::error::RuleError;
use crate::rules::ConditionalRule;
use crate::trace::TraceFormatter;
use itertools::Itertools;
use std::sync::Arc;

mod engine;
mod operators;

#[cfg(test)]
mod property_tests;

use engine::ConditionEngine;
pub use operators::loosely_equal;

/// The outcome of evaluating one rule.
#[derive(Debug, Clone)]
pub struct RuleEvaluationResult<'r> {
    pub rule: &'r ConditionalRule,
    /// Whether the rule's condition held. Always `false` for inactive or broken rules.
    pub triggered: bool,
    /// Why the rule did not (or could not fully) evaluate, if anything went wrong.
    pub error_message: Option<String>,
    /// A human-readable explanation of the evaluated condition.
    pub reason: String,
}

/// Evaluates conditions and rule sets against live form data.
///
/// The evaluator holds no per-call state, so one instance can be shared across
/// threads and sessions.
pub struct RuleEvaluator {
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEvaluator {
    /// Creates an evaluator that reports diagnostics through `tracing`.
    pub fn new() -> Self {
        Self {
            sink: default_sink(),
        }
    }

    pub fn with_sink(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    /// Evaluates a condition tree. Malformed nodes and failed comparisons count as `false`.
    pub fn evaluate(&self, condition: &Condition, data: &WorkflowFormData) -> bool {
        self.trace(condition, data).get_outcome()
    }

    /// Evaluates a condition tree and returns the full evaluation trace.
    pub fn trace(&self, condition: &Condition, data: &WorkflowFormData) -> EvaluationTrace {
        ConditionEngine::new(data, self.sink.as_ref()).evaluate(condition)
    }

    /// Evaluates a single rule.
    ///
    /// This never fails: an inactive rule, a rule without a usable target or a rule
    /// whose leaves fail to compare is reported through `triggered` and
    /// `error_message` instead.
    pub fn evaluate_rule<'r>(
        &self,
        rule: &'r ConditionalRule,
        data: &WorkflowFormData,
    ) -> RuleEvaluationResult<'r> {
        if !rule.is_active {
            return RuleEvaluationResult {
                rule,
                triggered: false,
                error_message: Some(RuleError::Inactive(rule.id.clone()).to_string()),
                reason: "Rule is inactive".to_string(),
            };
        }

        if let Err(e) = rule.target() {
            self.sink.record(Diagnostic::warning(DiagnosticKind::RuleFailure, e.to_string()));
            return RuleEvaluationResult {
                rule,
                triggered: false,
                error_message: Some(e.to_string()),
                reason: "Rule was not evaluated".to_string(),
            };
        }

        let trace = self.trace(&rule.condition, data);
        let failures = trace.failures();
        let error_message = if failures.is_empty() {
            None
        } else {
            Some(failures.iter().join("; "))
        };

        RuleEvaluationResult {
            rule,
            triggered: trace.get_outcome(),
            error_message,
            reason: TraceFormatter::format_trace(&trace),
        }
    }

    /// Evaluates every active rule in ascending priority order and returns the ones
    /// that triggered, in that order.
    ///
    /// Rules with equal priority keep their input order. Callers apply the effects in
    /// the returned order, so a later rule overrides an earlier one on the same target.
    pub fn evaluate_rules<'r>(
        &self,
        rules: &'r [ConditionalRule],
        data: &WorkflowFormData,
    ) -> Vec<RuleEvaluationResult<'r>> {
        rules
            .iter()
            .filter(|rule| rule.is_active)
            .sorted_by_key(|rule| rule.priority)
            .map(|rule| self.evaluate_rule(rule, data))
            .filter(|result| result.triggered)
            .collect()
    }
}
