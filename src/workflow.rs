//! Step navigation for multi-step workflows.

use crate::data::WorkflowFormData;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::evaluator::RuleEvaluator;
use crate::rules::{RuleAction, RuleTarget};
use crate::schema::WorkflowSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Where a workflow session is. Steps are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowState {
    NotStarted,
    InStep(u32),
    Completed,
}

impl WorkflowState {
    fn current_step(self) -> u32 {
        match self {
            WorkflowState::InStep(n) => n,
            _ => 0,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::NotStarted => write!(f, "not started"),
            WorkflowState::InStep(n) => write!(f, "step {}", n),
            WorkflowState::Completed => write!(f, "completed"),
        }
    }
}

/// The outcome of one `next_state` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowTransition {
    pub from: WorkflowState,
    pub next: WorkflowState,
    /// Ids of the triggered workflow rules that shaped this transition, in the
    /// order they were applied.
    pub applied_rules: Vec<String>,
    /// Step numbers marked as skipped by triggered `skipStep` rules.
    pub skipped_steps: BTreeSet<u32>,
}

/// Computes forward transitions of a `WorkflowSchema`.
pub struct WorkflowNavigator<'s> {
    schema: &'s WorkflowSchema,
    evaluator: RuleEvaluator,
}

impl<'s> WorkflowNavigator<'s> {
    pub fn new(schema: &'s WorkflowSchema) -> Self {
        Self {
            schema,
            evaluator: RuleEvaluator::new(),
        }
    }

    pub fn with_evaluator(mut self, evaluator: RuleEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn step_count(&self) -> u32 {
        self.schema.steps.len() as u32
    }

    /// Module keys the workflow rules read from, so the caller knows which
    /// completed steps to load into the data snapshot.
    pub fn referenced_modules(&self) -> BTreeSet<String> {
        self.schema
            .workflow_rules
            .iter()
            .flat_map(|rule| rule.condition.referenced_modules())
            .collect()
    }

    pub fn start(&self, data: &WorkflowFormData) -> WorkflowTransition {
        self.next_state(WorkflowState::NotStarted, data)
    }

    /// Decides the state that follows `current` given everything entered so far.
    ///
    /// Triggered workflow rules apply in priority order. `goToStep` moves the
    /// candidate forward (the last one wins), `skipStep` marks steps to pass over
    /// and `completeWorkflow` ends the workflow. Targets that are behind the
    /// current step or do not exist are ignored.
    pub fn next_state(
        &self,
        current: WorkflowState,
        data: &WorkflowFormData,
    ) -> WorkflowTransition {
        let mut transition = WorkflowTransition {
            from: current,
            next: WorkflowState::Completed,
            applied_rules: Vec::new(),
            skipped_steps: BTreeSet::new(),
        };
        let step = current.current_step();
        let total = self.step_count();
        // A step past the end has nothing left to navigate to.
        if current == WorkflowState::Completed || step > total {
            return transition;
        }

        let mut candidate = step.saturating_add(1);
        let mut complete = false;

        for result in self.evaluator.evaluate_rules(&self.schema.workflow_rules, data) {
            let rule = result.rule;
            match rule.action {
                RuleAction::CompleteWorkflow => complete = true,
                RuleAction::GoToStep => match self.resolve_step(rule.target().ok()) {
                    Some(target) if target > step && target <= total => candidate = target,
                    target => {
                        self.ignore(
                            &rule.id,
                            format!("goToStep target {:?} is not ahead of step {}", target, step),
                        );
                        continue;
                    }
                },
                RuleAction::SkipStep => match self.resolve_step(rule.target().ok()) {
                    Some(target) if target >= 1 && target <= total => {
                        transition.skipped_steps.insert(target);
                    }
                    target => {
                        self.ignore(
                            &rule.id,
                            format!("skipStep target {:?} does not exist", target),
                        );
                        continue;
                    }
                },
                _ => {
                    self.evaluator.sink().record(Diagnostic::debug(
                        DiagnosticKind::IgnoredEffect,
                        format!("Field rule '{}' has no effect on navigation", rule.id),
                    ));
                    continue;
                }
            }
            transition.applied_rules.push(rule.id.clone());
        }

        while transition.skipped_steps.contains(&candidate) {
            candidate = candidate.saturating_add(1);
        }

        transition.next = if complete || candidate > total {
            WorkflowState::Completed
        } else {
            WorkflowState::InStep(candidate)
        };
        transition
    }

    fn resolve_step(&self, target: Option<RuleTarget>) -> Option<u32> {
        match target? {
            RuleTarget::Step(n) => Some(n),
            RuleTarget::Module(key) => self.schema.step_number_of(&key),
            RuleTarget::Field(_) | RuleTarget::Workflow => None,
        }
    }

    fn ignore(&self, rule_id: &str, reason: String) {
        self.evaluator.sink().record(Diagnostic::warning(
            DiagnosticKind::IgnoredNavigation,
            format!("Rule '{}' ignored: {}", rule_id, reason),
        ));
    }
}
