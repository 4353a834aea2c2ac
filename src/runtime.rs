//! Applies triggered field-level rules to produce the live state of a form.

use crate::data::WorkflowFormData;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::evaluator::{RuleEvaluationResult, RuleEvaluator};
use crate::hierarchy::FieldHierarchy;
use crate::rules::{ConditionalRule, RuleAction, RuleTarget};
use crate::schema::FormFieldSchema;
use ahash::AHashMap;
use serde::Serialize;

/// The rule-controlled flags of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldState {
    pub visible: bool,
    pub enabled: bool,
    pub required: bool,
}

impl FieldState {
    fn from_schema(schema: &FormFieldSchema) -> Self {
        Self {
            visible: true,
            enabled: true,
            required: schema.is_required,
        }
    }
}

/// Per-field state after rule effects have been applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldStates {
    states: AHashMap<String, FieldState>,
}

impl FieldStates {
    /// Schema defaults: every field visible and enabled, required as declared.
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = &'a FormFieldSchema>) -> Self {
        let mut states = AHashMap::new();
        for field in fields {
            states
                .entry(field.id.clone())
                .or_insert_with(|| FieldState::from_schema(field));
        }
        Self { states }
    }

    pub fn from_hierarchy(hierarchy: &FieldHierarchy) -> Self {
        Self::from_fields(hierarchy.nodes().iter().map(|n| &n.schema))
    }

    /// Evaluates `rules` against `data` and applies the triggered ones on top of
    /// the schema defaults.
    pub fn evaluate(
        fields: &[FormFieldSchema],
        rules: &[ConditionalRule],
        evaluator: &RuleEvaluator,
        data: &WorkflowFormData,
    ) -> Self {
        let mut states = Self::from_fields(fields);
        let triggered = evaluator.evaluate_rules(rules, data);
        states.apply(&triggered, evaluator.sink().as_ref());
        states
    }

    pub fn get(&self, field_id: &str) -> Option<FieldState> {
        self.states.get(field_id).copied()
    }

    /// Whether the field itself is shown. Unknown fields count as visible.
    pub fn is_visible(&self, field_id: &str) -> bool {
        self.get(field_id).is_none_or(|s| s.visible)
    }

    pub fn is_enabled(&self, field_id: &str) -> bool {
        self.get(field_id).is_none_or(|s| s.enabled)
    }

    pub fn is_required(&self, field_id: &str) -> bool {
        self.get(field_id).is_some_and(|s| s.required)
    }

    /// Applies triggered results in the given order. A later result overwrites an
    /// earlier one on the same field.
    pub fn apply(&mut self, results: &[RuleEvaluationResult<'_>], sink: &dyn DiagnosticSink) {
        for result in results.iter().filter(|r| r.triggered) {
            let rule = result.rule;
            if rule.action.is_workflow_level() {
                sink.record(Diagnostic::debug(
                    DiagnosticKind::IgnoredEffect,
                    format!(
                        "Rule '{}' ({}) is a workflow rule and has no field effect",
                        rule.id, rule.action
                    ),
                ));
                continue;
            }

            let Ok(RuleTarget::Field(field_id)) = rule.target() else {
                continue;
            };
            let Some(state) = self.states.get_mut(&field_id) else {
                sink.record(Diagnostic::warning(
                    DiagnosticKind::IgnoredEffect,
                    format!("Rule '{}' targets unknown field '{}'", rule.id, field_id),
                ));
                continue;
            };

            match rule.action {
                RuleAction::Show => state.visible = true,
                RuleAction::Hide => state.visible = false,
                RuleAction::Enable => state.enabled = true,
                RuleAction::Disable => state.enabled = false,
                RuleAction::SetRequired => state.required = true,
                RuleAction::SetOptional => state.required = false,
                RuleAction::SkipStep | RuleAction::GoToStep | RuleAction::CompleteWorkflow => {}
            }
        }
    }
}

/// Walks the hierarchy in display order and returns the ids of fields that are
/// shown, required and still empty in the current module.
///
/// A field is shown only if it and all of its ancestors are visible.
pub fn missing_required_fields(
    hierarchy: &FieldHierarchy,
    states: &FieldStates,
    data: &WorkflowFormData,
) -> Vec<String> {
    let module = data.current_module();
    hierarchy
        .traverse()
        .into_iter()
        .filter(|id| {
            let node = hierarchy.node(*id);
            states.is_required(node.id())
                && states.is_visible(node.id())
                && hierarchy
                    .ancestors(*id)
                    .all(|a| states.is_visible(hierarchy.node(a).id()))
        })
        .map(|id| hierarchy.node(id).id())
        .filter(|field_id| data.get(module, field_id).is_none_or(|v| v.is_empty()))
        .map(str::to_string)
        .collect()
}
