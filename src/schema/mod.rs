use crate::rules::ConditionalRule;
use serde::{Deserialize, Serialize};

pub mod wire;

/// A selectable option of a choice field, typically expanded from a code set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// One field definition of a module's flat field list.
///
/// Only `id`, `parent_id` and `order` drive the hierarchy. The rest is display and
/// validation metadata passed through for the caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormFieldSchema {
    pub id: String,
    pub parent_id: Option<String>,
    pub order: i32,
    pub label: String,
    pub field_type: String,
    pub is_required: bool,
    pub code_set_id: Option<String>,
    pub options: Vec<FieldOption>,
    pub conditional_rules: Vec<ConditionalRule>,
}

impl FormFieldSchema {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = field_type.into();
        self
    }

    pub fn with_code_set(mut self, code_set_id: impl Into<String>) -> Self {
        self.code_set_id = Some(code_set_id.into());
        self
    }

    pub fn with_rule(mut self, rule: ConditionalRule) -> Self {
        self.conditional_rules.push(rule);
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// The parent id, treating blank strings as "no parent".
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn is_conditional(&self) -> bool {
        !self.conditional_rules.is_empty()
    }
}

/// One step of a workflow: a module with its own fields and field-level rules.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleSchema {
    pub key: String,
    pub fields: Vec<FormFieldSchema>,
    pub rules: Vec<ConditionalRule>,
}

impl ModuleSchema {
    /// Field-level rules declared on the module plus those attached to individual fields.
    pub fn all_rules(&self) -> Vec<ConditionalRule> {
        self.rules
            .iter()
            .chain(self.fields.iter().flat_map(|f| f.conditional_rules.iter()))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub module_key: String,
    pub title: String,
}

/// An ordered sequence of module steps with step-level navigation rules.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowSchema {
    pub key: String,
    pub steps: Vec<WorkflowStep>,
    pub workflow_rules: Vec<ConditionalRule>,
}

impl WorkflowSchema {
    /// The 1-based step number of the step that hosts `module_key`.
    pub fn step_number_of(&self, module_key: &str) -> Option<u32> {
        self.steps
            .iter()
            .position(|step| step.module_key == module_key)
            .map(|index| index as u32 + 1)
    }

    pub fn step(&self, step_number: u32) -> Option<&WorkflowStep> {
        step_number
            .checked_sub(1)
            .and_then(|index| self.steps.get(index as usize))
    }
}
