use crate::ast::Condition;
use crate::error::{ConversionError, RuleError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod artifact;
mod validation;

pub use artifact::*;
pub use validation::*;

/// Priority given to rules that do not specify one. Lower runs first.
pub const DEFAULT_PRIORITY: i32 = 100;

/// The effect a rule has when its condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleAction {
    Show,
    Hide,
    Enable,
    Disable,
    SetRequired,
    SetOptional,
    SkipStep,
    GoToStep,
    CompleteWorkflow,
}

impl RuleAction {
    pub const ALL: [RuleAction; 9] = [
        RuleAction::Show,
        RuleAction::Hide,
        RuleAction::Enable,
        RuleAction::Disable,
        RuleAction::SetRequired,
        RuleAction::SetOptional,
        RuleAction::SkipStep,
        RuleAction::GoToStep,
        RuleAction::CompleteWorkflow,
    ];

    /// The persisted string tag, e.g. `"setRequired"`.
    pub fn tag(self) -> &'static str {
        match self {
            RuleAction::Show => "show",
            RuleAction::Hide => "hide",
            RuleAction::Enable => "enable",
            RuleAction::Disable => "disable",
            RuleAction::SetRequired => "setRequired",
            RuleAction::SetOptional => "setOptional",
            RuleAction::SkipStep => "skipStep",
            RuleAction::GoToStep => "goToStep",
            RuleAction::CompleteWorkflow => "completeWorkflow",
        }
    }

    pub fn is_field_level(self) -> bool {
        !self.is_workflow_level()
    }

    pub fn is_workflow_level(self) -> bool {
        matches!(
            self,
            RuleAction::SkipStep | RuleAction::GoToStep | RuleAction::CompleteWorkflow
        )
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for RuleAction {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConversionError::UnknownAction(s.to_string()))
    }
}

/// What a rule acts upon, derived from its action and target fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    Field(String),
    Step(u32),
    Module(String),
    Workflow,
}

/// A `(condition, action)` pair owned by a module or workflow schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub id: String,
    pub action: RuleAction,
    pub condition: Condition,
    pub target_field_id: Option<String>,
    pub target_step_number: Option<u32>,
    pub target_module_key: Option<String>,
    pub priority: i32,
    pub is_active: bool,
}

impl ConditionalRule {
    pub fn new(id: impl Into<String>, action: RuleAction, condition: Condition) -> Self {
        Self {
            id: id.into(),
            action,
            condition,
            target_field_id: None,
            target_step_number: None,
            target_module_key: None,
            priority: DEFAULT_PRIORITY,
            is_active: true,
        }
    }

    pub fn with_target_field(mut self, field_id: impl Into<String>) -> Self {
        self.target_field_id = Some(field_id.into());
        self
    }

    pub fn with_target_step(mut self, step_number: u32) -> Self {
        self.target_step_number = Some(step_number);
        self
    }

    pub fn with_target_module(mut self, module_key: impl Into<String>) -> Self {
        self.target_module_key = Some(module_key.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Resolves which target field is relevant for this rule's action.
    ///
    /// Step actions prefer `target_step_number` and fall back to `target_module_key`.
    pub fn target(&self) -> Result<RuleTarget, RuleError> {
        let missing = || RuleError::MissingTarget {
            rule_id: self.id.clone(),
            action: self.action.to_string(),
        };

        match self.action {
            RuleAction::CompleteWorkflow => Ok(RuleTarget::Workflow),
            RuleAction::SkipStep | RuleAction::GoToStep => {
                if let Some(step) = self.target_step_number {
                    Ok(RuleTarget::Step(step))
                } else {
                    self.target_module_key
                        .as_deref()
                        .filter(|key| !key.trim().is_empty())
                        .map(|key| RuleTarget::Module(key.to_string()))
                        .ok_or_else(missing)
                }
            }
            _ => self
                .target_field_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .map(|id| RuleTarget::Field(id.to_string()))
                .ok_or_else(missing),
        }
    }
}
