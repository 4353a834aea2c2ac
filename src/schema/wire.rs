//! Persisted JSON shapes of schemas and rules.
//!
//! Stored definitions come from several producers, so every field accepts its
//! snake_case, camelCase and PascalCase spelling, and enums accept either their
//! name or their numeric index. The `Raw*` types only describe the wire shape;
//! conversion into the engine types happens through `TryFrom`.

use super::{FieldOption, FormFieldSchema, ModuleSchema, WorkflowSchema, WorkflowStep};
use crate::ast::{Condition, ConditionOperator, LogicalOp, Value};
use crate::error::ConversionError;
use crate::rules::{ConditionalRule, DEFAULT_PRIORITY, RuleAction};
use serde::{Deserialize, Serialize};

/// A stored condition node. Either a leaf (`field` + `operator`) or a group
/// (`logical_op` + `conditions`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCondition {
    #[serde(default, alias = "Field")]
    pub field: Option<String>,
    #[serde(default, alias = "Operator")]
    pub operator: Option<serde_json::Value>,
    #[serde(default, alias = "Value")]
    pub value: serde_json::Value,
    #[serde(default, alias = "logicalOp", alias = "LogicalOp", alias = "logicalOperator")]
    pub logical_op: Option<serde_json::Value>,
    #[serde(default, alias = "Conditions")]
    pub conditions: Vec<RawCondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRule {
    #[serde(default, alias = "Id")]
    pub id: String,
    #[serde(alias = "Action")]
    pub action: serde_json::Value,
    #[serde(default, alias = "Condition")]
    pub condition: Option<RawCondition>,
    #[serde(default, alias = "targetFieldId", alias = "TargetFieldId")]
    pub target_field_id: Option<String>,
    #[serde(default, alias = "targetStepNumber", alias = "TargetStepNumber")]
    pub target_step_number: Option<u32>,
    #[serde(default, alias = "targetModuleKey", alias = "TargetModuleKey")]
    pub target_module_key: Option<String>,
    #[serde(default = "default_priority", alias = "Priority")]
    pub priority: i32,
    #[serde(default = "default_active", alias = "isActive", alias = "IsActive")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOption {
    #[serde(default, alias = "Value")]
    pub value: String,
    #[serde(default, alias = "Label", alias = "text", alias = "Text")]
    pub label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawField {
    #[serde(default, alias = "Id", alias = "fieldId", alias = "FieldId")]
    pub id: String,
    #[serde(default, alias = "parentId", alias = "ParentId")]
    pub parent_id: Option<String>,
    #[serde(default, alias = "Order", alias = "displayOrder", alias = "DisplayOrder")]
    pub order: i32,
    #[serde(default, alias = "Label", alias = "name", alias = "Name")]
    pub label: String,
    #[serde(default, alias = "fieldType", alias = "FieldType", alias = "type", alias = "Type")]
    pub field_type: String,
    #[serde(default, alias = "isRequired", alias = "IsRequired")]
    pub is_required: bool,
    #[serde(default, alias = "codeSetId", alias = "CodeSetId")]
    pub code_set_id: Option<serde_json::Value>,
    #[serde(default, alias = "Options")]
    pub options: Vec<RawOption>,
    #[serde(default, alias = "conditionalRules", alias = "ConditionalRules")]
    pub conditional_rules: Vec<RawRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawModule {
    #[serde(default, alias = "Key", alias = "moduleKey", alias = "ModuleKey")]
    pub key: String,
    #[serde(default, alias = "Fields")]
    pub fields: Vec<RawField>,
    #[serde(default, alias = "Rules", alias = "conditionalRules", alias = "ConditionalRules")]
    pub rules: Vec<RawRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStep {
    #[serde(default, alias = "moduleKey", alias = "ModuleKey")]
    pub module_key: String,
    #[serde(default, alias = "Title")]
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWorkflow {
    #[serde(default, alias = "Key", alias = "workflowKey", alias = "WorkflowKey")]
    pub key: String,
    #[serde(default, alias = "Steps")]
    pub steps: Vec<RawStep>,
    #[serde(default, alias = "workflowRules", alias = "WorkflowRules")]
    pub workflow_rules: Vec<RawRule>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn default_active() -> bool {
    true
}

/// Reads an enum that may be stored as its name or as its numeric index.
fn enum_from_json<T: Copy>(
    value: &serde_json::Value,
    all: &[T],
    parse: impl Fn(&str) -> Result<T, ConversionError>,
    invalid: impl Fn(String) -> ConversionError,
) -> Result<T, ConversionError> {
    match value {
        serde_json::Value::String(s) => parse(s),
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|index| all.get(index as usize).copied())
            .ok_or_else(|| invalid(n.to_string())),
        other => Err(invalid(other.to_string())),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

const LOGICAL_OPS: [LogicalOp; 3] = [LogicalOp::And, LogicalOp::Or, LogicalOp::Not];

impl TryFrom<RawCondition> for Condition {
    type Error = ConversionError;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        let operator = raw
            .operator
            .as_ref()
            .filter(|op| !op.is_null())
            .map(|op| {
                enum_from_json(
                    op,
                    &ConditionOperator::ALL,
                    str::parse,
                    ConversionError::InvalidOperator,
                )
            })
            .transpose()?;
        let logical_op = raw
            .logical_op
            .as_ref()
            .filter(|op| !op.is_null())
            .map(|op| {
                enum_from_json(
                    op,
                    &LOGICAL_OPS,
                    str::parse,
                    ConversionError::InvalidLogicalOp,
                )
            })
            .transpose()?;
        let field = non_blank(raw.field);

        // A node with both shapes is read as a leaf. A node with neither becomes an
        // empty group, which the evaluator reports as malformed.
        match (field, operator, logical_op) {
            (Some(field), Some(operator), _) => Ok(Condition::Leaf {
                field,
                operator,
                value: Value::from_json(raw.value),
            }),
            (None, Some(operator), None) => Ok(Condition::Leaf {
                field: String::new(),
                operator,
                value: Value::from_json(raw.value),
            }),
            (_, _, logical_op) => Ok(Condition::Group {
                logical_op: logical_op.unwrap_or(LogicalOp::And),
                conditions: raw
                    .conditions
                    .into_iter()
                    .map(Condition::try_from)
                    .collect::<Result<_, _>>()?,
            }),
        }
    }
}

impl From<&Condition> for RawCondition {
    fn from(condition: &Condition) -> Self {
        match condition {
            Condition::Leaf {
                field,
                operator,
                value,
            } => RawCondition {
                field: Some(field.clone()),
                operator: Some(serde_json::Value::String(format!("{:?}", operator))),
                value: value.to_json(),
                ..RawCondition::default()
            },
            Condition::Group {
                logical_op,
                conditions,
            } => RawCondition {
                logical_op: Some(serde_json::Value::String(logical_op.to_string())),
                conditions: conditions.iter().map(RawCondition::from).collect(),
                ..RawCondition::default()
            },
        }
    }
}

impl TryFrom<RawRule> for ConditionalRule {
    type Error = ConversionError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let action = enum_from_json(
            &raw.action,
            &RuleAction::ALL,
            str::parse,
            ConversionError::UnknownAction,
        )?;
        let condition = match raw.condition {
            Some(condition) => Condition::try_from(condition)?,
            None => Condition::and(vec![]),
        };

        Ok(ConditionalRule {
            id: raw.id,
            action,
            condition,
            target_field_id: non_blank(raw.target_field_id),
            target_step_number: raw.target_step_number,
            target_module_key: non_blank(raw.target_module_key),
            priority: raw.priority,
            is_active: raw.is_active,
        })
    }
}

impl From<&ConditionalRule> for RawRule {
    fn from(rule: &ConditionalRule) -> Self {
        RawRule {
            id: rule.id.clone(),
            action: serde_json::Value::String(rule.action.tag().to_string()),
            condition: Some(RawCondition::from(&rule.condition)),
            target_field_id: rule.target_field_id.clone(),
            target_step_number: rule.target_step_number,
            target_module_key: rule.target_module_key.clone(),
            priority: rule.priority,
            is_active: rule.is_active,
        }
    }
}

impl TryFrom<RawField> for FormFieldSchema {
    type Error = ConversionError;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let code_set_id = match raw.code_set_id {
            Some(serde_json::Value::String(s)) => non_blank(Some(s)),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Ok(FormFieldSchema {
            id: raw.id,
            parent_id: non_blank(raw.parent_id),
            order: raw.order,
            label: raw.label,
            field_type: raw.field_type,
            is_required: raw.is_required,
            code_set_id,
            options: raw
                .options
                .into_iter()
                .map(|o| FieldOption::new(o.value, o.label))
                .collect(),
            conditional_rules: raw
                .conditional_rules
                .into_iter()
                .map(ConditionalRule::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl From<&FormFieldSchema> for RawField {
    fn from(field: &FormFieldSchema) -> Self {
        RawField {
            id: field.id.clone(),
            parent_id: field.parent_id.clone(),
            order: field.order,
            label: field.label.clone(),
            field_type: field.field_type.clone(),
            is_required: field.is_required,
            code_set_id: field.code_set_id.clone().map(serde_json::Value::String),
            options: field
                .options
                .iter()
                .map(|o| RawOption {
                    value: o.value.clone(),
                    label: o.label.clone(),
                })
                .collect(),
            conditional_rules: field.conditional_rules.iter().map(RawRule::from).collect(),
        }
    }
}

impl TryFrom<RawModule> for ModuleSchema {
    type Error = ConversionError;

    fn try_from(raw: RawModule) -> Result<Self, Self::Error> {
        Ok(ModuleSchema {
            key: raw.key,
            fields: convert_all(raw.fields)?,
            rules: convert_all(raw.rules)?,
        })
    }
}

impl From<&ModuleSchema> for RawModule {
    fn from(module: &ModuleSchema) -> Self {
        RawModule {
            key: module.key.clone(),
            fields: module.fields.iter().map(RawField::from).collect(),
            rules: module.rules.iter().map(RawRule::from).collect(),
        }
    }
}

impl TryFrom<RawWorkflow> for WorkflowSchema {
    type Error = ConversionError;

    fn try_from(raw: RawWorkflow) -> Result<Self, Self::Error> {
        Ok(WorkflowSchema {
            key: raw.key,
            steps: raw
                .steps
                .into_iter()
                .map(|s| WorkflowStep {
                    module_key: s.module_key,
                    title: s.title,
                })
                .collect(),
            workflow_rules: convert_all(raw.workflow_rules)?,
        })
    }
}

fn convert_all<R, T>(raw: Vec<R>) -> Result<Vec<T>, ConversionError>
where
    T: TryFrom<R, Error = ConversionError>,
{
    raw.into_iter().map(T::try_from).collect()
}

fn from_json_str<R, T>(json: &str) -> Result<T, ConversionError>
where
    R: serde::de::DeserializeOwned,
    T: TryFrom<R, Error = ConversionError>,
{
    let raw: R = serde_json::from_str(json).map_err(|e| ConversionError::Json(e.to_string()))?;
    T::try_from(raw)
}

/// Parses a module definition (`{"key": .., "fields": [..], "rules": [..]}`).
pub fn parse_module(json: &str) -> Result<ModuleSchema, ConversionError> {
    from_json_str::<RawModule, _>(json)
}

/// Parses a workflow definition with its steps and step-level rules.
pub fn parse_workflow(json: &str) -> Result<WorkflowSchema, ConversionError> {
    from_json_str::<RawWorkflow, _>(json)
}

/// Parses a bare JSON array of field definitions.
pub fn parse_fields(json: &str) -> Result<Vec<FormFieldSchema>, ConversionError> {
    let raw: Vec<RawField> =
        serde_json::from_str(json).map_err(|e| ConversionError::Json(e.to_string()))?;
    convert_all(raw)
}

/// Parses a bare JSON array of rules.
pub fn parse_rules(json: &str) -> Result<Vec<ConditionalRule>, ConversionError> {
    let raw: Vec<RawRule> =
        serde_json::from_str(json).map_err(|e| ConversionError::Json(e.to_string()))?;
    convert_all(raw)
}

/// Parses a single stored condition tree.
pub fn parse_condition(json: &str) -> Result<Condition, ConversionError> {
    from_json_str::<RawCondition, _>(json)
}

/// Writes field definitions back to pretty-printed JSON.
pub fn fields_to_json(fields: &[FormFieldSchema]) -> Result<String, ConversionError> {
    let raw: Vec<RawField> = fields.iter().map(RawField::from).collect();
    serde_json::to_string_pretty(&raw).map_err(|e| ConversionError::Json(e.to_string()))
}

pub fn module_to_json(module: &ModuleSchema) -> Result<String, ConversionError> {
    serde_json::to_string_pretty(&RawModule::from(module))
        .map_err(|e| ConversionError::Json(e.to_string()))
}
