//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need to load definitions, build hierarchies
//! and evaluate rules.
//!
//! # Example
//!
//! ```rust,no_run
//! use jouken::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let module = parse_module(&std::fs::read_to_string("path/to/module.json")?)?;
//! let data = WorkflowFormData::from_file("path/to/data.json", &module.key)?;
//!
//! let evaluator = RuleEvaluator::new();
//! for result in evaluator.evaluate_rules(&module.all_rules(), &data) {
//!     println!("{} -> {}", result.rule.id, result.reason);
//! }
//! # Ok(())
//! # }
//! ```

// Conditions and values
pub use crate::ast::{Condition, ConditionOperator, EvaluationTrace, LogicalOp, Value};
pub use crate::reference::FieldReference;

// Evaluation
pub use crate::data::WorkflowFormData;
pub use crate::evaluator::{RuleEvaluationResult, RuleEvaluator};
pub use crate::rules::{CompiledRuleSet, ConditionalRule, RuleAction, RuleTarget};
pub use crate::trace::TraceFormatter;

// Schemas and hierarchy
pub use crate::codeset::{CodeSetProvider, StaticCodeSetProvider};
pub use crate::hierarchy::{
    FieldHierarchy, FormFieldNode, HierarchyBuilder, HierarchyMetrics, calculate_metrics,
    fix_hierarchy_issues, validate_hierarchy,
};
pub use crate::schema::wire::{parse_fields, parse_module, parse_rules, parse_workflow};
pub use crate::schema::{FieldOption, FormFieldSchema, ModuleSchema, WorkflowSchema, WorkflowStep};

// Runtime application
pub use crate::runtime::{FieldState, FieldStates, missing_required_fields};
pub use crate::workflow::{WorkflowNavigator, WorkflowState, WorkflowTransition};

// Diagnostics and errors
pub use crate::diagnostics::{CollectingSink, DiagnosticKind, DiagnosticSink, TracingSink};
pub use crate::error::{EvaluationError, HierarchyIssue};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
