//! # Jouken - Conditional Rules and Field Hierarchies for Dynamic Forms
//!
//! **Jouken** decides, at runtime, what a multi-step form looks like. Authors attach
//! conditional rules to fields and workflow steps; the engine evaluates those rules
//! against the values a user has entered so far and reports which ones fire. It
//! also turns a module's flat field list into a display-ordered tree and measures
//! how complex that tree is.
//!
//! ## Core Workflow
//!
//! 1.  **Load Definitions**: Parse persisted modules, workflows and rules with the
//!     functions in [`schema::wire`], or build them in code.
//! 2.  **Build the Tree**: `HierarchyBuilder` links fields by `parent_id`, tolerating
//!     orphans and reporting them through a `DiagnosticSink`.
//! 3.  **Evaluate**: `RuleEvaluator::evaluate_rules` returns the triggered rules in
//!     priority order. Apply them with `FieldStates` for field effects or
//!     `WorkflowNavigator` for step transitions.
//!
//! Evaluation never fails as a whole. Malformed conditions, type mismatches and
//! rules without a target evaluate to `false` and are reported to the sink.
//!
//! ## Quick Start
//!
//! ```rust
//! use jouken::prelude::*;
//!
//! let fields = vec![
//!     FormFieldSchema::new("age").with_order(1),
//!     FormFieldSchema::new("guardian").with_order(2),
//!     FormFieldSchema::new("parentalConsent").with_parent("guardian").required(),
//! ];
//! let rules = vec![
//!     ConditionalRule::new(
//!         "consent-for-minors",
//!         RuleAction::Show,
//!         Condition::leaf("age", ConditionOperator::LessThan, 18),
//!     )
//!     .with_target_field("parentalConsent"),
//! ];
//!
//! let hierarchy = HierarchyBuilder::new(fields).build();
//! let evaluator = RuleEvaluator::new();
//!
//! let data = WorkflowFormData::for_module("Applicant", [("age", 16)]);
//! let triggered = evaluator.evaluate_rules(&rules, &data);
//! assert_eq!(triggered.len(), 1);
//! assert_eq!(triggered[0].reason, "$age (was 16) < 18");
//!
//! let states = FieldStates::from_hierarchy(&hierarchy);
//! let missing = missing_required_fields(&hierarchy, &states, &data);
//! assert_eq!(missing, vec!["parentalConsent".to_string()]);
//! ```

pub mod ast;
pub mod codeset;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod hierarchy;
pub mod prelude;
pub mod reference;
pub mod rules;
pub mod runtime;
pub mod schema;
pub mod trace;
pub mod workflow;
