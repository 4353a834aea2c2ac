//! Tests for hierarchy building, validation, repair and metrics.
mod common;
use common::*;
use jouken::error::CodeSetError;
use jouken::prelude::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn field(id: &str, parent: Option<&str>) -> FormFieldSchema {
    match parent {
        Some(p) => FormFieldSchema::new(id).with_parent(p),
        None => FormFieldSchema::new(id),
    }
}

#[test]
fn test_orphan_is_demoted_to_root_with_one_warning() {
    let sink = CollectingSink::new();
    let hierarchy = HierarchyBuilder::new(vec![
        field("a", None),
        field("b", Some("a")),
        field("c", Some("missing")),
    ])
    .with_sink(sink.clone())
    .build();

    let roots: Vec<&str> = hierarchy
        .roots()
        .iter()
        .map(|id| hierarchy.node(*id).id())
        .collect();
    assert_eq!(roots, vec!["a", "c"]);

    let a = hierarchy.id_of("a").unwrap();
    let children: Vec<&str> = hierarchy.children(a).map(|n| n.id()).collect();
    assert_eq!(children, vec!["b"]);

    assert_eq!(
        hierarchy.warnings(),
        &[HierarchyIssue::OrphanedParent {
            id: "c".into(),
            parent_id: "missing".into()
        }]
    );
    assert_eq!(sink.count(DiagnosticKind::OrphanedParent), 1);
    assert_eq!(sink.diagnostics().len(), 1);
}

#[test]
fn test_parent_declared_after_child() {
    let hierarchy = HierarchyBuilder::new(vec![
        field("leaf", Some("mid")).with_order(1),
        field("mid", Some("top")).with_order(1),
        field("top", None).with_order(1),
    ])
    .build();

    assert_eq!(hierarchy.field_ids(), vec!["top", "mid", "leaf"]);
    assert_eq!(hierarchy.get("leaf").unwrap().level, 2);
    assert_eq!(hierarchy.max_depth(), 2);
    assert!(hierarchy.warnings().is_empty());
}

#[test]
fn test_roots_sorted_by_order() {
    let hierarchy = HierarchyBuilder::new(vec![
        field("third", None).with_order(30),
        field("first", None).with_order(10),
        field("second", None).with_order(20),
    ])
    .build();
    assert_eq!(hierarchy.field_ids(), vec!["first", "second", "third"]);
}

#[test]
fn test_self_reference_validation_and_fix() {
    let fields = vec![field("x", Some("x"))];

    let validation = validate_hierarchy(&fields);
    assert_eq!(
        validation.errors,
        vec![HierarchyIssue::SelfReference { id: "x".into() }]
    );
    assert!(validation.warnings.is_empty());

    let fixed = fix_hierarchy_issues(&fields);
    assert_eq!(fixed.len(), 1);
    assert_eq!(fixed[0].id, "x");
    assert_eq!(fixed[0].parent_id, None);
    assert!(validate_hierarchy(&fixed).errors.is_empty());
}

#[test]
fn test_validation_reports_orphans_as_warnings() {
    let fields = vec![field("a", None), field("b", Some("ghost"))];
    let validation = validate_hierarchy(&fields);

    assert!(validation.is_valid());
    assert_eq!(
        validation.warnings,
        vec![HierarchyIssue::OrphanedParent {
            id: "b".into(),
            parent_id: "ghost".into()
        }]
    );
}

#[test]
fn test_validation_does_not_mutate_and_fix_is_deterministic() {
    let fields = vec![
        field("a", None),
        field("b", Some("ghost")),
        field("c", Some("c")),
        field("d", Some("a")),
    ];
    let before = fields.clone();
    let _ = validate_hierarchy(&fields);
    assert_eq!(fields, before);

    let fixed = fix_hierarchy_issues(&fields);
    assert_eq!(fixed, fix_hierarchy_issues(&fields));
    assert_eq!(fixed[3].parent_id.as_deref(), Some("a"));
    let validation = validate_hierarchy(&fixed);
    assert!(validation.errors.is_empty());
    assert!(validation.warnings.is_empty());
}

#[test]
fn test_metrics_for_empty_and_single_field() {
    assert_eq!(calculate_metrics(&[]), HierarchyMetrics::default());
    let empty = calculate_metrics(&[]);
    assert_eq!(empty.complexity_score, 0.0);

    let single = calculate_metrics(&[field("only", None)]);
    assert_eq!(single.total_fields, 1);
    assert_eq!(single.root_fields, 1);
    assert_eq!(single.max_depth, 0);
    assert_eq!(single.average_depth, 0.0);
    assert_eq!(single.avg_children_per_parent, 0.0);
    assert_eq!(single.complexity_score, 1.0);
}

#[test]
fn test_metrics_for_applicant_module() {
    let mut fields = create_applicant_fields();
    fields[2] = fields[2].clone().with_rule(create_minor_consent_rule());
    let metrics = calculate_metrics(&fields);

    assert_eq!(metrics.total_fields, 3);
    assert_eq!(metrics.root_fields, 2);
    assert_eq!(metrics.max_depth, 1);
    assert_eq!(metrics.conditional_fields, 1);
    assert_eq!(metrics.avg_children_per_parent, 1.0);
    // 3 + 1*5 + 1*3 + 1*2
    assert_eq!(metrics.complexity_score, 13.0);
}

#[test]
fn test_build_async_resolves_code_sets() {
    let provider = StaticCodeSetProvider::new().with_code_set(
        "provinces",
        vec![FieldOption::new("ON", "Ontario"), FieldOption::new("QC", "Quebec")],
    );
    let sink = CollectingSink::new();

    let hierarchy = tokio_test::block_on(
        HierarchyBuilder::new(vec![
            field("province", None).with_code_set("provinces"),
            field("country", None).with_code_set("countries"),
            field("notes", None),
        ])
        .with_sink(sink.clone())
        .with_code_set_provider(Arc::new(provider))
        .build_async(),
    );

    assert_eq!(hierarchy.get("province").unwrap().schema.options.len(), 2);
    assert!(hierarchy.get("country").unwrap().schema.options.is_empty());
    assert_eq!(hierarchy.len(), 3);
    assert_eq!(sink.count(DiagnosticKind::CodeSetFailure), 1);
}

struct FailingProvider;

#[async_trait::async_trait]
impl CodeSetProvider for FailingProvider {
    async fn get_code_set_as_field_options(
        &self,
        code_set_id: &str,
    ) -> std::result::Result<Vec<FieldOption>, CodeSetError> {
        Err(CodeSetError::Provider(format!("lookup of {} timed out", code_set_id)))
    }
}

#[test]
fn test_provider_failure_keeps_building() {
    let fields = create_applicant_fields()
        .into_iter()
        .map(|f| f.with_code_set("x"))
        .collect();
    let sink = CollectingSink::new();

    let hierarchy = tokio_test::block_on(
        HierarchyBuilder::new(fields)
            .with_sink(sink.clone())
            .with_code_set_provider(Arc::new(FailingProvider))
            .build_async(),
    );
    assert_eq!(
        hierarchy.field_ids(),
        vec!["age", "guardianSection", "parentalConsent"]
    );
    assert_eq!(sink.count(DiagnosticKind::CodeSetFailure), 3);
}

#[test]
fn test_cancelled_build_skips_resolution() {
    let token = CancellationToken::new();
    token.cancel();
    let sink = CollectingSink::new();
    let provider = StaticCodeSetProvider::new()
        .with_code_set("provinces", vec![FieldOption::new("ON", "Ontario")]);

    let hierarchy = tokio_test::block_on(
        HierarchyBuilder::new(vec![field("province", None).with_code_set("provinces")])
            .with_sink(sink.clone())
            .with_code_set_provider(Arc::new(provider))
            .with_cancellation(token)
            .build_async(),
    );

    assert!(hierarchy.get("province").unwrap().schema.options.is_empty());
    assert_eq!(sink.count(DiagnosticKind::Cancelled), 1);
}

/// Serves lookups from an in-memory table and cancels the build after the first one.
struct CancelAfterFirstProvider {
    inner: StaticCodeSetProvider,
    token: CancellationToken,
}

#[async_trait::async_trait]
impl CodeSetProvider for CancelAfterFirstProvider {
    async fn get_code_set_as_field_options(
        &self,
        code_set_id: &str,
    ) -> std::result::Result<Vec<FieldOption>, CodeSetError> {
        let options = self.inner.get_code_set_as_field_options(code_set_id).await;
        self.token.cancel();
        options
    }
}

#[test]
fn test_cancellation_mid_resolution_keeps_resolved_fields() {
    let token = CancellationToken::new();
    let sink = CollectingSink::new();
    let provider = CancelAfterFirstProvider {
        inner: StaticCodeSetProvider::new()
            .with_code_set("provinces", vec![FieldOption::new("ON", "Ontario")])
            .with_code_set("countries", vec![FieldOption::new("CA", "Canada")]),
        token: token.clone(),
    };

    let hierarchy = tokio_test::block_on(
        HierarchyBuilder::new(vec![
            field("province", None).with_code_set("provinces"),
            field("country", None).with_code_set("countries"),
        ])
        .with_sink(sink.clone())
        .with_code_set_provider(Arc::new(provider))
        .with_cancellation(token)
        .build_async(),
    );

    assert_eq!(hierarchy.get("province").unwrap().schema.options.len(), 1);
    assert!(hierarchy.get("country").unwrap().schema.options.is_empty());
    assert_eq!(hierarchy.len(), 2);
    assert_eq!(sink.count(DiagnosticKind::CodeSetResolved), 1);
    assert_eq!(sink.count(DiagnosticKind::Cancelled), 1);
}
