use super::{FieldHierarchy, HierarchyBuilder};
use crate::diagnostics::NullSink;
use crate::schema::FormFieldSchema;
use serde::Serialize;
use std::sync::Arc;

/// Structural statistics of a module's field tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HierarchyMetrics {
    pub total_fields: usize,
    pub root_fields: usize,
    /// Longest root-to-leaf path, counting edges.
    pub max_depth: usize,
    pub average_depth: f64,
    /// Fields carrying at least one conditional rule.
    pub conditional_fields: usize,
    /// Mean child count over the fields that have children.
    pub avg_children_per_parent: f64,
    pub complexity_score: f64,
}

impl HierarchyMetrics {
    /// `total + max_depth*5 + conditional*3 + avg_children*2`, rounded to 2 decimals.
    pub fn complexity(
        total_fields: usize,
        max_depth: usize,
        conditional_fields: usize,
        avg_children_per_parent: f64,
    ) -> f64 {
        let score = total_fields as f64 * 1.0
            + max_depth as f64 * 5.0
            + conditional_fields as f64 * 3.0
            + avg_children_per_parent * 2.0;
        (score * 100.0).round() / 100.0
    }

    pub(super) fn from_hierarchy(hierarchy: &FieldHierarchy) -> Self {
        let nodes = hierarchy.nodes();
        if nodes.is_empty() {
            return Self::default();
        }

        let total_fields = nodes.len();
        let max_depth = hierarchy.max_depth();
        let depth_sum: f64 = nodes.iter().map(|n| n.level as f64).sum();
        let average_depth = depth_sum / total_fields as f64;
        let conditional_fields = nodes.iter().filter(|n| n.schema.is_conditional()).count();

        let parents: Vec<usize> = nodes
            .iter()
            .map(|n| n.children.len())
            .filter(|count| *count > 0)
            .collect();
        let avg_children_per_parent = if parents.is_empty() {
            0.0
        } else {
            parents.iter().sum::<usize>() as f64 / parents.len() as f64
        };

        Self {
            total_fields,
            root_fields: hierarchy.roots().len(),
            max_depth,
            average_depth,
            conditional_fields,
            avg_children_per_parent,
            complexity_score: Self::complexity(
                total_fields,
                max_depth,
                conditional_fields,
                avg_children_per_parent,
            ),
        }
    }
}

/// Builds the hierarchy quietly and measures it. Build warnings are not reported.
pub fn calculate_metrics(fields: &[FormFieldSchema]) -> HierarchyMetrics {
    HierarchyBuilder::new(fields.to_vec())
        .with_sink(Arc::new(NullSink))
        .build()
        .metrics()
}
