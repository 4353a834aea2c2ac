//! Parent/child structure of a module's flat field list.
//!
//! The tree is an arena: nodes live in one `Vec` and refer to each other by
//! `NodeId`. Roots and every child list are kept in display order (`order`
//! ascending, ties in input order), which is the order every downstream walk uses.

use crate::codeset::{CodeSetProvider, resolve_code_sets};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, default_sink};
use crate::error::HierarchyIssue;
use crate::schema::FormFieldSchema;
use ahash::AHashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod metrics;
mod validation;

pub use metrics::*;
pub use validation::*;

/// Index of a node inside a `FieldHierarchy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormFieldNode {
    pub schema: FormFieldSchema,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Distance from the root, starting at 0.
    pub level: usize,
}

impl FormFieldNode {
    fn new(schema: FormFieldSchema) -> Self {
        Self {
            schema,
            parent: None,
            children: Vec::new(),
            level: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.schema.id
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A linked field tree built by `HierarchyBuilder`.
#[derive(Debug, Clone, Default)]
pub struct FieldHierarchy {
    nodes: Vec<FormFieldNode>,
    index: AHashMap<String, NodeId>,
    roots: Vec<NodeId>,
    warnings: Vec<HierarchyIssue>,
}

impl FieldHierarchy {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in input order.
    pub fn nodes(&self) -> &[FormFieldNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &FormFieldNode {
        &self.nodes[id.0]
    }

    /// Looks a node up by field id. With duplicate ids, the first occurrence wins.
    pub fn get(&self, field_id: &str) -> Option<&FormFieldNode> {
        self.index.get(field_id).map(|id| self.node(*id))
    }

    pub fn id_of(&self, field_id: &str) -> Option<NodeId> {
        self.index.get(field_id).copied()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &FormFieldNode> {
        self.nodes[id.0].children.iter().map(|c| self.node(*c))
    }

    pub fn parent(&self, id: NodeId) -> Option<&FormFieldNode> {
        self.nodes[id.0].parent.map(|p| self.node(p))
    }

    /// Walks from the node's parent up to its root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let parent = self.nodes[id.0].parent;
        std::iter::successors(parent, |current| self.nodes[current.0].parent)
    }

    /// Problems tolerated while building, such as orphaned parents demoted to roots.
    pub fn warnings(&self) -> &[HierarchyIssue] {
        &self.warnings
    }

    /// Depth-first pre-order traversal in display order.
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Field ids in display order.
    pub fn field_ids(&self) -> Vec<&str> {
        self.traverse()
            .into_iter()
            .map(|id| self.node(id).id())
            .collect()
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.level).max().unwrap_or(0)
    }

    pub fn metrics(&self) -> HierarchyMetrics {
        HierarchyMetrics::from_hierarchy(self)
    }

    fn fmt_as_tree(
        &self,
        id: NodeId,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let node = self.node(id);
        let marker = if is_last { "└── " } else { "├── " };
        write!(f, "{}{}{}", prefix, marker, node.id())?;
        if !node.schema.label.is_empty() {
            write!(f, " \"{}\"", node.schema.label)?;
        }
        if node.schema.is_required {
            write!(f, " *")?;
        }
        writeln!(f)?;

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        let count = node.children.len();
        for (i, child) in node.children.iter().enumerate() {
            self.fmt_as_tree(*child, f, &child_prefix, i + 1 == count)?;
        }
        Ok(())
    }
}

impl fmt::Display for FieldHierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.roots.len();
        for (i, root) in self.roots.iter().enumerate() {
            self.fmt_as_tree(*root, f, "", i + 1 == count)?;
        }
        Ok(())
    }
}

/// Builds a `FieldHierarchy` from a flat field list.
///
/// The build is lenient. Unresolved parents, self references and links that
/// would close a cycle are demoted to roots and reported as warnings, so every
/// input field ends up in the tree exactly once.
///
/// # Example
///
/// ```
/// use jouken::prelude::*;
///
/// let fields = vec![
///     FormFieldSchema::new("b").with_parent("a"),
///     FormFieldSchema::new("a"),
///     FormFieldSchema::new("c").with_parent("missing"),
/// ];
/// let hierarchy = HierarchyBuilder::new(fields).build();
///
/// assert_eq!(hierarchy.field_ids(), vec!["a", "b", "c"]);
/// assert_eq!(hierarchy.warnings().len(), 1);
/// ```
pub struct HierarchyBuilder {
    fields: Vec<FormFieldSchema>,
    sink: Arc<dyn DiagnosticSink>,
    code_set_provider: Option<Arc<dyn CodeSetProvider>>,
    cancellation: Option<CancellationToken>,
}

impl HierarchyBuilder {
    pub fn new(fields: Vec<FormFieldSchema>) -> Self {
        Self {
            fields,
            sink: default_sink(),
            code_set_provider: None,
            cancellation: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the provider consulted by `build_async` to expand `code_set_id`s.
    pub fn with_code_set_provider(mut self, provider: Arc<dyn CodeSetProvider>) -> Self {
        self.code_set_provider = Some(provider);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Resolves code sets (if a provider is set), then links the tree.
    pub async fn build_async(mut self) -> FieldHierarchy {
        if let Some(provider) = self.code_set_provider.clone() {
            let report = resolve_code_sets(
                &mut self.fields,
                provider.as_ref(),
                self.sink.as_ref(),
                self.cancellation.as_ref(),
            )
            .await;
            tracing::debug!(
                resolved = report.resolved,
                failed = report.failed,
                cancelled = report.cancelled,
                "Code set resolution finished"
            );
        }
        self.build()
    }

    /// Links the tree without touching code sets.
    pub fn build(self) -> FieldHierarchy {
        let sink = self.sink;

        // Pass 1: one node per field, indexed by id.
        let mut hierarchy = FieldHierarchy {
            nodes: Vec::with_capacity(self.fields.len()),
            ..FieldHierarchy::default()
        };
        for (i, field) in self.fields.into_iter().enumerate() {
            let id = NodeId(i);
            if hierarchy.index.contains_key(&field.id) {
                let issue = HierarchyIssue::DuplicateId {
                    id: field.id.clone(),
                };
                sink.record(Diagnostic::warning(DiagnosticKind::DuplicateId, issue.to_string()));
                hierarchy.warnings.push(issue);
            } else {
                hierarchy.index.insert(field.id.clone(), id);
            }
            hierarchy.nodes.push(FormFieldNode::new(field));
        }

        // Pass 2: link parents in input order.
        for i in 0..hierarchy.nodes.len() {
            let child = NodeId(i);
            match hierarchy.resolve_parent(child) {
                Ok(Some(parent)) => {
                    hierarchy.nodes[i].parent = Some(parent);
                    hierarchy.nodes[parent.0].children.push(child);
                }
                Ok(None) => hierarchy.roots.push(child),
                Err(issue) => {
                    let kind = match issue {
                        HierarchyIssue::OrphanedParent { .. } => DiagnosticKind::OrphanedParent,
                        _ => DiagnosticKind::ParentCycle,
                    };
                    sink.record(Diagnostic::warning(
                        kind,
                        format!("{}; field is placed at the root", issue),
                    ));
                    hierarchy.warnings.push(issue);
                    hierarchy.roots.push(child);
                }
            }
        }

        hierarchy.sort_and_level();
        hierarchy
    }
}

impl FieldHierarchy {
    /// Finds the node `child` should hang under, given the links made so far.
    fn resolve_parent(&self, child: NodeId) -> Result<Option<NodeId>, HierarchyIssue> {
        let schema = &self.nodes[child.0].schema;
        let Some(parent_id) = schema.parent() else {
            return Ok(None);
        };

        if parent_id == schema.id {
            return Err(HierarchyIssue::SelfReference {
                id: schema.id.clone(),
            });
        }

        let Some(parent) = self.id_of(parent_id) else {
            return Err(HierarchyIssue::OrphanedParent {
                id: schema.id.clone(),
                parent_id: parent_id.to_string(),
            });
        };

        // Linking closes a cycle when `child` is already an ancestor of `parent`.
        let chain: Vec<NodeId> = std::iter::once(parent)
            .chain(self.ancestors(parent))
            .collect();
        if let Some(pos) = chain.iter().position(|id| *id == child) {
            let mut path = vec![schema.id.clone()];
            path.extend(chain[..=pos].iter().map(|id| self.node(*id).id().to_string()));
            return Err(HierarchyIssue::Cycle { path });
        }

        Ok(Some(parent))
    }

    fn sort_and_level(&mut self) {
        let nodes = &self.nodes;
        self.roots.sort_by_key(|id| nodes[id.0].schema.order);
        let orders: Vec<i32> = self.nodes.iter().map(|n| n.schema.order).collect();
        for node in &mut self.nodes {
            node.children.sort_by_key(|id| orders[id.0]);
        }

        let mut stack: Vec<(NodeId, usize)> = self.roots.iter().map(|id| (*id, 0)).collect();
        while let Some((id, level)) = stack.pop() {
            self.nodes[id.0].level = level;
            stack.extend(self.nodes[id.0].children.iter().map(|c| (*c, level + 1)));
        }
    }
}
