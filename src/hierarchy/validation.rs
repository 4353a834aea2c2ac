use crate::error::HierarchyIssue;
use crate::schema::FormFieldSchema;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use std::collections::BTreeSet;

/// The result of a strict structural check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyValidation {
    /// Empty ids, duplicate ids, self references and cycles.
    pub errors: Vec<HierarchyIssue>,
    /// Orphaned parent references.
    pub warnings: Vec<HierarchyIssue>,
}

impl HierarchyValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks a flat field list without building or changing anything.
pub fn validate_hierarchy(fields: &[FormFieldSchema]) -> HierarchyValidation {
    let mut result = HierarchyValidation::default();

    for (index, field) in fields.iter().enumerate() {
        if field.id.trim().is_empty() {
            result.errors.push(HierarchyIssue::EmptyId { index });
        }
    }

    let counts = fields
        .iter()
        .filter(|f| !f.id.trim().is_empty())
        .counts_by(|f| f.id.as_str());
    for id in fields.iter().map(|f| f.id.as_str()).unique() {
        if counts.get(id).is_some_and(|n| *n > 1) {
            let issue = HierarchyIssue::DuplicateId { id: id.to_string() };
            result.errors.push(issue);
        }
    }

    // First occurrence wins, matching the lenient build.
    let mut parents: AHashMap<&str, Option<&str>> = AHashMap::new();
    for field in fields {
        parents
            .entry(field.id.as_str())
            .or_insert_with(|| field.parent());
    }

    for field in fields {
        let Some(parent_id) = field.parent() else {
            continue;
        };
        if parent_id == field.id {
            result.errors.push(HierarchyIssue::SelfReference {
                id: field.id.clone(),
            });
        } else if !parents.contains_key(parent_id) {
            result.warnings.push(HierarchyIssue::OrphanedParent {
                id: field.id.clone(),
                parent_id: parent_id.to_string(),
            });
        }
    }

    let mut seen_cycles: AHashSet<BTreeSet<&str>> = AHashSet::new();
    for field in fields {
        if let Some(cycle) = find_cycle(field.id.as_str(), &parents) {
            let members: BTreeSet<&str> = cycle[..cycle.len() - 1].iter().copied().collect();
            if seen_cycles.insert(members) {
                result.errors.push(HierarchyIssue::Cycle {
                    path: cycle.into_iter().map(str::to_string).collect(),
                });
            }
        }
    }

    result
}

/// Walks the ancestor chain of `start` and returns the loop it runs into, if any,
/// as a closed path (`a -> b -> a`). Self references are reported separately and
/// are not returned here.
fn find_cycle<'a>(
    start: &'a str,
    parents: &AHashMap<&'a str, Option<&'a str>>,
) -> Option<Vec<&'a str>> {
    let mut chain = vec![start];
    let mut current = start;

    while let Some(Some(parent)) = parents.get(current).copied() {
        if let Some(pos) = chain.iter().position(|id| *id == parent) {
            let mut cycle = chain.split_off(pos);
            if cycle.len() == 1 {
                return None;
            }
            cycle.push(parent);
            return Some(cycle);
        }
        chain.push(parent);
        current = parent;
    }
    None
}

/// Repairs the defects that have a single obvious fix.
///
/// Self references and references to parents that do not exist are cleared, so
/// those fields become roots. Everything else is returned untouched, including
/// multi-field cycles, which need an author's decision.
pub fn fix_hierarchy_issues(fields: &[FormFieldSchema]) -> Vec<FormFieldSchema> {
    let known: AHashSet<&str> = fields.iter().map(|f| f.id.as_str()).collect();

    fields
        .iter()
        .map(|field| {
            let mut fixed = field.clone();
            let clear = match field.parent() {
                Some(parent_id) => parent_id == field.id || !known.contains(parent_id),
                None => field.parent_id.is_some(),
            };
            if clear {
                fixed.parent_id = None;
            }
            fixed
        })
        .collect()
}
