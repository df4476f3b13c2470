//! Whole-document checks run after every line is parsed.

use super::{ImportError, ParsedDocument, ParsedItem};
use crate::engine::is_valid_parent_child;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;

/// Append cross-item errors to `doc.errors`
pub(super) fn validate(doc: &mut ParsedDocument) {
    let by_id: HashMap<&str, &ParsedItem> = doc
        .items
        .iter()
        .map(|item| (item.logical_id.as_str(), item))
        .collect();

    let mut errors = unknown_dependencies(&doc.items, &by_id);
    errors.extend(dependency_cycle(&doc.items, &by_id));
    errors.extend(hierarchy_violations(&doc.items, &by_id));
    doc.errors.extend(errors);
}

fn unknown_dependencies(
    items: &[ParsedItem],
    by_id: &HashMap<&str, &ParsedItem>,
) -> Vec<ImportError> {
    items
        .iter()
        .flat_map(|item| {
            item.dependencies
                .iter()
                .filter(|dep| !by_id.contains_key(dep.as_str()))
                .map(|dep| ImportError::UnknownDependency {
                    logical_id: item.logical_id.clone(),
                    dependency: dep.clone(),
                })
        })
        .collect()
}

/// First cycle in the `deps=` graph, self-dependencies included
fn dependency_cycle(
    items: &[ParsedItem],
    by_id: &HashMap<&str, &ParsedItem>,
) -> Option<ImportError> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for item in items {
        graph.add_node(item.logical_id.as_str());
    }
    for item in items {
        for dep in &item.dependencies {
            if by_id.contains_key(dep.as_str()) {
                graph.add_edge(item.logical_id.as_str(), dep.as_str(), ());
            }
        }
    }

    toposort(&graph, None)
        .err()
        .map(|cycle| ImportError::DependencyCycle {
            logical_id: cycle.node_id().to_string(),
        })
}

fn hierarchy_violations(
    items: &[ParsedItem],
    by_id: &HashMap<&str, &ParsedItem>,
) -> Vec<ImportError> {
    items
        .iter()
        .filter_map(|child| {
            let parent = by_id.get(child.parent.as_deref()?)?;
            (!is_valid_parent_child(parent.issue_type, child.issue_type)).then(|| {
                ImportError::HierarchyViolation {
                    parent: parent.logical_id.clone(),
                    parent_type: parent.issue_type,
                    child: child.logical_id.clone(),
                    child_type: child.issue_type,
                }
            })
        })
        .collect()
}
