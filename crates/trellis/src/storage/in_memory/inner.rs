//! Core in-memory data structures.
//!
//! [`Inner`] holds every issue, edge and event of a store. It is wrapped in
//! `Arc<Mutex<>>` by [`super::InMemoryStore`] and cloned by a session on its
//! first write.

use crate::domain::{DependencyEdge, DependencyType, Event, Issue, IssueId};
use crate::error::{Error, Result};
use crate::id_generation::IdGenerator;
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Edge weight: the edge plus its insertion sequence.
#[derive(Debug, Clone)]
pub(crate) struct StoredEdge {
    pub(crate) seq: u64,
    pub(crate) edge: DependencyEdge,
}

/// Inner storage structure (not thread-safe).
///
/// The graph is a `StableDiGraph` so that removing an issue's node does not
/// shift the indices held in `node_map`. Edge direction: source (dependent)
/// -> target (dependency).
#[derive(Debug, Clone)]
pub(crate) struct Inner {
    pub(crate) issues: HashMap<IssueId, Issue>,
    pub(crate) graph: StableDiGraph<IssueId, StoredEdge>,
    pub(crate) node_map: HashMap<IssueId, NodeIndex>,
    pub(crate) events: Vec<Event>,
    pub(crate) id_generator: IdGenerator,
    pub(crate) next_sequence: u64,
    pub(crate) next_edge_seq: u64,
    pub(crate) next_event_id: u64,
}

impl Inner {
    /// Empty store state
    pub(crate) fn new(prefix: &str) -> Self {
        Self {
            issues: HashMap::new(),
            graph: StableDiGraph::new(),
            node_map: HashMap::new(),
            events: Vec::new(),
            id_generator: IdGenerator::new(prefix),
            next_sequence: 1,
            next_edge_seq: 1,
            next_event_id: 1,
        }
    }

    pub(crate) fn node(&self, id: &IssueId) -> Result<NodeIndex> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| Error::IssueNotFound(id.clone()))
    }

    /// Insert or replace an issue, keeping graph and generator in sync.
    pub(crate) fn upsert_issue(&mut self, issue: Issue) {
        if !self.node_map.contains_key(&issue.id) {
            let node = self.graph.add_node(issue.id.clone());
            self.node_map.insert(issue.id.clone(), node);
            self.id_generator.register(issue.id.as_str());
        }
        self.next_sequence = self.next_sequence.max(issue.sequence + 1);
        self.issues.insert(issue.id.clone(), issue);
    }

    pub(crate) fn find_edge_index(
        &self,
        from: &IssueId,
        to: &IssueId,
        dep_type: DependencyType,
    ) -> Option<EdgeIndex> {
        let from_node = self.node_map.get(from)?;
        let to_node = self.node_map.get(to)?;
        self.graph
            .edges_directed(*from_node, Direction::Outgoing)
            .find(|e| e.target() == *to_node && e.weight().edge.dep_type == dep_type)
            .map(|e| e.id())
    }

    /// Edges touching `id` in the given direction, filtered by type and
    /// sorted by insertion sequence.
    pub(crate) fn edges_directed(
        &self,
        id: &IssueId,
        direction: Direction,
        types: &[DependencyType],
    ) -> Vec<DependencyEdge> {
        let Some(node) = self.node_map.get(id) else {
            return Vec::new();
        };
        let mut stored: Vec<&StoredEdge> = self
            .graph
            .edges_directed(*node, direction)
            .map(|e| e.weight())
            .filter(|s| types.contains(&s.edge.dep_type))
            .collect();
        stored.sort_by_key(|s| s.seq);
        stored.into_iter().map(|s| s.edge.clone()).collect()
    }

    pub(crate) fn all_edges(&self) -> Vec<DependencyEdge> {
        let mut stored: Vec<&StoredEdge> = self.graph.edge_weights().collect();
        stored.sort_by_key(|s| s.seq);
        stored.into_iter().map(|s| s.edge.clone()).collect()
    }

    pub(crate) fn issues_in_order(&self) -> Vec<Issue> {
        let mut issues: Vec<Issue> = self.issues.values().cloned().collect();
        issues.sort_by_key(|i| i.sequence);
        issues
    }
}
