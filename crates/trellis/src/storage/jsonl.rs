//! JSONL persistence for the in-memory store.
//!
//! The file holds one tagged JSON record per line:
//!
//! ```text
//! {"record":"issue","id":"proj-a3f8","title":"...",...}
//! {"record":"edge","issue_id":"proj-a3f8","depends_on_id":"proj-0b1c","dep_type":"blocks",...}
//! {"record":"event","id":1,"issue_id":"proj-a3f8","kind":"created",...}
//! ```
//!
//! Issues are written in creation order, then edges in insertion order, then
//! events. Loading is resilient: bad lines and edges that would break the
//! graph invariants are skipped and reported as [`LoadWarning`]s.

use super::in_memory::InMemoryStore;
use super::{GraphSession, GraphStore};
use crate::domain::{DependencyEdge, DependencyType, Event, Issue, IssueId};
use crate::engine::cycle::would_create_cycle;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

/// One line of the data file
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum Record {
    Issue(Issue),
    Edge(DependencyEdge),
    Event(Event),
}

/// Non-fatal problem found while loading a data file.
///
/// The offending record is skipped; everything else is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Line is not a valid record
    MalformedRecord {
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// Issue failed field validation
    InvalidIssue {
        /// 1-based line number
        line_number: usize,
        /// Offending issue
        issue_id: IssueId,
        /// Validation message
        error: String,
    },

    /// Edge references an issue that is not in the file
    OrphanedEdge {
        /// Edge source
        from: IssueId,
        /// Edge target
        to: IssueId,
    },

    /// Edge would close a same-type cycle
    CircularEdge {
        /// Edge source
        from: IssueId,
        /// Edge target
        to: IssueId,
        /// Edge type
        dep_type: DependencyType,
    },

    /// Second parent for a child that already has one
    SecondParent {
        /// The child
        child: IssueId,
        /// The rejected parent
        parent: IssueId,
    },

    /// Event for an issue that is not in the file
    OrphanedEvent {
        /// 1-based line number
        line_number: usize,
        /// Missing issue
        issue_id: IssueId,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::MalformedRecord { line_number, error } => {
                write!(f, "line {line_number}: malformed record: {error}")
            }
            LoadWarning::InvalidIssue {
                line_number,
                issue_id,
                error,
            } => write!(f, "line {line_number}: invalid issue {issue_id}: {error}"),
            LoadWarning::OrphanedEdge { from, to } => {
                write!(f, "skipped edge {from} -> {to}: missing issue")
            }
            LoadWarning::CircularEdge { from, to, dep_type } => {
                write!(f, "skipped {dep_type} edge {from} -> {to}: would create a cycle")
            }
            LoadWarning::SecondParent { child, parent } => {
                write!(f, "skipped parent {parent} for {child}: already has a parent")
            }
            LoadWarning::OrphanedEvent {
                line_number,
                issue_id,
            } => write!(f, "line {line_number}: event for missing issue {issue_id}"),
        }
    }
}

/// In-memory store persisted to a JSONL file on [`GraphStore::save`].
#[derive(Debug, Clone)]
pub struct JsonlStore {
    memory: InMemoryStore,
    path: PathBuf,
}

impl JsonlStore {
    /// Load `path` (or start empty if it does not exist).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>, prefix: &str) -> Result<(Self, Vec<LoadWarning>)> {
        let path = path.into();
        let memory = InMemoryStore::new(prefix);

        let warnings = if tokio::fs::try_exists(&path).await? {
            load_into(&memory, &path).await?
        } else {
            Vec::new()
        };

        Ok((Self { memory, path }, warnings))
    }

    /// The backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl GraphStore for JsonlStore {
    async fn begin(&self) -> Result<Box<dyn GraphSession>> {
        self.memory.begin().await
    }

    async fn save(&self) -> Result<()> {
        let session = self.memory.begin().await?;
        save_session(session.as_ref(), &self.path).await
    }
}

async fn load_into(memory: &InMemoryStore, path: &Path) -> Result<Vec<LoadWarning>> {
    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut warnings = Vec::new();
    let mut edges = Vec::new();
    let mut events = Vec::new();
    let mut session = memory.begin().await?;
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Record>(&line) {
            Ok(Record::Issue(issue)) => {
                if let Err(error) = issue.validate() {
                    warnings.push(LoadWarning::InvalidIssue {
                        line_number,
                        issue_id: issue.id.clone(),
                        error,
                    });
                    continue;
                }
                session.put_issue(issue).await?;
            }
            Ok(Record::Edge(edge)) => edges.push(edge),
            Ok(Record::Event(event)) => events.push((line_number, event)),
            Err(e) => warnings.push(LoadWarning::MalformedRecord {
                line_number,
                error: e.to_string(),
            }),
        }
    }

    // Edges go in only after every issue is known.
    for edge in edges {
        let duplicate = session
            .find_edge(&edge.issue_id, &edge.depends_on_id, edge.dep_type)
            .await?
            .is_some();
        if duplicate {
            continue;
        }
        if let Some(warning) = check_loaded_edge(session.as_ref(), &edge).await? {
            warnings.push(warning);
            continue;
        }
        session.insert_edge(edge).await?;
    }

    // Event ids are reassigned in file order.
    for (line_number, event) in events {
        if session.get_issue(&event.issue_id).await?.is_none() {
            warnings.push(LoadWarning::OrphanedEvent {
                line_number,
                issue_id: event.issue_id,
            });
            continue;
        }
        session.restore_event(event).await?;
    }

    session.commit()?;
    tracing::debug!(path = %path.display(), warnings = warnings.len(), "loaded JSONL store");
    Ok(warnings)
}

async fn check_loaded_edge(
    session: &dyn GraphSession,
    edge: &DependencyEdge,
) -> Result<Option<LoadWarning>> {
    let (from, to) = (&edge.issue_id, &edge.depends_on_id);

    if session.get_issue(from).await?.is_none() || session.get_issue(to).await?.is_none() {
        return Ok(Some(LoadWarning::OrphanedEdge {
            from: from.clone(),
            to: to.clone(),
        }));
    }
    if edge.dep_type == DependencyType::ParentChild
        && !session
            .edges_from(from, &[DependencyType::ParentChild])
            .await?
            .is_empty()
    {
        return Ok(Some(LoadWarning::SecondParent {
            child: from.clone(),
            parent: to.clone(),
        }));
    }
    if would_create_cycle(session, from, to, &[edge.dep_type]).await? {
        return Ok(Some(LoadWarning::CircularEdge {
            from: from.clone(),
            to: to.clone(),
            dep_type: edge.dep_type,
        }));
    }
    Ok(None)
}

/// Write everything visible to `session` to `path` atomically
/// (temp file, then rename).
async fn save_session(session: &dyn GraphSession, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let temp_path = path.with_extension("jsonl.tmp");
    let file = File::create(&temp_path).await?;
    let mut writer = BufWriter::new(file);

    let issues = session.list_issues().await?;
    let mut events = Vec::new();
    for issue in &issues {
        events.extend(session.events_for(&issue.id).await?);
    }
    events.sort_by_key(|e| e.id);

    let records = issues
        .into_iter()
        .map(Record::Issue)
        .chain(session.list_edges().await?.into_iter().map(Record::Edge))
        .chain(events.into_iter().map(Record::Event));

    for record in records {
        let json = serde_json::to_string(&record)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    writer.flush().await?;
    drop(writer);

    tokio::fs::rename(&temp_path, path).await.map_err(Error::Io)?;
    tracing::debug!(path = %path.display(), "saved JSONL store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewIssue;
    use chrono::Utc;
    use tempfile::TempDir;

    fn edge(from: &IssueId, to: &IssueId, dep_type: DependencyType) -> DependencyEdge {
        DependencyEdge {
            issue_id: from.clone(),
            depends_on_id: to.clone(),
            dep_type,
            child_order: 0,
            created_by: "test".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let (store, warnings) = JsonlStore::open(dir.path().join("issues.jsonl"), "j")
            .await
            .unwrap();

        assert!(warnings.is_empty());
        let session = store.begin().await.unwrap();
        assert!(session.list_issues().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_open_restores_graph() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("issues.jsonl");
        let (store, _) = JsonlStore::open(&path, "j").await.unwrap();

        let mut session = store.begin().await.unwrap();
        let a = session.create_issue(NewIssue::new("A"), "t").await.unwrap();
        let b = session.create_issue(NewIssue::new("B"), "t").await.unwrap();
        session
            .insert_edge(edge(&a.id, &b.id, DependencyType::Blocks))
            .await
            .unwrap();
        session.commit().unwrap();
        store.save().await.unwrap();

        let (reloaded, warnings) = JsonlStore::open(&path, "j").await.unwrap();
        assert!(warnings.is_empty());

        let mut session = reloaded.begin().await.unwrap();
        let issues = session.list_issues().await.unwrap();
        assert_eq!(
            issues.iter().map(|i| i.title.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
        assert!(session
            .find_edge(&a.id, &b.id, DependencyType::Blocks)
            .await
            .unwrap()
            .is_some());

        // sequence continues after the loaded issues
        let c = session.create_issue(NewIssue::new("C"), "t").await.unwrap();
        assert!(c.sequence > b.sequence);
    }

    #[tokio::test]
    async fn test_resilient_load_skips_bad_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("issues.jsonl");
        let (store, _) = JsonlStore::open(&path, "j").await.unwrap();

        let mut session = store.begin().await.unwrap();
        let a = session.create_issue(NewIssue::new("A"), "t").await.unwrap();
        let b = session.create_issue(NewIssue::new("B"), "t").await.unwrap();
        session
            .insert_edge(edge(&a.id, &b.id, DependencyType::Blocks))
            .await
            .unwrap();
        // not reachable through the engine, but a hand-edited file may contain it
        session
            .insert_edge(edge(&b.id, &a.id, DependencyType::Blocks))
            .await
            .unwrap();
        session.commit().unwrap();
        store.save().await.unwrap();

        let mut contents = tokio::fs::read_to_string(&path).await.unwrap();
        contents.push_str("{not json}\n");
        contents.push_str(
            &serde_json::to_string(&Record::Edge(edge(
                &a.id,
                &IssueId::new("j-gone"),
                DependencyType::Related,
            )))
            .unwrap(),
        );
        contents.push('\n');
        tokio::fs::write(&path, contents).await.unwrap();

        let (_, warnings) = JsonlStore::open(&path, "j").await.unwrap();
        assert_eq!(warnings.len(), 3);
        assert!(warnings
            .iter()
            .any(|w| matches!(w, LoadWarning::MalformedRecord { .. })));
        assert!(warnings
            .iter()
            .any(|w| matches!(w, LoadWarning::OrphanedEdge { .. })));
        assert!(warnings.contains(&LoadWarning::CircularEdge {
            from: b.id.clone(),
            to: a.id.clone(),
            dep_type: DependencyType::Blocks,
        }));
    }
}
