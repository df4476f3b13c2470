//! Work item status and the transitions between statuses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Issue is open and may be picked up
    #[default]
    Open,

    /// Issue is currently being worked on
    InProgress,

    /// Issue was explicitly marked as blocked
    Blocked,

    /// Issue has been completed
    Closed,
}

impl IssueStatus {
    /// Snake-case name used in JSON and the CLI
    pub fn as_str(self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Blocked => "blocked",
            IssueStatus::Closed => "closed",
        }
    }

    /// Statuses that are eligible for the ready set
    pub fn is_workable(self) -> bool {
        matches!(self, IssueStatus::Open | IssueStatus::InProgress)
    }

    /// The status reached by applying `transition`, or `None` if the
    /// transition is not allowed from this status.
    ///
    /// ```text
    /// Open       --Start-->   InProgress    Open       --Block-->  Blocked
    /// Blocked    --Start-->   InProgress    InProgress --Block-->  Blocked
    /// Blocked    --Unblock--> Open          Open       --Close-->  Closed
    /// InProgress --Close-->   Closed        Closed     --Reopen--> Open
    /// ```
    pub fn apply(self, transition: Transition) -> Option<IssueStatus> {
        use IssueStatus::{Blocked, Closed, InProgress, Open};

        match (transition, self) {
            (Transition::Start, Open | Blocked) => Some(InProgress),
            (Transition::Block, Open | InProgress) => Some(Blocked),
            (Transition::Unblock, Blocked) => Some(Open),
            (Transition::Close, Open | InProgress) => Some(Closed),
            (Transition::Reopen, Closed) => Some(Open),
            _ => None,
        }
    }

    /// Transitions available from this status
    pub fn available_transitions(self) -> Vec<Transition> {
        Transition::ALL
            .into_iter()
            .filter(|t| self.apply(*t).is_some())
            .collect()
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(IssueStatus::Open),
            "in_progress" | "in-progress" => Ok(IssueStatus::InProgress),
            "blocked" => Ok(IssueStatus::Blocked),
            "closed" => Ok(IssueStatus::Closed),
            other => Err(format!("Unknown status '{other}'")),
        }
    }
}

/// Explicit status-changing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Begin work (`Open | Blocked -> InProgress`)
    Start,
    /// Mark as blocked (`Open | InProgress -> Blocked`)
    Block,
    /// Clear the blocked mark (`Blocked -> Open`)
    Unblock,
    /// Complete (`Open | InProgress -> Closed`)
    Close,
    /// Reopen a closed item (`Closed -> Open`)
    Reopen,
}

impl Transition {
    /// Every transition
    pub const ALL: [Transition; 5] = [
        Transition::Start,
        Transition::Block,
        Transition::Unblock,
        Transition::Close,
        Transition::Reopen,
    ];
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::Start => "start",
            Transition::Block => "block",
            Transition::Unblock => "unblock",
            Transition::Close => "close",
            Transition::Reopen => "reopen",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(IssueStatus::Open, Transition::Start, Some(IssueStatus::InProgress))]
    #[case(IssueStatus::Blocked, Transition::Start, Some(IssueStatus::InProgress))]
    #[case(IssueStatus::InProgress, Transition::Start, None)]
    #[case(IssueStatus::Closed, Transition::Start, None)]
    #[case(IssueStatus::Open, Transition::Block, Some(IssueStatus::Blocked))]
    #[case(IssueStatus::InProgress, Transition::Block, Some(IssueStatus::Blocked))]
    #[case(IssueStatus::Closed, Transition::Block, None)]
    #[case(IssueStatus::Blocked, Transition::Unblock, Some(IssueStatus::Open))]
    #[case(IssueStatus::Open, Transition::Unblock, None)]
    #[case(IssueStatus::Open, Transition::Close, Some(IssueStatus::Closed))]
    #[case(IssueStatus::InProgress, Transition::Close, Some(IssueStatus::Closed))]
    #[case(IssueStatus::Closed, Transition::Close, None)]
    #[case(IssueStatus::Closed, Transition::Reopen, Some(IssueStatus::Open))]
    #[case(IssueStatus::Open, Transition::Reopen, None)]
    fn test_transition_table(
        #[case] from: IssueStatus,
        #[case] transition: Transition,
        #[case] expected: Option<IssueStatus>,
    ) {
        assert_eq!(from.apply(transition), expected);
    }

    #[test]
    fn test_closed_can_only_reopen() {
        assert_eq!(
            IssueStatus::Closed.available_transitions(),
            vec![Transition::Reopen]
        );
    }

    #[test]
    fn test_status_parse_accepts_both_separators() {
        assert_eq!(
            "in-progress".parse::<IssueStatus>().unwrap(),
            IssueStatus::InProgress
        );
        assert_eq!(
            "in_progress".parse::<IssueStatus>().unwrap(),
            IssueStatus::InProgress
        );
    }
}
