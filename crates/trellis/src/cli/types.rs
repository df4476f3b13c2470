//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::{DependencyType, IssueStatus, IssueType};

/// Issue type for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueTypeArg {
    /// Large body of work
    Epic,
    /// New feature
    Feature,
    /// General task
    Task,
    /// Bug fix
    Bug,
    /// Maintenance/chore
    Chore,
}

impl From<IssueTypeArg> for IssueType {
    fn from(arg: IssueTypeArg) -> Self {
        match arg {
            IssueTypeArg::Epic => IssueType::Epic,
            IssueTypeArg::Feature => IssueType::Feature,
            IssueTypeArg::Task => IssueType::Task,
            IssueTypeArg::Bug => IssueType::Bug,
            IssueTypeArg::Chore => IssueType::Chore,
        }
    }
}

/// Issue status for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatusArg {
    /// Open and ready to work on
    Open,
    /// Currently being worked on
    #[value(name = "in_progress", alias = "in-progress")]
    InProgress,
    /// Explicitly blocked
    Blocked,
    /// Completed
    Closed,
}

impl From<IssueStatusArg> for IssueStatus {
    fn from(arg: IssueStatusArg) -> Self {
        match arg {
            IssueStatusArg::Open => IssueStatus::Open,
            IssueStatusArg::InProgress => IssueStatus::InProgress,
            IssueStatusArg::Blocked => IssueStatus::Blocked,
            IssueStatusArg::Closed => IssueStatus::Closed,
        }
    }
}

/// Dependency type for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyTypeArg {
    /// Hard blocker - `from` waits for `to` to close
    Blocks,
    /// Soft link - informational
    Related,
    /// Containment - `from` is a child of `to`
    #[value(name = "parent-child")]
    ParentChild,
}

impl From<DependencyTypeArg> for DependencyType {
    fn from(arg: DependencyTypeArg) -> Self {
        match arg {
            DependencyTypeArg::Blocks => DependencyType::Blocks,
            DependencyTypeArg::Related => DependencyType::Related,
            DependencyTypeArg::ParentChild => DependencyType::ParentChild,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("in_progress", IssueStatus::InProgress)]
    #[case("in-progress", IssueStatus::InProgress)]
    #[case("closed", IssueStatus::Closed)]
    fn test_status_arg_names(#[case] input: &str, #[case] expected: IssueStatus) {
        let arg = IssueStatusArg::from_str(input, false).unwrap();
        assert_eq!(IssueStatus::from(arg), expected);
    }

    #[test]
    fn test_dependency_type_arg_names() {
        let arg = DependencyTypeArg::from_str("parent-child", false).unwrap();
        assert_eq!(DependencyType::from(arg), DependencyType::ParentChild);
    }
}
