//! Dependency tree rendering for `trellis dep tree`.

use std::io::{self, Write};

use super::OutputConfig;
use super::color::{colored_status_icon, colorize_id, dimmed, warning};
use crate::domain::DependencyTree;

/// Render a tree with ASCII/Unicode connectors:
///
/// ```text
/// tr-a1b2 Build API
/// ├── tr-c3d4 (blocks) ○ Design schema
/// │   └── tr-a1b2 (related) [circular]
/// └── tr-e5f6 (parent-child) ▶ Platform
/// ```
pub fn write_dependency_tree<W: Write>(
    w: &mut W,
    tree: &DependencyTree,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{}{}",
        colorize_id(tree.issue_id.as_str(), config),
        tree.title
            .as_deref()
            .map(|t| format!(" {t}"))
            .unwrap_or_default()
    )?;
    if tree.truncated {
        writeln!(w, "{}", dimmed("... (depth limit reached)", config))?;
    }
    write_children(w, &tree.dependencies, &[], config)
}

/// `prefix_segments` records, per ancestor level, whether siblings follow,
/// which decides between a `│` continuation and blank space.
fn write_children<W: Write>(
    w: &mut W,
    children: &[DependencyTree],
    prefix_segments: &[bool],
    config: &OutputConfig,
) -> io::Result<()> {
    let (branch, corner, pipe, space) = if config.use_ascii {
        ("|-- ", "`-- ", "|   ", "    ")
    } else {
        ("├── ", "└── ", "│   ", "    ")
    };

    for (i, child) in children.iter().enumerate() {
        let is_last = i + 1 == children.len();

        let mut prefix = String::new();
        for &has_more in prefix_segments {
            prefix.push_str(&dimmed(if has_more { pipe } else { space }, config));
        }
        let connector = dimmed(if is_last { corner } else { branch }, config);

        let dep_type = child
            .dep_type
            .map(|dt| format!(" {}", dimmed(&format!("({dt})"), config)))
            .unwrap_or_default();
        let status = child
            .status
            .map(|s| format!(" {}", colored_status_icon(s, config)))
            .unwrap_or_default();
        let title = match (&child.title, child.circular) {
            (_, true) => format!(" {}", warning("[circular]", config)),
            (Some(title), false) => format!(" {title}"),
            (None, false) => format!(" {}", warning("[missing]", config)),
        };
        let truncated = if child.truncated {
            format!(" {}", dimmed("...", config))
        } else {
            String::new()
        };

        writeln!(
            w,
            "{prefix}{connector}{}{dep_type}{status}{title}{truncated}",
            colorize_id(child.issue_id.as_str(), config)
        )?;

        if !child.dependencies.is_empty() {
            let mut next_segments = prefix_segments.to_vec();
            next_segments.push(!is_last);
            write_children(w, &child.dependencies, &next_segments, config)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyType, IssueId, IssueStatus};

    fn node(id: &str, dep_type: Option<DependencyType>) -> DependencyTree {
        DependencyTree {
            issue_id: IssueId::new(id),
            dep_type,
            title: Some(format!("Title {id}")),
            status: Some(IssueStatus::Open),
            circular: false,
            truncated: false,
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn test_ascii_rendering() {
        let mut a = node("t-a", None);
        let mut b = node("t-b", Some(DependencyType::Blocks));
        let mut loop_back = node("t-a", Some(DependencyType::Related));
        loop_back.circular = true;
        b.dependencies.push(loop_back);
        a.dependencies.push(b);
        a.dependencies.push(node("t-c", Some(DependencyType::ParentChild)));

        let config = OutputConfig {
            use_ascii: true,
            use_colors: false,
        };
        let mut out = Vec::new();
        write_dependency_tree(&mut out, &a, &config).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "t-a Title t-a\n\
             |-- t-b (blocks) o Title t-b\n\
             |   `-- t-a (related) o [circular]\n\
             `-- t-c (parent-child) o Title t-c\n"
        );
    }
}
