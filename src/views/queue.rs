use std::fmt;

use super::{company_badge, format_date};
use crate::model::{Project, ProjectStatus};
use crate::workflow::{Board, StatusMove};

fn empty_message(status: ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Queue => "No projects in queue",
        ProjectStatus::InProgress => "No projects in progress",
        ProjectStatus::Completed => "No completed projects",
    }
}

fn action_hint(project: &Project) -> String {
    project
        .status
        .available_moves()
        .into_iter()
        .map(|m| match m {
            StatusMove::Retreat => format!("◀ retreat {}", project.id),
            StatusMove::Advance => format!("advance {} ▶", project.id),
        })
        .collect::<Vec<_>>()
        .join("   ")
}

/// Projects in workflow columns with their available moves.
pub struct QueueView<'a>(pub &'a Board);

impl fmt::Display for QueueView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let partition = self.0.partition();

        writeln!(f, "🗂️  PROJECT QUEUE")?;
        writeln!(f, "================")?;

        for status in ProjectStatus::ALL {
            let column = partition.column(status);
            writeln!(f)?;
            writeln!(f, "{} ({})", status.label().to_uppercase(), column.len())?;
            writeln!(f, "────────────────────")?;
            if column.is_empty() {
                writeln!(f, "  {}", empty_message(status))?;
                continue;
            }
            for project in column {
                writeln!(f, "  {} [{}]", project.title, project.id)?;
                writeln!(
                    f,
                    "    {} · {}",
                    company_badge(project.company),
                    format_date(project.created_at)
                )?;
                writeln!(f, "    {}", action_hint(project))?;
            }
        }
        Ok(())
    }
}

pub fn render_queue(board: &Board) -> String {
    QueueView(board).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::fixtures::project;

    #[test]
    fn test_empty_columns() {
        let out = render_queue(&Board::default());
        assert!(out.contains("No projects in queue"));
        assert!(out.contains("No projects in progress"));
        assert!(out.contains("No completed projects"));
    }

    #[test]
    fn test_actions_follow_workflow() {
        let board = Board::from_records(
            vec![
                project("q", "Waiting", ProjectStatus::Queue, 1),
                project("w", "Working", ProjectStatus::InProgress, 2),
                project("d", "Done", ProjectStatus::Completed, 3),
            ],
            vec![],
        );
        let out = render_queue(&board);

        assert!(out.contains("advance q ▶"));
        assert!(!out.contains("retreat q"));
        assert!(out.contains("◀ retreat w   advance w ▶"));
        assert!(out.contains("◀ retreat d"));
        assert!(!out.contains("advance d"));
        assert!(out.contains("IN PROGRESS (1)"));
    }
}
