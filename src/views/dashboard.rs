use std::fmt;

use super::{company_badge, format_date};
use crate::model::ProjectStatus;
use crate::workflow::Board;

pub const RECENT_LIMIT: usize = 5;

fn status_description(status: ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Queue => "Projects waiting to start",
        ProjectStatus::InProgress => "Projects currently active",
        ProjectStatus::Completed => "Projects successfully delivered",
    }
}

fn status_icon(status: ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Queue => "⏳",
        ProjectStatus::InProgress => "🔄",
        ProjectStatus::Completed => "✅",
    }
}

/// Status counts and the most recent projects.
pub struct DashboardView<'a>(pub &'a Board);

impl fmt::Display for DashboardView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self.0.status_counts();

        writeln!(f, "📊 PARTNER DASHBOARD")?;
        writeln!(f, "====================")?;
        writeln!(f)?;
        for status in ProjectStatus::ALL {
            writeln!(
                f,
                "{} {:<12} {:>3}   {}",
                status_icon(status),
                status.label(),
                counts.get(status),
                status_description(status)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "🕑 RECENT ACTIVITY")?;
        writeln!(f, "──────────────────")?;

        let recent = self.0.recent_projects(RECENT_LIMIT);
        if recent.is_empty() {
            writeln!(f, "No projects found. Start by adding a new project.")?;
            return Ok(());
        }
        for project in recent {
            writeln!(
                f,
                "• {} [{}] {} ({})",
                project.title,
                project.status.label(),
                company_badge(project.company),
                format_date(project.created_at)
            )?;
            if !project.description.is_empty() {
                writeln!(f, "    {}", project.description)?;
            }
        }
        Ok(())
    }
}

pub fn render_dashboard(board: &Board) -> String {
    DashboardView(board).to_string()
}
