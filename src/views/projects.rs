use std::fmt;

use super::{company_badge, format_date, format_datetime};
use crate::workflow::Board;

/// Every project with its updates.
pub struct ProjectsView<'a>(pub &'a Board);

impl fmt::Display for ProjectsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📁 PROJECTS")?;
        writeln!(f, "===========")?;

        let projects = self.0.projects();
        if projects.is_empty() {
            writeln!(f, "No projects found")?;
            writeln!(f, "Start by adding a new project")?;
            return Ok(());
        }

        for project in projects {
            writeln!(f)?;
            writeln!(
                f,
                "{} [{}]  {}  {}",
                project.title,
                project.id,
                project.status.label(),
                company_badge(project.company)
            )?;
            if !project.description.is_empty() {
                writeln!(f, "  {}", project.description)?;
            }
            writeln!(f, "  Created on {}", format_date(project.created_at))?;

            let updates = self.0.project_updates(&project.id);
            if updates.is_empty() {
                continue;
            }
            writeln!(f, "  Updates")?;
            for update in updates {
                writeln!(
                    f,
                    "    - {} ({} · {})",
                    update.content,
                    company_badge(update.company),
                    format_datetime(update.created_at)
                )?;
            }
        }
        Ok(())
    }
}

pub fn render_projects(board: &Board) -> String {
    ProjectsView(board).to_string()
}
