// Text renderings of the board
//
// Every view is a pure function of a `Board` so `watch` can re-render on each
// push and tests can assert on the output.

pub mod dashboard;
pub mod projects;
pub mod queue;

use chrono::{DateTime, Local, TimeZone, Utc};
use clap::ValueEnum;

use crate::model::Company;
use crate::workflow::Board;

pub use dashboard::render_dashboard;
pub use projects::render_projects;
pub use queue::render_queue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum View {
    #[default]
    Dashboard,
    Queue,
    Projects,
}

pub fn render(view: View, board: &Board) -> String {
    match view {
        View::Dashboard => render_dashboard(board),
        View::Queue => render_queue(board),
        View::Projects => render_projects(board),
    }
}

fn local_time(millis: i64) -> Option<DateTime<Local>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|t| t.with_timezone(&Local))
}

/// `Mar 4, 2025`
pub fn format_date(millis: i64) -> String {
    local_time(millis)
        .map(|t| t.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}

/// `2025-03-04 14:05`
pub fn format_datetime(millis: i64) -> String {
    local_time(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string())
}

pub(crate) fn company_badge(company: Company) -> String {
    let marker = match company {
        Company::Ello => "🟣",
        Company::Stacia => "🔵",
    };
    format!("{marker} {}", company.display_name())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_timestamp() {
        assert_eq!(format_date(i64::MAX), "unknown date");
        assert!(!format_datetime(0).is_empty());
    }

    #[test]
    fn test_company_badge_uses_display_name() {
        assert!(company_badge(Company::Stacia).ends_with("Stacia Corp"));
        assert!(company_badge(Company::Ello).ends_with("Ello.one"));
    }
}
