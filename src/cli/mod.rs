use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::ProjectStatus;
use crate::views::View;

pub mod commands;

#[derive(Parser)]
#[command(name = "partner-board")]
#[command(about = "Shared project board for the Ello and Stacia partnership")]
#[command(long_about = "Partner board tracks joint projects through queue, in-progress and \
                       completed. Every client works on one shared document and sees other \
                       clients' changes as they land. Start with 'partner-board login'.")]
pub struct Cli {
    /// Shared board document (overrides store.path from configuration)
    #[arg(long, global = true, help = "Path to the shared board document")]
    pub store: Option<PathBuf>,
    /// Emit logs as JSON
    #[arg(long, global = true, help = "Write structured JSON logs to stderr")]
    pub json_logs: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in as one of the partner accounts
    Login {
        username: String,
        password: String,
    },
    /// Forget the signed-in account
    Logout,
    /// Show who is signed in
    Whoami,
    /// Status counts and the most recent projects
    Dashboard,
    /// Projects grouped by workflow status
    Queue,
    /// Every project with its updates
    Projects,
    /// Create a project (signed in)
    AddProject {
        #[arg(long, help = "Project title (required, not blank)")]
        title: String,
        #[arg(long, default_value = "", help = "Free-form description")]
        description: String,
        #[arg(long, help = "Initial status: queue, in-progress or completed")]
        status: Option<ProjectStatus>,
    },
    /// Post an update on a project (signed in)
    AddUpdate {
        #[arg(allow_hyphen_values = true)]
        project_id: String,
        #[arg(long, help = "Update text (required, not blank)")]
        content: String,
    },
    /// Move a project one step forward
    Advance {
        #[arg(allow_hyphen_values = true)]
        project_id: String,
    },
    /// Move a project one step back
    Retreat {
        #[arg(allow_hyphen_values = true)]
        project_id: String,
    },
    /// Move a project to a given status
    Move {
        // push ids may start with '-'
        #[arg(allow_hyphen_values = true)]
        project_id: String,
        status: ProjectStatus,
        /// Skip the workflow rules
        #[arg(long, help = "Write the status even if the move skips a stage")]
        force: bool,
    },
    /// Re-render a view whenever the board changes, until Ctrl-C
    Watch {
        #[arg(long, value_enum, default_value_t = View::Dashboard)]
        view: View,
    },
}
