use anyhow::Result;
use clap::Parser;

use partner_board::cli::commands::auth::{LoginCommand, LogoutCommand, WhoamiCommand};
use partner_board::cli::commands::mutate::{
    AddProjectCommand, AddUpdateCommand, StatusCommand, StatusRequest,
};
use partner_board::cli::commands::views::ViewCommand;
use partner_board::cli::commands::watch::WatchCommand;
use partner_board::cli::commands::{Command, CommandContext};
use partner_board::cli::{Cli, Commands};
use partner_board::config::BoardConfig;
use partner_board::model::{NewProject, NewUpdate};
use partner_board::telemetry::init_telemetry;
use partner_board::views::View;
use partner_board::workflow::StatusMove;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = BoardConfig::load_env_file() {
        eprintln!("⚠️  Ignoring unreadable .env file: {e}");
    }
    let config = BoardConfig::load()?;
    init_telemetry(
        &config.observability.log_level,
        cli.json_logs || config.observability.json_logs,
    )?;

    let context = CommandContext::new(config, cli.store);

    tokio::runtime::Runtime::new()?.block_on(async {
        match cli.command {
            Commands::Login { username, password } => {
                LoginCommand::new(context, username, password).execute().await
            }
            Commands::Logout => LogoutCommand::new(context).execute().await,
            Commands::Whoami => WhoamiCommand::new(context).execute().await,
            Commands::Dashboard => ViewCommand::new(context, View::Dashboard).execute().await,
            Commands::Queue => ViewCommand::new(context, View::Queue).execute().await,
            Commands::Projects => ViewCommand::new(context, View::Projects).execute().await,
            Commands::AddProject {
                title,
                description,
                status,
            } => {
                let mut input = NewProject::new(title, description);
                input.status = status;
                AddProjectCommand::new(context, input).execute().await
            }
            Commands::AddUpdate {
                project_id,
                content,
            } => {
                AddUpdateCommand::new(context, NewUpdate::new(project_id, content))
                    .execute()
                    .await
            }
            Commands::Advance { project_id } => {
                StatusCommand::new(context, project_id, StatusRequest::Step(StatusMove::Advance))
                    .execute()
                    .await
            }
            Commands::Retreat { project_id } => {
                StatusCommand::new(context, project_id, StatusRequest::Step(StatusMove::Retreat))
                    .execute()
                    .await
            }
            Commands::Move {
                project_id,
                status,
                force,
            } => {
                StatusCommand::new(context, project_id, StatusRequest::To { status, force })
                    .execute()
                    .await
            }
            Commands::Watch { view } => WatchCommand::new(context, view).execute().await,
        }
    })
}
