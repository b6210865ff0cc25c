use anyhow::{Context, Result};

use super::{Command, CommandContext};
use crate::model::{NewProject, NewUpdate, ProjectStatus};
use crate::workflow::{StatusMove, TransitionResult, WorkflowStore};

pub struct AddProjectCommand {
    context: CommandContext,
    input: NewProject,
}

impl AddProjectCommand {
    pub fn new(context: CommandContext, input: NewProject) -> Self {
        Self { context, input }
    }
}

impl Command for AddProjectCommand {
    async fn execute(&self) -> Result<()> {
        self.input.validate()?;
        let sessions = self.context.sessions().await?;
        let session = sessions.require_session()?;

        let workflow = self.context.board().await?;
        let id = workflow
            .create_project(session, self.input.clone())
            .await
            .context("Failed to create project")?;
        println!("✅ Created project {} [{}]", self.input.title, id);
        Ok(())
    }
}

pub struct AddUpdateCommand {
    context: CommandContext,
    input: NewUpdate,
}

impl AddUpdateCommand {
    pub fn new(context: CommandContext, input: NewUpdate) -> Self {
        Self { context, input }
    }
}

impl Command for AddUpdateCommand {
    async fn execute(&self) -> Result<()> {
        self.input.validate()?;
        let sessions = self.context.sessions().await?;
        let session = sessions.require_session()?;

        let workflow = self.context.board().await?;
        if workflow.board().project(&self.input.project_id).is_none() {
            println!("⚠️  Project {} is not on the board; posting anyway", self.input.project_id);
        }
        let id = workflow
            .create_update(session, self.input.clone())
            .await
            .context("Failed to post update")?;
        println!("📝 Posted update {} on {}", id, self.input.project_id);
        Ok(())
    }
}

/// What a status command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRequest {
    Step(StatusMove),
    To { status: ProjectStatus, force: bool },
}

pub struct StatusCommand {
    context: CommandContext,
    project_id: String,
    request: StatusRequest,
}

impl StatusCommand {
    pub fn new(context: CommandContext, project_id: String, request: StatusRequest) -> Self {
        Self {
            context,
            project_id,
            request,
        }
    }

    async fn apply(&self, workflow: &WorkflowStore) -> Result<()> {
        let id = self.project_id.as_str();
        let result = match self.request {
            StatusRequest::Step(StatusMove::Advance) => workflow.advance(id).await?,
            StatusRequest::Step(StatusMove::Retreat) => workflow.retreat(id).await?,
            StatusRequest::To { status, force: true } => {
                workflow.force_status(id, status).await?;
                println!("⚠️  Project {id} forced to {}", status.label());
                return Ok(());
            }
            StatusRequest::To { status, force: false } => {
                workflow.transition_status(id, status).await?
            }
        };

        match result {
            TransitionResult::Moved { from, to } => {
                println!("✅ Project {id}: {} → {}", from.label(), to.label())
            }
            TransitionResult::Unchanged { status } => {
                println!("ℹ️  Project {id} is already {}", status.label())
            }
        }
        Ok(())
    }
}

impl Command for StatusCommand {
    async fn execute(&self) -> Result<()> {
        let sessions = self.context.sessions().await?;
        sessions.require_session()?;

        let workflow = self.context.board().await?;
        self.apply(&workflow).await
    }
}
