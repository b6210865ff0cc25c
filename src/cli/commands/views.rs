use anyhow::Result;

use super::{Command, CommandContext};
use crate::views::{render, View};

/// One-shot rendering of a board view.
pub struct ViewCommand {
    context: CommandContext,
    view: View,
}

impl ViewCommand {
    pub fn new(context: CommandContext, view: View) -> Self {
        Self { context, view }
    }
}

impl Command for ViewCommand {
    async fn execute(&self) -> Result<()> {
        let workflow = self.context.board().await?;
        print!("{}", render(self.view, &workflow.board()));
        Ok(())
    }
}
