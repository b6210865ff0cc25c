use anyhow::Result;
use tracing::info;

use super::{Command, CommandContext};
use crate::shutdown::ShutdownCoordinator;
use crate::views::{render, View};

pub struct WatchCommand {
    context: CommandContext,
    view: View,
}

impl WatchCommand {
    pub fn new(context: CommandContext, view: View) -> Self {
        Self { context, view }
    }
}

impl Command for WatchCommand {
    async fn execute(&self) -> Result<()> {
        let workflow = self.context.board().await?;
        let shutdown = ShutdownCoordinator::new();
        shutdown.install_signal_handlers()?;
        let stopped = shutdown.signalled();
        tokio::pin!(stopped);

        let mut rx = workflow.watch_board();
        info!(view = ?self.view, "Watching board");
        loop {
            let frame = render(self.view, &rx.borrow_and_update());
            // clear screen, cursor home
            print!("\x1B[2J\x1B[H{frame}");
            println!();
            println!("👀 Watching for changes. Press Ctrl-C to stop.");

            tokio::select! {
                _ = &mut stopped => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        workflow.detach();
        Ok(())
    }
}
