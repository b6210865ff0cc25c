use anyhow::{bail, Result};

use super::{Command, CommandContext};

pub struct LoginCommand {
    context: CommandContext,
    username: String,
    password: String,
}

impl LoginCommand {
    pub fn new(context: CommandContext, username: String, password: String) -> Self {
        Self {
            context,
            username,
            password,
        }
    }
}

impl Command for LoginCommand {
    async fn execute(&self) -> Result<()> {
        let mut sessions = self.context.sessions().await?;
        if !sessions.login(&self.username, &self.password).await? {
            bail!("Invalid username or password");
        }
        if let Some(session) = sessions.session() {
            let user = session.user();
            println!("✅ Signed in as {} ({})", user.name, user.company.display_name());
        }
        Ok(())
    }
}

pub struct LogoutCommand {
    context: CommandContext,
}

impl LogoutCommand {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }
}

impl Command for LogoutCommand {
    async fn execute(&self) -> Result<()> {
        let mut sessions = self.context.sessions().await?;
        let was_signed_in = sessions.session().is_some();
        sessions.logout().await?;
        if was_signed_in {
            println!("👋 Signed out");
        } else {
            println!("ℹ️  Nobody was signed in");
        }
        Ok(())
    }
}

pub struct WhoamiCommand {
    context: CommandContext,
}

impl WhoamiCommand {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }
}

impl Command for WhoamiCommand {
    async fn execute(&self) -> Result<()> {
        let sessions = self.context.sessions().await?;
        match sessions.session() {
            Some(session) => {
                let user = session.user();
                println!("👤 {} ({})", user.name, user.username);
                println!("   🏢 {}", user.company.display_name());
            }
            None => println!("🔒 Not signed in. Run 'partner-board login <username> <password>'."),
        }
        Ok(())
    }
}
