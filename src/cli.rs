use clap::{Parser, Subcommand};

/// Slack approval bot: request, approve and reject from a slash command
#[derive(Parser)]
#[command(name = "approval-bot", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP receiver for Slack commands and interactions
    Serve {
        /// Port to bind (defaults to $PORT, then 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print who a user could pick as approver, straight from Slack
    Approvers {
        /// Slack user id of the would-be requester
        #[arg(long)]
        requester: String,
    },
}
