use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dialogscript")]
#[command(about = "Scripted dialog agent CLI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Say(SayArgs),
}

/// Where the conversation lives: together these locate the state file.
#[derive(Debug, Clone, Args)]
pub(crate) struct AddressArgs {
    #[arg(long = "state-dir")]
    pub(crate) state_dir: String,
    #[arg(long = "channel")]
    pub(crate) channel: String,
    #[arg(long = "conversation")]
    pub(crate) conversation: String,
    #[arg(long = "user")]
    pub(crate) user: String,
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "entry-dialog")]
    pub(crate) entry_dialog: Option<String>,
    #[arg(long = "thread")]
    pub(crate) thread: Option<String>,
    #[command(flatten)]
    pub(crate) address: AddressArgs,
}

#[derive(Debug, Args)]
pub(crate) struct SayArgs {
    #[command(flatten)]
    pub(crate) address: AddressArgs,
    #[arg(long = "text")]
    pub(crate) text: String,
}
