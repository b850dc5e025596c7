use std::ffi::OsString;

use clap::Parser;
use ds_core::DialogError;

mod agent;
mod cli_args;
mod error_map;
mod models;
mod source_loader;
mod state_store;
mod turn_runner;

pub(crate) use cli_args::{AddressArgs, AgentArgs, AgentCommand, Cli, Mode, SayArgs, StartArgs};
pub(crate) use error_map::{emit_error, CliFailure};
pub(crate) use models::{
    ConversationRecord, LoadedScripts, TurnReport, DEFAULT_ENTRY_DIALOG, DIALOG_FILE_SUFFIX,
    DIALOG_STATE_SCHEMA, STATE_NAMESPACE,
};
pub(crate) use source_loader::load_scripts;
pub(crate) use state_store::{load_record, save_record, state_path};
pub(crate) use turn_runner::{collect_turn, emit_turn};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, DialogError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args),
    }
}
