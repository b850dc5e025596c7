use std::sync::Arc;

use ds_core::{Activity, ConversationKeyDeriver, DialogError, LaunchOptions};
use ds_runtime::DialogStack;
use tracing::info;

use crate::{
    collect_turn, emit_turn, load_record, load_scripts, save_record, state_path, AddressArgs,
    AgentArgs, AgentCommand, ConversationRecord, SayArgs, StartArgs, DEFAULT_ENTRY_DIALOG,
    DIALOG_STATE_SCHEMA, STATE_NAMESPACE,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, DialogError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Say(args) => run_say(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, DialogError> {
    let scripts = load_scripts(&args.scripts_dir)?;
    let entry_dialog = args
        .entry_dialog
        .unwrap_or_else(|| DEFAULT_ENTRY_DIALOG.to_string());
    let storage_key = storage_key(&address_activity(&args.address, ""))?;

    let mut stack = DialogStack::new(Arc::new(scripts.dialogs));
    let options = LaunchOptions {
        thread: args.thread,
        channel: Some(args.address.channel.clone()),
        ..LaunchOptions::default()
    };
    info!(dialog = %entry_dialog, key = %storage_key, "starting conversation");
    let status = stack.start(&entry_dialog, options)?;
    let report = collect_turn(&mut stack, status, 0);

    let record = ConversationRecord {
        schema_version: DIALOG_STATE_SCHEMA.to_string(),
        scripts_dir: scripts.scripts_dir.to_string_lossy().to_string(),
        entry_dialog,
        stack: stack.snapshot(),
    };
    save_record(&state_path(&args.address.state_dir, &storage_key)?, &record)?;
    emit_turn(&report, &storage_key);
    Ok(0)
}

pub(super) fn run_say(args: SayArgs) -> Result<i32, DialogError> {
    let activity = address_activity(&args.address, &args.text);
    let storage_key = storage_key(&activity)?;
    let path = state_path(&args.address.state_dir, &storage_key)?;

    let record = load_record(&path)?;
    let scripts = load_scripts(&record.scripts_dir)?;
    let mut stack = DialogStack::from_snapshot(Arc::new(scripts.dialogs), record.stack)?;

    let status = stack.continue_turn(&activity)?;
    let report = collect_turn(&mut stack, status, 0);

    let record = ConversationRecord {
        stack: stack.snapshot(),
        ..record
    };
    save_record(&path, &record)?;
    emit_turn(&report, &storage_key);
    Ok(0)
}

fn address_activity(address: &AddressArgs, text: &str) -> Activity {
    Activity::message(
        address.channel.as_str(),
        address.conversation.as_str(),
        address.user.as_str(),
        text,
    )
}

fn storage_key(activity: &Activity) -> Result<String, DialogError> {
    ConversationKeyDeriver::new(STATE_NAMESPACE).storage_key(activity)
}
