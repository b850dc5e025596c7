use ds_core::TurnStatus;
use ds_runtime::DialogStack;

use crate::TurnReport;

/// Collects what a finished turn produced. Completed results are only those recorded
/// since `results_before`.
pub(crate) fn collect_turn(
    stack: &mut DialogStack,
    status: TurnStatus,
    results_before: usize,
) -> TurnReport {
    TurnReport {
        status,
        messages: stack.drain_outbox(),
        completed: stack.results()[results_before..].to_vec(),
    }
}

pub(crate) fn emit_turn(report: &TurnReport, state_key: &str) {
    println!("RESULT:OK");
    match report.status {
        TurnStatus::Waiting => println!("EVENT:WAITING"),
        TurnStatus::Complete => println!("EVENT:COMPLETE"),
        TurnStatus::Empty => println!("EVENT:EMPTY"),
    }

    for message in &report.messages {
        println!(
            "MESSAGE_JSON:{}",
            serde_json::to_string(message).expect("message json")
        );
    }

    for completed in &report.completed {
        println!(
            "RESULT_JSON:{}",
            serde_json::to_string(&completed.result.values).expect("values json")
        );
    }

    println!("STATE_KEY:{}", state_key);
}
