use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn demos_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
        .join("scripts")
}

fn state_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();
    std::env::temp_dir().join(format!("dialogscript-smoke-{}-{}", name, nanos))
}

fn run(args: &[&str], state_dir: &Path, conversation: &str) -> String {
    let output: Output = Command::new(env!("CARGO_BIN_EXE_dialogscript"))
        .args(args)
        .arg("--state-dir")
        .arg(state_dir)
        .args(["--channel", "smoke", "--conversation", conversation, "--user", "tester"])
        .output()
        .expect("cli should execute");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if !output.status.success() {
        panic!(
            "command {:?} failed\nstdout:\n{}\nstderr:\n{}",
            args,
            stdout,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    assert!(stdout.starts_with("RESULT:OK"), "unexpected stdout:\n{}", stdout);
    stdout
}

fn message_texts(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix("MESSAGE_JSON:"))
        .map(|json| {
            let message: serde_json::Value =
                serde_json::from_str(json).expect("message line should be json");
            message["text"].as_str().unwrap_or_default().to_string()
        })
        .collect()
}

#[test]
fn agent_start_runs_every_demo() {
    let mut directories = fs::read_dir(demos_root())
        .expect("demos root must exist")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect::<Vec<_>>();
    directories.sort();
    assert!(!directories.is_empty(), "expected demo scripts");

    for directory in directories {
        let name = directory
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let scripts = directory.to_string_lossy().to_string();
        let stdout = run(
            &["agent", "start", "--scripts-dir", &scripts],
            &state_dir(&name),
            "start",
        );
        assert!(stdout.contains("EVENT:WAITING"), "{} should wait:\n{}", name, stdout);
        assert!(
            stdout.contains("STATE_KEY:smoke/conversations/start-tester/dialogState"),
            "{} should print the state key:\n{}",
            name,
            stdout
        );
    }
}

#[test]
fn child_dialog_demo_completes_across_turns() {
    let scripts = demos_root()
        .join("03-child-dialog")
        .to_string_lossy()
        .to_string();
    let state = state_dir("child-dialog");

    let stdout = run(&["agent", "start", "--scripts-dir", &scripts], &state, "c1");
    assert_eq!(
        message_texts(&stdout),
        vec!["Let's set up your account.", "What should we call you?"]
    );

    let stdout = run(&["agent", "say", "--text", "Ada"], &state, "c1");
    assert!(stdout.contains("EVENT:WAITING"));
    assert_eq!(message_texts(&stdout), vec!["Which city are you in?"]);

    let stdout = run(&["agent", "say", "--text", "Paris"], &state, "c1");
    assert!(stdout.contains("EVENT:COMPLETE"));
    assert_eq!(
        message_texts(&stdout),
        vec!["Welcome aboard, Ada from Paris!"]
    );
    let results = stdout
        .lines()
        .filter(|line| line.starts_with("RESULT_JSON:"))
        .count();
    assert_eq!(results, 2);

    let stdout = run(&["agent", "say", "--text", "again"], &state, "c1");
    assert!(stdout.contains("EVENT:EMPTY"));
}

#[test]
fn rich_messages_demo_chunks_carousel_and_hands_off() {
    let scripts = demos_root()
        .join("04-rich-messages")
        .to_string_lossy()
        .to_string();
    let state = state_dir("rich-messages");

    let stdout = run(&["agent", "start", "--scripts-dir", &scripts], &state, "c1");
    let texts = message_texts(&stdout);
    assert_eq!(
        texts,
        vec![
            "",
            "Here is what we have:",
            "Here is what we have:",
            "Anything catch your eye?"
        ]
    );

    let stdout = run(&["agent", "say", "--text", "tea"], &state, "c1");
    assert!(stdout.contains("EVENT:WAITING"));
    assert!(message_texts(&stdout).is_empty());

    let stdout = run(&["agent", "say", "--text", "done"], &state, "c1");
    assert!(stdout.contains("EVENT:COMPLETE"));
    assert_eq!(
        message_texts(&stdout),
        vec!["Your order:\ntea\ndone", "", "Bye!"]
    );
}

#[test]
fn agent_say_without_state_reports_error() {
    let state = state_dir("no-state");
    let output = Command::new(env!("CARGO_BIN_EXE_dialogscript"))
        .args(["agent", "say", "--text", "hi", "--state-dir"])
        .arg(&state)
        .args(["--channel", "smoke", "--conversation", "c9", "--user", "tester"])
        .output()
        .expect("cli should execute");
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:CLI_STATE_NOT_FOUND"));
}
