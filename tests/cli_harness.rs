//! Process-level integration harness for the `lognorm` binary.
//!
//! # What this covers
//!
//! This harness runs `lognorm` as a compiled binary via
//! [`std::process::Command`], feeding records on stdin and reading canonical
//! entries from stdout, which is what an operator piping logs through it
//! would observe.
//!
//! - **One document per record**: every non-blank input line yields exactly
//!   one JSON entry on stdout, in input order.
//! - **Source selection**: `--source` picks the adapter.
//! - **Configuration**: a `--config` file overrides the inbound subject; a
//!   missing or malformed file is a startup failure.
//! - **Exit codes**: clean EOF = 0; bad flags = 2; bad config = non-zero.
//!
//! # What this does NOT cover
//!
//! - Ctrl-C handling (needs signal delivery to a child process)
//! - The `--debug` log file, which lives at a fixed path
//!
//! # Running
//!
//! ```sh
//! cargo test --test cli_harness
//! ```

mod common;
use common::*;

use std::io::Write;
use std::process::{Command, Output, Stdio};

use lognorm_core::{EcsLogEntry, LogLevel};
use pretty_assertions::assert_eq;

fn lognorm() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lognorm"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run_with_stdin(mut cmd: Command, input: impl AsRef<[u8]>) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("lognorm binary starts");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_ref())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn entries(output: &Output) -> Vec<EcsLogEntry> {
    String::from_utf8(output.stdout.clone())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap_or_else(|e| panic!("{e}: {line}")))
        .collect()
}

// ---------------------------------------------------------------------------
// Normal operation
// ---------------------------------------------------------------------------

#[test]
fn container_lines_become_one_entry_each() {
    let input: String = GENERIC_LINES
        .iter()
        .map(|line| EnvelopeBuilder::new(line).pattern("generic").job("api", "service").build())
        .collect::<Vec<_>>()
        .join("\n\n");

    let output = run_with_stdin(lognorm(), &input);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let entries = entries(&output);
    assert_eq!(entries.len(), GENERIC_LINES.len());
    for entry in &entries {
        assert_canonical(entry);
        assert_eq!(parse_error(entry), "");
    }
    assert_eq!(entries[0].message, "nomad: memberlist: Stream connection from=127.0.0.1:48046");
    assert_level!(entries[3], LogLevel::Error);
}

#[test]
fn journal_source_is_selectable() {
    let mut cmd = lognorm();
    cmd.args(["--source", "journal"]);
    let output = run_with_stdin(cmd, &JOURNAL_LINES.join("\n"));
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let entries = entries(&output);
    assert_eq!(entries.len(), JOURNAL_LINES.len());
    assert_eq!(entries[0].message, "Started Session 4 of user core.");
    assert_label!(entries[0], "source", "journal");
}

#[test]
fn invalid_utf8_line_is_normalised_and_later_lines_still_flow() {
    let mut input = Vec::new();
    for line in [GENERIC_LINES[0], GENERIC_LINES[3]] {
        let envelope = EnvelopeBuilder::new(line).pattern("generic").job("api", "service").build();
        input.extend_from_slice(envelope.as_bytes());
        input.extend_from_slice(b"\n\xff\xfe not an envelope\n");
    }

    let output = run_with_stdin(lognorm(), &input);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let entries = entries(&output);
    assert_eq!(entries.len(), 4);
    assert_eq!(parse_error(&entries[0]), "");
    assert_level!(entries[2], LogLevel::Error);
    for garbled in [&entries[1], &entries[3]] {
        assert_canonical(garbled);
        let err = garbled.process_error.as_ref().unwrap();
        assert_eq!(err.raw_data.as_deref(), Some("\u{fffd}\u{fffd} not an envelope"));
        assert!(err.unmarshal_error.is_some());
    }
}

#[test]
fn empty_input_exits_cleanly() {
    let output = run_with_stdin(lognorm(), "");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// The config loader picks the format from the extension.
fn toml_file() -> tempfile::NamedTempFile {
    tempfile::Builder::new().suffix(".toml").tempfile().unwrap()
}

#[test]
fn config_file_overrides_inbound_subject() {
    let mut file = toml_file();
    writeln!(
        file,
        "[sources]\ncontainer_subject = \"edge.container\"\n\n[broker]\nqueue_capacity = 1"
    )
    .unwrap();

    let mut cmd = lognorm();
    cmd.arg("--config").arg(file.path());
    let output = run_with_stdin(cmd, "not an envelope\n");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let entries = entries(&output);
    assert_eq!(entries.len(), 1);
    let err = entries[0].process_error.as_ref().unwrap();
    assert_eq!(err.subject.as_deref(), Some("edge.container"));
    assert_eq!(err.raw_data.as_deref(), Some("not an envelope"));
}

#[test]
fn missing_config_file_fails_startup() {
    let mut cmd = lognorm();
    cmd.args(["--config", "/nonexistent/lognorm.toml"]);
    let output = run_with_stdin(cmd, "");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn malformed_config_file_fails_startup() {
    let mut file = toml_file();
    writeln!(file, "[broker]\nqueue_capacity = \"lots\"").unwrap();

    let mut cmd = lognorm();
    cmd.arg("--config").arg(file.path());
    let output = run_with_stdin(cmd, "");
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

#[test]
fn unknown_flag_exits_with_code_2() {
    let output = lognorm().arg("--no-such-flag").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unknown_source_exits_with_code_2() {
    let output = lognorm().args(["--source", "syslog"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
