#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use assert_cmd::Command;
use once_cell::sync::Lazy;
use tempfile::TempDir;

use trainer_core::{cli::SCRIPT_ENV_VAR, config::HOME_ENV_VAR};

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh app home directory that outlives the test body.
pub fn fresh_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

/// `trainer_cli` in script mode with its home pointed at `home`.
pub fn script_cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("trainer_cli").expect("binary built");
    cmd.env(SCRIPT_ENV_VAR, "1")
        .env(HOME_ENV_VAR, home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

pub fn stdout_of(cmd: &mut Command, input: &str) -> String {
    let output = cmd.write_stdin(input.to_string()).output().expect("run cli");
    assert!(output.status.success(), "cli exited with {:?}", output.status);
    String::from_utf8(output.stdout).expect("utf-8 stdout")
}
