//! Scripted git runner for unit tests

use crate::git::{CommandRunner, GitOutput};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;

/// Answers git invocations from a table keyed by the space-joined arguments.
/// Anything unscripted fails like an unknown git command would.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: HashMap<String, GitOutput>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(self, command: &str, stdout: &str) -> Self {
        self.ok_bytes(command, stdout.as_bytes())
    }

    pub fn ok_bytes(mut self, command: &str, stdout: &[u8]) -> Self {
        self.responses.insert(
            command.to_string(),
            GitOutput {
                success: true,
                stdout: stdout.to_vec(),
                stderr: String::new(),
            },
        );
        self
    }

    pub fn fail(mut self, command: &str, stderr: &str) -> Self {
        self.responses.insert(
            command.to_string(),
            GitOutput {
                success: false,
                stdout: Vec::new(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, args: &[&str]) -> io::Result<GitOutput> {
        let key = args.join(" ");
        self.calls.borrow_mut().push(key.clone());
        Ok(self.responses.get(&key).cloned().unwrap_or_else(|| GitOutput {
            success: false,
            stdout: Vec::new(),
            stderr: format!("unscripted git command: {key}"),
        }))
    }
}
