//! Test doubles for the process and logging seams

use std::io;
use std::sync::Mutex;

use super::command::{CommandOutput, CommandRunner};
use super::log::LogSink;
use super::reading::SensorKind;

/// Returns the same output for every invocation and records the command lines
#[derive(Debug)]
pub struct CannedRunner {
    output: Option<CommandOutput>,
    calls: Mutex<Vec<String>>,
}

impl CannedRunner {
    pub fn output(code: Option<i32>, stdout: &str, stderr: &str) -> Self {
        Self {
            output: Some(CommandOutput {
                code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn stdout(stdout: &str) -> Self {
        Self::output(Some(0), stdout, "")
    }

    /// Behaves like a program that is not installed
    pub fn missing() -> Self {
        Self {
            output: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for CannedRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.lock().unwrap().push(line);

        self.output
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "No such file or directory"))
    }
}

/// Collects logged lines as `"<kind>: <line>"`
#[derive(Debug, Default)]
pub struct RecordingLog {
    lines: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl LogSink for RecordingLog {
    fn error(&self, kind: SensorKind, line: &str) {
        self.lines.lock().unwrap().push(format!("{}: {}", kind, line));
    }
}
