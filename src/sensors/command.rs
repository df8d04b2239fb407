//! Process boundary for the diagnostic command

use std::io;
use std::process::Command;

/// Everything a read needs from a finished child process
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Non-empty lines written to stderr
    pub fn error_lines(&self) -> impl Iterator<Item = &str> {
        self.stderr.lines().map(str::trim_end).filter(|l| !l.trim().is_empty())
    }

    /// First non-empty line written to stdout
    pub fn first_line(&self) -> Option<&str> {
        self.stdout.lines().find(|l| !l.trim().is_empty())
    }
}

/// Runs a program to completion and captures its output.
///
/// Implementations block until the child exits.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

/// Spawns real processes with `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
