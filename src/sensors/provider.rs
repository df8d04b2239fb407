//! Reads one sensor kind by running the diagnostic command and parsing its output

use super::command::{CommandOutput, CommandRunner};
use super::log::LogSink;
use super::reading::{ReadError, SensorKind, SensorReading};

pub const DEFAULT_COMMAND: &str = "vcgencmd";

/// Stateless sensor reader. Every `read` spawns one process; nothing is
/// cached and failures are returned as readings, never as `Err`.
#[derive(Debug)]
pub struct SensorProvider<R, L> {
    program: String,
    runner: R,
    log: L,
}

impl<R: CommandRunner, L: LogSink> SensorProvider<R, L> {
    pub fn new(program: impl Into<String>, runner: R, log: L) -> Self {
        Self {
            program: program.into(),
            runner,
            log,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn read(&self, kind: SensorKind) -> SensorReading {
        let spec = kind.spec();

        let output = match self.runner.run(&self.program, spec.args) {
            Ok(output) => output,
            Err(e) => {
                let msg = format!("Failed to run {}: {}", self.program, e);
                self.log.error(kind, &msg);
                return SensorReading::failed(kind, ReadError::ProcessFailure(msg));
            }
        };

        if let Some(error) = self.process_failure(kind, &output) {
            return SensorReading::failed(kind, error);
        }

        let Some(line) = output.first_line() else {
            let msg = format!("{} printed nothing for {}", self.program, kind);
            self.log.error(kind, &msg);
            return SensorReading::failed(kind, ReadError::ParseFailure(msg));
        };

        match (spec.parse)(line) {
            Some(value) => SensorReading::ok(kind, value),
            None => {
                let msg = format!("Unexpected {} output: {:?}", kind, line.trim());
                self.log.error(kind, &msg);
                SensorReading::failed(kind, ReadError::ParseFailure(msg))
            }
        }
    }

    /// Logs every stderr line once and reports a failure if there was any
    /// stderr output or the exit status was not zero. A silent failure is
    /// logged as the status itself.
    fn process_failure(&self, kind: SensorKind, output: &CommandOutput) -> Option<ReadError> {
        let mut stderr_lines = 0usize;
        let mut first = None;
        for line in output.error_lines() {
            self.log.error(kind, line);
            if first.is_none() {
                first = Some(line.to_string());
            }
            stderr_lines += 1;
        }

        if output.success() && stderr_lines == 0 {
            return None;
        }

        let status = match output.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        let msg = match first {
            Some(line) => format!("{} {}: {}", self.program, status, line),
            None => {
                let msg = format!("{} {}", self.program, status);
                self.log.error(kind, &msg);
                msg
            }
        };
        Some(ReadError::ProcessFailure(msg))
    }
}

#[cfg(test)]
impl<R, L> SensorProvider<R, L> {
    pub fn runner(&self) -> &R {
        &self.runner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testing::{CannedRunner, RecordingLog};

    fn provider(runner: CannedRunner) -> SensorProvider<CannedRunner, RecordingLog> {
        SensorProvider::new(DEFAULT_COMMAND, runner, RecordingLog::default())
    }

    #[test]
    fn test_parses_each_kind() {
        let p = provider(CannedRunner::stdout("temp=42.8'C\n"));
        assert_eq!(p.read(SensorKind::Temperature).value(), Some(42.8));

        let p = provider(CannedRunner::stdout("frequency(45)=1200000000\n"));
        assert_eq!(p.read(SensorKind::Frequency).value(), Some(1200.0));

        let p = provider(CannedRunner::stdout("volt=1.2000V\n"));
        assert_eq!(p.read(SensorKind::Voltage).value(), Some(1.2));
    }

    #[test]
    fn test_runs_fixed_arguments() {
        let p = provider(CannedRunner::stdout("volt=1.2000V\n"));
        p.read(SensorKind::Voltage);
        p.read(SensorKind::Frequency);
        assert_eq!(
            p.runner.calls(),
            vec![
                "vcgencmd measure_volts core".to_string(),
                "vcgencmd measure_clock arm".to_string(),
            ]
        );
    }

    #[test]
    fn test_unavailable_command_yields_none() {
        for kind in SensorKind::ALL {
            let p = provider(CannedRunner::missing());
            let reading = p.read(kind);
            assert_eq!(reading.kind(), kind);
            assert_eq!(reading.value(), None);
            assert!(matches!(reading.error(), Some(ReadError::ProcessFailure(_))));
            assert_eq!(p.log.lines().len(), 1);
        }
    }

    #[test]
    fn test_nonzero_status_yields_none() {
        for kind in SensorKind::ALL {
            // Valid-looking stdout must not rescue a failing status
            let p = provider(CannedRunner::output(Some(1), "temp=42.8'C\n", ""));
            let reading = p.read(kind);
            assert_eq!(reading.value(), None);
            assert!(matches!(reading.error(), Some(ReadError::ProcessFailure(_))));
        }
    }

    #[test]
    fn test_signal_yields_none() {
        let p = provider(CannedRunner::output(None, "", ""));
        let reading = p.read(SensorKind::Temperature);
        assert_eq!(reading.value(), None);
        assert_eq!(
            reading.error(),
            Some(&ReadError::ProcessFailure(
                "vcgencmd terminated by signal".to_string()
            ))
        );
    }

    #[test]
    fn test_silent_failure_logged_once() {
        for code in [Some(1), None] {
            let p = provider(CannedRunner::output(code, "", ""));
            let reading = p.read(SensorKind::Temperature);
            assert_eq!(reading.value(), None);
            assert_eq!(p.log.lines().len(), 1);
        }

        let p = provider(CannedRunner::output(Some(2), "", ""));
        p.read(SensorKind::Voltage);
        assert_eq!(p.log.lines(), vec!["voltage: vcgencmd exit status 2".to_string()]);
    }

    #[test]
    fn test_stderr_with_failing_status_not_logged_twice() {
        let p = provider(CannedRunner::output(Some(1), "", "Command not registered\n"));
        let reading = p.read(SensorKind::Frequency);
        assert_eq!(
            reading.error(),
            Some(&ReadError::ProcessFailure(
                "vcgencmd exit status 1: Command not registered".to_string()
            ))
        );
        assert_eq!(
            p.log.lines(),
            vec!["frequency: Command not registered".to_string()]
        );
    }

    #[test]
    fn test_stderr_lines_logged_once_each() {
        let p = provider(CannedRunner::output(
            Some(0),
            "temp=42.8'C\n",
            "VCHI initialization failed\n\nmmal: open failed\n",
        ));
        let reading = p.read(SensorKind::Temperature);

        assert_eq!(reading.value(), None);
        assert!(matches!(reading.error(), Some(ReadError::ProcessFailure(_))));
        assert_eq!(
            p.log.lines(),
            vec![
                "temperature: VCHI initialization failed".to_string(),
                "temperature: mmal: open failed".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_failure_yields_none() {
        let p = provider(CannedRunner::stdout("volt=unknown\n"));
        let reading = p.read(SensorKind::Voltage);
        assert_eq!(reading.value(), None);
        assert!(matches!(reading.error(), Some(ReadError::ParseFailure(_))));
    }

    #[test]
    fn test_empty_output_is_parse_failure() {
        let p = provider(CannedRunner::stdout("\n\n"));
        let reading = p.read(SensorKind::Frequency);
        assert_eq!(reading.value(), None);
        assert!(matches!(reading.error(), Some(ReadError::ParseFailure(_))));
    }

    #[test]
    fn test_repeated_reads_identical() {
        let p = provider(CannedRunner::stdout("temp=51.0'C\n"));
        let first = p.read(SensorKind::Temperature);
        let second = p.read(SensorKind::Temperature);
        assert_eq!(first, second);
        assert_eq!(p.runner.calls().len(), 2);

        let p = provider(CannedRunner::missing());
        assert_eq!(p.read(SensorKind::Voltage), p.read(SensorKind::Voltage));
    }
}
