//! Raspberry Pi CPU component - temperature, clock frequency and core voltage
//!
//! Registers its three values and their poll controls with the host when
//! constructed, and exposes the tool functions the server routes to.

use crate::shared::{format_duration, internal_error};
use crate::values::{ValueDescriptor, ValueHost, ValueTable};
use rmcp::{model::*, ErrorData as McpError};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::command::{CommandRunner, SystemRunner};
use super::log::{LogSink, TracingLog};
use super::provider::SensorProvider;
use super::reading::{SensorKind, SensorReading};

pub const COMPONENT_OID: &str = "hostsensor.picpu";
pub const COMPONENT_NAME: &str = "Raspberry pi CPU";

pub type SystemCpu = HardwareCpu<SystemRunner, TracingLog>;

// === Parameter Types ===

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PollParams {
    #[schemars(description = "Value to inspect: temperature, frequency or voltage (the _poll suffix is also accepted)")]
    pub value: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetPollParams {
    #[schemars(description = "Value to change: temperature, frequency or voltage (the _poll suffix is also accepted)")]
    pub value: String,
    #[schemars(description = "Poll period in seconds, 0 disables polling (default: 300)")]
    pub seconds: u64,
}

// === Component ===

#[derive(Debug)]
pub struct HardwareCpu<R, L> {
    node_uuid: String,
    provider: SensorProvider<R, L>,
}

impl<R: CommandRunner, L: LogSink> HardwareCpu<R, L> {
    pub fn new(
        node_uuid: impl Into<String>,
        provider: SensorProvider<R, L>,
        host: &mut impl ValueHost,
    ) -> Self {
        let node_uuid = node_uuid.into();

        for kind in SensorKind::ALL {
            let value = ValueDescriptor::for_kind(&node_uuid, kind);
            host.register_poll(value.poll_value());
            host.register_value(value);
        }

        Self {
            node_uuid,
            provider,
        }
    }

    pub fn node_uuid(&self) -> &str {
        &self.node_uuid
    }

    /// Diagnostic command the provider runs
    pub fn program(&self) -> &str {
        self.provider.program()
    }

    pub fn read(&self, kind: SensorKind) -> SensorReading {
        self.provider.read(kind)
    }

    /// `None` when `uuid` is not one of this component's values
    pub fn read_value(&self, uuid: &str) -> Option<SensorReading> {
        SensorKind::from_uuid(uuid).map(|kind| self.read(kind))
    }

    pub fn read_all(&self) -> Vec<SensorReading> {
        SensorKind::ALL.into_iter().map(|kind| self.read(kind)).collect()
    }
}

/// Runs a read on the blocking pool, giving up after `timeout`.
///
/// A timed out child is not killed; the blocking thread finishes it.
pub async fn read_with_timeout<R, L>(
    cpu: Arc<HardwareCpu<R, L>>,
    kind: SensorKind,
    timeout: Duration,
) -> Result<SensorReading, McpError>
where
    R: CommandRunner + 'static,
    L: LogSink + 'static,
{
    let task = tokio::task::spawn_blocking(move || cpu.read(kind));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(reading)) => Ok(reading),
        Ok(Err(e)) => Err(internal_error(format!("Sensor read for {} failed: {}", kind, e))),
        Err(_) => {
            tracing::warn!("Timed out reading {} after {:?}", kind, timeout);
            Err(internal_error(format!(
                "Timed out reading {} after {}",
                kind,
                format_duration(timeout.as_secs())
            )))
        }
    }
}

// === Rendering ===

fn title(kind: SensorKind) -> &'static str {
    match kind {
        SensorKind::Temperature => "CPU Temperature",
        SensorKind::Frequency => "CPU Frequency",
        SensorKind::Voltage => "CPU Voltage",
    }
}

pub fn render_reading(reading: &SensorReading) -> String {
    let kind = reading.kind();
    match (reading.value(), reading.error()) {
        (Some(value), _) => format!("{}: {} {}", title(kind), value, kind.spec().unit),
        (None, Some(error)) => format!("{}: unavailable ({})", title(kind), error),
        (None, None) => format!("{}: unavailable", title(kind)),
    }
}

fn render_poll(seconds: u64) -> String {
    if seconds == 0 {
        "disabled".to_string()
    } else {
        format!("every {}", format_duration(seconds))
    }
}

pub fn render_values(table: &ValueTable) -> String {
    let mut out = format!("Values ({} - {}):\n", COMPONENT_OID, COMPONENT_NAME);
    for value in table.values() {
        out.push_str(&format!(
            "\n  {} [{}, {}]: {}\n",
            value.uuid, value.label, value.unit, value.help
        ));
        if let Some(poll) = table.poll(&value.uuid) {
            out.push_str(&format!("    {}: {}\n", poll.uuid, render_poll(poll.seconds)));
        }
    }
    out
}

// === Tool Functions ===

pub async fn get_reading<R, L>(
    cpu: Arc<HardwareCpu<R, L>>,
    kind: SensorKind,
    timeout: Duration,
) -> Result<CallToolResult, McpError>
where
    R: CommandRunner + 'static,
    L: LogSink + 'static,
{
    let reading = read_with_timeout(cpu, kind, timeout).await?;
    Ok(CallToolResult::success(vec![Content::text(render_reading(&reading))]))
}

pub async fn get_cpu_info<R, L>(
    cpu: Arc<HardwareCpu<R, L>>,
    timeout: Duration,
) -> Result<CallToolResult, McpError>
where
    R: CommandRunner + 'static,
    L: LogSink + 'static,
{
    let (temperature, frequency, voltage) = tokio::join!(
        read_with_timeout(cpu.clone(), SensorKind::Temperature, timeout),
        read_with_timeout(cpu.clone(), SensorKind::Frequency, timeout),
        read_with_timeout(cpu, SensorKind::Voltage, timeout),
    );

    let mut output = format!("{}:\n", COMPONENT_NAME);
    for reading in [temperature, frequency, voltage] {
        let line = match reading {
            Ok(reading) => render_reading(&reading),
            Err(e) => e.message.to_string(),
        };
        output.push_str(&format!("\n  {}", line));
    }

    Ok(CallToolResult::success(vec![Content::text(output)]))
}

pub async fn list_values(table: &ValueTable) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(render_values(table))]))
}

pub async fn get_poll_interval(
    table: &ValueTable,
    params: PollParams,
) -> Result<CallToolResult, McpError> {
    let poll = table
        .poll(&params.value)
        .ok_or_else(|| internal_error(format!("Unknown value: {}", params.value)))?;

    let label = table
        .value(&poll.target)
        .map(|v| v.label.as_str())
        .unwrap_or(poll.target.as_str());

    Ok(CallToolResult::success(vec![Content::text(format!(
        "{} ({}): {} ({} seconds)",
        label,
        poll.uuid,
        render_poll(poll.seconds),
        poll.seconds
    ))]))
}

/// Updates the table only; persisting is left to the caller
pub async fn set_poll_interval(
    table: &mut ValueTable,
    params: SetPollParams,
) -> Result<CallToolResult, McpError> {
    let poll = table
        .set_poll_interval(&params.value, params.seconds)
        .map_err(|e| internal_error(e.to_string()))?;

    tracing::info!("Poll interval for {} set to {}s", poll.target, poll.seconds);

    Ok(CallToolResult::success(vec![Content::text(format!(
        "{} set to {}",
        poll.uuid,
        render_poll(poll.seconds)
    ))]))
}
