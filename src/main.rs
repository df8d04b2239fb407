//! rmcp-picpu: MCP server for Raspberry Pi CPU telemetry
//!
//! Hosts the `hostsensor.picpu` component: CPU temperature, ARM clock
//! frequency and core voltage, each read on demand through `vcgencmd`.
//!
//! The server owns the value table (three values, three poll controls) and
//! applies a timeout to every read; the component itself never blocks on
//! anything but the child process.

use clap::{Parser, Subcommand};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters, ServerHandler},
    model::*,
    ErrorData as McpError,
    ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// === Modules ===

mod config;
mod sensors;
mod shared;
mod values;

use config::Config;
use sensors::command::SystemRunner;
use sensors::log::TracingLog;
use sensors::picpu::{HardwareCpu, PollParams, SetPollParams, SystemCpu, COMPONENT_OID};
use sensors::provider::SensorProvider;
use sensors::reading::SensorKind;
use values::ValueTable;

// === CLI ===

#[derive(Parser)]
#[command(name = "rmcp-picpu")]
#[command(about = "MCP server for Raspberry Pi CPU temperature, frequency and voltage")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the config file in your editor
    Config,
    /// Read values once and print them as JSON
    Read {
        /// Values to read: temperature, frequency, voltage (default: all)
        values: Vec<String>,
    },
}

// === Common Parameter Types ===

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EmptyParams {}

// === Component setup ===

fn build_component(config: &Config) -> (SystemCpu, ValueTable) {
    let mut values = ValueTable::default();
    let provider = SensorProvider::new(config.command.clone(), SystemRunner, TracingLog);
    let cpu = HardwareCpu::new(COMPONENT_OID, provider, &mut values);

    for uuid in values.apply_overrides(&config.poll) {
        tracing::warn!("Config sets poll interval for unknown value: {}", uuid);
    }

    (cpu, values)
}

// === Server ===

#[derive(Debug)]
pub struct PicpuServer {
    pub tool_router: ToolRouter<Self>,
    cpu: Arc<SystemCpu>,
    values: RwLock<ValueTable>,
    config: Mutex<Config>,
    config_path: Option<PathBuf>,
    read_timeout: Duration,
}

impl PicpuServer {
    pub fn new(config: Config) -> Self {
        Self::with_config_path(config, Config::path())
    }

    /// `config_path` is where poll interval changes are saved
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        let mut tool_router = Self::tool_router();

        // Filter disabled tools
        for tool_name in config::all_tool_names() {
            if !config.is_enabled(tool_name) && tool_router.has_route(tool_name) {
                tool_router.remove_route(tool_name);
                tracing::info!("Disabled tool: {}", tool_name);
            }
        }

        let known: HashSet<&str> = config::all_tool_names().into_iter().collect();
        for tool_name in config.disabled_set() {
            if !known.contains(tool_name.as_str()) {
                tracing::warn!("Config disables unknown tool: {}", tool_name);
            }
        }

        if !config.disabled.is_empty() {
            tracing::info!(
                "Loaded config: {} tools disabled, {} tools active",
                config.disabled.len(),
                tool_router.map.len()
            );
        }

        let (cpu, values) = build_component(&config);
        tracing::info!(
            "Component {} reads through {}",
            cpu.node_uuid(),
            cpu.program()
        );

        Self {
            tool_router,
            cpu: Arc::new(cpu),
            values: RwLock::new(values),
            read_timeout: config.read_timeout(),
            config: Mutex::new(config),
            config_path,
        }
    }
}

// Tool implementations
#[rmcp::tool_router]
impl PicpuServer {
    #[rmcp::tool(description = "Get the CPU temperature in °C (vcgencmd measure_temp)")]
    pub async fn get_cpu_temperature(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        sensors::picpu::get_reading(self.cpu.clone(), SensorKind::Temperature, self.read_timeout)
            .await
    }

    #[rmcp::tool(description = "Get the ARM clock frequency in MHz (vcgencmd measure_clock arm)")]
    pub async fn get_cpu_frequency(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        sensors::picpu::get_reading(self.cpu.clone(), SensorKind::Frequency, self.read_timeout)
            .await
    }

    #[rmcp::tool(description = "Get the core voltage in volts (vcgencmd measure_volts core)")]
    pub async fn get_cpu_voltage(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        sensors::picpu::get_reading(self.cpu.clone(), SensorKind::Voltage, self.read_timeout)
            .await
    }

    #[rmcp::tool(description = "Get CPU temperature, frequency and voltage in one call")]
    pub async fn get_cpu_info(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        sensors::picpu::get_cpu_info(self.cpu.clone(), self.read_timeout).await
    }

    #[rmcp::tool(description = "List the registered values with their units and poll intervals")]
    pub async fn list_values(
        &self,
        Parameters(_params): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        let values = self.values.read().await;
        sensors::picpu::list_values(&values).await
    }

    #[rmcp::tool(description = "Get how often a value should be polled")]
    pub async fn get_poll_interval(
        &self,
        Parameters(params): Parameters<PollParams>,
    ) -> Result<CallToolResult, McpError> {
        let values = self.values.read().await;
        sensors::picpu::get_poll_interval(&values, params).await
    }

    #[rmcp::tool(description = "Set how often a value should be polled, in seconds (0 disables). Saved to the config file.")]
    pub async fn set_poll_interval(
        &self,
        Parameters(params): Parameters<SetPollParams>,
    ) -> Result<CallToolResult, McpError> {
        let uuid = params.value.clone();
        let seconds = params.seconds;

        // Held across the table update and the save so both see one order
        let mut config = self.config.lock().await;

        let result = {
            let mut values = self.values.write().await;
            sensors::picpu::set_poll_interval(&mut values, params).await?
        };

        config.set_poll(&uuid, seconds);
        let saved = match &self.config_path {
            Some(path) => config.save_to(path),
            None => Err(anyhow::anyhow!("Could not determine config directory")),
        };
        if let Err(e) = saved {
            tracing::warn!("Failed to persist poll interval for {}: {}", uuid, e);
        }

        Ok(result)
    }
}

#[rmcp::tool_handler]
impl ServerHandler for PicpuServer {
    fn get_info(&self) -> ServerInfo {
        let description = format!(
            "rmcp-picpu: Raspberry Pi CPU telemetry ({}).\n\
             - values: temperature (°C), frequency (MHz), voltage (V)\n\
             - an unavailable value means the diagnostic command failed or printed something unexpected\n",
            COMPONENT_OID
        );

        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(description),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config) => {
            run_config_command()?;
        }
        Some(Commands::Read { values }) => {
            init_tracing();
            run_read_command(&values)?;
        }
        None => {
            init_tracing();
            run_server().await?;
        }
    }

    Ok(())
}

/// Log to stderr; stdout belongs to the MCP transport or JSON output
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Open config file in user's editor
fn run_config_command() -> anyhow::Result<()> {
    let config_path = Config::path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    // Create config dir if needed
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Create config file from template if it doesn't exist
    if !config_path.exists() {
        let template = include_str!("../picpu.toml.example");
        std::fs::write(&config_path, template)?;
        println!("Created config file: {}", config_path.display());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| "nano".to_string());

    println!("Opening {} with {}", config_path.display(), editor);

    std::process::Command::new(&editor)
        .arg(&config_path)
        .status()?;

    Ok(())
}

/// Read the requested values once and print them
fn run_read_command(uuids: &[String]) -> anyhow::Result<()> {
    let config = Config::load();
    let (cpu, _values) = build_component(&config);

    let readings = if uuids.is_empty() {
        cpu.read_all()
    } else {
        uuids
            .iter()
            .map(|uuid| {
                cpu.read_value(uuid)
                    .ok_or_else(|| anyhow::anyhow!("Unknown value: {}", uuid))
            })
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    println!("{}", serde_json::to_string_pretty(&readings)?);
    Ok(())
}

/// Run the MCP server
async fn run_server() -> anyhow::Result<()> {
    tracing::info!("Starting rmcp-picpu server");

    let server = PicpuServer::new(Config::load());
    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;

    tracing::info!("rmcp-picpu server stopped");
    Ok(())
}
