//! Sensors module - Raspberry Pi CPU telemetry read through `vcgencmd`

pub mod command;
pub mod log;
pub mod parse;
pub mod picpu;
pub mod provider;
pub mod reading;

#[cfg(test)]
pub mod testing;
