//! Value registry - the host side of value registration and poll intervals
//!
//! Components publish readable values and their poll controls through
//! [`ValueHost`]. [`ValueTable`] is the in-memory host used by the server.
//! Nothing here schedules polls; the table only stores the intervals.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::sensors::reading::SensorKind;

/// Poll period given to every value unless configured otherwise
pub const DEFAULT_POLL_SECS: u64 = 300;

const POLL_SUFFIX: &str = "_poll";

#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("unknown value: {0}")]
    UnknownValue(String),
}

/// A readable value published by a component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDescriptor {
    pub uuid: String,
    pub node_uuid: String,
    pub label: String,
    pub help: String,
    pub unit: String,
    pub kind: SensorKind,
}

impl ValueDescriptor {
    pub fn for_kind(node_uuid: &str, kind: SensorKind) -> Self {
        let spec = kind.spec();
        Self {
            uuid: kind.uuid().to_string(),
            node_uuid: node_uuid.to_string(),
            label: spec.label.to_string(),
            help: spec.help.to_string(),
            unit: spec.unit.to_string(),
            kind,
        }
    }

    /// Poll control for this value, at the default period
    pub fn poll_value(&self) -> PollValue {
        PollValue {
            uuid: format!("{}{}", self.uuid, POLL_SUFFIX),
            target: self.uuid.clone(),
            seconds: DEFAULT_POLL_SECS,
        }
    }
}

/// How often the host should read `target`. 0 disables polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollValue {
    pub uuid: String,
    pub target: String,
    pub seconds: u64,
}

/// Registration capability offered by the host to components
pub trait ValueHost {
    fn register_value(&mut self, value: ValueDescriptor);
    fn register_poll(&mut self, poll: PollValue);
}

/// Registered values and poll controls, in registration order
#[derive(Debug, Default)]
pub struct ValueTable {
    values: Vec<ValueDescriptor>,
    polls: BTreeMap<String, PollValue>,
}

impl ValueHost for ValueTable {
    fn register_value(&mut self, value: ValueDescriptor) {
        if let Some(existing) = self.values.iter_mut().find(|v| v.uuid == value.uuid) {
            tracing::warn!("Value {} registered twice, replacing", value.uuid);
            *existing = value;
        } else {
            self.values.push(value);
        }
    }

    fn register_poll(&mut self, poll: PollValue) {
        self.polls.insert(poll.target.clone(), poll);
    }
}

impl ValueTable {
    pub fn values(&self) -> &[ValueDescriptor] {
        &self.values
    }

    pub fn value(&self, uuid: &str) -> Option<&ValueDescriptor> {
        self.values.iter().find(|v| v.uuid == uuid)
    }

    /// Accepts either the value uuid or its poll uuid
    pub fn poll(&self, uuid: &str) -> Option<&PollValue> {
        let target = uuid.strip_suffix(POLL_SUFFIX).unwrap_or(uuid);
        self.polls.get(target)
    }

    #[cfg(test)]
    pub fn poll_interval(&self, uuid: &str) -> Option<u64> {
        self.poll(uuid).map(|p| p.seconds)
    }

    pub fn set_poll_interval(
        &mut self,
        uuid: &str,
        seconds: u64,
    ) -> Result<&PollValue, ValueError> {
        let target = uuid.strip_suffix(POLL_SUFFIX).unwrap_or(uuid);
        let poll = self
            .polls
            .get_mut(target)
            .ok_or_else(|| ValueError::UnknownValue(uuid.to_string()))?;
        poll.seconds = seconds;
        Ok(poll)
    }

    /// Applies configured intervals, returning the keys that matched nothing
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, u64>) -> Vec<String> {
        let mut unknown = Vec::new();
        for (uuid, seconds) in overrides {
            if self.set_poll_interval(uuid, *seconds).is_err() {
                unknown.push(uuid.clone());
            }
        }
        unknown
    }
}
