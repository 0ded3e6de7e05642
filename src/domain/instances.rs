//! Instance records and the categorized snapshot derived from them.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reported state of a single application instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstanceState {
    Running,
    Starting,
    Flapping,
    Down,
    Crashed,
    #[serde(other)]
    Unknown,
}

impl InstanceState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Starting => "starting",
            Self::Flapping => "flapping",
            Self::Down => "down",
            Self::Crashed => "crashed",
            Self::Unknown => "unknown",
        }
    }
}

/// One instance as returned by the instances endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub state: InstanceState,
    pub details: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

impl InstanceRecord {
    #[must_use]
    pub fn new(state: InstanceState) -> Self {
        Self {
            state,
            details: None,
            since: None,
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_owned());
        self
    }
}

/// Per-state instance counts at one point in time.
///
/// `total` counts every instance, including ones with an unrecognized state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceSnapshot {
    pub running: usize,
    pub starting: usize,
    pub flapping: usize,
    pub down: usize,
    pub crashed: usize,
    pub total: usize,
    pub starting_details: HashSet<String>,
}

impl InstanceSnapshot {
    /// Count instances by state.
    #[must_use]
    pub fn from_instances(instances: &[InstanceRecord]) -> Self {
        let mut snapshot = Self {
            total: instances.len(),
            ..Self::default()
        };
        for inst in instances {
            match inst.state {
                InstanceState::Running => snapshot.running += 1,
                InstanceState::Starting => {
                    snapshot.starting += 1;
                    if let Some(details) = inst.details.as_deref().filter(|d| !d.is_empty()) {
                        snapshot.starting_details.insert(details.to_owned());
                    }
                }
                InstanceState::Flapping => snapshot.flapping += 1,
                InstanceState::Down => snapshot.down += 1,
                InstanceState::Crashed => snapshot.crashed += 1,
                InstanceState::Unknown => {}
            }
        }
        snapshot
    }

    #[must_use]
    pub fn has_running(&self) -> bool {
        self.running > 0
    }

    /// Whether any instance is crashing or repeatedly restarting.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.flapping > 0 || self.crashed > 0
    }

    /// Human-readable progress line, e.g.
    /// `"0 of 2 instances running, 2 starting (downloading droplet)"`.
    #[must_use]
    pub fn details_line(&self) -> String {
        let mut parts = vec![format!(
            "{} of {} instances running",
            self.running, self.total
        )];

        if self.starting > 0 {
            if self.starting_details.is_empty() {
                parts.push(format!("{} starting", self.starting));
            } else {
                let mut info: Vec<&str> =
                    self.starting_details.iter().map(String::as_str).collect();
                info.sort_unstable();
                parts.push(format!("{} starting ({})", self.starting, info.join(", ")));
            }
        }
        if self.down > 0 {
            parts.push(format!("{} down", self.down));
        }
        if self.flapping > 0 {
            parts.push(format!("{} failing", self.flapping));
        }
        if self.crashed > 0 {
            parts.push(format!("{} crashed", self.crashed));
        }

        parts.join(", ")
    }
}
