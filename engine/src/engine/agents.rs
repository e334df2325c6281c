// engine/src/engine/agents.rs
#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::behavior::{Behavior, ControlledState, IdmParams, LinearParams, SpeedLadder};
use crate::engine::vehicle::{Control, Vehicle};

/// Builds a vehicle of some behavioural type from an existing vehicle's state.
///
/// The produced vehicle keeps the source's id, kinematics, lane bookkeeping
/// and crash flag; only the behaviour (and anything derived from it) changes.
pub trait AgentFactory {
    fn create_from(&self, source: &Vehicle) -> Vehicle;
}

impl<F> AgentFactory for F
where
    F: Fn(&Vehicle) -> Vehicle,
{
    fn create_from(&self, source: &Vehicle) -> Vehicle {
        self(source)
    }
}

fn with_behavior(source: &Vehicle, behavior: Behavior) -> Vehicle {
    Vehicle {
        behavior,
        control: Control::default(),
        lane_change_timer: 0.0,
        ..source.clone()
    }
}

impl AgentFactory for IdmParams {
    fn create_from(&self, source: &Vehicle) -> Vehicle {
        with_behavior(source, Behavior::Idm(*self))
    }
}

impl AgentFactory for LinearParams {
    fn create_from(&self, source: &Vehicle) -> Vehicle {
        with_behavior(source, Behavior::Linear(*self))
    }
}

impl AgentFactory for SpeedLadder {
    fn create_from(&self, source: &Vehicle) -> Vehicle {
        let velocity_index = self.index_of(source.velocity);
        let mut v = with_behavior(
            source,
            Behavior::Controlled(ControlledState {
                ladder: *self,
                velocity_index,
            }),
        );
        v.target_velocity = self.speed(velocity_index);
        v
    }
}

/**
 * Named behaviour models with default parameters.
 *
 * Used by the CLI, config files and the Python bindings to pick the traffic model.
 */
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Controlled,
    #[default]
    Idm,
    Linear,
}

impl AgentKind {
    pub fn all() -> &'static [AgentKind] {
        &[AgentKind::Controlled, AgentKind::Idm, AgentKind::Linear]
    }

    pub fn name(self) -> &'static str {
        match self {
            AgentKind::Controlled => "controlled",
            AgentKind::Idm => "idm",
            AgentKind::Linear => "linear",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "controlled" | "mdp" | "discrete" => Some(AgentKind::Controlled),
            "idm" | "intelligent_driver" => Some(AgentKind::Idm),
            "linear" => Some(AgentKind::Linear),
            _ => None,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!("unknown agent kind {s:?} (expected one of controlled, idm, linear)")
        })
    }
}

impl AgentFactory for AgentKind {
    fn create_from(&self, source: &Vehicle) -> Vehicle {
        match self {
            AgentKind::Controlled => SpeedLadder::default().create_from(source),
            AgentKind::Idm => IdmParams::default().create_from(source),
            AgentKind::Linear => LinearParams::default().create_from(source),
        }
    }
}
