// engine/src/mdp/actions.rs
#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use crate::mdp::error::MdpError;

pub const ACTION_DIM: usize = 5;

/// High-level driving decisions; the discriminant is the action id.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Action {
    LaneLeft = 0,
    Idle = 1,
    LaneRight = 2,
    Faster = 3,
    Slower = 4,
}

/// Action id -> action.
pub const ACTIONS: [Action; ACTION_DIM] = [
    Action::LaneLeft,
    Action::Idle,
    Action::LaneRight,
    Action::Faster,
    Action::Slower,
];

/// Action name -> action id. Exact inverse of `ACTIONS`.
pub static ACTIONS_INDEXES: LazyLock<FxHashMap<&'static str, usize>> = LazyLock::new(|| {
    ACTIONS
        .iter()
        .enumerate()
        .map(|(id, a)| (a.name(), id))
        .collect()
});

impl Action {
    #[inline]
    pub const fn id(self) -> usize {
        self as usize
    }

    pub fn from_id(id: usize) -> Result<Self, MdpError> {
        ACTIONS.get(id).copied().ok_or(MdpError::InvalidAction(id))
    }

    pub const fn name(self) -> &'static str {
        match self {
            Action::LaneLeft => "LANE_LEFT",
            Action::Idle => "IDLE",
            Action::LaneRight => "LANE_RIGHT",
            Action::Faster => "FASTER",
            Action::Slower => "SLOWER",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, MdpError> {
        ACTIONS_INDEXES
            .get(name)
            .map(|&id| ACTIONS[id])
            .ok_or_else(|| MdpError::UnknownActionName(name.to_string()))
    }

    #[inline]
    pub const fn is_lane_change(self) -> bool {
        matches!(self, Action::LaneLeft | Action::LaneRight)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = MdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
