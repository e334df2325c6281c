// highway_cli/src/config.rs
#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use highway_engine::{MdpConfig, ScenarioConfig};

/**
 * On-disk run configuration.
 *
 * ```json
 * { "scenario": { "lanes_count": 3, "vehicles_type": "linear" },
 *   "mdp": { "action_timestep": 0.1 } }
 * ```
 *
 * Every field is optional; missing ones take the engine defaults.
 */
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub scenario: ScenarioConfig,
    pub mdp: MdpConfig,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let cfg: RunConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        cfg.mdp
            .validate()
            .with_context(|| format!("Invalid timing in {}", path.display()))?;
        Ok(cfg)
    }
}
