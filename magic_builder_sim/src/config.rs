// Data-driven builder configuration.
//
// Every tunable lives in `BuilderConfig`: the row cadence, the settle delay
// before light sources go in, the world bounds used to clamp plans, whether
// concurrent builds reserve their footprints, and the table of
// `StructureSpec`s keyed by `StructureKind`. The scheduler never uses magic
// numbers; it reads from the config. `Default` gives the shipped values and
// `from_json` loads overrides, with any omitted field falling back to its
// default.
//
// See also: `structures.rs` for the default spec table, `scheduler.rs` and
// `workshop.rs` which read the timing fields, `geometry.rs` which reads the
// bounds and specs.

use crate::error::ConfigError;
use crate::geometry::{GeometryPlanner, StructureSpec};
use crate::structures;
use crate::types::{StructureKind, WorldBounds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// A row is applied on every `cadence_ticks`-th tick while digging.
    pub cadence_ticks: u32,
    /// Ticks between furnishing and light placement, letting the host's
    /// adjacency pass settle the new frame.
    pub settle_ticks: u32,
    pub world: WorldBounds,
    /// When true, the workshop refuses a build whose footprint overlaps an
    /// in-flight one.
    pub reserve_footprints: bool,
    pub structures: BTreeMap<StructureKind, StructureSpec>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            cadence_ticks: 5,
            settle_ticks: 5,
            world: WorldBounds::new(8400, 2400, 40),
            reserve_footprints: true,
            structures: structures::presets(),
        }
    }
}

impl BuilderConfig {
    /// Parse and validate. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: BuilderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cadence_ticks == 0 {
            return Err(ConfigError::Invalid("cadence_ticks must be at least 1".into()));
        }
        let w = self.world;
        if w.width <= 2 * w.margin || w.height <= 2 * w.margin || w.margin < 0 {
            return Err(ConfigError::Invalid(format!(
                "world {}x{} with margin {} leaves no playable area",
                w.width, w.height, w.margin
            )));
        }
        for kind in StructureKind::ALL {
            let spec = self
                .structures
                .get(&kind)
                .ok_or_else(|| ConfigError::Invalid(format!("no structure spec for {kind:?}")))?;
            spec.validate()
                .map_err(|msg| ConfigError::Invalid(format!("{kind:?}: {msg}")))?;
        }
        Ok(())
    }

    /// Upper bound on ticks from `start` back to idle for a plan with
    /// `rows` action rows (`RowIndex::action_rows`).
    pub fn tick_budget(&self, rows: usize) -> u64 {
        rows as u64 * u64::from(self.cadence_ticks) + 1 + u64::from(self.settle_ticks)
    }

    pub fn planner(&self) -> GeometryPlanner {
        GeometryPlanner::new(self.structures.clone(), self.world)
    }
}
