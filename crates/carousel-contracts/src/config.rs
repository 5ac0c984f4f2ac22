//! TOML scenario configuration.
//!
//! A scenario file declares the ring geometry, the tick cadence, the product
//! catalog with its production plan, and the robot fleet. Everything has a
//! default reproducing the reference line, so `ScenarioConfig::default()`
//! runs without any file at all.
//!
//! Example:
//! ```toml
//! [simulation]
//! cadence_ms = 250
//! ring_slots = 16
//! max_robots = 6
//! empty_slack = 3
//!
//! [[products]]
//! kind = 1
//! components = 3
//! ops = "1235"
//! planned = 10
//!
//! [[robots]]
//! id = 1
//! ops = "1"
//! normal = "134"
//! degraded = "1234"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CarouselError, CarouselResult};
use crate::item::{Operation, ProductKind};
use crate::recipe::{Recipe, RecipeCatalog};
use crate::robot::{AgentId, RobotProfile};

/// Ring geometry and timing knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSection {
    /// Milliseconds between rotations.
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,
    /// Number of slots on the ring (inlet and outlet included).
    #[serde(default = "default_ring_slots")]
    pub ring_slots: usize,
    /// Expected fleet size; determines the admission scan stride.
    #[serde(default = "default_max_robots")]
    pub max_robots: usize,
    /// The coordinator only injects a component while strictly more than
    /// this many slots are empty.
    #[serde(default = "default_empty_slack")]
    pub empty_slack: usize,
}

fn default_cadence_ms() -> u64 {
    2000
}
fn default_ring_slots() -> usize {
    16
}
fn default_max_robots() -> usize {
    6
}
fn default_empty_slack() -> usize {
    3
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            cadence_ms: default_cadence_ms(),
            ring_slots: default_ring_slots(),
            max_robots: default_max_robots(),
            empty_slack: default_empty_slack(),
        }
    }
}

/// One `[[products]]` entry: a recipe plus its planned production volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSection {
    pub kind: u8,
    pub components: u32,
    /// Operation sequence as a digit string, e.g. `"1235"`.
    pub ops: String,
    pub planned: u32,
}

/// One `[[robots]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotSection {
    pub id: u32,
    /// Operation set as a digit string; the first digit is the primary op.
    pub ops: String,
    /// Product kinds workable in normal mode, e.g. `"134"`.
    pub normal: String,
    /// Product kinds workable in degraded mode.
    pub degraded: String,
}

/// The top-level structure deserialized from a scenario TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub products: Vec<ProductSection>,
    #[serde(default)]
    pub robots: Vec<RobotSection>,
}

impl Default for ScenarioConfig {
    /// The reference line: 16 slots, 2 s cadence, four products planned at
    /// [10, 15, 12, 8], six robots with primary ops 1..=6 able to work every
    /// kind.
    fn default() -> Self {
        let table = [
            (1u8, 3u32, "1235", 10u32),
            (2, 3, "2416", 15),
            (3, 1, "13513", 12),
            (4, 2, "461", 8),
        ];
        let products = table
            .iter()
            .map(|&(kind, components, ops, planned)| ProductSection {
                kind,
                components,
                ops: ops.to_string(),
                planned,
            })
            .collect();
        let robots = (1..=6u32)
            .map(|id| RobotSection {
                id,
                ops: id.to_string(),
                normal: "1234".to_string(),
                degraded: "1234".to_string(),
            })
            .collect();
        Self {
            simulation: SimulationSection::default(),
            products,
            robots,
        }
    }
}

impl ScenarioConfig {
    /// Parse a scenario from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> CarouselResult<Self> {
        let config: ScenarioConfig =
            toml::from_str(text).map_err(|e| CarouselError::ConfigInvalid {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a scenario file.
    pub fn from_file(path: &Path) -> CarouselResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CarouselError::ConfigLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text).map_err(|e| CarouselError::ConfigLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Build the recipe catalog declared by `[[products]]`.
    pub fn catalog(&self) -> CarouselResult<RecipeCatalog> {
        let recipes = self
            .products
            .iter()
            .map(|p| Recipe {
                kind: ProductKind(p.kind),
                components_required: p.components,
                ops: p.ops.chars().map(Operation).collect(),
            })
            .collect();
        RecipeCatalog::new(recipes)
    }

    /// Planned production volume per kind, in kind order.
    pub fn planned_units(&self) -> Vec<u32> {
        let mut sections: Vec<&ProductSection> = self.products.iter().collect();
        sections.sort_by_key(|p| p.kind);
        sections.iter().map(|p| p.planned).collect()
    }

    /// Build the robot fleet declared by `[[robots]]`.
    pub fn robot_profiles(&self) -> CarouselResult<Vec<RobotProfile>> {
        self.robots
            .iter()
            .map(|r| {
                RobotProfile::new(
                    AgentId(r.id),
                    r.ops.chars().map(Operation).collect(),
                    parse_kinds(&r.normal)?,
                    parse_kinds(&r.degraded)?,
                )
            })
            .collect()
    }

    /// Check cross-field consistency. Called by the loaders; programmatic
    /// configurations should call it before use.
    pub fn validate(&self) -> CarouselResult<()> {
        let sim = &self.simulation;
        if sim.cadence_ms == 0 {
            return Err(CarouselError::ConfigInvalid {
                reason: "cadence_ms must be positive".to_string(),
            });
        }
        if sim.ring_slots < 4 {
            return Err(CarouselError::ConfigInvalid {
                reason: format!(
                    "ring_slots = {} is too small (inlet, outlet and room to work need at least 4)",
                    sim.ring_slots
                ),
            });
        }
        if sim.max_robots == 0 {
            return Err(CarouselError::ConfigInvalid {
                reason: "max_robots must be at least 1".to_string(),
            });
        }

        // Catalog construction performs the per-recipe checks.
        let catalog = self.catalog()?;
        let kind_count = catalog.kind_count() as u8;

        let mut seen = std::collections::HashSet::new();
        for robot in &self.robots {
            if !seen.insert(robot.id) {
                return Err(CarouselError::ConfigInvalid {
                    reason: format!("duplicate robot id {}", robot.id),
                });
            }
            for kinds in [&robot.normal, &robot.degraded] {
                for kind in parse_kinds(kinds)? {
                    if kind.0 == 0 || kind.0 > kind_count {
                        return Err(CarouselError::ConfigInvalid {
                            reason: format!(
                                "robot {} references product kind {} outside the catalog",
                                robot.id, kind.0
                            ),
                        });
                    }
                }
            }
        }
        // RobotProfile::new rejects empty op sets.
        self.robot_profiles()?;
        Ok(())
    }
}

/// Parse a digit string like `"134"` into product kinds.
fn parse_kinds(text: &str) -> CarouselResult<Vec<ProductKind>> {
    text.chars()
        .map(|c| {
            c.to_digit(10)
                .map(|d| ProductKind(d as u8))
                .ok_or_else(|| CarouselError::ConfigInvalid {
                    reason: format!("'{c}' is not a product kind digit"),
                })
        })
        .collect()
}
