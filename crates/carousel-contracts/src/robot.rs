//! Robot identity, operating mode, and capability profile.

use serde::{Deserialize, Serialize};

use crate::error::{CarouselError, CarouselResult};
use crate::item::{Operation, ProductKind};

/// Stable numeric identifier for one robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// A robot's operating mode.
///
/// Normal mode restricts product pickup to an exact primary-operation match;
/// degraded mode broadens the match to the robot's whole operation set (and
/// switches to the degraded product-kind set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Normal,
    Degraded,
}

impl Mode {
    /// The other mode; mode toggling is an involution.
    pub fn toggled(self) -> Self {
        match self {
            Mode::Normal => Mode::Degraded,
            Mode::Degraded => Mode::Normal,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Normal => write!(f, "normal"),
            Mode::Degraded => write!(f, "degraded"),
        }
    }
}

/// The immutable capability profile a robot is started with.
///
/// `ops[0]` is the primary operation — the one the robot performs in normal
/// mode. The full `ops` set only matters in degraded mode, where any covered
/// operation is acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotProfile {
    pub id: AgentId,
    ops: Vec<Operation>,
    normal_kinds: Vec<ProductKind>,
    degraded_kinds: Vec<ProductKind>,
}

impl RobotProfile {
    /// Build a profile. The operation set must be non-empty — the primary
    /// operation is its first element.
    pub fn new(
        id: AgentId,
        ops: Vec<Operation>,
        normal_kinds: Vec<ProductKind>,
        degraded_kinds: Vec<ProductKind>,
    ) -> CarouselResult<Self> {
        if ops.is_empty() {
            return Err(CarouselError::ConfigInvalid {
                reason: format!("robot {} has an empty operation set", id),
            });
        }
        Ok(Self {
            id,
            ops,
            normal_kinds,
            degraded_kinds,
        })
    }

    /// The operation this robot performs in normal mode.
    pub fn primary_op(&self) -> Operation {
        self.ops[0]
    }

    /// True if `op` is anywhere in the robot's operation set.
    pub fn covers_op(&self, op: Operation) -> bool {
        self.ops.contains(&op)
    }

    /// The product kinds this robot may work on under `mode`.
    pub fn active_kinds(&self, mode: Mode) -> &[ProductKind] {
        match mode {
            Mode::Normal => &self.normal_kinds,
            Mode::Degraded => &self.degraded_kinds,
        }
    }

    /// True if the robot may work on `kind` under `mode`.
    pub fn accepts(&self, kind: ProductKind, mode: Mode) -> bool {
        self.active_kinds(mode).contains(&kind)
    }
}
