//! Core types shared across the IRMA workspace: configuration, the cell
//! model, the world grid, surfaces and the sinks the simulation reports to.

use serde::{Deserialize, Serialize};

pub mod cell;
pub mod config;
pub mod grid;
pub mod sink;
pub mod surface;

pub use cell::{Cell, ENERGY_KIND, Token};
pub use config::{ConfigError, IrmaConfig, MUTATION_KINDS, SurfaceConfig, SurfaceMotion};
pub use grid::{DIRECTIONS, Grid};
pub use sink::{LineagePersistence, LineageRecord, NullLineage, NullView, WorldView};
pub use surface::{Surface, TokenSet};

/// Maximum number of surfaces a world can carry.
pub const MAX_SURFACES: usize = 16;

/// Monotonic identifier assigned to every organism ever created.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct OrganismId(pub u64);

impl OrganismId {
    /// Returns the next sequential id.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for OrganismId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
