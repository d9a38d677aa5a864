//! Static configuration for an IRMA world.

use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::MAX_SURFACES;

/// Number of mutation kinds weighted by [`IrmaConfig::org_probs`].
pub const MUTATION_KINDS: usize = 8;

/// Errors that can occur when validating configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// How a surface redistributes its tokens when its cadence fires.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceMotion {
    /// Tokens never move.
    #[default]
    Static,
    /// A random token drifts to an empty neighbouring cell.
    Spread,
    /// A random token falls down (or diagonally down) onto an empty cell.
    Settle,
    /// A random token is lifted and dropped onto a random empty cell.
    Evaporate,
}

/// One terrain kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Human readable name, used in logs only.
    pub name: String,
    /// RGB color forwarded to the rendering sink.
    pub color: u32,
    /// Maximum number of live tokens (carried tokens included).
    pub capacity: usize,
    /// Tokens placed when the world is created.
    pub initial: usize,
    /// Energy paid by an organism stepping off this surface.
    pub energy: i64,
    /// Radiation accumulated per step; reaching 1.0 forces a mutation.
    pub radiation: f64,
    /// Extra step delay applied while standing on this surface.
    pub step: u32,
    /// Organisms cannot step onto this surface.
    pub barrier: bool,
    /// Organisms may pick tokens of this surface up.
    pub pickup: bool,
    /// Number of cadence checks between two moves.
    pub delay: u32,
    /// Movement rule.
    pub motion: SurfaceMotion,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self::energy()
    }
}

impl SurfaceConfig {
    /// Energy packets: static, edible, pickup-able.
    #[must_use]
    pub fn energy() -> Self {
        Self {
            name: "energy".to_string(),
            color: 0x00ff00,
            capacity: 10_000,
            initial: 0,
            energy: 0,
            radiation: 0.0,
            step: 0,
            barrier: false,
            pickup: true,
            delay: 0,
            motion: SurfaceMotion::Static,
        }
    }

    #[must_use]
    pub fn lava() -> Self {
        Self {
            name: "lava".to_string(),
            color: 0xff6600,
            capacity: 300,
            initial: 300,
            energy: 10,
            radiation: 0.05,
            step: 1,
            barrier: false,
            pickup: false,
            delay: 500,
            motion: SurfaceMotion::Spread,
        }
    }

    #[must_use]
    pub fn stone() -> Self {
        Self {
            name: "stone".to_string(),
            color: 0x888888,
            capacity: 600,
            initial: 600,
            energy: 0,
            radiation: 0.0,
            step: 0,
            barrier: true,
            pickup: true,
            delay: 0,
            motion: SurfaceMotion::Static,
        }
    }

    #[must_use]
    pub fn water() -> Self {
        Self {
            name: "water".to_string(),
            color: 0x0000ff,
            capacity: 1_000,
            initial: 1_000,
            energy: 1,
            radiation: 0.0,
            step: 2,
            barrier: false,
            pickup: false,
            delay: 50,
            motion: SurfaceMotion::Spread,
        }
    }

    #[must_use]
    pub fn sand() -> Self {
        Self {
            name: "sand".to_string(),
            color: 0xc2b280,
            capacity: 600,
            initial: 600,
            energy: 0,
            radiation: 0.0,
            step: 1,
            barrier: false,
            pickup: true,
            delay: 20,
            motion: SurfaceMotion::Settle,
        }
    }
}

/// Static configuration for an IRMA world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IrmaConfig {
    /// Width of the world in cells.
    pub world_width: u32,
    /// Height of the world in cells.
    pub world_height: u32,
    /// Optional RNG seed; `None` draws one from entropy.
    pub rng_seed: Option<u64>,
    /// Instruction lines executed per organism per iteration.
    pub lines_per_iteration: usize,
    /// Iterations executed by one call to `run`.
    pub iterations_per_run: usize,
    /// Pool capacity; also the target population size.
    pub org_amount: usize,
    /// Fraction of `org_amount` created when the population is seeded.
    pub org_initial_percent: f64,
    /// Number of random code words given to freshly seeded organisms.
    pub org_initial_code_size: usize,
    /// Energy of a freshly seeded organism.
    pub org_energy: i64,
    /// Energy required to clone; also scales the global energy cap.
    pub org_clone_energy: i64,
    /// Energy paid per step.
    pub org_step_energy: i64,
    /// Whether organisms may eat each other.
    pub org_eat_orgs: bool,
    /// Multiplier applied to energy gained from eating energy tokens.
    pub org_energy_multiplier: f64,
    /// Size of the per-organism memory.
    pub org_mem_size: usize,
    /// Fraction of the code touched by one mutation call.
    pub org_mutation_percent: f64,
    /// Age period between two age-driven mutations; 0 disables them.
    pub org_mutation_period: u32,
    /// Upper bound for a mutated mutation period.
    pub org_max_period: u32,
    /// Upper bound for a mutated mutation-kind weight.
    pub prob_max_value: u32,
    /// Mutation kind weights: change, delete, period, amount, probs, insert, copy, cut.
    pub org_probs: [u32; MUTATION_KINDS],
    /// Age period between two energy decay ticks; 0 disables decay.
    pub org_energy_period: u64,
    /// Maximum organism age; 0 disables the limit.
    pub org_max_age: u64,
    /// Color forwarded to the rendering sink for organisms.
    pub org_color: u32,
    /// Energy of one atom of an energy token.
    pub energy_value: i64,
    /// Maximum genome length.
    pub code_max_size: usize,
    /// Maximum number of nested call frames.
    pub code_stack_size: usize,
    /// Probability that a random code word is an opcode rather than a literal.
    pub code_opcode_chance: f64,
    /// A clone is mutated with probability `1 / n`; 0 disables.
    pub code_mutate_every_clone: u32,
    /// A clone is crossed over with probability `1 / n`; 0 disables.
    pub code_crossover_every_clone: u32,
    /// Iterations between two cataclysm samples.
    pub cataclysm_every: u64,
    /// Similarity ratio below which the population is culled.
    pub cataclysm_similarity: f64,
    /// Fraction of the population replaced by a cataclysm.
    pub cataclysm_cull_percent: f64,
    /// Samples (as a fraction of `org_amount`) collected before a decision.
    pub cataclysm_sample_percent: f64,
    /// Maximum number of recent run summaries retained in-memory.
    pub history_capacity: usize,
    /// Terrain kinds; index 0 is the energy surface.
    pub surfaces: Vec<SurfaceConfig>,
}

impl Default for IrmaConfig {
    fn default() -> Self {
        Self {
            world_width: 300,
            world_height: 300,
            rng_seed: None,
            lines_per_iteration: 30,
            iterations_per_run: 100,
            org_amount: 1_000,
            org_initial_percent: 0.25,
            org_initial_code_size: 0,
            org_energy: 1_000,
            org_clone_energy: 2_000,
            org_step_energy: 1,
            org_eat_orgs: true,
            org_energy_multiplier: 1.0,
            org_mem_size: 64,
            org_mutation_percent: 0.2,
            org_mutation_period: 4_000,
            org_max_period: 5_000,
            prob_max_value: 100,
            org_probs: [5, 1, 3, 5, 1, 20, 1, 1],
            org_energy_period: 50,
            org_max_age: 200_000,
            org_color: 0xff0000,
            energy_value: 100,
            code_max_size: 1_000,
            code_stack_size: 30,
            code_opcode_chance: 0.5,
            code_mutate_every_clone: 2,
            code_crossover_every_clone: 10,
            cataclysm_every: 100,
            cataclysm_similarity: 0.3,
            cataclysm_cull_percent: 0.3,
            cataclysm_sample_percent: 0.3,
            history_capacity: 256,
            surfaces: vec![
                SurfaceConfig::energy(),
                SurfaceConfig::lava(),
                SurfaceConfig::stone(),
                SurfaceConfig::water(),
                SurfaceConfig::sand(),
            ],
        }
    }
}

impl IrmaConfig {
    /// Total energy (organisms plus energy tokens) the world may hold.
    #[must_use]
    pub fn max_energy(&self) -> i64 {
        (self.org_clone_energy - 1) * (self.org_amount as i64 / 2)
    }

    /// Number of organisms created by a population seed.
    #[must_use]
    pub fn initial_population(&self) -> usize {
        ((self.org_amount as f64) * self.org_initial_percent).ceil() as usize
    }

    /// Number of cells in the world.
    #[must_use]
    pub fn cells(&self) -> usize {
        (self.world_width as usize) * (self.world_height as usize)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world_width == 0 || self.world_height == 0 {
            return Err(ConfigError::InvalidConfig(
                "world dimensions must be non-zero",
            ));
        }
        if self.org_amount < 2 {
            return Err(ConfigError::InvalidConfig("org_amount must be at least 2"));
        }
        if self.org_clone_energy < 2 {
            return Err(ConfigError::InvalidConfig(
                "org_clone_energy must be at least 2",
            ));
        }
        if self.lines_per_iteration == 0 {
            return Err(ConfigError::InvalidConfig(
                "lines_per_iteration must be non-zero",
            ));
        }
        if self.org_mem_size == 0 || self.code_stack_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "org_mem_size and code_stack_size must be non-zero",
            ));
        }
        if self.org_max_period == 0 || self.cataclysm_every == 0 {
            return Err(ConfigError::InvalidConfig(
                "org_max_period and cataclysm_every must be non-zero",
            ));
        }
        if self.org_energy <= 0 || self.energy_value <= 0 || self.org_step_energy < 0 {
            return Err(ConfigError::InvalidConfig(
                "org_energy and energy_value must be positive, org_step_energy non-negative",
            ));
        }
        if self.org_energy_multiplier < 0.0 {
            return Err(ConfigError::InvalidConfig(
                "org_energy_multiplier must be non-negative",
            ));
        }
        let fractions = [
            self.org_initial_percent,
            self.org_mutation_percent,
            self.code_opcode_chance,
            self.cataclysm_similarity,
            self.cataclysm_cull_percent,
            self.cataclysm_sample_percent,
        ];
        if fractions.iter().any(|f| !(0.0..=1.0).contains(f)) {
            return Err(ConfigError::InvalidConfig(
                "percentages and chances must lie in [0, 1]",
            ));
        }
        if self.surfaces.is_empty() || self.surfaces.len() > MAX_SURFACES {
            return Err(ConfigError::InvalidConfig(
                "between 1 and 16 surfaces must be configured",
            ));
        }
        let energy = &self.surfaces[0];
        if energy.barrier {
            return Err(ConfigError::InvalidConfig(
                "surface 0 is the energy surface and cannot be a barrier",
            ));
        }
        if self
            .surfaces
            .iter()
            .any(|s| s.initial > s.capacity || s.radiation < 0.0 || s.energy < 0)
        {
            return Err(ConfigError::InvalidConfig(
                "surface initial amount cannot exceed capacity, costs must be non-negative",
            ));
        }
        let seed_energy = self.initial_population() as i64 * self.org_energy;
        let token_energy = (energy.initial as i64).saturating_mul(self.energy_value);
        if seed_energy.saturating_add(token_energy) >= self.max_energy() {
            return Err(ConfigError::InvalidConfig(
                "initial organism and token energy must stay below the world energy cap",
            ));
        }
        if self.initial_population() > self.cells() {
            return Err(ConfigError::InvalidConfig(
                "initial population does not fit into the world",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG, generating a seed from entropy if absent.
    #[must_use]
    pub fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}
