//! The owning simulation context.

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use irma_core::{
    Cell, ConfigError, ENERGY_KIND, Grid, IrmaConfig, LineagePersistence, LineageRecord,
    NullLineage, OrganismId, Surface, WorldView,
};
use rand::rngs::SmallRng;
use tracing::{debug, trace};

use crate::organism::Organism;
use crate::pool::OrganismPool;
use crate::population::{CataclysmProbe, RunSummary};

/// Grid, surfaces, population and energy ledger of one simulated world.
pub struct WorldState {
    pub(crate) config: IrmaConfig,
    pub(crate) grid: Grid,
    pub(crate) surfaces: Vec<Surface>,
    pub(crate) pool: OrganismPool,
    pub(crate) rng: SmallRng,
    persistence: Box<dyn LineagePersistence>,
    /// Sum of the energy held by every pooled organism.
    pub(crate) total_energy: i64,
    next_id: OrganismId,
    pub(crate) iteration: u64,
    pub(crate) generation: u64,
    pub(crate) births: usize,
    pub(crate) deaths: usize,
    pub(crate) status_lines: u64,
    pub(crate) probe: CataclysmProbe,
    pub(crate) history: VecDeque<RunSummary>,
    pub(crate) last_status: Instant,
}

impl fmt::Debug for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldState")
            .field("grid", &self.grid)
            .field("iteration", &self.iteration)
            .field("generation", &self.generation)
            .field("organisms", &self.pool.len())
            .field("total_energy", &self.total_energy)
            .finish()
    }
}

impl WorldState {
    /// Instantiate a new world using the supplied configuration.
    pub fn new(config: IrmaConfig) -> Result<Self, ConfigError> {
        Self::with_persistence(config, Box::new(NullLineage))
    }

    /// Instantiate a new world using the supplied configuration and lineage sink.
    pub fn with_persistence(
        config: IrmaConfig,
        persistence: Box<dyn LineagePersistence>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = config.seeded_rng();
        let mut grid = Grid::from_config(&config)?;
        let mut surfaces: Vec<Surface> = config
            .surfaces
            .iter()
            .enumerate()
            .map(|(index, surface)| Surface::new(index as u8, surface.clone()))
            .collect();
        for surface in &mut surfaces {
            surface.seed(&mut grid, &mut rng);
        }
        let history_capacity = config.history_capacity;
        let mut world = Self {
            pool: OrganismPool::with_capacity(config.org_amount),
            config,
            grid,
            surfaces,
            rng,
            persistence,
            total_energy: 0,
            next_id: OrganismId::default(),
            iteration: 0,
            generation: 0,
            births: 0,
            deaths: 0,
            status_lines: 0,
            probe: CataclysmProbe::default(),
            history: VecDeque::with_capacity(history_capacity),
            last_status: Instant::now(),
        };
        world.seed_population();
        debug!(
            organisms = world.pool.len(),
            tokens = world.surfaces.iter().map(Surface::live).sum::<usize>(),
            "world created"
        );
        Ok(world)
    }

    /// Replace the rendering sink.
    pub fn set_view(&mut self, view: Box<dyn WorldView>) {
        self.grid.set_view(view);
    }

    /// Replace the lineage sink.
    pub fn set_persistence(&mut self, persistence: Box<dyn LineagePersistence>) {
        self.persistence = persistence;
    }

    #[must_use]
    pub fn config(&self) -> &IrmaConfig {
        &self.config
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    #[must_use]
    pub fn pool(&self) -> &OrganismPool {
        &self.pool
    }

    #[must_use]
    pub fn organism(&self, slot: usize) -> Option<&Organism> {
        self.pool.get(slot)
    }

    /// Mutable access to a pooled organism; energy edits must go through the ledger.
    pub fn organism_mut(&mut self, slot: usize) -> Option<&mut Organism> {
        self.pool.get_mut(slot)
    }

    /// Energy held by all organisms.
    #[must_use]
    pub const fn total_energy(&self) -> i64 {
        self.total_energy
    }

    /// Energy stored in energy tokens, carried ones included.
    #[must_use]
    pub fn token_energy(&self) -> i64 {
        let atoms = self
            .surfaces
            .get(usize::from(ENERGY_KIND))
            .map_or(0, Surface::atoms);
        i64::try_from(atoms)
            .unwrap_or(i64::MAX)
            .saturating_mul(self.config.energy_value)
    }

    #[must_use]
    pub fn max_energy(&self) -> i64 {
        self.config.max_energy()
    }

    /// Energy that may still enter the world without reaching the cap.
    #[must_use]
    pub fn headroom(&self) -> i64 {
        self.max_energy() - self.total_energy - self.token_energy() - 1
    }

    #[must_use]
    pub const fn iteration(&self) -> u64 {
        self.iteration
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Latest genome similarity ratio observed by the cataclysm probe.
    #[must_use]
    pub fn diff(&self) -> f64 {
        self.probe.diff
    }

    /// Iterate over the retained run summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &RunSummary> {
        self.history.iter()
    }

    /// Place a new organism on the empty cell `offset`.
    ///
    /// Returns the pool slot, or `None` when the cell is taken, the pool is full
    /// or `energy` is not positive.
    pub fn spawn_organism(&mut self, offset: usize, code: Vec<i32>, energy: i64) -> Option<usize> {
        if energy <= 0 || self.pool.is_full() || offset >= self.grid.len() {
            return None;
        }
        if !self.grid.get(offset).is_empty() {
            return None;
        }
        let id = self.allocate_id();
        let mut org = Organism::new(id, offset, energy, &self.config);
        org.set_code(code, self.config.code_max_size);
        self.adopt(org)
    }

    /// Add a token to surface `kind` at the empty cell `offset`.
    pub fn spawn_token(&mut self, offset: usize, kind: u8, atom: u16) -> bool {
        match self.surfaces.get_mut(usize::from(kind)) {
            Some(surface) => surface.insert(&mut self.grid, offset, atom),
            None => false,
        }
    }

    /// Remove the organism in `slot`, returning its remains to the world.
    pub fn kill(&mut self, slot: usize) -> bool {
        match self.pool.remove(slot) {
            Some(org) => {
                self.bury(org);
                true
            }
            None => false,
        }
    }

    pub(crate) fn allocate_id(&mut self) -> OrganismId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// Insert a fully built organism, mark its cell and report the birth.
    pub(crate) fn adopt(&mut self, org: Organism) -> Option<usize> {
        let offset = org.offset;
        let energy = org.energy;
        let record = LineageRecord {
            id: org.id,
            parent: org.parent,
            iteration: self.iteration,
            offset,
            energy,
            code: org.code().to_vec(),
        };
        let slot = self.pool.insert(org)?;
        self.grid.set_org(offset, slot);
        self.total_energy += energy;
        self.births += 1;
        self.persistence.on_birth(&record);
        trace!(id = %record.id, slot, offset, energy, "organism born");
        Some(slot)
    }

    /// Settle the ledger and grid for an organism already out of the pool.
    pub(crate) fn bury(&mut self, mut org: Organism) {
        self.total_energy -= org.energy;
        org.energy = 0;
        self.grid.set(org.offset, org.beneath);
        if let Some(packet) = org.packet.take() {
            if let Some(surface) = self.surfaces.get_mut(usize::from(packet.kind)) {
                surface.restore(&mut self.grid, &mut self.rng, packet);
            }
        }
        self.deaths += 1;
        trace!(id = %org.id, offset = org.offset, age = org.age, "organism removed");
    }

    /// Take `amount` from `org`, keeping the ledger in step.
    pub(crate) fn charge(&mut self, org: &mut Organism, amount: i64) {
        org.energy -= amount;
        self.total_energy -= amount;
    }

    /// Give `amount` to `org`, keeping the ledger in step.
    pub(crate) fn credit(&mut self, org: &mut Organism, amount: i64) {
        org.energy += amount;
        self.total_energy += amount;
    }

    /// Whether `cell` blocks movement.
    pub(crate) fn is_barrier(&self, cell: Cell) -> bool {
        match cell {
            Cell::Empty => false,
            Cell::Org(_) => true,
            Cell::Token(token) => self
                .surfaces
                .get(usize::from(token.kind))
                .is_some_and(|surface| surface.config().barrier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irma_core::SurfaceConfig;
    use std::sync::{Arc, Mutex};

    fn bare_config() -> IrmaConfig {
        IrmaConfig {
            world_width: 8,
            world_height: 8,
            rng_seed: Some(42),
            org_amount: 10,
            org_initial_percent: 0.0,
            surfaces: vec![SurfaceConfig {
                capacity: 0,
                ..SurfaceConfig::energy()
            }],
            ..IrmaConfig::default()
        }
    }

    #[derive(Clone, Default)]
    struct Births(Arc<Mutex<Vec<LineageRecord>>>);

    impl LineagePersistence for Births {
        fn on_birth(&mut self, record: &LineageRecord) {
            self.0.lock().unwrap().push(record.clone());
        }
    }

    #[test]
    fn seeding_respects_population_and_ledger() {
        let config = IrmaConfig {
            rng_seed: Some(1),
            world_width: 40,
            world_height: 40,
            org_amount: 100,
            org_initial_percent: 0.2,
            org_energy: 50,
            surfaces: vec![SurfaceConfig::energy()],
            ..IrmaConfig::default()
        };
        let births = Births::default();
        let world = WorldState::with_persistence(config, Box::new(births.clone())).expect("world");
        assert_eq!(world.pool().len(), 20);
        assert_eq!(world.total_energy(), 20 * 50);
        assert_eq!(world.generation(), 1);
        assert_eq!(births.0.lock().unwrap().len(), 20);
        for (slot, org) in world.pool().iter() {
            assert_eq!(world.grid().get(org.offset), Cell::Org(slot));
        }
    }

    #[test]
    fn spawn_and_kill_keep_grid_and_ledger_consistent() {
        let mut world = WorldState::new(bare_config()).expect("world");
        let slot = world.spawn_organism(9, vec![1, 2], 30).expect("spawned");
        assert_eq!(world.grid().get(9), Cell::Org(slot));
        assert!(world.spawn_organism(9, Vec::new(), 30).is_none(), "cell taken");
        assert!(world.spawn_organism(10, Vec::new(), 0).is_none());
        assert_eq!(world.total_energy(), 30);

        assert!(world.kill(slot));
        assert!(!world.kill(slot));
        assert_eq!(world.grid().get(9), Cell::Empty);
        assert_eq!(world.total_energy(), 0);
        assert!(world.pool().is_empty());
    }

    #[test]
    fn rejects_invalid_configuration() {
        let config = IrmaConfig {
            org_amount: 1,
            ..bare_config()
        };
        assert!(WorldState::new(config).is_err());
    }
}
