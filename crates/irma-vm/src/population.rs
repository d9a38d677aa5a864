//! Population control: seeding, the iteration sweep, cataclysms and run summaries.

use std::time::Instant;

use irma_core::surface::RESTORE_ATTEMPTS;
use irma_core::ENERGY_KIND;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::interpreter::Fate;
use crate::mutation;
use crate::organism::Organism;
use crate::world::WorldState;

/// Result of one iteration over every pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepEvents {
    pub iteration: u64,
    pub births: usize,
    pub deaths: usize,
    /// Organisms replaced by a cataclysm during this iteration.
    pub replaced: Option<usize>,
}

/// Summary of one `run` call, retained in the world history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub iteration: u64,
    pub organisms: usize,
    pub total_energy: i64,
    pub average_energy: i64,
    pub diff: f64,
    pub generation: u64,
    pub lines_executed: u64,
}

/// Genome similarity accumulator feeding the cataclysm decision.
#[derive(Debug, Clone, Default)]
pub struct CataclysmProbe {
    pub samples: u64,
    pub distance: u64,
    pub size: u64,
    /// Last computed average distance over average genome size, two decimals.
    pub diff: f64,
}

impl CataclysmProbe {
    fn refresh(&mut self) {
        if self.size == 0 {
            return;
        }
        self.diff = ((self.distance as f64 / self.size as f64) * 100.0).round() / 100.0;
    }

    fn reset(&mut self) {
        self.samples = 0;
        self.distance = 0;
        self.size = 0;
    }
}

impl WorldState {
    /// Create the initial population, returning how many organisms were placed.
    pub fn seed_population(&mut self) -> usize {
        let wanted = self.config.initial_population();
        let mut placed = 0;
        for _ in 0..wanted {
            let energy = self.config.org_energy.min(self.headroom());
            if energy <= 0 {
                break;
            }
            let Some(offset) = self.grid.random_empty(&mut self.rng, RESTORE_ATTEMPTS) else {
                continue;
            };
            let code = self.random_code();
            if self.spawn_organism(offset, code, energy).is_some() {
                placed += 1;
            }
        }
        self.generation += 1;
        info!(
            generation = self.generation,
            placed, wanted, "population seeded"
        );
        placed
    }

    fn random_code(&mut self) -> Vec<i32> {
        mutation::random_code(
            self.config.org_initial_code_size,
            &mut self.rng,
            self.config.code_opcode_chance,
        )
    }

    /// Execute one iteration: every live slot runs its slice in slot order.
    pub fn step(&mut self) -> StepEvents {
        self.births = 0;
        self.deaths = 0;
        let lines = self.config.lines_per_iteration;

        for slot in 0..self.pool.capacity() {
            let Some(mut org) = self.pool.take(slot) else {
                continue;
            };
            let mut fate = self.execute(slot, &mut org, lines);
            if fate == Fate::Alive {
                fate = self.age_organism(&mut org);
            }
            self.settle(slot, org, fate);
            self.status_lines += lines as u64;

            self.replenish_energy();
            for surface in &mut self.surfaces {
                surface.tick(&mut self.grid, &mut self.rng);
            }
        }

        let replaced = if self.iteration % self.config.cataclysm_every == 0 {
            self.update_cataclysm()
        } else {
            None
        };
        let events = StepEvents {
            iteration: self.iteration,
            births: self.births,
            deaths: self.deaths,
            replaced,
        };
        self.iteration += 1;
        events
    }

    /// Age-driven mutation, death and energy decay after a slice.
    fn age_organism(&mut self, org: &mut Organism) -> Fate {
        let age = org.age;
        if self.config.org_mutation_period > 0 && age > 0 && age % u64::from(org.period) == 0 {
            mutation::mutate(org, &self.config, &mut self.rng);
        }
        let max_age = self.config.org_max_age;
        if max_age > 0 && age > 0 && age % max_age == 0 {
            return Fate::Dead;
        }
        let period = self.config.org_energy_period;
        if period > 0 && age % period == 0 {
            self.charge(org, 1);
            if !org.is_alive() {
                return Fate::Dead;
            }
        }
        org.age += 1;
        Fate::Alive
    }

    /// Drop a fresh energy token while the world stays under its energy cap.
    fn replenish_energy(&mut self) {
        let value = self.config.energy_value;
        if self.total_energy + self.token_energy() + value < self.max_energy() {
            self.surfaces[usize::from(ENERGY_KIND)].put(&mut self.grid, &mut self.rng);
        }
    }

    /// Sample genome similarity and cull the population when it is too uniform.
    ///
    /// Returns the number of replaced organisms when a decision was taken.
    pub fn update_cataclysm(&mut self) -> Option<usize> {
        let capacity = self.pool.capacity();
        let first = self.rng.random_range(0..capacity);
        let second = self.rng.random_range(0..capacity);
        let (Some(a), Some(b)) = (self.pool.get(first), self.pool.get(second)) else {
            return None;
        };
        self.probe.distance += mutation::distance(a.code(), b.code()) as u64;
        self.probe.size += (a.code().len() + b.code().len()).div_ceil(2) as u64;
        if self.iteration > 100 {
            self.probe.refresh();
        }

        self.probe.samples += 1;
        let needed = self.config.org_amount as f64 * self.config.cataclysm_sample_percent;
        if (self.probe.samples as f64) <= needed {
            return None;
        }

        self.probe.refresh();
        let uniform = self.probe.size > 0 && self.probe.diff < self.config.cataclysm_similarity;
        let replaced = if uniform { self.cull() } else { 0 };
        self.probe.reset();
        Some(replaced)
    }

    /// Replace a share of the population, lowest slots first.
    fn cull(&mut self) -> usize {
        let mut bound =
            (self.pool.len() as f64 * self.config.cataclysm_cull_percent).ceil() as usize;
        let mut replaced = 0;
        let mut slot = 0;
        while slot < bound && slot < self.pool.capacity() {
            let Some(victim) = self.pool.get(slot) else {
                bound += 1;
                slot += 1;
                continue;
            };
            let energy = self
                .config
                .org_energy
                .min(self.headroom() + victim.energy);
            let target = self.grid.random_empty(&mut self.rng, RESTORE_ATTEMPTS);
            if let (Some(offset), true) = (target, energy > 0) {
                self.kill(slot);
                let code = self.random_code();
                if self.spawn_organism(offset, code, energy).is_some() {
                    replaced += 1;
                }
            }
            slot += 1;
        }
        debug!(
            iteration = self.iteration,
            diff = self.probe.diff,
            replaced,
            "cataclysm"
        );
        replaced
    }

    /// Run `iterations_per_run` iterations, re-seed an extinct population and publish the status.
    pub fn run(&mut self) -> RunSummary {
        let mut lines = 0;
        for _ in 0..self.config.iterations_per_run {
            let before = self.status_lines;
            self.step();
            lines += self.status_lines - before;
        }
        if self.pool.is_empty() {
            info!(iteration = self.iteration, "population extinct, reseeding");
            self.seed_population();
        }

        let organisms = self.pool.len();
        let summary = RunSummary {
            iteration: self.iteration,
            organisms,
            total_energy: self.total_energy,
            average_energy: if organisms == 0 {
                0
            } else {
                self.total_energy / organisms as i64
            },
            diff: self.probe.diff,
            generation: self.generation,
            lines_executed: lines,
        };
        if self.config.history_capacity > 0 {
            if self.history.len() >= self.config.history_capacity {
                self.history.pop_front();
            }
            self.history.push_back(summary.clone());
        }
        self.publish_status(&summary);
        summary
    }

    /// Send the status line to the view, at most once per second.
    fn publish_status(&mut self, summary: &RunSummary) {
        let elapsed = self.last_status.elapsed();
        if elapsed.as_millis() < 1_000 {
            return;
        }
        let organisms = summary.organisms.max(1) as f64;
        let inps = (self.status_lines as f64 / organisms / elapsed.as_secs_f64()).round();
        let status = format!(
            "inps:{} orgs:{} onrg:{} diff:{} gen:{}",
            inps, summary.organisms, summary.average_energy, summary.diff, summary.generation
        );
        self.grid.title(&status);
        debug!(%status, "status");
        self.last_status = Instant::now();
        self.status_lines = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irma_core::{IrmaConfig, SurfaceConfig};

    fn config() -> IrmaConfig {
        IrmaConfig {
            world_width: 20,
            world_height: 20,
            rng_seed: Some(7),
            org_amount: 10,
            org_initial_percent: 0.0,
            surfaces: vec![SurfaceConfig {
                capacity: 0,
                ..SurfaceConfig::energy()
            }],
            ..IrmaConfig::default()
        }
    }

    #[test]
    fn probe_rounds_to_two_decimals() {
        let mut probe = CataclysmProbe {
            samples: 3,
            distance: 2,
            size: 3,
            diff: 0.0,
        };
        probe.refresh();
        assert_eq!(probe.diff, 0.67);
        probe.reset();
        probe.refresh();
        assert_eq!(probe.diff, 0.67, "empty accumulators keep the last ratio");
    }

    #[test]
    fn run_reseeds_an_extinct_population() {
        let config = IrmaConfig {
            org_initial_percent: 0.5,
            iterations_per_run: 1,
            ..config()
        };
        let mut world = WorldState::new(config).expect("world");
        let slots: Vec<usize> = world.pool().iter().map(|(slot, _)| slot).collect();
        for slot in slots {
            world.kill(slot);
        }
        let summary = world.run();
        assert_eq!(summary.organisms, 5);
        assert_eq!(summary.generation, 2);
        assert_eq!(world.history().count(), 1);
    }

    #[test]
    fn max_age_removes_organisms() {
        let config = IrmaConfig {
            org_max_age: 3,
            org_energy_period: 0,
            org_mutation_period: 0,
            ..config()
        };
        let mut world = WorldState::new(config).expect("world");
        world.spawn_organism(0, Vec::new(), 100).expect("spawned");
        let deaths: Vec<usize> = (0..4).map(|_| world.step().deaths).collect();
        assert_eq!(deaths, vec![0, 0, 0, 1]);
        assert!(world.pool().is_empty());
        assert_eq!(world.total_energy(), 0);
    }

    #[test]
    fn energy_decay_follows_period() {
        let config = IrmaConfig {
            org_energy_period: 2,
            org_mutation_period: 0,
            ..config()
        };
        let mut world = WorldState::new(config).expect("world");
        let slot = world.spawn_organism(0, Vec::new(), 10).expect("spawned");
        for _ in 0..4 {
            world.step();
        }
        // Ages 0 and 2 decay.
        assert_eq!(world.organism(slot).map(|o| o.energy), Some(8));
        assert_eq!(world.total_energy(), 8);
    }
}
