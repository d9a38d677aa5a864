use std::collections::HashMap;

use irma_core::{Cell, IrmaConfig, SurfaceConfig};
use irma_vm::WorldState;

fn busy_config(seed: u64) -> IrmaConfig {
    IrmaConfig {
        world_width: 30,
        world_height: 30,
        rng_seed: Some(seed),
        lines_per_iteration: 20,
        org_amount: 40,
        org_initial_percent: 0.5,
        org_initial_code_size: 24,
        org_energy: 400,
        org_clone_energy: 600,
        code_max_size: 64,
        code_opcode_chance: 0.8,
        org_mutation_period: 7,
        org_energy_period: 5,
        org_max_age: 300,
        cataclysm_every: 3,
        surfaces: vec![
            SurfaceConfig {
                capacity: 200,
                ..SurfaceConfig::energy()
            },
            SurfaceConfig {
                capacity: 20,
                initial: 20,
                delay: 1,
                ..SurfaceConfig::lava()
            },
            SurfaceConfig {
                capacity: 20,
                initial: 20,
                ..SurfaceConfig::stone()
            },
            SurfaceConfig {
                capacity: 20,
                initial: 20,
                delay: 0,
                ..SurfaceConfig::sand()
            },
        ],
        ..IrmaConfig::default()
    }
}

fn assert_consistent(world: &WorldState) {
    // Energy stays strictly below the cap.
    assert!(
        world.total_energy() + world.token_energy() < world.max_energy(),
        "energy cap exceeded at iteration {}",
        world.iteration()
    );
    let ledger: i64 = world.pool().iter().map(|(_, org)| org.energy).sum();
    assert_eq!(ledger, world.total_energy());

    // Each pooled organism owns exactly its cell.
    let mut orgs_on_grid = 0;
    for (offset, cell) in world.grid().cells().iter().enumerate() {
        if let Cell::Org(slot) = *cell {
            orgs_on_grid += 1;
            let org = world.organism(slot).expect("grid references a live slot");
            assert_eq!(org.offset, offset);
            assert!(org.energy > 0);
        }
    }
    assert_eq!(orgs_on_grid, world.pool().len());

    // Surfaces account for placed, covered and carried tokens.
    let mut carried: HashMap<u8, usize> = HashMap::new();
    for (_, org) in world.pool().iter() {
        if let Some(packet) = org.packet {
            *carried.entry(packet.kind).or_default() += 1;
        }
        assert!(org.code().len() <= world.config().code_max_size);
        assert_eq!(org.jumps().len(), org.code().len());
        assert!(org.frames().len() <= world.config().code_stack_size);
    }
    for surface in world.surfaces() {
        let kind = surface.index();
        let carried = carried.get(&kind).copied().unwrap_or(0);
        assert_eq!(surface.live(), surface.tokens().len() + carried);
        assert!(surface.live() <= surface.config().capacity);
        for offset in surface.tokens().iter() {
            let visible = world.grid().get(offset).token().map(|t| t.kind);
            let covered = match world.grid().get(offset) {
                Cell::Org(slot) => world
                    .organism(slot)
                    .and_then(|org| org.beneath.token())
                    .map(|t| t.kind),
                _ => None,
            };
            assert_eq!(visible.or(covered), Some(kind), "token at {offset}");
        }
    }
}

#[test]
fn invariants_hold_over_many_iterations() {
    for seed in [1_u64, 2, 3] {
        let mut world = WorldState::new(busy_config(seed)).expect("world");
        assert_consistent(&world);
        for _ in 0..150 {
            world.step();
            assert_consistent(&world);
        }
    }
}

#[test]
fn runs_accumulate_history() {
    let config = IrmaConfig {
        iterations_per_run: 5,
        history_capacity: 3,
        ..busy_config(9)
    };
    let mut world = WorldState::new(config).expect("world");
    for _ in 0..5 {
        let summary = world.run();
        assert_eq!(summary.organisms, world.pool().len());
        assert_consistent(&world);
    }
    let iterations: Vec<u64> = world.history().map(|s| s.iteration).collect();
    assert_eq!(iterations, vec![15, 20, 25]);
}
