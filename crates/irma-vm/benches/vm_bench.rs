use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use irma_core::IrmaConfig;
use irma_vm::WorldState;
use std::time::Duration;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

fn bench_world_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");
    group.sample_size(env_or("IRMA_BENCH_SAMPLES", 20_usize).max(10));
    group.warm_up_time(Duration::from_secs(env_or("IRMA_BENCH_WARMUP_SECS", 2)));
    group.measurement_time(Duration::from_secs(env_or("IRMA_BENCH_MEASURE_SECS", 10)));
    let steps: usize = env_or("IRMA_BENCH_STEPS", 32_usize).max(1);
    let populations: Vec<usize> = std::env::var("IRMA_BENCH_ORGS")
        .ok()
        .map(|s| {
            s.split(',')
                .filter_map(|t| t.trim().parse::<usize>().ok())
                .collect::<Vec<_>>()
        })
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| vec![500_usize, 2_000]);

    for &orgs in &populations {
        group.bench_function(format!("steps{steps}_orgs{orgs}"), |b| {
            b.iter_batched(
                || {
                    let config = IrmaConfig {
                        rng_seed: Some(0xBEEF),
                        world_width: 200,
                        world_height: 200,
                        org_amount: orgs * 2,
                        org_initial_percent: 0.5,
                        org_initial_code_size: 64,
                        history_capacity: 0,
                        ..IrmaConfig::default()
                    };
                    WorldState::new(config).expect("world")
                },
                |mut world| {
                    for _ in 0..steps {
                        world.step();
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_world_steps);
criterion_main!(benches);
