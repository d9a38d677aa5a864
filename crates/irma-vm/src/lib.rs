//! Register virtual machine, organisms, mutation engine and population
//! controller for IRMA worlds.
//!
//! [`WorldState`] owns everything: the grid and surfaces from `irma-core`,
//! the organism pool and the energy ledger. Drive it with
//! [`WorldState::step`] or [`WorldState::run`].

pub mod interpreter;
pub mod jumps;
pub mod mutation;
pub mod opcode;
pub mod organism;
pub mod pool;
pub mod population;
pub mod world;

pub use interpreter::{Fate, saturate, to_int};
pub use jumps::JumpTable;
pub use mutation::{MutationKind, crossover, distance, mutate};
pub use opcode::{
    CODE_CMD_OFFS, CODE_COMMANDS, CODE_MAX_RAND, Instruction, Opcode, assemble, disassemble,
};
pub use organism::{Frame, Organism};
pub use pool::OrganismPool;
pub use population::{CataclysmProbe, RunSummary, StepEvents};
pub use world::WorldState;
