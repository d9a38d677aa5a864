//! Runtime state of one organism.

use irma_core::{Cell, IrmaConfig, MUTATION_KINDS, OrganismId, Token};

use crate::jumps::JumpTable;

/// Saved caller state pushed by `call`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    /// Line to resume at.
    pub ret: usize,
    pub d: f64,
    pub a: f64,
    pub b: f64,
    /// Line of the `end` closing the called function.
    pub end: usize,
}

/// Program, registers and bookkeeping of a living organism.
#[derive(Debug, Clone)]
pub struct Organism {
    pub id: OrganismId,
    pub parent: Option<OrganismId>,
    code: Vec<i32>,
    jumps: JumpTable,
    pub d: f64,
    pub a: f64,
    pub b: f64,
    pub line: usize,
    pub mem: Vec<f64>,
    frames: Vec<Frame>,
    stack_size: usize,
    pub offset: usize,
    pub energy: i64,
    pub age: u64,
    /// Token carried after `get`.
    pub packet: Option<Token>,
    /// Cell content restored when the organism leaves its offset.
    pub beneath: Cell,
    pub steps: u32,
    pub moves: u32,
    pub radiation: f64,
    /// Age period between two mutations, at least 1.
    pub period: u32,
    /// Fraction of the code touched by one mutation.
    pub percent: f64,
    pub probs: [u32; MUTATION_KINDS],
    pub mutations: u64,
}

impl Organism {
    /// Fresh organism with empty code.
    #[must_use]
    pub fn new(id: OrganismId, offset: usize, energy: i64, config: &IrmaConfig) -> Self {
        Self {
            id,
            parent: None,
            code: Vec::new(),
            jumps: JumpTable::default(),
            d: 0.0,
            a: 0.0,
            b: 0.0,
            line: 0,
            mem: vec![0.0; config.org_mem_size],
            frames: Vec::with_capacity(config.code_stack_size),
            stack_size: config.code_stack_size,
            offset,
            energy,
            age: 0,
            packet: None,
            beneath: Cell::Empty,
            steps: 0,
            moves: 0,
            radiation: 0.0,
            period: config.org_mutation_period.max(1),
            percent: config.org_mutation_percent,
            probs: config.org_probs,
            mutations: 0,
        }
    }

    /// Child inheriting code and mutation parameters; registers, memory and stack start fresh.
    #[must_use]
    pub fn offspring(
        &self,
        id: OrganismId,
        offset: usize,
        energy: i64,
        config: &IrmaConfig,
    ) -> Self {
        let mut child = Self::new(id, offset, energy, config);
        child.parent = Some(self.id);
        child.code = self.code.clone();
        child.jumps = JumpTable::build(&child.code);
        child.probs = self.probs;
        child.period = self.period;
        child.percent = self.percent;
        child.moves = self.moves;
        child
    }

    #[must_use]
    pub fn code(&self) -> &[i32] {
        &self.code
    }

    #[must_use]
    pub fn jumps(&self) -> &JumpTable {
        &self.jumps
    }

    pub fn jumps_mut(&mut self) -> &mut JumpTable {
        &mut self.jumps
    }

    /// Replace the code, truncated to `max_len`, and rebuild the jump table.
    pub fn set_code(&mut self, mut code: Vec<i32>, max_len: usize) {
        code.truncate(max_len);
        self.code = code;
        self.rebuild();
    }

    /// Move the code out for editing; hand it back through [`Organism::set_code`].
    pub fn take_code(&mut self) -> Vec<i32> {
        std::mem::take(&mut self.code)
    }

    pub fn rebuild(&mut self) {
        self.jumps = JumpTable::build(&self.code);
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Push a call frame; a full stack is reset first.
    pub fn push_frame(&mut self, frame: Frame) {
        if self.frames.len() >= self.stack_size {
            self.frames.clear();
        }
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.energy > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::{Opcode, assemble};

    fn config() -> IrmaConfig {
        IrmaConfig {
            code_stack_size: 2,
            org_mem_size: 4,
            ..IrmaConfig::default()
        }
    }

    #[test]
    fn offspring_inherits_genome_only() {
        let config = config();
        let mut parent = Organism::new(OrganismId(1), 3, 100, &config);
        parent.set_code(
            assemble(&[Opcode::Loop.into(), Opcode::End.into()]),
            config.code_max_size,
        );
        parent.d = 9.0;
        parent.mem[0] = 1.0;
        parent.period = 17;
        parent.moves = 2;
        parent.push_frame(Frame::default());

        let child = parent.offspring(OrganismId(2), 4, 50, &config);
        assert_eq!(child.parent, Some(OrganismId(1)));
        assert_eq!(child.code(), parent.code());
        assert_eq!(child.jumps().len(), child.code().len());
        assert_eq!(child.period, 17);
        assert_eq!(child.moves, 2);
        assert_eq!(child.d, 0.0);
        assert!(child.mem.iter().all(|m| *m == 0.0));
        assert!(child.frames().is_empty());
    }

    #[test]
    fn full_stack_resets_before_push() {
        let mut org = Organism::new(OrganismId(0), 0, 1, &config());
        for ret in 0..3 {
            org.push_frame(Frame {
                ret,
                ..Frame::default()
            });
        }
        assert_eq!(org.frames().len(), 1);
        assert_eq!(org.pop_frame().map(|f| f.ret), Some(2));
        assert!(org.pop_frame().is_none());
    }

    #[test]
    fn set_code_truncates_and_rebuilds() {
        let mut org = Organism::new(OrganismId(0), 0, 1, &config());
        org.set_code(vec![1, 2, 3, 4, 5], 3);
        assert_eq!(org.code(), &[1, 2, 3]);
        assert_eq!(org.jumps().len(), 3);
    }
}
