//! Instruction execution for one organism slice.

use irma_core::{Cell, ENERGY_KIND};
use rand::Rng;
use tracing::trace;

use crate::mutation;
use crate::opcode::{CODE_MAX_RAND, Instruction, Opcode};
use crate::organism::{Frame, Organism};
use crate::world::WorldState;

/// Outcome of a slice for the executing organism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Alive,
    Dead,
}

/// What the slice loop does after one instruction.
enum Flow {
    Next,
    /// End the slice early; the organism lives on.
    Yield,
    Die,
}

/// Register to integer conversion: truncation toward zero, non-finite values read as 0.
#[inline]
#[must_use]
pub fn to_int(value: f64) -> i64 {
    if value.is_finite() {
        value.trunc() as i64
    } else {
        0
    }
}

/// Clamp an arithmetic result into the finite range; NaN becomes 0.
#[inline]
#[must_use]
pub fn saturate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else if value == f64::INFINITY {
        f64::MAX
    } else if value == f64::NEG_INFINITY {
        -f64::MAX
    } else {
        value
    }
}

#[inline]
fn direction(d: f64) -> usize {
    (to_int(d).unsigned_abs() % 8) as usize
}

#[inline]
fn index(value: f64) -> usize {
    usize::try_from(to_int(value).unsigned_abs()).unwrap_or(usize::MAX)
}

impl WorldState {
    /// Execute up to `lines` instructions of the organism in `slot`.
    ///
    /// A dead organism is removed before returning. `None` means the slot is empty.
    pub fn run_organism(&mut self, slot: usize, lines: usize) -> Option<Fate> {
        let mut org = self.pool.take(slot)?;
        let fate = self.execute(slot, &mut org, lines);
        self.settle(slot, org, fate);
        Some(fate)
    }

    /// Put a checked-out organism back, or bury it.
    pub(crate) fn settle(&mut self, slot: usize, org: Organism, fate: Fate) {
        match fate {
            Fate::Alive => self.pool.restore(slot, org),
            Fate::Dead => {
                self.bury(org);
                self.pool.release(slot);
            }
        }
    }

    /// Run a slice of a checked-out organism.
    pub(crate) fn execute(&mut self, slot: usize, org: &mut Organism, lines: usize) -> Fate {
        for _ in 0..lines {
            match self.execute_line(slot, org) {
                Flow::Next => {}
                Flow::Yield => return Fate::Alive,
                Flow::Die => return Fate::Dead,
            }
        }
        Fate::Alive
    }

    fn execute_line(&mut self, slot: usize, org: &mut Organism) -> Flow {
        let line = org.line;
        let Some(&word) = org.code().get(line) else {
            // End of code: leave the innermost call, else wrap around.
            match org.pop_frame() {
                Some(frame) => {
                    org.line = frame.ret;
                    org.a = frame.a;
                    org.b = frame.b;
                }
                None => org.line = 0,
            }
            return Flow::Next;
        };

        let op = match Instruction::decode(word) {
            Instruction::Literal(value) => {
                org.d = f64::from(value);
                org.line += 1;
                return Flow::Next;
            }
            Instruction::Invalid(_) => {
                org.line += 1;
                return Flow::Next;
            }
            Instruction::Op(op) => op,
        };

        match op {
            Opcode::Step => return self.op_step(slot, org),
            Opcode::Eat => return self.op_eat(org),
            Opcode::Clone => return self.op_clone(org),
            Opcode::See => self.op_see(org),
            Opcode::DtoA => org.a = org.d,
            Opcode::DtoB => org.b = org.d,
            Opcode::AtoD => org.d = org.a,
            Opcode::AtoB => org.b = org.a,
            Opcode::Add => org.d = saturate(org.a + org.b),
            Opcode::Sub => org.d = saturate(org.a - org.b),
            Opcode::Mul => org.d = saturate(org.a * org.b),
            Opcode::Div => {
                let value = org.a / org.b;
                org.d = if value.is_finite() { value } else { 0.0 };
            }
            Opcode::Inc => org.d = saturate(org.d + 1.0),
            Opcode::Dec => org.d = saturate(org.d - 1.0),
            Opcode::Loop => {
                let target = org.jumps().target(line);
                let mut counter = org.jumps().counter(line);
                if counter < 0 && target > line + 1 {
                    counter = to_int(org.d).saturating_abs();
                }
                counter -= 1;
                org.jumps_mut().set_counter(line, counter);
                org.line = if counter < 0 { target } else { line + 1 };
                return Flow::Next;
            }
            Opcode::IfDGA | Opcode::IfDLA | Opcode::IfDEA => {
                let enter = match op {
                    Opcode::IfDGA => org.d > org.a,
                    Opcode::IfDLA => org.d < org.a,
                    _ => org.d == org.a,
                };
                org.line = if enter {
                    line + 1
                } else {
                    org.jumps().target(line)
                };
                return Flow::Next;
            }
            Opcode::Nop => {}
            Opcode::MGet => {
                if let Some(&value) = org.mem.get(index(org.a)) {
                    org.d = value;
                }
            }
            Opcode::MPut => {
                let at = index(org.a);
                if let Some(cell) = org.mem.get_mut(at) {
                    *cell = org.d;
                }
            }
            Opcode::Offs => org.d = org.offset as f64,
            Opcode::Rand => {
                org.a = f64::from(self.rng.random_range(-CODE_MAX_RAND..CODE_MAX_RAND));
            }
            Opcode::Call => {
                let functions = org.jumps().functions();
                if functions.is_empty() {
                    org.line += 1;
                    return Flow::Next;
                }
                let start = functions[index(org.d) % functions.len()];
                let end = org.jumps().target(start - 1).saturating_sub(1);
                let frame = Frame {
                    ret: line + 1,
                    d: org.d,
                    a: org.a,
                    b: org.b,
                    end,
                };
                org.push_frame(frame);
                org.line = start;
                return Flow::Next;
            }
            Opcode::Func => {
                // Reaching a function header inside a call returns from it.
                match org.pop_frame() {
                    Some(frame) => {
                        org.line = frame.ret;
                        org.d = frame.d;
                        org.a = frame.a;
                        org.b = frame.b;
                    }
                    None => org.line = org.jumps().target(line),
                }
                return Flow::Next;
            }
            Opcode::Ret => {
                match org.pop_frame() {
                    Some(frame) => Self::return_from(org, frame),
                    None => org.line += 1,
                }
                return Flow::Next;
            }
            Opcode::End => {
                let opener = org.jumps().target(line);
                let opened_by = org
                    .code()
                    .get(opener)
                    .and_then(|&word| Instruction::decode(word).opcode());
                match opened_by {
                    Some(Opcode::Loop) if opener != line => org.line = opener,
                    Some(Opcode::Func)
                        if opener != line
                            && org.frames().last().is_some_and(|frame| frame.end == line) =>
                    {
                        match org.pop_frame() {
                            Some(frame) => Self::return_from(org, frame),
                            None => org.line = line + 1,
                        }
                    }
                    _ => org.line = line + 1,
                }
                return Flow::Next;
            }
            Opcode::Get => self.op_get(org),
            Opcode::Put => self.op_put(org),
            Opcode::Mix => self.op_mix(org),
        }
        org.line += 1;
        Flow::Next
    }

    /// Restore the caller, keeping `d` as the return value.
    fn return_from(org: &mut Organism, frame: Frame) {
        org.line = frame.ret;
        org.a = frame.a;
        org.b = frame.b;
    }

    fn op_step(&mut self, slot: usize, org: &mut Organism) -> Flow {
        org.line += 1;
        let step_energy = self.config.org_step_energy;
        let mut delay = org.moves;

        if let Cell::Token(token) = org.beneath {
            if let Some(surface) = self.surfaces.get(usize::from(token.kind)) {
                let cost = surface.config().energy;
                let radiation = surface.config().radiation;
                delay = delay.saturating_add(surface.config().step);
                self.charge(org, cost);
                if !org.is_alive() {
                    return Flow::Die;
                }
                org.radiation += radiation;
                if org.radiation >= 1.0 {
                    org.radiation = 0.0;
                    mutation::mutate(org, &self.config, &mut self.rng);
                    trace!(id = %org.id, "radiation mutation");
                }
            }
        }

        org.steps += 1;
        if org.steps < delay {
            self.charge(org, step_energy);
            return if org.is_alive() { Flow::Next } else { Flow::Die };
        }
        org.steps = 0;

        let Some(target) = self.grid.neighbor(org.offset, direction(org.d), 0) else {
            return Flow::Next;
        };
        let cell = self.grid.get(target);
        if self.is_barrier(cell) {
            return Flow::Next;
        }
        self.grid.move_org(org.offset, target, slot, org.beneath);
        org.beneath = cell;
        org.offset = target;
        self.charge(org, step_energy);
        if org.is_alive() { Flow::Next } else { Flow::Die }
    }

    fn op_eat(&mut self, org: &mut Organism) -> Flow {
        org.line += 1;
        let amount = to_int(org.d).saturating_abs();
        let Some(target) = self.grid.neighbor(org.offset, direction(org.d), 0) else {
            org.b = 0.0;
            return Flow::Next;
        };
        match self.grid.get(target) {
            Cell::Org(victim) if self.config.org_eat_orgs => {
                let Some(prey) = self.pool.get_mut(victim) else {
                    org.b = 0.0;
                    return Flow::Next;
                };
                let taken = prey.energy.min(amount);
                prey.energy -= taken;
                let drained = prey.energy <= 0;
                // Energy only changes hands, the ledger total stays the same.
                org.energy += taken;
                org.b = taken as f64;
                if drained {
                    self.kill(victim);
                    return Flow::Yield;
                }
            }
            Cell::Token(token) if token.is_energy() => {
                let gain = (f64::from(token.atom)
                    * self.config.energy_value as f64
                    * self.config.org_energy_multiplier)
                    .round() as i64;
                self.surfaces[usize::from(ENERGY_KIND)].remove(&mut self.grid, target, false);
                self.credit(org, gain);
                org.b = gain as f64;
            }
            // Other terrain leaves `b` untouched.
            Cell::Token(_) => {}
            _ => org.b = 0.0,
        }
        Flow::Next
    }

    fn op_clone(&mut self, org: &mut Organism) -> Flow {
        org.line += 1;
        org.b = 0.0;
        if self.pool.is_full() || org.energy < self.config.org_clone_energy {
            return Flow::Next;
        }
        let Some(target) = self.grid.neighbor(org.offset, direction(org.d), 0) else {
            return Flow::Next;
        };
        if !self.grid.get(target).is_empty() {
            return Flow::Next;
        }

        let share = org.energy / 2;
        if share <= 0 {
            return Flow::Die;
        }
        let id = self.allocate_id();
        let mut child = org.offspring(id, target, share, &self.config);
        org.energy -= share;
        // `adopt` credits the child's share back.
        self.total_energy -= share;

        let every = self.config.code_mutate_every_clone;
        if every > 0 && self.rng.random_range(0..every) == 0 {
            mutation::mutate(&mut child, &self.config, &mut self.rng);
        }
        let every = self.config.code_crossover_every_clone;
        if every > 0 && self.rng.random_range(0..every) == 0 {
            let donor = self.rng.random_range(0..self.pool.capacity());
            if let Some(code) = self.pool.get(donor).map(|d| d.code().to_vec()) {
                mutation::crossover(&mut child, &code, &self.config, &mut self.rng);
            }
        }

        if self.adopt(child).is_some() {
            org.b = 1.0;
        }
        Flow::Next
    }

    fn op_see(&mut self, org: &mut Organism) {
        org.d = match self
            .grid
            .neighbor(org.offset, direction(org.d), to_int(org.a))
        {
            None => 0.0,
            Some(target) => match self.grid.get(target) {
                // Organisms read as 0 regardless of their energy.
                Cell::Org(_) => 0.0,
                cell => cell.raw(),
            },
        };
    }

    fn op_get(&mut self, org: &mut Organism) {
        org.b = 0.0;
        if org.packet.is_some() {
            return;
        }
        let Some(target) = self.grid.neighbor(org.offset, direction(org.d), 0) else {
            return;
        };
        let Cell::Token(token) = self.grid.get(target) else {
            return;
        };
        let Some(surface) = self.surfaces.get_mut(usize::from(token.kind)) else {
            return;
        };
        if !surface.config().pickup {
            return;
        }
        if let Some(token) = surface.remove(&mut self.grid, target, true) {
            org.b = token.raw();
            org.packet = Some(token);
        }
    }

    fn op_put(&mut self, org: &mut Organism) {
        let Some(packet) = org.packet else {
            return;
        };
        let Some(target) = self.grid.neighbor(org.offset, direction(org.d), 0) else {
            return;
        };
        let Some(surface) = self.surfaces.get_mut(usize::from(packet.kind)) else {
            return;
        };
        if surface.place(&mut self.grid, target, packet) {
            org.b = packet.raw();
            org.packet = None;
        }
    }

    fn op_mix(&mut self, org: &mut Organism) {
        org.b = 0.0;
        let Some(packet) = org.packet.filter(|p| p.is_energy()) else {
            return;
        };
        let Some(target) = self.grid.neighbor(org.offset, direction(org.d), 0) else {
            return;
        };
        if !self.grid.get(target).token().is_some_and(|t| t.is_energy()) {
            return;
        }
        let surface = &mut self.surfaces[usize::from(ENERGY_KIND)];
        if let Some(merged) = surface.merge(&mut self.grid, target, packet) {
            org.b = merged.raw();
            org.packet = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_conversion_truncates() {
        assert_eq!(to_int(2.9), 2);
        assert_eq!(to_int(-2.9), -2);
        assert_eq!(to_int(f64::NAN), 0);
        assert_eq!(to_int(f64::INFINITY), 0);
        assert_eq!(direction(-9.5), 1);
    }

    #[test]
    fn saturation_clamps_to_finite_range() {
        assert_eq!(saturate(f64::INFINITY), f64::MAX);
        assert_eq!(saturate(f64::NEG_INFINITY), -f64::MAX);
        assert_eq!(saturate(f64::NAN), 0.0);
        assert_eq!(saturate(1.5), 1.5);
    }
}
