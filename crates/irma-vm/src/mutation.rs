//! Code mutation, crossover and genome distance.

use irma_core::{IrmaConfig, MUTATION_KINDS};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::opcode::{CODE_CMD_OFFS, CODE_COMMANDS};
use crate::organism::Organism;

/// One kind of mutation event, in the order of [`IrmaConfig::org_probs`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Replace one word.
    Change,
    /// Remove one word.
    Delete,
    /// Re-roll the mutation period.
    Period,
    /// Re-roll the mutation amount.
    Amount,
    /// Re-roll one mutation-kind weight.
    Probs,
    /// Insert a random word.
    Insert,
    /// Duplicate a fragment.
    Copy,
    /// Remove a fragment.
    Cut,
}

impl MutationKind {
    pub const ALL: [MutationKind; MUTATION_KINDS] = [
        MutationKind::Change,
        MutationKind::Delete,
        MutationKind::Period,
        MutationKind::Amount,
        MutationKind::Probs,
        MutationKind::Insert,
        MutationKind::Copy,
        MutationKind::Cut,
    ];

    /// Weighted pick; all-zero weights fall back to [`MutationKind::Change`].
    pub fn pick<R: Rng + ?Sized>(probs: &[u32; MUTATION_KINDS], rng: &mut R) -> Self {
        let total: u64 = probs.iter().map(|&p| u64::from(p)).sum();
        if total == 0 {
            return MutationKind::Change;
        }
        let mut roll = rng.random_range(0..total);
        for (kind, &weight) in Self::ALL.iter().zip(probs) {
            let weight = u64::from(weight);
            if roll < weight {
                return *kind;
            }
            roll -= weight;
        }
        MutationKind::Change
    }
}

/// Random code word: an opcode with probability `opcode_chance`, a literal otherwise.
pub fn random_word<R: Rng + ?Sized>(rng: &mut R, opcode_chance: f64) -> i32 {
    if rng.random::<f64>() < opcode_chance {
        CODE_CMD_OFFS + rng.random_range(0..CODE_COMMANDS)
    } else {
        rng.random_range(-CODE_CMD_OFFS + 1..CODE_CMD_OFFS)
    }
}

pub fn random_code<R: Rng + ?Sized>(len: usize, rng: &mut R, opcode_chance: f64) -> Vec<i32> {
    (0..len).map(|_| random_word(rng, opcode_chance)).collect()
}

/// Apply `max(1, round(len * percent))` weighted events, returning how many ran.
pub fn mutate<R: Rng + ?Sized>(org: &mut Organism, config: &IrmaConfig, rng: &mut R) -> usize {
    let mut code = org.take_code();
    let events = ((code.len() as f64 * org.percent).round() as usize).max(1);
    for _ in 0..events {
        let kind = MutationKind::pick(&org.probs, rng);
        apply_event(org, &mut code, kind, config, rng);
    }
    org.set_code(code, config.code_max_size);
    org.mutations += 1;
    events
}

/// Apply a single event of `kind`.
pub fn apply<R: Rng + ?Sized>(
    org: &mut Organism,
    kind: MutationKind,
    config: &IrmaConfig,
    rng: &mut R,
) {
    let mut code = org.take_code();
    apply_event(org, &mut code, kind, config, rng);
    org.set_code(code, config.code_max_size);
    org.mutations += 1;
}

fn apply_event<R: Rng + ?Sized>(
    org: &mut Organism,
    code: &mut Vec<i32>,
    kind: MutationKind,
    config: &IrmaConfig,
    rng: &mut R,
) {
    let len = code.len();
    let max = config.code_max_size;
    match kind {
        MutationKind::Change => {
            let word = random_word(rng, config.code_opcode_chance);
            if len == 0 {
                if max > 0 {
                    code.push(word);
                }
            } else {
                code[rng.random_range(0..len)] = word;
            }
        }
        MutationKind::Delete => {
            if len > 0 {
                code.remove(rng.random_range(0..len));
            }
        }
        MutationKind::Period => {
            org.period = rng.random_range(1..=config.org_max_period.max(1));
        }
        MutationKind::Amount => {
            org.percent = rng.random::<f64>();
        }
        MutationKind::Probs => {
            let index = rng.random_range(0..MUTATION_KINDS);
            org.probs[index] = rng.random_range(0..=config.prob_max_value);
        }
        MutationKind::Insert => {
            if len < max {
                let word = random_word(rng, config.code_opcode_chance);
                code.insert(rng.random_range(0..=len), word);
            }
        }
        MutationKind::Copy => {
            if len > 0 && len < max {
                let (start, end) = fragment(len, rng);
                let piece = code[start..end].to_vec();
                let at = rng.random_range(0..=len);
                code.splice(at..at, piece);
                code.truncate(max);
            }
        }
        MutationKind::Cut => {
            if len > 0 {
                let (start, end) = fragment(len, rng);
                code.drain(start..end);
            }
        }
    }
}

/// Random non-empty half-open range inside `0..len`.
fn fragment<R: Rng + ?Sized>(len: usize, rng: &mut R) -> (usize, usize) {
    let start = rng.random_range(0..len);
    let end = rng.random_range(start..len) + 1;
    (start, end)
}

/// Splice a random fragment of `donor` into `recipient`; the donor is untouched.
pub fn crossover<R: Rng + ?Sized>(
    recipient: &mut Organism,
    donor: &[i32],
    config: &IrmaConfig,
    rng: &mut R,
) -> bool {
    if donor.is_empty() {
        return false;
    }
    let (start, end) = fragment(donor.len(), rng);
    let mut code = recipient.take_code();
    let at = rng.random_range(0..=code.len());
    code.splice(at..at, donor[start..end].iter().copied());
    recipient.set_code(code, config.code_max_size);
    true
}

/// Levenshtein distance between two genomes.
#[must_use]
pub fn distance(a: &[i32], b: &[i32]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, &wa) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, &wb) in b.iter().enumerate() {
            let cost = usize::from(wa != wb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
