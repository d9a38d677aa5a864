//! Terrain kinds owning token-covered cells.

use std::collections::HashMap;

use rand::Rng;
use tracing::trace;

use crate::cell::{Cell, Token};
use crate::config::{SurfaceConfig, SurfaceMotion};
use crate::grid::{DIRECTIONS, Grid};

/// Probes used when dropping a fresh token onto a random empty cell.
pub const PUT_ATTEMPTS: usize = 8;
/// Probes used when returning a carried token to the world.
pub const RESTORE_ATTEMPTS: usize = 64;

/// Down, down-left and down-right in grid direction order.
const SETTLE_DIRS: [usize; 3] = [4, 5, 3];

/// Set of offsets with O(1) insert, remove and uniform sampling.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    offsets: Vec<usize>,
    index: HashMap<usize, usize>,
}

impl TokenSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        self.index.contains_key(&offset)
    }

    pub fn insert(&mut self, offset: usize) -> bool {
        if self.index.contains_key(&offset) {
            return false;
        }
        self.index.insert(offset, self.offsets.len());
        self.offsets.push(offset);
        true
    }

    pub fn remove(&mut self, offset: usize) -> bool {
        let Some(pos) = self.index.remove(&offset) else {
            return false;
        };
        self.offsets.swap_remove(pos);
        if let Some(&moved) = self.offsets.get(pos) {
            self.index.insert(moved, pos);
        }
        true
    }

    /// Uniformly sampled member.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.offsets.is_empty() {
            return None;
        }
        Some(self.offsets[rng.random_range(0..self.offsets.len())])
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.offsets.iter().copied()
    }
}

/// Runtime state of one terrain kind.
#[derive(Debug, Clone)]
pub struct Surface {
    index: u8,
    config: SurfaceConfig,
    live: usize,
    atoms: u64,
    tokens: TokenSet,
    cur_delay: u32,
}

impl Surface {
    #[must_use]
    pub fn new(index: u8, config: SurfaceConfig) -> Self {
        Self {
            index,
            config,
            live: 0,
            atoms: 0,
            tokens: TokenSet::new(),
            cur_delay: 0,
        }
    }

    #[must_use]
    pub const fn index(&self) -> u8 {
        self.index
    }

    #[must_use]
    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Live tokens, including the ones carried by organisms.
    #[must_use]
    pub const fn live(&self) -> usize {
        self.live
    }

    /// Summed atomic weight of the live tokens.
    #[must_use]
    pub const fn atoms(&self) -> u64 {
        self.atoms
    }

    /// Offsets currently owned on the grid (possibly covered by organisms).
    #[must_use]
    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    /// Place the configured initial amount of tokens, returning how many landed.
    pub fn seed<R: Rng + ?Sized>(&mut self, grid: &mut Grid, rng: &mut R) -> usize {
        let placed = (0..self.config.initial)
            .filter(|_| self.put(grid, rng).is_some())
            .count();
        trace!(surface = %self.config.name, placed, "seeded surface");
        placed
    }

    /// Introduce a fresh single-atom token at a random empty cell.
    pub fn put<R: Rng + ?Sized>(&mut self, grid: &mut Grid, rng: &mut R) -> Option<usize> {
        if self.live >= self.config.capacity {
            return None;
        }
        let offset = grid.random_empty(rng, PUT_ATTEMPTS)?;
        grid.set_token(offset, Token::unit(self.index));
        self.tokens.insert(offset);
        self.live += 1;
        self.atoms += 1;
        Some(offset)
    }

    /// Add a new token of any weight at the empty cell `offset`.
    pub fn insert(&mut self, grid: &mut Grid, offset: usize, atom: u16) -> bool {
        if self.live >= self.config.capacity {
            return false;
        }
        let token = Token::new(self.index, atom.max(1));
        if !self.place(grid, offset, token) {
            return false;
        }
        self.live += 1;
        self.atoms += u64::from(token.atom);
        true
    }

    /// Return a carried token anywhere empty; it is destroyed when no cell is found.
    pub fn restore<R: Rng + ?Sized>(
        &mut self,
        grid: &mut Grid,
        rng: &mut R,
        token: Token,
    ) -> Option<usize> {
        match grid.random_empty(rng, RESTORE_ATTEMPTS) {
            Some(offset) => {
                grid.set_token(offset, token);
                self.tokens.insert(offset);
                Some(offset)
            }
            None => {
                self.forget(token);
                None
            }
        }
    }

    /// Drop a carried token onto the empty cell `offset`.
    pub fn place(&mut self, grid: &mut Grid, offset: usize, token: Token) -> bool {
        if offset >= grid.len() || !grid.get(offset).is_empty() {
            return false;
        }
        grid.set_token(offset, token);
        self.tokens.insert(offset);
        true
    }

    /// Clear this surface's token at `offset`.
    ///
    /// A picked-up token stays live (it is carried); otherwise it is destroyed.
    pub fn remove(&mut self, grid: &mut Grid, offset: usize, picked_up: bool) -> Option<Token> {
        let token = self.own_token(grid, offset)?;
        grid.clear(offset);
        self.tokens.remove(offset);
        if !picked_up {
            self.forget(token);
        }
        Some(token)
    }

    /// Fuse a carried token into this surface's token at `offset`.
    pub fn merge(&mut self, grid: &mut Grid, offset: usize, carried: Token) -> Option<Token> {
        let target = self.own_token(grid, offset)?;
        let merged = Token::new(target.kind, target.atom.saturating_add(carried.atom));
        let lost = u64::from(target.atom) + u64::from(carried.atom) - u64::from(merged.atom);
        self.atoms = self.atoms.saturating_sub(lost);
        self.live = self.live.saturating_sub(1);
        grid.set_token(offset, merged);
        Some(merged)
    }

    /// Advance the move cadence, moving tokens when it fires.
    pub fn tick<R: Rng + ?Sized>(&mut self, grid: &mut Grid, rng: &mut R) -> bool {
        if self.cur_delay < self.config.delay {
            self.cur_delay += 1;
            return false;
        }
        self.cur_delay = 0;
        self.move_tokens(grid, rng);
        true
    }

    /// Apply the motion rule to one random token; returns whether it moved.
    pub fn move_tokens<R: Rng + ?Sized>(&mut self, grid: &mut Grid, rng: &mut R) -> bool {
        if self.config.motion == SurfaceMotion::Static {
            return false;
        }
        let Some(from) = self.tokens.random(rng) else {
            return false;
        };
        // Tokens covered by an organism stay where they are.
        let Some(token) = self.own_token(grid, from) else {
            return false;
        };
        let target = match self.config.motion {
            SurfaceMotion::Static => None,
            SurfaceMotion::Spread => grid
                .neighbor(from, rng.random_range(0..DIRECTIONS), 0)
                .filter(|&to| grid.get(to).is_empty()),
            SurfaceMotion::Settle => SETTLE_DIRS
                .iter()
                .filter_map(|&dir| grid.neighbor(from, dir, 0))
                .find(|&to| grid.get(to).is_empty()),
            SurfaceMotion::Evaporate => grid.random_empty(rng, PUT_ATTEMPTS),
        };
        let Some(to) = target else {
            return false;
        };
        grid.clear(from);
        grid.set_token(to, token);
        self.tokens.remove(from);
        self.tokens.insert(to);
        true
    }

    fn own_token(&self, grid: &Grid, offset: usize) -> Option<Token> {
        grid.get(offset)
            .token()
            .filter(|token| token.kind == self.index)
    }

    fn forget(&mut self, token: Token) {
        self.live = self.live.saturating_sub(1);
        self.atoms = self.atoms.saturating_sub(u64::from(token.atom));
    }
}
