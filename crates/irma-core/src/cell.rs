//! Occupant model of one grid cell.

use serde::{Deserialize, Serialize};

use crate::MAX_SURFACES;

/// Surface index of energy tokens.
pub const ENERGY_KIND: u8 = 0;

/// Non-organism object occupying a cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Token {
    /// Index of the owning surface.
    pub kind: u8,
    /// Atomic weight, at least 1.
    pub atom: u16,
}

impl Token {
    #[must_use]
    pub const fn new(kind: u8, atom: u16) -> Self {
        Self { kind, atom }
    }

    /// Fresh single-atom token of `kind`.
    #[must_use]
    pub const fn unit(kind: u8) -> Self {
        Self { kind, atom: 1 }
    }

    #[must_use]
    pub const fn is_energy(self) -> bool {
        self.kind == ENERGY_KIND
    }

    /// Numeric value organisms observe through `see`, `get`, `put` and `mix`.
    #[must_use]
    pub fn raw(self) -> f64 {
        f64::from(self.atom) * MAX_SURFACES as f64 + f64::from(self.kind)
    }
}

/// Exactly one occupant of a grid cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    /// Organism stored in the given pool slot.
    Org(usize),
    Token(Token),
}

impl Cell {
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub const fn is_org(self) -> bool {
        matches!(self, Self::Org(_))
    }

    #[must_use]
    pub const fn token(self) -> Option<Token> {
        match self {
            Self::Token(token) => Some(token),
            _ => None,
        }
    }

    /// Raw value of a non-organism cell; organisms read as zero.
    #[must_use]
    pub fn raw(self) -> f64 {
        match self {
            Self::Token(token) => token.raw(),
            Self::Empty | Self::Org(_) => 0.0,
        }
    }
}
