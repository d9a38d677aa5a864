//! Boundary traits for the collaborators the core notifies but never reads from.

use serde::{Deserialize, Serialize};

use crate::OrganismId;

/// Rendering sink receiving cell-level changes and the status line.
pub trait WorldView: Send {
    /// Cell `(x, y)` now shows `color`.
    fn dot(&mut self, x: u32, y: u32, color: u32);

    /// Cell `(x, y)` is now empty.
    fn empty(&mut self, x: u32, y: u32);

    /// Replace the status line.
    fn title(&mut self, text: &str);
}

/// No-op rendering sink.
#[derive(Debug, Default)]
pub struct NullView;

impl WorldView for NullView {
    fn dot(&mut self, _x: u32, _y: u32, _color: u32) {}

    fn empty(&mut self, _x: u32, _y: u32) {}

    fn title(&mut self, _text: &str) {}
}

/// Lineage entry describing a newly created organism.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineageRecord {
    pub id: OrganismId,
    pub parent: Option<OrganismId>,
    pub iteration: u64,
    pub offset: usize,
    pub energy: i64,
    pub code: Vec<i32>,
}

/// Persistence sink invoked whenever an organism is created.
///
/// Implementations own their failure handling; the simulation never observes it.
pub trait LineagePersistence: Send {
    fn on_birth(&mut self, record: &LineageRecord);
}

/// No-op persistence sink.
#[derive(Debug, Default)]
pub struct NullLineage;

impl LineagePersistence for NullLineage {
    fn on_birth(&mut self, _record: &LineageRecord) {}
}
