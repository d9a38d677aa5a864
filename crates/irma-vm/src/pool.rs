//! Fixed-capacity organism storage.

use crate::organism::Organism;

#[derive(Debug, Clone)]
enum Slot {
    Free,
    /// Allocated, organism currently executing outside the pool.
    CheckedOut,
    Live(Organism),
}

/// Slot storage with a free list; slot indices are what grid cells reference.
///
/// A slot may be checked out with [`OrganismPool::take`] while its organism
/// executes; it stays allocated until [`OrganismPool::restore`] or
/// [`OrganismPool::release`].
#[derive(Debug, Clone)]
pub struct OrganismPool {
    slots: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
}

impl OrganismPool {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| Slot::Free).collect(),
            free: (0..capacity).rev().collect(),
            live: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Allocated slots, checked-out ones included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Store `org` in a free slot, returning its index.
    pub fn insert(&mut self, org: Organism) -> Option<usize> {
        let slot = self.free.pop()?;
        self.slots[slot] = Slot::Live(org);
        self.live += 1;
        Some(slot)
    }

    /// Remove and free the organism in `slot`.
    pub fn remove(&mut self, slot: usize) -> Option<Organism> {
        let org = self.vacate(slot, Slot::Free)?;
        self.free_slot(slot);
        Some(org)
    }

    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&Organism> {
        match self.slots.get(slot)? {
            Slot::Live(org) => Some(org),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Organism> {
        match self.slots.get_mut(slot)? {
            Slot::Live(org) => Some(org),
            _ => None,
        }
    }

    /// Check the organism out of `slot` without freeing it.
    pub fn take(&mut self, slot: usize) -> Option<Organism> {
        self.vacate(slot, Slot::CheckedOut)
    }

    /// Check an organism back into the slot it was taken from.
    pub fn restore(&mut self, slot: usize, org: Organism) {
        if self.is_checked_out(slot) {
            self.slots[slot] = Slot::Live(org);
        }
    }

    /// Free a checked-out slot whose organism died.
    pub fn release(&mut self, slot: usize) {
        if self.is_checked_out(slot) {
            self.slots[slot] = Slot::Free;
            self.free_slot(slot);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Organism)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| match entry {
                Slot::Live(org) => Some((slot, org)),
                _ => None,
            })
    }

    fn is_checked_out(&self, slot: usize) -> bool {
        matches!(self.slots.get(slot), Some(Slot::CheckedOut))
    }

    /// Move a live organism out of `slot`, leaving `state` behind.
    fn vacate(&mut self, slot: usize, state: Slot) -> Option<Organism> {
        if !matches!(self.slots.get(slot)?, Slot::Live(_)) {
            return None;
        }
        match std::mem::replace(&mut self.slots[slot], state) {
            Slot::Live(org) => Some(org),
            _ => None,
        }
    }

    fn free_slot(&mut self, slot: usize) {
        self.free.push(slot);
        self.live -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irma_core::{IrmaConfig, OrganismId};

    fn org(id: u64) -> Organism {
        Organism::new(OrganismId(id), 0, 1, &IrmaConfig::default())
    }

    #[test]
    fn insert_remove_keep_counts_consistent() {
        let mut pool = OrganismPool::with_capacity(3);
        assert_eq!(pool.insert(org(0)), Some(0));
        assert_eq!(pool.insert(org(1)), Some(1));
        assert_eq!(pool.insert(org(2)), Some(2));
        assert!(pool.is_full());
        assert!(pool.insert(org(3)).is_none());

        assert_eq!(pool.remove(1).map(|o| o.id), Some(OrganismId(1)));
        assert!(pool.remove(1).is_none());
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.insert(org(4)), Some(1), "freed slot is reused");
        assert_eq!(
            pool.iter().map(|(_, o)| o.id.0).collect::<Vec<_>>(),
            vec![0, 4, 2]
        );
    }

    #[test]
    fn checked_out_slots_stay_allocated() {
        let mut pool = OrganismPool::with_capacity(2);
        let slot = pool.insert(org(7)).expect("slot");
        let taken = pool.take(slot).expect("organism");
        assert_eq!(pool.len(), 1);
        assert!(pool.get(slot).is_none());
        pool.restore(slot, taken);
        assert!(pool.get(slot).is_some());

        pool.take(slot).expect("organism");
        pool.release(slot);
        pool.release(slot);
        assert!(pool.is_empty());
        assert_eq!(pool.insert(org(8)), Some(0));
        assert_eq!(pool.insert(org(9)), Some(1));
        assert!(pool.is_full());
    }

    #[test]
    fn release_and_restore_only_touch_checked_out_slots() {
        let mut pool = OrganismPool::with_capacity(2);
        let slot = pool.insert(org(1)).expect("slot");
        pool.release(slot);
        assert_eq!(pool.len(), 1, "live slots are not released");
        assert!(pool.get(slot).is_some());

        pool.restore(1, org(2));
        assert!(pool.get(1).is_none(), "free slots are not restored into");
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.insert(org(3)), Some(1));
    }
}
