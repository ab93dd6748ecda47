//! Per-project capacity ledger.
//!
//! The single source of truth for "is there room". Every capacity-affecting
//! operation for a given project is serialized through that project's entry
//! lock, so two concurrent registrations can never both win the last seat.
//! Operations on different projects take different locks and do not block
//! each other.
//!
//! The ledger is a maintained counter, not the system of record: `occupied`
//! must always equal the recount over `registered` store rows, and
//! [`CapacityLedger::reconcile`] restores that equality from a recount.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;

/// Capacity rejection from the ledger.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Capacity not available: {requested} seats requested, {available} available")]
    CapacityExceeded { requested: i64, available: i64 },

    #[error("No ledger entry for project {0}")]
    UnknownProject(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityEntry {
    pub occupied: i64,
    pub max: i64,
}

impl CapacityEntry {
    /// Seats still available, clamped at zero for over-capacity entries.
    pub fn available(&self) -> i64 {
        (self.max - self.occupied).max(0)
    }
}

/// Authoritative occupied-seat counter per project.
#[derive(Default)]
pub struct CapacityLedger {
    entries: RwLock<HashMap<i64, Arc<Mutex<CapacityEntry>>>>,
}

impl CapacityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the project already has a ledger entry.
    pub fn contains(&self, project_id: i64) -> bool {
        self.entries.read().unwrap().contains_key(&project_id)
    }

    /// Seeds an entry for a project if absent, otherwise updates its
    /// ceiling. `occupied` is only used for a fresh entry; an existing
    /// count is never clobbered here (that is what `reconcile` is for).
    pub fn ensure(&self, project_id: i64, max: i64, occupied: i64) {
        // Fast path with the read lock.
        {
            let entries = self.entries.read().unwrap();
            if let Some(entry) = entries.get(&project_id) {
                entry.lock().unwrap().max = max;
                return;
            }
        }

        let mut entries = self.entries.write().unwrap();
        // Double-check in case another thread seeded it.
        if let Some(entry) = entries.get(&project_id) {
            entry.lock().unwrap().max = max;
            return;
        }
        entries.insert(project_id, Arc::new(Mutex::new(CapacityEntry { occupied, max })));
    }

    fn entry(&self, project_id: i64) -> Result<Arc<Mutex<CapacityEntry>>, LedgerError> {
        self.entries
            .read()
            .unwrap()
            .get(&project_id)
            .cloned()
            .ok_or(LedgerError::UnknownProject(project_id))
    }

    /// Atomically checks and reserves `seats` on the project.
    pub fn try_reserve(&self, project_id: i64, seats: i64) -> Result<(), LedgerError> {
        let entry = self.entry(project_id)?;
        let mut entry = entry.lock().unwrap();
        if entry.occupied + seats > entry.max {
            return Err(LedgerError::CapacityExceeded {
                requested: seats,
                available: entry.available(),
            });
        }
        entry.occupied += seats;
        Ok(())
    }

    /// Returns previously reserved seats. Always succeeds; the caller is
    /// responsible for releasing only what it actually held.
    pub fn release(&self, project_id: i64, seats: i64) {
        let Ok(entry) = self.entry(project_id) else {
            tracing::warn!(project_id, seats, "Release for project without ledger entry");
            return;
        };
        let mut entry = entry.lock().unwrap();
        if entry.occupied < seats {
            tracing::warn!(
                project_id,
                occupied = entry.occupied,
                seats,
                "Ledger release underflow, clamping to zero"
            );
            entry.occupied = 0;
        } else {
            entry.occupied -= seats;
        }
    }

    /// Applies a seat-count delta. Positive deltas are capacity-checked,
    /// non-positive deltas always succeed (freeing seats is never blocked).
    pub fn adjust(&self, project_id: i64, delta: i64) -> Result<(), LedgerError> {
        if delta > 0 {
            return self.try_reserve(project_id, delta);
        }
        if delta < 0 {
            self.release(project_id, -delta);
        }
        Ok(())
    }

    /// Sets the project's seat ceiling. Reducing it below the current
    /// occupancy is allowed; the entry goes over-capacity and every
    /// subsequent reserve fails until seats are released below the new
    /// ceiling. Existing registrations are never force-cancelled.
    pub fn set_max(&self, project_id: i64, max: i64) -> Result<(), LedgerError> {
        let entry = self.entry(project_id)?;
        let mut entry = entry.lock().unwrap();
        if max < entry.occupied {
            tracing::warn!(
                project_id,
                occupied = entry.occupied,
                new_max = max,
                "Capacity reduced below occupancy; new reservations blocked until seats free up"
            );
        }
        entry.max = max;
        Ok(())
    }

    /// Current entry for a project.
    pub fn snapshot(&self, project_id: i64) -> Result<CapacityEntry, LedgerError> {
        let entry = self.entry(project_id)?;
        let entry = entry.lock().unwrap();
        Ok(*entry)
    }

    /// Overwrites the maintained count with a recount from the store.
    pub fn reconcile(&self, project_id: i64, max: i64, occupied: i64) {
        // Ensure-then-overwrite so reconcile also works for projects the
        // ledger has not seen yet.
        self.ensure(project_id, max, occupied);
        if let Ok(entry) = self.entry(project_id) {
            let mut entry = entry.lock().unwrap();
            if entry.occupied != occupied {
                tracing::warn!(
                    project_id,
                    ledger = entry.occupied,
                    recount = occupied,
                    "Ledger drift corrected during reconciliation"
                );
            }
            entry.occupied = occupied;
            entry.max = max;
        }
    }

    /// Drops the entry for a deleted project.
    pub fn remove(&self, project_id: i64) {
        self.entries.write().unwrap().remove(&project_id);
    }
}
