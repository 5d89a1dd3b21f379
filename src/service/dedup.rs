use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy)]
struct Claim {
    id: u64,
    committed: bool,
}

/// Invoice keys already synchronized during this process lifetime.
///
/// Keys go through two states: reserved while their rows are being appended,
/// then committed. Both count as present for `contains`, so two concurrent
/// ingestions of one key cannot both get past the duplicate check. Nothing is
/// persisted; `reset` is the only way committed keys leave the set.
#[derive(Debug, Default)]
pub struct DuplicateTracker {
    keys: DashMap<String, Claim>,
    next_claim: AtomicU64,
}

impl DuplicateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Atomically reserves `key`. Returns `None` if it is already reserved or recorded.
    pub fn try_claim(&self, key: &str) -> Option<Reservation<'_>> {
        let id = self.next_claim.fetch_add(1, Ordering::Relaxed);
        match self.keys.entry(key.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(Claim {
                    id,
                    committed: false,
                });
                Some(Reservation {
                    tracker: self,
                    key: key.to_string(),
                    id,
                    committed: false,
                })
            }
        }
    }

    /// Marks `key` as synchronized without going through a reservation.
    pub fn record(&self, key: &str) {
        let id = self.next_claim.fetch_add(1, Ordering::Relaxed);
        self.keys.insert(
            key.to_string(),
            Claim {
                id,
                committed: true,
            },
        );
    }

    /// Forgets every key, reserved or committed.
    pub fn reset(&self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    // Commits only the claim that is still live; a reset in between wins.
    fn confirm(&self, key: &str, id: u64) -> bool {
        match self.keys.get_mut(key) {
            Some(mut claim) if claim.id == id && !claim.committed => {
                claim.committed = true;
                true
            }
            _ => false,
        }
    }

    fn release(&self, key: &str, id: u64) {
        self.keys
            .remove_if(key, |_, claim| claim.id == id && !claim.committed);
    }
}

/// Pending claim on an invoice key. Dropping it without `commit` releases the key.
#[derive(Debug)]
pub struct Reservation<'a> {
    tracker: &'a DuplicateTracker,
    key: String,
    id: u64,
    committed: bool,
}

impl Reservation<'_> {
    /// Marks the key as synchronized. Returns false if the tracker was reset
    /// after the claim was taken, in which case the key stays forgotten.
    pub fn commit(mut self) -> bool {
        self.committed = true;
        self.tracker.confirm(&self.key, self.id)
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.tracker.release(&self.key, self.id);
        }
    }
}
