use crate::domain::card::CardId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slots = Arc<Mutex<HashMap<CardId, Arc<AsyncMutex<()>>>>>;

/// Registry of per-card mutation locks.
///
/// Every read-then-decide sequence on a card (a transfer, a moderation) runs
/// while holding that card's lock. Pairs are always acquired in ascending id
/// order so two transfers in opposite directions cannot deadlock.
///
/// Slots live only while someone holds or awaits them, so ids that never
/// resolve to a card leave nothing behind.
#[derive(Default, Clone)]
pub struct CardLocks {
    slots: Slots,
}

/// Held locks for one or two cards. Released on drop.
#[must_use]
pub struct CardGuard {
    slots: Slots,
    ids: Vec<CardId>,
    guards: Vec<OwnedMutexGuard<()>>,
}

impl Drop for CardGuard {
    fn drop(&mut self) {
        self.guards.clear();
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        for id in &self.ids {
            // Only the map still points at the mutex: no holder, no waiter.
            if slots.get(id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
                slots.remove(id);
            }
        }
    }
}

impl CardLocks {
    /// Creates an empty lock registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: CardId) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(id).or_default().clone()
    }

    pub async fn lock(&self, id: CardId) -> CardGuard {
        let guard = self.slot(id).lock_owned().await;
        CardGuard {
            slots: self.slots.clone(),
            ids: vec![id],
            guards: vec![guard],
        }
    }

    /// Locks both cards, lower id first. A card paired with itself is locked once.
    pub async fn lock_pair(&self, a: CardId, b: CardId) -> CardGuard {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let mut guard = self.lock(first).await;
        if second != first {
            guard.guards.push(self.slot(second).lock_owned().await);
            guard.ids.push(second);
        }
        guard
    }

    /// Number of cards currently locked or awaited.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
