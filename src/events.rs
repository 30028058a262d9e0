#![cfg(feature = "std")]

//! Typed callback registries for collaborator notifications.
//!
//! Collaborator client layers call [`EventRegistry::emit`] synchronously.
//! Subscribers keep the returned [`SubscriptionId`] and remove themselves
//! with [`EventRegistry::unsubscribe`]; nothing is removed implicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::ledger::{GameId, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

pub struct EventRegistry<E> {
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(SubscriptionId, Callback<E>)>>,
}

impl<E> EventRegistry<E> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Returns `false` if `id` was not registered (already removed).
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.lock();
        let before = callbacks.len();
        callbacks.retain(|(sid, _)| *sid != id);
        callbacks.len() != before
    }

    /// Invoke every current subscriber; returns how many were called.
    /// Callbacks run outside the registry lock so they may subscribe or
    /// unsubscribe themselves.
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: Vec<Callback<E>> = self.lock().iter().map(|(_, cb)| cb.clone()).collect();
        for cb in &snapshot {
            cb(event);
        }
        snapshot.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Callback<E>)>> {
        self.callbacks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<E> Default for EventRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GameCreated {
    pub game_id: GameId,
    pub creator: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GameJoined {
    pub game_id: GameId,
    pub player: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ShotFired {
    pub game_id: GameId,
    pub shooter: PlayerId,
    pub position: u8,
    pub hit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GameEnded {
    pub game_id: GameId,
    pub winner: Option<PlayerId>,
}

/// The four ledger lifecycle categories.
#[derive(Default)]
pub struct LedgerEvents {
    pub game_created: EventRegistry<GameCreated>,
    pub game_joined: EventRegistry<GameJoined>,
    pub shot_fired: EventRegistry<ShotFired>,
    pub game_ended: EventRegistry<GameEnded>,
}

impl LedgerEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total subscribers across all categories.
    pub fn subscriber_count(&self) -> usize {
        self.game_created.len()
            + self.game_joined.len()
            + self.shot_fired.len()
            + self.game_ended.len()
    }
}
