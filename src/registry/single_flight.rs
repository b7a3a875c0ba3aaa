// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Keyed initialization barrier with single-flight loading.
//!
//! Every key is in one of three states:
//!
//! - `Loading` - a loader task is running; callers wait on its channel
//! - `Ready` - the value is cached and returned immediately
//! - `Failed` - the last load failed; the next caller starts a new one
//!
//! Loaders run on their own tokio task. A caller that stops waiting (client
//! disconnect, timeout) does not cancel the load, and every other waiter
//! still receives the outcome.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

/// Outcome channel shared by the loader and its waiters.
type Outcome<V, E> = watch::Receiver<Option<Result<V, E>>>;

/// State of one key.
#[derive(Clone)]
pub enum Readiness<V, E> {
    Loading(Outcome<V, E>),
    Ready(V),
    Failed(E),
}

/// Raised to waiters when a loader task ends without reporting an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadAborted;

type Slots<K, V, E> = Arc<Mutex<HashMap<K, Readiness<V, E>>>>;

pub struct SingleFlight<K, V, E> {
    slots: Slots<K, V, E>,
}

impl<K, V, E> Default for SingleFlight<K, V, E> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

fn lock<K, V, E>(slots: &Slots<K, V, E>) -> MutexGuard<'_, HashMap<K, Readiness<V, E>>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<LoadAborted> + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value for `key`, starting `load` only if no load is
    /// running and no value is cached.
    pub async fn get_or_load<F, Fut>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let mut outcome = {
            let mut slots = lock(&self.slots);
            match slots.get(&key) {
                Some(Readiness::Ready(value)) => return Ok(value.clone()),
                Some(Readiness::Loading(outcome)) => outcome.clone(),
                Some(Readiness::Failed(_)) | None => {
                    let (tx, rx) = watch::channel(None);
                    slots.insert(key.clone(), Readiness::Loading(rx.clone()));
                    self.spawn_loader(key.clone(), load(), tx, rx.clone());
                    rx
                }
            }
        };

        let reported = outcome
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|current| current.clone());

        match reported {
            Some(result) => result,
            None => {
                self.forget_loading(&key, &outcome);
                Err(E::from(LoadAborted))
            }
        }
    }

    fn spawn_loader<Fut>(
        &self,
        key: K,
        future: Fut,
        tx: watch::Sender<Option<Result<V, E>>>,
        own: Outcome<V, E>,
    ) where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        tokio::spawn(async move {
            let result = future.await;
            {
                let mut slots = lock(&slots);
                // An invalidate() during the load hands the key to a newer loader.
                let still_ours = matches!(
                    slots.get(&key),
                    Some(Readiness::Loading(current)) if current.same_channel(&own)
                );
                if still_ours {
                    let settled = match &result {
                        Ok(value) => Readiness::Ready(value.clone()),
                        Err(err) => Readiness::Failed(err.clone()),
                    };
                    slots.insert(key, settled);
                }
            }
            tx.send_replace(Some(result));
        });
    }

    fn forget_loading(&self, key: &K, outcome: &Outcome<V, E>) {
        let mut slots = lock(&self.slots);
        if matches!(
            slots.get(key),
            Some(Readiness::Loading(current)) if current.same_channel(outcome)
        ) {
            slots.remove(key);
        }
    }

    /// Cached value for `key`, if loading has completed successfully.
    pub fn peek(&self, key: &K) -> Option<V> {
        match lock(&self.slots).get(key) {
            Some(Readiness::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Current state of `key`.
    pub fn state(&self, key: &K) -> Option<Readiness<V, E>> {
        lock(&self.slots).get(key).cloned()
    }

    /// Drop whatever is cached for `key`; the next caller loads afresh.
    pub fn invalidate(&self, key: &K) {
        lock(&self.slots).remove(key);
    }

    /// All values that finished loading.
    pub fn ready_values(&self) -> Vec<V> {
        lock(&self.slots)
            .values()
            .filter_map(|state| match state {
                Readiness::Ready(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }
}
