use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::error::AppResult;

/// Per-key in-flight computation registry
///
/// Concurrent callers for the same key share one computation; the first
/// caller runs it and the rest await its result. Entries are dropped once
/// the computation settles.
pub struct InFlight<T> {
    calls: Mutex<HashMap<String, Arc<OnceCell<T>>>>,
}

impl<T> Default for InFlight<T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> InFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `compute` for `key` unless a call for the same key is already in
    /// progress, in which case the caller waits and receives a clone of that
    /// call's result.
    ///
    /// The key is released once its computation settles. A failed
    /// computation is not remembered: its error goes to the caller that ran
    /// it, and the next waiter runs its own `compute`.
    pub async fn run<F, Fut>(&self, key: &str, compute: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let cell = {
            let mut calls = self.calls.lock().await;
            calls
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell.get_or_try_init(compute).await.cloned();

        let mut calls = self.calls.lock().await;
        if calls.get(key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            calls.remove(key);
        }

        result
    }

    /// Keys with a computation currently registered
    pub async fn len(&self) -> usize {
        self.calls.lock().await.len()
    }
}
