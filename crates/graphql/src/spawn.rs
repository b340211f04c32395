//! Background task spawning behind a trait so tests can await completion.
//!
//! Scene drafting returns to the caller immediately and finishes in a
//! spawned task. Production wiring hands that task to the tokio runtime;
//! tests swap in [`TrackingSpawner`] and call [`TrackingSpawner::drain`] to
//! wait for every spawned task before asserting on side effects.

use std::sync::Mutex;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;

pub trait Spawner: Send + Sync {
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// Spawner backed by the ambient tokio runtime.
pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        tokio::spawn(task);
    }
}

/// Spawner that keeps every join handle so callers can await completion.
#[derive(Default)]
pub struct TrackingSpawner {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TrackingSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Await every task spawned so far, including tasks spawned by the
    /// awaited tasks themselves.
    pub async fn drain(&self) {
        loop {
            let batch: Vec<JoinHandle<()>> = {
                let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
                handles.drain(..).collect()
            };
            if batch.is_empty() {
                return;
            }
            for handle in batch {
                let _ = handle.await;
            }
        }
    }
}

impl Spawner for TrackingSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        let handle = tokio::spawn(task);
        self.handles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);
    }
}
