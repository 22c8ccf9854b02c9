//! Resource release during graceful shutdown.

use std::future::Future;
use tracing::{error, info};

pub async fn close_postgres(db: sea_orm::DatabaseConnection, name: &str) {
    match db.close().await {
        Ok(()) => info!(connection = name, "PostgreSQL pool closed"),
        Err(e) => error!(connection = name, error = %e, "Error closing PostgreSQL pool"),
    }
}

/// Runs named cleanup tasks concurrently and waits for all of them.
/// A panicking task is logged and does not stop the others.
#[derive(Default)]
pub struct CleanupCoordinator {
    tasks: Vec<(&'static str, tokio::task::JoinHandle<()>)>,
}

impl CleanupCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` immediately
    pub fn add_task<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push((name, tokio::spawn(task)));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub async fn run(self) {
        info!(tasks = self.tasks.len(), "Running cleanup tasks");

        for (name, handle) in self.tasks {
            match handle.await {
                Ok(()) => info!(task = name, "Cleanup task completed"),
                Err(e) => error!(task = name, error = %e, "Cleanup task failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn runs_every_task_even_if_one_panics() {
        let done = Arc::new(AtomicU32::new(0));
        let mut cleanup = CleanupCoordinator::new();

        let counter = done.clone();
        cleanup.add_task("search", async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        cleanup.add_task("broken", async { panic!("boom") });
        let counter = done.clone();
        cleanup.add_task("postgres", async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(cleanup.len(), 3);
        cleanup.run().await;
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }
}
