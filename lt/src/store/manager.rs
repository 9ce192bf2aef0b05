//! HabitStore - actor that owns the HabitBook
//!
//! Processes commands via channels so every mutation is applied atomically,
//! one at a time, no matter how many handles are in use.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::domain::{CoachContext, Frequency, Habit, HabitId, HabitStats};

use super::book::HabitBook;
use super::messages::{StoreCommand, StoreError, StoreResponse};

/// Handle to send commands to the HabitStore actor
#[derive(Clone)]
pub struct HabitStore {
    tx: mpsc::Sender<StoreCommand>,
}

impl HabitStore {
    /// Spawn a new HabitStore actor with an empty collection
    pub fn spawn() -> Self {
        Self::spawn_with(HabitBook::new())
    }

    /// Spawn a HabitStore actor that owns the given collection
    pub fn spawn_with(book: HabitBook) -> Self {
        debug!(habit_count = book.len(), "spawn_with: called");
        let (tx, rx) = mpsc::channel(256);

        tokio::spawn(actor_loop(book, rx));

        info!("HabitStore spawned");
        Self { tx }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<StoreResponse<T>>) -> StoreCommand) -> StoreResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| StoreError::ChannelError)?;
        reply_rx.await.map_err(|_| StoreError::ChannelError)?
    }

    /// Create a new habit
    pub async fn create(&self, name: &str, frequency: Frequency) -> StoreResponse<Habit> {
        self.create_with_description(name, frequency, None).await
    }

    /// Create a new habit with a description
    pub async fn create_with_description(
        &self,
        name: &str,
        frequency: Frequency,
        description: Option<String>,
    ) -> StoreResponse<Habit> {
        debug!(%name, %frequency, "create: called");
        self.request(|reply| StoreCommand::Create {
            name: name.to_string(),
            frequency,
            description,
            reply,
        })
        .await
    }

    /// Toggle a habit's completed flag
    pub async fn toggle(&self, id: &HabitId) -> StoreResponse<Habit> {
        debug!(%id, "toggle: called");
        self.request(|reply| StoreCommand::Toggle { id: id.clone(), reply })
            .await
    }

    /// Delete a habit
    pub async fn delete(&self, id: &HabitId) -> StoreResponse<()> {
        debug!(%id, "delete: called");
        self.request(|reply| StoreCommand::Delete { id: id.clone(), reply })
            .await
    }

    /// Get a habit by ID
    pub async fn get(&self, id: &HabitId) -> StoreResponse<Option<Habit>> {
        debug!(%id, "get: called");
        self.request(|reply| StoreCommand::Get { id: id.clone(), reply }).await
    }

    /// Get a habit by ID, returning error if not found
    pub async fn get_required(&self, id: &HabitId) -> StoreResponse<Habit> {
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// List all habits in insertion order
    pub async fn list(&self) -> StoreResponse<Vec<Habit>> {
        debug!("list: called");
        self.request(|reply| StoreCommand::List { reply }).await
    }

    /// Derived statistics
    pub async fn stats(&self) -> StoreResponse<HabitStats> {
        debug!("stats: called");
        self.request(|reply| StoreCommand::Stats { reply }).await
    }

    /// Coaching context built from the current state
    pub async fn snapshot(&self) -> StoreResponse<CoachContext> {
        debug!("snapshot: called");
        self.request(|reply| StoreCommand::Snapshot { reply }).await
    }

    /// Resolve a partial habit reference to a full ID
    pub async fn resolve(&self, reference: &str) -> StoreResponse<HabitId> {
        debug!(%reference, "resolve: called");
        self.request(|reply| StoreCommand::Resolve {
            reference: reference.to_string(),
            reply,
        })
        .await
    }

    /// Clear completed flags for a new tracking period
    pub async fn rollover(&self, frequency: Option<Frequency>) -> StoreResponse<usize> {
        debug!(?frequency, "rollover: called");
        self.request(|reply| StoreCommand::Rollover { frequency, reply })
            .await
    }

    /// Stop the actor; later calls fail with ChannelError
    pub async fn shutdown(&self) -> StoreResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(StoreCommand::Shutdown)
            .await
            .map_err(|_| StoreError::ChannelError)
    }
}

async fn actor_loop(mut book: HabitBook, mut rx: mpsc::Receiver<StoreCommand>) {
    debug!("HabitStore actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::Create {
                name,
                frequency,
                description,
                reply,
            } => {
                debug!(%name, "actor_loop: Create command");
                let _ = reply.send(book.create(&name, frequency, description));
            }

            StoreCommand::Toggle { id, reply } => {
                debug!(%id, "actor_loop: Toggle command");
                let _ = reply.send(book.toggle(&id));
            }

            StoreCommand::Delete { id, reply } => {
                debug!(%id, "actor_loop: Delete command");
                let _ = reply.send(book.delete(&id));
            }

            StoreCommand::Get { id, reply } => {
                debug!(%id, "actor_loop: Get command");
                let _ = reply.send(Ok(book.get(&id).cloned()));
            }

            StoreCommand::List { reply } => {
                debug!("actor_loop: List command");
                let _ = reply.send(Ok(book.list().to_vec()));
            }

            StoreCommand::Stats { reply } => {
                debug!("actor_loop: Stats command");
                let _ = reply.send(Ok(book.stats()));
            }

            StoreCommand::Snapshot { reply } => {
                debug!("actor_loop: Snapshot command");
                let _ = reply.send(Ok(book.snapshot()));
            }

            StoreCommand::Resolve { reference, reply } => {
                debug!(%reference, "actor_loop: Resolve command");
                let _ = reply.send(book.resolve(&reference));
            }

            StoreCommand::Rollover { frequency, reply } => {
                debug!(?frequency, "actor_loop: Rollover command");
                let reset = book.rollover(frequency);
                info!(reset, ?frequency, "Rolled over tracking period");
                let _ = reply.send(Ok(reset));
            }

            StoreCommand::Shutdown => {
                info!("HabitStore shutting down");
                break;
            }
        }
    }

    debug!("HabitStore actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_habit_store_crud() {
        let store = HabitStore::spawn();

        let habit = store.create("Drink water", Frequency::Daily).await.unwrap();
        assert_eq!(habit.name, "Drink water");

        let toggled = store.toggle(&habit.id).await.unwrap();
        assert!(toggled.completed);
        assert_eq!(toggled.streak, 1);

        let fetched = store.get_required(&habit.id).await.unwrap();
        assert_eq!(fetched, toggled);

        assert_eq!(store.list().await.unwrap().len(), 1);

        store.delete(&habit.id).await.unwrap();
        assert!(store.get(&habit.id).await.unwrap().is_none());
        assert!(store.toggle(&habit.id).await.unwrap_err().is_not_found());
        assert!(store.delete(&habit.id).await.unwrap_err().is_not_found());

        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_habit_store_validation() {
        let store = HabitStore::spawn();
        let err = store.create("   ", Frequency::Weekly).await.unwrap_err();
        assert!(err.is_validation());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_habit_store_stats_and_snapshot() {
        let store = HabitStore::spawn();
        assert_eq!(store.stats().await.unwrap(), HabitStats::default());

        let h = store.create("Stretch", Frequency::Custom).await.unwrap();
        store.toggle(&h.id).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.completed_today, 1);
        assert_eq!(stats.best_streak, 1);

        let ctx = store.snapshot().await.unwrap();
        assert_eq!(ctx.total_habits, 1);
        assert_eq!(ctx.habits[0].name, "Stretch");
    }

    #[tokio::test]
    async fn test_concurrent_toggles_are_not_lost() {
        let store = HabitStore::spawn();
        let h = store.create("Pushups", Frequency::Daily).await.unwrap();

        // 50 toggles from concurrent tasks: 25 completions
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            let id = h.id.clone();
            handles.push(tokio::spawn(async move { store.toggle(&id).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let h = store.get_required(&h.id).await.unwrap();
        assert!(!h.completed);
        assert_eq!(h.streak, 25);
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let store = HabitStore::spawn();
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(&format!("habit {}", i % 3), Frequency::Daily).await
            }));
        }
        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap().id);
        }
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn test_rollover_and_resolve() {
        let store = HabitStore::spawn();
        let h = store.create("Evening walk", Frequency::Daily).await.unwrap();
        store.toggle(&h.id).await.unwrap();

        assert_eq!(store.resolve("walk").await.unwrap(), h.id);
        assert_eq!(store.rollover(Some(Frequency::Weekly)).await.unwrap(), 0);
        assert_eq!(store.rollover(None).await.unwrap(), 1);
        assert!(!store.get_required(&h.id).await.unwrap().completed);
    }

    #[tokio::test]
    async fn test_calls_after_shutdown_fail() {
        let store = HabitStore::spawn();
        store.shutdown().await.unwrap();
        // Give the actor a moment to exit
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(store.list().await.unwrap_err(), StoreError::ChannelError);
    }
}
