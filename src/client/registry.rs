//! Client registry
//!
//! Shared collection of named sessions, indexed by connection handle and by
//! display name. One lock covers both indexes so a name can never be seen as
//! both taken and free, and no two registrations can claim the same name.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use tokio::sync::Mutex;

use crate::client::{ClientId, ClientRecord, Outbox};
use crate::error::RegistrationError;

#[derive(Default)]
struct RegistryInner {
    by_id: HashMap<ClientId, ClientRecord>,
    by_name: HashMap<String, ClientId>,
}

/// Registry for tracking named clients, bounded by `capacity`.
pub struct Registry {
    inner: Mutex<RegistryInner>,
    capacity: usize,
    next_id: AtomicU64,
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            capacity,
            next_id: AtomicU64::new(1),
        }
    }

    /// Hands out a fresh connection handle.
    pub fn next_client_id(&self) -> ClientId {
        ClientId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Inserts `record` if there is room and its name is free.
    ///
    /// Capacity, name uniqueness and the insert happen under one lock, so two
    /// clients racing for the same name cannot both win.
    pub async fn register(&self, record: ClientRecord) -> Result<(), RegistrationError> {
        self.register_with(record, |_| {}).await
    }

    /// Like [`register`](Self::register), but runs `on_insert` with the new
    /// record before the lock is released, so anything it queues on the
    /// record's outbox lands ahead of traffic from other clients.
    pub async fn register_with<F>(
        &self,
        record: ClientRecord,
        on_insert: F,
    ) -> Result<(), RegistrationError>
    where
        F: FnOnce(&ClientRecord),
    {
        let mut inner = self.inner.lock().await;

        if inner.by_id.len() >= self.capacity {
            return Err(RegistrationError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        if inner.by_name.contains_key(record.name()) {
            return Err(RegistrationError::NameTaken(record.name().to_string()));
        }

        debug!("Registering {} as '{}'", record.id(), record.name());
        on_insert(&record);
        inner.by_name.insert(record.name().to_string(), record.id());
        inner.by_id.insert(record.id(), record);
        Ok(())
    }

    /// Removes the record for `id`. Removing an unknown handle is a no-op.
    pub async fn unregister(&self, id: ClientId) -> Option<ClientRecord> {
        let mut inner = self.inner.lock().await;
        let record = inner.by_id.remove(&id)?;
        inner.by_name.remove(record.name());
        debug!("Unregistered {} ('{}')", id, record.name());
        Some(record)
    }

    /// Exact, case-sensitive name match.
    pub async fn is_name_taken(&self, name: &str) -> bool {
        self.inner.lock().await.by_name.contains_key(name)
    }

    pub async fn lookup_by_name(&self, name: &str) -> Option<Outbox> {
        let inner = self.inner.lock().await;
        let id = inner.by_name.get(name)?;
        inner.by_id.get(id).map(|record| record.outbox().clone())
    }

    /// Point-in-time snapshot of every registered client except `excluding`.
    pub async fn broadcast_targets(&self, excluding: ClientId) -> Vec<Outbox> {
        let inner = self.inner.lock().await;
        inner
            .by_id
            .values()
            .filter(|record| record.id() != excluding)
            .map(|record| record.outbox().clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.by_id.is_empty()
    }

    /// Registered names in sorted order.
    pub async fn names(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut names: Vec<String> = inner.by_name.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::spawn_writer;
    use std::collections::HashSet;
    use std::net::SocketAddr;
    use std::sync::Arc;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn record(registry: &Registry, name: &str) -> ClientRecord {
        let id = registry.next_client_id();
        let (outbox, _writer) = spawn_writer(id, tokio::io::sink(), 16);
        ClientRecord::new(id, name, peer(), outbox)
    }

    #[tokio::test]
    async fn register_and_lookup() {
        let registry = Registry::new(4);
        let alice = record(&registry, "alice");
        let alice_id = alice.id();

        registry.register(alice).await.unwrap();

        assert!(registry.is_name_taken("alice").await);
        assert!(!registry.is_name_taken("Alice").await);
        assert_eq!(
            registry.lookup_by_name("alice").await.map(|o| o.owner()),
            Some(alice_id)
        );
        assert!(registry.lookup_by_name("bob").await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn capacity_is_enforced_without_eviction() {
        let registry = Registry::new(2);
        registry.register(record(&registry, "a")).await.unwrap();
        registry.register(record(&registry, "b")).await.unwrap();

        let result = registry.register(record(&registry, "c")).await;
        assert_eq!(
            result,
            Err(RegistrationError::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(registry.names().await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn register_with_runs_only_on_success() {
        let registry = Registry::new(1);
        let mut calls = 0;

        registry
            .register_with(record(&registry, "alice"), |r| {
                assert_eq!(r.name(), "alice");
                calls += 1;
            })
            .await
            .unwrap();
        let full = registry
            .register_with(record(&registry, "bob"), |_| calls += 1)
            .await;

        assert!(full.is_err());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn duplicate_name_is_refused() {
        let registry = Registry::new(4);
        registry.register(record(&registry, "alice")).await.unwrap();

        let result = registry.register(record(&registry, "alice")).await;
        assert_eq!(result, Err(RegistrationError::NameTaken("alice".into())));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn unregister_is_idempotent_and_frees_the_name() {
        let registry = Registry::new(4);
        let alice = record(&registry, "alice");
        let id = alice.id();
        registry.register(alice).await.unwrap();

        assert!(registry.unregister(id).await.is_some());
        assert!(registry.unregister(id).await.is_none());
        assert!(!registry.is_name_taken("alice").await);
        assert!(registry.is_empty().await);

        registry.register(record(&registry, "alice")).await.unwrap();
        assert!(registry.is_name_taken("alice").await);
    }

    #[tokio::test]
    async fn broadcast_targets_excludes_sender_and_removed_clients() {
        let registry = Registry::new(8);
        let a = record(&registry, "a");
        let b = record(&registry, "b");
        let c = record(&registry, "c");
        let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());
        for r in [a, b, c] {
            registry.register(r).await.unwrap();
        }
        registry.unregister(c_id).await;

        let targets: HashSet<ClientId> = registry
            .broadcast_targets(a_id)
            .await
            .iter()
            .map(Outbox::owner)
            .collect();
        assert_eq!(targets, HashSet::from([b_id]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_of_one_name_have_one_winner() {
        let registry = Arc::new(Registry::new(64));

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                let candidate = record(&registry, "dup");
                // Same check-then-register sequence the connection handler uses.
                if registry.is_name_taken("dup").await {
                    return false;
                }
                registry.register(candidate).await.is_ok()
            }));
        }

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(registry.names().await, vec!["dup"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_never_exceed_capacity() {
        let registry = Arc::new(Registry::new(5));

        let mut tasks = Vec::new();
        for i in 0..20 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                registry.register(record(&registry, &format!("user{i}"))).await
            }));
        }

        let mut ok = 0;
        let mut full = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(()) => ok += 1,
                Err(RegistrationError::CapacityExceeded { capacity }) => {
                    assert_eq!(capacity, 5);
                    full += 1;
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(ok, 5);
        assert_eq!(full, 15);
        assert_eq!(registry.len().await, 5);
    }
}
