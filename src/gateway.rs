//! Mutation gateway
//!
//! Applies one create/update/delete to the item store and then triggers
//! exactly one broadcast of the resulting list. Commit, read-back and
//! broadcast run under the write side of a single lock, so concurrent
//! mutations are serialized and no broadcast can regress another's effect.
//! Reads take the read side and therefore never see a half-applied write.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::api::websocket::hub::{BroadcastHub, BroadcastReport};
use crate::store::ItemStore;
use crate::types::{Item, ItemId, Snapshot, TodoError, TodoResult};

/// Validate and normalize a title for creation
pub fn normalize_title(title: &str) -> TodoResult<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TodoError::ValidationFailed(
            "title must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Single-writer front door to the item store
pub struct MutationGateway {
    store: Arc<dyn ItemStore>,
    hub: Arc<BroadcastHub>,
    lock: RwLock<()>,
}

impl MutationGateway {
    pub fn new(store: Arc<dyn ItemStore>, hub: Arc<BroadcastHub>) -> Self {
        Self {
            store,
            hub,
            lock: RwLock::new(()),
        }
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Current list and the revision of the broadcast it matches
    pub async fn snapshot(&self) -> TodoResult<(Snapshot, u64)> {
        let _read = self.lock.read().await;
        let items = self.store.list_all()?;
        Ok((Snapshot::from(items), self.hub.current_revision()))
    }

    /// Create an incomplete item from a non-blank title
    pub async fn create(&self, title: &str) -> TodoResult<Item> {
        let title = normalize_title(title)?;

        let _write = self.lock.write().await;
        let item = self.store.create(title)?;
        info!(id = item.id, title = %item.title, "item created");

        self.publish().await?;
        Ok(item)
    }

    /// Set the completion flag of an existing item
    pub async fn update(&self, id: ItemId, is_complete: bool) -> TodoResult<()> {
        let _write = self.lock.write().await;
        let mut item = self.store.find_by_id(id)?.ok_or(TodoError::NotFound(id))?;
        item.is_complete = is_complete;
        self.store.update(&item)?;
        info!(id, is_complete, "item updated");

        self.publish().await?;
        Ok(())
    }

    /// Remove an existing item
    pub async fn delete(&self, id: ItemId) -> TodoResult<()> {
        let _write = self.lock.write().await;
        let item = self.store.find_by_id(id)?.ok_or(TodoError::NotFound(id))?;
        self.store.delete(&item)?;
        info!(id, "item deleted");

        self.publish().await?;
        Ok(())
    }

    /// Read back the full list and push it (caller holds the write lock)
    async fn publish(&self) -> TodoResult<BroadcastReport> {
        let items = self.store.list_all()?;
        let report = self.hub.broadcast(Snapshot::from(items)).await;
        debug!(
            revision = report.revision,
            delivered = report.delivered,
            "snapshot published"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::websocket::events::ServerMessage;
    use crate::api::websocket::session::SessionReceiver;
    use crate::store::FileStore;

    fn setup() -> (MutationGateway, Arc<BroadcastHub>, SessionReceiver) {
        let hub = Arc::new(BroadcastHub::new());
        let (session, rx) = hub.new_session();
        hub.register(session);
        let gateway = MutationGateway::new(Arc::new(FileStore::in_memory()), hub.clone());
        (gateway, hub, rx)
    }

    fn pushed(rx: &mut SessionReceiver) -> Option<Snapshot> {
        match rx.try_recv().ok()?.as_ref() {
            ServerMessage::ReceiveTodos { todos, .. } => Some(todos.clone()),
            _ => None,
        }
    }

    /// Store whose every operation fails
    struct BrokenStore;

    impl ItemStore for BrokenStore {
        fn list_all(&self) -> TodoResult<Vec<Item>> {
            Err(TodoError::StoreUnavailable("disk gone".into()))
        }
        fn create(&self, _title: &str) -> TodoResult<Item> {
            Err(TodoError::StoreUnavailable("disk gone".into()))
        }
        fn find_by_id(&self, _id: ItemId) -> TodoResult<Option<Item>> {
            Err(TodoError::StoreUnavailable("disk gone".into()))
        }
        fn update(&self, _item: &Item) -> TodoResult<()> {
            Err(TodoError::StoreUnavailable("disk gone".into()))
        }
        fn delete(&self, _item: &Item) -> TodoResult<()> {
            Err(TodoError::StoreUnavailable("disk gone".into()))
        }
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Buy milk ").unwrap(), "Buy milk");
        assert!(matches!(normalize_title(""), Err(TodoError::ValidationFailed(_))));
        assert!(matches!(normalize_title(" \t\n"), Err(TodoError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn test_buy_milk_scenario() {
        let (gateway, hub, mut rx) = setup();

        let item = gateway.create("Buy milk").await.unwrap();
        assert_eq!(item, Item::new(1, "Buy milk"));
        assert_eq!(pushed(&mut rx).unwrap().items, vec![Item::new(1, "Buy milk")]);
        assert!(pushed(&mut rx).is_none(), "exactly one broadcast per mutation");

        gateway.update(1, true).await.unwrap();
        let snapshot = pushed(&mut rx).unwrap();
        assert!(snapshot.get(1).unwrap().is_complete);

        gateway.delete(1).await.unwrap();
        assert!(pushed(&mut rx).unwrap().is_empty());
        assert_eq!(hub.current_revision(), 3);

        let (current, revision) = gateway.snapshot().await.unwrap();
        assert!(current.is_empty());
        assert_eq!(revision, 3);
    }

    #[tokio::test]
    async fn test_blank_title_rejected_without_broadcast() {
        let (gateway, hub, mut rx) = setup();

        let result = gateway.create("   ").await;
        assert!(matches!(result, Err(TodoError::ValidationFailed(_))));
        assert!(pushed(&mut rx).is_none());
        assert_eq!(hub.current_revision(), 0);
        assert!(gateway.snapshot().await.unwrap().0.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let (gateway, hub, mut rx) = setup();

        let result = gateway.update(999, true).await;
        assert!(matches!(result, Err(TodoError::NotFound(999))));
        assert!(pushed(&mut rx).is_none());
        assert_eq!(hub.current_revision(), 0);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let (gateway, hub, mut rx) = setup();
        let item = gateway.create("once").await.unwrap();
        pushed(&mut rx).unwrap();

        gateway.delete(item.id).await.unwrap();
        pushed(&mut rx).unwrap();

        let second = gateway.delete(item.id).await;
        assert!(matches!(second, Err(TodoError::NotFound(_))));
        assert!(pushed(&mut rx).is_none());
        assert_eq!(hub.current_revision(), 2);
    }

    #[tokio::test]
    async fn test_create_trims_title() {
        let (gateway, _hub, _rx) = setup();
        let item = gateway.create("  padded  ").await.unwrap();
        assert_eq!(item.title, "padded");
    }

    #[tokio::test]
    async fn test_store_failure_propagates_without_broadcast() {
        let hub = Arc::new(BroadcastHub::new());
        let (session, mut rx) = hub.new_session();
        hub.register(session);
        let gateway = MutationGateway::new(Arc::new(BrokenStore), hub.clone());

        assert!(matches!(
            gateway.create("x").await,
            Err(TodoError::StoreUnavailable(_))
        ));
        assert!(matches!(
            gateway.update(1, true).await,
            Err(TodoError::StoreUnavailable(_))
        ));
        assert!(matches!(
            gateway.snapshot().await,
            Err(TodoError::StoreUnavailable(_))
        ));
        assert!(rx.try_recv().is_err());
        assert_eq!(hub.current_revision(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_serialized() {
        let hub = Arc::new(BroadcastHub::with_config(64, std::time::Duration::from_secs(2)));
        let (session, mut rx) = hub.new_session();
        hub.register(session);
        let gateway = Arc::new(MutationGateway::new(
            Arc::new(FileStore::in_memory()),
            hub.clone(),
        ));

        let n = 20;
        let handles: Vec<_> = (0..n)
            .map(|i| {
                let gateway = gateway.clone();
                tokio::spawn(async move { gateway.create(&format!("task {}", i)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let (snapshot, revision) = gateway.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), n);
        assert_eq!(revision, n as u64);
        let mut ids: Vec<_> = snapshot.iter().map(|i| i.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), n);

        // Each broadcast is a superset of the previous one
        let mut last_len = 0;
        while let Some(s) = pushed(&mut rx) {
            assert_eq!(s.len(), last_len + 1);
            last_len = s.len();
        }
        assert_eq!(last_len, n);
    }
}
