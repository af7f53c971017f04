use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::core::{Notification, TodoError};
use crate::storage::TodoStore;
use crate::views;

pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// The set of currently open push connections.
///
/// Each connection owns the receiving half of an unbounded channel, so a
/// push never waits on a slow client. A client that is gone when a push
/// happens simply misses it.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<Uuid, mpsc::UnboundedSender<Notification>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect(&self) -> (Uuid, NotificationReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.connections.write().await.insert(id, tx);
        (id, rx)
    }

    pub async fn disconnect(&self, id: Uuid) {
        self.connections.write().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Sends to every member; returns how many accepted the message.
    pub async fn push(&self, notification: Notification) -> usize {
        let connections = self.connections.read().await;
        let mut delivered = 0;
        for (id, tx) in connections.iter() {
            if tx.send(notification.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(connection = %id, "Dropped push to closed connection");
            }
        }
        delivered
    }
}

/// Re-renders changed fragments and fans them out to the registry.
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    store: Arc<dyn TodoStore>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, store: Arc<dyn TodoStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub async fn notify_list_changed(&self) -> Result<(), TodoError> {
        let todos = self.store.list_all().await?;
        let html = views::render_list_fragment(&todos);
        let delivered = self.registry.push(Notification::TodoList { html }).await;
        tracing::debug!(delivered, "Pushed todo list");
        Ok(())
    }

    pub async fn notify_detail_changed(&self, id: i64) -> Result<(), TodoError> {
        let Some(todo) = self.store.get_by_id(id).await? else {
            // deleted in between; the removal push covers it
            tracing::debug!(id, "Skipping detail push for missing todo");
            return Ok(());
        };
        let html = views::render_detail_fragment(&todo);
        let delivered = self.registry.push(Notification::TodoDetail { id, html }).await;
        tracing::debug!(id, delivered, "Pushed todo detail");
        Ok(())
    }

    pub async fn notify_removed(&self, id: i64) -> Result<(), TodoError> {
        let delivered = self.registry.push(Notification::TodoDeleted { id }).await;
        tracing::debug!(id, delivered, "Pushed todo removal");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteTodoStore;

    #[tokio::test]
    async fn push_reaches_every_member() {
        let registry = ConnectionRegistry::new();
        let (_, mut first) = registry.connect().await;
        let (_, mut second) = registry.connect().await;

        let delivered = registry.push(Notification::TodoDeleted { id: 1 }).await;
        assert_eq!(delivered, 2);
        assert_eq!(first.recv().await, Some(Notification::TodoDeleted { id: 1 }));
        assert_eq!(second.recv().await, Some(Notification::TodoDeleted { id: 1 }));
    }

    #[tokio::test]
    async fn disconnected_members_miss_pushes() {
        let registry = ConnectionRegistry::new();
        let (gone, mut gone_rx) = registry.connect().await;
        let (_, mut stays) = registry.connect().await;
        registry.disconnect(gone).await;
        assert_eq!(registry.len().await, 1);

        registry.push(Notification::TodoDeleted { id: 2 }).await;
        assert_eq!(stays.recv().await, Some(Notification::TodoDeleted { id: 2 }));
        // sender was dropped with the registry entry
        assert_eq!(gone_rx.recv().await, None);
    }

    #[tokio::test]
    async fn dropped_receiver_is_not_counted() {
        let registry = ConnectionRegistry::new();
        let (_, rx) = registry.connect().await;
        drop(rx);
        assert_eq!(registry.push(Notification::TodoDeleted { id: 3 }).await, 0);
    }

    #[tokio::test]
    async fn broadcaster_renders_current_state() -> anyhow::Result<()> {
        let store = Arc::new(SqliteTodoStore::in_memory().await?);
        let todo = store.insert("Moje todo").await?;
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Broadcaster::new(registry.clone(), store.clone());
        let (_, mut rx) = registry.connect().await;

        broadcaster.notify_list_changed().await?;
        broadcaster.notify_detail_changed(todo.id).await?;
        broadcaster.notify_removed(todo.id).await?;

        match rx.recv().await {
            Some(Notification::TodoList { html }) => assert!(html.contains("Moje todo")),
            other => panic!("expected list push, got {other:?}"),
        }
        match rx.recv().await {
            Some(Notification::TodoDetail { id, html }) => {
                assert_eq!(id, todo.id);
                assert!(html.contains("<h1>Moje todo</h1>"));
            }
            other => panic!("expected detail push, got {other:?}"),
        }
        assert_eq!(rx.recv().await, Some(Notification::TodoDeleted { id: todo.id }));
        Ok(())
    }

    #[tokio::test]
    async fn detail_push_for_missing_todo_is_skipped() -> anyhow::Result<()> {
        let store = Arc::new(SqliteTodoStore::in_memory().await?);
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Broadcaster::new(registry.clone(), store);
        let (_, mut rx) = registry.connect().await;

        broadcaster.notify_detail_changed(42).await?;
        assert!(rx.try_recv().is_err());
        Ok(())
    }
}
