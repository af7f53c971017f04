use serde::{Deserialize, Serialize};

/// Server-initiated push sent to every live connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    TodoList { html: String },
    TodoDetail { id: i64, html: String },
    TodoDeleted { id: i64 },
}

impl Notification {
    pub fn todo_id(&self) -> Option<i64> {
        match self {
            Self::TodoList { .. } => None,
            Self::TodoDetail { id, .. } | Self::TodoDeleted { id } => Some(*id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub notification: Notification,
    pub sent_at: i64, // unix seconds
}
