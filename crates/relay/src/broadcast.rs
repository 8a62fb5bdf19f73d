use serde::Serialize;
use serde_json::Value;

use crate::book::MacroEntry;
use crate::payload::{GmContext, RelayPayload};
use crate::{RelayError, CHANNEL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub active: bool,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, active: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active,
        }
    }
}

/// A payload ready to be emitted on [`CHANNEL`] together with its recipients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Broadcast {
    pub channel: &'static str,
    pub payload: RelayPayload,
    pub recipients: Vec<String>,
}

impl Broadcast {
    /// Addresses `entry` to every active user, the sender included.
    pub fn for_active_users(users: &[User], entry: &MacroEntry, args: &[Value]) -> Self {
        let active: Vec<&User> = users.iter().filter(|user| user.active).collect();
        let names: Vec<&str> = active.iter().map(|user| user.name.as_str()).collect();
        tracing::info!(macro_name = %entry.name, recipients = ?names, "sending macro");
        Self {
            channel: CHANNEL,
            payload: RelayPayload::execute_macro(&entry.id, GmContext::from_args(args)),
            recipients: active.iter().map(|user| user.id.clone()).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }
}
