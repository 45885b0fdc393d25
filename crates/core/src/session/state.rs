use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Per-(user, session) conversational state.
///
/// Invariant at flow boundaries: `current_flow`, `flow_step`, and
/// `flow_data` are set and cleared together. `start_flow`/`end_flow` are
/// the only sanctioned mutators of the three fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub user_id: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Active flow name. Kept as a raw string so corrupted or legacy values
    /// survive deserialization and can be recovered from (see the flow
    /// engine's unknown-flow handling).
    #[serde(default)]
    pub current_flow: Option<String>,
    #[serde(default)]
    pub flow_step: Option<String>,
    /// Slot name to collected value; `None` marks a slot not yet filled.
    #[serde(default)]
    pub flow_data: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub user_context: Map<String, Value>,
}

impl ConversationState {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            created_at: now,
            last_updated: now,
            messages: Vec::new(),
            current_flow: None,
            flow_step: None,
            flow_data: BTreeMap::new(),
            user_context: Map::new(),
        }
    }

    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: Map::new(),
        });
        self.touch();
    }

    /// Last `n` messages in insertion order.
    pub fn recent_messages(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn is_in_flow(&self) -> bool {
        self.current_flow.is_some()
    }

    pub(crate) fn begin_flow(
        &mut self,
        flow_name: &str,
        step: &str,
        flow_data: BTreeMap<String, Option<String>>,
    ) {
        self.current_flow = Some(flow_name.to_owned());
        self.flow_step = Some(step.to_owned());
        self.flow_data = flow_data;
        self.touch();
    }

    /// Returns to the idle state, clearing all flow fields atomically.
    pub fn end_flow(&mut self) {
        self.current_flow = None;
        self.flow_step = None;
        self.flow_data.clear();
        self.touch();
    }

    pub(crate) fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}
