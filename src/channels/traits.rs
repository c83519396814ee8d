use crate::profile::SubscriberId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Transport-assigned id of a sent message, needed to edit or delete it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHandle(pub i64);

/// One tappable button carrying opaque callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Rows of inline buttons attached to a menu message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn push_row(&mut self, row: Vec<InlineButton>) {
        if !row.is_empty() {
            self.rows.push(row);
        }
    }

    /// Callback data of every button, row by row.
    pub fn callback_data(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(|b| b.data.as_str())
    }
}

/// Inbound user interaction received from a chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Slash command, without the leading `/` or `@botname` suffix.
    Command {
        from: SubscriberId,
        chat: SubscriberId,
        command: String,
    },
    /// Button press on a menu message.
    Callback {
        id: String,
        from: SubscriberId,
        chat: SubscriberId,
        message: MessageHandle,
        data: String,
    },
}

/// Narrow outbound contract the notification core depends on.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Stable channel identifier (e.g. `telegram`).
    fn id(&self) -> &'static str;

    /// Send a plain text message and return its handle.
    async fn send(&self, to: SubscriberId, text: &str) -> anyhow::Result<MessageHandle>;

    /// Delete a previously sent message.
    async fn delete(&self, to: SubscriberId, handle: MessageHandle) -> anyhow::Result<()>;
}

/// Menu-capable channel used by the interactive bot front-end.
#[async_trait]
pub trait InteractiveChannel: ChatTransport {
    /// Send a message with an inline keyboard.
    async fn send_menu(
        &self,
        to: SubscriberId,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> anyhow::Result<MessageHandle>;

    /// Replace text and keyboard of an existing message.
    async fn edit_menu(
        &self,
        to: SubscriberId,
        handle: MessageHandle,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> anyhow::Result<()>;

    /// Acknowledge a button press so the client stops its spinner.
    async fn acknowledge(&self, callback_id: &str) -> anyhow::Result<()>;

    /// Receive inbound events and forward them until an error occurs.
    async fn run(&self, inbound_tx: mpsc::Sender<InboundEvent>) -> anyhow::Result<()>;
}
