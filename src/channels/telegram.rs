use crate::channels::traits::{
    ChatTransport, InboundEvent, InlineKeyboard, InteractiveChannel, MessageHandle,
};
use crate::config::TelegramConfig;
use crate::profile::SubscriberId;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Telegram channel adapter using the Bot API (long polling + JSON methods).
pub struct TelegramAdapter {
    bot_token: String,
    api_base: String,
    poll_timeout_secs: u64,
    client: reqwest::Client,
    /// Next `getUpdates` offset; kept across `run` restarts so confirmed
    /// updates are never redelivered.
    next_offset: AtomicI64,
}

impl TelegramAdapter {
    pub fn new(config: &TelegramConfig) -> Self {
        // Long polls hold the connection for `poll_timeout_secs`; leave headroom.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            bot_token: config.bot_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            poll_timeout_secs: config.poll_timeout_secs,
            client,
            next_offset: AtomicI64::new(0),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    /// Invoke a Bot API method and return its `result` field.
    async fn call(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload: serde_json::Value = response.json().await.unwrap_or_default();
        let ok = payload
            .get("ok")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        if !status.is_success() || !ok {
            let description = payload
                .get("description")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("no description");
            anyhow::bail!("telegram {method} failed ({status}): {description}");
        }
        Ok(payload
            .get("result")
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    fn message_handle(result: &serde_json::Value) -> anyhow::Result<MessageHandle> {
        result
            .get("message_id")
            .and_then(serde_json::Value::as_i64)
            .map(MessageHandle)
            .ok_or_else(|| anyhow::anyhow!("telegram response has no message_id"))
    }

    /// Check that the token is accepted by the API.
    pub async fn health_check(&self) -> anyhow::Result<bool> {
        if self.bot_token.trim().is_empty() {
            return Ok(false);
        }
        Ok(self.call("getMe", json!({})).await.is_ok())
    }

    /// Bot API `reply_markup` for an inline keyboard.
    #[must_use]
    pub fn keyboard_json(keyboard: &InlineKeyboard) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| json!({"text": b.label, "callback_data": b.data}))
                    .collect()
            })
            .collect();
        json!({ "inline_keyboard": rows })
    }

    /// Translate one `getUpdates` entry into an inbound event.
    ///
    /// Plain text that is not a slash command is ignored.
    #[must_use]
    pub fn parse_update(update: &serde_json::Value) -> Option<InboundEvent> {
        if let Some(query) = update.get("callback_query") {
            let id = query.get("id")?.as_str()?.to_owned();
            let from = query.get("from")?.get("id")?.as_i64()?;
            let message = query.get("message")?;
            let message_id = message.get("message_id")?.as_i64()?;
            let chat = message.get("chat")?.get("id")?.as_i64()?;
            let data = query.get("data")?.as_str()?.to_owned();
            return Some(InboundEvent::Callback {
                id,
                from: SubscriberId(from),
                chat: SubscriberId(chat),
                message: MessageHandle(message_id),
                data,
            });
        }

        let message = update.get("message")?;
        let text = message.get("text")?.as_str()?.trim();
        let command = text.strip_prefix('/')?.split_whitespace().next()?;
        let command = command.split('@').next().unwrap_or(command);
        if command.is_empty() {
            return None;
        }
        let from = message.get("from")?.get("id")?.as_i64()?;
        let chat = message.get("chat")?.get("id")?.as_i64()?;
        Some(InboundEvent::Command {
            from: SubscriberId(from),
            chat: SubscriberId(chat),
            command: command.to_owned(),
        })
    }
}

#[async_trait]
impl ChatTransport for TelegramAdapter {
    fn id(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, to: SubscriberId, text: &str) -> anyhow::Result<MessageHandle> {
        let result = self
            .call("sendMessage", json!({"chat_id": to.0, "text": text}))
            .await?;
        Self::message_handle(&result)
    }

    async fn delete(&self, to: SubscriberId, handle: MessageHandle) -> anyhow::Result<()> {
        self.call(
            "deleteMessage",
            json!({"chat_id": to.0, "message_id": handle.0}),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl InteractiveChannel for TelegramAdapter {
    async fn send_menu(
        &self,
        to: SubscriberId,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> anyhow::Result<MessageHandle> {
        let result = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": to.0,
                    "text": text,
                    "reply_markup": Self::keyboard_json(keyboard),
                }),
            )
            .await?;
        Self::message_handle(&result)
    }

    async fn edit_menu(
        &self,
        to: SubscriberId,
        handle: MessageHandle,
        text: &str,
        keyboard: &InlineKeyboard,
    ) -> anyhow::Result<()> {
        self.call(
            "editMessageText",
            json!({
                "chat_id": to.0,
                "message_id": handle.0,
                "text": text,
                "reply_markup": Self::keyboard_json(keyboard),
            }),
        )
        .await?;
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> anyhow::Result<()> {
        self.call(
            "answerCallbackQuery",
            json!({"callback_query_id": callback_id}),
        )
        .await?;
        Ok(())
    }

    async fn run(&self, inbound_tx: mpsc::Sender<InboundEvent>) -> anyhow::Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("telegram bot token is empty");
        }

        loop {
            let updates = self
                .call(
                    "getUpdates",
                    json!({
                        "offset": self.next_offset.load(Ordering::SeqCst),
                        "timeout": self.poll_timeout_secs,
                        "allowed_updates": ["message", "callback_query"],
                    }),
                )
                .await?;

            let Some(updates) = updates.as_array() else {
                continue;
            };

            for update in updates {
                if let Some(update_id) = update.get("update_id").and_then(serde_json::Value::as_i64)
                {
                    self.next_offset.fetch_max(update_id + 1, Ordering::SeqCst);
                }
                let Some(event) = Self::parse_update(update) else {
                    continue;
                };
                if inbound_tx.send(event).await.is_err() {
                    anyhow::bail!("telegram inbound channel closed");
                }
            }
        }
    }
}
