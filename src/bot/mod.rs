//! Interactive bot front-end.
//!
//! Translates slash commands and button presses into [`StockNotifier`]
//! operations and renders the resulting menus. Each inbound event is handled
//! on its own task so one slow user never holds up another.

pub mod actions;
pub mod menus;

pub use actions::BotAction;

use crate::channels::{InboundEvent, InlineKeyboard, InteractiveChannel, MessageHandle};
use crate::error::{Result, StockError};
use crate::notifier::StockNotifier;
use crate::profile::SubscriberId;
use crate::scheduler::is_cycle_boundary;
use crate::stock::Category;
use chrono::{Timelike, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bounded queue between the channel poller and the event handlers.
const INBOUND_QUEUE_SIZE: usize = 64;

/// What the bot shows in response to an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotReply {
    Text(String),
    Menu {
        text: String,
        keyboard: InlineKeyboard,
    },
    Nothing,
}

impl BotReply {
    fn menu(text: impl Into<String>, keyboard: InlineKeyboard) -> Self {
        Self::Menu {
            text: text.into(),
            keyboard,
        }
    }
}

/// Executes bot actions against the notifier.
pub struct BotHandler {
    notifier: Arc<StockNotifier>,
    cycle_minutes: u32,
}

impl BotHandler {
    pub fn new(notifier: Arc<StockNotifier>, cycle_minutes: u32) -> Self {
        Self {
            notifier,
            cycle_minutes,
        }
    }

    /// Perform `action` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// [`StockError::InvalidItem`] for a toggle outside the catalog,
    /// [`StockError::Persistence`] when a preference change cannot be saved.
    pub async fn handle(&self, caller: SubscriberId, action: BotAction) -> Result<BotReply> {
        match action {
            BotAction::Start => {
                self.notifier.profile(caller)?;
                Ok(BotReply::Text(menus::WELCOME_TEXT.to_owned()))
            }
            BotAction::Menu | BotAction::MainMenu => self.main_menu(caller),
            BotAction::SaveStock => Ok(BotReply::Text(self.save_stock(caller).await)),
            BotAction::ViewStock => match self.notifier.current_stock() {
                Some(snapshot) => {
                    let minute = Utc::now().minute();
                    let refreshing = is_cycle_boundary(minute, 0, self.cycle_minutes, 1);
                    let (text, keyboard) = menus::stock_view(&snapshot, refreshing);
                    Ok(BotReply::menu(text, keyboard))
                }
                None => {
                    let profile = self.notifier.profile(caller)?;
                    Ok(BotReply::menu(menus::LOADING_TEXT, menus::main_menu(&profile)))
                }
            },
            BotAction::ConfigTracking => self.tracking_menu(caller, Category::Seeds),
            BotAction::ShowCategory(category) => self.tracking_menu(caller, category),
            BotAction::Track { category, item } => {
                let tracked = self.notifier.toggle_tracked(caller, category, &item)?;
                debug!(subscriber = %caller, %category, %item, tracked, "tracking toggled");
                self.tracking_menu(caller, category)
            }
            BotAction::ToggleTracking => {
                let enabled = self.notifier.toggle_enabled(caller).await?;
                info!(subscriber = %caller, enabled, "tracking switched");
                self.main_menu(caller)
            }
            BotAction::Noop => Ok(BotReply::Nothing),
        }
    }

    fn main_menu(&self, caller: SubscriberId) -> Result<BotReply> {
        let profile = self.notifier.profile(caller)?;
        Ok(BotReply::menu(menus::MENU_TEXT, menus::main_menu(&profile)))
    }

    fn tracking_menu(&self, caller: SubscriberId, category: Category) -> Result<BotReply> {
        let profile = self.notifier.profile(caller)?;
        Ok(BotReply::menu(
            menus::TRACKING_TEXT,
            menus::tracking_menu(&profile, category),
        ))
    }

    async fn save_stock(&self, caller: SubscriberId) -> String {
        match self.notifier.force_save_stock(caller).await {
            Ok(snapshot) => format!(
                "✅ Stock saved successfully!\nTimestamp: {}",
                snapshot.timestamp
            ),
            Err(StockError::AccessDenied(_)) => menus::ACCESS_DENIED_TEXT.to_owned(),
            Err(e) => format!("❌ Error: {e}"),
        }
    }
}

/// Runs the channel poller and dispatches inbound events to [`BotHandler`].
pub struct BotRuntime {
    channel: Arc<dyn InteractiveChannel>,
    handler: Arc<BotHandler>,
    cancel: CancellationToken,
}

impl BotRuntime {
    pub fn new(
        channel: Arc<dyn InteractiveChannel>,
        handler: BotHandler,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            channel,
            handler: Arc::new(handler),
            cancel,
        }
    }

    /// Start polling and handling events until cancelled.
    pub fn run(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let (inbound_tx, mut inbound_rx) = mpsc::channel::<InboundEvent>(INBOUND_QUEUE_SIZE);

            let poller = {
                let channel = Arc::clone(&self.channel);
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    let mut backoff_secs = 2u64;
                    loop {
                        let result = tokio::select! {
                            biased;
                            () = cancel.cancelled() => return,
                            result = channel.run(inbound_tx.clone()) => result,
                        };
                        match result {
                            Ok(()) => warn!("channel {} stopped; restarting", channel.id()),
                            Err(err) => warn!(
                                "channel {} failed: {err}; retrying in {backoff_secs}s",
                                channel.id()
                            ),
                        }
                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => return,
                            () = tokio::time::sleep(Duration::from_secs(backoff_secs)) => {}
                        }
                        backoff_secs = backoff_secs.saturating_mul(2).min(60);
                    }
                })
            };

            info!("bot started on {}", self.channel.id());
            loop {
                let event = tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => break,
                    event = inbound_rx.recv() => event,
                };
                let Some(event) = event else {
                    break;
                };
                let channel = Arc::clone(&self.channel);
                let handler = Arc::clone(&self.handler);
                tokio::spawn(async move {
                    process_event(channel.as_ref(), &handler, event).await;
                });
            }

            poller.abort();
            info!("bot stopped");
        })
    }
}

/// Handle one inbound event and deliver the reply.
pub async fn process_event(
    channel: &dyn InteractiveChannel,
    handler: &BotHandler,
    event: InboundEvent,
) {
    match event {
        InboundEvent::Command {
            from,
            chat,
            command,
        } => {
            let Some(action) = BotAction::from_command(&command) else {
                debug!(subscriber = %from, %command, "ignoring unknown command");
                return;
            };
            let reply = handler.handle(from, action).await.unwrap_or_else(|e| {
                warn!(subscriber = %from, "command /{command} failed: {e}");
                failure_reply(&e)
            });
            send_reply(channel, chat, reply).await;
        }
        InboundEvent::Callback {
            id,
            from,
            chat,
            message,
            data,
        } => {
            if let Err(e) = channel.acknowledge(&id).await {
                debug!("cannot acknowledge callback {id}: {e}");
            }
            let Some(action) = BotAction::from_callback(&data) else {
                debug!(subscriber = %from, %data, "ignoring unknown callback");
                return;
            };
            let reply = handler.handle(from, action).await.unwrap_or_else(|e| {
                warn!(subscriber = %from, "callback {data} failed: {e}");
                failure_reply(&e)
            });
            edit_reply(channel, chat, message, reply).await;
        }
    }
}

/// Short text telling the user their action did not go through.
fn failure_reply(error: &StockError) -> BotReply {
    BotReply::Text(format!("❌ Error: {error}"))
}

async fn send_reply(channel: &dyn InteractiveChannel, chat: SubscriberId, reply: BotReply) {
    let result = match reply {
        BotReply::Text(text) => channel.send(chat, &text).await.map(drop),
        BotReply::Menu { text, keyboard } => {
            channel.send_menu(chat, &text, &keyboard).await.map(drop)
        }
        BotReply::Nothing => Ok(()),
    };
    if let Err(e) = result {
        warn!(chat = %chat, "failed to send reply: {e}");
    }
}

async fn edit_reply(
    channel: &dyn InteractiveChannel,
    chat: SubscriberId,
    message: MessageHandle,
    reply: BotReply,
) {
    let result = match reply {
        BotReply::Menu { text, keyboard } => {
            channel.edit_menu(chat, message, &text, &keyboard).await
        }
        BotReply::Text(text) => channel.send(chat, &text).await.map(drop),
        BotReply::Nothing => Ok(()),
    };
    if let Err(e) = result {
        warn!(chat = %chat, "failed to update menu: {e}");
    }
}
