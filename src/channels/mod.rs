//! Chat channels used to reach subscribers.
//!
//! The notification core only sees [`ChatTransport`]; the interactive bot
//! front-end additionally needs [`InteractiveChannel`]. Telegram is the one
//! shipped adapter.

pub mod pacing;
pub mod telegram;
pub mod traits;

pub use pacing::SendPacer;
pub use telegram::TelegramAdapter;
pub use traits::{
    ChatTransport, InboundEvent, InlineButton, InlineKeyboard, InteractiveChannel, MessageHandle,
};
