//! Telegram update handlers.
//!
//! Each handler validates input, consults the core (policy, stores,
//! resolver) and renders replies through the messaging port. Every failure
//! degrades to a user-visible message; nothing here is fatal.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use crate::router::AppState;

mod callback;
mod commands;
mod text;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    callback::handle_callback(q, state).await
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.from().is_none() {
        return Ok(());
    }

    // Only text matters to this bot; media and the rest are ignored.
    let Some(raw) = msg.text() else {
        return Ok(());
    };

    if raw.trim_start().starts_with('/') {
        return commands::handle_command(msg, state).await;
    }

    text::handle_link(msg, state).await
}
