use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::Message;

use dwb_core::{
    domain::{ChatId, UserId},
    messaging::types::InlineKeyboard,
    policy::{AccessDecision, DenyReason},
};

use crate::router::AppState;

const RATE_LIMITED: &str = "⚠️ Free users can only convert 1 video every 24 hours.\n\n\
Upgrade to premium for unlimited access.";

/// The link flow: marker check, access check, resolve, reply, record.
///
/// Usage is recorded only after a successful resolution and only for
/// non-premium users; the per-user lock keeps the whole sequence atomic
/// with respect to other messages from the same user.
pub async fn handle_link(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text().map(|s| s.trim().to_string()) else {
        return Ok(());
    };

    let user_id = user.id.0 as i64;
    let chat_id = ChatId(msg.chat.id.0);

    // Case-sensitive marker match on the raw message text.
    if !text.contains(&state.cfg.host_marker) {
        let _ = state
            .messenger
            .send_text(chat_id, "❌ Please send a valid Diskwala link.")
            .await;
        return Ok(());
    }

    let _guard = state.user_locks.lock_user(user_id).await;

    let premium = match state.policy.check_access(UserId(user_id)) {
        AccessDecision::Allowed { premium } => premium,
        AccessDecision::Denied(DenyReason::RateLimited) => {
            let _ = state
                .messenger
                .send_text_with_keyboard(
                    chat_id,
                    RATE_LIMITED,
                    InlineKeyboard::single("💎 Buy Premium", "buy_premium"),
                )
                .await;
            return Ok(());
        }
        AccessDecision::Denied(DenyReason::StoreUnavailable) => {
            let _ = state
                .messenger
                .send_text(chat_id, "⚠️ Temporary storage problem. Please try again later.")
                .await;
            return Ok(());
        }
    };

    let _ = state
        .messenger
        .send_text(chat_id, "🔄 Processing your link...")
        .await;

    match state.resolver.resolve_direct_link(&text).await {
        Some(direct) => {
            // Try a playable video first; fall back to the plain URL.
            if state.messenger.send_video_url(chat_id, &direct).await.is_err() {
                let _ = state
                    .messenger
                    .send_text(chat_id, &format!("✅ Direct link: {direct}"))
                    .await;
            }

            if !premium {
                if let Err(e) = state.usage.record_usage(UserId(user_id)) {
                    tracing::warn!("recording usage for {user_id} failed: {e}");
                }
            }
        }
        None => {
            let _ = state
                .messenger
                .send_text(chat_id, "❌ Failed to extract video from link.")
                .await;
        }
    }

    Ok(())
}
