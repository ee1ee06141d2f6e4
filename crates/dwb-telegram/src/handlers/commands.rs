use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::Message;

use dwb_core::{
    domain::{ChatId, UserId},
    errors::Error,
    messaging::types::InlineKeyboard,
};

use crate::router::AppState;

const WELCOME: &str = "👋 Welcome! Send me a Diskwala link to get the video.\n\n\
Free users = 1 video / 24 hours.\nPremium = unlimited access!";

const ADDPREMIUM_USAGE: &str = "❌ Usage: /addpremium <user_id> <days>";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// `/addpremium <user_id> <days>` — both integers, days must be positive.
fn parse_grant_args(args: &str) -> Option<(i64, i64)> {
    let mut it = args.split_whitespace();
    let target = it.next()?.parse::<i64>().ok()?;
    let days = it.next()?.parse::<i64>().ok()?;
    if it.next().is_some() {
        return None;
    }
    Some((target, days))
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let (cmd, args) = parse_command(text);
    let chat_id = ChatId(msg.chat.id.0);

    match cmd.as_str() {
        "start" => {
            let _ = state
                .messenger
                .send_text_with_keyboard(
                    chat_id,
                    WELCOME,
                    InlineKeyboard::single("💎 Buy Premium", "buy_premium"),
                )
                .await;
        }
        "addpremium" => {
            let user_id = msg.from().map(|u| u.id.0 as i64).unwrap_or_default();
            add_premium(user_id, chat_id, &args, &state).await;
        }
        // Unknown commands are ignored.
        _ => {}
    }

    Ok(())
}

async fn add_premium(user_id: i64, chat_id: ChatId, args: &str, state: &AppState) {
    if user_id != state.cfg.admin_user_id {
        let _ = state.messenger.send_text(chat_id, "❌ Unauthorized.").await;
        return;
    }

    let Some((target, days)) = parse_grant_args(args) else {
        let _ = state.messenger.send_text(chat_id, ADDPREMIUM_USAGE).await;
        return;
    };

    match state.entitlements.grant_premium(UserId(target), days) {
        Ok(expiry) => {
            tracing::info!("premium granted to {target} for {days} days (until {expiry})");
            let _ = state
                .messenger
                .send_text(
                    chat_id,
                    &format!("✅ User {target} upgraded for {days} days."),
                )
                .await;
        }
        Err(Error::Validation(_)) => {
            let _ = state.messenger.send_text(chat_id, ADDPREMIUM_USAGE).await;
        }
        Err(e) => {
            tracing::warn!("premium grant for {target} failed: {e}");
            let _ = state
                .messenger
                .send_text(chat_id, "⚠️ Could not update premium storage. Try again later.")
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_parsing_strips_slash_and_bot_suffix() {
        assert_eq!(
            parse_command("/addpremium@DiskwalaBot 42 7"),
            ("addpremium".to_string(), "42 7".to_string())
        );
        assert_eq!(parse_command("/start"), ("start".to_string(), String::new()));
        assert_eq!(
            parse_command("  /START  "),
            ("start".to_string(), String::new())
        );
    }

    #[test]
    fn grant_args_need_exactly_two_integers() {
        assert_eq!(parse_grant_args("42 7"), Some((42, 7)));
        assert_eq!(parse_grant_args("  42   7  "), Some((42, 7)));
        assert_eq!(parse_grant_args("42"), None);
        assert_eq!(parse_grant_args(""), None);
        assert_eq!(parse_grant_args("forty two"), None);
        assert_eq!(parse_grant_args("42 7 extra"), None);
        // Negative days parse here; the store rejects them.
        assert_eq!(parse_grant_args("42 -7"), Some((42, -7)));
    }
}
