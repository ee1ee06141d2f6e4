use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::CallbackQuery;

use dwb_core::{config::Config, domain::ChatId, formatting::escape_html};

use crate::router::AppState;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let data = q.data.clone().unwrap_or_default();

    // Always answer the callback query so the button stops spinning.
    let _ = state.messenger.answer_callback_query(&q.id, None).await;

    if data != "buy_premium" {
        return Ok(());
    }

    let Some(chat_id) = q.message.as_ref().map(|m| ChatId(m.chat.id.0)) else {
        return Ok(());
    };

    let caption = plans_caption(&state.cfg);

    let sent = state
        .messenger
        .send_photo_file(chat_id, &state.cfg.qr_image_path, &caption)
        .await;

    if let Err(e) = sent {
        // Missing QR asset must not lose the plans; degrade to text.
        tracing::warn!("qr photo send failed, falling back to text: {e}");
        let _ = state.messenger.send_html(chat_id, &caption).await;
    }

    Ok(())
}

fn plans_caption(cfg: &Config) -> String {
    format!(
        "💎 <b>Premium Plans:</b>\n\n\
         • 7 Days = ₹29\n\
         • 30 Days = ₹79\n\
         • Lifetime = ₹149\n\n\
         📲 Pay via UPI: <code>{}</code>\n\
         After payment, send a screenshot to the admin to activate premium.\n\n\
         👨‍💼 {}",
        escape_html(&cfg.upi_id),
        escape_html(&cfg.admin_contact),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn cfg_with_upi(upi: &str) -> Config {
        Config {
            bot_token: "token".to_string(),
            admin_user_id: 1,
            webhook_secret: "s".to_string(),
            webhook_bind: None,
            upi_id: upi.to_string(),
            admin_contact: "@admin".to_string(),
            qr_image_path: PathBuf::from("qr.png"),
            premium_file: PathBuf::from("premium_users.json"),
            usage_file: PathBuf::from("usage_tracker.json"),
            host_marker: "diskwala".to_string(),
            fetch_timeout: Duration::from_secs(15),
            free_window_hours: 24,
        }
    }

    #[test]
    fn plans_caption_lists_plans_and_upi() {
        let caption = plans_caption(&cfg_with_upi("pay@upi"));
        assert!(caption.contains("Premium Plans"));
        assert!(caption.contains("<code>pay@upi</code>"));
        assert!(caption.contains("@admin"));
    }

    #[test]
    fn plans_caption_escapes_the_upi_id() {
        let caption = plans_caption(&cfg_with_upi("a<b>&c"));
        assert!(caption.contains("a&lt;b&gt;&amp;c"));
        assert!(!caption.contains("a<b>"));
    }
}
