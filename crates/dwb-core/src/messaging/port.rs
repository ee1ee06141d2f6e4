use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::InlineKeyboard,
    Result,
};

/// Cross-messenger port.
///
/// Telegram is the first implementation; the shape is the outbound surface
/// the core needs — plain replies, an inline-keyboard prompt, a video send
/// by URL (the caller supplies the text fallback), and the photo-with-
/// caption purchase prompt.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    async fn send_text_with_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    /// Ask the platform to deliver a playable video from a remote URL.
    /// Fails if the platform refuses the URL; callers degrade to text.
    async fn send_video_url(&self, chat_id: ChatId, url: &str) -> Result<MessageRef>;

    /// Send a local image file with an HTML caption.
    async fn send_photo_file(
        &self,
        chat_id: ChatId,
        path: &Path,
        caption_html: &str,
    ) -> Result<MessageRef>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
