/// Inline keyboard (buttons) attached to an outgoing message.
#[derive(Clone, Debug)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    pub fn new(buttons: Vec<InlineButton>) -> Self {
        Self { buttons }
    }

    /// Convenience for the common one-button prompt.
    pub fn single(label: &str, callback_data: &str) -> Self {
        Self::new(vec![InlineButton {
            label: label.to_string(),
            callback_data: callback_data.to_string(),
        }])
    }
}
