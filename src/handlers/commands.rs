use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup};

pub const PREDICTION_BUTTON_LABEL: &str = "🔮 Получить предсказание";

const GREETING_TEXT: &str = "🔮 Хочешь узнать, что приготовила судьба?\nНажми кнопку ниже.";

pub fn prediction_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(PREDICTION_BUTTON_LABEL)]])
        .resize_keyboard()
}

pub fn is_prediction_request(message: &Message) -> bool {
    message
        .text()
        .map(|text| text.trim() == PREDICTION_BUTTON_LABEL)
        .unwrap_or(false)
}

pub async fn start_handler(bot: Bot, message: Message) -> Result<()> {
    bot.send_message(message.chat.id, GREETING_TEXT)
        .reply_markup(prediction_keyboard())
        .await?;
    Ok(())
}
