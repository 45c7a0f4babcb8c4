use anyhow::{anyhow, Result};
use chrono::Local;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::handlers::access::{AccessDecision, RequesterIdentity};
use crate::photos::ResolvedImage;
use crate::state::AppState;
use crate::utils::telegram::keep_chat_action;
use crate::utils::timing::{start_command_timer, CommandTimer};

const DAILY_LIMIT_TEXT: &str =
    "✨ Сегодня судьба уже сказала своё слово.\nВозвращайся за новым предсказанием завтра 🔮";
const NOT_FOUND_TEXT: &str = "🔮 Судьба задумалась. Попробуй ещё раз чуть позже.";
const SEND_FAILED_TEXT: &str = "🔮 Не удалось отправить изображение, попробуй ещё раз.";
// Telegram counts caption length in UTF-16 code units.
const CAPTION_LIMIT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionOutcome {
    Denied,
    NotFound,
    SendFailed,
    Delivered,
}

/// Reply text (if any) and timer status for a finished prediction request.
pub fn reply_for(outcome: PredictionOutcome) -> (Option<&'static str>, &'static str) {
    match outcome {
        PredictionOutcome::Denied => (Some(DAILY_LIMIT_TEXT), "denied"),
        PredictionOutcome::NotFound => (Some(NOT_FOUND_TEXT), "not_found"),
        PredictionOutcome::SendFailed => (Some(SEND_FAILED_TEXT), "send_failed"),
        PredictionOutcome::Delivered => (None, "success"),
    }
}

fn truncate_utf16(text: &str, max_units: usize) -> String {
    let mut units = 0;
    let mut truncated = String::with_capacity(text.len());
    for ch in text.chars() {
        units += ch.len_utf16();
        if units > max_units {
            break;
        }
        truncated.push(ch);
    }
    truncated
}

pub fn build_caption(image: &ResolvedImage) -> String {
    let mut lines = Vec::new();
    if let Some(author) = &image.attribution {
        match &author.profile_url {
            Some(profile) => lines.push(format!("📷 {} — {}", author.name, profile)),
            None => lines.push(format!("📷 {}", author.name)),
        }
    }
    lines.push(format!("Тема: {}", image.query));

    truncate_utf16(&lines.join("\n"), CAPTION_LIMIT)
}

async fn send_image(bot: &Bot, chat_id: ChatId, image: &ResolvedImage) -> Result<()> {
    let url = Url::parse(&image.url)
        .map_err(|err| anyhow!("invalid photo URL {}: {err}", image.url))?;
    bot.send_photo(chat_id, InputFile::url(url))
        .caption(build_caption(image))
        .await
        .map_err(|err| anyhow!("send_photo failed: {err}"))?;
    Ok(())
}

async fn finish(
    bot: &Bot,
    chat_id: ChatId,
    timer: &mut CommandTimer,
    outcome: PredictionOutcome,
    detail: Option<String>,
) -> Result<()> {
    let (reply, status) = reply_for(outcome);
    timer.complete(status, detail);
    if let Some(text) = reply {
        bot.send_message(chat_id, text).await?;
    }
    Ok(())
}

pub async fn prediction_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let mut timer = start_command_timer("prediction", &message);
    let Some(requester) = RequesterIdentity::from_message(&message) else {
        timer.complete("ignored", Some("message without sender".to_string()));
        return Ok(());
    };
    let chat_id = message.chat.id;

    let today = Local::now().date_naive();
    if state.gate.check(&requester, today) == AccessDecision::Denied {
        info!("Daily limit reached for user {}", requester.id);
        return finish(&bot, chat_id, &mut timer, PredictionOutcome::Denied, None).await;
    }
    debug!(
        "Access granted to user {} ({} requester(s) tracked)",
        requester.id,
        state.gate.tracked_requesters()
    );

    let terms = state.pick_terms();
    let resolved = {
        let _uploading = keep_chat_action(bot.clone(), chat_id, ChatAction::UploadPhoto);
        state.resolver.resolve(&terms).await
    };

    let image = match resolved {
        Ok(image) => image,
        Err(err) => {
            warn!("No photo for user {}: {err}", requester.id);
            let detail = Some(err.to_string());
            return finish(&bot, chat_id, &mut timer, PredictionOutcome::NotFound, detail).await;
        }
    };

    if let Err(err) = send_image(&bot, chat_id, &image).await {
        error!("Failed to deliver photo {} to user {}: {err}", image.id, requester.id);
        let detail = Some(err.to_string());
        return finish(&bot, chat_id, &mut timer, PredictionOutcome::SendFailed, detail).await;
    }

    let detail = Some(format!("photo_id={} query={}", image.id, image.query));
    finish(&bot, chat_id, &mut timer, PredictionOutcome::Delivered, detail).await
}
