use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tokio::task::JoinHandle;
use tracing::warn;

// Telegram clears a chat action after roughly five seconds.
const CHAT_ACTION_REFRESH: Duration = Duration::from_secs(4);

/// Keeps a chat action visible until dropped.
pub struct ChatActionGuard {
    task: JoinHandle<()>,
}

impl Drop for ChatActionGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn keep_chat_action(bot: Bot, chat_id: ChatId, action: ChatAction) -> ChatActionGuard {
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CHAT_ACTION_REFRESH);
        loop {
            ticker.tick().await;
            if let Err(err) = bot.send_chat_action(chat_id, action.clone()).await {
                warn!("send_chat_action failed for chat {}: {err}", chat_id);
                break;
            }
        }
    });
    ChatActionGuard { task }
}
