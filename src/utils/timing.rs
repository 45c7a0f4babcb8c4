use std::future::Future;
use std::time::Instant;

use chrono::{DateTime, Utc};
use teloxide::types::Message;
use tracing::info;

#[derive(Debug)]
pub struct CommandTimer {
    command: String,
    chat_id: i64,
    user_id: Option<u64>,
    username: Option<String>,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

impl CommandTimer {
    pub fn from_message(command: &str, message: &Message) -> Self {
        let user = message.from.as_ref();
        CommandTimer {
            command: command.to_string(),
            chat_id: message.chat.id.0,
            user_id: user.map(|u| u.id.0),
            username: user.and_then(|u| u.username.clone()),
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        }
    }

    pub fn log_received(&self) {
        info!(
            target: "bot.timing",
            "event=command_received command={} chat_id={} user_id={:?} username={:?} received_at={}",
            self.command,
            self.chat_id,
            self.user_id,
            self.username,
            self.started_at.to_rfc3339()
        );
    }

    pub fn complete(&mut self, status: &str, detail: Option<String>) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.status = status.to_string();
        self.detail = detail;
        info!(
            target: "bot.timing",
            "event=command_completed command={} chat_id={} user_id={:?} started_at={} completed_at={} duration_s={:.3} status={} detail={}",
            self.command,
            self.chat_id,
            self.user_id,
            self.started_at.to_rfc3339(),
            Utc::now().to_rfc3339(),
            self.started_perf.elapsed().as_secs_f64(),
            self.status,
            self.detail.as_deref().unwrap_or_default()
        );
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        if !self.completed {
            self.complete("aborted", None);
        }
    }
}

pub fn start_command_timer(command: &str, message: &Message) -> CommandTimer {
    let timer = CommandTimer::from_message(command, message);
    timer.log_received();
    timer
}

pub async fn log_provider_timing<T, E, F, Fut>(
    provider: &str,
    query: &str,
    attempt: usize,
    call: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let started_perf = Instant::now();
    info!(
        target: "bot.timing",
        "event=provider_request provider={} query={:?} attempt={} started_at={}",
        provider,
        query,
        attempt,
        Utc::now().to_rfc3339()
    );

    let result = call().await;
    let status = match &result {
        Ok(_) => "success".to_string(),
        Err(err) => format!("error: {err}"),
    };

    info!(
        target: "bot.timing",
        "event=provider_response provider={} query={:?} attempt={} duration_s={:.3} status={}",
        provider,
        query,
        attempt,
        started_perf.elapsed().as_secs_f64(),
        status
    );

    result
}
