use std::error::Error;
use std::sync::Arc;

use dotenvy::dotenv;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info};

mod config;
mod handlers;
mod photos;
mod state;
mod utils;

use config::CONFIG;
use handlers::{commands, prediction};
use photos::UnsplashClient;
use state::AppState;
use utils::logging::init_logging;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    Start,
}

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

#[tokio::main]
async fn main() -> HandlerResult {
    dotenv().ok();
    let _guards = init_logging(&CONFIG);

    if let Err(err) = CONFIG.validate() {
        error!("Refusing to start: {err}");
        return Err(err.into());
    }

    let bot = Bot::new(CONFIG.bot_token.clone());
    let provider = Arc::new(UnsplashClient::from_config(&CONFIG));
    let state = AppState::new(&CONFIG, provider);
    info!(
        "Starting fortune photo bot: {} photo queries, {} per request, {} attempt(s) each, recent cache of {}",
        state.catalog.terms().len(),
        CONFIG.query_limit,
        CONFIG.attempts_per_query,
        state.resolver.recent().lock().capacity()
    );

    let command_handler = dptree::entry()
        .filter_command::<Command>()
        .endpoint(handle_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(
            dptree::filter(|msg: Message| commands::is_prediction_request(&msg))
                .endpoint(handle_prediction),
        )
        .endpoint(ignore_message);

    Dispatcher::builder(bot, message_handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(bot: Bot, message: Message, command: Command) -> HandlerResult {
    match command {
        Command::Start => commands::start_handler(bot, message).await?,
    }
    Ok(())
}

async fn handle_prediction(bot: Bot, state: AppState, message: Message) -> HandlerResult {
    tokio::spawn(async move {
        if let Err(err) = prediction::prediction_handler(bot, state, message).await {
            error!("prediction handler failed: {err}");
        }
    });
    Ok(())
}

async fn ignore_message(_message: Message) -> HandlerResult {
    Ok(())
}
