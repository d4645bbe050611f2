use anyhow::Context;
use argh::FromArgs;
use log::*;
use mobot::*;
use rand::seq::SliceRandom;

mod app;
mod handlers;
mod hangman;

#[cfg(test)]
mod app_test;

use crate::app::App;
use crate::handlers::handle_chat_event;
use crate::hangman::{Game, DEFAULT_GUESSES_ALLOWED};

#[derive(FromArgs)]
/// Hangman for Telegram: guess the word one letter at a time.
struct Args {
    /// file containing secret words for the bot, one per line
    #[argh(option, short = 'w', default = "String::from(\"words.txt\")")]
    words: String,

    /// directory to save per-user game state in, disabled if empty
    #[argh(option, short = 's', default = "String::new()")]
    save_dir: String,

    /// number of wrong guesses allowed per round
    #[argh(option, short = 'g', default = "DEFAULT_GUESSES_ALLOWED")]
    guesses: u32,

    /// name of the game shown to players
    #[argh(option, short = 'n', default = "String::from(\"Hangman\")")]
    name: String,

    /// telegram username allowed to receive admin logs
    #[argh(option, short = 'a')]
    admin: Option<String>,
}

// read_words reads a file containing one word per line, and returns a vector of
// uppercase words. It filters out empty lines, lines that start with a '#', and
// words that can't be played.
fn read_words(path: impl AsRef<str>) -> anyhow::Result<Vec<String>> {
    let path = path.as_ref();
    let words = std::fs::read_to_string(path)
        .context(format!("Error reading words from {}", path))?
        .lines()
        .map(str::trim)
        .filter(|s| !s.starts_with('#'))
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .filter(|w| match Game::new(w.as_str()).validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("Skipping word {}: {}", w, e);
                false
            }
        })
        .collect::<Vec<_>>();

    if words.is_empty() {
        anyhow::bail!("No playable words in {}", path);
    }
    Ok(words)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mobot::init_logger();
    let args: Args = argh::from_env();

    if args.guesses == 0 {
        anyhow::bail!("--guesses must be at least 1");
    }

    let mut words = read_words(&args.words)?;
    words.shuffle(&mut rand::thread_rng());
    info!("Loaded {} words from {}", words.len(), args.words);

    if !args.save_dir.is_empty() {
        std::fs::create_dir_all(&args.save_dir)
            .context(format!("Error creating save directory {}", args.save_dir))?;
    }

    let mut app = App::new(args.name, words);
    app.set_save_dir(args.save_dir);
    app.set_guesses_allowed(args.guesses);
    app.set_admin_user(args.admin);

    let token = std::env::var("TELEGRAM_TOKEN").context("TELEGRAM_TOKEN is not set")?;
    let client = Client::new(token.into());

    info!("Starting bot...");
    let mut router = Router::new(client).with_state(app);
    router.add_route(Route::Message(Matcher::Any), handle_chat_event);
    router.start().await;
    Ok(())
}
