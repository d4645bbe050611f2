use std::sync::Arc;

use anyhow::anyhow;
use log::*;
use mobot::api::escape_md;
use mobot::*;

use crate::app::*;
use crate::hangman;

/// render_game takes a hangman::Game and returns a MarkdownV2 board: the word with
/// hidden letters blanked, the letters still available, and the guesses left.
pub fn render_game(game: &hangman::Game) -> String {
    let word = game
        .display_word()
        .chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ");

    let available = game
        .letters_available
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "`{}`\n\nLetters left: `{}`\nGuesses left: {}",
        word,
        available,
        game.guesses_left()
    )
}

pub async fn handle_new_game(e: Event, state: State<App>) -> Result<Action, anyhow::Error> {
    let from = e.update.get_message()?.clone().from.unwrap_or_default();

    let mut app = state.get().write().await;
    if let Err(e) = app.load(&from).await {
        warn!("No saved game state: {}", e);
    }

    let first_game = if app.score(&from.id.to_string()).await.games == 0 {
        "This is your first game.".to_string()
    } else {
        format!("Your score: {}.", app.score(&from.id.to_string()).await)
    };

    let word = app.start_game().await?;
    app.inc_games(&from).await; // saves state

    info!(
        "Starting new game with {} ({}), word: {}.",
        from.first_name,
        from.username.clone().unwrap_or("unknown".into()),
        word
    );

    app.admin_log(
        Arc::clone(&e.api),
        format!(
            "{} ({}) starting a new game with word {}.",
            from.first_name,
            from.username.clone().unwrap_or_default(),
            word,
        ),
    )
    .await;

    let game = app.game.as_ref().ok_or(anyhow!("game not started"))?;
    Ok(Action::ReplyMarkdown(format!(
        "{}\n\n{}",
        escape_md(
            format!(
                "Hi {}, Welcome to {}!\n\n{}\nGuess the {}-letter word one letter at a time.",
                from.first_name,
                app.game_name,
                first_game,
                word.len()
            )
            .as_str()
        ),
        render_game(game)
    )))
}

pub async fn handle_bot_command(e: Event, state: State<App>) -> Result<Action, anyhow::Error> {
    let command = e
        .update
        .get_message()?
        .text
        .clone()
        .ok_or(anyhow!("No command"))?;

    // Commands may be addressed to the bot as /cmd@botname.
    let name = command
        .split_whitespace()
        .next()
        .and_then(|c| c.split('@').next())
        .unwrap_or_default();

    let reply = match name {
        "/help" => {
            let app = state.get().read().await;
            format!(
                "Welcome to {}! Guess the secret word one letter at a time. \
Every letter that isn't in the word costs a guess, and you have {} of them.

Type /new to restart the game or /score to see your score",
                app.game_name,
                app.guesses_allowed()
            )
        }

        "/new" | "/start" => {
            return handle_new_game(e, state).await;
        }

        "/admin" => {
            let mut app = state.get().write().await;
            if app
                .auth_admin(
                    e.update
                        .from_user()?
                        .username
                        .clone()
                        .unwrap_or_default()
                        .as_str(),
                    e.update.chat_id()?,
                )
                .await
            {
                "Admin messages routed to this chat.".into()
            } else {
                "You are not an admin.".into()
            }
        }

        "/score" => {
            let from = e.update.get_message()?.clone().from.unwrap_or_default();
            let mut app = state.get().write().await;

            if let Err(e) = app.load(&from).await {
                warn!("No saved game state: {}", e);
                "You have not played any games yet.".to_string()
            } else {
                format!("Your score: {}", app.score(&from.id.to_string()).await)
            }
        }

        _ => "I don't know that command.".into(),
    };

    Ok(Action::ReplyText(reply))
}

/// handle_chat_event is the main Telegram handler for the bot.
pub async fn handle_chat_event(e: Event, state: State<App>) -> Result<Action, anyhow::Error> {
    let message = e
        .update
        .get_message()?
        .text
        .clone()
        .ok_or(anyhow!("No text in message"))?;

    if message.starts_with('/') {
        return handle_bot_command(e, state).await;
    }

    let from = e.update.get_message()?.clone().from.unwrap_or_default();

    {
        let mut state = state.get().write().await;
        if let Err(err) = state.load(&from).await {
            warn!("No saved game state: {}", err);
            state
                .admin_log(
                    Arc::clone(&e.api),
                    format!(
                        "New user: {} ({})",
                        from.first_name,
                        from.username.clone().unwrap_or_default()
                    ),
                )
                .await;
        }
    }

    // If there's no active game, start one.
    if !state.get().read().await.is_playing() {
        return handle_new_game(e, state).await;
    }

    info!(
        "{} ({}) guessed {}",
        from.first_name,
        from.username.clone().unwrap_or("unknown".into()),
        message
    );

    let turn = state
        .get()
        .write()
        .await
        .play_turn(&from, message.clone())
        .await?;

    let (mut reply, word, score) = {
        let app = state.get().read().await;
        let game = app.game.as_ref().ok_or(anyhow!("game not started"))?;
        let score = app.score(&from.id.to_string()).await;

        (render_game(game), game.word.clone(), score)
    };

    let name = escape_md(from.first_name.as_str());
    match turn {
        Move::InvalidGuess => {
            reply = format!(
                "Sorry {}, guess a single letter from A to Z\\. Try again\\.",
                name
            )
        }
        Move::AlreadyGuessed => {
            reply = format!(
                "You already guessed {}, {}\\. Try another letter\\.\n\n{}",
                escape_md(message.trim().to_uppercase().as_str()),
                name,
                reply
            )
        }
        Move::GameOver => {
            reply = "This round is over\\. Type /new to play again\\.".to_string();
        }
        Move::Hit => reply.push_str("\n\nNice one\\. Next letter\\?"),
        Move::Miss => reply.push_str("\n\nNot in the word\\. Next letter\\?"),
        Move::Won => {
            reply.push_str(
                escape_md(format!("\n\nYou won! \u{1F46F}\nYour score: {}", score).as_str())
                    .as_str(),
            );
            info!(
                "{} ({}) won with {}",
                from.first_name,
                from.clone().username.unwrap_or("unknown".into()),
                word
            );
        }
        Move::Lost => {
            reply.push_str(
                escape_md(
                    format!(
                        "\n\nYou lost! The word was {} \u{1F979}\nYour score: {}",
                        word, score
                    )
                    .as_str(),
                )
                .as_str(),
            );
            info!(
                "{} ({}) lost with {} (word: {})",
                from.first_name,
                from.clone().username.unwrap_or("unknown".into()),
                message,
                word
            );
        }
    }

    state
        .get()
        .read()
        .await
        .admin_log(
            Arc::clone(&e.api),
            format!(
                "{} ({}) guessed '{}' against '{}' {}.",
                from.first_name,
                from.username.clone().unwrap_or_default(),
                message,
                word,
                match turn {
                    Move::InvalidGuess => "which was invalid",
                    Move::AlreadyGuessed => "which was a repeat",
                    Move::GameOver => "after the round ended",
                    Move::Hit => "and hit",
                    Move::Miss => "and missed",
                    Move::Won => "and won",
                    Move::Lost => "and lost",
                }
            ),
        )
        .await;

    Ok(Action::ReplyMarkdown(reply))
}
