/// App is the main bot application and handler. It implements the outer game logic, keeping
/// track of the round per chat, scores, and persistence.
use anyhow::{anyhow, bail, Context, Result};
use log::*;
use mobot::{api::User, *};
use rand::seq::SliceRandom;
use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    sync::Arc,
};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
    sync::RwLock,
};

use serde::{Deserialize, Serialize};

use crate::hangman::{Game, Outcome, DEFAULT_GUESSES_ALLOWED};

/// Move is the result of a player's message during a round.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Move {
    Hit,
    Miss,
    Won,
    Lost,
    InvalidGuess,
    AlreadyGuessed,
    GameOver,
}

/// Score represents a user's score.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct Score {
    pub games: u32,
    pub wins: u32,
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pct = if self.games == 0 {
            0.0
        } else {
            self.wins as f32 / self.games as f32 * 100.0
        };
        write!(f, "{:.0}% ({}/{})", pct, self.wins, self.games)
    }
}

/// SaveData represents the data that is saved for each user on disk. Data
/// is saved in JSON format.
#[derive(Serialize, Deserialize)]
struct SaveData {
    user_id: String,
    #[serde(default)]
    user_handle: String,
    #[serde(default)]
    user_first_name: String,
    #[serde(default)]
    user_last_name: String,
    #[serde(default)]
    won_words: Vec<String>,
    #[serde(default)]
    played_words: Vec<String>,
    score: Score,
    last_game: Option<Game>,
}

/// App represents the bot state for the hangman bot.
#[derive(Clone, Default, BotState)]
pub struct App {
    // App global
    pub game_name: String,
    pub admin_user: Option<String>,
    admin_chat_id: Arc<RwLock<Option<i64>>>,
    save_dir: String,
    guesses_allowed: u32,
    scores: Arc<RwLock<HashMap<String, Score>>>,
    words: Arc<Vec<String>>,

    // Per chat ID
    pub game: Option<Game>,
    played_words: HashSet<String>,
    won_words: HashSet<String>,
}

impl App {
    /// Creates a new App instance.
    pub fn new(game_name: String, words: Vec<String>) -> App {
        App {
            game_name,
            guesses_allowed: DEFAULT_GUESSES_ALLOWED,
            words: Arc::new(words),
            ..Default::default()
        }
    }

    pub fn is_playing(&self) -> bool {
        match self.game.as_ref() {
            Some(game) => !game.is_game_over,
            None => false,
        }
    }

    /// Starts a new round with the first word this chat hasn't played, or a random
    /// one if every word has been played. Returns the secret word.
    pub async fn start_game(&mut self) -> Result<String> {
        let word = self
            .words
            .iter()
            .find(|&w| !self.played_words.contains(&w.to_ascii_uppercase()))
            .or_else(|| self.words.choose(&mut rand::thread_rng()))
            .ok_or(anyhow!("no words found"))?
            .to_uppercase();

        let game = Game::new(word.clone()).with_guesses_allowed(self.guesses_allowed);
        game.validate().context(format!("Invalid secret word {}", word))?;
        if game.is_game_over {
            bail!("round for {} is over before the first guess", word);
        }

        self.game = Some(game);
        self.played_words.insert(word.clone());
        Ok(word)
    }

    /// Authorizes the user as an admin.
    pub async fn auth_admin(&mut self, username: &str, chat_id: i64) -> bool {
        if self.admin_user.as_deref() == Some(username) {
            *self.admin_chat_id.write().await = Some(chat_id);
            return true;
        }
        false
    }

    /// Sends a log message to the admin chat
    pub async fn admin_log(&self, api: Arc<API>, text: String) {
        let chat_id = *self.admin_chat_id.read().await;
        if let Some(chat_id) = chat_id {
            _ = api
                .send_message(&api::SendMessageRequest {
                    chat_id,
                    text: format!("`{}`", api::escape_code(text.as_str())),
                    parse_mode: Some(api::ParseMode::MarkdownV2),
                    ..Default::default()
                })
                .await;
        }
    }

    /// Set the directory where game state is saved.
    pub fn set_save_dir(&mut self, save_dir: String) {
        self.save_dir = save_dir;
    }

    /// Set the number of misses allowed in each new round.
    pub fn set_guesses_allowed(&mut self, guesses_allowed: u32) {
        self.guesses_allowed = guesses_allowed;
    }

    pub fn guesses_allowed(&self) -> u32 {
        self.guesses_allowed
    }

    pub fn set_admin_user(&mut self, admin_user: Option<String>) {
        self.admin_user = admin_user;
    }

    /// Returns the user's current score
    pub async fn score(&self, from: &String) -> Score {
        self.scores
            .read()
            .await
            .get(from)
            .cloned()
            .unwrap_or_default()
    }

    /// Applies `update` to the user's score and saves state.
    async fn update_score(&self, from: &User, update: impl FnOnce(&mut Score)) {
        update(
            self.scores
                .write()
                .await
                .entry(from.id.to_string())
                .or_default(),
        );
        if let Err(e) = self.save(from).await {
            error!("Error saving game state: {}", e);
        }
    }

    /// Increments the number of games this user played and saves state.
    pub async fn inc_games(&self, from: &User) {
        self.update_score(from, |score| score.games += 1).await;
    }

    /// Records the current word as won and increments the user's wins.
    pub async fn inc_wins(&mut self, from: &User) {
        if let Some(game) = self.game.as_ref() {
            self.won_words.insert(game.word.clone());
        }
        self.update_score(from, |score| score.wins += 1).await;
    }

    /// Plays a single letter. Anything other than one unguessed letter in a running
    /// round is rejected without touching the game.
    pub async fn play_turn(&mut self, from: &User, text: String) -> Result<Move> {
        let game = self.game.as_mut().ok_or(anyhow!("no game in progress"))?;
        if game.is_game_over {
            return Ok(Move::GameOver);
        }

        let text = text.trim().to_uppercase();
        let mut chars = text.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => c,
            _ => return Ok(Move::InvalidGuess),
        };

        if game.has_guessed(letter) {
            return Ok(Move::AlreadyGuessed);
        }

        let taken = game.guesses_taken;
        game.handle_guess(letter);
        let hit = game.guesses_taken == taken;
        debug!("{} guessed {}: {}", game.word, letter, game.display_word());

        match game.outcome() {
            Some(Outcome::Won) => {
                self.inc_wins(from).await;
                Ok(Move::Won)
            }
            Some(Outcome::Lost) => {
                if let Err(e) = self.save(from).await {
                    error!("Error saving game state: {}", e);
                }
                Ok(Move::Lost)
            }
            None => {
                if let Err(e) = self.save(from).await {
                    error!("Error saving game state: {}", e);
                }
                Ok(if hit { Move::Hit } else { Move::Miss })
            }
        }
    }

    /// Save game state for user
    pub async fn save(&self, user: &User) -> Result<()> {
        if self.save_dir.is_empty() {
            return Ok(());
        }

        let filename = format!("{}/{}.json", self.save_dir, user.id);

        let mut file = File::create(filename.clone())
            .await
            .context(format!("Error creating file {}", filename))?;

        let save_data = SaveData {
            user_id: user.id.to_string(),
            user_handle: user.username.clone().unwrap_or_default(),
            user_first_name: user.first_name.clone(),
            user_last_name: user.last_name.clone().unwrap_or_default(),
            played_words: self.played_words.iter().cloned().collect(),
            won_words: self.won_words.iter().cloned().collect(),
            score: self.score(&user.id.to_string()).await,
            last_game: self.game.clone(),
        };

        file.write_all(
            serde_json::to_vec(&save_data)
                .context("Error serializing game state")?
                .as_ref(),
        )
        .await
        .context(format!("Error writing file {}", filename))
    }

    /// Load game state for user.
    pub async fn load(&mut self, user: &User) -> Result<()> {
        if self.save_dir.is_empty() {
            bail!("No save directory configured");
        }

        let filename = format!("{}/{}.json", self.save_dir, user.id);

        let mut file = File::open(filename.clone())
            .await
            .context(format!("Error opening file {}", filename))?;

        let mut contents = vec![];
        file.read_to_end(&mut contents)
            .await
            .context(format!("Error reading file {}", filename))?;

        let save_data: SaveData = serde_json::from_slice(&contents)
            .context(format!("Error deserializing game state from {}", filename))?;

        self.won_words = HashSet::from_iter(save_data.won_words);
        self.played_words = HashSet::from_iter(save_data.played_words);
        self.played_words.extend(self.won_words.iter().cloned());
        self.scores
            .write()
            .await
            .insert(user.id.to_string(), save_data.score);
        self.game = save_data.last_game;

        Ok(())
    }
}
