/// Hangman is a game where you have to guess a word one letter at a time. Every letter
/// that appears in the word is revealed in place, every letter that doesn't costs a
/// guess. The round ends when the whole word is revealed or the guesses run out.
///
/// This module implements the round state and the guess transition.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The letters a player may guess, in order.
pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Shortest word that makes a playable round.
pub const MIN_WORD_LEN: usize = 3;

pub const DEFAULT_GUESSES_ALLOWED: u32 = 6;

/// ValidationError describes which constraint on the secret word was violated.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ValidationError {
    #[error("word is required")]
    MissingWord,

    #[error("word must be at least {min} letters long, got {len}")]
    TooShort { len: usize, min: usize },

    #[error("word must contain only letters: {word}")]
    NotLetters { word: String },
}

/// Outcome of a finished round.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Outcome {
    Won,
    Lost,
}

/// Game represents a single round of hangman, in progress or finished.
#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(default)]
pub struct Game {
    /// The secret word. Empty means no word has been set.
    pub word: String,

    /// One slot per letter of `word`, `Some` once that letter has been guessed.
    pub guessed_word_state: Vec<Option<char>>,

    /// Every guess so far, in the order it was made.
    pub letters_guessed: Vec<char>,

    /// Letters not yet guessed.
    pub letters_available: Vec<char>,

    pub guesses_allowed: u32,

    /// Number of guesses that missed the word.
    pub guesses_taken: u32,

    /// Cached game-over flag, refreshed by `handle_guess`.
    pub is_game_over: bool,
}

impl Default for Game {
    fn default() -> Self {
        Game {
            word: String::new(),
            guessed_word_state: Vec::new(),
            letters_guessed: Vec::new(),
            letters_available: ALPHABET.chars().collect(),
            guesses_allowed: DEFAULT_GUESSES_ALLOWED,
            guesses_taken: 0,
            is_game_over: false,
        }
    }
}

impl Game {
    /// `new` creates a fresh round for `word`. The word is uppercased but not validated,
    /// call `validate` before playing.
    pub fn new(word: impl Into<String>) -> Game {
        let word = word.into().to_uppercase();
        Game {
            guessed_word_state: vec![None; word.chars().count()],
            word,
            ..Default::default()
        }
    }

    /// `with_guesses_allowed` sets the number of misses the player can afford.
    pub fn with_guesses_allowed(mut self, guesses_allowed: u32) -> Game {
        self.guesses_allowed = guesses_allowed;
        self.is_game_over = self.check_game_over();
        self
    }

    /// `validate` checks the secret word: present, long enough, letters only.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.word.is_empty() {
            return Err(ValidationError::MissingWord);
        }

        let len = self.word.chars().count();
        if len < MIN_WORD_LEN {
            return Err(ValidationError::TooShort {
                len,
                min: MIN_WORD_LEN,
            });
        }

        if !self.word.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::NotLetters {
                word: self.word.clone(),
            });
        }

        Ok(())
    }

    /// `handle_guess` applies a single letter guess to the round.
    ///
    /// A letter in the word is revealed at every position it occurs. A letter that
    /// isn't costs one guess. Either way it is recorded in `letters_guessed` and
    /// dropped from `letters_available`. Repeats, guesses after the round is over and
    /// non-letters are all accepted; callers screen those.
    pub fn handle_guess(&mut self, letter: char) {
        let word: Vec<char> = self.word.chars().collect();
        self.guessed_word_state.resize(word.len(), None);

        if word.contains(&letter) {
            for (slot, &c) in self.guessed_word_state.iter_mut().zip(word.iter()) {
                if c == letter {
                    *slot = Some(letter);
                }
            }
        } else {
            self.guesses_taken = self.guesses_taken.saturating_add(1);
        }

        self.letters_guessed.push(letter);
        self.letters_available.retain(|&c| c != letter);
        self.is_game_over = self.check_game_over();
    }

    /// `has_guessed` returns true if `letter` was guessed before.
    pub fn has_guessed(&self, letter: char) -> bool {
        self.letters_guessed.contains(&letter)
    }

    pub fn guesses_left(&self) -> u32 {
        self.guesses_allowed.saturating_sub(self.guesses_taken)
    }

    pub fn guesses_exhausted(&self) -> bool {
        self.guesses_taken >= self.guesses_allowed
    }

    /// `is_word_revealed` returns true once every letter of the word has been guessed.
    /// A missing word is never revealed.
    pub fn is_word_revealed(&self) -> bool {
        !self.word.is_empty() && self.word.chars().all(|c| self.has_guessed(c))
    }

    /// `check_game_over` derives the game-over flag from the rest of the state.
    pub fn check_game_over(&self) -> bool {
        self.guesses_exhausted() || self.is_word_revealed()
    }

    /// `outcome` returns how the round ended, or None while it is still being played.
    /// Revealing the word wins even if the guesses are also used up.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.is_word_revealed() {
            Some(Outcome::Won)
        } else if self.guesses_exhausted() {
            Some(Outcome::Lost)
        } else {
            None
        }
    }

    /// `display_word` renders the word with `_` for every letter still hidden.
    pub fn display_word(&self) -> String {
        self.word
            .chars()
            .enumerate()
            .map(|(i, _)| match self.guessed_word_state.get(i) {
                Some(Some(c)) => *c,
                _ => '_',
            })
            .collect()
    }
}
