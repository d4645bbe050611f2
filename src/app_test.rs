use crate::{app::*, handlers::handle_chat_event};
use log::*;
use mobot::{api::User, *};

fn player() -> User {
    User {
        id: 42,
        first_name: "Ada".into(),
        ..Default::default()
    }
}

fn app_with(words: &[&str]) -> App {
    App::new("Hangman".into(), words.iter().map(|w| w.to_string()).collect())
}

#[tokio::test]
async fn start_game_picks_unplayed_words_first() {
    let mut app = app_with(&["cat", "dog"]);
    assert!(!app.is_playing());

    assert_eq!(app.start_game().await.unwrap(), "CAT");
    assert!(app.is_playing());
    assert_eq!(app.game.as_ref().unwrap().guessed_word_state, vec![None; 3]);

    assert_eq!(app.start_game().await.unwrap(), "DOG");

    // Every word played, fall back to a random one.
    let word = app.start_game().await.unwrap();
    assert!(word == "CAT" || word == "DOG");
}

#[tokio::test]
async fn start_game_rejects_unplayable_word() {
    let mut app = app_with(&["A1"]);
    assert!(app.start_game().await.is_err());
    assert!(app.game.is_none());

    let mut app = app_with(&[]);
    assert!(app.start_game().await.is_err());
}

#[tokio::test]
async fn start_game_rejects_round_without_guesses() {
    let mut app = app_with(&["hello"]);
    app.set_guesses_allowed(0);

    assert!(app.start_game().await.is_err());
    assert!(app.game.is_none());
    assert!(!app.is_playing());
}

#[tokio::test]
async fn play_turn_reports_hits_and_misses() {
    let mut app = app_with(&["hello"]);
    app.start_game().await.unwrap();
    let from = player();

    assert_eq!(app.play_turn(&from, "l".into()).await.unwrap(), Move::Hit);
    assert_eq!(app.play_turn(&from, " Z ".into()).await.unwrap(), Move::Miss);

    let game = app.game.as_ref().unwrap();
    assert_eq!(game.display_word(), "__LL_");
    assert_eq!(game.guesses_taken, 1);
    assert_eq!(game.letters_guessed, vec!['L', 'Z']);
}

#[tokio::test]
async fn play_turn_screens_bad_input() {
    let mut app = app_with(&["hello"]);
    app.start_game().await.unwrap();
    let from = player();

    for text in ["", "AB", "7", "?"] {
        assert_eq!(
            app.play_turn(&from, text.into()).await.unwrap(),
            Move::InvalidGuess
        );
    }

    app.play_turn(&from, "Q".into()).await.unwrap();
    assert_eq!(
        app.play_turn(&from, "q".into()).await.unwrap(),
        Move::AlreadyGuessed
    );

    let game = app.game.as_ref().unwrap();
    assert_eq!(game.letters_guessed, vec!['Q']);
    assert_eq!(game.guesses_taken, 1);
}

#[tokio::test]
async fn play_turn_wins_and_scores() {
    let mut app = app_with(&["hello"]);
    app.start_game().await.unwrap();
    let from = player();
    app.inc_games(&from).await;

    for letter in ["H", "E", "L"] {
        assert_eq!(app.play_turn(&from, letter.into()).await.unwrap(), Move::Hit);
    }
    assert_eq!(app.play_turn(&from, "O".into()).await.unwrap(), Move::Won);
    assert!(!app.is_playing());
    assert_eq!(
        app.play_turn(&from, "X".into()).await.unwrap(),
        Move::GameOver
    );

    let score = app.score(&from.id.to_string()).await;
    assert_eq!((score.games, score.wins), (1, 1));
    assert_eq!(score.to_string(), "100% (1/1)");
}

#[tokio::test]
async fn play_turn_loses_when_guesses_run_out() {
    let mut app = app_with(&["hello"]);
    app.set_guesses_allowed(2);
    app.start_game().await.unwrap();
    let from = player();

    assert_eq!(app.play_turn(&from, "X".into()).await.unwrap(), Move::Miss);
    assert_eq!(app.play_turn(&from, "Y".into()).await.unwrap(), Move::Lost);
    assert!(!app.is_playing());
    assert_eq!(app.score(&from.id.to_string()).await.wins, 0);
}

#[tokio::test]
async fn play_turn_without_game_fails() {
    let mut app = app_with(&["hello"]);
    assert!(app.play_turn(&player(), "A".into()).await.is_err());
}

#[tokio::test]
async fn save_and_load_round_trip() {
    let dir = std::env::temp_dir().join(format!("hangmanbot-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let save_dir = dir.to_string_lossy().to_string();
    let from = player();

    let mut app = app_with(&["hello"]);
    app.set_save_dir(save_dir.clone());
    app.start_game().await.unwrap();
    app.inc_games(&from).await;
    app.play_turn(&from, "L".into()).await.unwrap();

    let mut restored = app_with(&["hello"]);
    restored.set_save_dir(save_dir);
    restored.load(&from).await.unwrap();

    assert_eq!(restored.game, app.game);
    assert!(restored.is_playing());
    assert_eq!(restored.score(&from.id.to_string()).await.games, 1);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn load_without_save_dir_fails() {
    let mut app = app_with(&["hello"]);
    assert!(app.load(&player()).await.is_err());
}

#[test]
fn score_display_handles_no_games() {
    assert_eq!(Score::default().to_string(), "0% (0/0)");
}

#[tokio::test]
async fn bot_replies_to_first_message() {
    mobot::init_logger();

    // Create a FakeAPI and attach it to the client. Any Telegram requests are now forwarded
    // to `fakeserver` instead.
    let fakeserver = fake::FakeAPI::new();
    let client = Client::new("token".to_string().into()).with_post_handler(fakeserver.clone());

    // Keep the Telegram poll timeout short for testing. The default Telegram poll timeout is 60s.
    let mut router = Router::new(client)
        .with_state(app_with(&["hello"]))
        .with_poll_timeout_s(1);

    router.add_route(Route::Message(Matcher::Any), handle_chat_event);

    // Since we're passing ownership of the Router to a background task, grab the
    // shutdown channels so we can shut it down from this task.
    let (shutdown_notifier, shutdown_tx) = router.shutdown();

    tokio::spawn(async move {
        info!("Starting router...");
        router.start().await;
    });

    let chat = fakeserver.create_chat("qubyte").await;

    // The first message of a chat starts a round.
    chat.send_text("hi").await.unwrap();
    let reply = chat.recv_update().await.unwrap().to_string();
    assert!(reply.contains("Welcome to Hangman"), "reply: {}", reply);

    info!("Shutting down...");
    shutdown_tx.send(()).await.unwrap();
    shutdown_notifier.notified().await;
}

#[tokio::test]
async fn bot_answers_commands() {
    mobot::init_logger();

    let fakeserver = fake::FakeAPI::new();
    let client = Client::new("token".to_string().into()).with_post_handler(fakeserver.clone());

    let mut app = app_with(&["hello"]);
    app.set_guesses_allowed(4);
    let mut router = Router::new(client).with_state(app).with_poll_timeout_s(1);
    router.add_route(Route::Message(Matcher::Any), handle_chat_event);

    let (shutdown_notifier, shutdown_tx) = router.shutdown();
    tokio::spawn(async move {
        router.start().await;
    });

    let chat = fakeserver.create_chat("qubyte").await;

    chat.send_text("/help").await.unwrap();
    let reply = chat.recv_update().await.unwrap().to_string();
    assert!(reply.contains("you have 4 of them"), "reply: {}", reply);

    // No save directory, so there is no score to load.
    chat.send_text("/score").await.unwrap();
    let reply = chat.recv_update().await.unwrap().to_string();
    assert!(reply.contains("not played any games"), "reply: {}", reply);

    chat.send_text("/admin").await.unwrap();
    let reply = chat.recv_update().await.unwrap().to_string();
    assert!(reply.contains("not an admin"), "reply: {}", reply);

    chat.send_text("/bogus").await.unwrap();
    let reply = chat.recv_update().await.unwrap().to_string();
    assert!(reply.contains("don't know that command"), "reply: {}", reply);

    shutdown_tx.send(()).await.unwrap();
    shutdown_notifier.notified().await;
}
