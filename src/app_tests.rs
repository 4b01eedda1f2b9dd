use super::*;
use crate::flashcards::load_schedule;
use crate::models::CardKind;
use chrono::{Duration, TimeZone};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()
}

fn new_app(config: &Config) -> App {
    App::with_rng(MemoryStore::new(), config, StdRng::seed_from_u64(42))
}

fn deck() -> Vec<Card> {
    vec![
        Card::new(CardKind::Vocabulary, "猫", "猫", "Cat", "Đọc: ねこ"),
        Card::new(CardKind::Kanji, "山", "山", "Mountain", "Âm on: サン"),
        Card::new(CardKind::Grammar, "0", "〜は〜です", "X is Y", ""),
    ]
}

#[test]
fn test_new_app_state() {
    let app = new_app(&Config::default());
    assert_eq!(app.study_stats(), StudyStats::default());
    assert!(app.session.deck().is_empty());
    assert!(!app.scheduler.adaptive);
}

#[test]
fn test_correct_answer() {
    let mut app = new_app(&Config::default());
    app.load_deck(deck());
    let id = app.session.current().unwrap().id.clone();

    app.flip();
    let outcome = app.mark(Rating::Correct, t0());

    assert!(matches!(outcome, MarkOutcome::Reviewed { summary: None, .. }));
    assert_eq!(app.study_stats().streak, 1);
    assert_eq!(app.card_difficulty(&id), 0.9);
    assert_eq!(
        load_schedule(&app.store, &id).unwrap().next_review,
        t0() + Duration::days(1)
    );
}

#[test]
fn test_incorrect_answer() {
    let mut app = new_app(&Config::default());
    app.load_deck(deck());

    app.flip();
    app.mark(Rating::Wrong, t0());

    assert_eq!(app.study_stats().cards_studied, 1);
    assert_eq!(app.study_stats().correct_answers, 0);
    assert_eq!(app.study_stats().streak, 0);
    assert_eq!(app.due_cards(t0() + Duration::minutes(2)).len(), 3);
    assert_eq!(app.due_cards(t0()).len(), 2);
}

#[test]
fn test_adaptive_config_changes_intervals() {
    let config = Config {
        adaptive_intervals: true,
        ..Config::default()
    };
    let mut app = new_app(&config);
    app.load_deck(deck());
    let id = app.session.current().unwrap().id.clone();

    app.flip();
    app.mark(Rating::Again, t0());

    // Difficulty rose to 1.1, so the 10 minute interval shrinks.
    let next = load_schedule(&app.store, &id).unwrap().next_review;
    assert!(next < t0() + Duration::minutes(10));
    assert!(next > t0() + Duration::minutes(9));
}

#[test]
fn test_pronunciation_history_limit_from_config() {
    let config = Config {
        history_limit: 3,
        ..Config::default()
    };
    let mut app = new_app(&config);
    for _ in 0..5 {
        app.analyze_pronunciation("ねこ", "ねこ", 1.0, t0()).unwrap();
    }
    assert_eq!(app.pronunciation_stats().unwrap().total_sessions, 3);
}

#[test]
fn test_import_refreshes_session_stats() {
    let mut source = new_app(&Config::default());
    source.load_deck(deck());
    source.flip();
    source.mark(Rating::Easy, t0());
    source.analyze_pronunciation("こんにちは", "こんにちわ", 0.7, t0()).unwrap();
    let exported = source.export_progress();

    let mut target = new_app(&Config::default());
    target.load_deck(deck());
    target.import_progress(&exported).unwrap();

    assert_eq!(target.study_stats(), source.study_stats());
    assert_eq!(target.export_progress(), exported);
    assert_eq!(target.session.deck().len(), 3);
}

#[test]
fn test_import_keeps_deck_position() {
    let mut source = new_app(&Config::default());
    source.load_deck(deck());
    source.flip();
    source.mark(Rating::Wrong, t0());
    let exported = source.export_progress();

    let mut target = new_app(&Config::default());
    target.load_deck(deck());
    target.flip();
    target.mark(Rating::Easy, t0());
    let order: Vec<String> = target.session.deck().iter().map(|c| c.id.clone()).collect();
    let current = target.session.current().unwrap().id.clone();

    target.import_progress(&exported).unwrap();

    let after: Vec<String> = target.session.deck().iter().map(|c| c.id.clone()).collect();
    assert_eq!(after, order);
    assert_eq!(target.session.progress(), (2, 3));
    assert_eq!(target.session.current().unwrap().id, current);
    assert_eq!(target.study_stats(), source.study_stats());
    for card in target.session.deck() {
        assert_eq!(card.difficulty, target.card_difficulty(&card.id));
    }
}

#[test]
fn test_pick_voice() {
    let app = new_app(&Config::default());
    let voices = vec![
        Voice { name: "Samantha".to_string(), lang: "en-US".to_string(), local_service: true },
        Voice { name: "Kyoko".to_string(), lang: "ja-JP".to_string(), local_service: true },
    ];
    assert_eq!(app.pick_voice(&voices).unwrap().name, "Kyoko");
    assert!(app.pick_voice(&voices[..1]).is_none());
}

#[test]
fn test_settings_are_sanitized() {
    let mut app = new_app(&Config::default());
    let saved = app.update_speech_settings(SpeechSettings {
        volume: 3.0,
        ..SpeechSettings::default()
    });
    assert_eq!(saved.volume, 1.0);
    assert_eq!(app.speech_settings(), saved);
}

#[test]
fn test_changes_are_journaled() {
    let mut app = new_app(&Config::default());
    app.reset_stats();
    let changes = app.take_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].0, "flashcard_study_stats");
    assert!(app.take_changes().is_empty());
}

#[test]
fn test_mixed_deck() {
    let mut app = new_app(&Config::default());
    app.mix_decks(deck(), Vec::new(), Vec::new());
    assert_eq!(app.session.progress(), (1, 3));
}
