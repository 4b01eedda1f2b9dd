//! Flashcard study sessions and per-card review records.

use crate::models::{Card, CardPerformance, CardSchedule, StudyStats, DEFAULT_DIFFICULTY};
use crate::srs::{update_performance, Rating, Scheduler};
use crate::store::{load_json, save_json, KeyValueStore};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const PERFORMANCE_PREFIX: &str = "flashcard_performance_";
pub const SCHEDULE_PREFIX: &str = "flashcard_schedule_";
pub const STATS_KEY: &str = "flashcard_study_stats";

/// Cards drawn from each deck when studying a mixed deck.
const MIXED_VOCAB: usize = 10;
const MIXED_KANJI: usize = 5;
const MIXED_GRAMMAR: usize = 5;

pub fn performance_key(card_id: &str) -> String {
    format!("{}{}", PERFORMANCE_PREFIX, card_id)
}

pub fn schedule_key(card_id: &str) -> String {
    format!("{}{}", SCHEDULE_PREFIX, card_id)
}

pub fn load_performance<S: KeyValueStore + ?Sized>(store: &S, card_id: &str) -> Option<CardPerformance> {
    load_json(store, &performance_key(card_id))
}

pub fn save_performance<S: KeyValueStore + ?Sized>(store: &mut S, performance: &CardPerformance) {
    save_json(store, &performance_key(&performance.card_id), performance);
}

pub fn load_schedule<S: KeyValueStore + ?Sized>(store: &S, card_id: &str) -> Option<CardSchedule> {
    load_json(store, &schedule_key(card_id))
}

pub fn save_schedule<S: KeyValueStore + ?Sized>(store: &mut S, schedule: &CardSchedule) {
    save_json(store, &schedule_key(&schedule.card_id), schedule);
}

pub fn load_stats<S: KeyValueStore + ?Sized>(store: &S) -> StudyStats {
    load_json(store, STATS_KEY).unwrap_or_default()
}

pub fn save_stats<S: KeyValueStore + ?Sized>(store: &mut S, stats: &StudyStats) {
    save_json(store, STATS_KEY, stats);
}

/// Stored difficulty weight for a card, 1.0 if it was never reviewed.
pub fn card_difficulty<S: KeyValueStore + ?Sized>(store: &S, card_id: &str) -> f64 {
    load_performance(store, card_id)
        .map(|p| p.difficulty)
        .unwrap_or(DEFAULT_DIFFICULTY)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub performance: CardPerformance,
    pub schedule: CardSchedule,
}

/// Records one review of a card: updates its performance record and overwrites its schedule.
pub fn review_card<S: KeyValueStore + ?Sized>(
    store: &mut S,
    scheduler: &Scheduler,
    card_id: &str,
    rating: Rating,
    now: DateTime<Utc>,
) -> ReviewOutcome {
    let performance = update_performance(load_performance(store, card_id), card_id, rating, now);
    save_performance(store, &performance);

    let schedule = CardSchedule {
        card_id: card_id.to_string(),
        next_review: scheduler.next_review(rating, performance.difficulty, now),
    };
    save_schedule(store, &schedule);

    log::debug!(
        "Reviewed {} as {:?}: difficulty {:.1}, next review {}",
        card_id,
        rating,
        performance.difficulty,
        schedule.next_review
    );

    ReviewOutcome { performance, schedule }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub cards_studied: u32,
    pub accuracy: u32,
    pub max_streak: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkOutcome {
    /// Nothing to mark.
    NoCard,
    /// The card was still face down; marking only revealed the answer.
    Flipped,
    Reviewed {
        outcome: ReviewOutcome,
        /// Set when this review finished the deck.
        summary: Option<SessionSummary>,
    },
}

/// One learner working through one deck.
#[derive(Debug, Clone, Default)]
pub struct FlashcardSession {
    deck: Vec<Card>,
    index: usize,
    flipped: bool,
    stats: StudyStats,
}

impl FlashcardSession {
    /// Starts a session with the persisted running stats.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        Self {
            stats: load_stats(store),
            ..Self::default()
        }
    }

    /// Replaces the deck with a shuffled copy of `cards`, seeding difficulty from stored records.
    pub fn load_deck<S, R>(&mut self, store: &S, cards: Vec<Card>, rng: &mut R)
    where
        S: KeyValueStore + ?Sized,
        R: Rng + ?Sized,
    {
        let mut deck: Vec<Card> = cards
            .into_iter()
            .map(|mut card| {
                card.difficulty = card_difficulty(store, &card.id);
                card
            })
            .collect();
        deck.shuffle(rng);

        log::info!("Loaded deck of {} cards", deck.len());
        self.deck = deck;
        self.index = 0;
        self.flipped = false;
    }

    /// Builds a mixed deck: up to 10 vocabulary, 5 kanji and 5 grammar cards.
    pub fn mix_decks<R: Rng + ?Sized>(
        mut vocab: Vec<Card>,
        mut kanji: Vec<Card>,
        mut grammar: Vec<Card>,
        rng: &mut R,
    ) -> Vec<Card> {
        vocab.shuffle(rng);
        kanji.shuffle(rng);
        grammar.shuffle(rng);

        let mut mixed: Vec<Card> = vocab
            .into_iter()
            .take(MIXED_VOCAB)
            .chain(kanji.into_iter().take(MIXED_KANJI))
            .chain(grammar.into_iter().take(MIXED_GRAMMAR))
            .collect();
        mixed.shuffle(rng);
        mixed
    }

    /// Re-reads stats and card difficulty from the store, keeping deck order and position.
    pub fn refresh<S: KeyValueStore + ?Sized>(&mut self, store: &S) {
        self.stats = load_stats(store);
        for card in &mut self.deck {
            card.difficulty = card_difficulty(store, &card.id);
        }
    }

    pub fn deck(&self) -> &[Card] {
        &self.deck
    }

    pub fn current(&self) -> Option<&Card> {
        self.deck.get(self.index)
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn flip(&mut self) {
        if self.current().is_some() {
            self.flipped = true;
        }
    }

    pub fn stats(&self) -> StudyStats {
        self.stats
    }

    /// 1-based position of the current card and the deck size.
    pub fn progress(&self) -> (usize, usize) {
        if self.deck.is_empty() {
            (0, 0)
        } else {
            (self.index + 1, self.deck.len())
        }
    }

    /// Rates the current card. A face-down card is only flipped.
    ///
    /// After the last card the session summary is returned and the deck starts over.
    pub fn mark<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        scheduler: &Scheduler,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> MarkOutcome {
        let card_id = match self.current() {
            Some(card) => card.id.clone(),
            None => return MarkOutcome::NoCard,
        };

        if !self.flipped {
            self.flip();
            return MarkOutcome::Flipped;
        }

        self.stats.record(rating.is_success());
        let outcome = review_card(store, scheduler, &card_id, rating, now);
        save_stats(store, &self.stats);

        self.index += 1;
        self.flipped = false;

        let summary = if self.index >= self.deck.len() {
            self.index = 0;
            let summary = self.summary();
            log::info!(
                "Study session complete: {} cards, {}% accuracy, best streak {}",
                summary.cards_studied,
                summary.accuracy,
                summary.max_streak
            );
            Some(summary)
        } else {
            None
        };

        MarkOutcome::Reviewed { outcome, summary }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            cards_studied: self.stats.cards_studied,
            accuracy: self.stats.accuracy(),
            max_streak: self.stats.max_streak,
        }
    }

    /// Cards in the deck that were never scheduled or whose review time has come.
    pub fn due_cards<S: KeyValueStore + ?Sized>(&self, store: &S, now: DateTime<Utc>) -> Vec<&Card> {
        self.deck
            .iter()
            .filter(|card| match load_schedule(store, &card.id) {
                Some(schedule) => schedule.next_review <= now,
                None => true,
            })
            .collect()
    }

    pub fn reset<S: KeyValueStore + ?Sized>(&mut self, store: &mut S) {
        self.stats = StudyStats::default();
        save_stats(store, &self.stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardKind;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()
    }

    fn vocab(n: usize) -> Vec<Card> {
        (0..n)
            .map(|i| Card::new(CardKind::Vocabulary, &format!("w{}", i), "猫", "Cat", ""))
            .collect()
    }

    fn session_with(store: &MemoryStore, cards: Vec<Card>) -> FlashcardSession {
        let mut rng = StdRng::seed_from_u64(11);
        let mut session = FlashcardSession::load(store);
        session.load_deck(store, cards, &mut rng);
        session
    }

    #[test]
    fn test_mark_unflipped_only_flips() {
        let mut store = MemoryStore::new();
        let mut session = session_with(&store, vocab(2));

        let outcome = session.mark(&mut store, &Scheduler::default(), Rating::Correct, t0());
        assert_eq!(outcome, MarkOutcome::Flipped);
        assert!(session.is_flipped());
        assert_eq!(session.stats().cards_studied, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_mark_reviews_and_advances() {
        let mut store = MemoryStore::new();
        let mut session = session_with(&store, vocab(2));
        let first_id = session.current().unwrap().id.clone();

        session.flip();
        let outcome = session.mark(&mut store, &Scheduler::default(), Rating::Easy, t0());

        match outcome {
            MarkOutcome::Reviewed { outcome, summary } => {
                assert_eq!(outcome.schedule.card_id, first_id);
                assert_eq!(outcome.schedule.next_review, t0() + Duration::days(3));
                assert!(summary.is_none());
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        assert_eq!(session.progress(), (2, 2));
        assert!(!session.is_flipped());
        assert_eq!(load_stats(&store).cards_studied, 1);
        assert_eq!(load_schedule(&store, &first_id).unwrap().next_review, t0() + Duration::days(3));
    }

    #[test]
    fn test_deck_end_returns_summary_and_wraps() {
        let mut store = MemoryStore::new();
        let mut session = session_with(&store, vocab(2));
        let scheduler = Scheduler::default();

        session.flip();
        session.mark(&mut store, &scheduler, Rating::Correct, t0());
        session.flip();
        let outcome = session.mark(&mut store, &scheduler, Rating::Wrong, t0());

        match outcome {
            MarkOutcome::Reviewed { summary: Some(summary), .. } => {
                assert_eq!(summary.cards_studied, 2);
                assert_eq!(summary.accuracy, 50);
                assert_eq!(summary.max_streak, 1);
            }
            other => panic!("expected summary, got {:?}", other),
        }
        assert_eq!(session.progress(), (1, 2));
        assert_eq!(session.stats().streak, 0);
    }

    #[test]
    fn test_empty_deck() {
        let mut store = MemoryStore::new();
        let mut session = session_with(&store, Vec::new());
        assert_eq!(session.progress(), (0, 0));
        assert_eq!(
            session.mark(&mut store, &Scheduler::default(), Rating::Easy, t0()),
            MarkOutcome::NoCard
        );
    }

    #[test]
    fn test_due_cards() {
        let mut store = MemoryStore::new();
        let session = session_with(&store, vocab(3));
        let scheduler = Scheduler::default();

        review_card(&mut store, &scheduler, "vocab_w0", Rating::Easy, t0());
        review_card(&mut store, &scheduler, "vocab_w1", Rating::Wrong, t0());

        let due: Vec<&str> = {
            let mut ids: Vec<&str> = session
                .due_cards(&store, t0() + Duration::minutes(5))
                .into_iter()
                .map(|c| c.id.as_str())
                .collect();
            ids.sort();
            ids
        };
        assert_eq!(due, vec!["vocab_w1", "vocab_w2"]);
    }

    #[test]
    fn test_deck_seeds_difficulty() {
        let mut store = MemoryStore::new();
        let scheduler = Scheduler::default();
        review_card(&mut store, &scheduler, "vocab_w0", Rating::Wrong, t0());

        let session = session_with(&store, vocab(2));
        let seeded = session.deck().iter().find(|c| c.id == "vocab_w0").unwrap();
        let fresh = session.deck().iter().find(|c| c.id == "vocab_w1").unwrap();
        assert_eq!(seeded.difficulty, 1.1);
        assert_eq!(fresh.difficulty, 1.0);
    }

    #[test]
    fn test_mix_decks_caps_each_kind() {
        let mut rng = StdRng::seed_from_u64(3);
        let kanji: Vec<Card> = (0..8)
            .map(|i| Card::new(CardKind::Kanji, &i.to_string(), "山", "Mountain", ""))
            .collect();
        let grammar: Vec<Card> = (0..2)
            .map(|i| Card::new(CardKind::Grammar, &i.to_string(), "〜です", "to be", ""))
            .collect();

        let mixed = FlashcardSession::mix_decks(vocab(15), kanji, grammar, &mut rng);
        let count = |kind: CardKind| mixed.iter().filter(|c| c.kind == kind).count();
        assert_eq!(mixed.len(), 17);
        assert_eq!(count(CardKind::Vocabulary), 10);
        assert_eq!(count(CardKind::Kanji), 5);
        assert_eq!(count(CardKind::Grammar), 2);
    }

    #[test]
    fn test_reset_persists_zeroed_stats() {
        let mut store = MemoryStore::new();
        save_stats(&mut store, &StudyStats { cards_studied: 9, correct_answers: 4, streak: 1, max_streak: 3 });

        let mut session = FlashcardSession::load(&store);
        assert_eq!(session.stats().cards_studied, 9);
        session.reset(&mut store);
        assert_eq!(load_stats(&store), StudyStats::default());
    }

    #[test]
    fn test_review_overwrites_schedule() {
        let mut store = MemoryStore::new();
        let scheduler = Scheduler::default();
        review_card(&mut store, &scheduler, "kanji_山", Rating::Easy, t0());
        review_card(&mut store, &scheduler, "kanji_山", Rating::Wrong, t0());
        assert_eq!(
            load_schedule(&store, "kanji_山").unwrap().next_review,
            t0() + Duration::minutes(1)
        );
        assert_eq!(load_performance(&store, "kanji_山").unwrap().attempts, 2);
    }
}
