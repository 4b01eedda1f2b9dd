use crate::config::Config;
use crate::error::ProgressError;
use crate::flashcards::{self, FlashcardSession, MarkOutcome};
use crate::models::{Card, StudyStats};
use crate::progress::{self, ProgressBlob};
use crate::pronunciation::{PronunciationAnalysis, PronunciationStats, PronunciationTracker};
use crate::speech::{self, SpeechSettings, Voice};
use crate::srs::{Rating, Scheduler};
use crate::store::{Change, MemoryStore};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Everything one learner's session needs, passed explicitly to the HTTP layer.
pub struct App {
    pub store: MemoryStore,
    pub scheduler: Scheduler,
    pub session: FlashcardSession,
    pub history_limit: usize,
    rng: StdRng,
}

impl App {
    pub fn new(store: MemoryStore, config: &Config) -> Self {
        Self::with_rng(store, config, StdRng::from_entropy())
    }

    pub fn with_rng(store: MemoryStore, config: &Config, rng: StdRng) -> Self {
        let session = FlashcardSession::load(&store);
        Self {
            store,
            scheduler: Scheduler::new(config.adaptive_intervals),
            session,
            history_limit: config.history_limit,
            rng,
        }
    }

    pub fn analyze_pronunciation(
        &mut self,
        text: &str,
        recognized: &str,
        confidence: f64,
        now: DateTime<Utc>,
    ) -> Result<PronunciationAnalysis, ProgressError> {
        PronunciationTracker::with_limit(&mut self.store, self.history_limit)
            .analyze_and_record(text, recognized, confidence, now, &mut self.rng)
    }

    pub fn pronunciation_stats(&mut self) -> Option<PronunciationStats> {
        PronunciationTracker::with_limit(&mut self.store, self.history_limit).stats()
    }

    pub fn speech_settings(&self) -> SpeechSettings {
        SpeechSettings::load(&self.store)
    }

    pub fn update_speech_settings(&mut self, settings: SpeechSettings) -> SpeechSettings {
        let settings = settings.sanitized();
        settings.save(&mut self.store);
        settings
    }

    pub fn pick_voice(&self, voices: &[Voice]) -> Option<Voice> {
        speech::pick_japanese_voice(voices).cloned()
    }

    pub fn load_deck(&mut self, cards: Vec<Card>) {
        self.session.load_deck(&self.store, cards, &mut self.rng);
    }

    pub fn mix_decks(&mut self, vocab: Vec<Card>, kanji: Vec<Card>, grammar: Vec<Card>) {
        let mixed = FlashcardSession::mix_decks(vocab, kanji, grammar, &mut self.rng);
        self.load_deck(mixed);
    }

    pub fn flip(&mut self) {
        self.session.flip();
    }

    pub fn mark(&mut self, rating: Rating, now: DateTime<Utc>) -> MarkOutcome {
        self.session.mark(&mut self.store, &self.scheduler, rating, now)
    }

    pub fn due_cards(&self, now: DateTime<Utc>) -> Vec<Card> {
        self.session
            .due_cards(&self.store, now)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn study_stats(&self) -> StudyStats {
        self.session.stats()
    }

    pub fn reset_stats(&mut self) {
        self.session.reset(&mut self.store);
    }

    pub fn export_progress(&self) -> String {
        progress::export(&self.store)
    }

    /// Imports a progress export. The current deck keeps its place and picks up
    /// the imported stats and difficulty weights.
    pub fn import_progress(&mut self, json: &str) -> Result<ProgressBlob, ProgressError> {
        let blob = progress::import(&mut self.store, json)?;
        self.session.refresh(&self.store);
        Ok(blob)
    }

    pub fn card_difficulty(&self, card_id: &str) -> f64 {
        flashcards::card_difficulty(&self.store, card_id)
    }

    /// Store writes not yet flushed to the database.
    pub fn take_changes(&mut self) -> Vec<Change> {
        self.store.take_changes()
    }

    /// Returns unflushed writes to the journal so the next flush retries them.
    pub fn requeue_changes(&mut self, changes: Vec<Change>) {
        self.store.requeue(changes);
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
