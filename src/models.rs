use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

pub const DEFAULT_DIFFICULTY: f64 = 1.0;
pub const MIN_DIFFICULTY: f64 = 0.5;
pub const MAX_DIFFICULTY: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Vocabulary,
    Kanji,
    Grammar,
}

impl CardKind {
    pub fn id_prefix(self) -> &'static str {
        match self {
            CardKind::Vocabulary => "vocab",
            CardKind::Kanji => "kanji",
            CardKind::Grammar => "grammar",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: f64,
}

fn default_difficulty() -> f64 {
    DEFAULT_DIFFICULTY
}

impl Card {
    /// Builds a card whose id is `<kind prefix>_<key>`, e.g. `vocab_猫` or `grammar_3`.
    pub fn new(kind: CardKind, key: &str, front: &str, back: &str, explanation: &str) -> Self {
        Self {
            id: format!("{}_{}", kind.id_prefix(), key),
            kind,
            front: front.to_string(),
            back: back.to_string(),
            explanation: explanation.to_string(),
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

/// Per-card review history and difficulty weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardPerformance {
    pub card_id: String,
    pub attempts: u32,
    pub correct: u32,
    pub last_reviewed: DateTime<Utc>,
    pub difficulty: f64, // clamped to [0.5, 2.0]
}

impl CardPerformance {
    pub fn new(card_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            card_id: card_id.to_string(),
            attempts: 0,
            correct: 0,
            last_reviewed: now,
            difficulty: DEFAULT_DIFFICULTY,
        }
    }

    /// Brings an externally supplied record back within range:
    /// `correct <= attempts` and difficulty in [0.5, 2.0].
    pub fn normalized(mut self) -> Self {
        self.correct = self.correct.min(self.attempts);
        self.difficulty = if self.difficulty.is_finite() {
            self.difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
        } else {
            DEFAULT_DIFFICULTY
        };
        self
    }

    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.correct as f64 / self.attempts as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardSchedule {
    pub card_id: String,
    pub next_review: DateTime<Utc>,
}

/// Running counters for the flashcard study session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyStats {
    pub cards_studied: u32,
    pub correct_answers: u32,
    pub streak: u32,
    pub max_streak: u32,
}

impl StudyStats {
    pub fn record(&mut self, success: bool) {
        self.cards_studied += 1;
        if success {
            self.correct_answers += 1;
            self.streak += 1;
            self.max_streak = self.max_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
    }

    /// Caps `correct_answers` at `cards_studied` and keeps `max_streak >= streak`.
    pub fn normalized(mut self) -> Self {
        self.correct_answers = self.correct_answers.min(self.cards_studied);
        self.max_streak = self.max_streak.max(self.streak);
        self
    }

    /// Percentage of correct answers, 0 before anything was studied.
    pub fn accuracy(&self) -> u32 {
        if self.cards_studied == 0 {
            return 0;
        }
        (self.correct_answers as f64 / self.cards_studied as f64 * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_ids_use_kind_prefix() {
        assert_eq!(Card::new(CardKind::Vocabulary, "猫", "猫", "Cat", "").id, "vocab_猫");
        assert_eq!(Card::new(CardKind::Kanji, "山", "山", "Mountain", "").id, "kanji_山");
        assert_eq!(Card::new(CardKind::Grammar, "0", "〜は〜です", "X is Y", "").id, "grammar_0");
    }

    #[test]
    fn test_stats_streaks() {
        let mut stats = StudyStats::default();
        stats.record(true);
        stats.record(true);
        stats.record(false);
        stats.record(true);

        assert_eq!(stats.cards_studied, 4);
        assert_eq!(stats.correct_answers, 3);
        assert_eq!(stats.streak, 1);
        assert_eq!(stats.max_streak, 2);
        assert_eq!(stats.accuracy(), 75);
    }

    #[test]
    fn test_accuracy_empty() {
        assert_eq!(StudyStats::default().accuracy(), 0);
    }

    #[test]
    fn test_stats_accepts_partial_json() {
        let stats: StudyStats = serde_json::from_str(r#"{"cardsStudied": 4}"#).unwrap();
        assert_eq!(stats.cards_studied, 4);
        assert_eq!(stats.max_streak, 0);
    }

    #[test]
    fn test_normalized_records() {
        let mut performance = CardPerformance::new("vocab_猫", Utc::now());
        performance.attempts = 1;
        performance.correct = 7;
        performance.difficulty = 9.5;
        let performance = performance.normalized();
        assert_eq!(performance.correct, 1);
        assert_eq!(performance.difficulty, MAX_DIFFICULTY);

        let stats = StudyStats { cards_studied: 1, correct_answers: 5, streak: 4, max_streak: 2 }.normalized();
        assert_eq!(stats.correct_answers, 1);
        assert_eq!(stats.max_streak, 4);
        assert_eq!(stats.accuracy(), 100);
    }

    #[test]
    fn test_performance_uses_camel_case() {
        let now = Utc::now();
        let json = serde_json::to_value(CardPerformance::new("vocab_猫", now)).unwrap();
        assert_eq!(json["cardId"], "vocab_猫");
        assert!(json.get("lastReviewed").is_some());
    }
}
