//! Pronunciation scoring and the learner's attempt history.

use crate::error::ProgressError;
use crate::feedback::FeedbackGenerator;
use crate::similarity::{normalize, similarity};
use crate::store::{load_json, save_json, KeyValueStore};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const HISTORY_KEY: &str = "pronunciation_progress";
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationAnalysis {
    pub overall_score: u32,
    pub accuracy: u32,
    pub confidence: u32,
    /// Placeholder, not derived from audio.
    pub intonation: u32,
    /// Placeholder, not derived from audio.
    pub speed: u32,
    pub feedback: Vec<String>,
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PronunciationEntry {
    pub text: String,
    pub score: u32,
    pub timestamp: DateTime<Utc>,
    pub analysis: PronunciationAnalysis,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationStats {
    pub total_sessions: usize,
    pub average_score: u32,
    pub last_score: u32,
    pub improvement: i64,
    pub best_score: u32,
}

fn percent(value: f64) -> u32 {
    (value * 100.0).round().clamp(0.0, 100.0) as u32
}

/// `round((similarity * 0.7 + confidence * 0.3) * 100)`.
pub fn overall_score(similarity: f64, confidence: f64) -> u32 {
    percent(similarity * 0.7 + confidence * 0.3)
}

/// Stand-in intonation score in `70..100`. No audio features are analysed.
pub fn placeholder_intonation<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(70..100)
}

/// Stand-in speed score in `80..100`. No recording duration is measured.
pub fn placeholder_speed<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(80..100)
}

/// Scores a recognized transcript against the text the learner meant to say.
pub fn analyze<R: Rng + ?Sized>(
    expected: &str,
    recognized: &str,
    confidence: f64,
    rng: &mut R,
) -> PronunciationAnalysis {
    let confidence = if confidence.is_finite() { confidence.clamp(0.0, 1.0) } else { 0.0 };
    let accuracy = similarity(&normalize(expected), &normalize(recognized));

    PronunciationAnalysis {
        overall_score: overall_score(accuracy, confidence),
        accuracy: percent(accuracy),
        confidence: percent(confidence),
        intonation: placeholder_intonation(rng),
        speed: placeholder_speed(rng),
        feedback: FeedbackGenerator::feedback(accuracy, confidence, expected, recognized),
        improvements: FeedbackGenerator::improvements(accuracy, confidence),
    }
}

/// Keeps the capped attempt history in a key-value store.
pub struct PronunciationTracker<'a, S: KeyValueStore + ?Sized> {
    store: &'a mut S,
    limit: usize,
}

impl<'a, S: KeyValueStore + ?Sized> PronunciationTracker<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self::with_limit(store, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(store: &'a mut S, limit: usize) -> Self {
        Self { store, limit: limit.max(1) }
    }

    pub fn history(&self) -> Vec<PronunciationEntry> {
        load_json(&*self.store, HISTORY_KEY).unwrap_or_default()
    }

    /// Appends an attempt, evicting the oldest entries beyond the limit.
    pub fn record(&mut self, text: &str, analysis: &PronunciationAnalysis, now: DateTime<Utc>) {
        let mut history = self.history();
        history.push(PronunciationEntry {
            text: text.to_string(),
            score: analysis.overall_score,
            timestamp: now,
            analysis: analysis.clone(),
        });

        if history.len() > self.limit {
            let excess = history.len() - self.limit;
            history.drain(..excess);
        }

        save_json(&mut *self.store, HISTORY_KEY, &history);
    }

    pub fn analyze_and_record<R: Rng + ?Sized>(
        &mut self,
        expected: &str,
        recognized: &str,
        confidence: f64,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<PronunciationAnalysis, ProgressError> {
        let expected = expected.trim();
        if expected.is_empty() {
            return Err(ProgressError::EmptyText);
        }

        let analysis = analyze(expected, recognized, confidence, rng);
        log::debug!(
            "Pronunciation attempt for '{}': score {} (accuracy {}, confidence {})",
            expected,
            analysis.overall_score,
            analysis.accuracy,
            analysis.confidence
        );
        self.record(expected, &analysis, now);
        Ok(analysis)
    }

    pub fn stats(&self) -> Option<PronunciationStats> {
        summarize(&self.history())
    }
}

/// Aggregates a history; `None` when there are no attempts yet.
pub fn summarize(history: &[PronunciationEntry]) -> Option<PronunciationStats> {
    let first = history.first()?.score;
    let last = history.last()?.score;
    let total: u64 = history.iter().map(|e| e.score as u64).sum();
    let best = history.iter().map(|e| e.score).max().unwrap_or(0);

    Some(PronunciationStats {
        total_sessions: history.len(),
        average_score: (total as f64 / history.len() as f64).round() as u32,
        last_score: last,
        improvement: if history.len() > 1 { last as i64 - first as i64 } else { 0 },
        best_score: best,
    })
}
