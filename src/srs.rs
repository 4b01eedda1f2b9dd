use crate::models::{CardPerformance, MAX_DIFFICULTY, MIN_DIFFICULTY};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Self-rated recall for a flashcard.
///
/// Keyboard shortcuts 1-4 map to Wrong, Again, Correct and Easy.
/// Anything the UI sends that we do not recognise becomes `Other`,
/// which schedules like Correct but does not count as a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Wrong,
    Again,
    Correct,
    Easy,
    #[serde(other)]
    Other,
}

impl Rating {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "wrong" => Rating::Wrong,
            "again" => Rating::Again,
            "correct" => Rating::Correct,
            "easy" => Rating::Easy,
            _ => Rating::Other,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Rating::Correct | Rating::Easy)
    }
}

/// Fixed review interval for a rating.
pub fn interval(rating: Rating) -> Duration {
    match rating {
        Rating::Wrong => Duration::minutes(1),
        Rating::Again => Duration::minutes(10),
        Rating::Correct => Duration::days(1),
        Rating::Easy => Duration::days(3),
        Rating::Other => Duration::days(1),
    }
}

/// Next review time using the fixed interval table.
pub fn schedule(rating: Rating, now: DateTime<Utc>) -> DateTime<Utc> {
    now + interval(rating)
}

/// Chooses review times. With `adaptive` off it is exactly [`schedule`];
/// with it on, the interval is divided by the card's difficulty weight so
/// hard cards (weight 2.0) come back twice as soon and easy ones (0.5) half as often.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler {
    pub adaptive: bool,
}

impl Scheduler {
    pub fn new(adaptive: bool) -> Self {
        Self { adaptive }
    }

    pub fn next_review(&self, rating: Rating, difficulty: f64, now: DateTime<Utc>) -> DateTime<Utc> {
        if !self.adaptive {
            return schedule(rating, now);
        }

        let weight = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
        let millis = interval(rating).num_milliseconds() as f64 / weight;
        now + Duration::milliseconds(millis.round() as i64)
    }
}

/// Applies one review to a card's performance record, creating it on first review.
///
/// Success rate above 0.8 lowers the difficulty weight by 0.1, below 0.5 raises it
/// by 0.1; the weight stays within `[0.5, 2.0]`.
pub fn update_performance(
    current: Option<CardPerformance>,
    card_id: &str,
    rating: Rating,
    now: DateTime<Utc>,
) -> CardPerformance {
    let mut performance = current.unwrap_or_else(|| CardPerformance::new(card_id, now));

    performance.attempts += 1;
    performance.last_reviewed = now;
    if rating.is_success() {
        performance.correct += 1;
    }

    let success_rate = performance.success_rate();
    let mut difficulty = performance.difficulty;
    if success_rate > 0.8 {
        difficulty -= 0.1;
    } else if success_rate < 0.5 {
        difficulty += 0.1;
    }

    // Keep the weight on tenths so repeated steps land exactly on the bounds.
    performance.difficulty = ((difficulty * 10.0).round() / 10.0).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);

    performance
}
