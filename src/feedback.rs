//! Learner-facing pronunciation feedback. Messages are shown in the app's Vietnamese UI.

pub const BASIC_PRACTICE: &str = "Cần luyện tập thêm về phát âm cơ bản";
pub const FAIRLY_GOOD: &str = "Phát âm khá tốt, cần chú ý một số âm";
pub const VERY_GOOD: &str = "Phát âm rất tốt!";
pub const SPEAK_CLEARLY: &str = "Hãy nói rõ ràng và chậm hơn";
pub const WATCH_SOUNDS_PREFIX: &str = "Chú ý phát âm các âm: ";
pub const BASIC_SOUNDS_FALLBACK: &str = "các âm cơ bản";

pub const DRILL_SYLLABLES: &str = "Luyện tập phát âm từng âm tiết riêng biệt";
pub const LISTEN_AND_REPEAT: &str = "Nghe và lặp lại theo mẫu nhiều lần";
pub const SLOW_AND_CLEAR: &str = "Nói chậm và rõ ràng hơn";
pub const FOCUS_EACH_SOUND: &str = "Tập trung vào việc phát âm đúng từng âm";
pub const PRACTICE_SIMILAR: &str = "Luyện tập thường xuyên với các từ tương tự";
pub const RECORD_AND_COMPARE: &str = "Ghi âm và so sánh với mẫu chuẩn";

pub struct FeedbackGenerator;

impl FeedbackGenerator {
    /// Feedback lines for an attempt. `accuracy` and `confidence` are in `[0, 1]`;
    /// `expected` and `recognized` are the raw, unnormalized texts.
    pub fn feedback(accuracy: f64, confidence: f64, expected: &str, recognized: &str) -> Vec<String> {
        let mut feedback = Vec::new();

        let band = if accuracy < 0.5 {
            BASIC_PRACTICE
        } else if accuracy < 0.8 {
            FAIRLY_GOOD
        } else {
            VERY_GOOD
        };
        feedback.push(band.to_string());

        if confidence < 0.6 {
            feedback.push(SPEAK_CLEARLY.to_string());
        }

        if expected != recognized {
            feedback.push(format!(
                "{}{}",
                WATCH_SOUNDS_PREFIX,
                Self::difficult_sounds(expected, recognized)
            ));
        }

        feedback
    }

    pub fn improvements(accuracy: f64, confidence: f64) -> Vec<String> {
        let mut improvements = Vec::new();

        if accuracy < 0.7 {
            improvements.push(DRILL_SYLLABLES.to_string());
            improvements.push(LISTEN_AND_REPEAT.to_string());
        }

        if confidence < 0.7 {
            improvements.push(SLOW_AND_CLEAR.to_string());
            improvements.push(FOCUS_EACH_SOUND.to_string());
        }

        improvements.push(PRACTICE_SIMILAR.to_string());
        improvements.push(RECORD_AND_COMPARE.to_string());

        improvements
    }

    /// Expected characters that differ position-by-position from the transcript,
    /// deduplicated in first-seen order and comma-joined.
    pub fn difficult_sounds(expected: &str, recognized: &str) -> String {
        let mut difficult: Vec<char> = Vec::new();

        for (e, r) in expected.chars().zip(recognized.chars()) {
            if e != r && !difficult.contains(&e) {
                difficult.push(e);
            }
        }

        if difficult.is_empty() {
            return BASIC_SOUNDS_FALLBACK.to_string();
        }

        difficult
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
