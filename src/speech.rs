//! Types shared with the browser's speech recognition and synthesis.
//!
//! Recording and playback happen client-side; this side only stores the
//! synthesis settings and picks a voice from the list the browser reports.

use crate::store::{load_json, save_json, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SETTINGS_KEY: &str = "pronunciation_settings";

/// Recording stops on its own after this long.
pub const RECORDING_CUTOFF: Duration = Duration::from_secs(10);

/// Candidate transcripts kept from one recognition result.
pub const MAX_ALTERNATIVES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechSettings {
    pub lang: String,
    pub rate: f64,
    pub pitch: f64,
    pub volume: f64,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            lang: "ja-JP".to_string(),
            rate: 0.8,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

impl SpeechSettings {
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        load_json(store, SETTINGS_KEY).unwrap_or_default()
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        save_json(store, SETTINGS_KEY, self);
    }

    /// Clamps values to the ranges the Web Speech API accepts.
    pub fn sanitized(mut self) -> Self {
        self.rate = self.rate.clamp(0.1, 10.0);
        self.pitch = self.pitch.clamp(0.0, 2.0);
        self.volume = self.volume.clamp(0.0, 1.0);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alternative {
    pub text: String,
    pub confidence: f64,
}

/// What the recognizer delivers once the learner stops speaking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeechResult {
    pub recognized: String,
    pub confidence: f64,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

impl SpeechResult {
    /// Joins the per-segment transcripts. Confidence comes from the first segment, 0 if none.
    pub fn from_segments(segments: Vec<Alternative>) -> Self {
        let recognized = segments.iter().map(|s| s.text.as_str()).collect::<String>();
        let confidence = segments.first().map(|s| s.confidence).unwrap_or(0.0);
        let alternatives = segments.into_iter().take(MAX_ALTERNATIVES).collect();
        Self {
            recognized,
            confidence: confidence.clamp(0.0, 1.0),
            alternatives,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub name: String,
    pub lang: String,
    #[serde(default)]
    pub local_service: bool,
}

/// Prefers a local `ja-JP` voice, then any Japanese-looking voice.
pub fn pick_japanese_voice(voices: &[Voice]) -> Option<&Voice> {
    let japanese: Vec<&Voice> = voices
        .iter()
        .filter(|v| {
            let name = v.name.to_lowercase();
            v.lang.starts_with("ja") || name.contains("japanese") || name.contains("japan")
        })
        .collect();

    japanese
        .iter()
        .find(|v| v.lang == "ja-JP" && v.local_service)
        .or_else(|| japanese.first())
        .copied()
}
