use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use crate::app::App;
use crate::db::Db;
use crate::error::ProgressError;
use crate::flashcards::{MarkOutcome, SessionSummary};
use crate::models::{Card, StudyStats};
use crate::speech::{Alternative, SpeechResult, SpeechSettings, Voice, RECORDING_CUTOFF};
use crate::srs::Rating;

#[derive(Clone)]
pub struct ApiState {
    pub app: Arc<Mutex<App>>,
    pub db: Db,
}

pub fn app_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/pronunciation/analyze", post(analyze_pronunciation))
        .route("/api/pronunciation/stats", get(pronunciation_stats))
        .route("/api/pronunciation/settings", get(get_settings).put(put_settings))
        .route("/api/pronunciation/voice", post(pick_voice))
        .route("/api/flashcards/deck", post(load_deck))
        .route("/api/flashcards/flip", post(flip_card))
        .route("/api/flashcards/mark", post(mark_card))
        .route("/api/flashcards/due", get(due_cards))
        .route("/api/flashcards/stats", get(study_stats))
        .route("/api/flashcards/reset", post(reset_stats))
        .route("/api/progress/export", get(export_progress))
        .route("/api/progress/import", post(import_progress))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Flushes journaled store writes. On failure the writes go back into the
/// journal and are retried with the next flush.
async fn persist(state: &ApiState, app: &mut App) {
    let changes = app.take_changes();
    if let Err(e) = state.db.apply(&changes).await {
        log::error!("Failed to persist {} changes, keeping them queued: {}", changes.len(), e);
        app.requeue_changes(changes);
    }
}

fn error_response(status: StatusCode, e: impl ToString) -> Response {
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}

/// Either a final transcript with its confidence, or the raw recognizer segments.
#[derive(Deserialize)]
struct AnalyzeRequest {
    text: String,
    #[serde(default)]
    recognized: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    segments: Vec<Alternative>,
}

impl AnalyzeRequest {
    fn speech_result(self) -> (String, SpeechResult) {
        let speech = if self.segments.is_empty() {
            SpeechResult {
                recognized: self.recognized,
                confidence: self.confidence,
                alternatives: Vec::new(),
            }
        } else {
            SpeechResult::from_segments(self.segments)
        };
        (self.text, speech)
    }
}

async fn analyze_pronunciation(
    State(state): State<ApiState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Response {
    let (text, speech) = payload.speech_result();
    let mut app = state.app.lock().await;

    match app.analyze_pronunciation(&text, &speech.recognized, speech.confidence, Utc::now()) {
        Ok(analysis) => {
            persist(&state, &mut app).await;
            Json(analysis).into_response()
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, e),
    }
}

async fn pronunciation_stats(State(state): State<ApiState>) -> impl IntoResponse {
    let mut app = state.app.lock().await;
    Json(app.pronunciation_stats())
}

async fn get_settings(State(state): State<ApiState>) -> impl IntoResponse {
    let app = state.app.lock().await;
    Json(app.speech_settings())
}

async fn put_settings(
    State(state): State<ApiState>,
    Json(settings): Json<SpeechSettings>,
) -> impl IntoResponse {
    let mut app = state.app.lock().await;
    let saved = app.update_speech_settings(settings);
    persist(&state, &mut app).await;
    Json(saved)
}

#[derive(Deserialize)]
struct VoiceRequest {
    #[serde(default)]
    voices: Vec<Voice>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceResponse {
    voice: Option<Voice>,
    recording_cutoff_ms: u64,
}

/// Picks a synthesis voice from the list the browser reports.
async fn pick_voice(
    State(state): State<ApiState>,
    Json(payload): Json<VoiceRequest>,
) -> impl IntoResponse {
    let app = state.app.lock().await;
    Json(VoiceResponse {
        voice: app.pick_voice(&payload.voices),
        recording_cutoff_ms: RECORDING_CUTOFF.as_millis() as u64,
    })
}

#[derive(Deserialize)]
struct DeckRequest {
    #[serde(default)]
    cards: Vec<Card>,
    /// When set, `cards`/`kanji`/`grammar` are mixed into one capped deck.
    #[serde(default)]
    mixed: bool,
    #[serde(default)]
    kanji: Vec<Card>,
    #[serde(default)]
    grammar: Vec<Card>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeckResponse {
    cards: Vec<Card>,
    position: usize,
    total: usize,
}

fn deck_response(app: &App) -> DeckResponse {
    let (position, total) = app.session.progress();
    DeckResponse {
        cards: app.session.deck().to_vec(),
        position,
        total,
    }
}

async fn load_deck(
    State(state): State<ApiState>,
    Json(payload): Json<DeckRequest>,
) -> impl IntoResponse {
    let mut app = state.app.lock().await;
    if payload.mixed {
        app.mix_decks(payload.cards, payload.kanji, payload.grammar);
    } else {
        app.load_deck(payload.cards);
    }
    Json(deck_response(&app))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FlipResponse {
    card: Option<Card>,
    flipped: bool,
}

async fn flip_card(State(state): State<ApiState>) -> impl IntoResponse {
    let mut app = state.app.lock().await;
    app.flip();
    Json(FlipResponse {
        card: app.session.current().cloned(),
        flipped: app.session.is_flipped(),
    })
}

#[derive(Deserialize)]
struct MarkRequest {
    rating: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkResponse {
    flipped_only: bool,
    next_review: Option<DateTime<Utc>>,
    difficulty: Option<f64>,
    stats: StudyStats,
    summary: Option<SessionSummary>,
}

async fn mark_card(
    State(state): State<ApiState>,
    Json(payload): Json<MarkRequest>,
) -> Response {
    let mut app = state.app.lock().await;
    let rating = Rating::parse(&payload.rating);

    let response = match app.mark(rating, Utc::now()) {
        MarkOutcome::NoCard => {
            return error_response(StatusCode::CONFLICT, "No card loaded");
        }
        MarkOutcome::Flipped => MarkResponse {
            flipped_only: true,
            next_review: None,
            difficulty: None,
            stats: app.study_stats(),
            summary: None,
        },
        MarkOutcome::Reviewed { outcome, summary } => MarkResponse {
            flipped_only: false,
            next_review: Some(outcome.schedule.next_review),
            difficulty: Some(outcome.performance.difficulty),
            stats: app.study_stats(),
            summary,
        },
    };

    persist(&state, &mut app).await;
    Json(response).into_response()
}

async fn due_cards(State(state): State<ApiState>) -> impl IntoResponse {
    let app = state.app.lock().await;
    Json(app.due_cards(Utc::now()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(flatten)]
    stats: StudyStats,
    accuracy: u32,
}

async fn study_stats(State(state): State<ApiState>) -> impl IntoResponse {
    let app = state.app.lock().await;
    let stats = app.study_stats();
    Json(StatsResponse { stats, accuracy: stats.accuracy() })
}

async fn reset_stats(State(state): State<ApiState>) -> impl IntoResponse {
    let mut app = state.app.lock().await;
    app.reset_stats();
    persist(&state, &mut app).await;
    StatusCode::NO_CONTENT
}

async fn export_progress(State(state): State<ApiState>) -> impl IntoResponse {
    let app = state.app.lock().await;
    (
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        app.export_progress(),
    )
}

async fn import_progress(State(state): State<ApiState>, body: String) -> Response {
    let mut app = state.app.lock().await;

    match app.import_progress(&body) {
        Ok(blob) => {
            persist(&state, &mut app).await;
            Json(serde_json::json!({ "imported": true, "version": blob.version })).into_response()
        }
        Err(e @ ProgressError::UnsupportedVersion { .. }) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e),
    }
}
