//! Learning logic behind the Nihongo study app: pronunciation scoring,
//! flashcard scheduling and progress storage.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod feedback;
pub mod flashcards;
pub mod models;
pub mod progress;
pub mod pronunciation;
pub mod similarity;
pub mod speech;
pub mod srs;
pub mod store;
