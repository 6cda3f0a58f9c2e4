//! Request bodies sent to the Spiread API.
//!
//! Field names follow the API's own casing, which mixes camelCase (progress,
//! game runs) and snake_case (settings, session schedules).

use serde::Serialize;
use serde_json::Value;

/// Body of `POST /api/progress/save`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSave {
    pub user_id: String,
    pub game: String,
    pub progress: ProgressRecord,
}

/// Per-game progress as persisted by the game shell.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub last_level: u32,
    pub last_best_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rounds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rt: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Body of `POST /api/gameRuns`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRun {
    pub user_id: String,
    pub game: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Value>,
}

impl GameRun {
    pub fn new(user_id: &str, game: &str, score: u32) -> Self {
        Self {
            user_id: user_id.to_string(),
            game: game.to_string(),
            difficulty_level: None,
            duration_ms: None,
            score,
            metrics: None,
        }
    }

    pub fn level(mut self, level: u32) -> Self {
        self.difficulty_level = Some(level);
        self
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn metrics(mut self, metrics: Value) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Nested settings update used by the game shell.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedSettingsUpdate {
    pub user_id: String,
    pub settings: Value,
}

/// Flat settings row used by the reader and the i18n layer.
#[derive(Debug, Clone, Serialize)]
pub struct FlatSettingsUpdate {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub wpm_target: u32,
    pub chunk_size: u32,
    pub theme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_instructions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Value>,
}

/// Body of `POST /api/sessionSchedules`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSchedule {
    pub user_id: String,
    pub template_type: String,
    pub metrics: SessionMetrics,
    pub started_at: String,
    pub completed_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionMetrics {
    pub blocks: Vec<SessionBlock>,
    pub total_ms: u64,
    pub total_score: u32,
    pub avg_level: f64,
    pub quits: u32,
    pub paused_ms: u64,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBlock {
    pub game: String,
    pub duration: u32,
    pub title: String,
    pub status: String,
    pub score: u32,
    pub level_start: u32,
    pub level_end: u32,
    pub played_ms: u64,
    pub planned_ms: u64,
}

/// Body of `POST /api/ai/summarize`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    pub locale: String,
    pub user_id: String,
}

/// Body of `POST /api/ai/questions`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    pub locale: String,
    pub n: u32,
    pub user_id: String,
}
