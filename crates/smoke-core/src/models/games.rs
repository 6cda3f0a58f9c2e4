//! Game catalogue and canned metrics used to build realistic payloads.

use super::payloads::{SessionBlock, SessionMetrics, SessionSchedule};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::{json, Value};

/// Game ids served by the core UX shell (game intro, end screen, persistence).
pub const CORE_GAMES: [&str; 8] = [
    "schulte",
    "twinwords",
    "parimpar",
    "memorydigits",
    "lettersgrid",
    "wordsearch",
    "anagrams",
    "runningwords",
];

/// Game ids introduced with the word-bank games.
pub const PHASE3_GAMES: [&str; 4] = ["running_words", "letters_grid", "word_search", "anagrams"];

/// Game ids that existed before the word-bank games.
pub const REGRESSION_GAMES: [&str; 3] = ["memory_digits", "schulte", "par_impar"];

/// Metrics for a core UX game; unknown ids get a generic record.
pub fn core_metrics(game: &str) -> Value {
    match game {
        "schulte" => json!({
            "tableSize": "5x5",
            "numbersFound": 25,
            "averageTimePerNumber": 1200,
            "errors": 2
        }),
        "twinwords" => json!({
            "pairsFound": 8,
            "accuracy": 0.85,
            "averageResponseTime": 1800,
            "fastPairs": 3
        }),
        "parimpar" => json!({
            "numbersSelected": 15,
            "correctSelections": 13,
            "accuracy": 0.87,
            "comboStreak": 5
        }),
        "memorydigits" => json!({
            "sequenceLength": 6,
            "correctSequences": 4,
            "accuracy": 0.67,
            "averageRecallTime": 3000
        }),
        "lettersgrid" => json!({
            "gridSize": "8x8",
            "targetsFound": 12,
            "accuracy": 0.92,
            "averageTimePerTarget": 2500
        }),
        "wordsearch" => json!({
            "gridSize": "10x10",
            "wordsFound": 6,
            "totalWords": 8,
            "accuracy": 0.75,
            "averageTimePerWord": 8000
        }),
        "anagrams" => json!({
            "wordsFormed": 5,
            "averageWordLength": 6,
            "accuracy": 0.83,
            "averageTimePerWord": 12000
        }),
        "runningwords" => json!({
            "wordsRead": 25,
            "accuracy": 0.88,
            "averageReadingSpeed": 350,
            "comprehensionScore": 0.85
        }),
        _ => json!({"score": 120, "accuracy": 0.8}),
    }
}

/// Metrics for the word-bank games; older ids get the legacy record.
pub fn phase3_metrics(game: &str) -> Value {
    match game {
        "running_words" => json!({
            "wordsPerLine": 5,
            "wordExposureMs": 250,
            "askedLine": 3,
            "correct": true,
            "rt_ms": 2500,
            "totalRounds": 8,
            "accuracy": 0.875,
            "meanRT": 2200
        }),
        "letters_grid" => json!({
            "N": 8,
            "targets": ["a", "e"],
            "hits": 12,
            "falsePositives": 2,
            "misses": 1,
            "exposure_ms": 8000,
            "mean_rt_ms": 1800,
            "totalScreens": 6,
            "accuracy": 0.85
        }),
        "word_search" => json!({
            "gridSize": "10x10",
            "wordsShown": 25,
            "wordsFound": 22,
            "invalidSelections": 3,
            "time_per_word_ms": 4500,
            "totalRounds": 5,
            "accuracy": 0.88
        }),
        "anagrams" => json!({
            "length": 6,
            "timeLimit_ms": 8000,
            "solved": 12,
            "expired": 2,
            "rt_ms": 5500,
            "totalAnagrams": 14,
            "accuracy": 0.857,
            "bestStreak": 7
        }),
        _ => json!({
            "total_rounds": 10,
            "final_level": 5,
            "average_rt": 1500,
            "accuracy": 0.8
        }),
    }
}

/// Metrics reported by a finished Par/Impar game.
pub fn parimpar_metrics() -> Value {
    json!({
        "total_rounds": 8,
        "final_level": 5,
        "average_accuracy": 0.87,
        "average_time": 2400,
        "total_hits": 45,
        "total_false_positives": 6,
        "best_round_score": 25
    })
}

/// Extended Par/Impar metrics used to check that every field is preserved.
pub fn parimpar_full_metrics() -> Value {
    json!({
        "total_rounds": 12,
        "final_level": 8,
        "average_accuracy": 0.92,
        "average_time": 1800,
        "total_hits": 68,
        "total_false_positives": 4,
        "best_round_score": 30,
        "grid_sizes_used": [9, 16, 25],
        "rules_alternated": ["even", "odd"],
        "level_ups": 3,
        "perfect_rounds": 5
    })
}

/// A session template: planned blocks and total minutes.
#[derive(Debug, Clone, Copy)]
pub struct SessionTemplate {
    pub name: &'static str,
    pub minutes: u32,
    pub blocks: &'static [(&'static str, u32, &'static str)],
}

pub const SESSION_TEMPLATES: [SessionTemplate; 3] = [
    SessionTemplate {
        name: "short",
        minutes: 15,
        blocks: &[
            ("par_impar", 2, "Par/Impar"),
            ("rsvp", 5, "Lectura RSVP"),
            ("twin_words", 4, "Palabras Gemelas"),
            ("schulte", 4, "Tabla Schulte"),
        ],
    },
    SessionTemplate {
        name: "medium",
        minutes: 30,
        blocks: &[
            ("par_impar", 3, "Par/Impar"),
            ("rsvp", 10, "Lectura RSVP"),
            ("word_search", 7, "Sopa de Letras"),
            ("twin_words", 5, "Palabras Gemelas"),
            ("schulte", 5, "Tabla Schulte"),
        ],
    },
    SessionTemplate {
        name: "long",
        minutes: 60,
        blocks: &[
            ("par_impar", 5, "Calentamiento"),
            ("rsvp", 20, "Lectura Intensiva"),
            ("running_words", 10, "Memoria Secuencial"),
            ("letters_grid", 10, "Atención Visual"),
            ("twin_words", 10, "Discriminación"),
            ("cooldown", 5, "Resumen y Metas"),
        ],
    },
];

fn minutes_ms(minutes: u32) -> u64 {
    u64::from(minutes) * 60 * 1000
}

impl SessionTemplate {
    /// Build a completed session for this template starting at `started_at`.
    ///
    /// Block `i` scores `75 + 10 * i` and is played for its full duration.
    pub fn completed_session(&self, user_id: &str, started_at: DateTime<Utc>) -> SessionSchedule {
        let blocks: Vec<SessionBlock> = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, (game, duration, title))| SessionBlock {
                game: game.to_string(),
                duration: *duration,
                title: title.to_string(),
                status: "completed".into(),
                score: 75 + 10 * i as u32,
                level_start: 1,
                level_end: 2,
                played_ms: minutes_ms(*duration),
                planned_ms: minutes_ms(*duration),
            })
            .collect();
        let total_score = blocks.iter().map(|b| b.score).sum();
        let completed_at = started_at + ChronoDuration::minutes(i64::from(self.minutes));

        SessionSchedule {
            user_id: user_id.to_string(),
            template_type: self.name.to_string(),
            metrics: SessionMetrics {
                blocks,
                total_ms: minutes_ms(self.minutes),
                total_score,
                avg_level: 1.5,
                quits: 0,
                paused_ms: 2000,
                completed: true,
            },
            started_at: started_at.to_rfc3339(),
            completed_at: completed_at.to_rfc3339(),
        }
    }
}

/// The two-block medium session posted by the schedules check.
pub fn medium_session_sample(user_id: &str, now: DateTime<Utc>) -> SessionSchedule {
    let block = |game: &str, minutes: u32, title: &str, score: u32, start: u32| SessionBlock {
        game: game.to_string(),
        duration: minutes,
        title: title.to_string(),
        status: "completed".into(),
        score,
        level_start: start,
        level_end: start + 1,
        played_ms: minutes_ms(minutes),
        planned_ms: minutes_ms(minutes),
    };

    SessionSchedule {
        user_id: user_id.to_string(),
        template_type: "medium".into(),
        metrics: SessionMetrics {
            blocks: vec![
                block("par_impar", 3, "Par/Impar", 85, 1),
                block("rsvp", 10, "Lectura RSVP", 120, 2),
            ],
            total_ms: minutes_ms(30),
            total_score: 205,
            avg_level: 2.5,
            quits: 0,
            paused_ms: 5000,
            completed: true,
        },
        started_at: now.to_rfc3339(),
        completed_at: now.to_rfc3339(),
    }
}
