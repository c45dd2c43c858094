use crate::config::EvaluationConfig;
use crate::questions::EvaluationQuestion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-question metric block produced by the scorer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionMetrics {
    /// Share of expected evidence found in the answer, boosted and capped
    pub relevance: f64,
    /// Weighted blend of relevance, completeness, and timing
    pub accuracy: f64,
    /// Answer length relative to the ground truth, floored at 0.5
    pub completeness: f64,
    /// Wall-clock time for the round trip, in seconds
    pub response_time_secs: f64,
    /// Rough token estimate for the answer
    pub token_estimate: u64,
    /// Whether any forbidden evidence appeared in the answer
    pub hallucination: bool,
}

/// Outcome for a single question in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    /// The question that was asked
    pub question: EvaluationQuestion,
    /// Extracted answer text
    pub answer: String,
    /// Response body as received, before extraction
    pub raw_response: serde_json::Value,
    /// Scored metrics
    pub metrics: QuestionMetrics,
    /// Whether the answer cleared the pass thresholds without errors
    pub passed: bool,
    /// Diagnostic notes collected while testing this question
    pub notes: Vec<String>,
}

/// Metrics averaged across a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub avg_relevance: f64,
    pub avg_accuracy: f64,
    pub avg_completeness: f64,
    pub avg_response_time_secs: f64,
    /// Passed questions over total questions
    pub success_rate: f64,
    /// Questions with a hallucination flag over total questions
    pub hallucination_rate: f64,
}

/// Per-category rollup, in first-seen category order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub question_count: usize,
    pub passed_count: usize,
    pub avg_accuracy: f64,
    pub avg_response_time_secs: f64,
}

/// Structured output of a completed evaluation run
///
/// Read-only once produced; presentation layers render it without mutating
/// it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Weighted overall score on a 0-100 scale
    pub overall_score: f64,
    /// Averages and rates across all questions
    pub metrics: AggregateMetrics,
    /// Category rollups in first-seen order
    pub categories: Vec<CategorySummary>,
    /// Individual results in question-bank order
    pub question_results: Vec<QuestionResult>,
    /// When the run finished
    pub timestamp: DateTime<Utc>,
    /// Snapshot of the configuration the run used
    pub config: EvaluationConfig,
}

impl EvaluationReport {
    /// Human rating bucket for the overall score
    pub fn rating(&self) -> &'static str {
        match self.overall_score {
            s if s >= 90.0 => "Excellent",
            s if s >= 80.0 => "Very Good",
            s if s >= 70.0 => "Good",
            s if s >= 60.0 => "Satisfactory",
            s if s >= 50.0 => "Needs Improvement",
            _ => "Poor",
        }
    }
}
