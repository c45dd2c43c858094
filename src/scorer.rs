use crate::models::QuestionMetrics;
use crate::questions::EvaluationQuestion;

/// Relevance given to answers when a question carries no expected evidence
const BASELINE_RELEVANCE: f64 = 0.1;

/// Score an answer against a question's evidence lists.
///
/// Pure keyword/heuristic scoring: the same inputs always produce the same
/// metrics, which keeps runs reproducible and the function trivially
/// testable. This is explicitly not a language-understanding judgment.
pub fn score(
    question: &EvaluationQuestion,
    answer: &str,
    response_time_secs: f64,
) -> QuestionMetrics {
    let lower_answer = answer.to_lowercase();
    let answer_len = answer.chars().count();

    let expected_matches = question
        .expected_evidence
        .iter()
        .filter(|keyword| lower_answer.contains(&keyword.to_lowercase()))
        .count();

    let mut relevance = if question.expected_evidence.is_empty() {
        BASELINE_RELEVANCE
    } else {
        let ratio = expected_matches as f64 / question.expected_evidence.len() as f64;
        (ratio * 1.2).min(1.0)
    };

    // Suspiciously short answers can match a keyword by accident
    if answer_len < 20 && question.expected_evidence.len() > 1 {
        relevance = (relevance * 0.7).max(BASELINE_RELEVANCE);
    }

    let hallucination = question
        .forbidden_evidence
        .iter()
        .any(|keyword| lower_answer.contains(&keyword.to_lowercase()));

    // Length-ratio proxy, floored so concise answers are not over-penalized
    let ground_truth_len = question
        .ground_truth
        .as_ref()
        .map(|gt| gt.chars().count())
        .unwrap_or(0);
    let completeness =
        (answer_len as f64 / ground_truth_len.max(100) as f64).clamp(0.5, 1.0);

    let time_score = if response_time_secs <= 3.0 {
        1.0
    } else if response_time_secs <= 5.0 {
        0.9
    } else if response_time_secs <= 10.0 {
        0.8
    } else {
        0.7
    };

    let accuracy_base = relevance * if hallucination { 0.3 } else { 1.0 };
    let accuracy = (accuracy_base * 0.7 + completeness * 0.2 + time_score * 0.1).clamp(0.0, 1.0);

    let word_count = answer.split_whitespace().count();
    let token_estimate = (word_count as f64 * 1.3).round() as u64;

    QuestionMetrics {
        relevance,
        accuracy,
        completeness,
        response_time_secs,
        token_estimate,
        hallucination,
    }
}

/// Pass rule applied on top of the metrics.
///
/// Any adapter or extraction error fails the question outright; otherwise
/// both relevance and accuracy must clear their thresholds.
pub fn passes(metrics: &QuestionMetrics, error_occurred: bool) -> bool {
    !error_occurred && metrics.relevance > 0.6 && metrics.accuracy > 0.7
}
