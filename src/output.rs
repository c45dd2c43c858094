use crate::models::{EvaluationReport, QuestionResult};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print an evaluation report in the specified format
pub fn print_report(report: &EvaluationReport, format: OutputFormat) {
    match format {
        OutputFormat::Plain => print_plain(report),
        OutputFormat::Json => print_json(report),
    }
}

/// Print a report in plain text format
fn print_plain(report: &EvaluationReport) {
    println!("=== RAG Endpoint Evaluation ===");
    println!();
    println!(
        "Overall score: {:.1} ({})",
        report.overall_score,
        report.rating()
    );
    println!("Generated:     {}", report.timestamp.to_rfc3339());
    println!(
        "Endpoint:      {}",
        if report.config.demo {
            "(demo mode)"
        } else {
            &report.config.endpoint
        }
    );
    println!();

    println!("SUMMARY");
    println!("-------");
    println!(
        "Success rate:       {:.0}%",
        report.metrics.success_rate * 100.0
    );
    println!(
        "Hallucination rate: {:.0}%",
        report.metrics.hallucination_rate * 100.0
    );
    println!(
        "Avg accuracy:       {:.0}%",
        report.metrics.avg_accuracy * 100.0
    );
    println!(
        "Avg relevance:      {:.0}%",
        report.metrics.avg_relevance * 100.0
    );
    println!(
        "Avg response time:  {:.2}s",
        report.metrics.avg_response_time_secs
    );
    println!();

    println!("PERFORMANCE BY CATEGORY");
    println!("-----------------------");
    println!(
        "{:<25} {:<10} {:<10} {:<10} {:<10}",
        "Category", "Questions", "Passed", "Accuracy", "Avg Time"
    );
    println!("{}", "-".repeat(65));
    for category in &report.categories {
        println!(
            "{:<25} {:<10} {:<10} {:<10} {:<10}",
            category.category,
            category.question_count,
            format!("{}/{}", category.passed_count, category.question_count),
            format!("{:.0}%", category.avg_accuracy * 100.0),
            format!("{:.2}s", category.avg_response_time_secs),
        );
    }
    println!();

    println!("DETAILED RESULTS");
    println!("----------------");
    for category in &report.categories {
        println!("[{}]", category.category);
        for result in report
            .question_results
            .iter()
            .filter(|r| r.question.category == category.category)
        {
            print_question_result(result);
        }
    }
}

fn print_question_result(result: &QuestionResult) {
    let status = if result.passed { "PASS" } else { "FAIL" };
    println!("  {} {} ({:.0}% accuracy)", status, result.question.id, result.metrics.accuracy * 100.0);
    println!("    Question: {}", result.question.text);
    println!("    Answer:   {}", result.answer);
    println!(
        "    Metrics:  relevance {:.0}%, completeness {:.0}%, time {:.2}s, hallucination {}",
        result.metrics.relevance * 100.0,
        result.metrics.completeness * 100.0,
        result.metrics.response_time_secs,
        if result.metrics.hallucination { "yes" } else { "no" },
    );
    for note in &result.notes {
        println!("    Note:     {}", note);
    }
    println!();
}

/// Print a report in JSON format
fn print_json(report: &EvaluationReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing report to JSON: {}", e),
    }
}
