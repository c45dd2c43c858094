use clap::Parser;
use std::path::PathBuf;

use rag_endpoint_eval::config::EvaluationConfig;
use rag_endpoint_eval::output::{self, OutputFormat};
use rag_endpoint_eval::runner::Runner;

/// RAG Endpoint Evaluation CLI - probe a question-answering endpoint with a
/// fixed test battery and score the answers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    config_file: PathBuf,

    /// Output format: plain or json
    #[arg(short, long, default_value = "plain")]
    output: OutputFormat,

    /// Run offline with simulated answers instead of contacting the endpoint
    #[arg(long)]
    demo: bool,

    /// Verbose output - show engine progress
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "rag_endpoint_eval=debug"
    } else {
        "rag_endpoint_eval=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let mut config = EvaluationConfig::from_file(&args.config_file)?;
    if args.demo {
        config.demo = true;
    }

    let report = Runner::new(config).run().await?;

    output::print_report(&report, args.output);

    Ok(())
}
