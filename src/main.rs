use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lexrag_core::bootstrap::resolve_config_path;
use lexrag_core::evaluation::EvaluationReport;
use lexrag_core::{App, Config};

#[derive(Parser)]
#[command(name = "lexrag", version, about = "Ask grounded questions about legal documents")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the vector collection from the config
    #[arg(long, global = true)]
    collection: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed and index the extracted text of a document
    Ingest {
        #[arg(long)]
        document_id: i64,
        /// Plain-text file holding the document's extracted text
        file: PathBuf,
        /// Delete the document's existing chunks first
        #[arg(long)]
        replace: bool,
    },
    /// Answer a question from indexed chunks
    Ask {
        question: String,
        #[arg(long)]
        document_id: Option<i64>,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Summarize one indexed document
    Summarize {
        #[arg(long)]
        document_id: i64,
        #[arg(long)]
        max_chunks: Option<usize>,
    },
    /// Remove every indexed chunk of a document
    Delete {
        #[arg(long)]
        document_id: i64,
    },
    /// Answer a question and score retrieval and answer quality
    Evaluate {
        question: String,
        #[arg(long)]
        document_id: Option<i64>,
        #[arg(long)]
        top_k: Option<usize>,
        /// Reference answer to compare the generated answer with
        #[arg(long)]
        expected: Option<String>,
        /// Print a plain-text report instead of JSON
        #[arg(long)]
        report: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    if let Some(collection) = cli.collection {
        config.vector_store.collection = collection;
        config.validate()?;
    }
    init_subscriber(&config.log_level);
    tracing::debug!(path = %config_path.display(), "configuration loaded");

    let app = App::from_config(config)?;
    run(&app, cli.command).await
}

async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Ingest {
            document_id,
            file,
            replace,
        } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let pipeline = app.pipeline();
            let report = if replace {
                pipeline.reindex(document_id, &text, None).await?
            } else {
                pipeline.ingest(document_id, &text, None).await?
            };
            print_json(&report)
        }
        Command::Ask {
            question,
            document_id,
            top_k,
        } => {
            let top_k = top_k.unwrap_or(app.config().answer.top_k);
            let response = app
                .composer()?
                .answer(&question, document_id, top_k)
                .await?;
            print_json(&response)
        }
        Command::Summarize {
            document_id,
            max_chunks,
        } => {
            let max_chunks = max_chunks.unwrap_or(app.config().answer.summary_chunks);
            let response = app.composer()?.summarize(document_id, max_chunks).await?;
            print_json(&response)
        }
        Command::Delete { document_id } => {
            app.index().delete_document(document_id, None).await?;
            print_json(&serde_json::json!({ "document_id": document_id, "deleted": true }))
        }
        Command::Evaluate {
            question,
            document_id,
            top_k,
            expected,
            report,
        } => {
            let top_k = top_k.unwrap_or(app.config().answer.top_k);
            let response = app
                .composer()?
                .answer(&question, document_id, top_k)
                .await?;
            let evaluation = match expected {
                Some(expected) => {
                    EvaluationReport::evaluate_with_expected(
                        &question,
                        &response,
                        &expected,
                        app.embedder(),
                    )
                    .await?
                }
                None => EvaluationReport::evaluate(&question, &response),
            };
            if report {
                println!("{}", evaluation.render());
                Ok(())
            } else {
                print_json(&serde_json::json!({
                    "response": response,
                    "evaluation": evaluation,
                }))
            }
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_subscriber(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
