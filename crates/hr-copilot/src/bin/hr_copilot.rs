//! HR Copilot command line
//!
//! Run with: cargo run -p hr-copilot -- ask "how many casual leaves do I have" --emp-id E001

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hr_copilot::employee::{CsvEmployeeStore, EmployeeLookup};
use hr_copilot::index::persistence;
use hr_copilot::ingestion::{IngestPipeline, LopdfExtractor, TextChunker};
use hr_copilot::providers::{build_embedder, build_llm};
use hr_copilot::{IndexStore, Orchestrator, QueryClassifier, RagConfig, Retriever};

#[derive(Parser)]
#[command(name = "hr-copilot", version, about = "Answer HR questions from employee records and policy documents")]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(short, long, env = "HR_COPILOT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the policy index from the policies directory and save it
    Ingest {
        /// Policies directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Add uploaded .txt or .pdf files to the saved index
    Upload {
        /// Files to add
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Check that the configured embedding and LLM providers respond
    Check,
    /// Answer a single question
    Ask {
        question: String,

        /// Employee ID of the person asking
        #[arg(long)]
        emp_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hr_copilot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load(cli.config.as_deref()).context("loading configuration")?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let embedder = build_embedder(&config)?;
    let store = IndexStore::new(
        embedder,
        config.retrieval.metric,
        config.embeddings.batch_size,
        config.provider_timeout(),
    );

    match cli.command {
        Command::Ingest { dir } => {
            let dir = dir.unwrap_or_else(|| config.paths.policies_dir.clone());
            let pipeline = ingest_pipeline(&config, store.clone())?;
            let report = pipeline
                .ingest_directory(&dir)
                .await
                .with_context(|| format!("ingesting {}", dir.display()))?;
            if report.chunks > 0 {
                store.save(&config.paths.vector_store).await?;
            }

            println!(
                "Indexed {} documents into {} chunks ({} failed)",
                report.documents,
                report.chunks,
                report.failure_count()
            );
            for failure in &report.failures {
                println!("  ✗ {}: {}", failure.source, failure.reason);
            }
        }
        Command::Upload { files } => {
            if persistence::exists(&config.paths.vector_store) {
                store.load(&config.paths.vector_store).await?;
            }
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                let data = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                uploads.push((name, data));
            }

            let pipeline = ingest_pipeline(&config, store.clone())?;
            let report = pipeline.ingest_uploads(&uploads).await?;
            if report.chunks > 0 {
                store.save(&config.paths.vector_store).await?;
            }

            println!(
                "Added {} documents as {} chunks ({} failed)",
                report.documents,
                report.chunks,
                report.failure_count()
            );
            for failure in &report.failures {
                println!("  ✗ {}: {}", failure.source, failure.reason);
            }
        }
        Command::Check => {
            let llm = build_llm(&config)?;
            let embedder = store.embedder();
            let embedder_ok = embedder.health_check().await?;
            let llm_ok = llm.health_check().await?;

            println!(
                "{} embeddings ({}): {}",
                embedder.name(),
                embedder.model(),
                if embedder_ok { "ok" } else { "unreachable" }
            );
            println!(
                "{} generation ({}): {}",
                llm.name(),
                llm.model(),
                if llm_ok { "ok" } else { "unreachable" }
            );
            if !(embedder_ok && llm_ok) {
                std::process::exit(1);
            }
        }
        Command::Ask { question, emp_id } => {
            if persistence::exists(&config.paths.vector_store) {
                store.load(&config.paths.vector_store).await?;
            } else {
                tracing::warn!(
                    "No saved index at {}; run `hr-copilot ingest` first",
                    config.paths.vector_store.display()
                );
            }

            let employees: Arc<dyn EmployeeLookup> =
                match CsvEmployeeStore::from_path(&config.paths.employee_data) {
                    Ok(employees) => Arc::new(employees),
                    Err(e) => {
                        tracing::warn!(
                            "Employee data unavailable at {}: {}",
                            config.paths.employee_data.display(),
                            e
                        );
                        Arc::new(CsvEmployeeStore::default())
                    }
                };

            let orchestrator = Orchestrator::new(
                QueryClassifier::from_config(&config.routing),
                Retriever::new(store, config.provider_timeout()),
                employees,
                build_llm(&config)?,
                &config.retrieval,
                config.provider_timeout(),
            );

            let response = orchestrator
                .generate_response(&question, emp_id.as_deref(), &[])
                .await;

            println!("{}", response.answer);
            println!(
                "\n[routing] employee={} policy={} hybrid={} success={}",
                response.classification.needs_employee_data,
                response.classification.needs_policy_data,
                response.classification.is_hybrid,
                response.success
            );
            if !response.success {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn ingest_pipeline(config: &RagConfig, store: IndexStore) -> anyhow::Result<IngestPipeline> {
    let chunker = TextChunker::from_config(&config.chunking)?;
    Ok(IngestPipeline::new(chunker, store, Arc::new(LopdfExtractor)))
}
