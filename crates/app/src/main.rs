use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use text2graph_core::{
    load_document, read_document, resolve_documents, ChunkingConfig, GraphExtractor,
    GraphPipeline, OllamaExtractor, OpenAiExtractor, TextChunker, DEFAULT_MAX_CHARS,
    DEFAULT_MAX_RETRIES, DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OLLAMA_MODEL, DEFAULT_OPENAI_ENDPOINT,
    DEFAULT_OPENAI_MODEL, DEFAULT_OVERLAP_CHARS,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "text2graph", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split a document into chunks and print them without extracting anything.
    Chunk {
        /// Path to the input text document.
        #[arg(long, short = 'f')]
        file_path: PathBuf,

        /// Maximum chunk size in characters.
        #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
        max_chars: usize,

        /// Characters of context carried over between consecutive chunks.
        #[arg(long, default_value_t = DEFAULT_OVERLAP_CHARS)]
        overlap_chars: usize,
    },
    /// Construct knowledge graphs from a document or a folder of documents.
    Construct {
        /// Path to a text document, or a folder searched recursively.
        #[arg(long, short = 'p')]
        path: PathBuf,

        /// Ontology file whose content is handed to the extractor verbatim.
        #[arg(long)]
        ontology: Option<PathBuf>,

        /// Extraction backend.
        #[arg(long, value_enum, default_value_t = Backend::OpenAi)]
        backend: Backend,

        /// Model name; defaults to the backend's standard model.
        #[arg(long)]
        model: Option<String>,

        /// Backend base URL; defaults to the backend's standard endpoint.
        #[arg(long)]
        endpoint: Option<String>,

        /// API key for the OpenAI backend.
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Retries per chunk after a retryable backend failure.
        #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
        max_retries: u32,

        /// Maximum chunk size in characters.
        #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
        max_chars: usize,

        /// Characters of context carried over between consecutive chunks.
        #[arg(long, default_value_t = DEFAULT_OVERLAP_CHARS)]
        overlap_chars: usize,

        /// Pretty print each chunk before processing.
        #[arg(long, default_value_t = false)]
        print_chunks: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    #[value(name = "openai")]
    OpenAi,
    #[value(name = "ollama")]
    Ollama,
}

fn print_chunk_banner(ordinal: usize, text: &str) {
    let banner = "=".repeat(30);
    println!("\n{banner}\nChunk {}\n{banner}\n{}\n", ordinal + 1, text.trim());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "text2graph boot"
    );

    match cli.command {
        Command::Chunk {
            file_path,
            max_chars,
            overlap_chars,
        } => {
            let chunker = TextChunker::new(ChunkingConfig {
                max_chars,
                overlap_chars,
            })
            .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            let content =
                read_document(&file_path).map_err(|error| anyhow::anyhow!(error.to_string()))?;
            let chunks = chunker
                .chunk(&content)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            for chunk in &chunks {
                print_chunk_banner(chunk.ordinal, &chunk.text);
            }

            println!("{} chunks from {}", chunks.len(), file_path.display());
        }
        Command::Construct {
            path,
            ontology,
            backend,
            model,
            endpoint,
            api_key,
            max_retries,
            max_chars,
            overlap_chars,
            print_chunks,
        } => {
            let ontology_description = match &ontology {
                Some(ontology_path) => std::fs::read_to_string(ontology_path).map_err(|error| {
                    anyhow::anyhow!("unable to read ontology {}: {error}", ontology_path.display())
                })?,
                None => String::new(),
            };

            let extractor: Box<dyn GraphExtractor + Send + Sync> = match backend {
                Backend::OpenAi => {
                    let api_key = match api_key.as_deref().map(str::trim) {
                        Some(key) if !key.is_empty() => key.to_string(),
                        _ => anyhow::bail!(
                            "an OpenAI API key is required: pass --api-key or set OPENAI_API_KEY"
                        ),
                    };
                    Box::new(
                        OpenAiExtractor::new(
                            endpoint.as_deref().unwrap_or(DEFAULT_OPENAI_ENDPOINT),
                            api_key,
                            model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL),
                        )
                        .map_err(|error| anyhow::anyhow!(error.to_string()))?
                        .with_max_retries(max_retries),
                    )
                }
                Backend::Ollama => Box::new(
                    OllamaExtractor::new(
                        endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_ENDPOINT),
                        model.as_deref().unwrap_or(DEFAULT_OLLAMA_MODEL),
                    )
                    .map_err(|error| anyhow::anyhow!(error.to_string()))?
                    .with_max_retries(max_retries),
                ),
            };

            let pipeline = GraphPipeline::new(
                ChunkingConfig {
                    max_chars,
                    overlap_chars,
                },
                extractor,
            )
            .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            let documents =
                resolve_documents(&path).map_err(|error| anyhow::anyhow!(error.to_string()))?;

            for document_path in documents {
                let (fingerprint, content) = match load_document(&document_path) {
                    Ok(loaded) => loaded,
                    Err(error) => {
                        warn!(path = %document_path.display(), reason = %error, "skipped document");
                        continue;
                    }
                };

                if print_chunks {
                    let chunks = pipeline
                        .chunker()
                        .chunk(&content)
                        .map_err(|error| anyhow::anyhow!(error.to_string()))?;
                    for chunk in &chunks {
                        print_chunk_banner(chunk.ordinal, &chunk.text);
                    }
                }

                info!(
                    document = %fingerprint.document_title,
                    checksum = %fingerprint.checksum,
                    chars = content.chars().count(),
                    "extracting knowledge graphs"
                );

                let report = pipeline
                    .run(&content, &ontology_description)
                    .await
                    .map_err(|error| anyhow::anyhow!(error.to_string()))?;

                for failure in &report.failures {
                    warn!(
                        chunk = failure.ordinal,
                        stage = failure.error.stage(),
                        reason = %failure.error,
                        "chunk extraction failed"
                    );
                }

                for chunk_graph in &report.graphs {
                    println!("chunk {} knowledge graph:", chunk_graph.ordinal);
                    println!("{}", serde_json::to_string_pretty(&chunk_graph.graph)?);
                }

                info!(
                    run_id = %report.run_id,
                    document = %fingerprint.document_title,
                    graphs = report.graphs.len(),
                    failures = report.failures.len(),
                    "run finished"
                );
                println!(
                    "{} of {} chunks produced a knowledge graph at {}",
                    report.graphs.len(),
                    report.chunk_count,
                    Utc::now().to_rfc3339()
                );
            }
        }
    }

    Ok(())
}
