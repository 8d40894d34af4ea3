use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use orah_core::config::Config;
use orah_core::vault::{EnvVaultProvider, VaultProvider};
use orah_llm::openai::OpenAiProvider;
use orah_notes::combiner::source_label;
use orah_notes::loader::load_documents;
use orah_notes::transcript::part_label;
use orah_notes::{ChunkSummarizer, NotesPipeline, TextChunk, TranscriptChunker, chunk_text};

#[derive(Parser)]
#[command(name = "orah", version)]
#[command(about = "Condense course material into study notes that fit a model's context")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize documents into labeled notes when they exceed the threshold
    Prepare {
        /// Topic the notes are prepared for
        #[arg(long)]
        topic: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show how a single file would be chunked, without calling a model
    Chunk {
        #[arg(long, value_enum, default_value_t = Profile::Document)]
        profile: Profile,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,

        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Profile {
    Document,
    Transcript,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)?;
    config.validate()?;

    match cli.command {
        Command::Prepare { topic, json, files } => {
            let vault: Box<dyn VaultProvider> = Box::new(EnvVaultProvider);
            config.resolve_secrets(vault.as_ref()).await?;
            run_prepare(&config, &topic, json, &files).await
        }
        Command::Chunk {
            profile,
            json,
            file,
        } => run_chunk(&config, profile, json, &file).await,
    }
}

async fn run_prepare(
    config: &Config,
    topic: &str,
    json: bool,
    files: &[PathBuf],
) -> anyhow::Result<()> {
    let documents = load_documents(files)
        .await
        .context("failed to load input documents")?;

    let pipeline = NotesPipeline::new(
        ChunkSummarizer::new(
            build_provider(config)?,
            config.notes.summarizer_config(config.llm.temperature),
        ),
        config.notes.pipeline_config(),
    );
    let notes = pipeline.prepare_notes(&documents, topic).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else {
        println!("{}", notes.text);
        eprintln!(
            "summarized: {}, tokens: {} -> {}, chunks: {}, truncated: {}",
            notes.was_summarized,
            notes.original_tokens,
            notes.final_tokens,
            notes.chunk_count,
            notes.truncated_chunks
        );
    }
    Ok(())
}

async fn run_chunk(
    config: &Config,
    profile: Profile,
    json: bool,
    file: &Path,
) -> anyhow::Result<()> {
    let mut documents = load_documents(&[file])
        .await
        .with_context(|| format!("failed to load {}", file.display()))?;
    let Some(document) = documents.pop() else {
        bail!("no document loaded from {}", file.display());
    };

    let chunks = match profile {
        Profile::Document => chunk_text(
            &document.text,
            config.notes.document.max_chunk_tokens,
            config.notes.document.overlap,
        ),
        Profile::Transcript => {
            TranscriptChunker::new(config.notes.transcript).chunk(&document.text)
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    let parts = chunks.len();
    for chunk in &chunks {
        println!("{}", chunk_header(profile, &document.name, chunk, parts));
        println!("{}\n", chunk.text);
    }
    Ok(())
}

fn chunk_header(profile: Profile, name: &str, chunk: &TextChunk, parts: usize) -> String {
    let label = match profile {
        Profile::Document => source_label(name, chunk.index, parts),
        Profile::Transcript => format!("[{}]", part_label(chunk.index, parts)),
    };
    format!(
        "{label} ~{} tokens, bytes {}..{}",
        chunk.estimated_tokens, chunk.start_char, chunk.end_char
    )
}

fn build_provider(config: &Config) -> anyhow::Result<OpenAiProvider> {
    let Some(api_key) = config.secrets.openai_api_key.as_ref() else {
        bail!("ORAH_OPENAI_API_KEY is not set");
    };
    Ok(OpenAiProvider::new(
        api_key.expose().to_owned(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.max_tokens,
    )
    .with_temperature(config.llm.temperature)
    .with_max_retries(config.llm.max_retries))
}

fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_owned();
    }
    if let Ok(path) = std::env::var("ORAH_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // stdout carries the notes
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
