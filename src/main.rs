use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use topicmap::io::DEFAULT_CACHE_FILE;
use topicmap::llm::DEFAULT_MODEL;
use topicmap::stages::estimate_minutes;
use topicmap::{
    AnalysisConfig, AnthropicClient, AnthropicConfig, ChunkConfig, ChunkSet, ClassifyConfig,
    CleanConfig, ObservationCache, RenderConfig, SentimentClient, execute_render, load_transcript,
    run_pipeline,
};

#[derive(Parser)]
#[command(name = "topicmap")]
#[command(author, version, about = "Earnings call topic and sentiment mapping", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a transcript and write the topic reports
    Analyze {
        /// Input transcript file (plain text)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for topics.json, report.txt and treemap.svg
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Speaking rate used to estimate minutes
        #[arg(long, default_value = "155")]
        wpm: u32,

        /// Maximum number of distinct topics
        #[arg(long, default_value = "10")]
        max_topics: usize,

        /// Topic labels to register before classification starts
        #[arg(long, num_args = 1..)]
        custom_topics: Vec<String>,

        /// Classifier model
        #[arg(long, env = "TOPICMAP_MODEL", default_value = DEFAULT_MODEL)]
        model: String,

        /// Concurrent classification requests
        #[arg(long, env = "TOPICMAP_WORKERS", default_value = "4")]
        workers: usize,

        /// Minimum words per chunk
        #[arg(long, default_value = "40")]
        min_chunk_words: usize,

        /// Maximum words per chunk (0 for unbounded)
        #[arg(long, default_value = "180")]
        max_chunk_words: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "45")]
        timeout_secs: u64,

        /// Observation cache file (defaults to <output-dir>/llm_analysis_cache.json)
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Disable the observation cache
        #[arg(long)]
        no_cache: bool,

        /// Ignore a matching cache and classify again
        #[arg(long)]
        force_new: bool,

        /// Skip the treemap image
        #[arg(long)]
        no_svg: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show loader and chunker statistics without calling the classifier
    Inspect {
        /// Input transcript file (plain text)
        #[arg(short, long)]
        input: PathBuf,

        /// Minimum words per chunk
        #[arg(long, default_value = "40")]
        min_chunk_words: usize,

        /// Maximum words per chunk (0 for unbounded)
        #[arg(long, default_value = "180")]
        max_chunk_words: usize,

        /// Speaking rate used to estimate duration
        #[arg(long, default_value = "155")]
        wpm: u32,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Delete a saved observation cache
    ClearCache {
        /// Directory holding the default cache file
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Cache file to remove (defaults to <output-dir>/llm_analysis_cache.json)
        #[arg(long)]
        cache: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            output_dir,
            wpm,
            max_topics,
            custom_topics,
            model,
            workers,
            min_chunk_words,
            max_chunk_words,
            timeout_secs,
            cache,
            no_cache,
            force_new,
            no_svg,
            verbose,
        } => {
            setup_logging(verbose);
            let config = AnalysisConfig {
                words_per_minute: wpm,
                max_topics,
                custom_topics,
                model_name: model,
                max_chunk_workers: workers,
                chunk: chunk_config(min_chunk_words, max_chunk_words),
                request_timeout: Duration::from_secs(timeout_secs),
                force_refresh: force_new,
                ..Default::default()
            };
            let cache = (!no_cache).then(|| resolve_cache_path(&output_dir, cache));
            analyze(&input, &output_dir, &config, cache.as_deref(), !no_svg).await
        }
        Commands::Inspect {
            input,
            min_chunk_words,
            max_chunk_words,
            wpm,
            verbose,
        } => {
            setup_logging(verbose);
            inspect(&input, chunk_config(min_chunk_words, max_chunk_words), wpm)
        }
        Commands::ClearCache { output_dir, cache } => {
            setup_logging(false);
            let cache = resolve_cache_path(&output_dir, cache);
            if ObservationCache::clear(&cache)? {
                info!("Removed cache {:?}", cache);
            } else {
                info!("No cache at {:?}", cache);
            }
            Ok(())
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn chunk_config(min_words: usize, max_words: usize) -> ChunkConfig {
    ChunkConfig {
        min_words,
        max_words: (max_words > 0).then_some(max_words),
    }
}

/// Explicit cache path, or the default file inside `output_dir`
fn resolve_cache_path(output_dir: &Path, cache: Option<PathBuf>) -> PathBuf {
    cache.unwrap_or_else(|| output_dir.join(DEFAULT_CACHE_FILE))
}

async fn analyze(
    input: &Path,
    output_dir: &Path,
    config: &AnalysisConfig,
    cache: Option<&Path>,
    svg: bool,
) -> Result<()> {
    config.validate()?;

    let api_config = AnthropicConfig::from_env(Some(config.model_name.as_str()))?;
    let client = SentimentClient::new(AnthropicClient::new(api_config), ClassifyConfig::from(config));

    let output = run_pipeline(input, &client, config, cache)
        .await
        .context("Analysis failed")?;

    info!("Stage 4: Rendering output...");
    let render_config = RenderConfig {
        generate_svg: svg,
        ..Default::default()
    };
    let result = execute_render(
        &output.table,
        &config.model_name,
        output.transcript.source.as_deref(),
        output.metadata(config),
        output_dir,
        &render_config,
    )?;

    for path in [result.json_path, result.text_path, result.svg_path]
        .into_iter()
        .flatten()
    {
        info!("Wrote {:?}", path);
    }

    info!(
        "Complete: {} topics from {} chunks ({} dropped), {:.1} min total",
        output.table.len(),
        output.chunk_count,
        output.outcome.dropped_count(),
        output.table.total_minutes()
    );

    Ok(())
}

fn inspect(input: &Path, chunk: ChunkConfig, wpm: u32) -> Result<()> {
    info!("Inspecting transcript from {:?}", input);
    let transcript = load_transcript(input, &CleanConfig::default())
        .context("Failed to load input transcript")?;
    let chunks = ChunkSet::from_transcript(&transcript, chunk)?;

    let sizes: Vec<usize> = chunks.iter().map(|c| c.word_count).collect();
    let total: usize = sizes.iter().sum();

    println!("Transcript Analysis");
    println!("===================");
    println!("Raw words: {}", transcript.raw.split_whitespace().count());
    println!("Cleaned words: {}", transcript.word_count());
    println!("Paragraphs: {}", transcript.paragraph_count());
    println!(
        "Estimated duration: {:.1} min at {} wpm",
        estimate_minutes(transcript.word_count(), wpm),
        wpm
    );
    println!();

    println!("Chunks");
    println!("------");
    println!("Total chunks: {}", sizes.len());
    println!("Words in chunks: {}", total);
    if let (Some(min), Some(max)) = (sizes.iter().min(), sizes.iter().max()) {
        println!(
            "Chunk size: min {}, max {}, avg {:.0}",
            min,
            max,
            total as f64 / sizes.len() as f64
        );
    }
    println!("Classifier requests needed: {}", sizes.len());

    Ok(())
}
