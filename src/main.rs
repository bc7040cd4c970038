//! Unified CLI for the Formula Student rules assistant.
//!
//! Subcommands cover index construction (`build-index`, `stats`) and the
//! four answering modes (`ask`, `quiz`, `eliminate`, `audit`). Every
//! answering command is locked to one `(season, competition)` scope and its
//! own on-disk index.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use llm_service::LlmService;
use rules_index::{ChunkValidator, RuleIndex, Scope, read_chunk_rows};
use rules_modes::{
    AnswerGenerator, AuditMode, EliminationMode, LlmGenerator, OptionStatus, QuizMode,
};
use rules_retrieval::{LlmEmbedder, RetrievalConfig, RuleRetriever, embed_missing};
use rules_validation::{AnswerMode, Verdict};

#[derive(Parser)]
#[command(
    name = "fs-rules",
    about = "Formula Student rules compliance and quiz-answering system",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Scope selection shared by every subcommand.
#[derive(Args)]
struct ScopeArgs {
    /// Season identifier (e.g. 2024).
    #[arg(long)]
    season: String,
    /// Competition identifier (e.g. FSG, FSAE).
    #[arg(long)]
    competition: String,
    /// Index directory; defaults to indices/{season}_{competition}.
    #[arg(long)]
    index_dir: Option<PathBuf>,
}

impl ScopeArgs {
    fn scope(&self) -> Scope {
        Scope::new(&self.season, &self.competition)
    }

    fn dir(&self) -> PathBuf {
        self.index_dir.clone().unwrap_or_else(|| {
            PathBuf::from("indices").join(format!("{}_{}", self.season, self.competition))
        })
    }
}

/// Retrieval tuning shared by the answering subcommands.
#[derive(Args)]
struct RetrievalArgs {
    /// Default number of chunks to retrieve.
    #[arg(long, default_value_t = 5)]
    top_k: usize,
    /// Hard ceiling on retrieved chunks.
    #[arg(long, default_value_t = 8)]
    max_k: usize,
    /// Relevance threshold (0..=1).
    #[arg(long, default_value_t = 0.5)]
    threshold: f32,
    /// Multiplier mapping the threshold into raw L2 distance.
    #[arg(long, default_value_t = 10.0)]
    distance_scale: f32,
}

impl RetrievalArgs {
    fn config(&self) -> RetrievalConfig {
        RetrievalConfig {
            top_k: self.top_k,
            max_k: self.max_k,
            similarity_threshold: self.threshold,
            distance_scale: self.distance_scale,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Answer a free-form question with citations and quotes.
    Ask {
        #[command(flatten)]
        scope: ScopeArgs,
        #[command(flatten)]
        retrieval: RetrievalArgs,
        /// Question to answer.
        #[arg(long)]
        question: String,
    },
    /// Answer a registration quiz question with a single choice token.
    Quiz {
        #[command(flatten)]
        scope: ScopeArgs,
        #[command(flatten)]
        retrieval: RetrievalArgs,
        /// Quiz question (may include inline options).
        #[arg(long)]
        question: String,
        /// Valid choices, comma-separated (e.g. A,B,C,D or Yes,No).
        #[arg(long)]
        choices: Option<String>,
        /// JSONL log file for detailed reasoning.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Analyze multiple-choice options and eliminate incorrect ones.
    Eliminate {
        #[command(flatten)]
        scope: ScopeArgs,
        #[command(flatten)]
        retrieval: RetrievalArgs,
        /// Question text, without options.
        #[arg(long)]
        question: String,
        /// Option texts, one per value.
        #[arg(long, required = true, num_args = 1..)]
        options: Vec<String>,
    },
    /// Full retrieval and reasoning trace for one question.
    Audit {
        #[command(flatten)]
        scope: ScopeArgs,
        #[command(flatten)]
        retrieval: RetrievalArgs,
        /// Question to audit.
        #[arg(long)]
        question: String,
        /// Optional JSON output file for the report.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build an index from a JSONL chunk file.
    BuildIndex {
        #[command(flatten)]
        scope: ScopeArgs,
        /// JSONL chunk file (one chunk per line, optional embeddings).
        #[arg(long)]
        chunks: PathBuf,
        /// Keep chunks that only have warnings instead of rejecting them.
        #[arg(long)]
        lenient: bool,
        /// Concurrent embedding requests.
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
    },
    /// Print statistics for an existing index.
    Stats {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Ask {
            scope,
            retrieval,
            question,
        } => run_ask(&scope, &retrieval, &question).await,
        Command::Quiz {
            scope,
            retrieval,
            question,
            choices,
            log,
        } => run_quiz(&scope, &retrieval, &question, choices.as_deref(), log).await,
        Command::Eliminate {
            scope,
            retrieval,
            question,
            options,
        } => run_eliminate(&scope, &retrieval, &question, options).await,
        Command::Audit {
            scope,
            retrieval,
            question,
            output,
        } => run_audit(&scope, &retrieval, &question, output).await,
        Command::BuildIndex {
            scope,
            chunks,
            lenient,
            concurrency,
        } => run_build_index(&scope, &chunks, !lenient, concurrency).await,
        Command::Stats { scope } => run_stats(&scope),
    }
}

fn load_generator(
    scope_args: &ScopeArgs,
    retrieval: &RetrievalArgs,
) -> anyhow::Result<AnswerGenerator> {
    let dir = scope_args.dir();
    let index = RuleIndex::load(&dir)
        .with_context(|| format!("loading index from {} (build it first?)", dir.display()))?;

    let service = Arc::new(LlmService::from_env().context("configuring LLM service")?);
    let (generation, embedding) = service.profiles();
    eprintln!(
        "Models: generation={}, embedding={}",
        generation.model, embedding.model
    );
    let retriever = RuleRetriever::new(
        Arc::new(index),
        Box::new(LlmEmbedder::new(Arc::clone(&service))),
        scope_args.scope(),
        retrieval.config(),
    )?;

    Ok(AnswerGenerator::new(
        retriever,
        Box::new(LlmGenerator::new(service)),
    ))
}

fn print_verdict(verdict: &Verdict) {
    if verdict.is_clean() {
        eprintln!("\n{} answer validated against retrieved rules", "✓".green());
        return;
    }
    eprintln!("\n{}", "Validation Warnings:".yellow().bold());
    for w in &verdict.warnings {
        eprintln!("  {} {}", "⚠".yellow(), w);
    }
}

async fn run_ask(
    scope: &ScopeArgs,
    retrieval: &RetrievalArgs,
    question: &str,
) -> anyhow::Result<()> {
    let generator = load_generator(scope, retrieval)?;

    println!("\nQuestion: {question}\n");
    let generated = generator.generate(question, AnswerMode::OpenQa).await?;

    let rule = "=".repeat(80);
    println!("{rule}\n{}\n{rule}", generated.answer);
    if !generated.citations.is_empty() {
        println!("\nCitations: {}", generated.citations.join(", "));
    }
    print_verdict(&generated.verdict);
    Ok(())
}

async fn run_quiz(
    scope: &ScopeArgs,
    retrieval: &RetrievalArgs,
    question: &str,
    choices: Option<&str>,
    log: Option<PathBuf>,
) -> anyhow::Result<()> {
    let generator = load_generator(scope, retrieval)?;
    let quiz = QuizMode::new(generator, log.clone());

    let answer = quiz.answer(question, choices).await?;
    // Quiz output is just the token; everything else goes to stderr/log.
    println!("{answer}");
    if let Some(log) = log {
        eprintln!("Detailed reasoning logged to: {}", log.display());
    }
    Ok(())
}

async fn run_eliminate(
    scope: &ScopeArgs,
    retrieval: &RetrievalArgs,
    question: &str,
    options: Vec<String>,
) -> anyhow::Result<()> {
    let generator = load_generator(scope, retrieval)?;
    let elimination = EliminationMode::new(generator);

    let report = elimination.analyze(question, &options).await?;

    let rule = "=".repeat(80);
    println!("\n{rule}\nOPTION ELIMINATION ANALYSIS\n{rule}");
    println!("\nQuestion: {question}\n");
    for a in &report.analysis {
        println!("{}) {}", a.option, a.text);
        let status = match a.status {
            OptionStatus::Correct => a.status.to_string().green(),
            OptionStatus::Incorrect => a.status.to_string().red(),
            OptionStatus::Uncertain => a.status.to_string().yellow(),
        };
        println!("   Status: {status}");
        let mut reasoning: String = a.reasoning.chars().take(200).collect();
        if a.reasoning.chars().count() > 200 {
            reasoning.push('…');
        }
        println!("   Reasoning: {reasoning}\n");
    }
    println!("{rule}\nRECOMMENDATION:\n{rule}\n{}\n", report.recommendation);
    print_verdict(&report.verdict);
    Ok(())
}

async fn run_audit(
    scope: &ScopeArgs,
    retrieval: &RetrievalArgs,
    question: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let generator = load_generator(scope, retrieval)?;
    let audit = AuditMode::new(generator);

    let report = audit.audit(question).await?;
    println!("{}", report.render());

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("writing report to {}", path.display()))?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

async fn run_build_index(
    scope_args: &ScopeArgs,
    chunks_path: &PathBuf,
    strict: bool,
    concurrency: usize,
) -> anyhow::Result<()> {
    let scope = scope_args.scope();
    println!("Building index for {scope} from {}", chunks_path.display());

    let rows = read_chunk_rows(chunks_path)
        .with_context(|| format!("reading chunks from {}", chunks_path.display()))?;
    if rows.is_empty() {
        bail!("no chunks found in {}", chunks_path.display());
    }

    let validator = ChunkValidator::new(150, 400, strict);
    let (kept, findings) =
        validator.validate_chunks(rows.iter().map(|r| r.chunk.clone()).collect());
    for f in &findings {
        eprintln!("  {} [{}] {}", "⚠".yellow(), f.chunk_id, f.message);
    }
    let kept_ids: HashSet<&str> = kept.iter().map(|c| c.chunk_id.as_str()).collect();
    let mut rows: Vec<_> = rows
        .into_iter()
        .filter(|r| kept_ids.contains(r.chunk.chunk_id.as_str()))
        .collect();
    if rows.is_empty() {
        bail!("all chunks rejected by validation");
    }

    let service = Arc::new(LlmService::from_env().context("configuring LLM service")?);
    let embedder = LlmEmbedder::new(service);

    let missing = rows.iter().filter(|r| r.embedding.is_none()).count();
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb.set_message(format!("embedding {missing} of {} chunks", rows.len()));

    embed_missing(&mut rows, &embedder, None, concurrency).await?;
    pb.finish_with_message("embeddings ready");

    let dim = rows
        .iter()
        .find_map(|r| r.embedding.as_ref().map(Vec::len))
        .context("no embeddings produced")?;

    let mut index = RuleIndex::with_scope(dim, scope);
    let (chunks, vectors): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .filter_map(|r| r.embedding.map(|v| (r.chunk, v)))
        .unzip();
    index.add(chunks, vectors)?;

    let dir = scope_args.dir();
    std::fs::create_dir_all(&dir)?;
    index.save(&dir)?;

    let stats = index.stats();
    println!(
        "{} {} chunks indexed (dim {}) at {}",
        "✓".green(),
        stats.total_chunks,
        dim,
        dir.display()
    );
    Ok(())
}

fn run_stats(scope_args: &ScopeArgs) -> anyhow::Result<()> {
    let dir = scope_args.dir();
    let index = RuleIndex::load(&dir)
        .with_context(|| format!("loading index from {}", dir.display()))?;
    let stats = index.stats();

    println!("Index: {}", dir.display());
    match index.scope() {
        Some(scope) => println!("Scope: {scope}"),
        None => println!("Scope: (unbound)"),
    }
    println!("Embedding dim: {}", index.dim());
    println!("Total chunks: {}", stats.total_chunks);
    println!("With clause id: {}", stats.with_clause_id);
    println!("With section title: {}", stats.with_section_title);
    println!("Tables: {}", stats.tables);
    Ok(())
}
