use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use docrag_core::types::{ChatMessage, QueryResponse};
use docrag_core::Config;
use docrag_rag::{AppContext, IngestContext};

#[derive(Parser)]
#[command(name = "docrag", version, about = "Ask questions about your own documents")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index every .txt, .pdf and .json file under a directory
    Index {
        /// Defaults to the configured documents directory
        #[arg(short, long)]
        directory: Option<PathBuf>,
    },
    /// Remove every indexed chunk
    Clear,
    /// Ask one question
    Query {
        question: String,
        /// Answer from the model alone, without retrieval
        #[arg(long)]
        no_rag: bool,
    },
    /// Multi-turn conversation without retrieval; `/exit` quits
    Chat,
    /// Copy a file into the documents directory and index it
    Upload { file: PathBuf },
    /// Show index size and the active generation backend
    Stats,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn print_response(response: &QueryResponse) {
    println!("{}", response.answer);
    if !response.sources.is_empty() {
        println!("\nSources:");
        for source in &response.sources {
            println!("  - {source}");
        }
    }
}

async fn ingestion(config: Config) -> Result<IngestContext> {
    IngestContext::initialize(config).await.context("starting ingestion")
}

async fn answering(config: Config) -> Result<AppContext> {
    AppContext::initialize(config).await.context("starting services")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load().context("loading configuration")?;

    match cli.command {
        Command::Index { directory } => {
            let ctx = ingestion(config).await?;
            let dir = directory.unwrap_or_else(|| ctx.pipeline.documents_dir().to_path_buf());
            let pb = spinner(&format!("Indexing {}", dir.display()));
            let stored = ctx.pipeline.index_directory(Some(&dir)).await;
            pb.finish_with_message(format!("Indexed {stored} chunks from {}", dir.display()));
        }
        Command::Clear => {
            let ctx = ingestion(config).await?;
            let deleted = ctx.pipeline.clear_index().await;
            println!("Removed {deleted} chunks from '{}'", ctx.store.index_name());
        }
        Command::Query { question, no_rag } => {
            let ctx = answering(config).await?;
            let pb = spinner("Thinking");
            let response = ctx.service.process_query(&question, !no_rag).await;
            pb.finish_and_clear();
            print_response(&response);
        }
        Command::Chat => {
            let ctx = answering(config).await?;
            let mut history: Vec<ChatMessage> = Vec::new();
            let stdin = io::stdin();
            println!("Chatting with {}. Type /exit to quit.", ctx.generator.provider());
            loop {
                print!("> ");
                io::stdout().flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                let line = line.trim();
                if line == "/exit" {
                    break;
                }
                if line.is_empty() {
                    continue;
                }
                history.push(ChatMessage::user(line));
                let reply = ctx.service.chat(&history).await;
                println!("{reply}\n");
                history.push(ChatMessage::assistant(reply));
            }
        }
        Command::Upload { file } => {
            let ctx = ingestion(config).await?;
            let bytes = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let name = file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            match ctx.pipeline.save_uploaded_file(&bytes, &name).await {
                Some(path) => println!("Saved {}", path.display()),
                None => println!("Could not save {}; see the log for details", file.display()),
            }
        }
        Command::Stats => {
            let ctx = answering(config).await?;
            let stats = ctx.service.get_stats().await;
            println!("Index:      {}", stats.index_name);
            println!("Documents:  {}", stats.document_count);
            println!("LLM:        {}", stats.llm_provider);
        }
    }
    Ok(())
}
