//! TreeQA CLI
//!
//! - `path`: show the bottom-up first-child path of a question tree
//! - `candidates`: synthesize candidate SPARQL queries from a tree
//! - `split`: split a query's `FILTER(?proj IN (...))` list into batches
//! - `answer`: synthesize and run the candidates against an endpoint

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::Level;
use treeqa_exec::{EndpointConfig, QuestionAnswerer};
use treeqa_sparql::{FilterBatcher, QueryPatternSynthesizer};
use treeqa_tree::{parse_bracketed_document, parse_json_document, ParseTreePath, QuestionTree};

mod output;

#[derive(Parser)]
#[command(name = "treeqa")]
#[command(author, version, about = "TreeQA: answer questions from annotated parse trees via SPARQL")]
struct Cli {
    /// More log output (repeat for trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the bottom-up path the synthesizer walks.
    Path {
        /// Tree file (`.json`, otherwise bracketed text; `-` for stdin).
        tree: PathBuf,
    },
    /// Print candidate queries and synthesis diagnostics.
    Candidates {
        tree: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Split a query's IN-filter into batches.
    Split {
        /// File holding one query (`-` for stdin).
        query: PathBuf,
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Synthesize candidates and execute them against a SPARQL endpoint.
    Answer {
        tree: PathBuf,
        #[command(flatten)]
        endpoint: EndpointArgs,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
struct EndpointArgs {
    /// JSON endpoint config; environment variables and flags override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// SPARQL endpoint URL.
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long)]
    batch_size: Option<usize>,
    #[arg(long)]
    default_graph: Option<String>,
}

impl EndpointArgs {
    /// Defaults, then the config file, then `TREEQA_*` variables, then flags.
    fn resolve(&self) -> Result<EndpointConfig> {
        let base = match &self.config {
            Some(path) => EndpointConfig::from_json_file(path)?,
            None => EndpointConfig::default(),
        };
        let mut config = base.with_env_overrides()?;
        if let Some(url) = &self.endpoint {
            config.url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }
        if let Some(graph) = &self.default_graph {
            config.default_graph_uri = Some(graph.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_tree(path: &Path) -> Result<QuestionTree> {
    let text = read_input(path)?;
    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let tree = if is_json {
        parse_json_document(&text).map_err(|e| anyhow!("{}: {e}", path.display()))?
    } else {
        parse_bracketed_document(&text).map_err(|e| anyhow!("{}: {e}", path.display()))?
    };
    tracing::debug!(path = %path.display(), nodes = tree.node_count(), "loaded question tree");
    Ok(tree)
}

fn cmd_path(tree_path: &Path) -> Result<()> {
    let tree = load_tree(tree_path)?;
    let path = ParseTreePath::extract(&tree);
    if path.is_empty() {
        eprintln!("{} root has no children", "warning:".yellow().bold());
        return Ok(());
    }
    print!("{}", output::path_table(&path));
    Ok(())
}

fn cmd_candidates(tree_path: &Path, json: bool) -> Result<()> {
    let tree = load_tree(tree_path)?;
    let synthesis = QueryPatternSynthesizer::new().synthesize(&tree);
    if json {
        println!("{}", serde_json::to_string_pretty(&output::synthesis_json(&tree, &synthesis))?);
    } else {
        print!("{}", output::synthesis_text(&synthesis));
    }
    Ok(())
}

fn cmd_split(query_path: &Path, batch_size: Option<usize>) -> Result<()> {
    let query = read_input(query_path)?;
    let batcher = match batch_size {
        Some(size) => FilterBatcher::new(size)?,
        None => FilterBatcher::default(),
    };
    let batches = batcher.split(query.trim_end())?;
    for (i, batch) in batches.iter().enumerate() {
        println!("{}", format!("# batch {}/{}", i + 1, batches.len()).dimmed());
        println!("{batch}");
    }
    Ok(())
}

fn cmd_answer(tree_path: &Path, endpoint: &EndpointArgs, json: bool) -> Result<()> {
    let tree = load_tree(tree_path)?;
    let config = endpoint.resolve()?;
    tracing::info!(endpoint = %config.url, batch_size = config.batch_size, "answering");

    let answerer = QuestionAnswerer::from_config(&config)?;
    let (synthesis, answers) = answerer.answer_with_report(&tree);
    if json {
        println!("{}", serde_json::to_string_pretty(&answers)?);
    } else {
        print!("{}", output::answers_text(&synthesis, &answers));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Path { tree } => cmd_path(tree),
        Commands::Candidates { tree, json } => cmd_candidates(tree, *json),
        Commands::Split { query, batch_size } => cmd_split(query, *batch_size),
        Commands::Answer {
            tree,
            endpoint,
            json,
        } => cmd_answer(tree, endpoint, *json),
    }
}
