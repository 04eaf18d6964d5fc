use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use homemap_index::{CodecError, DEFAULT_CAPTURE_BYTES};
use homemap_manifest::{ManifestError, SourceLocation, DEFAULT_PART_SIZE};
use homemap_protocol::{serialize_json_pretty, ErrorEnvelope, Response};
use std::path::PathBuf;

mod cache;
mod commands;
mod config;
mod session;

use commands::Context;
use config::HomeMapConfig;

#[derive(Parser)]
#[command(name = "homemap")]
#[command(about = "Browse and query chunked HomeMap path indexes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./homemap.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Source directory or http(s) base URL (overrides the config file)
    #[arg(long, global = true)]
    source: Option<String>,

    /// Always refetch assets instead of using the local cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Cut a file into numbered parts plus a manifest
    Split(SplitArgs),

    /// Index a directory into a publishable source
    Build(BuildArgs),

    /// Reassemble one asset from its manifest
    Assemble(AssembleArgs),

    /// List indexed paths under a prefix
    Ls(LsArgs),

    /// List the immediate children of a folder
    Children(ChildrenArgs),

    /// Case-insensitive substring search over paths
    Find(FindArgs),

    /// Print a folder tree, expanded a few levels deep
    Tree(TreeArgs),

    /// Show tags, the paths under a tag, or the tags of a path
    Tags(TagsArgs),

    /// Rank paths by relevance to a free-text query
    Ask(AskArgs),

    /// Summarize the structure of the source
    Describe(DescribeArgs),

    /// Compare the source with another one
    Compare(CompareArgs),
}

#[derive(Args)]
struct SplitArgs {
    input: PathBuf,

    #[arg(long)]
    out_dir: PathBuf,

    /// Logical asset name (default: input file name)
    #[arg(long)]
    name: Option<String>,

    #[arg(long, default_value_t = DEFAULT_PART_SIZE)]
    part_size: u64,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct BuildArgs {
    /// Directory to index
    root: PathBuf,

    #[arg(long)]
    out_dir: PathBuf,

    /// Bytes of each file kept as its preview
    #[arg(long, default_value_t = DEFAULT_CAPTURE_BYTES)]
    capture_bytes: usize,

    /// Tag list (`tag<TAB>path` lines) published with the index
    #[arg(long)]
    tags: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_PART_SIZE)]
    part_size: u64,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AssembleArgs {
    asset: String,

    #[arg(short, long)]
    output: PathBuf,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LsArgs {
    #[arg(default_value = "")]
    prefix: String,

    /// Only paths under these prefixes
    #[arg(long)]
    include: Vec<String>,

    /// Skip paths under these prefixes
    #[arg(long)]
    exclude: Vec<String>,

    /// Glob (`*`, `?`, `[...]`) or substring the path must match
    #[arg(long)]
    pattern: Option<String>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ChildrenArgs {
    #[arg(default_value = "")]
    folder: String,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct FindArgs {
    term: String,

    #[arg(short, long, default_value_t = 50)]
    limit: usize,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TreeArgs {
    #[arg(default_value = "")]
    folder: String,

    #[arg(short, long, default_value_t = 2)]
    depth: usize,
}

#[derive(Args)]
struct TagsArgs {
    tag: Option<String>,

    /// Show the tags of this path instead
    #[arg(long, conflicts_with = "tag")]
    path: Option<String>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AskArgs {
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,

    #[arg(short = 'k', long, default_value_t = 10)]
    top_k: usize,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DescribeArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CompareArgs {
    /// Directory or URL of the other source
    other: String,

    #[arg(long)]
    json: bool,
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::Split(args) => args.json,
            Commands::Build(args) => args.json,
            Commands::Assemble(args) => args.json,
            Commands::Ls(args) => args.json,
            Commands::Children(args) => args.json,
            Commands::Find(args) => args.json,
            Commands::Tree(_) => false,
            Commands::Tags(args) => args.json,
            Commands::Ask(args) => args.json,
            Commands::Describe(args) => args.json,
            Commands::Compare(args) => args.json,
        }
    }
}

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers.
    let json_output = cli.command.json();
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    if let Err(err) = run(cli).await {
        if json_output {
            let envelope = error_envelope(&err);
            match serialize_json_pretty(&Response::error(envelope)) {
                Ok(body) => println!("{body}"),
                Err(ser) => eprintln!("Error: {err:#} ({ser})"),
            }
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = HomeMapConfig::load(cli.config.as_deref())?;
    let location = cli
        .source
        .clone()
        .or_else(|| config.source.clone())
        .map(|raw| raw.parse::<SourceLocation>())
        .transpose()
        .context("Invalid source location")?;
    let mut ctx = Context::new(config, location, !cli.no_cache);

    match cli.command {
        Commands::Split(args) => commands::assets::split(args),
        Commands::Build(args) => commands::assets::build(args),
        Commands::Assemble(args) => commands::assets::assemble(&ctx, args).await,
        Commands::Ls(args) => commands::browse::ls(&mut ctx, args).await,
        Commands::Children(args) => commands::browse::children(&mut ctx, args).await,
        Commands::Find(args) => commands::browse::find(&mut ctx, args).await,
        Commands::Tree(args) => commands::browse::tree(&mut ctx, args).await,
        Commands::Tags(args) => commands::browse::tags(&mut ctx, args).await,
        Commands::Ask(args) => commands::reason::ask(&mut ctx, args).await,
        Commands::Describe(args) => commands::reason::describe(&mut ctx, args).await,
        Commands::Compare(args) => commands::reason::compare(&mut ctx, args).await,
    }
}

fn error_envelope(err: &anyhow::Error) -> ErrorEnvelope {
    let code = err
        .chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<ManifestError>()
                .map(ManifestError::code)
                .or_else(|| cause.downcast_ref::<CodecError>().map(CodecError::code))
        })
        .unwrap_or("error");
    let envelope = ErrorEnvelope::new(code, format!("{err:#}"));
    match code {
        "manifest_not_found" => envelope.with_hint("Check --source and the asset names in homemap.toml"),
        "part_fetch_failed" => envelope.with_hint("Retry, or rerun with --no-cache"),
        _ => envelope,
    }
}
