//! Command-line interface.
//!
//! Parses arguments, loads settings, and dispatches to command modules.

mod commands;
mod icons;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::llm::ReviewerProvider;

#[derive(Parser)]
#[command(name = "ocrjudge")]
#[command(about = "Reconcile multi-engine OCR output and search the result")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Merge OCR variants and reconcile pending pages with the reviewer
    Reconcile {
        /// Ignore the checkpoint and resubmit every page
        #[arg(long)]
        redo: bool,
        /// Resubmit pages whose latest stored record is an error
        #[arg(long)]
        retry_errors: bool,
        /// Submit at most this many pages
        #[arg(short, long)]
        limit: Option<usize>,
        /// Reviewer provider (gemini or ollama)
        #[arg(long, value_parser = parse_provider)]
        provider: Option<ReviewerProvider>,
        /// Comma-separated reviewer models (round-robin)
        #[arg(long)]
        models: Option<String>,
    },

    /// Show variant stores, reconciled pages, and what is still pending
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search one corpus
    Search {
        /// Query text
        query: String,
        /// OCR engine (tesseract, easyocr, gemini, or consolidated)
        #[arg(short, long)]
        engine: Option<String>,
        /// OCR language (tha, eng, tha+eng)
        #[arg(short = 'L', long)]
        lang: Option<String>,
        #[command(flatten)]
        flags: SearchFlags,
    },

    /// Run one query over every configured engine/language pair
    Compare {
        /// Query text
        query: String,
        #[command(flatten)]
        flags: SearchFlags,
    },

    /// Start the HTTP search server
    Serve {
        /// Bind address: port, host, or host:port
        #[arg(default_value = "127.0.0.1:3030")]
        bind: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Match options shared by `search` and `compare`.
#[derive(Debug, Clone, clap::Args)]
struct SearchFlags {
    /// Match the filename only
    #[arg(long)]
    title_only: bool,
    /// Match the whole query as one substring instead of segmenting it
    #[arg(long)]
    no_tokenizer: bool,
    /// Search page by page instead of whole documents
    #[arg(long)]
    pages: bool,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
}

fn parse_provider(value: &str) -> Result<ReviewerProvider, String> {
    ReviewerProvider::from_str(value).ok_or_else(|| format!("unknown provider '{}'", value))
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let (settings, config) = load_settings_with_options(options)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Reconcile {
            redo,
            retry_errors,
            limit,
            provider,
            models,
        } => {
            commands::reconcile::cmd_reconcile(
                &settings,
                commands::reconcile::ReconcileArgs {
                    redo,
                    retry_errors,
                    limit,
                    provider,
                    models,
                },
            )
            .await
        }
        Commands::Status { json } => commands::status::cmd_status(&settings, json).await,
        Commands::Search {
            query,
            engine,
            lang,
            flags,
        } => {
            commands::search::cmd_search(
                &settings,
                &query,
                engine.as_deref(),
                lang.as_deref(),
                flags.into(),
            )
            .await
        }
        Commands::Compare { query, flags } => {
            commands::search::cmd_compare(&settings, &query, flags.into()).await
        }
        Commands::Serve { bind } => commands::serve::cmd_serve(&settings, &bind).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_cmd::cmd_config_show(&settings, &config).await,
        },
    }
}

impl From<SearchFlags> for commands::search::OutputOptions {
    fn from(flags: SearchFlags) -> Self {
        Self {
            title_only: flags.title_only,
            use_tokenizer: !flags.no_tokenizer,
            aggregate: !flags.pages,
            json: flags.json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_reconcile() {
        let cli = Cli::parse_from([
            "ocrjudge",
            "-v",
            "reconcile",
            "--redo",
            "--limit",
            "5",
            "--provider",
            "ollama",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Reconcile {
                redo,
                limit,
                provider,
                ..
            } => {
                assert!(redo);
                assert_eq!(limit, Some(5));
                assert_eq!(provider, Some(ReviewerProvider::Ollama));
            }
            _ => panic!("expected reconcile"),
        }
    }

    #[test]
    fn test_parse_search_flags() {
        let cli = Cli::parse_from(["ocrjudge", "search", "ระเบียบ", "-e", "easyocr", "--pages"]);
        match cli.command {
            Commands::Search {
                query,
                engine,
                flags,
                ..
            } => {
                assert_eq!(query, "ระเบียบ");
                assert_eq!(engine.as_deref(), Some("easyocr"));
                let options: commands::search::OutputOptions = flags.into();
                assert!(!options.aggregate);
                assert!(options.use_tokenizer);
            }
            _ => panic!("expected search"),
        }
    }
}
