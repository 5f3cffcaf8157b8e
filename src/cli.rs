//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};

use monorepo::output::OutputConfig;

use crate::commands;

/// Monorepo - A big home for small repos
#[derive(Parser, Debug)]
#[command(name = "monorepo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Monorepo root holding monorepo.yml (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR", env = "MONOREPO_ROOT")]
    root: Option<PathBuf>,

    /// Discard uncommitted changes in pinned working trees
    #[arg(
        short,
        long,
        global = true,
        env = "MONOREPO_FORCE",
        value_parser = BoolishValueParser::new()
    )]
    force: bool,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the subrepos and the revisions they are pinned to
    #[command(visible_alias = "ls")]
    List(commands::list::ListArgs),

    /// Sync every subrepo, one subrepo, or add a new one
    Pull(commands::pull::PullArgs),

    /// Add a subrepo and sync it
    Add(commands::add::AddArgs),

    /// Forget a subrepo (its files stay on disk)
    Rm(commands::rm::RmArgs),
}

/// Global settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub root: PathBuf,
    pub force: bool,
    pub out: OutputConfig,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let root = match self.root {
            Some(root) => root,
            None => std::env::current_dir().context("Failed to get current directory")?,
        };
        let ctx = Context {
            root,
            force: self.force,
            out: OutputConfig::from_env_and_flag(&self.color),
        };

        match self.command {
            Commands::List(args) => commands::list::execute(args, &ctx),
            Commands::Pull(args) => commands::pull::execute(args, &ctx),
            Commands::Add(args) => commands::add::execute(args, &ctx),
            Commands::Rm(args) => commands::rm::execute(args, &ctx),
        }
    }
}

/// `RUST_LOG`, when set, takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
