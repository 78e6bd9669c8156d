mod cli;
mod commands;
mod config;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::process::ExitCode;
use storekit::Client;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: config::Config,
}

impl Context {
    /// Nix client configured from the merged settings
    pub fn client(&self) -> Result<Client> {
        let client = Client::with_program(self.config.nix_path()?, self.config.nix_options())?;
        if !client.is_available() {
            return Err(storekit::Error::NixNotFound.into());
        }
        Ok(client)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "flakesync", &mut io::stdout());
        return Ok(());
    }

    let config = config::Config::load(cli.config.as_deref())?.merge(&cli.target);
    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config,
    };

    match cli.command {
        Command::Sync { dry_run } => commands::sync::run(&ctx, dry_run),
        Command::Diff { json } => commands::diff::run(&ctx, json),
        Command::List => commands::list::run(&ctx),
        Command::Completions { .. } => Ok(()),
    }
}
