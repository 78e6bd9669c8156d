use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flakesync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Keep a Nix profile in sync with a flake devShell", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to ~/.config/flakesync/config.toml)
    #[arg(long, global = true, env = "FLAKESYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub target: TargetArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the values read from the config file
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct TargetArgs {
    /// Flake whose default devShell lists the wanted packages
    #[arg(long, global = true, env = "FLAKESYNC_FLAKE")]
    pub flake: Option<String>,

    /// Nix profile to keep in sync
    #[arg(long, global = true, env = "FLAKESYNC_PROFILE")]
    pub profile: Option<PathBuf>,

    /// Nix system to evaluate for, e.g. aarch64-darwin
    #[arg(long, global = true, env = "FLAKESYNC_SYSTEM")]
    pub system: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Remove unwanted packages, then install missing ones
    Sync {
        /// Show what would change without touching the profile
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Show what sync would change
    Diff {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the profile's elements and their store paths
    List,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_with_overrides() {
        let cli = Cli::try_parse_from([
            "flakesync",
            "-vv",
            "sync",
            "--dry-run",
            "--flake",
            "./dev",
            "--profile",
            "/tmp/profile",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Sync { dry_run: true }));
        assert_eq!(cli.target.flake.as_deref(), Some("./dev"));
        assert_eq!(cli.target.profile, Some(PathBuf::from("/tmp/profile")));
        assert_eq!(cli.target.system, None);
    }

    #[test]
    fn test_parse_diff_json() {
        let cli = Cli::try_parse_from(["flakesync", "diff", "--json", "-q"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Diff { json: true }));
    }

    #[test]
    fn test_parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["flakesync"]).is_err());
    }
}
