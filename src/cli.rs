// ABOUTME: Command-line flags for prune-known-hosts
// ABOUTME: Flags override values from the configuration file

use clap::Parser;
use std::path::PathBuf;

/// Find stale entries in an SSH known_hosts file.
///
/// Duplicate lines and hosts that no longer resolve are reported as `sed`
/// commands that comment the offending lines out. Nothing is modified; review
/// the commands and add `-i` yourself to apply them.
#[derive(Parser, Debug)]
#[command(name = "prune-known-hosts", version, about)]
pub struct Cli {
    /// Increase output verbosity
    #[arg(short, long)]
    pub verbose: bool,

    /// File to parse (defaults to $HOME/.ssh/known_hosts)
    #[arg(short = 'f', long)]
    pub hostsfile: Option<PathBuf>,

    /// Print 'sed' lines to remove duplicates
    #[arg(short, long)]
    pub duplicates: bool,

    /// Print 'sed' lines to remove non-resolving hosts
    #[arg(short = 'r', long = "non_resolving")]
    pub non_resolving: bool,

    /// Split the 'sed' edits into individual commands
    #[arg(short, long = "split_sed")]
    pub split_sed: bool,

    /// Configuration file (defaults to <config dir>/prune-known-hosts/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Per-lookup DNS timeout in milliseconds, 0 for none
    #[arg(short, long, value_name = "MS")]
    pub timeout: Option<u64>,
}
