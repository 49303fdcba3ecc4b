// ABOUTME: Entry point for prune-known-hosts: scan a known_hosts file and print sed commands for stale lines
// ABOUTME: Wires CLI flags, configuration, logging, the scan, and the report together

mod app;
mod cli;
mod config;
mod report;
mod resolver;
mod ssh;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::Config;
use resolver::SystemResolver;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::Level;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stdout = io::stdout();
    match run(&cli, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.expand_path()?;
    config.merge_cli(cli);
    config.validate()?;

    let run = config.run_config();
    tracing::debug!("Run configuration: {:?}", run);

    let file = app::open_hostsfile(&run.hostsfile)?;
    if run.verbose {
        writeln!(out, "# Reading hostsfile {}", run.hostsfile.display())?;
    }

    let resolver = SystemResolver::new(run.lookup_timeout);
    let result = app::scan_file(file, &run, &resolver)?;

    for line in report::render(&result, &run) {
        writeln!(out, "{}", line)?;
    }

    Ok(())
}

// Diagnostics go to stderr; stdout carries only the report. Only `-v` raises
// the level, since logging starts before the config file is read.
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use tempfile::NamedTempFile;

    fn empty_config() -> NamedTempFile {
        NamedTempFile::new().unwrap()
    }

    #[test]
    fn test_open_failure_prints_nothing() {
        let config = empty_config();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("known_hosts");
        let cli = Cli::try_parse_from([
            OsStr::new("prune-known-hosts"),
            OsStr::new("-v"),
            OsStr::new("-d"),
            OsStr::new("-c"),
            config.path().as_os_str(),
            OsStr::new("-f"),
            missing.as_os_str(),
        ])
        .unwrap();

        let mut out = Vec::new();
        let err = run(&cli, &mut out).unwrap_err();

        assert!(format!("{:#}", err).starts_with("Could not open hostsfile"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_verbose_header_follows_successful_open() {
        let config = empty_config();
        let mut hosts = NamedTempFile::new().unwrap();
        write!(hosts, "a ssh-rsa AAAA\nb ssh-rsa BBBB\na ssh-rsa AAAA\n").unwrap();
        let cli = Cli::try_parse_from([
            OsStr::new("prune-known-hosts"),
            OsStr::new("-v"),
            OsStr::new("-d"),
            OsStr::new("-c"),
            config.path().as_os_str(),
            OsStr::new("-f"),
            hosts.path().as_os_str(),
        ])
        .unwrap();

        let mut out = Vec::new();
        run(&cli, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], format!("# Reading hostsfile {}", hosts.path().display()));
        assert!(lines.contains(&"# Duplicate entries:"));
        assert!(lines.iter().any(|line| line.starts_with("sed -e '3s/")));
    }
}
