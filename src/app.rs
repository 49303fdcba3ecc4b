// ABOUTME: Single-pass scan of a known_hosts file that collects duplicate and non-resolving entries
// ABOUTME: Builds the indexes the report is printed from; nothing is written back to the file

use crate::config::RunConfig;
use crate::resolver::{Resolver, host_resolves};
use crate::ssh::{ParsedLine, parse_line};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Exact trimmed line text to every line number it appears on, in file order.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    lines: HashMap<String, Vec<usize>>,
}

impl DuplicateIndex {
    pub fn record(&mut self, text: &str, line_number: usize) {
        self.lines.entry(text.to_string()).or_default().push(line_number);
    }

    /// Texts seen more than once, ordered by their first (canonical) occurrence.
    pub fn duplicates(&self) -> Vec<(&str, &[usize])> {
        let mut groups: Vec<(&str, &[usize])> = self
            .lines
            .iter()
            .filter(|(_, numbers)| numbers.len() > 1)
            .map(|(text, numbers)| (text.as_str(), numbers.as_slice()))
            .collect();
        groups.sort_by_key(|(_, numbers)| numbers[0]);
        groups
    }

    /// Every occurrence after the first, across all groups.
    pub fn candidates(&self) -> Vec<usize> {
        self.duplicates()
            .into_iter()
            .flat_map(|(_, numbers)| numbers[1..].iter().copied())
            .collect()
    }
}

/// Host token to the line of its latest failed lookup.
#[derive(Debug, Default)]
pub struct NonResolvingIndex {
    hosts: HashMap<String, usize>,
}

impl NonResolvingIndex {
    /// A later line for the same token replaces the earlier one.
    pub fn record(&mut self, token: &str, line_number: usize) {
        self.hosts.insert(token.to_string(), line_number);
    }

    /// Entries ordered by line number.
    pub fn entries(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .hosts
            .iter()
            .map(|(token, line)| (token.as_str(), *line))
            .collect();
        entries.sort_by_key(|(_, line)| *line);
        entries
    }
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub duplicates: DuplicateIndex,
    pub non_resolving: NonResolvingIndex,
    pub lines_read: usize,
    pub entries: usize,
    pub malformed: usize,
}

pub fn open_hostsfile(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Could not open hostsfile {}", path.display()))
}

/// Scan an opened hostsfile. Lookups only run when the non-resolving report is enabled.
pub fn scan_file(file: File, config: &RunConfig, resolver: &dyn Resolver) -> Result<ScanResult> {
    let path = &config.hostsfile;
    let resolver = config.non_resolving.then_some(resolver);
    scan_reader(BufReader::new(file), resolver)
        .with_context(|| format!("Failed to read hostsfile {}", path.display()))
}

pub fn scan_reader<R: BufRead>(reader: R, resolver: Option<&dyn Resolver>) -> Result<ScanResult> {
    let mut result = ScanResult::default();

    for (index, raw) in reader.split(b'\n').enumerate() {
        let raw = raw.context("Failed to read line")?;
        let line_number = index + 1;
        result.lines_read = line_number;

        let entry = match parse_line(line_number, &String::from_utf8_lossy(&raw)) {
            ParsedLine::Entry(entry) => entry,
            ParsedLine::Malformed { fields } => {
                tracing::warn!(
                    "Skipping line {}: expected 3 fields (host, key type, key), found {}",
                    line_number,
                    fields
                );
                result.malformed += 1;
                continue;
            }
            ParsedLine::Marker => {
                tracing::debug!("Skipping line {}: not a plain host entry", line_number);
                continue;
            }
            ParsedLine::Blank | ParsedLine::Comment => continue,
        };

        result.entries += 1;
        result.duplicates.record(&entry.text, entry.line_number);

        if let Some(resolver) = resolver {
            let resolves = host_resolves(resolver, &entry.host);
            tracing::debug!(
                "Line {}: {} lookup of {} resolves={}",
                entry.line_number,
                if entry.host.is_address() { "reverse" } else { "forward" },
                entry.host,
                resolves
            );
            if !resolves {
                result.non_resolving.record(&entry.token, entry.line_number);
            }
        }
    }

    Ok(result)
}
