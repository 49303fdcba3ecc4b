// ABOUTME: Line-level parser for known_hosts files, deciding which lines are host entries
// ABOUTME: Classifies the host field as hostname, IPv4/IPv6 literal, or hostname,address pair

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

// Matched from the start of the token only; octets are not range-checked.
static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}").expect("IPv4 pattern compiles")
});

/// The first field of a known_hosts entry, classified by how it should be resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostToken {
    /// `hostname,address`: checked with a forward lookup of the hostname.
    Pair { hostname: String, address: String },
    /// Contains a colon: checked with a reverse lookup.
    Ipv6(String),
    /// Dotted quad: checked with a reverse lookup.
    Ipv4(String),
    /// Anything else: checked with a forward lookup.
    Hostname(String),
}

impl HostToken {
    pub fn parse(token: &str) -> Self {
        if let Some((hostname, address)) = token.split_once(',') {
            HostToken::Pair {
                hostname: hostname.to_string(),
                address: address.to_string(),
            }
        } else if token.contains(':') {
            HostToken::Ipv6(token.to_string())
        } else if IPV4_PATTERN.is_match(token) {
            HostToken::Ipv4(token.to_string())
        } else {
            HostToken::Hostname(token.to_string())
        }
    }

    /// Whether this token is checked by address-to-name lookup.
    pub fn is_address(&self) -> bool {
        matches!(self, HostToken::Ipv4(_) | HostToken::Ipv6(_))
    }
}

impl fmt::Display for HostToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostToken::Pair { hostname, address } => write!(f, "{} ({})", hostname, address),
            HostToken::Ipv6(address) | HostToken::Ipv4(address) => write!(f, "{}", address),
            HostToken::Hostname(hostname) => write!(f, "{}", hostname),
        }
    }
}

/// A retained known_hosts line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub line_number: usize,
    pub text: String,
    pub token: String,
    pub host: HostToken,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedLine {
    Blank,
    Comment,
    /// Starts with something other than a word character, e.g. `|1|` hashes or `@cert-authority`.
    Marker,
    Malformed { fields: usize },
    Entry(Entry),
}

/// Parse one raw line. `line_number` is 1-based and counts every line in the file.
pub fn parse_line(line_number: usize, raw: &str) -> ParsedLine {
    let line = raw.trim();

    if line.is_empty() {
        return ParsedLine::Blank;
    }
    if line.starts_with('#') {
        return ParsedLine::Comment;
    }
    if !line.chars().next().is_some_and(is_word_char) {
        return ParsedLine::Marker;
    }

    // host-token, key-type, key-data
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return ParsedLine::Malformed { fields: fields.len() };
    }

    ParsedLine::Entry(Entry {
        line_number,
        text: line.to_string(),
        token: fields[0].to_string(),
        host: HostToken::parse(fields[0]),
    })
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
