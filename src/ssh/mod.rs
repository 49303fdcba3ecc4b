// ABOUTME: known_hosts parsing module
// ABOUTME: Turns raw file lines into classified host entries for the scan

pub mod parser;

pub use parser::{HostToken, ParsedLine, parse_line};
