// ABOUTME: Formats scan findings as sed commands that comment out the offending known_hosts lines
// ABOUTME: Commands are only printed for review, merged into one invocation or split one per line

use crate::app::ScanResult;
use crate::config::RunConfig;
use std::path::Path;

/// `N s/^\(.*\)/##  \1/`: prefix line N with `##  `, keeping its content.
pub fn sed_expression(line_number: usize) -> String {
    format!(r"{}s/^\(.*\)/##  \1/", line_number)
}

/// Shell-quote the hostsfile so the printed command can be pasted as is.
pub fn quoted_filename(path: &Path) -> String {
    let name = path.to_string_lossy().into_owned();
    match shlex::try_quote(&name) {
        Ok(quoted) => quoted.into_owned(),
        Err(_) => name,
    }
}

/// `sed` command lines for the given candidates. Empty when there are none.
pub fn sed_commands(candidates: &[usize], filename: &str, split: bool) -> Vec<String> {
    if candidates.is_empty() {
        return Vec::new();
    }

    if split {
        return candidates
            .iter()
            .flat_map(|line| {
                [
                    format!("sed '{}' {}", sed_expression(*line), filename),
                    String::new(),
                ]
            })
            .collect();
    }

    let expressions: Vec<String> = candidates
        .iter()
        .map(|line| format!("-e '{}'", sed_expression(*line)))
        .collect();
    vec![String::new(), format!("sed {} {}", expressions.join(" "), filename)]
}

pub fn duplicates_report(result: &ScanResult, config: &RunConfig, filename: &str) -> Vec<String> {
    let mut out = Vec::new();

    if config.verbose {
        out.push(String::new());
        out.push("# Duplicate entries:".to_string());
        for (text, lines) in result.duplicates.duplicates() {
            out.push(format!("#   {}: {:?}", text, lines));
        }
    }

    out.extend(sed_commands(&result.duplicates.candidates(), filename, config.split_sed));
    out
}

pub fn non_resolving_report(result: &ScanResult, config: &RunConfig, filename: &str) -> Vec<String> {
    let mut out = Vec::new();
    let entries = result.non_resolving.entries();

    if config.verbose {
        out.push(String::new());
        out.push("# Non-resolving entries:".to_string());
        for (host, _) in &entries {
            out.push(format!("#   {}", host));
        }
    }

    let candidates: Vec<usize> = entries.iter().map(|(_, line)| *line).collect();
    out.extend(sed_commands(&candidates, filename, config.split_sed));
    out
}

/// Everything printed after the scan, in order.
pub fn render(result: &ScanResult, config: &RunConfig) -> Vec<String> {
    let filename = quoted_filename(&config.hostsfile);
    let mut out = Vec::new();

    if config.duplicates {
        out.extend(duplicates_report(result, config, &filename));
    }
    if config.non_resolving {
        out.extend(non_resolving_report(result, config, &filename));
    }

    if config.verbose {
        out.push(String::new());
        out.push(format!(
            "# Scanned {} lines, {} entries, {} malformed",
            result.lines_read, result.entries, result.malformed
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::scan_reader;
    use crate::resolver::testing::StaticResolver;
    use std::io::Cursor;
    use std::path::PathBuf;

    const FIVE_LINES: &str = "\
# managed by hand
alpha.example ssh-ed25519 AAAAC3Nza1
gone.example ssh-ed25519 AAAAC3Nza2
alpha.example ssh-ed25519 AAAAC3Nza1
beta.example ssh-rsa AAAAB3Nza3
";

    fn config(duplicates: bool, non_resolving: bool, split_sed: bool) -> RunConfig {
        RunConfig {
            hostsfile: PathBuf::from("/home/u/.ssh/known_hosts"),
            verbose: false,
            duplicates,
            non_resolving,
            split_sed,
            lookup_timeout: None,
        }
    }

    fn five_line_scan() -> ScanResult {
        let resolver = StaticResolver::new(&["alpha.example", "beta.example"], &[]);
        scan_reader(Cursor::new(FIVE_LINES), Some(&resolver as &dyn crate::resolver::Resolver)).unwrap()
    }

    #[test]
    fn test_sed_expression() {
        assert_eq!(sed_expression(12), r"12s/^\(.*\)/##  \1/");
    }

    #[test]
    fn test_merged_command() {
        let out = sed_commands(&[4, 9], "known_hosts", false);
        assert_eq!(
            out,
            vec![
                String::new(),
                r"sed -e '4s/^\(.*\)/##  \1/' -e '9s/^\(.*\)/##  \1/' known_hosts".to_string(),
            ]
        );
    }

    #[test]
    fn test_split_commands() {
        let out = sed_commands(&[4, 9], "known_hosts", true);
        assert_eq!(
            out,
            vec![
                r"sed '4s/^\(.*\)/##  \1/' known_hosts".to_string(),
                String::new(),
                r"sed '9s/^\(.*\)/##  \1/' known_hosts".to_string(),
                String::new(),
            ]
        );
    }

    #[test]
    fn test_no_candidates_no_command() {
        assert!(sed_commands(&[], "known_hosts", false).is_empty());
        assert!(sed_commands(&[], "known_hosts", true).is_empty());
    }

    #[test]
    fn test_filename_is_shell_quoted() {
        assert_eq!(quoted_filename(Path::new("/tmp/known_hosts")), "/tmp/known_hosts");

        let quoted = quoted_filename(Path::new("/tmp/my hosts"));
        assert_ne!(quoted, "/tmp/my hosts");
        assert_eq!(shlex::split(&quoted), Some(vec!["/tmp/my hosts".to_string()]));
    }

    #[test]
    fn test_end_to_end_five_line_file() {
        let result = five_line_scan();
        let out = render(&result, &config(true, true, false));

        assert_eq!(
            out,
            vec![
                String::new(),
                r"sed -e '4s/^\(.*\)/##  \1/' /home/u/.ssh/known_hosts".to_string(),
                String::new(),
                r"sed -e '3s/^\(.*\)/##  \1/' /home/u/.ssh/known_hosts".to_string(),
            ]
        );
        assert!(!out.iter().any(|line| line.contains("'2s/")));
    }

    #[test]
    fn test_end_to_end_split() {
        let result = five_line_scan();
        let out = render(&result, &config(true, true, true));
        let commands: Vec<&String> = out.iter().filter(|line| line.starts_with("sed ")).collect();

        assert_eq!(commands.len(), 2);
        assert_eq!(*commands[0], r"sed '4s/^\(.*\)/##  \1/' /home/u/.ssh/known_hosts");
        assert_eq!(*commands[1], r"sed '3s/^\(.*\)/##  \1/' /home/u/.ssh/known_hosts");
    }

    #[test]
    fn test_reports_disabled_print_nothing() {
        let result = five_line_scan();
        assert!(render(&result, &config(false, false, false)).is_empty());

        let mut verbose = config(false, false, false);
        verbose.verbose = true;
        let out = render(&result, &verbose);
        assert!(out.iter().all(|line| !line.starts_with("sed")));
        assert_eq!(out.last().unwrap(), "# Scanned 5 lines, 4 entries, 0 malformed");
    }

    #[test]
    fn test_only_duplicates_requested() {
        let result = five_line_scan();
        let out = render(&result, &config(true, false, false));
        assert_eq!(out.len(), 2);
        assert!(out[1].contains("'4s/"));
        assert!(!out[1].contains("'3s/"));
    }

    #[test]
    fn test_verbose_headers() {
        let result = five_line_scan();
        let mut cfg = config(true, true, false);
        cfg.verbose = true;
        let out = render(&result, &cfg);

        assert_eq!(out[0], "");
        assert_eq!(out[1], "# Duplicate entries:");
        assert_eq!(out[2], "#   alpha.example ssh-ed25519 AAAAC3Nza1: [2, 4]");
        assert!(out.contains(&"# Non-resolving entries:".to_string()));
        assert!(out.contains(&"#   gone.example".to_string()));
    }
}
