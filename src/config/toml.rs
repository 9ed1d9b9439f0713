//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Config {
    // Coordinator settings
    if let Some(port) = cli.listen_port {
        config.coordinator.listen_port = port;
    }
    if let Some(ref address) = cli.bind_address {
        config.coordinator.bind_address = address.clone();
    }
    if let Some(ref host) = cli.document_host {
        config.coordinator.document_host = host.clone();
    }
    // A document list on the command line replaces the file's list entirely
    if !cli.documents.is_empty() || !cli.document_ids.is_empty() {
        config.coordinator.documents = cli.documents.clone();
        config.coordinator.document_ids = cli.document_ids.clone();
    }

    // Volunteer settings
    if let Some(ref host) = cli.coordinator_host {
        config.volunteer.coordinator_host = host.clone();
    }
    if let Some(port) = cli.coordinator_port {
        config.volunteer.coordinator_port = port;
    }
    if let Some(len) = cli.min_word_len {
        config.volunteer.min_word_len = len;
    }
    if let Some(n) = cli.top_n {
        config.volunteer.top_n = n;
    }
    if let Some(port) = cli.plain_http_port {
        config.volunteer.fetch = FetchMode::Plain { port };
    }

    // Output settings
    if cli.top.is_some() {
        config.output.top = cli.top;
    }
    if let Some(ref path) = cli.json_output {
        config.output.json_output = Some(path.clone());
    }

    config
}

/// Load the configuration file named on the command line (if any) and apply
/// CLI overrides
pub fn load_config(cli: &Cli) -> Result<Config> {
    let base = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => Config::default(),
    };

    Ok(merge_cli_with_config(cli, base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    const SAMPLE: &str = r#"
[coordinator]
listen_port = 6000
document_host = "docs.example.org"
documents = ["/one.txt", "/two.txt"]

[volunteer]
coordinator_host = "10.0.0.5"
top_n = 0

[volunteer.fetch]
kind = "plain"
port = 8080

[output]
top = 50
"#;

    #[test]
    fn test_parse_toml_string() {
        let config = parse_toml_string(SAMPLE).unwrap();

        assert_eq!(config.coordinator.listen_port, 6000);
        assert_eq!(config.coordinator.bind_address, "127.0.0.1");
        assert_eq!(config.coordinator.document_host, "docs.example.org");
        assert_eq!(config.coordinator.corpus(), vec!["/one.txt", "/two.txt"]);
        assert_eq!(config.volunteer.coordinator_host, "10.0.0.5");
        assert_eq!(config.volunteer.coordinator_port, DEFAULT_COORDINATOR_PORT);
        assert_eq!(config.volunteer.min_word_len, 6);
        assert_eq!(config.volunteer.top_n, 0);
        assert_eq!(config.volunteer.fetch, FetchMode::Plain { port: 8080 });
        assert_eq!(config.output.top, Some(50));
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = parse_toml_string("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(parse_toml_string("[coordinator]\nlisten_port = \"x\"").is_err());
    }

    #[test]
    fn test_parse_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = parse_toml_file(file.path()).unwrap();
        assert_eq!(config.coordinator.listen_port, 6000);
    }

    #[test]
    fn test_missing_file() {
        let err = parse_toml_file(Path::new("/nonexistent/wordpulse.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let base = parse_toml_string(SAMPLE).unwrap();
        let cli = Cli::parse_from([
            "wordpulse",
            "--listen-port",
            "7000",
            "--document-ids",
            "1513",
            "--top-n",
            "5",
        ]);

        let config = merge_cli_with_config(&cli, base);
        assert_eq!(config.coordinator.listen_port, 7000);
        assert_eq!(config.coordinator.corpus(), vec!["/cache/epub/1513/pg1513.txt"]);
        assert_eq!(config.volunteer.top_n, 5);
        // Untouched values survive
        assert_eq!(config.coordinator.document_host, "docs.example.org");
        assert_eq!(config.volunteer.fetch, FetchMode::Plain { port: 8080 });
    }

    #[test]
    fn test_load_config_without_file() {
        let cli = Cli::parse_from(["wordpulse", "--plain-http-port", "8000"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.volunteer.fetch, FetchMode::Plain { port: 8000 });
        assert_eq!(config.coordinator.corpus().len(), 8);
    }
}
