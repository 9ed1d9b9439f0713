//! Configuration validation

use super::*;
use anyhow::Result;
use std::collections::HashSet;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_coordinator(&config.coordinator)?;
    validate_volunteer(&config.volunteer)?;
    validate_output(&config.output)?;

    Ok(())
}

/// Validate coordinator configuration
pub fn validate_coordinator(coordinator: &CoordinatorConfig) -> Result<()> {
    if coordinator.bind_address.trim().is_empty() {
        anyhow::bail!("bind_address must not be empty");
    }

    validate_host("document_host", &coordinator.document_host)?;

    let corpus = coordinator.corpus();
    if corpus.is_empty() {
        anyhow::bail!("corpus must contain at least one document");
    }

    let mut seen = HashSet::new();
    for path in &corpus {
        validate_document_path(path)?;
        if !seen.insert(path.as_str()) {
            anyhow::bail!("document path listed twice: {}", path);
        }
    }

    Ok(())
}

/// Validate volunteer configuration
pub fn validate_volunteer(volunteer: &VolunteerConfig) -> Result<()> {
    validate_host("coordinator_host", &volunteer.coordinator_host)?;

    if volunteer.coordinator_port == 0 {
        anyhow::bail!("coordinator_port must be non-zero");
    }

    if volunteer.min_word_len == 0 {
        anyhow::bail!("min_word_len must be at least 1");
    }

    if let FetchMode::Plain { port } = volunteer.fetch {
        if port == 0 {
            anyhow::bail!("plain fetch port must be non-zero");
        }
    }

    Ok(())
}

/// Validate output configuration
pub fn validate_output(output: &OutputConfig) -> Result<()> {
    if output.top == Some(0) {
        anyhow::bail!("top must be at least 1 (omit it to print every word)");
    }

    if let Some(ref path) = output.json_output {
        if path.as_os_str().is_empty() {
            anyhow::bail!("json_output path must not be empty");
        }
    }

    Ok(())
}

fn validate_host(field: &str, host: &str) -> Result<()> {
    if host.is_empty() {
        anyhow::bail!("{} must not be empty", field);
    }
    if host.chars().any(char::is_whitespace) {
        anyhow::bail!("{} must not contain whitespace: {:?}", field, host);
    }
    Ok(())
}

/// Document paths travel as single protocol tokens and as HTTP request
/// targets.
fn validate_document_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        anyhow::bail!("document path must start with '/': {:?}", path);
    }
    if path.chars().any(char::is_whitespace) {
        anyhow::bail!("document path must not contain whitespace: {:?}", path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_document_path_rules() {
        let mut config = Config::default();
        config.coordinator.documents = vec!["relative.txt".to_string()];
        assert!(validate_config(&config).is_err());

        config.coordinator.documents = vec!["/with space.txt".to_string()];
        assert!(validate_config(&config).is_err());

        config.coordinator.documents = vec!["/ok.txt".to_string(), "/ok.txt".to_string()];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_empty_document_host() {
        let mut config = Config::default();
        config.coordinator.document_host = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_volunteer_rules() {
        let mut config = Config::default();
        config.volunteer.coordinator_port = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.volunteer.fetch = FetchMode::Plain { port: 0 };
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.volunteer.min_word_len = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_output_top_zero() {
        let mut config = Config::default();
        config.output.top = Some(0);
        assert!(validate_config(&config).is_err());
    }
}
