//! Runtime configuration.
//!
//! Settings come from an optional YAML file; every section and field has a
//! default, so an empty file (or no file at all) is a valid configuration.
//! Command-line flags are applied on top with [`Config::apply_cli`].
//!
//! ```yaml
//! http:
//!   timeout_secs: 10
//! resolver:
//!   workers: 8
//! model:
//!   endpoint: http://127.0.0.1:8080
//!   num_beams: 4
//! search:
//!   language: en
//!   page_size: 10
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::segment::MAIN_CONTENT_SENTENCES;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub resolver: ResolverConfig,
    pub model: ModelConfig,
    pub search: SearchConfig,
}

/// Settings shared by every outgoing HTTP request to publishers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:78.0) Gecko/20100101 Firefox/78.0"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Sentences kept from the start of the scraped text.
    pub main_content_sentences: usize,
    /// Records resolved concurrently.
    pub workers: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            main_content_sentences: MAIN_CONTENT_SENTENCES,
            workers: 8,
        }
    }
}

/// Summarization model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the model server.
    pub endpoint: String,
    pub max_input_tokens: usize,
    pub max_output_tokens: usize,
    pub num_beams: usize,
    pub temperature: f32,
    /// Retries per model call before the document is skipped.
    pub max_retries: usize,
    /// Concurrent inference calls allowed against the model.
    pub inference_workers: usize,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            max_input_tokens: 512,
            max_output_tokens: 150,
            num_beams: 4,
            temperature: 1.0,
            max_retries: 5,
            inference_workers: 1,
            timeout_secs: 300,
        }
    }
}

/// News search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub language: String,
    pub page_size: u32,
    pub sort_by: String,
    /// Days before today covered when no `--from` date is given.
    pub lookback_days: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://newsapi.org/v2/everything".to_string(),
            language: "en".to_string(),
            page_size: 10,
            sort_by: "popularity".to_string(),
            lookback_days: 30,
        }
    }
}

impl Config {
    /// Load the configuration file at `path`, or the defaults when `None`.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Override file settings with the flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(endpoint) = &cli.model_endpoint {
            self.model.endpoint = endpoint.clone();
        }
        if let Some(workers) = cli.workers {
            self.resolver.workers = workers;
        }
        if let Some(language) = &cli.language {
            self.search.language = language.clone();
        }
        if let Some(page_size) = cli.page_size {
            self.search.page_size = page_size;
        }
        if let Some(timeout) = cli.timeout_secs {
            self.http.timeout_secs = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.resolver.main_content_sentences, 4);
        assert_eq!(config.model.max_input_tokens, 512);
        assert_eq!(config.model.max_output_tokens, 150);
        assert_eq!(config.model.num_beams, 4);
        assert_eq!(config.model.inference_workers, 1);
        assert_eq!(config.search.page_size, 10);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let raw = "model:\n  endpoint: http://gpu-box:9000\n  num_beams: 6\nresolver:\n  workers: 2\n";
        let config = Config::from_yaml(raw).unwrap();
        assert_eq!(config.model.endpoint, "http://gpu-box:9000");
        assert_eq!(config.model.num_beams, 6);
        assert_eq!(config.model.max_output_tokens, 150);
        assert_eq!(config.resolver.workers, 2);
        assert_eq!(config.resolver.main_content_sentences, 4);
        assert_eq!(config.http, HttpConfig::default());
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(Config::from_yaml("model: [not, a, map]").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "http:\n  timeout_secs: 3").unwrap();
        let config = Config::load(file.path().to_str()).unwrap();
        assert_eq!(config.http.timeout_secs, 3);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "newsdigest",
            "--query",
            "elections",
            "--model-endpoint",
            "http://localhost:7000",
            "--workers",
            "3",
            "--language",
            "fr",
        ]);
        let mut config = Config::default();
        config.apply_cli(&cli);
        assert_eq!(config.model.endpoint, "http://localhost:7000");
        assert_eq!(config.resolver.workers, 3);
        assert_eq!(config.search.language, "fr");
        assert_eq!(config.search.page_size, 10);
    }
}
