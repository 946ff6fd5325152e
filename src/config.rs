//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.revsum.toml` files.

use crate::cli::{Args, ReportStyle};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".revsum.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Report model settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Aspect annotator settings.
    #[serde(default)]
    pub annotator: AnnotatorConfig,

    /// Embedding service settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Summarization service settings.
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory the run artifacts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Reviews beyond this count are ignored.
    #[serde(default = "default_max_reviews")]
    pub max_reviews: usize,

    /// Log at debug level unless `--quiet` is given.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_reviews: default_max_reviews(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./outputs")
}

fn default_max_reviews() -> usize {
    50
}

/// Report model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Endpoint template; `{model}` is replaced by the model name.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// API key. Prefer `REVSUM_API_KEY` over storing it here.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-attempt timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,

    /// Maximum attempts per report.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            api_key: None,
            timeout_seconds: default_llm_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl LlmConfig {
    /// The concrete endpoint for the configured model.
    pub fn endpoint(&self) -> String {
        self.api_url.replace("{model}", &self.model)
    }
}

fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash-preview-09-2025".to_string()
}

fn default_llm_timeout() -> u64 {
    90
}

fn default_max_retries() -> u32 {
    crate::llm::DEFAULT_MAX_RETRIES
}

fn default_service_timeout() -> u64 {
    120
}

/// Aspect annotator settings. A file takes precedence over an endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Precomputed annotations file.
    #[serde(default)]
    pub file: Option<PathBuf>,

    #[serde(default = "default_service_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            file: None,
            timeout_seconds: default_service_timeout(),
        }
    }
}

/// Embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Without an endpoint, no embeddings are computed.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_embedding_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_service_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            dir: default_embedding_dir(),
            timeout_seconds: default_service_timeout(),
        }
    }
}

fn default_embedding_dir() -> PathBuf {
    PathBuf::from("./embeddings")
}

/// Summarization service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Without an endpoint, the fact sheet is the summary.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_min_length")]
    pub min_length: usize,

    #[serde(default = "default_max_length")]
    pub max_length: usize,

    #[serde(default = "default_service_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            min_length: default_min_length(),
            max_length: default_max_length(),
            timeout_seconds: default_service_timeout(),
        }
    }
}

fn default_min_length() -> usize {
    60
}

fn default_max_length() -> usize {
    180
}

/// Report generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub style: ReportStyle,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.clone();
        }
        if let Some(max_reviews) = args.max_reviews {
            self.general.max_reviews = max_reviews;
        }

        if let Some(ref key) = args.api_key {
            self.llm.api_key = Some(key.clone());
        }
        if let Some(ref model) = args.model {
            self.llm.model = model.clone();
        }
        if let Some(timeout) = args.timeout {
            self.llm.timeout_seconds = timeout;
        }
        if let Some(max_retries) = args.max_retries {
            self.llm.max_retries = max_retries;
        }

        // A source given on the command line replaces both file and endpoint.
        if let Some(ref path) = args.annotations {
            self.annotator.file = Some(path.clone());
            self.annotator.endpoint = None;
        } else if let Some(ref url) = args.annotator_url {
            self.annotator.endpoint = Some(url.clone());
            self.annotator.file = None;
        }

        if let Some(ref url) = args.embedding_url {
            self.embedding.endpoint = Some(url.clone());
        }
        if let Some(ref url) = args.summarizer_url {
            self.summarizer.endpoint = Some(url.clone());
        }

        if let Some(style) = args.style {
            self.report.style = style;
        }

        // Blank keys count as missing.
        if self.llm.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.llm.api_key = None;
        }
    }

    /// Check the merged settings before anything is built from them.
    pub fn validate(&self) -> Result<()> {
        if self.general.max_reviews == 0 {
            bail!("max_reviews must be at least 1");
        }
        if self.llm.max_retries == 0 {
            bail!("max_retries must be at least 1");
        }
        if self.llm.timeout_seconds == 0 {
            bail!("timeout_seconds must be at least 1");
        }
        if self.summarizer.min_length > self.summarizer.max_length {
            bail!(
                "summarizer min_length ({}) exceeds max_length ({})",
                self.summarizer.min_length,
                self.summarizer.max_length
            );
        }
        if self.report.style.includes_narrative() && self.llm.api_key.is_none() {
            bail!(
                "The narrative report needs an API key (--api-key, REVSUM_API_KEY or [llm] api_key). \
                 Use --style list to skip the report model."
            );
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.max_reviews, 50);
        assert_eq!(config.llm.model, "gemini-2.5-flash-preview-09-2025");
        assert_eq!(config.llm.max_retries, 5);
        assert_eq!(config.summarizer.min_length, 60);
        assert_eq!(config.summarizer.max_length, 180);
        assert_eq!(config.report.style, ReportStyle::Narrative);
        assert!(config.llm.endpoint().ends_with("models/gemini-2.5-flash-preview-09-2025:generateContent"));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output_dir = "./custom"
max_reviews = 20
verbose = true

[llm]
model = "gemini-pro"
max_retries = 3

[annotator]
endpoint = "http://localhost:9000/annotate"

[report]
style = "both"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output_dir, PathBuf::from("./custom"));
        assert_eq!(config.general.max_reviews, 20);
        assert!(config.general.verbose);
        assert_eq!(config.llm.model, "gemini-pro");
        assert_eq!(config.llm.max_retries, 3);
        assert_eq!(config.llm.timeout_seconds, 90);
        assert_eq!(
            config.annotator.endpoint.as_deref(),
            Some("http://localhost:9000/annotate")
        );
        assert_eq!(config.report.style, ReportStyle::Both);
        assert_eq!(config.embedding.dir, PathBuf::from("./embeddings"));
    }

    #[test]
    fn test_merge_with_args() {
        let mut config: Config = toml::from_str(
            r#"
[annotator]
endpoint = "http://localhost:9000/annotate"

[llm]
api_key = "from-file"
"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "revsum",
            "--reviews",
            "r.json",
            "--annotations",
            "a.json",
            "--style",
            "list",
            "--max-retries",
            "2",
        ])
        .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.annotator.file, Some(PathBuf::from("a.json")));
        assert_eq!(config.annotator.endpoint, None);
        assert_eq!(config.report.style, ReportStyle::List);
        assert_eq!(config.llm.max_retries, 2);
        assert_eq!(config.llm.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_validate_requires_key_for_narrative() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.report.style = ReportStyle::List;
        assert!(config.validate().is_ok());

        config.report.style = ReportStyle::Both;
        config.llm.api_key = Some("key".to_string());
        assert!(config.validate().is_ok());

        config.summarizer.min_length = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[llm]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.llm.model, Config::default().llm.model);
    }
}
