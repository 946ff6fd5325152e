//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::pipeline::DEFAULT_PRODUCT_ID;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// revsum - aspect-based product review summarizer
///
/// Scores annotated reviews, aggregates what users liked and disliked,
/// and writes a narrative report through an LLM and/or a list-style
/// report built locally.
///
/// Examples:
///   revsum --reviews reviews.json --annotations aspects.json --style list
///   revsum --reviews reviews.txt --annotator-url http://localhost:9000/annotate --api-key KEY
///   revsum --reviews reviews.json --annotations aspects.json --json
///   revsum --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Review file to summarize
    ///
    /// Either a JSON array of strings or plain text with one review per line.
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub reviews: Option<PathBuf>,

    /// Precomputed aspect annotations, aligned with the reviews
    #[arg(short, long, value_name = "FILE", conflicts_with = "annotator_url")]
    pub annotations: Option<PathBuf>,

    /// Aspect extraction service endpoint
    #[arg(long, value_name = "URL", env = "REVSUM_ANNOTATOR_URL")]
    pub annotator_url: Option<String>,

    /// Sentence embedding service endpoint
    #[arg(long, value_name = "URL", env = "REVSUM_EMBEDDING_URL")]
    pub embedding_url: Option<String>,

    /// Summarization service endpoint
    ///
    /// Without one, the fact sheet itself is used as the simple summary.
    #[arg(long, value_name = "URL", env = "REVSUM_SUMMARIZER_URL")]
    pub summarizer_url: Option<String>,

    /// Product identifier used to name the artifacts
    #[arg(short, long, default_value = DEFAULT_PRODUCT_ID, value_name = "ID")]
    pub product_id: String,

    /// API key for the report model
    #[arg(long, env = "REVSUM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Report model name
    #[arg(short, long, env = "REVSUM_MODEL")]
    pub model: Option<String>,

    /// Directory for the run artifacts
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Report style
    #[arg(long, value_name = "STYLE")]
    pub style: Option<ReportStyle>,

    /// Maximum number of reviews to process
    #[arg(long, value_name = "COUNT")]
    pub max_reviews: Option<usize>,

    /// Maximum attempts for the report model call
    #[arg(long, value_name = "COUNT")]
    pub max_retries: Option<u32>,

    /// Per-attempt timeout for the report model, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the result as JSON instead of markdown
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .revsum.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .revsum.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Which report(s) to produce.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportStyle {
    /// Narrative report written by the report model (default)
    #[default]
    Narrative,
    /// List-style report built from the data, no model call
    List,
    /// Narrative report followed by the list-style report
    Both,
}

impl ReportStyle {
    pub fn includes_narrative(self) -> bool {
        matches!(self, ReportStyle::Narrative | ReportStyle::Both)
    }

    pub fn includes_list(self) -> bool {
        matches!(self, ReportStyle::List | ReportStyle::Both)
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        for (flag, url) in [
            ("--annotator-url", &self.annotator_url),
            ("--embedding-url", &self.embedding_url),
            ("--summarizer-url", &self.summarizer_url),
        ] {
            if let Some(url) = url {
                if !is_http_url(url) {
                    return Err(format!("{} must start with 'http://' or 'https://'", flag));
                }
            }
        }

        if self.max_reviews == Some(0) {
            return Err("Max reviews must be at least 1".to_string());
        }

        if self.max_retries == Some(0) {
            return Err("Max retries must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.product_id.trim().is_empty() {
            return Err("Product id must not be empty".to_string());
        }

        if let Some(ref path) = self.reviews {
            if !path.is_file() {
                return Err(format!("Review file does not exist: {}", path.display()));
            }
        }

        if let Some(ref path) = self.annotations {
            if !path.is_file() {
                return Err(format!("Annotation file does not exist: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the config file's `verbose` setting; `--quiet`
    /// overrides it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            reviews: None,
            annotations: None,
            annotator_url: Some("http://localhost:9000/annotate".to_string()),
            embedding_url: None,
            summarizer_url: None,
            product_id: DEFAULT_PRODUCT_ID.to_string(),
            api_key: None,
            model: None,
            output_dir: None,
            style: None,
            max_reviews: None,
            max_retries: None,
            timeout: None,
            json: false,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_valid_args() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.summarizer_url = Some("localhost:9000".to_string());
        let err = args.validate().unwrap_err();
        assert!(err.contains("--summarizer-url"));
    }

    #[test]
    fn test_validation_counts() {
        let mut args = make_args();
        args.max_reviews = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.max_retries = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_review_file() {
        let mut args = make_args();
        args.reviews = Some(PathBuf::from("/no/such/reviews.json"));
        assert!(args.validate().unwrap_err().contains("Review file"));
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_report_style() {
        assert!(ReportStyle::Narrative.includes_narrative());
        assert!(!ReportStyle::Narrative.includes_list());
        assert!(!ReportStyle::List.includes_narrative());
        assert!(ReportStyle::Both.includes_narrative() && ReportStyle::Both.includes_list());
        assert_eq!(ReportStyle::default(), ReportStyle::Narrative);
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "revsum",
            "--reviews",
            "reviews.json",
            "--annotations",
            "aspects.json",
            "--style",
            "both",
            "--max-reviews",
            "10",
        ])
        .unwrap();
        assert_eq!(args.style, Some(ReportStyle::Both));
        assert_eq!(args.max_reviews, Some(10));
        assert_eq!(args.product_id, DEFAULT_PRODUCT_ID);
    }
}
