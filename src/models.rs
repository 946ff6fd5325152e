//! Data models for the review summarizer.
//!
//! This module contains the core data structures that flow through the
//! pipeline: aspect annotations, scored reviews, aggregated opinions and the
//! per-product summary.

use crate::analysis::{aggregate, compute_overall};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Sentiment label attached to an aspect or a whole review.
///
/// Declaration order is significant: it breaks ties when picking the
/// overall label of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "Positive"),
            Sentiment::Negative => write!(f, "Negative"),
            Sentiment::Neutral => write!(f, "Neutral"),
        }
    }
}

impl Sentiment {
    /// All labels in declaration order.
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    /// Parse an annotator label, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for anything that is not one of the three labels; such
    /// aspects are treated as unscored.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }

    /// Position of the label in [`Sentiment::ALL`].
    pub fn index(self) -> usize {
        match self {
            Sentiment::Positive => 0,
            Sentiment::Negative => 1,
            Sentiment::Neutral => 2,
        }
    }

    /// Returns an emoji representation of the sentiment.
    pub fn emoji(&self) -> &'static str {
        match self {
            Sentiment::Positive => "👍",
            Sentiment::Negative => "👎",
            Sentiment::Neutral => "😐",
        }
    }
}

/// Read a confidence value the way annotators emit it: a JSON number or a
/// numeric string. Anything else, including NaN and infinities, is unset.
pub fn parse_confidence(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|c| c.is_finite())
}

fn lenient_sentiment<'de, D>(deserializer: D) -> Result<Option<Sentiment>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(Sentiment::parse))
}

fn lenient_confidence<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_confidence))
}

/// One aspect term found in a review, with its sentiment and the
/// annotator's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectSentiment {
    /// Raw aspect term as the annotator produced it.
    pub term: String,
    /// Sentiment label; `None` means the annotator emitted something else.
    #[serde(default, deserialize_with = "lenient_sentiment")]
    pub sentiment: Option<Sentiment>,
    /// Annotator confidence, nominally in `[0, 1]`.
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: Option<f64>,
}

impl AspectSentiment {
    /// Creates a scored aspect.
    pub fn new(term: impl Into<String>, sentiment: Sentiment, confidence: Option<f64>) -> Self {
        Self {
            term: term.into(),
            sentiment: Some(sentiment),
            confidence,
        }
    }

    /// Creates an aspect whose label could not be read.
    pub fn unscored(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            sentiment: None,
            confidence: None,
        }
    }

    /// Voting weight of this aspect: the confidence clamped to be
    /// non-negative, or `1.0` when the confidence is missing.
    pub fn weight(&self) -> f64 {
        match self.confidence {
            Some(c) if c.is_finite() => c.max(0.0),
            _ => 1.0,
        }
    }
}

/// A review together with its aspects and derived overall sentiment.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRecord {
    /// The raw review text.
    pub text: String,
    /// Aspects in annotator order.
    pub aspects: Vec<AspectSentiment>,
    overall: Sentiment,
}

impl ReviewRecord {
    /// Creates a record, computing its overall sentiment once.
    pub fn new(text: impl Into<String>, aspects: Vec<AspectSentiment>) -> Self {
        let overall = compute_overall(&aspects);
        Self {
            text: text.into(),
            aspects,
            overall,
        }
    }

    /// The overall sentiment derived from the aspects.
    pub fn overall(&self) -> Sentiment {
        self.overall
    }

    /// Aspects that carry a recognised label, as `(term, label)` pairs.
    pub fn scored_pairs(&self) -> Vec<(&str, Sentiment)> {
        self.aspects
            .iter()
            .filter(|a| !a.term.trim().is_empty())
            .filter_map(|a| a.sentiment.map(|s| (a.term.as_str(), s)))
            .collect()
    }

    /// Whether this review tags `term` (case-insensitive) with `sentiment`.
    pub fn mentions(&self, term: &str, sentiment: Sentiment) -> bool {
        let wanted = term.trim().to_lowercase();
        self.scored_pairs()
            .iter()
            .any(|(t, s)| *s == sentiment && t.trim().to_lowercase() == wanted)
    }
}

/// Liked and disliked snippets, keyed by canonical aspect name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedOpinions {
    pub liked: BTreeMap<String, BTreeSet<String>>,
    pub disliked: BTreeMap<String, BTreeSet<String>>,
}

impl AggregatedOpinions {
    /// Record a snippet under `aspect`. Only positive and negative labels are
    /// kept; returns whether the snippet was stored.
    pub fn insert(&mut self, sentiment: Sentiment, aspect: String, snippet: String) -> bool {
        let bucket = match sentiment {
            Sentiment::Positive => &mut self.liked,
            Sentiment::Negative => &mut self.disliked,
            Sentiment::Neutral => return false,
        };
        bucket.entry(aspect).or_default().insert(snippet)
    }

    /// Returns true when nothing was liked or disliked.
    pub fn is_empty(&self) -> bool {
        self.liked.is_empty() && self.disliked.is_empty()
    }
}

/// Everything the pipeline knows about one product after scoring.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub product_id: String,
    pub reviews: Vec<ReviewRecord>,
    pub aggregated: AggregatedOpinions,
}

impl ProductSummary {
    /// Builds the summary and folds the reviews into aggregated opinions.
    pub fn new(product_id: impl Into<String>, reviews: Vec<ReviewRecord>) -> Self {
        let aggregated = aggregate(&reviews);
        Self {
            product_id: product_id.into(),
            reviews,
            aggregated,
        }
    }
}

/// The outbound prompt for the report model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    pub system_instruction: String,
    pub user_prompt: String,
}
