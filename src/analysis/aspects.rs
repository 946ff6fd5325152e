//! Aspect normalization and opinion aggregation.
//!
//! Raw aspect terms are grouped into a small set of canonical names through
//! an ordered rule table, then every scored aspect of every review is folded
//! into liked/disliked snippet sets.

use crate::models::{AggregatedOpinions, ReviewRecord, Sentiment};

/// Placeholder used when no review backs an aspect.
pub const NO_EXAMPLE_FOUND: &str = "No specific example found.";

/// How a rule tests a lower-cased, trimmed aspect term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermMatch {
    /// The term contains the needle anywhere.
    Contains(&'static str),
    /// The term is exactly the needle.
    Equals(&'static str),
}

impl TermMatch {
    fn matches(&self, term: &str) -> bool {
        match self {
            TermMatch::Contains(needle) => term.contains(needle),
            TermMatch::Equals(needle) => term == *needle,
        }
    }
}

/// Maps any term satisfying one of `matchers` to `canonical`.
#[derive(Debug, Clone, Copy)]
pub struct AspectRule {
    pub matchers: &'static [TermMatch],
    pub canonical: &'static str,
}

impl AspectRule {
    pub fn matches(&self, term: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(term))
    }
}

/// Canonical aspect buckets. The first matching rule wins, so specific rules
/// must come before broader ones ("bass" before "sound").
pub const ASPECT_RULES: &[AspectRule] = &[
    AspectRule {
        matchers: &[TermMatch::Contains("bass"), TermMatch::Contains("buss")],
        canonical: "Bass",
    },
    AspectRule {
        matchers: &[TermMatch::Contains("sound")],
        canonical: "Sound Quality",
    },
    AspectRule {
        matchers: &[TermMatch::Contains("look"), TermMatch::Contains("design")],
        canonical: "Design & Look",
    },
    AspectRule {
        matchers: &[
            TermMatch::Contains("connect"),
            TermMatch::Contains("feature"),
            TermMatch::Equals("sd"),
            TermMatch::Equals("aux"),
            TermMatch::Equals("usb"),
        ],
        canonical: "Connectivity & Features",
    },
    AspectRule {
        matchers: &[TermMatch::Contains("woofer")],
        canonical: "Woofer",
    },
    AspectRule {
        matchers: &[TermMatch::Contains("size"), TermMatch::Contains("length")],
        canonical: "Size & Wire Length",
    },
];

/// Map a raw aspect term to its canonical name.
///
/// Terms no rule claims fall back to a title-cased copy of themselves.
pub fn normalize(term: &str) -> String {
    let term = term.trim().to_lowercase();
    ASPECT_RULES
        .iter()
        .find(|rule| rule.matches(&term))
        .map(|rule| rule.canonical.to_string())
        .unwrap_or_else(|| title_case(&term))
}

/// Upper-case the first letter of every word and lower-case the rest.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Clean a review excerpt for display.
///
/// Strips one layer of surrounding quotes (restoring them afterwards),
/// collapses newlines, trims, and masks a leading star rating such as
/// `"5 Great"` to `"*Great"`. Applying it twice gives the same result as
/// applying it once.
pub fn clean_snippet(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw == NO_EXAMPLE_FOUND {
        return raw.to_string();
    }

    let (quote, inner) = match raw.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let rest = &raw[1..];
            (Some(q), rest.strip_suffix(q).unwrap_or(rest))
        }
        _ => (None, raw),
    };

    let collapsed = inner.replace('\n', " ");
    let text = mask_star_rating(collapsed.trim());

    match quote {
        Some(q) => format!("{q}{text}{q}"),
        None => text,
    }
}

fn mask_star_rating(text: &str) -> String {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some('1'..='5'), None) => "*".to_string(),
        (Some('1'..='5'), Some(' ' | '\t' | '*')) => format!("*{}", text[1..].trim_start()),
        _ => text.to_string(),
    }
}

/// Quote and clean a full review text so it can serve as a snippet.
pub fn quote_review(text: &str) -> String {
    clean_snippet(&format!("\"{}\"", text))
}

/// Fold every positive and negative aspect of every review into liked and
/// disliked snippet sets keyed by canonical aspect name.
///
/// Reviews without text and aspects without a term are skipped, as are
/// neutral and unscored aspects.
pub fn aggregate(reviews: &[ReviewRecord]) -> AggregatedOpinions {
    let mut opinions = AggregatedOpinions::default();

    for review in reviews {
        if review.text.trim().is_empty() {
            continue;
        }
        let snippet = quote_review(&review.text);

        for (term, sentiment) in review.scored_pairs() {
            if sentiment == Sentiment::Neutral {
                continue;
            }
            opinions.insert(sentiment, normalize(term), snippet.clone());
        }
    }

    opinions
}
