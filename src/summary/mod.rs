//! Opinion summary stage.
//!
//! Builds the fact sheet handed to the compressor and cleans up what comes
//! back.

use crate::analysis::{tally_overall, title_case};
use crate::models::{ReviewRecord, Sentiment};

/// Summaries shorter than this are treated as a failed generation.
const MIN_SUMMARY_CHARS: usize = 20;

/// Consolidate every review into one fact sheet: overall label counts,
/// then the praised, criticized and neutral aspect terms.
///
/// Terms are listed once each, in the order they first appear.
pub fn build_fact_sheet(reviews: &[ReviewRecord]) -> String {
    let (pos, neg, neu) = tally_overall(reviews.iter().map(ReviewRecord::overall));

    format!(
        "Reviews: {} positive, {} negative, {} neutral. \
         Praised aspects: {}. Criticized aspects: {}. Neutral aspects: {}.",
        pos,
        neg,
        neu,
        join_terms(reviews, Sentiment::Positive),
        join_terms(reviews, Sentiment::Negative),
        join_terms(reviews, Sentiment::Neutral),
    )
}

fn join_terms(reviews: &[ReviewRecord], sentiment: Sentiment) -> String {
    let mut terms: Vec<&str> = Vec::new();
    for (term, label) in reviews.iter().flat_map(ReviewRecord::scored_pairs) {
        if label == sentiment && !terms.contains(&term) {
            terms.push(term);
        }
    }

    if terms.is_empty() {
        "None".to_string()
    } else {
        terms.join(", ")
    }
}

/// Human-friendly product name: dashes become spaces, words title-cased.
pub fn display_name(product_id: &str) -> String {
    title_case(&product_id.replace('-', " "))
}

/// Post-process a compressor summary.
///
/// A suspiciously short summary is flagged as inconclusive. Otherwise
/// generic references to "the product" are replaced by the display name.
pub fn polish_summary(summary: &str, product_id: &str) -> String {
    let summary = summary.trim();
    if summary.chars().count() < MIN_SUMMARY_CHARS {
        return format!(
            "Summary generation was inconclusive. Key findings: {}",
            summary
        );
    }

    let name = display_name(product_id);
    summary
        .replace("The product", &name)
        .replace("the product", &name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AspectSentiment;

    fn reviews() -> Vec<ReviewRecord> {
        vec![
            ReviewRecord::new(
                "Fast and cheap",
                vec![
                    AspectSentiment::new("speed", Sentiment::Positive, Some(0.9)),
                    AspectSentiment::new("cost", Sentiment::Neutral, Some(0.4)),
                ],
            ),
            ReviewRecord::new(
                "Screen and battery are bad",
                vec![
                    AspectSentiment::new("screen", Sentiment::Negative, Some(0.8)),
                    AspectSentiment::new("battery", Sentiment::Negative, Some(0.9)),
                ],
            ),
            ReviewRecord::new(
                "Screen is great, support helpful",
                vec![
                    AspectSentiment::new("screen", Sentiment::Positive, Some(0.8)),
                    AspectSentiment::new("support", Sentiment::Positive, Some(0.7)),
                    AspectSentiment::new("speed", Sentiment::Positive, Some(0.7)),
                ],
            ),
        ]
    }

    #[test]
    fn test_build_fact_sheet() {
        let facts = build_fact_sheet(&reviews());
        assert_eq!(
            facts,
            "Reviews: 2 positive, 1 negative, 0 neutral. \
             Praised aspects: speed, screen, support. \
             Criticized aspects: screen, battery. \
             Neutral aspects: cost."
        );
    }

    #[test]
    fn test_build_fact_sheet_empty() {
        assert_eq!(
            build_fact_sheet(&[]),
            "Reviews: 0 positive, 0 negative, 0 neutral. \
             Praised aspects: None. Criticized aspects: None. Neutral aspects: None."
        );
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("p-001"), "P 001");
        assert_eq!(display_name("boat-rockerz-450"), "Boat Rockerz 450");
    }

    #[test]
    fn test_polish_short_summary() {
        assert_eq!(
            polish_summary("Good.", "P-1"),
            "Summary generation was inconclusive. Key findings: Good."
        );
    }

    #[test]
    fn test_polish_replaces_product_reference() {
        let polished = polish_summary(
            "The product has a great screen. Users say the product charges fast.",
            "acme-phone",
        );
        assert_eq!(
            polished,
            "Acme Phone has a great screen. Users say Acme Phone charges fast."
        );
    }
}
