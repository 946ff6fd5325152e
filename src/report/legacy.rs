//! List-style report built straight from the data, without any model call.
//!
//! Each distinct aspect term gets one bullet backed by the first review, in
//! original order, that tags it with the same sentiment.

use crate::analysis::{clean_snippet, title_case, NO_EXAMPLE_FOUND};
use crate::models::{ProductSummary, ReviewRecord, Sentiment};
use std::collections::BTreeSet;

/// Find the first review tagging `aspect` with `sentiment` and return it
/// quoted, or the placeholder when none does.
pub fn find_best_review(aspect: &str, sentiment: Sentiment, reviews: &[ReviewRecord]) -> String {
    reviews
        .iter()
        .find(|review| review.mentions(aspect, sentiment))
        .map(|review| format!("\"{}\"", review.text))
        .unwrap_or_else(|| NO_EXAMPLE_FOUND.to_string())
}

/// Distinct raw aspect terms tagged with `sentiment`, sorted.
fn distinct_terms(reviews: &[ReviewRecord], sentiment: Sentiment) -> BTreeSet<String> {
    reviews
        .iter()
        .flat_map(|review| review.scored_pairs())
        .filter(|(_, s)| *s == sentiment)
        .map(|(term, _)| term.trim().to_lowercase())
        .collect()
}

/// Generate the list-style report.
pub fn generate_original_report(summary_text: &str, product: &ProductSummary) -> String {
    let mut output = String::new();

    output.push_str(&generate_header(&product.product_id));
    output.push_str(&generate_summary_section(summary_text));
    output.push_str(&generate_aspect_section(
        &format!("{} What Users Liked", Sentiment::Positive.emoji()),
        Sentiment::Positive,
        &product.reviews,
    ));
    output.push_str(&generate_aspect_section(
        &format!("{} What Users Disliked", Sentiment::Negative.emoji()),
        Sentiment::Negative,
        &product.reviews,
    ));

    output
}

fn generate_header(product_id: &str) -> String {
    let rule = "=".repeat(40);
    format!(
        "{rule}\n✅ FINAL REVIEW SUMMARY FOR PRODUCT: {} (List Format)\n{rule}\n",
        product_id
    )
}

fn generate_summary_section(summary_text: &str) -> String {
    format!("\n## 📝 Overall Summary\n\n{}\n", summary_text.trim())
}

fn generate_aspect_section(title: &str, sentiment: Sentiment, reviews: &[ReviewRecord]) -> String {
    let terms = distinct_terms(reviews, sentiment);
    if terms.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str(&format!("\n{}\n\n## {}\n\n", "-".repeat(20), title));

    for term in &terms {
        let example = find_best_review(term, sentiment, reviews);
        section.push_str(&format!(
            "- **{}:** {}\n",
            title_case(term),
            clean_snippet(&example)
        ));
    }

    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AspectSentiment;

    fn product() -> ProductSummary {
        ProductSummary::new(
            "P-DUMMY-001",
            vec![
                ReviewRecord::new(
                    "5 The sound quality is amazing and the bass is deep!",
                    vec![
                        AspectSentiment::new("sound quality", Sentiment::Positive, Some(0.9)),
                        AspectSentiment::new("bass", Sentiment::Positive, Some(0.9)),
                    ],
                ),
                ReviewRecord::new(
                    "1 The design is nice but the woofer is very weak.",
                    vec![
                        AspectSentiment::new("design", Sentiment::Positive, Some(0.8)),
                        AspectSentiment::new("woofer", Sentiment::Negative, Some(0.9)),
                    ],
                ),
                ReviewRecord::new(
                    "Woofer rattles at high volume",
                    vec![AspectSentiment::new("Woofer", Sentiment::Negative, Some(0.6))],
                ),
            ],
        )
    }

    #[test]
    fn test_find_best_review_first_match() {
        let product = product();
        assert_eq!(
            find_best_review("WOOFER", Sentiment::Negative, &product.reviews),
            "\"1 The design is nice but the woofer is very weak.\""
        );
        assert_eq!(
            find_best_review("woofer", Sentiment::Positive, &product.reviews),
            NO_EXAMPLE_FOUND
        );
    }

    #[test]
    fn test_generate_original_report() {
        let report = generate_original_report("Users love the sound.", &product());

        assert!(report.contains("FINAL REVIEW SUMMARY FOR PRODUCT: P-DUMMY-001"));
        assert!(report.contains("## 📝 Overall Summary\n\nUsers love the sound."));
        assert!(report.contains("## 👍 What Users Liked"));
        assert!(report.contains("- **Bass:** \"*The sound quality is amazing and the bass is deep!\""));
        assert!(report.contains("- **Design:** \"*The design is nice but the woofer is very weak.\""));
        assert!(report.contains("## 👎 What Users Disliked"));
        // Case variants of one term collapse to a single bullet.
        assert_eq!(report.matches("- **Woofer:**").count(), 1);
    }

    #[test]
    fn test_sections_sorted_by_term() {
        let report = generate_original_report("", &product());
        let bass = report.find("**Bass:**").unwrap();
        let design = report.find("**Design:**").unwrap();
        let sound = report.find("**Sound Quality:**").unwrap();
        assert!(bass < design && design < sound);
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let product = ProductSummary::new(
            "P-2",
            vec![ReviewRecord::new(
                "fine",
                vec![AspectSentiment::new("price", Sentiment::Neutral, None)],
            )],
        );
        let report = generate_original_report("ok", &product);
        assert!(!report.contains("What Users Liked"));
        assert!(!report.contains("What Users Disliked"));
    }
}
