//! Narrative report prompt and final rendering.
//!
//! The aggregated opinions are embedded as JSON inside a fixed instruction
//! template. The model's answer is passed through untouched apart from the
//! banner placed in front of it.

use crate::llm::is_error_sentinel;
use crate::models::{AggregatedOpinions, ReportRequest};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Banner placed in front of the model's text.
pub const REPORT_BANNER: &str = "# LLM-Based Human-Readable Summary\n\n";

/// Instruction sent as the system prompt.
pub const SYSTEM_PROMPT: &str = r#"You are an expert product review summarizer. You receive a JSON object
listing what users liked and disliked about a product, grouped by aspect,
with raw review snippets as evidence. Turn it into one readable report.

Your response MUST follow this layout:
1. A "Final Report" header.
2. An "Overall Summary" section: one flowing paragraph (not a list) that
   weaves together the main good and bad themes.
3. A "What Users Liked" section: 1-2 paragraphs grouping related positives.
4. A "What Users Disliked" section: 1-2 paragraphs grouping related negatives.

RULES:
- Write naturally and fluently.
- Group related aspects instead of listing every one.
- Quote snippets sparingly; use them to understand why users felt that way.
- Use Markdown (## headers, **bold**).
- The whole report, from "Final Report" to the end, MUST NOT exceed 300 words."#;

#[derive(Serialize)]
struct PromptPayload<'a> {
    product_id: &'a str,
    what_users_liked: &'a BTreeMap<String, BTreeSet<String>>,
    what_users_disliked: &'a BTreeMap<String, BTreeSet<String>>,
}

/// Build the user prompt carrying the structured review data.
pub fn build_prompt(opinions: &AggregatedOpinions, product_id: &str) -> String {
    let payload = PromptPayload {
        product_id,
        what_users_liked: &opinions.liked,
        what_users_disliked: &opinions.disliked,
    };
    let data = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| String::from("{}"));

    format!(
        "Here is the structured review data for product '{}'.\n\
         Please generate the human-readable report based on these findings.\n\n{}\n",
        product_id, data
    )
}

/// Build the full request: fixed system instruction plus the data prompt.
pub fn build_request(opinions: &AggregatedOpinions, product_id: &str) -> ReportRequest {
    ReportRequest {
        system_instruction: SYSTEM_PROMPT.to_string(),
        user_prompt: build_prompt(opinions, product_id),
    }
}

/// Put the banner in front of the model text.
pub fn render_final(raw_model_text: &str) -> String {
    format!("{}{}", REPORT_BANNER, raw_model_text)
}

/// Whether a rendered report carries an API error instead of model text.
pub fn is_degraded(report: &str) -> bool {
    is_error_sentinel(report.strip_prefix(REPORT_BANNER).unwrap_or(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::error::ApiError;
    use crate::models::Sentiment;

    fn opinions() -> AggregatedOpinions {
        let mut opinions = AggregatedOpinions::default();
        opinions.insert(Sentiment::Positive, "Bass".into(), "\"deep bass\"".into());
        opinions.insert(Sentiment::Negative, "Woofer".into(), "\"weak woofer\"".into());
        opinions
    }

    #[test]
    fn test_build_prompt_embeds_data() {
        let prompt = build_prompt(&opinions(), "P-001");

        assert!(prompt.contains("product 'P-001'"));
        assert!(prompt.contains("\"product_id\": \"P-001\""));
        assert!(prompt.contains("\"what_users_liked\""));
        assert!(prompt.contains("\"what_users_disliked\""));
        assert!(prompt.contains("\"Bass\""));
        assert!(prompt.contains("weak woofer"));
    }

    #[test]
    fn test_system_prompt_sections() {
        let request = build_request(&opinions(), "P-001");

        for section in [
            "Final Report",
            "Overall Summary",
            "What Users Liked",
            "What Users Disliked",
            "300 words",
        ] {
            assert!(request.system_instruction.contains(section), "missing {}", section);
        }
    }

    #[test]
    fn test_render_final_passes_text_through() {
        let raw = "## Final Report\n\n<b>kept as is</b>";
        let report = render_final(raw);

        assert!(report.starts_with(REPORT_BANNER));
        assert!(report.ends_with(raw));
        assert!(!is_degraded(&report));
    }

    #[test]
    fn test_degraded_report_detection() {
        let report = render_final(&ApiError::Status(403).to_string());
        assert!(is_degraded(&report));
        assert!(is_degraded(&ApiError::RetriesExhausted(5).to_string()));
    }
}
