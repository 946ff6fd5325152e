//! Review embedding helpers.

use crate::models::ReviewRecord;

/// Prompt embedded for a review without any scored aspect.
pub const NO_ASPECT_PROMPT: &str = "no salient aspect found";

/// Condense a review's scored aspects into `"term: Label; term: Label"`.
pub fn embedding_prompt(record: &ReviewRecord) -> String {
    let pairs = record.scored_pairs();
    if pairs.is_empty() {
        return NO_ASPECT_PROMPT.to_string();
    }

    pairs
        .iter()
        .map(|(term, sentiment)| format!("{}: {}", term, sentiment))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Element-wise mean of equally sized vectors.
///
/// Returns `None` for an empty input or when the dimensions disagree.
pub fn mean_vector(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let dim = vectors.first()?.len();
    if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
        return None;
    }

    let mut sum = vec![0.0f64; dim];
    for vector in vectors {
        for (acc, x) in sum.iter_mut().zip(vector) {
            *acc += f64::from(*x);
        }
    }

    let n = vectors.len() as f64;
    Some(sum.into_iter().map(|s| (s / n) as f32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AspectSentiment, Sentiment};

    #[test]
    fn test_embedding_prompt() {
        let record = ReviewRecord::new(
            "great sound, bad battery",
            vec![
                AspectSentiment::new("sound", Sentiment::Positive, Some(0.9)),
                AspectSentiment::unscored("box"),
                AspectSentiment::new("battery", Sentiment::Negative, Some(0.8)),
            ],
        );
        assert_eq!(embedding_prompt(&record), "sound: Positive; battery: Negative");

        let bare = ReviewRecord::new("ok", vec![]);
        assert_eq!(embedding_prompt(&bare), NO_ASPECT_PROMPT);
    }

    #[test]
    fn test_mean_vector() {
        let mean = mean_vector(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(mean, vec![2.0, 3.0]);

        assert_eq!(mean_vector(&[]), None);
        assert_eq!(mean_vector(&[vec![1.0], vec![1.0, 2.0]]), None);
    }
}
