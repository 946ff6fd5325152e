//! Overall sentiment voting.
//!
//! Turns the weighted aspect-level labels of one review into a single
//! overall label.

use crate::models::{AspectSentiment, Sentiment};

/// Compute the overall sentiment of a review from its aspects.
///
/// Each scored aspect adds its [`AspectSentiment::weight`] to the sum of its
/// label and unscored aspects add nothing. A review without aspects is
/// `Neutral`. When the positive and negative sums are exactly equal and
/// non-zero the review is mixed and comes out `Neutral`, whatever the
/// neutral sum is. Otherwise the label with the strictly largest sum wins,
/// earlier labels in declaration order winning ties, so a review whose
/// aspects are all unscored comes out `Positive`.
///
/// Equality is exact. Weights are summed in ascending order so the result
/// does not depend on the order of `aspects`.
pub fn compute_overall(aspects: &[AspectSentiment]) -> Sentiment {
    if aspects.is_empty() {
        return Sentiment::Neutral;
    }

    let mut weights: [Vec<f64>; 3] = Default::default();
    for aspect in aspects {
        if let Some(label) = aspect.sentiment {
            weights[label.index()].push(aspect.weight());
        }
    }

    let sums = weights.map(ordered_sum);
    let positive = sums[Sentiment::Positive.index()];
    let negative = sums[Sentiment::Negative.index()];

    if positive == negative && positive > 0.0 {
        return Sentiment::Neutral;
    }

    let mut best = Sentiment::ALL[0];
    for label in Sentiment::ALL {
        if sums[label.index()] > sums[best.index()] {
            best = label;
        }
    }
    best
}

fn ordered_sum(mut weights: Vec<f64>) -> f64 {
    weights.sort_by(f64::total_cmp);
    weights.iter().sum()
}

/// Tally of overall labels across reviews: `(positive, negative, neutral)`.
pub fn tally_overall<I>(labels: I) -> (usize, usize, usize)
where
    I: IntoIterator<Item = Sentiment>,
{
    labels
        .into_iter()
        .fold((0, 0, 0), |(pos, neg, neu), label| match label {
            Sentiment::Positive => (pos + 1, neg, neu),
            Sentiment::Negative => (pos, neg + 1, neu),
            Sentiment::Neutral => (pos, neg, neu + 1),
        })
}
