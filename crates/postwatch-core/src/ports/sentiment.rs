//! SentimentScorer port - polarity of post and reply text.

/// Scores text polarity in `[-1.0, 1.0]`.
pub trait SentimentScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

/// Scorer for deployments without a sentiment model: everything is neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralSentiment;

impl SentimentScorer for NeutralSentiment {
    fn polarity(&self, _text: &str) -> f64 {
        0.0
    }
}
