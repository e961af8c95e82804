const CHARS_PER_TOKEN: usize = 4;

/// Rough prompt sizing, used for logging and the dry-run summary.
pub trait TokenEstimator: Send + Sync {
    /// Approximate token count of `text`.
    fn estimate(&self, text: &str) -> usize;
}

/// Character-based estimator.
///
/// Uses a heuristic of approximately 4 characters per token, which is close
/// enough for sizing a prompt before it is sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTokenizer;

impl TokenEstimator for SimpleTokenizer {
    fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        text.chars()
            .count()
            .saturating_add(CHARS_PER_TOKEN - 1)
            .saturating_div(CHARS_PER_TOKEN)
            .max(1)
    }
}
