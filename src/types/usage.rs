use serde::{Deserialize, Serialize};

/// Token accounting. Missing vendor fields count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl Usage {
    /// Build from optional vendor counters; `total` is derived when absent.
    pub fn from_counts(prompt: Option<u32>, completion: Option<u32>, total: Option<u32>) -> Self {
        let prompt_tokens = prompt.unwrap_or(0);
        let completion_tokens = completion.unwrap_or(0);
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: total.unwrap_or(prompt_tokens + completion_tokens),
        }
    }

    pub fn merge(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_counts_default_to_zero() {
        let usage: Usage = serde_json::from_str("{}").unwrap();
        assert_eq!(usage, Usage::default());

        let usage = Usage::from_counts(Some(7), None, None);
        assert_eq!(usage.total_tokens, 7);
        assert_eq!(usage.completion_tokens, 0);
    }
}
