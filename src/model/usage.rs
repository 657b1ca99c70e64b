use serde::{Deserialize, Serialize};

/// Token usage reported by an endpoint.
///
/// Embedding and ranking endpoints only report part of these counters; the
/// missing ones default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    #[serde(alias = "input_tokens")]
    pub prompt_tokens: u32,
    #[serde(alias = "output_tokens")]
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_input_output_aliases() {
        let usage: Usage =
            serde_json::from_str(r#"{"input_tokens": 12, "output_tokens": 30}"#).unwrap();
        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.completion_tokens, 30);
        assert_eq!(usage.total_tokens, 0);
    }
}
