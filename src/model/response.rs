use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::request::RequestKind;
use super::usage::Usage;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One generated completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub message: ChoiceMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// One embedding vector, positioned by `index` within the request input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingData {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub embedding: Vec<f32>,
}

/// Relevance of one passage, positioned by `index` within the request passages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub index: usize,
    pub logit: f64,
}

/// Response returned by a model endpoint.
///
/// Chat endpoints fill `choices`, embedding endpoints `data` and rerankers
/// `rankings`. Fields the crate does not model are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<EmbeddingData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rankings: Vec<Ranking>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelResponse {
    /// Number of results relevant to a request of the given kind.
    pub fn result_count(&self, kind: RequestKind) -> usize {
        match kind {
            RequestKind::Chat => self.choices.len(),
            RequestKind::Embedding => self.data.len(),
            RequestKind::Rerank => self.rankings.len(),
        }
    }

    /// Content of the first completion, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }

    pub fn completion_tokens(&self) -> Option<u32> {
        self.usage.map(|usage| usage.completion_tokens)
    }
}
