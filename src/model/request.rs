use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::ChatMessage;

/// The family of endpoint a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Chat,
    Embedding,
    Rerank,
}

/// Generative request: role-tagged turns plus generation controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Upper bound on completion tokens; also enforced on the response
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// JSON schema the completion must follow (guided decoding)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guided_json: Option<Value>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>, max_tokens: u32) -> Self {
        Self {
            messages,
            max_tokens,
            temperature: None,
            guided_json: None,
        }
    }

    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn guided_json(mut self, schema: Value) -> Self {
        self.guided_json = Some(schema);
        self
    }
}

/// Whether embedded texts are search queries or indexed passages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Query,
    Passage,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Query => "query",
            InputType::Passage => "passage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub input: Vec<String>,
    #[serde(default)]
    pub input_type: InputType,
}

/// How a reranker should treat passages longer than its context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Truncate {
    None,
    #[default]
    End,
}

impl Truncate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Truncate::None => "NONE",
            Truncate::End => "END",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankRequest {
    pub query: String,
    pub passages: Vec<String>,
    #[serde(default)]
    pub truncate: Truncate,
}

/// Payload handed to a [`crate::endpoint::ModelEndpoint`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelRequest {
    Chat(ChatRequest),
    Embedding(EmbeddingRequest),
    Rerank(RerankRequest),
}

impl ModelRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            ModelRequest::Chat(_) => RequestKind::Chat,
            ModelRequest::Embedding(_) => RequestKind::Embedding,
            ModelRequest::Rerank(_) => RequestKind::Rerank,
        }
    }

    /// Number of results a well-formed response carries: one completion for
    /// chat, one vector per input, one ranking per passage.
    pub fn expected_results(&self) -> usize {
        match self {
            ModelRequest::Chat(_) => 1,
            ModelRequest::Embedding(req) => req.input.len(),
            ModelRequest::Rerank(req) => req.passages.len(),
        }
    }

    pub fn max_tokens(&self) -> Option<u32> {
        match self {
            ModelRequest::Chat(req) => Some(req.max_tokens),
            _ => None,
        }
    }

    pub fn guided_schema(&self) -> Option<&Value> {
        match self {
            ModelRequest::Chat(req) => req.guided_json.as_ref(),
            _ => None,
        }
    }
}

impl From<ChatRequest> for ModelRequest {
    fn from(req: ChatRequest) -> Self {
        ModelRequest::Chat(req)
    }
}

impl From<EmbeddingRequest> for ModelRequest {
    fn from(req: EmbeddingRequest) -> Self {
        ModelRequest::Embedding(req)
    }
}

impl From<RerankRequest> for ModelRequest {
    fn from(req: RerankRequest) -> Self {
        ModelRequest::Rerank(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_results_follow_request_shape() {
        let chat: ModelRequest =
            ChatRequest::new(vec![ChatMessage::user().content("hi").build()], 62).into();
        let embed: ModelRequest = EmbeddingRequest {
            input: vec!["a".into(), "b".into(), "c".into()],
            input_type: InputType::Query,
        }
        .into();
        let rerank: ModelRequest = RerankRequest {
            query: "q".into(),
            passages: vec!["p1".into(), "p2".into()],
            truncate: Truncate::End,
        }
        .into();

        assert_eq!(chat.expected_results(), 1);
        assert_eq!(embed.expected_results(), 3);
        assert_eq!(rerank.expected_results(), 2);
        assert_eq!(chat.max_tokens(), Some(62));
        assert_eq!(embed.max_tokens(), None);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let req: ModelRequest = EmbeddingRequest {
            input: vec!["text".into()],
            input_type: InputType::Passage,
        }
        .into();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["kind"], "embedding");
        assert_eq!(json["input_type"], "passage");
    }
}
