use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use llm_fanout::{
    model::{
        ChatMessage, ChatRequest, EmbeddingRequest, InputType, ModelRequest, RerankRequest,
        Truncate,
    },
    RequestShaper,
};

/// One line of a rerank input file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RerankItem {
    pub query: String,
    pub passages: Vec<String>,
}

pub fn repeated_prompt(prompt: &str, n: usize) -> Vec<String> {
    vec![prompt.to_string(); n]
}

/// Non-blank lines of a text file.
pub fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading workload {}", path.display()))?;
    Ok(parse_lines(&contents))
}

fn parse_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

pub fn read_rerank_items(path: &Path) -> anyhow::Result<Vec<RerankItem>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading workload {}", path.display()))?;
    parse_rerank_items(&contents)
        .with_context(|| format!("parsing workload {}", path.display()))
}

fn parse_rerank_items(contents: &str) -> anyhow::Result<Vec<RerankItem>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<RerankItem>(line).with_context(|| format!("line {}", i + 1))
        })
        .collect()
}

pub fn read_schema(path: &Path) -> anyhow::Result<Value> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading schema {}", path.display()))?;
    let schema: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parsing schema {}", path.display()))?;
    anyhow::ensure!(schema.is_object(), "schema {} is not a JSON object", path.display());
    Ok(schema)
}

/// A system prompt and the item as user prompt, one call per item.
pub fn chat_shaper(
    system: String,
    max_tokens: u32,
    temperature: Option<f32>,
    guided_json: Option<Value>,
) -> RequestShaper<String> {
    RequestShaper::per_item(move |prompt: &String, _model: &str| {
        let messages = vec![
            ChatMessage::system().content(system.as_str()).build(),
            ChatMessage::user().content(prompt.as_str()).build(),
        ];
        let mut request = ChatRequest::new(messages, max_tokens).temperature(temperature);
        if let Some(schema) = &guided_json {
            request = request.guided_json(schema.clone());
        }
        ModelRequest::from(request)
    })
}

/// The whole batch in a single embedding call.
pub fn embedding_shaper(input_type: InputType) -> RequestShaper<String> {
    RequestShaper::per_batch(move |texts: &[String], _model: &str| {
        ModelRequest::from(EmbeddingRequest {
            input: texts.to_vec(),
            input_type,
        })
    })
}

pub fn rerank_shaper(truncate: Truncate) -> RequestShaper<RerankItem> {
    RequestShaper::per_item(move |item: &RerankItem, _model: &str| {
        ModelRequest::from(RerankRequest {
            query: item.query.clone(),
            passages: item.passages.clone(),
            truncate,
        })
    })
}
