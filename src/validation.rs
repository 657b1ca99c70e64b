use serde_json::Value;

use crate::{
    error::ContractViolation,
    model::{ModelRequest, ModelResponse, RequestKind},
};

/// Checks a response must pass before it is trusted and traced.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseContract {
    kind: RequestKind,
    expected_model: Option<String>,
    expected_results: usize,
    max_tokens: Option<u32>,
    guided_schema: Option<Value>,
}

impl ResponseContract {
    /// Single-completion chat contract: identity, exactly one choice, token budget.
    pub fn single_completion(expected_model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            kind: RequestKind::Chat,
            expected_model: Some(expected_model.into()),
            expected_results: 1,
            max_tokens: Some(max_tokens),
            guided_schema: None,
        }
    }

    /// Derives the contract a response to `request` sent to `model_id` must satisfy.
    ///
    /// Ranking responses carry no model identity, so the rerank contract only
    /// checks the number of rankings.
    pub fn for_request(model_id: &str, request: &ModelRequest) -> Self {
        let kind = request.kind();
        Self {
            kind,
            expected_model: match kind {
                RequestKind::Rerank => None,
                _ => Some(model_id.to_string()),
            },
            expected_results: request.expected_results(),
            max_tokens: request.max_tokens(),
            guided_schema: request.guided_schema().cloned(),
        }
    }

    /// Runs every check in order and returns the first violation.
    pub fn validate(&self, response: &ModelResponse) -> Result<(), ContractViolation> {
        if let Some(expected) = &self.expected_model {
            if response.model.as_deref() != Some(expected.as_str()) {
                return Err(ContractViolation::ModelIdentityMismatch {
                    expected: expected.clone(),
                    actual: response.model.clone(),
                });
            }
        }

        let actual = response.result_count(self.kind);
        if actual != self.expected_results {
            return Err(ContractViolation::UnexpectedCompletionCount {
                expected: self.expected_results,
                actual,
            });
        }

        if let Some(max_tokens) = self.max_tokens {
            let completion_tokens = response
                .completion_tokens()
                .ok_or(ContractViolation::MissingUsage)?;
            if completion_tokens > max_tokens {
                return Err(ContractViolation::TokenBudgetExceeded {
                    completion_tokens,
                    max_tokens,
                });
            }
        }

        if let Some(schema) = &self.guided_schema {
            check_guided_output(schema, response.text().unwrap_or_default())?;
        }

        Ok(())
    }
}

/// Validates a single-completion chat response.
pub fn validate(
    response: &ModelResponse,
    expected_model: &str,
    max_tokens: u32,
) -> Result<(), ContractViolation> {
    ResponseContract::single_completion(expected_model, max_tokens).validate(response)
}

fn check_guided_output(schema: &Value, content: &str) -> Result<(), ContractViolation> {
    let parsed: Value = serde_json::from_str(content.trim())
        .map_err(|err| ContractViolation::GuidedOutputRejected(format!("not JSON: {err}")))?;
    let object = parsed.as_object().ok_or_else(|| {
        ContractViolation::GuidedOutputRejected("expected a JSON object".to_string())
    })?;

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    for key in required {
        if !object.contains_key(key) {
            return Err(ContractViolation::GuidedOutputRejected(format!(
                "missing required field `{key}`"
            )));
        }
    }
    Ok(())
}
