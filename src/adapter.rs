use crate::config::{EndpointType, EvaluationConfig, RequestMethod};
use crate::error::EvalError;
use crate::questions::EvaluationQuestion;
use reqwest::Client;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Timeout applied to each question's request
pub const QUESTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the single-request probe that opens a run
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Response body excerpt length kept in error notes
const ERROR_BODY_EXCERPT: usize = 200;

/// An outbound request, fully constructed but not yet dispatched
#[derive(Debug, Clone)]
pub struct BuiltRequest {
    pub url: String,
    pub method: RequestMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

/// Build the outbound request for one question.
///
/// The request shape follows the configured endpoint type; headers always
/// carry `Content-Type: application/json` unless the caller overrides it,
/// and a bearer token is injected when an API key is configured without an
/// explicit Authorization header.
pub fn build_request(
    question: &EvaluationQuestion,
    config: &EvaluationConfig,
) -> Result<BuiltRequest, EvalError> {
    let mut headers = HashMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    for (key, value) in &config.headers {
        headers.insert(key.clone(), value.clone());
    }
    if let Some(api_key) = &config.api_key {
        if !headers.contains_key("Authorization") {
            headers.insert("Authorization".to_string(), format!("Bearer {}", api_key));
        }
    }

    let mut url = config.endpoint.clone();
    let mut method = config.request_method;

    let body = match config.endpoint_type {
        EndpointType::Openai => {
            method = RequestMethod::Post;
            Some(json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": question.text}],
                "temperature": 0
            }))
        }
        EndpointType::Anthropic => {
            method = RequestMethod::Post;
            Some(json!({
                "model": "claude-2",
                "prompt": question.text,
                "temperature": 0
            }))
        }
        EndpointType::Custom => Some(render_template(config, &question.text)?),
        EndpointType::Generic => match method {
            RequestMethod::Get => {
                let mut parsed = reqwest::Url::parse(&url).map_err(|e| {
                    EvalError::Config(format!("invalid endpoint URL {:?}: {}", url, e))
                })?;
                parsed
                    .query_pairs_mut()
                    .append_pair("query", &question.text);
                url = parsed.to_string();
                None
            }
            RequestMethod::Post => Some(json!({"query": question.text})),
        },
    };

    Ok(BuiltRequest {
        url,
        method,
        headers,
        body,
    })
}

/// Substitute `{{query}}` throughout the serialized custom template.
///
/// Substitution happens over the serialized form rather than a per-field
/// walk, so the placeholder works at any nesting depth; the question text is
/// JSON-escaped first to keep the result parseable.
fn render_template(config: &EvaluationConfig, question_text: &str) -> Result<Value, EvalError> {
    let template = config.request_format.as_ref().ok_or_else(|| {
        EvalError::Config("custom endpoint type requires a request_format template".to_string())
    })?;

    let escaped = serde_json::to_string(question_text)
        .map_err(|e| EvalError::Config(format!("unencodable question text: {}", e)))?;
    // Strip the surrounding quotes added by the JSON encoding
    let escaped = &escaped[1..escaped.len() - 1];

    let rendered = template.to_string().replace("{{query}}", escaped);
    serde_json::from_str(&rendered)
        .map_err(|e| EvalError::Config(format!("request_format did not survive substitution: {}", e)))
}

/// Dispatch a built request and return the response as a JSON value.
///
/// Non-JSON bodies come back as a JSON string so the extractor's raw-string
/// fallback applies. Timeouts, connection failures, and non-2xx statuses map
/// onto the corresponding `EvalError` variants.
pub async fn dispatch(
    client: &Client,
    request: &BuiltRequest,
    timeout: Duration,
) -> Result<Value, EvalError> {
    debug!(
        url = %request.url,
        method = ?request.method,
        authorized = request.headers.contains_key("Authorization"),
        "dispatching evaluation request"
    );

    let mut builder = match request.method {
        RequestMethod::Get => client.get(&request.url),
        RequestMethod::Post => client.post(&request.url),
    };
    for (key, value) in &request.headers {
        builder = builder.header(key, value);
    }
    if let Some(body) = &request.body {
        builder = builder.body(body.to_string());
    }

    let response = builder
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_send_error(e, timeout))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| EvalError::Network(format!("failed reading response body: {}", e)))?;

    if !status.is_success() {
        return Err(EvalError::Http {
            status: status.as_u16(),
            body: excerpt(&text),
        });
    }

    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

fn classify_send_error(err: reqwest::Error, timeout: Duration) -> EvalError {
    if err.is_timeout() {
        EvalError::Timeout(timeout.as_secs())
    } else {
        EvalError::Network(err.to_string())
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(ERROR_BODY_EXCERPT).collect()
}
