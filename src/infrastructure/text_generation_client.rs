use crate::infrastructure::error::GenerationError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// OpenAI-compatible chat completion endpoint.
#[async_trait]
pub trait TextGenerationClient: Send + Sync {
    /// Returns the content of the first choice.
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTextGenerationClient {
    client: Client,
    base_url: String,
}

impl ReqwestTextGenerationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn completions_endpoint(&self) -> Result<Url, GenerationError> {
        let mut url = Url::parse(&self.base_url).map_err(|error| {
            GenerationError::Other(format!("invalid text generation base url: {error}"))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                GenerationError::Other("text generation base URL cannot be a base".to_string())
            })?;
            segments.pop_if_empty();
            segments.push("chat");
            segments.push("completions");
        }
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn service_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("http {}", status.as_u16()))
}

pub fn classify_http_error(status: StatusCode, body: &str) -> GenerationError {
    let message = service_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED => GenerationError::Credential(message),
        StatusCode::FORBIDDEN => GenerationError::Permission(message),
        StatusCode::TOO_MANY_REQUESTS => GenerationError::Quota(message),
        _ => GenerationError::Other(message),
    }
}

pub fn parse_completion_body(body: &str) -> Result<String, GenerationError> {
    let parsed = serde_json::from_str::<CompletionResponse>(body).map_err(|error| {
        GenerationError::MalformedResponse(format!("invalid completion payload: {error}"))
    })?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| GenerationError::MalformedResponse("completion has no content".to_string()))
}

#[async_trait]
impl TextGenerationClient for ReqwestTextGenerationClient {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, GenerationError> {
        if api_key.trim().is_empty() {
            return Err(GenerationError::MissingCredential);
        }
        let endpoint = self.completions_endpoint()?;
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(api_key.trim())
            .json(request)
            .send()
            .await
            .map_err(|error| GenerationError::Network(error.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| {
                GenerationError::Network(format!("failed reading response: {error}"))
            })?;
        if !status.is_success() {
            return Err(classify_http_error(status, &body));
        }
        parse_completion_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_chat_completions() {
        let client = ReqwestTextGenerationClient::new("https://api.openai.com/v1");
        assert_eq!(
            client.completions_endpoint().expect("endpoint").as_str(),
            "https://api.openai.com/v1/chat/completions"
        );

        let trailing = ReqwestTextGenerationClient::new("http://localhost:8080/v1/");
        assert_eq!(
            trailing.completions_endpoint().expect("endpoint").as_str(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn http_errors_map_to_taxonomy() {
        let body = r#"{"error":{"message":"Incorrect API key provided"}}"#;
        assert_eq!(
            classify_http_error(StatusCode::UNAUTHORIZED, body),
            GenerationError::Credential("Incorrect API key provided".to_string())
        );
        assert!(matches!(
            classify_http_error(StatusCode::FORBIDDEN, ""),
            GenerationError::Permission(_)
        ));
        assert!(matches!(
            classify_http_error(StatusCode::TOO_MANY_REQUESTS, ""),
            GenerationError::Quota(_)
        ));
        assert_eq!(
            classify_http_error(StatusCode::BAD_GATEWAY, "<html>"),
            GenerationError::Other("http 502".to_string())
        );
    }

    #[test]
    fn completion_body_yields_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(parse_completion_body(body).expect("content"), "{\"a\":1}");
        assert!(matches!(
            parse_completion_body(r#"{"choices":[]}"#),
            Err(GenerationError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_completion_body("oops"),
            Err(GenerationError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn blank_key_is_missing_credential() {
        let client = ReqwestTextGenerationClient::new("https://api.openai.com/v1");
        let request = CompletionRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![ChatMessage::user("hi")],
            max_tokens: 10,
            temperature: 0.7,
        };
        assert_eq!(
            client.complete("  ", &request).await,
            Err(GenerationError::MissingCredential)
        );
    }
}
