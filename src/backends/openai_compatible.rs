use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::error::BenchError;

const CHAT_COMPLETIONS_PATH: &str = "v1/chat/completions";

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionChoice {
    message: ChatCompletionMsg,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionMsg {
    #[serde(default)]
    content: Option<String>,
}

/// Status and body of a response, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Client for `POST {endpoint}/v1/chat/completions`.
pub struct ChatCompletionsClient {
    client: Client,
    url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl ChatCompletionsClient {
    pub fn new(
        endpoint: &str,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Option<Duration>,
    ) -> Result<Self, BenchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, endpoint, model, api_key))
    }

    /// Creates a client around an existing reqwest client.
    pub fn with_client(
        client: Client,
        endpoint: &str,
        model: impl Into<String>,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            client,
            url: format!(
                "{}/{}",
                endpoint.trim_end_matches('/'),
                CHAT_COMPLETIONS_PATH
            ),
            model: model.into(),
            api_key,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends the conversation and returns whatever came back. Only transport
    /// failures are errors; statuses are left to the caller.
    pub async fn post(&self, messages: &[ChatMessage]) -> Result<RawResponse, BenchError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("chat completion request payload: {json}");
            }
        }

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let resp = request.send().await?;
        let status = resp.status().as_u16();
        log::debug!("{} HTTP status: {status}", self.url);
        let body = resp.text().await?;
        Ok(RawResponse { status, body })
    }

    /// Sends the conversation and returns the first choice's content.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, BenchError> {
        let raw = self.post(messages).await?;
        if !raw.is_success() {
            return Err(BenchError::Status {
                status: raw.status,
                body: raw.body,
            });
        }
        parse_completion(&raw.body)
    }
}

/// Extracts `choices[0].message.content` from a chat-completion body.
pub fn parse_completion(body: &str) -> Result<String, BenchError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|err| BenchError::ResponseFormatError {
            message: err.to_string(),
            raw_response: body.to_string(),
        })?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| BenchError::ResponseFormatError {
            message: "no choices in response".to_string(),
            raw_response: body.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_slashes_are_normalized() {
        let client = ChatCompletionsClient::with_client(
            Client::new(),
            "http://localhost:1234/",
            "m",
            None,
        );
        assert_eq!(client.url, "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn parses_first_choice() {
        let body = concat!(
            r#"{"choices":[{"message":{"content":"[7] fine"}},"#,
            r#"{"message":{"content":"x"}}]}"#
        );
        assert_eq!(parse_completion(body).unwrap(), "[7] fine");
    }

    #[test]
    fn missing_choices_is_format_error() {
        let err = parse_completion(r#"{"error":"overloaded"}"#).unwrap_err();
        assert!(matches!(err, BenchError::ResponseFormatError { .. }));
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, BenchError::ResponseFormatError { .. }));
    }

    #[tokio::test]
    async fn complete_sends_bearer_and_reads_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer secret")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "judge",
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"hello"}}]}"#)
            .create_async()
            .await;

        let client = ChatCompletionsClient::new(
            &server.url(),
            "judge",
            Some(SecretString::new("secret".to_string())),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        let text = client
            .complete(&[ChatMessage::user().content("hi").build()])
            .await
            .unwrap();

        assert_eq!(text, "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn complete_reports_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("down")
            .create_async()
            .await;

        let client = ChatCompletionsClient::new(&server.url(), "m", None, None).unwrap();
        let err = client.complete(&[]).await.unwrap_err();
        assert!(matches!(err, BenchError::Status { status: 503, .. }));
    }
}
