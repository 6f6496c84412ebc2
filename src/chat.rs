//! OpenAI-compatible chat-completion HTTP adapter.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::traits::{ChatCompletion, ChatMessage, ChatReply};

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: "https://sudoapp.dev/api/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    config: ChatConfig,
    client: reqwest::blocking::Client,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl ChatCompletion for ChatClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply, ServiceError> {
        if self.config.api_key.is_empty() {
            return Err(ServiceError::NotConfigured("chat api key"));
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        first_choice(response.json::<ChatResponse>()?)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

fn first_choice(response: ChatResponse) -> Result<ChatReply, ServiceError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| ChatReply { content })
        .ok_or_else(|| ServiceError::Malformed("chat response has no message content".into()))
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_shape() {
        let messages = [ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let request = ChatRequest {
            model: "gemini-2.0-flash",
            messages: &messages,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gemini-2.0-flash",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ]
            })
        );
    }

    #[test]
    fn test_first_choice_content() {
        let response: ChatResponse = serde_json::from_value(json!({
            "id": "x",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "[\"A, 1 St\"]"}}]
        }))
        .unwrap();
        assert_eq!(first_choice(response).unwrap().content, "[\"A, 1 St\"]");
    }

    #[test]
    fn test_no_choices_is_malformed() {
        let response: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(first_choice(response), Err(ServiceError::Malformed(_))));
    }

    #[test]
    fn test_missing_key_is_not_configured() {
        let client = ChatClient::new(ChatConfig::default()).unwrap();
        let err = client.complete(&[ChatMessage::user("hi")]).unwrap_err();
        assert_eq!(err, ServiceError::NotConfigured("chat api key"));
    }
}
