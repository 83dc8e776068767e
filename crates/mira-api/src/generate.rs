//! The AI text-generation backend, kept behind a trait: the chat
//! handlers see `generate(prompt, history) -> text` and nothing else.

use std::future::Future;
use std::pin::Pin;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

pub trait TextGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        history: &'a [ChatTurn],
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

/// OpenAI-style chat-completions client.
pub struct HttpGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpGenerator {
    pub fn new(url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            model,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl TextGenerator for HttpGenerator {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        history: &'a [ChatTurn],
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let mut messages = history.to_vec();
            messages.push(ChatTurn {
                role: "user".to_string(),
                content: prompt.to_string(),
            });

            let mut request = self.client.post(&self.url).json(&CompletionRequest {
                model: &self.model,
                messages,
            });
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            debug!(url = %self.url, "requesting completion");
            let response = request.send().await?.error_for_status()?;
            let body: CompletionResponse = response.json().await?;

            body.choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| anyhow!("completion response had no choices"))
        })
    }
}
