use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::sanitize::clean_model_response;
use crate::state::{connection_fallback, ChatMessage};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "qwen3";

pub const SYSTEM_PROMPT: &str = "You are a helpful and patient math tutor. \
Instead of providing complete solutions, ask questions to understand where the student is stuck. \
Then provide incremental hints that guide them toward discovering the answer themselves. \
Format all math using LaTeX notation surrounded by $ symbols like $x^2$. \
Use **bold** for emphasis and *italics* for important terms. \
Keep your responses brief and focused on the specific obstacle the student is facing. \
Never solve the entire problem for them. \
If they seem to be making progress, acknowledge it with encouraging words and ask what their next step would be. \
If a student gives a correct answer, congratulate them. \
IMPORTANT: Never include your thinking process in <think> tags or show any meta-commentary about your approach. \
Just respond naturally as a tutor would.";

/// Sampling options sent with every chat request.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: 0.9,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

// Only the reply text is read; `role` and the rest may be absent.
#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Like [`OllamaClient::new`], with an overall per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send the conversation, prefixed by the tutor system prompt, and return
    /// the assistant's raw reply.
    pub async fn chat(
        &self,
        model: &str,
        history: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend_from_slice(history);

        let request = ChatRequest {
            model,
            messages,
            stream: false,
            options: *options,
        };

        debug!("POST {} ({} messages)", url, request.messages.len());

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Ollama request failed with status: {}. Make sure Ollama is running with: ollama serve",
                response.status()
            ));
        }

        let chat_response: ChatResponse = response.json().await?;
        Ok(chat_response.message.content)
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to list models: {}", response.status()));
        }

        let models_response: OllamaModelsResponse = response.json().await?;
        Ok(models_response
            .models
            .into_iter()
            .map(|model| model.name)
            .collect())
    }
}

/// The tutor conversation service: one model, one set of options.
#[derive(Clone)]
pub struct MathTutor {
    client: OllamaClient,
    model: String,
    options: ChatOptions,
}

impl MathTutor {
    pub fn new(client: OllamaClient, model: impl Into<String>, options: ChatOptions) -> Self {
        Self {
            client,
            model: model.into(),
            options,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    /// Ask the model for the next tutor turn. Never fails: on any error the
    /// connection notice is returned in place of a reply.
    pub async fn respond(&self, history: &[ChatMessage]) -> String {
        match self.client.chat(&self.model, history, &self.options).await {
            Ok(raw) => clean_model_response(&raw),
            Err(e) => {
                error!("Error generating response from {}: {:#}", self.model, e);
                connection_fallback(&self.model)
            }
        }
    }
}
