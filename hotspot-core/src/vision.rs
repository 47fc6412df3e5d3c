use crate::error::{HotspotError, Result};
use crate::image_preparer::PreparedImage;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// "Given an image and a prompt, return text"
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Model identifier, for logs
    fn name(&self) -> &str;

    async fn generate(&self, image: &PreparedImage, prompt: &str) -> Result<String>;
}

/// Vision model behind an OpenAI-compatible chat completions endpoint
pub struct OpenAiVisionModel {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<MessageContent>,
}

/// Message content arrives either as one string or as typed parts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

impl OpenAiVisionModel {
    /// Create a new vision model client
    ///
    /// # Arguments
    /// * `api_key` - API key sent as a bearer token
    /// * `model` - Model to use (e.g. "gpt-4o")
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            max_tokens: 4000,
        }
    }

    /// Create from the OPENAI_API_KEY environment variable
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            HotspotError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Share one HTTP connection pool between several models
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn request_body(&self, image: &PreparedImage, prompt: &str) -> serde_json::Value {
        let mut request_body = serde_json::json!({
            "model": self.model.clone(),
            "messages": vec![serde_json::json!({
                "role": "user",
                "content": vec![
                    serde_json::json!({
                        "type": "text",
                        "text": prompt
                    }),
                    serde_json::json!({
                        "type": "image_url",
                        "image_url": {
                            "url": image.to_data_url()
                        }
                    })
                ]
            })]
        });

        // Use max_completion_tokens for newer models, max_tokens for older ones
        if self.model.starts_with("gpt-5") || self.model.starts_with("o1") {
            request_body["max_completion_tokens"] = serde_json::json!(self.max_tokens);
        } else {
            request_body["max_tokens"] = serde_json::json!(self.max_tokens);
        }

        request_body
    }
}

#[async_trait]
impl VisionModel for OpenAiVisionModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, image: &PreparedImage, prompt: &str) -> Result<String> {
        info!(
            "Sending {}x{} panorama to vision API (model: {})",
            image.width, image.height, self.model
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request_body(image, prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            warn!("Vision API error: {} - {}", status, error_text);
            return Err(HotspotError::Model(format!("{} - {}", status, error_text)));
        }

        let api_response: OpenAIResponse = response.json().await?;
        let text = collect_text(&api_response)?;
        info!("Received {} chars from {}", text.len(), self.model);

        Ok(text)
    }
}

/// Concatenate the text parts of the first choice, in order
fn collect_text(response: &OpenAIResponse) -> Result<String> {
    let choice = response
        .choices
        .first()
        .ok_or_else(|| HotspotError::Model("No choices in vision API response".to_string()))?;

    let text = match &choice.message.content {
        Some(MessageContent::Text(text)) => text.clone(),
        Some(MessageContent::Parts(parts)) => parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<String>(),
        None => String::new(),
    };

    Ok(text)
}

/// Calls the primary model, falling back once to a backup model
pub struct ModelInvoker {
    primary: Box<dyn VisionModel>,
    backup: Option<Box<dyn VisionModel>>,
}

impl ModelInvoker {
    pub fn new(primary: Box<dyn VisionModel>, backup: Option<Box<dyn VisionModel>>) -> Self {
        Self { primary, backup }
    }

    /// Primary, then backup. At most two sequential calls.
    ///
    /// Fails with `ModelUnavailable` carrying both error messages when
    /// neither call succeeds.
    pub async fn try_invoke(&self, image: &PreparedImage, prompt: &str) -> Result<String> {
        let primary_err = match self.primary.generate(image, prompt).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        let Some(backup) = &self.backup else {
            warn!("Model {} failed, no backup configured: {}", self.primary.name(), primary_err);
            return Err(HotspotError::ModelUnavailable {
                primary: primary_err.to_string(),
                backup: None,
            });
        };

        warn!(
            "Model {} failed (trying backup {}): {}",
            self.primary.name(),
            backup.name(),
            primary_err
        );

        match backup.generate(image, prompt).await {
            Ok(text) => {
                info!("Backup model {} answered", backup.name());
                Ok(text)
            }
            Err(backup_err) => Err(HotspotError::ModelUnavailable {
                primary: primary_err.to_string(),
                backup: Some(backup_err.to_string()),
            }),
        }
    }

    /// Like `try_invoke`, but total failure yields empty text
    pub async fn invoke(&self, image: &PreparedImage, prompt: &str) -> String {
        self.try_invoke(image, prompt).await.unwrap_or_else(|e| {
            warn!("{}", e);
            String::new()
        })
    }
}
