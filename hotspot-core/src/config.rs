use crate::error::{HotspotError, Result};
use crate::image_preparer::MAX_DIMENSION;
use crate::vision::{ModelInvoker, OpenAiVisionModel, VisionModel, DEFAULT_API_BASE};
use serde::{Deserialize, Serialize};

/// Configuration for hotspot detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Model asked first
    #[serde(default = "default_primary_model")]
    pub primary_model: String,
    /// Model asked once if the primary call fails (None disables fallback)
    #[serde(default = "default_backup_model")]
    pub backup_model: Option<String>,
    /// OpenAI-compatible API root
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Longest side of the image sent to the model
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

fn default_primary_model() -> String {
    "gpt-4o".to_string()
}

fn default_backup_model() -> Option<String> {
    Some("gpt-4o-mini".to_string())
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_max_dimension() -> u32 {
    MAX_DIMENSION
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            primary_model: default_primary_model(),
            backup_model: default_backup_model(),
            api_base_url: default_api_base_url(),
            max_tokens: default_max_tokens(),
            max_dimension: default_max_dimension(),
        }
    }
}

impl DetectorConfig {
    /// Defaults overridden by VISION_MODEL, VISION_BACKUP_MODEL,
    /// VISION_API_BASE and VISION_MAX_DIMENSION
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(model) = lookup("VISION_MODEL").filter(|m| !m.trim().is_empty()) {
            config.primary_model = model.trim().to_string();
        }

        // Set but empty disables the backup
        if let Some(backup) = lookup("VISION_BACKUP_MODEL") {
            let backup = backup.trim();
            config.backup_model = (!backup.is_empty()).then(|| backup.to_string());
        }

        if let Some(base) = lookup("VISION_API_BASE").filter(|b| !b.trim().is_empty()) {
            config.api_base_url = base.trim().to_string();
        }

        if let Some(dim) = lookup("VISION_MAX_DIMENSION") {
            config.max_dimension = dim
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| {
                    HotspotError::Config(format!("VISION_MAX_DIMENSION must be a positive integer, got {:?}", dim))
                })?;
        }

        Ok(config)
    }

    /// Build the primary/backup invoker against the configured endpoint,
    /// reading the API key from OPENAI_API_KEY
    pub fn build_invoker(&self) -> Result<ModelInvoker> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            HotspotError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Ok(self.build_invoker_with_key(&api_key))
    }

    pub fn build_invoker_with_key(&self, api_key: &str) -> ModelInvoker {
        let client = reqwest::Client::new();
        let make = |model: &str| -> Box<dyn VisionModel> {
            Box::new(
                OpenAiVisionModel::new(api_key.to_string(), model)
                    .with_client(client.clone())
                    .with_base_url(self.api_base_url.clone())
                    .with_max_tokens(self.max_tokens),
            )
        };

        let primary = make(&self.primary_model);
        let backup = self.backup_model.as_deref().map(make);
        ModelInvoker::new(primary, backup)
    }
}
