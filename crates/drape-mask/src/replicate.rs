// crates/drape-mask/src/replicate.rs
//
// Replicate predictions API client for image editing and image embedding.
// Uses reqwest against the HTTP API; local images are sent as data URIs.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};

use drape_core::traits::{ImageEditor, ImageEmbedder};
use drape_core::{DrapeError, ImageRef};
use drape_store::DataLayout;

/// Public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com";
/// Image-edit model.
pub const DEFAULT_EDIT_MODEL: &str = "black-forest-labs/flux-kontext-pro";
/// Image-embedding model.
pub const DEFAULT_EMBED_MODEL: &str = "openai/clip";
/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "REPLICATE_API_TOKEN";

/// A prediction as returned by create and get.
#[derive(Debug, Clone, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Value,
}

impl Prediction {
    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }
}

/// Client for the Replicate HTTP API.
///
/// Implements both [`ImageEditor`] and [`ImageEmbedder`]. Local image
/// references are resolved against the data directory and inlined as
/// base64 data URIs; remote references are passed through.
#[derive(Debug, Clone)]
pub struct ReplicateClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
    layout: DataLayout,
    edit_model: String,
    embed_model: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl ReplicateClient {
    pub fn new(token: &str, layout: DataLayout) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.to_string(),
            client: reqwest::Client::new(),
            layout,
            edit_model: DEFAULT_EDIT_MODEL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            poll_interval: Duration::from_secs(1),
            max_polls: 300,
        }
    }

    /// Build a client from `REPLICATE_API_TOKEN`.
    pub fn from_env(layout: DataLayout) -> Result<Self, DrapeError> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Ok(Self::new(token.trim(), layout)),
            _ => Err(DrapeError::InvalidParameter(format!(
                "missing {} (use --dry-run or --offline to run without it)",
                TOKEN_ENV
            ))),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, edit_model: &str, embed_model: &str) -> Self {
        self.edit_model = edit_model.to_string();
        self.embed_model = embed_model.to_string();
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    /// Image reference as the API expects it: URLs pass through, local
    /// files become `data:<mime>;base64,...`.
    pub async fn image_input(&self, image: &ImageRef) -> Result<String, DrapeError> {
        if image.is_remote() {
            return Ok(image.as_str().to_string());
        }

        let path = self.layout.resolve_image(image);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| DrapeError::Storage(format!("Failed to read image {}: {}", path.display(), e)))?;
        let mime = match path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            _ => "image/jpeg",
        };
        Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
    }

    /// Run a model to completion and return its output.
    ///
    /// `owner/name` uses the official-model endpoint; `owner/name:version`
    /// pins a version.
    pub async fn run(&self, model: &str, input: Value) -> Result<Value, DrapeError> {
        let (url, body) = match model.split_once(':') {
            Some((_, version)) => (
                format!("{}/v1/predictions", self.base_url),
                json!({ "version": version, "input": input }),
            ),
            None => (
                format!("{}/v1/models/{}/predictions", self.base_url, model),
                json!({ "input": input }),
            ),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await
            .map_err(|e| DrapeError::External(format!("Replicate request failed: {}", e)))?;
        let mut prediction = Self::parse(response, model).await?;

        let mut polls = 0;
        while !prediction.is_terminal() {
            if polls >= self.max_polls {
                return Err(DrapeError::Timeout(format!(
                    "{} prediction {} still {} after {} polls",
                    model, prediction.id, prediction.status, polls
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;
            prediction = self.get_prediction(&prediction.id, model).await?;
        }

        match prediction.status.as_str() {
            "succeeded" => Ok(prediction.output),
            status => Err(DrapeError::External(format!(
                "{} prediction {} {}: {}",
                model, prediction.id, status, prediction.error
            ))),
        }
    }

    async fn get_prediction(&self, id: &str, model: &str) -> Result<Prediction, DrapeError> {
        let url = format!("{}/v1/predictions/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| DrapeError::External(format!("Replicate poll failed: {}", e)))?;
        Self::parse(response, model).await
    }

    async fn parse(response: reqwest::Response, model: &str) -> Result<Prediction, DrapeError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("{} returned {}: {}", model, status, body);
            // Client errors other than rate limiting will not succeed on retry.
            return Err(if status.is_client_error() && status.as_u16() != 429 {
                DrapeError::InvalidParameter(message)
            } else {
                DrapeError::External(message)
            });
        }

        response
            .json()
            .await
            .map_err(|e| DrapeError::Serialization(format!("{} response parse failed: {}", model, e)))
    }
}

/// Resolve a model output to an image URL: a string, the first element of an
/// array, or an object's `url` field.
pub fn output_url(output: &Value) -> Option<String> {
    match output {
        Value::String(url) => Some(url.clone()),
        Value::Array(items) => items.first().and_then(output_url),
        Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Extract an `embedding` array from a model output (object or first array
/// element).
pub fn output_embedding(output: &Value) -> Option<Vec<f32>> {
    match output {
        Value::Object(map) => map
            .get("embedding")?
            .as_array()?
            .iter()
            .map(|x| x.as_f64().map(|f| f as f32))
            .collect(),
        Value::Array(items) => items.first().and_then(output_embedding),
        _ => None,
    }
}

#[async_trait]
impl ImageEditor for ReplicateClient {
    async fn edit(&self, prompt: &str, source: &ImageRef) -> Result<ImageRef, DrapeError> {
        let input = json!({
            "prompt": prompt,
            "input_image": self.image_input(source).await?,
            "aspect_ratio": "match_input_image",
            "output_format": "jpg",
            "safety_tolerance": 2,
            "prompt_upsampling": false,
        });
        let output = self.run(&self.edit_model, input).await?;
        output_url(&output).map(ImageRef::new).ok_or_else(|| {
            DrapeError::External(format!("could not resolve {} output to a URL", self.edit_model))
        })
    }
}

#[async_trait]
impl ImageEmbedder for ReplicateClient {
    async fn embed(&self, image: &ImageRef) -> Result<Vec<f32>, DrapeError> {
        let input = json!({ "image": self.image_input(image).await? });
        let output = self.run(&self.embed_model, input).await?;
        match output_embedding(&output) {
            Some(vector) if !vector.is_empty() => Ok(vector),
            _ => Err(DrapeError::External(format!(
                "unexpected {} output shape",
                self.embed_model
            ))),
        }
    }
}
