//! Language-model backends that write story segments.
//!
//! The generator only sees the [`StoryBackend`] trait. [`ClaudeBackend`] is
//! the production implementation; tests use
//! [`ScriptedBackend`](crate::testing::ScriptedBackend).

use crate::segment::StoryModelSegment;
use async_trait::async_trait;
use claude::{Claude, Message, Request, StopReason};
use thiserror::Error;
use tracing::debug;

/// Failure to obtain a parseable segment from the backend.
///
/// Any of these is retried at the segment level.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Claude API error: {0}")]
    Api(#[from] claude::Error),

    #[error("Response was cut off before the segment was complete")]
    Truncated,

    #[error("Failed to parse segment: {0}")]
    Parse(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Something that can write one story segment for a rendered prompt.
#[async_trait]
pub trait StoryBackend: Send + Sync {
    async fn request_segment(&self, prompt: &str) -> Result<StoryModelSegment, BackendError>;
}

/// Parse a backend reply into a segment.
///
/// The reply must contain one JSON object with `title`, `narrative` and
/// `isEnding`; `choices` may be absent. Prose or code fences around the
/// object are ignored.
pub fn parse_segment(text: &str) -> Result<StoryModelSegment, BackendError> {
    let json = extract_json_object(text)
        .ok_or_else(|| BackendError::Parse("no JSON object in response".to_string()))?;

    serde_json::from_str(json).map_err(|e| BackendError::Parse(e.to_string()))
}

/// Slice from the first `{` to the last `}`.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

const SYSTEM_PROMPT: &str = "You are the author of a branching, choose-your-own-adventure story. \
You write one segment at a time and always answer with a single JSON object that follows the \
requested shape exactly. Never add commentary, markdown or code fences around the JSON.";

/// Configuration for [`ClaudeBackend`].
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// The model to use (defaults to the client's model).
    pub model: Option<String>,

    /// Maximum tokens for one segment.
    pub max_tokens: usize,

    /// Temperature for generation.
    pub temperature: Option<f32>,

    /// Replaces the built-in system prompt.
    pub system_prompt: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 2048,
            temperature: Some(0.9),
            system_prompt: None,
        }
    }
}

/// Backend that asks Claude for each segment.
pub struct ClaudeBackend {
    client: Claude,
    config: BackendConfig,
}

impl ClaudeBackend {
    /// Create a backend with an API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, BackendError> {
        Ok(Self::with_client(Claude::new(api_key)?))
    }

    /// Create a backend from the ANTHROPIC_API_KEY environment variable.
    pub fn from_env() -> Result<Self, BackendError> {
        Ok(Self::with_client(Claude::from_env()?))
    }

    /// Wrap an existing client.
    pub fn with_client(client: Claude) -> Self {
        Self {
            client,
            config: BackendConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BackendConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn build_request(&self, prompt: &str) -> Request {
        let system = self
            .config
            .system_prompt
            .as_deref()
            .unwrap_or(SYSTEM_PROMPT);

        let mut request = Request::new(vec![Message::user(prompt)])
            .with_system(system)
            .with_max_tokens(self.config.max_tokens);

        if let Some(ref model) = self.config.model {
            request = request.with_model(model);
        }

        if let Some(temp) = self.config.temperature {
            request = request.with_temperature(temp);
        }

        request
    }
}

#[async_trait]
impl StoryBackend for ClaudeBackend {
    async fn request_segment(&self, prompt: &str) -> Result<StoryModelSegment, BackendError> {
        let response = self.client.complete(self.build_request(prompt)).await?;

        debug!(
            response_id = %response.id,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "segment response received"
        );

        if response.stop_reason == StopReason::MaxTokens {
            return Err(BackendError::Truncated);
        }

        parse_segment(&response.text)
    }
}
