use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Core trait for search-augmented generation providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one generation call. Implementations make exactly one outbound request and never retry.
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    /// Ask the service to ground its answer in a live web search and attach citations
    pub web_search: bool,
}

/// Response from LLM generation
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    /// Generated text, `None` when the service returned no text parts
    pub text: Option<String>,
    /// Citations from the first candidate's grounding metadata, unfiltered
    pub grounding_chunks: Vec<GroundingChunk>,
    pub model: String,
}

/// One grounding citation as the service reports it. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebChunk>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebChunk {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl GroundingChunk {
    pub fn web(uri: Option<&str>, title: Option<&str>) -> Self {
        Self {
            web: Some(WebChunk {
                uri: uri.map(str::to_string),
                title: title.map(str::to_string),
            }),
        }
    }
}

pub mod gemini;
