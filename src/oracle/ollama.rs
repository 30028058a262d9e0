#![cfg(feature = "std")]

use std::sync::Arc;

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::correlator::{CorrelationId, OracleResponse};
use crate::events::EventRegistry;
use crate::oracle::OracleClient;

/// Config for an Ollama-style `POST /api/generate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Full endpoint URL, e.g. `http://127.0.0.1:11434/api/generate`.
    pub endpoint: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434/api/generate".to_string(),
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

pub const OLLAMA_FUNCTION: &str = "generate";

/// Ollama adapter. Generation runs on a spawned task; the text, or the cause
/// of a failed request, comes back as a notification.
pub struct OllamaOracle {
    client: Client,
    config: OllamaConfig,
    responses: Arc<EventRegistry<OracleResponse>>,
}

impl OllamaOracle {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            responses: Arc::new(EventRegistry::new()),
        }
    }

    fn tags_url(&self) -> String {
        let base = self
            .config
            .endpoint
            .trim_end_matches('/')
            .trim_end_matches("/api/generate");
        format!("{}/api/tags", base)
    }
}

async fn generate(
    client: &Client,
    endpoint: &str,
    model: &str,
    prompt: &str,
) -> anyhow::Result<String> {
    let request = OllamaRequest {
        model,
        prompt,
        stream: false,
    };
    let res = client
        .post(endpoint)
        .json(&request)
        .send()
        .await
        .context("ollama request failed")?
        .error_for_status()
        .context("ollama non-2xx response")?
        .json::<OllamaResponse>()
        .await
        .context("ollama response decode failed")?;
    Ok(res.response)
}

#[async_trait::async_trait]
impl OracleClient for OllamaOracle {
    async fn start_request(
        &self,
        id: CorrelationId,
        prompt: &str,
        model: &str,
    ) -> anyhow::Result<()> {
        let client = self.client.clone();
        let endpoint = self.config.endpoint.clone();
        let model = model.to_string();
        let prompt = prompt.to_string();
        let responses = Arc::clone(&self.responses);
        tokio::spawn(async move {
            let response = match generate(&client, &endpoint, &model, &prompt).await {
                Ok(content) => OracleResponse::reply(id, content, OLLAMA_FUNCTION),
                Err(e) => {
                    log::warn!("oracle request {} failed: {:#}", id, e);
                    OracleResponse::failed(id, format!("{:#}", e), OLLAMA_FUNCTION)
                }
            };
            responses.emit(&response);
        });
        Ok(())
    }

    fn responses(&self) -> &EventRegistry<OracleResponse> {
        &self.responses
    }

    async fn health(&self) -> anyhow::Result<()> {
        self.client
            .get(self.tags_url())
            .send()
            .await
            .context("ollama unreachable")?
            .error_for_status()
            .context("ollama health check failed")?;
        Ok(())
    }
}
