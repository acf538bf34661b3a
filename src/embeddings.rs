use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{CreateEmbeddingRequestArgs, EmbeddingInput},
};
use rand::Rng;
use std::cmp;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{Config, RetryConfig};
use crate::error::{DispatchError, Result};

/// Thin client over the OpenAI embeddings endpoint with jittered backoff on
/// transient failures.
pub struct EmbeddingClient {
    client: Client<OpenAIConfig>,
    model: String,
    retry: RetryConfig,
}

impl EmbeddingClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let api_key = cfg.openai.api_key()?;
        let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
        Ok(Self {
            client,
            model: cfg.openai.embedding_model.clone(),
            retry: cfg.retry.clone(),
        })
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.clone())
            .input(EmbeddingInput::String(text.to_string()))
            .build()
            .map_err(|e| DispatchError::Embedding(format!("Failed to build request: {e}")))?;

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.client.embeddings().create(request.clone()).await {
                Ok(response) => {
                    let embedding = response
                        .data
                        .into_iter()
                        .next()
                        .ok_or_else(|| {
                            DispatchError::Embedding("No embeddings returned".to_string())
                        })?
                        .embedding;
                    return Ok(embedding);
                }
                Err(e) => {
                    if attempts >= self.retry.max_attempts {
                        return Err(DispatchError::Embedding(format!(
                            "Embedding request failed after {attempts} attempts: {e}"
                        )));
                    }
                    tracing::warn!(
                        "Embedding request failed (attempt {}/{}): {}",
                        attempts,
                        self.retry.max_attempts,
                        e
                    );
                    sleep(self.backoff_delay(attempts)).await;
                }
            }
        }
    }

    /// Exponential backoff with jitter, capped at max_delay_ms
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = Duration::from_millis(
            self.retry
                .initial_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1))),
        );
        // Env overrides bypass validation, so keep the range non-empty here
        let f = self.retry.jitter_factor.clamp(0.0, 1.0);
        let jitter = rand::thread_rng().gen_range((1.0 - f)..=(1.0 + f));
        let delay = base.mul_f64(jitter);
        cmp::min(delay, Duration::from_millis(self.retry.max_delay_ms))
    }
}
