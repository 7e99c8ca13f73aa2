/// HTTP context interpreter
///
/// POSTs the listening situation to an interpretation service and decodes the
/// returned weights leniently (out-of-range values clamped, junk neutral).
/// Interpretations are cached in Redis keyed on the raw text.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::ContextWeights,
    services::providers::ContextInterpreter,
};
use reqwest::Client as HttpClient;
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct InterpretRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prior_preferences: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct HttpContextInterpreter {
    http_client: HttpClient,
    api_url: String,
    api_key: Option<String>,
    cache: Cache,
    cache_ttl: u64,
}

impl HttpContextInterpreter {
    pub fn new(cache: Cache, api_url: String, api_key: Option<String>, cache_ttl: u64) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            cache,
            cache_ttl,
        }
    }

    async fn request_weights(
        &self,
        text: &str,
        prior_preferences: Option<serde_json::Value>,
    ) -> AppResult<ContextWeights> {
        let url = format!("{}/v1/interpret", self.api_url);

        let mut request = self
            .http_client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&InterpretRequest {
                text,
                prior_preferences,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ContextInterpretationUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ContextInterpretationUnavailable(format!(
                "Interpreter returned status {}: {}",
                status, body
            )));
        }

        let weights: ContextWeights = response
            .json()
            .await
            .map_err(|e| AppError::ContextInterpretationUnavailable(e.to_string()))?;

        tracing::info!(
            valence = weights.valence,
            energy = weights.energy,
            danceability = weights.danceability,
            acousticness = weights.acousticness,
            tempo_modifier = weights.tempo_modifier,
            "Context interpreted"
        );

        Ok(weights)
    }
}

#[async_trait::async_trait]
impl ContextInterpreter for HttpContextInterpreter {
    async fn interpret(
        &self,
        text: &str,
        prior_preferences: Option<serde_json::Value>,
    ) -> AppResult<ContextWeights> {
        cached!(
            self.cache,
            CacheKey::ContextWeights(text.to_string()),
            self.cache_ttl,
            self.request_weights(text, prior_preferences)
        )
    }
}
