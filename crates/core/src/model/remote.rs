use crate::config::Settings;
use crate::domain::profile::BusinessProfile;
use crate::model::SuccessModel;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/v1/success_probability";
const DEFAULT_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct HttpJsonModel {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    platform: &'a str,
    business_profile: &'a BusinessProfile,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    success_probability: f64,
}

impl HttpJsonModel {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_model_base_url()?.to_string();
        let api_key = settings.model_api_key.clone();

        let timeout_secs = std::env::var("MODEL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("MODEL_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let path = std::env::var("MODEL_PREDICT_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build model http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn predict_once(&self, request: &PredictRequest<'_>) -> Result<f64> {
        let url = self.url();
        let headers = self.headers()?;

        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .context("model request failed")?;

        let status = res.status();
        let text = res.text().await.context("failed to read model response")?;

        if !status.is_success() {
            anyhow::bail!("model HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<PredictResponse>(&text)
            .with_context(|| format!("model response is not a valid prediction: {text}"))?;
        validate_probability(parsed.success_probability)
    }
}

#[async_trait::async_trait]
impl SuccessModel for HttpJsonModel {
    fn model_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn predict_success(
        &self,
        profile: &BusinessProfile,
        platform_id: &str,
    ) -> Result<f64> {
        let request = PredictRequest {
            platform: platform_id,
            business_profile: profile,
        };

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.predict_once(&request).await {
                Ok(probability) => return Ok(probability),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(
                        platform = platform_id,
                        attempt,
                        ?backoff,
                        error = %err,
                        "model prediction failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

fn validate_probability(probability: f64) -> Result<f64> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&probability),
        "model probability out of range: {probability}"
    );
    Ok(probability)
}
