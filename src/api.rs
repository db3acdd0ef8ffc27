use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::EMISSIONS_VERSION;

/// Envelope around the Forge user endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEnvelope {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub status: bool,
    pub data: UserRecord,
}

/// Raw user record as returned by the Forge API.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub cosmos_address: String,
    pub total_points: f64,
    pub ranking: i64,
    #[serde(default)]
    pub badge_percentile: f64,
    #[serde(default)]
    pub badge_name: String,
    #[serde(default)]
    pub badge_description: String,
    #[serde(default)]
    pub competitions: Vec<CompetitionRecord>,
}

/// Raw per-competition record inside a [`UserRecord`].
#[derive(Debug, Clone, Deserialize)]
pub struct CompetitionRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub topic_id: i64,
    pub points: f64,
    pub ranking: i64,
}

/// Envelope around the emissions `latest_network_inferences` response. Only
/// the weight list is consumed; the inference values are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkInferencesEnvelope {
    #[serde(default)]
    pub inferer_weights: Vec<InfererWeight>,
}

/// One worker's raw weight for a topic. The weight is decimal text as sent
/// by the chain API.
#[derive(Debug, Clone, Deserialize)]
pub struct InfererWeight {
    pub worker: String,
    pub weight: String,
}

/// Fetch capability the batch engine consumes. Implemented by
/// [`AlloraClient`] for production and by in-memory fakes in tests.
pub trait ForgeApi {
    fn user_record(&self, address: &str) -> impl Future<Output = Result<UserRecord>> + Send;
    fn competition_weights(
        &self,
        topic_id: i64,
    ) -> impl Future<Output = Result<Vec<InfererWeight>>> + Send;
}

/// HTTP client for the Allora Forge and chain emissions APIs.
///
/// Built once and shared: the underlying `reqwest` client keeps a warm
/// connection pool across polling passes.
#[derive(Debug, Clone)]
pub struct AlloraClient {
    http: reqwest::Client,
    forge_base: String,
    api_base: String,
}

impl AlloraClient {
    pub fn new(forge_base: &str, api_base: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(100)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            forge_base: forge_base.trim_end_matches('/').to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("request to {url} returned an error status"))?;
        resp.json()
            .await
            .with_context(|| format!("failed to decode response from {url}"))
    }
}

impl ForgeApi for AlloraClient {
    async fn user_record(&self, address: &str) -> Result<UserRecord> {
        let url = format!(
            "{}/api/upshot-api-proxy/allora/forge/user/{address}",
            self.forge_base
        );
        let envelope: UserEnvelope = self.get_json(&url).await?;
        debug!(
            "Fetched user record for {address}: rank={} competitions={}",
            envelope.data.ranking,
            envelope.data.competitions.len()
        );
        Ok(envelope.data)
    }

    async fn competition_weights(&self, topic_id: i64) -> Result<Vec<InfererWeight>> {
        let url = format!(
            "{}/emissions/{EMISSIONS_VERSION}/latest_network_inferences/{topic_id}",
            self.api_base
        );
        let envelope: NetworkInferencesEnvelope = self.get_json(&url).await?;
        debug!(
            "Fetched {} inferer weights for topic {topic_id}",
            envelope.inferer_weights.len()
        );
        Ok(envelope.inferer_weights)
    }
}
