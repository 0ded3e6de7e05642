//! HTTP client for the platform's Cloud Controller API.
//!
//! Implements `AppRepository` and `InstanceRepository` over the v2 JSON
//! endpoints with bearer-token auth.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ports::{AppRepository, InstanceRepository};
use crate::domain::{
    AppState, Application, InstanceRecord, InstanceState, PackageState, TargetConfig,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// API client scoped to one targeted space.
pub struct CloudControllerClient {
    client: Client,
    base_url: String,
    token: String,
    space_guid: String,
}

impl CloudControllerClient {
    /// Creates a client for the targeted endpoint and space.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(target: &TargetConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: target.api_endpoint.trim_end_matches('/').to_owned(),
            token: target.access_token.clone(),
            space_guid: target.space_guid.clone(),
        })
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let response = req
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to send request")?;

        if response.status().is_success() {
            response.json().await.context("Failed to parse response")
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({status}): {body}")
        }
    }
}

impl AppRepository for CloudControllerClient {
    async fn find_by_name(&self, name: &str) -> Result<Application> {
        let url = format!("{}/v2/spaces/{}/apps", self.base_url, self.space_guid);
        debug!(%url, name, "looking up app");
        let page: ResourcePage = self
            .send(self.client.get(&url).query(&[("q", format!("name:{name}"))]))
            .await?;
        page.resources
            .into_iter()
            .next()
            .map(AppResource::into_application)
            .ok_or_else(|| anyhow::anyhow!("App {name} not found"))
    }

    async fn get_app(&self, guid: &str) -> Result<Application> {
        let url = format!("{}/v2/apps/{guid}/summary", self.base_url);
        let summary: AppSummary = self.send(self.client.get(&url)).await?;
        Ok(summary.into_application())
    }

    async fn update_state(&self, guid: &str, state: AppState) -> Result<Application> {
        let url = format!("{}/v2/apps/{guid}", self.base_url);
        debug!(%url, ?state, "updating app state");
        let resource: AppResource = self
            .send(self.client.put(&url).json(&UpdateAppRequest { state }))
            .await?;
        Ok(resource.into_application())
    }
}

impl InstanceRepository for CloudControllerClient {
    async fn get_instances(&self, guid: &str) -> Result<Vec<InstanceRecord>> {
        let url = format!("{}/v2/apps/{guid}/instances", self.base_url);
        let by_index: BTreeMap<String, InstanceEntity> = self.send(self.client.get(&url)).await?;
        Ok(instances_in_order(by_index))
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct UpdateAppRequest {
    state: AppState,
}

#[derive(Debug, Deserialize)]
struct ResourcePage {
    #[serde(default)]
    resources: Vec<AppResource>,
}

#[derive(Debug, Deserialize)]
struct AppResource {
    metadata: Metadata,
    entity: AppEntity,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    guid: String,
}

/// App fields shared by the resource and summary shapes.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AppEntity {
    name: String,
    state: AppState,
    package_state: PackageState,
    staging_failed_reason: Option<String>,
    command: Option<String>,
    detected_start_command: Option<String>,
    instances: u32,
    memory: u64,
    disk_quota: u64,
}

#[derive(Debug, Deserialize)]
struct AppSummary {
    guid: String,
    #[serde(flatten)]
    entity: AppEntity,
    #[serde(default)]
    routes: Vec<RouteSummary>,
}

#[derive(Debug, Deserialize)]
struct RouteSummary {
    #[serde(default)]
    host: String,
    domain: DomainSummary,
    #[serde(default)]
    path: String,
}

#[derive(Debug, Deserialize)]
struct DomainSummary {
    name: String,
}

impl RouteSummary {
    fn url(&self) -> String {
        let host = if self.host.is_empty() {
            self.domain.name.clone()
        } else {
            format!("{}.{}", self.host, self.domain.name)
        };
        format!("{host}{}", self.path)
    }
}

impl AppEntity {
    fn into_application(self, guid: String, routes: Vec<String>) -> Application {
        Application {
            guid,
            name: self.name,
            state: self.state,
            package_state: self.package_state,
            staging_failed_reason: self.staging_failed_reason,
            command: self.command,
            detected_start_command: self.detected_start_command,
            instances: self.instances,
            memory_mb: self.memory,
            disk_quota_mb: self.disk_quota,
            routes,
        }
    }
}

impl AppResource {
    fn into_application(self) -> Application {
        self.entity.into_application(self.metadata.guid, Vec::new())
    }
}

impl AppSummary {
    fn into_application(self) -> Application {
        let routes = self.routes.iter().map(RouteSummary::url).collect();
        self.entity.into_application(self.guid, routes)
    }
}

#[derive(Debug, Deserialize)]
struct InstanceEntity {
    state: InstanceState,
    #[serde(default)]
    details: Option<String>,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    since: Option<f64>,
}

impl InstanceEntity {
    fn into_record(self) -> InstanceRecord {
        InstanceRecord {
            state: self.state,
            details: self.details,
            since: self.since.and_then(epoch_to_datetime),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn epoch_to_datetime(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Instances keyed by their index, returned in numeric index order.
fn instances_in_order(by_index: BTreeMap<String, InstanceEntity>) -> Vec<InstanceRecord> {
    let mut indexed: Vec<(u64, InstanceEntity)> = by_index
        .into_iter()
        .filter_map(|(k, v)| k.parse().ok().map(|i| (i, v)))
        .collect();
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, v)| v.into_record()).collect()
}
