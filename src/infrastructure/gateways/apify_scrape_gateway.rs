// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{build_client, check_status, endpoint, parse_base_url, transport_error};
use crate::config::settings::ScrapeProviderSettings;
use crate::domain::gateways::scrape_provider::{
    RawLead, RemoteRun, RunState, RunStatus, ScrapeProviderGateway,
};
use crate::domain::gateways::GatewayError;
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunData {
    id: String,
    status: String,
    #[serde(default)]
    status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetData {
    #[serde(default)]
    item_count: Option<u64>,
}

/// Apify 风格的 actor 抓取网关
///
/// 一次搜索对应一次 actor 运行，结果从运行的默认数据集按偏移分页读取。
pub struct ApifyScrapeGateway {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<String>,
    actor_id: String,
    page_size: u32,
}

impl ApifyScrapeGateway {
    pub fn new(settings: &ScrapeProviderSettings) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(settings.timeout_secs),
            base_url: parse_base_url(&settings.base_url)?,
            api_token: settings.api_token.clone(),
            actor_id: settings.actor_id.clone(),
            page_size: settings.page_size.max(1),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn dataset_item_count(&self, run_id: &str) -> Result<Option<u64>, GatewayError> {
        let url = endpoint(&self.base_url, &format!("v2/actor-runs/{}/dataset", run_id))?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, &format!("dataset of run {}", run_id)).await?;
        let body: Envelope<DatasetData> = response.json().await.map_err(transport_error)?;
        Ok(body.data.item_count)
    }
}

fn parse_run_state(status: &str) -> Result<RunState, GatewayError> {
    match status {
        "READY" | "RUNNING" => Ok(RunState::Running),
        "SUCCEEDED" => Ok(RunState::Succeeded),
        "FAILED" => Ok(RunState::Failed),
        "ABORTING" | "ABORTED" => Ok(RunState::Aborted),
        "TIMING-OUT" | "TIMED-OUT" => Ok(RunState::TimedOut),
        other => Err(GatewayError::InvalidResponse(format!(
            "unknown run status {}",
            other
        ))),
    }
}

#[async_trait]
impl ScrapeProviderGateway for ApifyScrapeGateway {
    async fn start_search(&self, input: &Map<String, Value>) -> Result<RemoteRun, GatewayError> {
        let url = endpoint(&self.base_url, &format!("v2/acts/{}/runs", self.actor_id))?;
        let response = self
            .authorize(self.client.post(url))
            .json(input)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, &format!("actor {}", self.actor_id)).await?;
        let body: Envelope<RunData> = response.json().await.map_err(transport_error)?;

        debug!(run_id = %body.data.id, "Started actor run");
        Ok(RemoteRun {
            run_id: body.data.id,
        })
    }

    async fn get_run_status(&self, run_id: &str) -> Result<RunStatus, GatewayError> {
        let url = endpoint(&self.base_url, &format!("v2/actor-runs/{}", run_id))?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, &format!("run {}", run_id)).await?;
        let body: Envelope<RunData> = response.json().await.map_err(transport_error)?;

        let state = parse_run_state(&body.data.status)?;
        let result_count = if state == RunState::Succeeded {
            self.dataset_item_count(run_id).await?
        } else {
            None
        };
        let failure_reason = state.is_failure().then(|| {
            body.data
                .status_message
                .clone()
                .unwrap_or_else(|| body.data.status.to_lowercase())
        });

        Ok(RunStatus {
            state,
            result_count,
            failure_reason,
        })
    }

    async fn get_results(&self, run_id: &str, page: u32) -> Result<Vec<RawLead>, GatewayError> {
        let mut url = endpoint(&self.base_url, &format!("v2/actor-runs/{}/dataset/items", run_id))?;
        let offset = u64::from(page) * u64::from(self.page_size);
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("clean", "true")
            .append_pair("format", "json");

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, &format!("results of run {}", run_id)).await?;
        let items: Vec<Value> = response.json().await.map_err(transport_error)?;

        // Non-object items carry no contact data
        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}
