// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{build_client, check_status, endpoint, parse_base_url, transport_error};
use crate::config::settings::DeliveryProviderSettings;
use crate::domain::gateways::delivery_provider::{
    DeliveryProviderGateway, RemoteCampaignSnapshot, RemoteLead,
};
use crate::domain::gateways::GatewayError;
use crate::domain::models::campaign::{
    CampaignOptions, CampaignStats, RemoteRunState, SendSchedule, SequenceStep,
};
use crate::domain::models::outreach_account::AccountSnapshot;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;
use url::Url;

/// 分页列表的单页上限
const LIST_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct CampaignBody {
    id: String,
    name: String,
    #[serde(default)]
    status: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ListBody<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next_starting_after: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyticsBody {
    #[serde(default)]
    emails_sent_count: i64,
    #[serde(default)]
    open_count: i64,
    #[serde(default)]
    reply_count: i64,
}

#[derive(Debug, Deserialize)]
struct AccountBody {
    email: String,
    #[serde(default)]
    status: Option<i64>,
    #[serde(default)]
    warmup_status: Option<i64>,
    #[serde(default)]
    stat_warmup_score: Option<f64>,
    #[serde(default)]
    daily_limit: Option<i32>,
}

/// Instantly 风格的 v2 投递网关
pub struct InstantlyDeliveryGateway {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

/// 远程状态码转为可读字符串
fn status_label(status: Option<&Value>) -> Option<String> {
    match status? {
        Value::Number(n) => Some(
            match n.as_i64() {
                Some(0) => "draft",
                Some(1) => "active",
                Some(2) => "paused",
                Some(3) => "completed",
                Some(4) => "running_subsequences",
                Some(-1) => "accounts_unhealthy",
                Some(-2) => "bounce_protected",
                Some(-99) => "suspended",
                _ => return Some(n.to_string()),
            }
            .to_string(),
        ),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn clamp_count(value: i64) -> i32 {
    value.clamp(0, i64::from(i32::MAX)) as i32
}

fn schedule_payload(name: &str, schedule: &SendSchedule) -> Value {
    let days: Map<String, Value> = schedule
        .days
        .as_array()
        .iter()
        .enumerate()
        .map(|(index, enabled)| (index.to_string(), Value::Bool(*enabled)))
        .collect();

    json!({
        "schedules": [{
            "name": name,
            "timing": {
                "from": format!("{:02}:00", schedule.start_hour),
                "to": format!("{:02}:00", schedule.end_hour.min(23)),
            },
            "days": days,
            "timezone": schedule.timezone,
        }]
    })
}

fn sequences_payload(steps: &[SequenceStep]) -> Value {
    let steps: Vec<Value> = steps
        .iter()
        .map(|step| {
            json!({
                "type": "email",
                "delay": step.delay_days,
                "variants": [{ "subject": step.subject, "body": step.body }],
            })
        })
        .collect();
    json!([{ "steps": steps }])
}

fn lead_payload(lead: &RemoteLead) -> Value {
    let mut custom = Map::new();
    if let Some(title) = &lead.job_title {
        custom.insert("job_title".to_string(), Value::String(title.clone()));
    }
    if let Some(url) = &lead.linkedin_url {
        custom.insert("linkedin_url".to_string(), Value::String(url.clone()));
    }

    json!({
        "email": lead.email,
        "first_name": lead.first_name,
        "last_name": lead.last_name,
        "company_name": lead.company_name,
        "phone": lead.phone,
        "personalization": lead.personalization,
        "custom_variables": custom,
    })
}

impl InstantlyDeliveryGateway {
    pub fn new(settings: &DeliveryProviderSettings) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client(settings.timeout_secs),
            base_url: parse_base_url(&settings.base_url)?,
            api_key: settings.api_key.clone(),
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, GatewayError> {
        let response = request.send().await.map_err(transport_error)?;
        let response = check_status(response, resource).await?;
        response.json().await.map_err(transport_error)
    }

    async fn send_empty(&self, request: RequestBuilder, resource: &str) -> Result<(), GatewayError> {
        let response = request.send().await.map_err(transport_error)?;
        check_status(response, resource).await?;
        Ok(())
    }

    async fn patch_campaign(&self, remote_id: &str, body: Value) -> Result<(), GatewayError> {
        let url = endpoint(&self.base_url, &format!("api/v2/campaigns/{}", remote_id))?;
        self.send_empty(
            self.request(Method::PATCH, url).json(&body),
            &format!("campaign {}", remote_id),
        )
        .await
    }

    async fn campaign_stats(&self, remote_id: &str) -> Result<CampaignStats, GatewayError> {
        let mut url = endpoint(&self.base_url, "api/v2/campaigns/analytics")?;
        url.query_pairs_mut().append_pair("id", remote_id);

        let rows: Vec<AnalyticsBody> = self
            .send_json(
                self.request(Method::GET, url),
                &format!("analytics of campaign {}", remote_id),
            )
            .await?;
        let row = rows.into_iter().next().unwrap_or_default();

        Ok(CampaignStats {
            sent: clamp_count(row.emails_sent_count),
            opened: clamp_count(row.open_count),
            replied: clamp_count(row.reply_count),
        })
    }
}

#[async_trait]
impl DeliveryProviderGateway for InstantlyDeliveryGateway {
    async fn create_campaign(&self, name: &str) -> Result<String, GatewayError> {
        let url = endpoint(&self.base_url, "api/v2/campaigns")?;
        // The API rejects campaigns without a schedule; the real one is pushed right after
        let body = json!({
            "name": name,
            "campaign_schedule": schedule_payload(name, &SendSchedule::default()),
        });

        let created: CampaignBody = self
            .send_json(self.request(Method::POST, url).json(&body), "campaigns")
            .await?;
        debug!(remote_campaign_id = %created.id, "Created remote campaign");
        Ok(created.id)
    }

    async fn get_campaign(&self, remote_id: &str) -> Result<RemoteCampaignSnapshot, GatewayError> {
        let url = endpoint(&self.base_url, &format!("api/v2/campaigns/{}", remote_id))?;
        let campaign: CampaignBody = self
            .send_json(
                self.request(Method::GET, url),
                &format!("campaign {}", remote_id),
            )
            .await?;
        let stats = self.campaign_stats(remote_id).await?;

        Ok(RemoteCampaignSnapshot {
            status: status_label(campaign.status.as_ref()),
            id: campaign.id,
            name: campaign.name,
            stats,
        })
    }

    async fn find_campaigns_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<RemoteCampaignSnapshot>, GatewayError> {
        let mut found = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut url = endpoint(&self.base_url, "api/v2/campaigns")?;
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("search", name)
                    .append_pair("limit", &LIST_PAGE_LIMIT.to_string());
                if let Some(after) = &cursor {
                    query.append_pair("starting_after", after);
                }
            }

            let page: ListBody<CampaignBody> = self
                .send_json(self.request(Method::GET, url), "campaigns")
                .await?;
            found.extend(page.items.into_iter().map(|c| RemoteCampaignSnapshot {
                status: status_label(c.status.as_ref()),
                id: c.id,
                name: c.name,
                stats: CampaignStats::default(),
            }));

            match page.next_starting_after {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(found)
    }

    async fn set_accounts(&self, remote_id: &str, addresses: &[String]) -> Result<(), GatewayError> {
        self.patch_campaign(remote_id, json!({ "email_list": addresses }))
            .await
    }

    async fn set_options(
        &self,
        remote_id: &str,
        options: &CampaignOptions,
    ) -> Result<(), GatewayError> {
        self.patch_campaign(
            remote_id,
            json!({
                "daily_limit": options.daily_limit,
                "stop_on_reply": options.stop_on_reply,
                "open_tracking": options.open_tracking,
                "link_tracking": options.link_tracking,
            }),
        )
        .await
    }

    async fn set_schedule(
        &self,
        remote_id: &str,
        schedule: &SendSchedule,
    ) -> Result<(), GatewayError> {
        self.patch_campaign(
            remote_id,
            json!({ "campaign_schedule": schedule_payload("default", schedule) }),
        )
        .await
    }

    async fn set_sequences(
        &self,
        remote_id: &str,
        steps: &[SequenceStep],
    ) -> Result<(), GatewayError> {
        self.patch_campaign(remote_id, json!({ "sequences": sequences_payload(steps) }))
            .await
    }

    async fn set_status(&self, remote_id: &str, state: RemoteRunState) -> Result<(), GatewayError> {
        let action = match state {
            RemoteRunState::Active => "activate",
            RemoteRunState::Paused => "pause",
        };
        let url = endpoint(
            &self.base_url,
            &format!("api/v2/campaigns/{}/{}", remote_id, action),
        )?;
        self.send_empty(
            self.request(Method::POST, url),
            &format!("campaign {}", remote_id),
        )
        .await
    }

    async fn add_leads(&self, remote_id: &str, leads: &[RemoteLead]) -> Result<(), GatewayError> {
        if leads.is_empty() {
            return Ok(());
        }
        let url = endpoint(&self.base_url, "api/v2/leads/add")?;
        let body = json!({
            "campaign_id": remote_id,
            "skip_if_in_campaign": true,
            "leads": leads.iter().map(lead_payload).collect::<Vec<_>>(),
        });
        self.send_empty(
            self.request(Method::POST, url).json(&body),
            &format!("campaign {}", remote_id),
        )
        .await
    }

    async fn list_accounts(&self) -> Result<Vec<AccountSnapshot>, GatewayError> {
        let mut accounts = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut url = endpoint(&self.base_url, "api/v2/accounts")?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("limit", &LIST_PAGE_LIMIT.to_string());
                if let Some(after) = &cursor {
                    query.append_pair("starting_after", after);
                }
            }

            let page: ListBody<AccountBody> = self
                .send_json(self.request(Method::GET, url), "accounts")
                .await?;
            accounts.extend(page.items.into_iter().map(|a| AccountSnapshot {
                email: a.email,
                active: a.status == Some(1),
                warmup_enabled: a.warmup_status == Some(1),
                reputation_score: a.stat_warmup_score,
                daily_limit: a.daily_limit,
            }));

            match page.next_starting_after {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(accounts)
    }
}
