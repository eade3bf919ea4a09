// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::GatewayError;
use crate::domain::models::campaign::{
    CampaignOptions, CampaignStats, RemoteRunState, SendSchedule, SequenceStep,
};
use crate::domain::models::lead::Lead;
use crate::domain::models::outreach_account::AccountSnapshot;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 远程活动快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCampaignSnapshot {
    pub id: String,
    pub name: String,
    pub status: Option<String>,
    pub stats: CampaignStats,
}

/// 推送到远程活动的线索
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLead {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    /// 个性化开场白
    pub personalization: String,
}

impl RemoteLead {
    /// 由已生成开场白的线索构造
    pub fn from_lead(lead: &Lead) -> Self {
        Self {
            email: lead.email.clone(),
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            company_name: lead.company.clone(),
            job_title: lead.title.clone(),
            phone: lead.phone.clone(),
            linkedin_url: lead.profile_url.clone(),
            personalization: lead.icebreaker.clone().unwrap_or_default(),
        }
    }
}

/// 投递服务网关
///
/// 远程活动有独立的ID空间与最终一致语义，所有写操作都以远程ID寻址。
#[async_trait]
pub trait DeliveryProviderGateway: Send + Sync {
    /// 创建远程活动，返回远程ID
    async fn create_campaign(&self, name: &str) -> Result<String, GatewayError>;

    /// 读取远程活动快照（含投递统计）
    async fn get_campaign(&self, remote_id: &str) -> Result<RemoteCampaignSnapshot, GatewayError>;

    /// 按名称搜索远程活动，可能返回近似匹配，调用方需自行精确比较
    async fn find_campaigns_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<RemoteCampaignSnapshot>, GatewayError>;

    /// 全量替换远程活动的发信地址
    async fn set_accounts(&self, remote_id: &str, addresses: &[String]) -> Result<(), GatewayError>;

    async fn set_options(
        &self,
        remote_id: &str,
        options: &CampaignOptions,
    ) -> Result<(), GatewayError>;

    async fn set_schedule(
        &self,
        remote_id: &str,
        schedule: &SendSchedule,
    ) -> Result<(), GatewayError>;

    async fn set_sequences(
        &self,
        remote_id: &str,
        steps: &[SequenceStep],
    ) -> Result<(), GatewayError>;

    async fn set_status(&self, remote_id: &str, state: RemoteRunState) -> Result<(), GatewayError>;

    /// 推送线索
    async fn add_leads(&self, remote_id: &str, leads: &[RemoteLead]) -> Result<(), GatewayError>;

    /// 列出投递服务上的所有发信账户
    async fn list_accounts(&self) -> Result<Vec<AccountSnapshot>, GatewayError>;
}
