// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::domain::gateways::delivery_provider::{DeliveryProviderGateway, RemoteLead};
use crate::domain::models::campaign::{
    check_options, check_schedule, check_sequences, Campaign, CampaignOptions, CampaignStatus,
    RemoteRunState, SendSchedule, SequenceStep,
};
use crate::domain::models::lead::{normalize_email, DeliveryEvent, Lead, LeadCampaignStatus};
use crate::domain::repositories::campaign_repository::CampaignRepository;
use crate::domain::repositories::lead_repository::LeadRepository;
use crate::domain::repositories::outreach_account_repository::OutreachAccountRepository;
use crate::domain::repositories::search_job_repository::RepositoryError;
use crate::infrastructure::metrics::{LEADS_PUSHED, REMOTE_CAMPAIGNS_CREATED, REMOTE_CAMPAIGNS_LEAKED};
use crate::utils::errors::OrchestrationError;
use chrono::Utc;
use dashmap::DashMap;
use metrics::counter;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 发信账户分配结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountAssignmentReport {
    /// 已下发到远程活动的发信地址
    pub assigned: Vec<String>,
    /// 本地不存在的账户ID
    pub unknown: Vec<Uuid>,
}

/// 线索推送结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    pub pushed: usize,
    pub skipped_no_icebreaker: usize,
    pub skipped_already_queued: usize,
    /// 不存在或不属于该组织的线索
    pub skipped_missing: usize,
}

/// 重新关联结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelinkReport {
    pub linked: usize,
    /// 没有同名远程活动
    pub unmatched: usize,
    /// 多个同名远程活动，未做猜测
    pub ambiguous: usize,
    /// 查询远程失败
    pub failed: usize,
}

/// 投递统计同步结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LiveStatsReport {
    pub updated: usize,
    pub failed: usize,
}

/// 批量删除结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkDeleteReport {
    pub deleted: usize,
    pub not_found: usize,
    pub failed: usize,
    /// 被解除关联的线索总数
    pub leads_unlinked: u64,
}

/// 单项配置变更，已同步的活动只推送变更的部分
enum ConfigChange {
    Options,
    Schedule,
    Sequences,
    Accounts(Vec<String>),
}

/// 营销活动同步编排器
///
/// 本地活动记录是配置的权威来源，远程活动在第一次需要时才被创建（惰性物化）。
/// 远程ID只通过比较并设置写入一次；同一进程内的并发调用按活动ID串行。
pub struct CampaignSyncOrchestrator {
    campaigns: Arc<dyn CampaignRepository>,
    leads: Arc<dyn LeadRepository>,
    accounts: Arc<dyn OutreachAccountRepository>,
    delivery: Arc<dyn DeliveryProviderGateway>,
    /// 每批推送的线索数
    push_batch_size: usize,
    /// 按活动ID的异步锁
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl CampaignSyncOrchestrator {
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        leads: Arc<dyn LeadRepository>,
        accounts: Arc<dyn OutreachAccountRepository>,
        delivery: Arc<dyn DeliveryProviderGateway>,
        push_batch_size: usize,
    ) -> Self {
        Self {
            campaigns,
            leads,
            accounts,
            delivery,
            push_batch_size: push_batch_size.max(1),
            locks: DashMap::new(),
        }
    }

    async fn load(&self, campaign_id: Uuid) -> Result<Campaign, OrchestrationError> {
        self.campaigns
            .find_by_id(campaign_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("campaign", campaign_id))
    }

    /// 读取本地活动
    pub async fn get_campaign(&self, campaign_id: Uuid) -> Result<Campaign, OrchestrationError> {
        self.load(campaign_id).await
    }

    /// 创建本地草稿，不调用投递服务
    #[instrument(skip(self, options, schedule, sequences), fields(organization_id = %organization_id))]
    pub async fn create_campaign(
        &self,
        organization_id: Uuid,
        name: &str,
        options: Option<CampaignOptions>,
        schedule: Option<SendSchedule>,
        sequences: Vec<SequenceStep>,
    ) -> Result<Campaign, OrchestrationError> {
        let mut campaign = Campaign::new(organization_id, name)?;
        if let Some(options) = options {
            check_options(&options)?;
            campaign.options = options;
        }
        if let Some(schedule) = schedule {
            check_schedule(&schedule)?;
            campaign.schedule = schedule;
        }
        check_sequences(&sequences)?;
        campaign.sequences = sequences;

        let campaign = self.campaigns.create(&campaign).await?;
        info!(campaign_id = %campaign.id, name = %campaign.name, "Draft campaign created");
        Ok(campaign)
    }

    /// 确保远程活动存在并返回远程ID
    ///
    /// 已关联且配置已推送时不会产生任何远程调用
    #[instrument(skip(self))]
    pub async fn ensure_remote_exists(&self, campaign_id: Uuid) -> Result<String, OrchestrationError> {
        self.ensure_remote(campaign_id).await
    }

    async fn ensure_remote(&self, campaign_id: Uuid) -> Result<String, OrchestrationError> {
        let campaign = self.load(campaign_id).await?;
        if let Some(remote_id) = campaign.remote_campaign_id.clone() {
            if !campaign.needs_config_push() {
                return Ok(remote_id);
            }
        }

        let lock = self.lock_for(campaign_id);
        let result = {
            let _guard = lock.lock().await;
            self.ensure_remote_locked(campaign_id).await
        };
        self.release_lock(campaign_id, lock);
        result
    }

    fn lock_for(&self, campaign_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(campaign_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn release_lock(&self, campaign_id: Uuid, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks
            .remove_if(&campaign_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    async fn ensure_remote_locked(
        &self,
        campaign_id: Uuid,
    ) -> Result<String, OrchestrationError> {
        // Re-read under the lock: a previous holder may have finished the work
        let mut campaign = self.load(campaign_id).await?;

        let remote_id = match campaign.remote_campaign_id.clone() {
            Some(remote_id) => remote_id,
            None => {
                let remote_id = self.materialize(&campaign).await?;
                campaign.remote_campaign_id = Some(remote_id.clone());
                remote_id
            }
        };

        if !campaign.needs_config_push() {
            return Ok(remote_id);
        }

        self.push_full_config(&campaign, &remote_id).await?;
        self.campaigns
            .mark_config_synced(campaign.id, Utc::now())
            .await?;
        Ok(remote_id)
    }

    async fn materialize(&self, campaign: &Campaign) -> Result<String, OrchestrationError> {
        let remote_id = self.delivery.create_campaign(&campaign.name).await?;
        counter!(REMOTE_CAMPAIGNS_CREATED).increment(1);

        if self
            .campaigns
            .attach_remote_id_if_absent(campaign.id, &remote_id)
            .await?
        {
            info!(campaign_id = %campaign.id, remote_campaign_id = %remote_id, "Remote campaign materialized");
            return Ok(remote_id);
        }

        // Another process attached first; its id wins
        counter!(REMOTE_CAMPAIGNS_LEAKED).increment(1);
        error!(
            campaign_id = %campaign.id,
            leaked_remote_campaign_id = %remote_id,
            "Lost remote id race, remote campaign leaked"
        );
        self.load(campaign.id)
            .await?
            .remote_campaign_id
            .ok_or_else(|| {
                OrchestrationError::InvalidState(format!(
                    "campaign {} lost remote id race but has no remote id",
                    campaign.id
                ))
            })
    }

    async fn push_full_config(
        &self,
        campaign: &Campaign,
        remote_id: &str,
    ) -> Result<(), OrchestrationError> {
        self.delivery.set_options(remote_id, &campaign.options).await?;
        self.delivery.set_schedule(remote_id, &campaign.schedule).await?;
        if !campaign.sequences.is_empty() {
            self.delivery
                .set_sequences(remote_id, &campaign.sequences)
                .await?;
        }
        if !campaign.sending_account_ids.is_empty() {
            let addresses: Vec<String> = self
                .accounts
                .find_by_ids(&campaign.sending_account_ids)
                .await?
                .into_iter()
                .map(|a| a.email)
                .collect();
            if !addresses.is_empty() {
                self.delivery.set_accounts(remote_id, &addresses).await?;
            }
        }
        debug!(campaign_id = %campaign.id, %remote_id, "Full campaign config pushed");
        Ok(())
    }

    /// 更新发送选项
    #[instrument(skip(self, options))]
    pub async fn update_options(
        &self,
        campaign_id: Uuid,
        options: CampaignOptions,
    ) -> Result<Campaign, OrchestrationError> {
        check_options(&options)?;
        self.apply_config_change(campaign_id, ConfigChange::Options, move |c| c.options = options)
            .await
    }

    /// 更新发送时间窗口
    #[instrument(skip(self, schedule))]
    pub async fn update_schedule(
        &self,
        campaign_id: Uuid,
        schedule: SendSchedule,
    ) -> Result<Campaign, OrchestrationError> {
        check_schedule(&schedule)?;
        self.apply_config_change(campaign_id, ConfigChange::Schedule, move |c| {
            c.schedule = schedule
        })
        .await
    }

    /// 更新邮件序列
    #[instrument(skip(self, sequences))]
    pub async fn update_sequences(
        &self,
        campaign_id: Uuid,
        sequences: Vec<SequenceStep>,
    ) -> Result<Campaign, OrchestrationError> {
        check_sequences(&sequences)?;
        self.apply_config_change(campaign_id, ConfigChange::Sequences, move |c| {
            c.sequences = sequences
        })
        .await
    }

    /// 保存配置意图并下发到远程
    ///
    /// 保存会清空 `config_synced_at`，推送失败时下一次 ensure 会重推完整配置。
    /// 读改写在活动锁内完成，并发的配置修改不会互相覆盖。
    async fn apply_config_change<F>(
        &self,
        campaign_id: Uuid,
        change: ConfigChange,
        mutate: F,
    ) -> Result<Campaign, OrchestrationError>
    where
        F: FnOnce(&mut Campaign) + Send,
    {
        let lock = self.lock_for(campaign_id);
        let result = {
            let _guard = lock.lock().await;
            self.apply_config_change_locked(campaign_id, change, mutate)
                .await
        };
        self.release_lock(campaign_id, lock);
        result?;
        self.load(campaign_id).await
    }

    async fn apply_config_change_locked<F>(
        &self,
        campaign_id: Uuid,
        change: ConfigChange,
        mutate: F,
    ) -> Result<(), OrchestrationError>
    where
        F: FnOnce(&mut Campaign) + Send,
    {
        let mut campaign = self.load(campaign_id).await?;
        let was_synced = campaign.is_materialized() && !campaign.needs_config_push();
        mutate(&mut campaign);
        campaign.updated_at = Utc::now();
        self.campaigns.update_config(&campaign).await?;

        let remote_id = match campaign.remote_campaign_id.clone() {
            Some(remote_id) if was_synced => remote_id,
            // Not materialized or already behind: the full push covers this change
            _ => {
                self.ensure_remote_locked(campaign_id).await?;
                return Ok(());
            }
        };

        match &change {
            ConfigChange::Options => {
                self.delivery
                    .set_options(&remote_id, &campaign.options)
                    .await?
            }
            ConfigChange::Schedule => {
                self.delivery
                    .set_schedule(&remote_id, &campaign.schedule)
                    .await?
            }
            ConfigChange::Sequences => {
                self.delivery
                    .set_sequences(&remote_id, &campaign.sequences)
                    .await?
            }
            ConfigChange::Accounts(addresses) => {
                self.delivery.set_accounts(&remote_id, addresses).await?
            }
        }
        self.campaigns
            .mark_config_synced(campaign_id, Utc::now())
            .await?;
        Ok(())
    }

    /// 启动或暂停活动
    ///
    /// 只能设置为 active 或 paused；只写状态列，不覆盖其他配置
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        campaign_id: Uuid,
        status: CampaignStatus,
    ) -> Result<Campaign, OrchestrationError> {
        let state = match status {
            CampaignStatus::Active => RemoteRunState::Active,
            CampaignStatus::Paused => RemoteRunState::Paused,
            other => {
                return Err(OrchestrationError::Validation(format!(
                    "campaign status {} cannot be set directly",
                    other
                )))
            }
        };

        let mut campaign = self.load(campaign_id).await?;
        campaign.transition_to(state)?;

        let remote_id = self.ensure_remote(campaign_id).await?;
        self.delivery.set_status(&remote_id, state).await?;
        self.campaigns
            .update_status(campaign_id, campaign.status)
            .await?;
        info!(%status, "Campaign status changed");
        self.load(campaign_id).await
    }

    /// 为活动分配发信账户（全量替换）
    ///
    /// 未知的账户ID会出现在报告中；一个都无法解析时拒绝请求
    #[instrument(skip(self, account_ids), fields(requested = account_ids.len()))]
    pub async fn assign_accounts(
        &self,
        campaign_id: Uuid,
        account_ids: &[Uuid],
    ) -> Result<AccountAssignmentReport, OrchestrationError> {
        // Fail fast on an unknown campaign before resolving accounts
        self.load(campaign_id).await?;

        let mut seen = HashSet::new();
        let requested: Vec<Uuid> = account_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        let found: HashMap<Uuid, String> = self
            .accounts
            .find_by_ids(&requested)
            .await?
            .into_iter()
            .map(|a| (a.id, a.email))
            .collect();

        let mut resolved_ids = Vec::new();
        let mut assigned = Vec::new();
        let mut unknown = Vec::new();
        for id in requested {
            match found.get(&id) {
                Some(email) => {
                    resolved_ids.push(id);
                    assigned.push(email.clone());
                }
                None => unknown.push(id),
            }
        }

        if assigned.is_empty() {
            return Err(OrchestrationError::Validation(
                "none of the requested sending accounts exist".to_string(),
            ));
        }
        if !unknown.is_empty() {
            warn!(?unknown, "Ignoring unknown sending accounts");
        }

        self.apply_config_change(
            campaign_id,
            ConfigChange::Accounts(assigned.clone()),
            move |c| c.sending_account_ids = resolved_ids,
        )
        .await?;

        Ok(AccountAssignmentReport { assigned, unknown })
    }

    /// 推送线索到远程活动
    ///
    /// 只推送属于活动所属组织、开场白已完成且尚未进入任何活动的线索。
    /// 没有合格线索时不产生远程调用。
    #[instrument(skip(self, lead_ids), fields(requested = lead_ids.len()))]
    pub async fn push_leads(
        &self,
        campaign_id: Uuid,
        lead_ids: &[Uuid],
    ) -> Result<PushReport, OrchestrationError> {
        let campaign = self.load(campaign_id).await?;

        let mut seen = HashSet::new();
        let requested: Vec<Uuid> = lead_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        let mut found: HashMap<Uuid, Lead> = self
            .leads
            .find_by_ids(&requested)
            .await?
            .into_iter()
            .filter(|lead| lead.organization_id == campaign.organization_id)
            .map(|lead| (lead.id, lead))
            .collect();

        let mut report = PushReport::default();
        let mut ready = Vec::new();
        for id in &requested {
            match found.remove(id) {
                None => report.skipped_missing += 1,
                Some(lead) if lead.campaign_status != LeadCampaignStatus::NotAdded => {
                    report.skipped_already_queued += 1
                }
                Some(lead) if !lead.has_completed_icebreaker() => {
                    report.skipped_no_icebreaker += 1
                }
                Some(lead) => ready.push(lead),
            }
        }

        if ready.is_empty() {
            info!(?report, "No qualifying leads to push");
            return Ok(report);
        }

        let remote_id = self.ensure_remote(campaign_id).await?;
        for batch in ready.chunks(self.push_batch_size) {
            let payload: Vec<RemoteLead> = batch.iter().map(RemoteLead::from_lead).collect();
            if let Err(e) = self.delivery.add_leads(&remote_id, &payload).await {
                warn!(pushed_so_far = report.pushed, error = %e, "Lead batch push failed");
                return Err(e.into());
            }

            let ids: Vec<Uuid> = batch.iter().map(|lead| lead.id).collect();
            self.leads.mark_queued(&ids, campaign_id).await?;
            report.pushed += batch.len();
            counter!(LEADS_PUSHED).increment(batch.len() as u64);
        }

        info!(?report, "Leads pushed to remote campaign");
        Ok(report)
    }

    /// 为尚未关联的活动寻找同名远程活动
    ///
    /// 只有恰好一个候选时才关联，零个或多个只报告不猜测
    #[instrument(skip(self))]
    pub async fn relink_orphans(
        &self,
        organization_id: Option<Uuid>,
    ) -> Result<RelinkReport, OrchestrationError> {
        let mut report = RelinkReport::default();
        let orphans = self.campaigns.find_unlinked(organization_id).await?;
        if orphans.is_empty() {
            return Ok(report);
        }

        let mut taken: HashSet<String> = self
            .campaigns
            .find_linked()
            .await?
            .into_iter()
            .filter_map(|c| c.remote_campaign_id)
            .collect();

        for campaign in orphans {
            let candidates = match self.delivery.find_campaigns_by_name(&campaign.name).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(campaign_id = %campaign.id, error = %e, "Remote campaign search failed");
                    report.failed += 1;
                    continue;
                }
            };

            let matches: Vec<String> = candidates
                .into_iter()
                .filter(|remote| remote.name == campaign.name && !taken.contains(&remote.id))
                .map(|remote| remote.id)
                .collect();

            match matches.as_slice() {
                [] => report.unmatched += 1,
                [remote_id] => {
                    if self
                        .campaigns
                        .attach_remote_id_if_absent(campaign.id, remote_id)
                        .await?
                    {
                        info!(campaign_id = %campaign.id, remote_campaign_id = %remote_id, "Relinked orphan campaign");
                        taken.insert(remote_id.clone());
                        report.linked += 1;
                    }
                }
                _ => {
                    warn!(
                        campaign_id = %campaign.id,
                        candidates = matches.len(),
                        "Multiple remote campaigns share this name, not relinking"
                    );
                    report.ambiguous += 1;
                }
            }
        }

        info!(?report, "Relink finished");
        Ok(report)
    }

    /// 用投递服务的统计覆盖所有已关联活动
    #[instrument(skip(self))]
    pub async fn sync_live_stats(&self) -> Result<LiveStatsReport, OrchestrationError> {
        let mut report = LiveStatsReport::default();

        for campaign in self.campaigns.find_linked().await? {
            let Some(remote_id) = campaign.remote_campaign_id.as_deref() else {
                continue;
            };
            let snapshot = match self.delivery.get_campaign(remote_id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(campaign_id = %campaign.id, error = %e, "Live stats fetch failed");
                    report.failed += 1;
                    continue;
                }
            };

            match self
                .campaigns
                .update_live_stats(campaign.id, snapshot.stats, snapshot.status, Utc::now())
                .await
            {
                Ok(()) => report.updated += 1,
                // Deleted while syncing
                Err(RepositoryError::NotFound) => report.failed += 1,
                Err(e) => return Err(e.into()),
            }
        }

        debug!(?report, "Live stats synced");
        Ok(report)
    }

    /// 把投递事件映射到线索的投递状态，状态只前进不后退
    ///
    /// # 返回值
    ///
    /// * `Some(status)` - 状态已更新
    /// * `None` - 事件不改变状态
    #[instrument(skip(self, email))]
    pub async fn apply_delivery_event(
        &self,
        remote_campaign_id: &str,
        email: &str,
        event: DeliveryEvent,
    ) -> Result<Option<LeadCampaignStatus>, OrchestrationError> {
        let campaign = self
            .campaigns
            .find_by_remote_id(remote_campaign_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("remote campaign", remote_campaign_id))?;
        let normalized = normalize_email(email)
            .ok_or_else(|| OrchestrationError::Validation(format!("invalid email {}", email)))?;
        let lead = self
            .leads
            .find_by_email(campaign.organization_id, &normalized)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("lead", &normalized))?;

        if lead.campaign_id != Some(campaign.id) {
            debug!(lead_id = %lead.id, "Lead no longer belongs to this campaign, ignoring event");
            return Ok(None);
        }

        let next = lead.campaign_status.advance(event);
        if let Some(status) = next {
            self.leads.update_campaign_status(lead.id, status).await?;
        }
        Ok(next)
    }

    /// 修改活动所属组织，只影响本地
    #[instrument(skip(self))]
    pub async fn move_campaign(
        &self,
        campaign_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Campaign, OrchestrationError> {
        match self
            .campaigns
            .update_organization(campaign_id, organization_id)
            .await
        {
            Ok(()) => self.load(campaign_id).await,
            Err(RepositoryError::NotFound) => {
                Err(OrchestrationError::not_found("campaign", campaign_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 删除本地活动并解除线索关联，远程活动保持不变
    ///
    /// # 返回值
    ///
    /// 被解除关联的线索数
    #[instrument(skip(self))]
    pub async fn delete_campaign(&self, campaign_id: Uuid) -> Result<u64, OrchestrationError> {
        match self.campaigns.delete_and_unlink_leads(campaign_id).await {
            Ok(unlinked) => {
                info!(unlinked, "Campaign deleted");
                Ok(unlinked)
            }
            Err(RepositoryError::NotFound) => {
                Err(OrchestrationError::not_found("campaign", campaign_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 逐个删除，部分成功
    pub async fn delete_campaigns(&self, campaign_ids: &[Uuid]) -> BulkDeleteReport {
        let mut report = BulkDeleteReport::default();
        for id in campaign_ids {
            match self.delete_campaign(*id).await {
                Ok(unlinked) => {
                    report.deleted += 1;
                    report.leads_unlinked += unlinked;
                }
                Err(OrchestrationError::NotFound(_)) => report.not_found += 1,
                Err(e) => {
                    warn!(campaign_id = %id, error = %e, "Campaign delete failed");
                    report.failed += 1;
                }
            }
        }
        report
    }
}
