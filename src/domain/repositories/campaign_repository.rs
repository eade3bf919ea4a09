// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::search_job_repository::RepositoryError;
use crate::domain::models::campaign::{Campaign, CampaignStats, CampaignStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 营销活动仓库特质
///
/// `remote_campaign_id` 列是防止重复创建远程活动的唯一串行化点，
/// 只能通过 `attach_remote_id_if_absent` 以比较并设置的方式写入。
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn create(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>, RepositoryError>;

    async fn find_by_remote_id(&self, remote_id: &str)
        -> Result<Option<Campaign>, RepositoryError>;

    /// 保存本地配置意图（名称、选项、时间窗口、序列、发信账户）
    ///
    /// 同时清空 `config_synced_at`：远程配置在重新推送成功前视为过期。
    /// 不会修改远程ID与统计。
    async fn update_config(&self, campaign: &Campaign) -> Result<(), RepositoryError>;

    /// 只修改运行状态
    async fn update_status(&self, id: Uuid, status: CampaignStatus) -> Result<(), RepositoryError>;

    /// 仅当远程ID仍为空时写入
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 本次写入生效
    /// * `Ok(false)` - 已被其他调用者抢先写入
    async fn attach_remote_id_if_absent(
        &self,
        id: Uuid,
        remote_id: &str,
    ) -> Result<bool, RepositoryError>;

    /// 记录完整配置推送成功
    async fn mark_config_synced(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError>;

    /// 用远程统计覆盖本地镜像
    async fn update_live_stats(
        &self,
        id: Uuid,
        stats: CampaignStats,
        remote_status: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// 修改所属组织
    async fn update_organization(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<(), RepositoryError>;

    /// 查找尚未物化的活动，可按组织过滤
    async fn find_unlinked(
        &self,
        organization_id: Option<Uuid>,
    ) -> Result<Vec<Campaign>, RepositoryError>;

    /// 查找所有已关联远程活动的记录
    async fn find_linked(&self) -> Result<Vec<Campaign>, RepositoryError>;

    /// 删除活动并解除线索关联（同一事务）
    ///
    /// # 返回值
    ///
    /// 被解除关联的线索数
    async fn delete_and_unlink_leads(&self, id: Uuid) -> Result<u64, RepositoryError>;
}
