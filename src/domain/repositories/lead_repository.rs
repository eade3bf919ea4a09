// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::search_job_repository::RepositoryError;
use crate::domain::models::lead::{IcebreakerStatus, Lead, LeadCampaignStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// 线索仓库特质
///
/// 以 (organization_id, email_normalized) 作为唯一键，
/// 导入路径只插入不存在的线索，不会覆盖用户已编辑的字段。
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// 插入线索，若同组织下已存在相同邮箱则跳过
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 新插入
    /// * `Ok(false)` - 已存在，未做任何修改
    async fn insert_if_absent(&self, lead: &Lead) -> Result<bool, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, RepositoryError>;

    /// 批量查找，结果顺序不保证
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Lead>, RepositoryError>;

    async fn find_by_job(&self, job_id: Uuid) -> Result<Vec<Lead>, RepositoryError>;

    async fn find_by_campaign(&self, campaign_id: Uuid) -> Result<Vec<Lead>, RepositoryError>;

    /// 按组织与规范化邮箱查找
    async fn find_by_email(
        &self,
        organization_id: Uuid,
        email_normalized: &str,
    ) -> Result<Option<Lead>, RepositoryError>;

    /// 统计归属于某个任务的线索数
    async fn count_by_job(&self, job_id: Uuid) -> Result<u64, RepositoryError>;

    /// 更新开场白字段
    async fn update_icebreaker(
        &self,
        id: Uuid,
        status: IcebreakerStatus,
        icebreaker: Option<String>,
        error: Option<String>,
    ) -> Result<(), RepositoryError>;

    /// 将仍处于 not_added 的线索标记为 queued 并关联活动
    ///
    /// # 返回值
    ///
    /// 实际被修改的行数
    async fn mark_queued(&self, ids: &[Uuid], campaign_id: Uuid) -> Result<u64, RepositoryError>;

    /// 更新投递状态
    async fn update_campaign_status(
        &self,
        id: Uuid,
        status: LeadCampaignStatus,
    ) -> Result<(), RepositoryError>;
}
