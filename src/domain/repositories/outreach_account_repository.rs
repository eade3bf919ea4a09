// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::search_job_repository::RepositoryError;
use crate::domain::models::outreach_account::{AccountSnapshot, OutreachAccount};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 同步写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// 发信账户仓库特质
#[async_trait]
pub trait OutreachAccountRepository: Send + Sync {
    /// 按邮箱写入远程快照，保留本地组织归属
    async fn upsert_snapshot(
        &self,
        snapshot: &AccountSnapshot,
        synced_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OutreachAccount>, RepositoryError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<OutreachAccount>, RepositoryError>;

    /// 列出账户，`organization_id` 为空时返回全部
    async fn list(
        &self,
        organization_id: Option<Uuid>,
    ) -> Result<Vec<OutreachAccount>, RepositoryError>;

    /// 修改组织归属，`None` 表示放回公共池
    async fn assign_organization(
        &self,
        id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<(), RepositoryError>;
}
