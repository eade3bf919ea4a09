// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::gateways::delivery_provider::DeliveryProviderGateway;
use crate::domain::models::outreach_account::OutreachAccount;
use crate::domain::repositories::outreach_account_repository::{
    OutreachAccountRepository, UpsertOutcome,
};
use crate::domain::repositories::search_job_repository::RepositoryError;
use crate::utils::errors::OrchestrationError;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// 账户同步结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccountSyncReport {
    pub created: usize,
    pub updated: usize,
}

/// 发信账户同步服务
///
/// 以邮箱为键从投递服务全量写入，组织归属只在本地修改。
pub struct AccountSync {
    accounts: Arc<dyn OutreachAccountRepository>,
    delivery: Arc<dyn DeliveryProviderGateway>,
}

impl AccountSync {
    pub fn new(
        accounts: Arc<dyn OutreachAccountRepository>,
        delivery: Arc<dyn DeliveryProviderGateway>,
    ) -> Self {
        Self { accounts, delivery }
    }

    /// 从投递服务同步所有发信账户
    #[instrument(skip(self))]
    pub async fn sync_accounts(&self) -> Result<AccountSyncReport, OrchestrationError> {
        let snapshots = self.delivery.list_accounts().await?;
        let synced_at = Utc::now();
        let mut report = AccountSyncReport::default();
        let mut seen = HashSet::new();

        for snapshot in snapshots {
            if !seen.insert(snapshot.email.trim().to_lowercase()) {
                continue;
            }
            match self.accounts.upsert_snapshot(&snapshot, synced_at).await? {
                UpsertOutcome::Created => report.created += 1,
                UpsertOutcome::Updated => report.updated += 1,
            }
        }

        info!(created = report.created, updated = report.updated, "Sending accounts synced");
        Ok(report)
    }

    /// 分配账户到组织，`None` 放回公共池
    #[instrument(skip(self))]
    pub async fn assign_to_organization(
        &self,
        account_id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<OutreachAccount, OrchestrationError> {
        match self
            .accounts
            .assign_organization(account_id, organization_id)
            .await
        {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => {
                return Err(OrchestrationError::not_found("sending account", account_id))
            }
            Err(e) => return Err(e.into()),
        }

        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("sending account", account_id))
    }

    /// 列出账户，可按组织过滤
    pub async fn list_accounts(
        &self,
        organization_id: Option<Uuid>,
    ) -> Result<Vec<OutreachAccount>, OrchestrationError> {
        Ok(self.accounts.list(organization_id).await?)
    }
}
