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

use crate::domain::models::campaign::{Campaign, CampaignStats, CampaignStatus};
use crate::domain::repositories::campaign_repository::CampaignRepository;
use crate::domain::repositories::search_job_repository::RepositoryError;
use crate::infrastructure::database::entities::{campaign as campaign_entity, lead as lead_entity};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 营销活动仓库实现
#[derive(Clone)]
pub struct CampaignRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl CampaignRepositoryImpl {
    /// 创建新的营销活动仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<campaign_entity::Model> for Campaign {
    type Error = RepositoryError;

    fn try_from(m: campaign_entity::Model) -> Result<Self, Self::Error> {
        let status = m.status.parse().map_err(|_| {
            RepositoryError::Serialization(format!("Invalid campaign status: {}", m.status))
        })?;

        Ok(Self {
            id: m.id,
            organization_id: m.organization_id,
            remote_campaign_id: m.remote_campaign_id,
            name: m.name,
            status,
            remote_status: m.remote_status,
            options: serde_json::from_value(m.options)?,
            schedule: serde_json::from_value(m.schedule)?,
            sequences: serde_json::from_value(m.sequences)?,
            sending_account_ids: serde_json::from_value(m.sending_account_ids)?,
            stats: CampaignStats {
                sent: m.sent_count,
                opened: m.opened_count,
                replied: m.replied_count,
            },
            config_synced_at: m.config_synced_at.map(Into::into),
            last_synced_at: m.last_synced_at.map(Into::into),
            created_at: m.created_at.into(),
            updated_at: m.updated_at.into(),
        })
    }
}

fn collect(models: Vec<campaign_entity::Model>) -> Result<Vec<Campaign>, RepositoryError> {
    models.into_iter().map(Campaign::try_from).collect()
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().into()
}

#[async_trait]
impl CampaignRepository for CampaignRepositoryImpl {
    async fn create(&self, campaign: &Campaign) -> Result<Campaign, RepositoryError> {
        let model = campaign_entity::ActiveModel {
            id: Set(campaign.id),
            organization_id: Set(campaign.organization_id),
            remote_campaign_id: Set(campaign.remote_campaign_id.clone()),
            name: Set(campaign.name.clone()),
            status: Set(campaign.status.to_string()),
            remote_status: Set(campaign.remote_status.clone()),
            options: Set(serde_json::to_value(&campaign.options)?),
            schedule: Set(serde_json::to_value(&campaign.schedule)?),
            sequences: Set(serde_json::to_value(&campaign.sequences)?),
            sending_account_ids: Set(serde_json::to_value(&campaign.sending_account_ids)?),
            sent_count: Set(campaign.stats.sent),
            opened_count: Set(campaign.stats.opened),
            replied_count: Set(campaign.stats.replied),
            config_synced_at: Set(campaign.config_synced_at.map(Into::into)),
            last_synced_at: Set(campaign.last_synced_at.map(Into::into)),
            created_at: Set(campaign.created_at.into()),
            updated_at: Set(campaign.updated_at.into()),
        };

        model.insert(self.db.as_ref()).await?;
        Ok(campaign.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>, RepositoryError> {
        campaign_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(Campaign::try_from)
            .transpose()
    }

    async fn find_by_remote_id(
        &self,
        remote_id: &str,
    ) -> Result<Option<Campaign>, RepositoryError> {
        campaign_entity::Entity::find()
            .filter(campaign_entity::Column::RemoteCampaignId.eq(remote_id))
            .one(self.db.as_ref())
            .await?
            .map(Campaign::try_from)
            .transpose()
    }

    async fn update_config(&self, campaign: &Campaign) -> Result<(), RepositoryError> {
        let result = campaign_entity::Entity::update_many()
            .col_expr(
                campaign_entity::Column::Name,
                Expr::value(campaign.name.clone()),
            )
            .col_expr(
                campaign_entity::Column::Options,
                Expr::value(serde_json::to_value(&campaign.options)?),
            )
            .col_expr(
                campaign_entity::Column::Schedule,
                Expr::value(serde_json::to_value(&campaign.schedule)?),
            )
            .col_expr(
                campaign_entity::Column::Sequences,
                Expr::value(serde_json::to_value(&campaign.sequences)?),
            )
            .col_expr(
                campaign_entity::Column::SendingAccountIds,
                Expr::value(serde_json::to_value(&campaign.sending_account_ids)?),
            )
            .col_expr(
                campaign_entity::Column::ConfigSyncedAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .col_expr(campaign_entity::Column::UpdatedAt, Expr::value(now()))
            .filter(campaign_entity::Column::Id.eq(campaign.id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: CampaignStatus) -> Result<(), RepositoryError> {
        let result = campaign_entity::Entity::update_many()
            .col_expr(campaign_entity::Column::Status, Expr::value(status.to_string()))
            .col_expr(campaign_entity::Column::UpdatedAt, Expr::value(now()))
            .filter(campaign_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn attach_remote_id_if_absent(
        &self,
        id: Uuid,
        remote_id: &str,
    ) -> Result<bool, RepositoryError> {
        // Compare-and-set: the IS NULL guard makes the first writer win
        let result = campaign_entity::Entity::update_many()
            .col_expr(
                campaign_entity::Column::RemoteCampaignId,
                Expr::value(Some(remote_id.to_string())),
            )
            .col_expr(campaign_entity::Column::UpdatedAt, Expr::value(now()))
            .filter(campaign_entity::Column::Id.eq(id))
            .filter(campaign_entity::Column::RemoteCampaignId.is_null())
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn mark_config_synced(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let at: DateTime<FixedOffset> = at.into();
        let result = campaign_entity::Entity::update_many()
            .col_expr(campaign_entity::Column::ConfigSyncedAt, Expr::value(Some(at)))
            .filter(campaign_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_live_stats(
        &self,
        id: Uuid,
        stats: CampaignStats,
        remote_status: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let at: DateTime<FixedOffset> = at.into();
        let result = campaign_entity::Entity::update_many()
            .col_expr(campaign_entity::Column::SentCount, Expr::value(stats.sent))
            .col_expr(campaign_entity::Column::OpenedCount, Expr::value(stats.opened))
            .col_expr(
                campaign_entity::Column::RepliedCount,
                Expr::value(stats.replied),
            )
            .col_expr(campaign_entity::Column::RemoteStatus, Expr::value(remote_status))
            .col_expr(campaign_entity::Column::LastSyncedAt, Expr::value(Some(at)))
            .filter(campaign_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_organization(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<(), RepositoryError> {
        let result = campaign_entity::Entity::update_many()
            .col_expr(
                campaign_entity::Column::OrganizationId,
                Expr::value(organization_id),
            )
            .col_expr(campaign_entity::Column::UpdatedAt, Expr::value(now()))
            .filter(campaign_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_unlinked(
        &self,
        organization_id: Option<Uuid>,
    ) -> Result<Vec<Campaign>, RepositoryError> {
        let mut query = campaign_entity::Entity::find()
            .filter(campaign_entity::Column::RemoteCampaignId.is_null());
        if let Some(organization_id) = organization_id {
            query = query.filter(campaign_entity::Column::OrganizationId.eq(organization_id));
        }

        let models = query
            .order_by_asc(campaign_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        collect(models)
    }

    async fn find_linked(&self) -> Result<Vec<Campaign>, RepositoryError> {
        let models = campaign_entity::Entity::find()
            .filter(campaign_entity::Column::RemoteCampaignId.is_not_null())
            .order_by_asc(campaign_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        collect(models)
    }

    async fn delete_and_unlink_leads(&self, id: Uuid) -> Result<u64, RepositoryError> {
        let txn = self.db.begin().await?;

        // campaign_status is left untouched on purpose: history stays visible
        let unlinked = lead_entity::Entity::update_many()
            .col_expr(
                lead_entity::Column::CampaignId,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(lead_entity::Column::UpdatedAt, Expr::value(now()))
            .filter(lead_entity::Column::CampaignId.eq(id))
            .exec(&txn)
            .await?;

        let deleted = campaign_entity::Entity::delete_by_id(id).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            txn.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        txn.commit().await?;
        Ok(unlinked.rows_affected)
    }
}
