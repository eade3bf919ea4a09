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

use crate::domain::models::lead::{IcebreakerStatus, Lead, LeadCampaignStatus};
use crate::domain::repositories::lead_repository::LeadRepository;
use crate::domain::repositories::search_job_repository::RepositoryError;
use crate::infrastructure::database::entities::lead as lead_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 线索仓库实现
#[derive(Clone)]
pub struct LeadRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl LeadRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<lead_entity::Model> for Lead {
    type Error = RepositoryError;

    fn try_from(model: lead_entity::Model) -> Result<Self, Self::Error> {
        let icebreaker_status = model.icebreaker_status.parse().map_err(|_| {
            RepositoryError::Serialization(format!(
                "Invalid icebreaker status: {}",
                model.icebreaker_status
            ))
        })?;
        let campaign_status = model.campaign_status.parse().map_err(|_| {
            RepositoryError::Serialization(format!(
                "Invalid campaign status: {}",
                model.campaign_status
            ))
        })?;

        Ok(Self {
            id: model.id,
            organization_id: model.organization_id,
            source_job_id: model.source_job_id,
            first_name: model.first_name,
            last_name: model.last_name,
            full_name: model.full_name,
            email: model.email,
            email_normalized: model.email_normalized,
            title: model.title,
            company: model.company,
            phone: model.phone,
            profile_url: model.profile_url,
            raw_payload: model.raw_payload,
            icebreaker: model.icebreaker,
            icebreaker_status,
            icebreaker_error: model.icebreaker_error,
            campaign_id: model.campaign_id,
            campaign_status,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl From<&Lead> for lead_entity::ActiveModel {
    fn from(lead: &Lead) -> Self {
        Self {
            id: Set(lead.id),
            organization_id: Set(lead.organization_id),
            source_job_id: Set(lead.source_job_id),
            first_name: Set(lead.first_name.clone()),
            last_name: Set(lead.last_name.clone()),
            full_name: Set(lead.full_name.clone()),
            email: Set(lead.email.clone()),
            email_normalized: Set(lead.email_normalized.clone()),
            title: Set(lead.title.clone()),
            company: Set(lead.company.clone()),
            phone: Set(lead.phone.clone()),
            profile_url: Set(lead.profile_url.clone()),
            raw_payload: Set(lead.raw_payload.clone()),
            icebreaker: Set(lead.icebreaker.clone()),
            icebreaker_status: Set(lead.icebreaker_status.to_string()),
            icebreaker_error: Set(lead.icebreaker_error.clone()),
            campaign_id: Set(lead.campaign_id),
            campaign_status: Set(lead.campaign_status.to_string()),
            created_at: Set(lead.created_at.into()),
            updated_at: Set(lead.updated_at.into()),
        }
    }
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().into()
}

fn collect(models: Vec<lead_entity::Model>) -> Result<Vec<Lead>, RepositoryError> {
    models.into_iter().map(Lead::try_from).collect()
}

#[async_trait]
impl LeadRepository for LeadRepositoryImpl {
    async fn insert_if_absent(&self, lead: &Lead) -> Result<bool, RepositoryError> {
        let model: lead_entity::ActiveModel = lead.into();

        let rows = lead_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    lead_entity::Column::OrganizationId,
                    lead_entity::Column::EmailNormalized,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await?;

        Ok(rows > 0)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, RepositoryError> {
        lead_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(Lead::try_from)
            .transpose()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Lead>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = lead_entity::Entity::find()
            .filter(lead_entity::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await?;
        collect(models)
    }

    async fn find_by_job(&self, job_id: Uuid) -> Result<Vec<Lead>, RepositoryError> {
        let models = lead_entity::Entity::find()
            .filter(lead_entity::Column::SourceJobId.eq(job_id))
            .order_by_asc(lead_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        collect(models)
    }

    async fn find_by_campaign(&self, campaign_id: Uuid) -> Result<Vec<Lead>, RepositoryError> {
        let models = lead_entity::Entity::find()
            .filter(lead_entity::Column::CampaignId.eq(campaign_id))
            .all(self.db.as_ref())
            .await?;
        collect(models)
    }

    async fn find_by_email(
        &self,
        organization_id: Uuid,
        email_normalized: &str,
    ) -> Result<Option<Lead>, RepositoryError> {
        lead_entity::Entity::find()
            .filter(lead_entity::Column::OrganizationId.eq(organization_id))
            .filter(lead_entity::Column::EmailNormalized.eq(email_normalized))
            .one(self.db.as_ref())
            .await?
            .map(Lead::try_from)
            .transpose()
    }

    async fn count_by_job(&self, job_id: Uuid) -> Result<u64, RepositoryError> {
        let count = lead_entity::Entity::find()
            .filter(lead_entity::Column::SourceJobId.eq(job_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn update_icebreaker(
        &self,
        id: Uuid,
        status: IcebreakerStatus,
        icebreaker: Option<String>,
        error: Option<String>,
    ) -> Result<(), RepositoryError> {
        let result = lead_entity::Entity::update_many()
            .col_expr(
                lead_entity::Column::IcebreakerStatus,
                Expr::value(status.to_string()),
            )
            .col_expr(lead_entity::Column::Icebreaker, Expr::value(icebreaker))
            .col_expr(lead_entity::Column::IcebreakerError, Expr::value(error))
            .col_expr(lead_entity::Column::UpdatedAt, Expr::value(now()))
            .filter(lead_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn mark_queued(&self, ids: &[Uuid], campaign_id: Uuid) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }

        // Only leads still outside any campaign are claimed
        let result = lead_entity::Entity::update_many()
            .col_expr(lead_entity::Column::CampaignId, Expr::value(Some(campaign_id)))
            .col_expr(
                lead_entity::Column::CampaignStatus,
                Expr::value(LeadCampaignStatus::Queued.to_string()),
            )
            .col_expr(lead_entity::Column::UpdatedAt, Expr::value(now()))
            .filter(lead_entity::Column::Id.is_in(ids.to_vec()))
            .filter(
                lead_entity::Column::CampaignStatus.eq(LeadCampaignStatus::NotAdded.to_string()),
            )
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }

    async fn update_campaign_status(
        &self,
        id: Uuid,
        status: LeadCampaignStatus,
    ) -> Result<(), RepositoryError> {
        let result = lead_entity::Entity::update_many()
            .col_expr(
                lead_entity::Column::CampaignStatus,
                Expr::value(status.to_string()),
            )
            .col_expr(lead_entity::Column::UpdatedAt, Expr::value(now()))
            .filter(lead_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
