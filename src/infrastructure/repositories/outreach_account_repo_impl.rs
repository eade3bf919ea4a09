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


use crate::domain::models::outreach_account::{AccountSnapshot, OutreachAccount};
use crate::domain::repositories::outreach_account_repository::{
    OutreachAccountRepository, UpsertOutcome,
};
use crate::domain::repositories::search_job_repository::RepositoryError;
use crate::infrastructure::database::entities::outreach_account as account_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 发信账户仓库实现
#[derive(Clone)]
pub struct OutreachAccountRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl OutreachAccountRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<account_entity::Model> for OutreachAccount {
    fn from(model: account_entity::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            active: model.active,
            warmup_enabled: model.warmup_enabled,
            reputation_score: model.reputation_score,
            daily_limit: model.daily_limit,
            organization_id: model.organization_id,
            last_synced_at: model.last_synced_at.into(),
            created_at: model.created_at.into(),
        }
    }
}

#[async_trait]
impl OutreachAccountRepository for OutreachAccountRepositoryImpl {
    async fn upsert_snapshot(
        &self,
        snapshot: &AccountSnapshot,
        synced_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, RepositoryError> {
        let email = snapshot.email.trim().to_lowercase();
        let synced_at: DateTime<FixedOffset> = synced_at.into();

        let existing = account_entity::Entity::find()
            .filter(account_entity::Column::Email.eq(email.as_str()))
            .one(self.db.as_ref())
            .await?;

        match existing {
            Some(model) => {
                // organization_id is local-only and never overwritten here
                account_entity::Entity::update_many()
                    .col_expr(account_entity::Column::Active, Expr::value(snapshot.active))
                    .col_expr(
                        account_entity::Column::WarmupEnabled,
                        Expr::value(snapshot.warmup_enabled),
                    )
                    .col_expr(
                        account_entity::Column::ReputationScore,
                        Expr::value(snapshot.reputation_score),
                    )
                    .col_expr(
                        account_entity::Column::DailyLimit,
                        Expr::value(snapshot.daily_limit),
                    )
                    .col_expr(account_entity::Column::LastSyncedAt, Expr::value(synced_at))
                    .filter(account_entity::Column::Id.eq(model.id))
                    .exec(self.db.as_ref())
                    .await?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                let account = OutreachAccount::from_snapshot(snapshot);
                let model = account_entity::ActiveModel {
                    id: Set(account.id),
                    email: Set(account.email),
                    active: Set(account.active),
                    warmup_enabled: Set(account.warmup_enabled),
                    reputation_score: Set(account.reputation_score),
                    daily_limit: Set(account.daily_limit),
                    organization_id: Set(None),
                    last_synced_at: Set(synced_at),
                    created_at: Set(account.created_at.into()),
                };
                model.insert(self.db.as_ref()).await?;
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OutreachAccount>, RepositoryError> {
        let model = account_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<OutreachAccount>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = account_entity::Entity::find()
            .filter(account_entity::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list(
        &self,
        organization_id: Option<Uuid>,
    ) -> Result<Vec<OutreachAccount>, RepositoryError> {
        let mut query = account_entity::Entity::find();
        if let Some(organization_id) = organization_id {
            query = query.filter(account_entity::Column::OrganizationId.eq(organization_id));
        }
        let models = query
            .order_by_asc(account_entity::Column::Email)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn assign_organization(
        &self,
        id: Uuid,
        organization_id: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        let result = account_entity::Entity::update_many()
            .col_expr(
                account_entity::Column::OrganizationId,
                Expr::value(organization_id),
            )
            .filter(account_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
