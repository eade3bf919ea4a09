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

use crate::domain::models::search_job::{JobStatus, SearchJob};
use crate::domain::repositories::search_job_repository::{RepositoryError, SearchJobRepository};
use crate::infrastructure::database::entities::search_job as job_entity;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 搜索任务仓库实现
///
/// 基于SeaORM实现的搜索任务数据访问层
#[derive(Clone)]
pub struct SearchJobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl SearchJobRepositoryImpl {
    /// 创建新的搜索任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<job_entity::Model> for SearchJob {
    type Error = RepositoryError;

    fn try_from(model: job_entity::Model) -> Result<Self, Self::Error> {
        let status = model.status.parse().map_err(|_| {
            RepositoryError::Serialization(format!("Invalid job status: {}", model.status))
        })?;

        Ok(Self {
            id: model.id,
            organization_id: model.organization_id,
            remote_run_id: model.remote_run_id,
            filters: serde_json::from_value(model.filters)?,
            status,
            leads_found: model.leads_found,
            leads_imported: model.leads_imported,
            error_reason: model.error_reason,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
            completed_at: model.completed_at.map(Into::into),
        })
    }
}

fn to_active_model(job: &SearchJob) -> Result<job_entity::ActiveModel, RepositoryError> {
    Ok(job_entity::ActiveModel {
        id: Set(job.id),
        organization_id: Set(job.organization_id),
        remote_run_id: Set(job.remote_run_id.clone()),
        filters: Set(serde_json::to_value(&job.filters)?),
        status: Set(job.status.to_string()),
        leads_found: Set(job.leads_found),
        leads_imported: Set(job.leads_imported),
        error_reason: Set(job.error_reason.clone()),
        created_at: Set(job.created_at.into()),
        updated_at: Set(job.updated_at.into()),
        completed_at: Set(job.completed_at.map(Into::into)),
    })
}

#[async_trait]
impl SearchJobRepository for SearchJobRepositoryImpl {
    async fn create(&self, job: &SearchJob) -> Result<SearchJob, RepositoryError> {
        let model = to_active_model(job)?;
        model.insert(self.db.as_ref()).await?;
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SearchJob>, RepositoryError> {
        job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(SearchJob::try_from)
            .transpose()
    }

    async fn update(&self, job: &SearchJob) -> Result<SearchJob, RepositoryError> {
        let mut model = to_active_model(job)?;
        // created_at is immutable
        model.created_at = sea_orm::ActiveValue::NotSet;

        match model.update(self.db.as_ref()).await {
            Ok(updated) => updated.try_into(),
            Err(DbErr::RecordNotUpdated) => Err(RepositoryError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<SearchJob>, RepositoryError> {
        job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(status.to_string()))
            .order_by_asc(job_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(SearchJob::try_from)
            .collect()
    }

    async fn find_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<SearchJob>, RepositoryError> {
        job_entity::Entity::find()
            .filter(job_entity::Column::OrganizationId.eq(organization_id))
            .order_by_desc(job_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(SearchJob::try_from)
            .collect()
    }
}
