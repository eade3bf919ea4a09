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


use crate::domain::models::organization::{Organization, PersonalizationContext};
use crate::domain::repositories::organization_repository::OrganizationRepository;
use crate::domain::repositories::search_job_repository::RepositoryError;
use crate::infrastructure::database::entities::organization as organization_entity;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 组织仓库实现
#[derive(Clone)]
pub struct OrganizationRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl OrganizationRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<organization_entity::Model> for Organization {
    fn from(model: organization_entity::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            personalization: PersonalizationContext {
                sender_company: None,
                company_description: model.company_description,
                value_proposition: model.value_proposition,
                tone: model.tone,
                custom_instructions: model.custom_instructions,
            },
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

#[async_trait]
impl OrganizationRepository for OrganizationRepositoryImpl {
    async fn create(&self, organization: &Organization) -> Result<Organization, RepositoryError> {
        let context = &organization.personalization;
        let model = organization_entity::ActiveModel {
            id: Set(organization.id),
            name: Set(organization.name.clone()),
            company_description: Set(context.company_description.clone()),
            value_proposition: Set(context.value_proposition.clone()),
            tone: Set(context.tone.clone()),
            custom_instructions: Set(context.custom_instructions.clone()),
            created_at: Set(organization.created_at.into()),
            updated_at: Set(organization.updated_at.into()),
        };

        let saved = model.insert(self.db.as_ref()).await?;
        Ok(saved.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, RepositoryError> {
        let model = organization_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }
}
