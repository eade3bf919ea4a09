// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::search_job_repository::RepositoryError;
use crate::domain::models::organization::Organization;
use async_trait::async_trait;
use uuid::Uuid;

/// 组织仓库特质
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create(&self, organization: &Organization) -> Result<Organization, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, RepositoryError>;
}
