// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::search_job::{JobStatus, SearchJob};
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 存储的数据无法还原为领域对象
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        RepositoryError::Serialization(e.to_string())
    }
}

/// 搜索任务仓库特质
///
/// 只有任务编排器与手动重新同步会修改任务记录。
#[async_trait]
pub trait SearchJobRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, job: &SearchJob) -> Result<SearchJob, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<SearchJob>, RepositoryError>;
    /// 更新任务的状态与进度
    async fn update(&self, job: &SearchJob) -> Result<SearchJob, RepositoryError>;
    /// 按状态查找任务，按创建时间升序
    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<SearchJob>, RepositoryError>;
    /// 查找组织下的所有任务，最新的在前
    async fn find_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<SearchJob>, RepositoryError>;
}
