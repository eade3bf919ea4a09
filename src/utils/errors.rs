// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::gateways::GatewayError;
use crate::domain::models::search_job::DomainError;
use crate::domain::repositories::search_job_repository::RepositoryError;
use thiserror::Error;

/// 编排层错误类型
///
/// 单个条目的失败通过报告结构体表达，不会变成错误
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("校验失败: {0}")]
    Validation(String),

    #[error("远程服务不可用: {0}")]
    RemoteUnavailable(String),

    #[error("远程服务拒绝请求 ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    #[error("未找到: {0}")]
    NotFound(String),

    #[error("状态错误: {0}")]
    InvalidState(String),

    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),
}

impl OrchestrationError {
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        OrchestrationError::NotFound(format!("{} {}", kind, id))
    }
}

impl From<DomainError> for OrchestrationError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationError(msg) => OrchestrationError::Validation(msg),
            other @ DomainError::InvalidStateTransition { .. } => {
                OrchestrationError::InvalidState(other.to_string())
            }
        }
    }
}

impl From<GatewayError> for OrchestrationError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unavailable(msg) => OrchestrationError::RemoteUnavailable(msg),
            GatewayError::InvalidResponse(msg) => {
                OrchestrationError::RemoteUnavailable(format!("invalid response: {}", msg))
            }
            GatewayError::Rejected { status, message } => {
                OrchestrationError::RemoteRejected { status, message }
            }
            GatewayError::NotFound(msg) => {
                OrchestrationError::NotFound(format!("remote resource {}", msg))
            }
        }
    }
}
