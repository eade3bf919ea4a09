// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// 线索搜索任务实体
///
/// 表示一次提交给外部抓取服务的线索搜索请求及其生命周期。
/// 远程运行ID在提交成功之前为空。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchJob {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 所属组织ID
    pub organization_id: Uuid,
    /// 抓取服务分配的远程运行ID
    pub remote_run_id: Option<String>,
    /// 搜索条件
    pub filters: SearchFilters,
    /// 任务状态
    pub status: JobStatus,
    /// 抓取服务报告的结果数量
    pub leads_found: Option<i32>,
    /// 实际写入线索库的数量
    pub leads_imported: Option<i32>,
    /// 失败原因，仅在失败时存在
    pub error_reason: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
    /// 完成时间
    pub completed_at: Option<DateTime<Utc>>,
}

/// 搜索任务状态
///
/// 状态转换遵循以下流程：
/// Pending → Running → Completed/Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 已创建，尚未提交到抓取服务
    #[default]
    Pending,
    /// 远程运行中
    Running,
    /// 导入完成
    Completed,
    /// 已失败
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition from {from} via {action}")]
    InvalidStateTransition {
        from: &'static str,
        action: &'static str,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// 过期任务的失败原因
pub const STALE_REASON: &str = "stale";

/// 线索搜索条件
///
/// 编排逻辑只基于这个强类型结构做判断，
/// 只有在网关边界才转换为无模式的键值映射。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SearchFilters {
    #[serde(default)]
    pub contact_job_title: Vec<String>,
    #[serde(default)]
    pub contact_seniority: Vec<String>,
    #[serde(default)]
    pub contact_location: Vec<String>,
    #[serde(default)]
    pub company_industry: Vec<String>,
    #[serde(default)]
    pub company_keywords: Vec<String>,
    #[serde(default)]
    pub company_domain: Vec<String>,
    #[serde(default)]
    pub company_size: Vec<String>,
    /// 邮箱验证状态过滤（例如 "validated"）
    #[serde(default)]
    pub email_status: Option<String>,
    /// 期望获取的线索数量
    #[validate(range(min = 1))]
    pub fetch_count: u32,
}

impl SearchFilters {
    fn criteria(&self) -> [(&'static str, &Vec<String>); 7] {
        [
            ("contact_job_title", &self.contact_job_title),
            ("seniority_level", &self.contact_seniority),
            ("contact_location", &self.contact_location),
            ("company_industry", &self.company_industry),
            ("company_keywords", &self.company_keywords),
            ("company_domain", &self.company_domain),
            ("size", &self.company_size),
        ]
    }

    /// 是否至少包含一个有区分度的条件
    pub fn has_discriminating_criterion(&self) -> bool {
        self.criteria()
            .iter()
            .any(|(_, values)| values.iter().any(|v| !v.trim().is_empty()))
    }

    /// 校验搜索条件
    ///
    /// # 参数
    ///
    /// * `max_fetch_count` - 抓取服务允许的单次最大数量
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 条件合法
    /// * `Err(DomainError)` - 条件为空或数量越界
    pub fn check(&self, max_fetch_count: u32) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        if !self.has_discriminating_criterion() {
            return Err(DomainError::ValidationError(
                "at least one search criterion is required".to_string(),
            ));
        }

        if self.fetch_count > max_fetch_count {
            return Err(DomainError::ValidationError(format!(
                "fetch_count {} exceeds provider maximum {}",
                self.fetch_count, max_fetch_count
            )));
        }

        Ok(())
    }

    /// 转换为抓取服务的输入映射，空条件不会出现在结果中
    pub fn to_provider_input(&self) -> Map<String, Value> {
        let mut input = Map::new();
        for (key, values) in self.criteria() {
            let cleaned: Vec<Value> = values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(|v| Value::String(v.to_string()))
                .collect();
            if !cleaned.is_empty() {
                input.insert(key.to_string(), Value::Array(cleaned));
            }
        }
        if let Some(status) = self.email_status.as_deref().filter(|s| !s.is_empty()) {
            input.insert("email_status".to_string(), Value::String(status.to_string()));
        }
        input.insert("fetch_count".to_string(), Value::from(self.fetch_count));
        input
    }
}

impl SearchJob {
    /// 创建一个待提交的搜索任务
    pub fn new(organization_id: Uuid, filters: SearchFilters) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            remote_run_id: None,
            filters,
            status: JobStatus::Pending,
            leads_found: None,
            leads_imported: None,
            error_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    fn transition_error(&self, action: &'static str) -> DomainError {
        let from = match self.status {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        DomainError::InvalidStateTransition { from, action }
    }

    /// 记录远程运行ID并进入运行状态
    ///
    /// 将任务状态从Pending变更为Running
    pub fn start(mut self, remote_run_id: String) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Pending => {
                self.remote_run_id = Some(remote_run_id);
                self.status = JobStatus::Running;
                self.updated_at = Utc::now();
                Ok(self)
            }
            _ => Err(self.transition_error("start")),
        }
    }

    /// 标记任务失败
    ///
    /// 仅允许从Pending或Running进入Failed
    pub fn fail(mut self, reason: impl Into<String>) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Pending | JobStatus::Running => {
                let now = Utc::now();
                self.status = JobStatus::Failed;
                self.error_reason = Some(reason.into());
                self.updated_at = now;
                self.completed_at = Some(now);
                Ok(self)
            }
            _ => Err(self.transition_error("fail")),
        }
    }

    /// 导入完成
    ///
    /// 同时写入发现数与导入数，保证Completed状态下计数永远不为空。
    /// 重新同步时允许从Completed或Failed再次进入Completed。
    ///
    /// # 参数
    ///
    /// * `leads_found` - 抓取服务返回的结果数
    /// * `leads_imported` - 归属于该任务的线索数
    pub fn complete(mut self, leads_found: i32, leads_imported: i32) -> Result<Self, DomainError> {
        if self.status == JobStatus::Pending {
            return Err(self.transition_error("complete"));
        }
        if leads_imported > leads_found {
            return Err(DomainError::ValidationError(format!(
                "leads_imported {} exceeds leads_found {}",
                leads_imported, leads_found
            )));
        }

        let now = Utc::now();
        self.status = JobStatus::Completed;
        self.leads_found = Some(leads_found);
        self.leads_imported = Some(leads_imported);
        self.error_reason = None;
        self.updated_at = now;
        self.completed_at = Some(now);
        Ok(self)
    }

    /// 记录部分导入进度，不改变状态
    pub fn record_progress(&mut self, leads_imported: i32) {
        self.leads_imported = Some(leads_imported);
        self.updated_at = Utc::now();
    }

    /// 任务自创建以来的时长
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// 运行中且超过最大时长即视为过期
    pub fn is_stale(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Running && self.age(now) > max_age
    }

    /// 是否处于终态
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }
}
