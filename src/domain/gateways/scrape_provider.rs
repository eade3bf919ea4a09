// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::GatewayError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 抓取服务返回的单条原始记录
pub type RawLead = Map<String, Value>;

/// 已提交的远程运行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRun {
    pub run_id: String,
}

/// 远程运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// 已排队或运行中
    Running,
    Succeeded,
    Failed,
    Aborted,
    TimedOut,
}

impl RunState {
    /// 是否为失败类终态
    pub fn is_failure(&self) -> bool {
        matches!(self, RunState::Failed | RunState::Aborted | RunState::TimedOut)
    }
}

/// 远程运行状态查询结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    /// 已产生的结果数
    pub result_count: Option<u64>,
    /// 失败原因
    pub failure_reason: Option<String>,
}

/// 抓取服务网关
///
/// `get_results` 必须可以对同一次运行重复、幂等地调用。
#[async_trait]
pub trait ScrapeProviderGateway: Send + Sync {
    /// 提交一次搜索
    async fn start_search(&self, input: &Map<String, Value>) -> Result<RemoteRun, GatewayError>;

    /// 查询远程运行状态
    async fn get_run_status(&self, run_id: &str) -> Result<RunStatus, GatewayError>;

    /// 读取一页结果，页码从 0 开始，空页表示结束
    async fn get_results(&self, run_id: &str, page: u32) -> Result<Vec<RawLead>, GatewayError>;

    /// 每页的最大记录数
    fn page_size(&self) -> u32;
}
