// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 外部服务网关模块
///
/// 定义编排层所依赖的外部服务契约：
/// - 抓取服务网关（scrape_provider）：提交线索搜索并分页读取结果
/// - 投递服务网关（delivery_provider）：远程活动、发信账户与线索推送
/// - 开场白生成器（icebreaker_generator）：不透明的AI调用
///
/// 网关以依赖注入的方式传入编排器，编排代码不持有任何全局客户端。
pub mod delivery_provider;
pub mod icebreaker_generator;
pub mod scrape_provider;

use thiserror::Error;

/// 网关错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// 网络错误、超时、5xx 或限流，可安全重试
    #[error("Remote service unavailable: {0}")]
    Unavailable(String),

    /// 远程服务拒绝了请求（4xx）
    #[error("Remote service rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// 远程资源不存在
    #[error("Remote resource not found: {0}")]
    NotFound(String),

    /// 响应无法解析
    #[error("Invalid response from remote service: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// 是否属于可重试的暂时性错误
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Unavailable(_))
    }
}
