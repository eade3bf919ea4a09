// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 外部服务网关实现模块
///
/// 基于 reqwest 的薄适配层，把各服务的 HTTP 协议映射到领域网关特质：
/// - 抓取服务（apify_scrape_gateway）
/// - 投递服务（instantly_delivery_gateway）
/// - 开场白生成（openai_icebreaker_generator）
pub mod apify_scrape_gateway;
pub mod instantly_delivery_gateway;
pub mod openai_icebreaker_generator;

use crate::domain::gateways::GatewayError;
use reqwest::{Response, StatusCode};
use std::time::Duration;
use url::Url;

/// 创建带超时的 HTTP 客户端
pub(crate) fn build_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .build()
        .unwrap_or_default()
}

/// 解析服务根地址
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, GatewayError> {
    // A trailing slash keeps the last path segment when joining
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };
    Url::parse(&normalized)
        .map_err(|e| GatewayError::InvalidResponse(format!("invalid base url {}: {}", base_url, e)))
}

/// 拼接相对路径
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, GatewayError> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| GatewayError::InvalidResponse(format!("invalid endpoint {}: {}", path, e)))
}

/// 传输层错误一律视为暂时不可用
pub(crate) fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::InvalidResponse(err.to_string())
    } else {
        GatewayError::Unavailable(err.to_string())
    }
}

/// 按状态码分类响应
///
/// * 2xx - 原样返回
/// * 404 - NotFound
/// * 408 / 429 / 5xx - Unavailable
/// * 其他 4xx - Rejected
pub(crate) async fn check_status(response: Response, resource: &str) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify(status, resource, body))
}

fn classify(status: StatusCode, resource: &str, body: String) -> GatewayError {
    if status == StatusCode::NOT_FOUND {
        return GatewayError::NotFound(resource.to_string());
    }
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        return GatewayError::Unavailable(format!("{} returned {}: {}", resource, status, body));
    }
    GatewayError::Rejected {
        status: status.as_u16(),
        message: body,
    }
}
