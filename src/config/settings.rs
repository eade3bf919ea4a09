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


use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、外部服务、编排参数、指标与日志等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 抓取服务配置
    pub scrape_provider: ScrapeProviderSettings,
    /// 投递服务配置
    pub delivery_provider: DeliveryProviderSettings,
    /// 开场白生成模型配置
    pub llm: LlmSettings,
    /// 编排参数
    pub orchestration: OrchestrationSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
    /// 日志配置
    pub telemetry: TelemetrySettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 抓取服务配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeProviderSettings {
    /// API 根地址
    pub base_url: String,
    /// 访问令牌
    pub api_token: Option<String>,
    /// 执行线索搜索的 actor
    pub actor_id: String,
    /// 每页读取的结果数
    pub page_size: u32,
    /// 单次搜索允许的最大结果数
    pub max_fetch_count: u32,
    /// 请求超时（秒）
    pub timeout_secs: u64,
}

/// 投递服务配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryProviderSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// LLM 配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub timeout_secs: u64,
    /// 生成的最大 token 数
    pub max_tokens: u32,
}

/// 编排参数设置
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestrationSettings {
    /// 运行超过该时长（秒）的搜索任务视为过期
    pub stale_job_max_age_secs: u64,
    /// 每批推送的线索数
    pub push_batch_size: usize,
    /// 批量生成开场白时的并发数
    pub icebreaker_concurrency: usize,
}

/// 指标导出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    /// Prometheus 监听地址
    pub listen_addr: String,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// 以 JSON 格式输出日志
    pub json: bool,
    /// 未设置 RUST_LOG 时使用的过滤规则
    pub default_filter: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{APP_ENVIRONMENT}` 与 `LEADSYNC__*` 环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default DB settings
            .set_default("database.url", "sqlite://leadsync.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Scrape provider
            .set_default("scrape_provider.base_url", "https://api.apify.com")?
            .set_default("scrape_provider.actor_id", "code_crafter~leads-finder")?
            .set_default("scrape_provider.page_size", 1000)?
            .set_default("scrape_provider.max_fetch_count", 50000)?
            .set_default("scrape_provider.timeout_secs", 60)?
            // Delivery provider
            .set_default("delivery_provider.base_url", "https://api.instantly.ai")?
            .set_default("delivery_provider.timeout_secs", 30)?
            // LLM
            .set_default("llm.model", "gpt-4o-mini")?
            .set_default("llm.api_base_url", "https://api.openai.com/v1")?
            .set_default("llm.timeout_secs", 30)?
            .set_default("llm.max_tokens", 200)?
            // Orchestration
            .set_default("orchestration.stale_job_max_age_secs", 6 * 60 * 60)?
            .set_default("orchestration.push_batch_size", 100)?
            .set_default("orchestration.icebreaker_concurrency", 1)?
            // Observability
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .set_default("telemetry.json", false)?
            .set_default("telemetry.default_filter", "info,leadsync=debug")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("LEADSYNC")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
