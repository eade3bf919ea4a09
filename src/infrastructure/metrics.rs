// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

pub const SEARCH_JOBS_SUBMITTED: &str = "search_jobs_submitted_total";
pub const SEARCH_JOBS_FAILED: &str = "search_jobs_failed_total";
pub const LEADS_IMPORTED: &str = "leads_imported_total";
pub const REMOTE_CAMPAIGNS_CREATED: &str = "remote_campaigns_created_total";
pub const REMOTE_CAMPAIGNS_LEAKED: &str = "remote_campaigns_leaked_total";
pub const LEADS_PUSHED: &str = "leads_pushed_total";
pub const ICEBREAKERS_GENERATED: &str = "icebreakers_generated_total";
pub const ICEBREAKERS_FAILED: &str = "icebreakers_failed_total";

/// 注册指标描述
pub fn describe_metrics() {
    describe_counter!(SEARCH_JOBS_SUBMITTED, "Lead searches submitted to the scrape provider");
    describe_counter!(SEARCH_JOBS_FAILED, "Lead searches that ended in failed");
    describe_counter!(LEADS_IMPORTED, Unit::Count, "New lead rows created by imports");
    describe_counter!(REMOTE_CAMPAIGNS_CREATED, "Remote campaigns materialized");
    describe_counter!(
        REMOTE_CAMPAIGNS_LEAKED,
        "Remote campaigns created by a caller that lost the remote-id race"
    );
    describe_counter!(LEADS_PUSHED, Unit::Count, "Leads pushed to remote campaigns");
    describe_counter!(ICEBREAKERS_GENERATED, "Icebreakers generated successfully");
    describe_counter!(ICEBREAKERS_FAILED, "Icebreaker generations that failed");
}

/// 启动 Prometheus 导出器
///
/// 地址无效或端口被占用时只记录警告
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}
