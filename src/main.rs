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


use chrono::Duration;
use leadsync::application::use_cases::sync_sweep::SyncSweep;
use leadsync::config::settings::Settings;
use leadsync::domain::services::account_sync::AccountSync;
use leadsync::domain::services::campaign_sync::CampaignSyncOrchestrator;
use leadsync::domain::services::job_orchestrator::JobOrchestrator;
use leadsync::infrastructure::database::connection;
use leadsync::infrastructure::gateways::apify_scrape_gateway::ApifyScrapeGateway;
use leadsync::infrastructure::gateways::instantly_delivery_gateway::InstantlyDeliveryGateway;
use leadsync::infrastructure::metrics;
use leadsync::infrastructure::repositories::campaign_repo_impl::CampaignRepositoryImpl;
use leadsync::infrastructure::repositories::lead_repo_impl::LeadRepositoryImpl;
use leadsync::infrastructure::repositories::outreach_account_repo_impl::OutreachAccountRepositoryImpl;
use leadsync::infrastructure::repositories::search_job_repo_impl::SearchJobRepositoryImpl;
use leadsync::utils::telemetry;
use std::sync::Arc;
use tracing::info;

/// 主函数
///
/// 执行一次同步清扫后退出，调度由外部定时器负责
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(&settings.telemetry);
    metrics::init_metrics(&settings.metrics);
    info!("Starting leadsync sweep...");

    // 3. Connect to database and run migrations
    let db = Arc::new(connection::connect_and_migrate(&settings.database).await?);
    info!("Database connection established");

    // 4. Initialize repositories and gateways
    let job_repo = Arc::new(SearchJobRepositoryImpl::new(db.clone()));
    let lead_repo = Arc::new(LeadRepositoryImpl::new(db.clone()));
    let campaign_repo = Arc::new(CampaignRepositoryImpl::new(db.clone()));
    let account_repo = Arc::new(OutreachAccountRepositoryImpl::new(db.clone()));

    let scraper = Arc::new(ApifyScrapeGateway::new(&settings.scrape_provider)?);
    let delivery = Arc::new(InstantlyDeliveryGateway::new(&settings.delivery_provider)?);

    // 5. Wire orchestrators
    let jobs = Arc::new(JobOrchestrator::new(
        job_repo,
        lead_repo.clone(),
        scraper,
        settings.scrape_provider.max_fetch_count,
    ));
    let campaigns = Arc::new(CampaignSyncOrchestrator::new(
        campaign_repo,
        lead_repo,
        account_repo.clone(),
        delivery.clone(),
        settings.orchestration.push_batch_size,
    ));
    let accounts = Arc::new(AccountSync::new(account_repo, delivery));

    let stale_after = Duration::seconds(
        i64::try_from(settings.orchestration.stale_job_max_age_secs).unwrap_or(i64::MAX / 1000),
    );

    // 6. Run one sweep
    let report = SyncSweep::new(jobs, campaigns, accounts, stale_after)
        .run_once()
        .await;

    info!(
        stale = report.jobs_marked_stale,
        polled = report.jobs_polled,
        completed = report.jobs_completed,
        failed_steps = ?report.failed_steps,
        "Sweep complete"
    );

    if report.failed_steps.is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "sweep finished with failed steps: {}",
            report.failed_steps.join(", ")
        ))
    }
}
