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


use crate::domain::models::search_job::JobStatus;
use crate::domain::services::account_sync::{AccountSync, AccountSyncReport};
use crate::domain::services::campaign_sync::{
    CampaignSyncOrchestrator, LiveStatsReport, RelinkReport,
};
use crate::domain::services::job_orchestrator::JobOrchestrator;
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// 一次清扫的结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// 因过期被标记为失败的任务数
    pub jobs_marked_stale: usize,
    /// 已轮询的运行中任务数
    pub jobs_polled: usize,
    /// 本次轮询后完成的任务数
    pub jobs_completed: usize,
    /// 轮询时出错的任务数
    pub job_poll_errors: usize,
    pub accounts: Option<AccountSyncReport>,
    pub live_stats: Option<LiveStatsReport>,
    pub relink: Option<RelinkReport>,
    /// 整体失败的步骤
    pub failed_steps: Vec<&'static str>,
}

/// 同步清扫用例
///
/// 由外部定时器触发，每次调用依次执行：
/// 1. 将过期的运行中任务标记为失败
/// 2. 轮询其余运行中任务
/// 3. 同步发信账户
/// 4. 同步投递统计
/// 5. 重新关联孤立活动
///
/// 任一步骤失败只记录日志，不影响后续步骤。
pub struct SyncSweep {
    jobs: Arc<JobOrchestrator>,
    campaigns: Arc<CampaignSyncOrchestrator>,
    accounts: Arc<AccountSync>,
    stale_after: Duration,
}

impl SyncSweep {
    pub fn new(
        jobs: Arc<JobOrchestrator>,
        campaigns: Arc<CampaignSyncOrchestrator>,
        accounts: Arc<AccountSync>,
        stale_after: Duration,
    ) -> Self {
        Self {
            jobs,
            campaigns,
            accounts,
            stale_after,
        }
    }

    /// 执行一次清扫
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        match self.jobs.list_running().await {
            Ok(running) => {
                let now = Utc::now();
                for job in running {
                    if job.is_stale(self.stale_after, now) {
                        match self.jobs.mark_stale(job.id, self.stale_after).await {
                            Ok(_) => report.jobs_marked_stale += 1,
                            Err(e) => {
                                warn!(job_id = %job.id, error = %e, "Failed to mark job stale");
                                report.job_poll_errors += 1;
                            }
                        }
                        continue;
                    }

                    report.jobs_polled += 1;
                    match self.jobs.poll(job.id).await {
                        Ok(polled) if polled.status == JobStatus::Completed => {
                            report.jobs_completed += 1
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(job_id = %job.id, error = %e, "Job poll failed");
                            report.job_poll_errors += 1;
                        }
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Listing running jobs failed");
                report.failed_steps.push("poll_jobs");
            }
        }

        match self.accounts.sync_accounts().await {
            Ok(accounts) => report.accounts = Some(accounts),
            Err(e) => {
                error!(error = %e, "Account sync failed");
                report.failed_steps.push("sync_accounts");
            }
        }

        match self.campaigns.sync_live_stats().await {
            Ok(stats) => report.live_stats = Some(stats),
            Err(e) => {
                error!(error = %e, "Live stats sync failed");
                report.failed_steps.push("sync_live_stats");
            }
        }

        match self.campaigns.relink_orphans(None).await {
            Ok(relink) => report.relink = Some(relink),
            Err(e) => {
                error!(error = %e, "Relink failed");
                report.failed_steps.push("relink_orphans");
            }
        }

        info!(?report, "Sync sweep finished");
        report
    }
}
