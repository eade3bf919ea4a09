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


use crate::domain::gateways::scrape_provider::{RunState, ScrapeProviderGateway};
use crate::domain::models::lead::Lead;
use crate::domain::models::search_job::{JobStatus, SearchFilters, SearchJob, STALE_REASON};
use crate::domain::repositories::lead_repository::LeadRepository;
use crate::domain::repositories::search_job_repository::SearchJobRepository;
use crate::infrastructure::metrics::{LEADS_IMPORTED, SEARCH_JOBS_FAILED, SEARCH_JOBS_SUBMITTED};
use crate::utils::errors::OrchestrationError;
use chrono::{Duration, Utc};
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 一次导入的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// 本次新写入的线索数
    pub imported: u64,
    /// 未写入的记录数：没有合法邮箱，或该组织已有同一邮箱的线索
    pub skipped: u64,
    /// 其中因去重而保持原样的记录数
    pub duplicates: u64,
    /// 写入任务的发现数
    pub leads_found: i32,
    /// 写入任务的导入数（归属于该任务的线索总数）
    pub leads_imported: i32,
}

fn to_count(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// 搜索任务编排器
///
/// 负责 `SearchJob` 的状态机：提交、轮询、导入与重新同步。
/// 不持有后台调度器，轮询由外部调用者驱动。
pub struct JobOrchestrator {
    jobs: Arc<dyn SearchJobRepository>,
    leads: Arc<dyn LeadRepository>,
    scraper: Arc<dyn ScrapeProviderGateway>,
    /// 抓取服务允许的单次最大结果数
    max_fetch_count: u32,
}

impl JobOrchestrator {
    /// 创建新的编排器
    ///
    /// # 参数
    ///
    /// * `jobs` - 搜索任务仓库
    /// * `leads` - 线索仓库
    /// * `scraper` - 抓取服务网关
    /// * `max_fetch_count` - 单次搜索的最大结果数
    pub fn new(
        jobs: Arc<dyn SearchJobRepository>,
        leads: Arc<dyn LeadRepository>,
        scraper: Arc<dyn ScrapeProviderGateway>,
        max_fetch_count: u32,
    ) -> Self {
        Self {
            jobs,
            leads,
            scraper,
            max_fetch_count,
        }
    }

    async fn load(&self, job_id: Uuid) -> Result<SearchJob, OrchestrationError> {
        self.jobs
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("search job", job_id))
    }

    /// 提交一次线索搜索
    ///
    /// 条件非法时在任何远程调用之前拒绝，且不会写入任务。
    /// 提交失败时任务进入 Failed 并返回类型化错误，不会自动重试。
    #[instrument(skip(self, filters), fields(organization_id = %organization_id))]
    pub async fn submit(
        &self,
        organization_id: Uuid,
        filters: SearchFilters,
    ) -> Result<SearchJob, OrchestrationError> {
        filters.check(self.max_fetch_count)?;

        let job = self
            .jobs
            .create(&SearchJob::new(organization_id, filters))
            .await?;
        counter!(SEARCH_JOBS_SUBMITTED).increment(1);

        match self
            .scraper
            .start_search(&job.filters.to_provider_input())
            .await
        {
            Ok(run) => {
                let job = job.start(run.run_id)?;
                let job = self.jobs.update(&job).await?;
                info!(job_id = %job.id, run_id = ?job.remote_run_id, "Search job submitted");
                Ok(job)
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Search submission failed");
                let failed = job.fail(e.to_string())?;
                self.jobs.update(&failed).await?;
                counter!(SEARCH_JOBS_FAILED).increment(1);
                Err(e.into())
            }
        }
    }

    /// 轮询远程运行
    ///
    /// 只有 Running 状态的任务会访问抓取服务，其余状态直接返回。
    /// 网关错误原样上抛，任务保持 Running。
    #[instrument(skip(self))]
    pub async fn poll(&self, job_id: Uuid) -> Result<SearchJob, OrchestrationError> {
        let job = self.load(job_id).await?;
        if job.status != JobStatus::Running {
            return Ok(job);
        }

        let run_id = job.remote_run_id.clone().ok_or_else(|| {
            OrchestrationError::InvalidState(format!("running job {} has no remote run", job_id))
        })?;
        let status = self.scraper.get_run_status(&run_id).await?;

        match status.state {
            RunState::Running => {
                debug!(%run_id, "Remote run still in progress");
                Ok(job)
            }
            RunState::Succeeded => {
                self.import_results(job, status.result_count).await?;
                self.load(job_id).await
            }
            state => {
                let reason = status
                    .failure_reason
                    .unwrap_or_else(|| format!("remote run ended as {:?}", state));
                warn!(%run_id, %reason, "Remote run failed");
                let job = self.jobs.update(&job.fail(reason)?).await?;
                counter!(SEARCH_JOBS_FAILED).increment(1);
                Ok(job)
            }
        }
    }

    /// 读取任务当前状态，无副作用
    pub async fn get_status(&self, job_id: Uuid) -> Result<SearchJob, OrchestrationError> {
        self.load(job_id).await
    }

    /// 任务已运行的时长
    pub fn job_age(&self, job: &SearchJob) -> Duration {
        job.age(Utc::now())
    }

    /// 将超过最大时长的运行中任务标记为失败
    ///
    /// 未过期的任务原样返回
    #[instrument(skip(self))]
    pub async fn mark_stale(
        &self,
        job_id: Uuid,
        max_age: Duration,
    ) -> Result<SearchJob, OrchestrationError> {
        let job = self.load(job_id).await?;
        if !job.is_stale(max_age, Utc::now()) {
            return Ok(job);
        }

        info!(age_secs = self.job_age(&job).num_seconds(), "Marking stale search job failed");
        let job = self.jobs.update(&job.fail(STALE_REASON)?).await?;
        counter!(SEARCH_JOBS_FAILED).increment(1);
        Ok(job)
    }

    /// 导入远程运行的结果
    ///
    /// 仅允许 Running 或 Completed 的任务，重复导入不会产生重复线索
    #[instrument(skip(self))]
    pub async fn import(&self, job_id: Uuid) -> Result<ImportSummary, OrchestrationError> {
        let job = self.load(job_id).await?;
        if job.remote_run_id.is_none() {
            return Err(OrchestrationError::NotFound(format!(
                "search job {} has no remote run",
                job_id
            )));
        }
        if !matches!(job.status, JobStatus::Running | JobStatus::Completed) {
            return Err(OrchestrationError::InvalidState(format!(
                "cannot import search job {} in status {}",
                job_id, job.status
            )));
        }
        self.import_results(job, None).await
    }

    /// 重新同步：不重新提交搜索，从任意状态再次导入
    #[instrument(skip(self))]
    pub async fn resync(&self, job_id: Uuid) -> Result<ImportSummary, OrchestrationError> {
        let job = self.load(job_id).await?;
        if job.remote_run_id.is_none() {
            return Err(OrchestrationError::NotFound(format!(
                "search job {} has no remote run",
                job_id
            )));
        }
        info!(status = %job.status, "Resyncing search job");
        self.import_results(job, None).await
    }

    /// 需要外部轮询的任务
    pub async fn list_running(&self) -> Result<Vec<SearchJob>, OrchestrationError> {
        Ok(self.jobs.find_by_status(JobStatus::Running).await?)
    }

    /// 某个组织的所有任务，按创建时间倒序
    pub async fn list_jobs(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<SearchJob>, OrchestrationError> {
        Ok(self.jobs.find_by_organization(organization_id).await?)
    }

    async fn import_results(
        &self,
        mut job: SearchJob,
        reported_count: Option<u64>,
    ) -> Result<ImportSummary, OrchestrationError> {
        let run_id = job.remote_run_id.clone().ok_or_else(|| {
            OrchestrationError::NotFound(format!("search job {} has no remote run", job.id))
        })?;
        let page_size = self.scraper.page_size().max(1) as usize;

        let mut fetched: u64 = 0;
        let mut imported: u64 = 0;
        let mut skipped: u64 = 0;
        let mut duplicates: u64 = 0;
        let mut page: u32 = 0;

        loop {
            let results = match self.scraper.get_results(&run_id, page).await {
                Ok(results) => results,
                Err(e) => {
                    let so_far = self.leads.count_by_job(job.id).await?;
                    warn!(page, imported_so_far = so_far, error = %e, "Result page fetch failed");
                    job.record_progress(to_count(so_far));
                    self.jobs.update(&job).await?;
                    counter!(LEADS_IMPORTED).increment(imported);
                    return Err(e.into());
                }
            };
            if results.is_empty() {
                break;
            }

            let page_len = results.len();
            for raw in &results {
                fetched += 1;
                match Lead::from_import(job.organization_id, Some(job.id), raw) {
                    Some(lead) => {
                        if self.leads.insert_if_absent(&lead).await? {
                            imported += 1;
                        } else {
                            duplicates += 1;
                            skipped += 1;
                        }
                    }
                    None => skipped += 1,
                }
            }

            if page_len < page_size {
                break;
            }
            page += 1;
        }

        let attributed = self.leads.count_by_job(job.id).await?;
        let found = reported_count.unwrap_or(fetched).max(attributed);
        let job = job.complete(to_count(found), to_count(attributed))?;
        let job = self.jobs.update(&job).await?;
        counter!(LEADS_IMPORTED).increment(imported);

        info!(
            job_id = %job.id,
            imported,
            skipped,
            duplicates,
            leads_found = found,
            leads_imported = attributed,
            "Search job import finished"
        );

        Ok(ImportSummary {
            imported,
            skipped,
            duplicates,
            leads_found: job.leads_found.unwrap_or_default(),
            leads_imported: job.leads_imported.unwrap_or_default(),
        })
    }
}
