// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#![allow(dead_code)]

use async_trait::async_trait;
use leadsync::domain::gateways::delivery_provider::{
    DeliveryProviderGateway, RemoteCampaignSnapshot, RemoteLead,
};
use leadsync::domain::gateways::icebreaker_generator::IcebreakerGenerator;
use leadsync::domain::gateways::scrape_provider::{
    RawLead, RemoteRun, RunState, RunStatus, ScrapeProviderGateway,
};
use leadsync::domain::gateways::GatewayError;
use leadsync::domain::models::campaign::{
    CampaignOptions, CampaignStats, RemoteRunState, SendSchedule, SequenceStep,
};
use leadsync::domain::models::lead::LeadProfile;
use leadsync::domain::models::organization::PersonalizationContext;
use leadsync::domain::models::outreach_account::AccountSnapshot;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

struct FakeRun {
    state: RunState,
    result_count: Option<u64>,
    failure_reason: Option<String>,
    results: Vec<RawLead>,
    failing_page: Option<u32>,
}

#[derive(Default)]
struct ScrapeState {
    runs: HashMap<String, FakeRun>,
    pending_results: Vec<RawLead>,
    start_error: Option<GatewayError>,
    status_error: Option<GatewayError>,
    inputs: Vec<Map<String, Value>>,
}

/// 抓取服务替身
///
/// `start_search` 会把预先排队的结果挂到新运行上，运行初始为 Running
pub struct FakeScrapeProvider {
    page_size: u32,
    state: Mutex<ScrapeState>,
    pub start_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
}

impl FakeScrapeProvider {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            state: Mutex::new(ScrapeState::default()),
            start_calls: AtomicUsize::new(0),
            page_calls: AtomicUsize::new(0),
        }
    }

    /// 下一次提交的运行将返回这些结果
    pub fn queue_results(&self, results: Vec<RawLead>) {
        self.state.lock().unwrap().pending_results = results;
    }

    pub fn fail_next_start(&self, error: GatewayError) {
        self.state.lock().unwrap().start_error = Some(error);
    }

    pub fn fail_status(&self, error: Option<GatewayError>) {
        self.state.lock().unwrap().status_error = error;
    }

    pub fn finish_run(&self, run_id: &str) {
        let mut state = self.state.lock().unwrap();
        let run = state.runs.get_mut(run_id).expect("unknown run");
        run.state = RunState::Succeeded;
        run.result_count = Some(run.results.len() as u64);
    }

    pub fn fail_run(&self, run_id: &str, state: RunState, reason: &str) {
        let mut guard = self.state.lock().unwrap();
        let run = guard.runs.get_mut(run_id).expect("unknown run");
        run.state = state;
        run.failure_reason = Some(reason.to_string());
    }

    /// 让某一页读取失败，`None` 恢复
    pub fn fail_page(&self, run_id: &str, page: Option<u32>) {
        let mut state = self.state.lock().unwrap();
        state.runs.get_mut(run_id).expect("unknown run").failing_page = page;
    }

    pub fn last_input(&self) -> Option<Map<String, Value>> {
        self.state.lock().unwrap().inputs.last().cloned()
    }

    pub fn starts(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScrapeProviderGateway for FakeScrapeProvider {
    async fn start_search(&self, input: &Map<String, Value>) -> Result<RemoteRun, GatewayError> {
        let n = self.start_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.lock().unwrap();
        state.inputs.push(input.clone());
        if let Some(error) = state.start_error.take() {
            return Err(error);
        }

        let run_id = format!("run-{}", n);
        let results = std::mem::take(&mut state.pending_results);
        state.runs.insert(
            run_id.clone(),
            FakeRun {
                state: RunState::Running,
                result_count: None,
                failure_reason: None,
                results,
                failing_page: None,
            },
        );
        Ok(RemoteRun { run_id })
    }

    async fn get_run_status(&self, run_id: &str) -> Result<RunStatus, GatewayError> {
        let state = self.state.lock().unwrap();
        if let Some(error) = state.status_error.clone() {
            return Err(error);
        }
        let run = state
            .runs
            .get(run_id)
            .ok_or_else(|| GatewayError::NotFound(run_id.to_string()))?;
        Ok(RunStatus {
            state: run.state,
            result_count: run.result_count,
            failure_reason: run.failure_reason.clone(),
        })
    }

    async fn get_results(&self, run_id: &str, page: u32) -> Result<Vec<RawLead>, GatewayError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        let run = state
            .runs
            .get(run_id)
            .ok_or_else(|| GatewayError::NotFound(run_id.to_string()))?;
        if run.failing_page == Some(page) {
            return Err(GatewayError::Unavailable("dataset read timed out".to_string()));
        }

        let size = self.page_size as usize;
        Ok(run
            .results
            .iter()
            .skip(page as usize * size)
            .take(size)
            .cloned()
            .collect())
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}

#[derive(Default)]
struct DeliveryState {
    campaigns: Vec<RemoteCampaignSnapshot>,
    options: HashMap<String, CampaignOptions>,
    schedules: HashMap<String, SendSchedule>,
    sequences: HashMap<String, Vec<SequenceStep>>,
    assigned: HashMap<String, Vec<String>>,
    statuses: HashMap<String, RemoteRunState>,
    pushed: Vec<(String, Vec<RemoteLead>)>,
    accounts: Vec<AccountSnapshot>,
    fail_push_on_batch: Option<usize>,
    fail_options: bool,
    unavailable_campaigns: HashSet<String>,
    next_id: usize,
}

/// 投递服务替身
pub struct FakeDeliveryProvider {
    state: Mutex<DeliveryState>,
    create_delay: Mutex<Option<Duration>>,
    status_delay: Mutex<Option<Duration>>,
    pub create_calls: AtomicUsize,
    pub config_calls: AtomicUsize,
    pub add_leads_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl FakeDeliveryProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DeliveryState::default()),
            create_delay: Mutex::new(None),
            status_delay: Mutex::new(None),
            create_calls: AtomicUsize::new(0),
            config_calls: AtomicUsize::new(0),
            add_leads_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
        }
    }

    /// 放慢创建，扩大并发窗口
    pub fn set_create_delay(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = Some(delay);
    }

    /// 放慢状态切换，让其他配置修改插入其间
    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = Some(delay);
    }

    /// 直接在远程创建一个活动（模拟外部创建或早先泄漏的活动）
    pub fn insert_remote(&self, name: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("remote-{}", state.next_id);
        state.campaigns.push(RemoteCampaignSnapshot {
            id: id.clone(),
            name: name.to_string(),
            status: Some("draft".to_string()),
            stats: CampaignStats::default(),
        });
        id
    }

    pub fn set_stats(&self, remote_id: &str, stats: CampaignStats, status: &str) {
        let mut state = self.state.lock().unwrap();
        let campaign = state
            .campaigns
            .iter_mut()
            .find(|c| c.id == remote_id)
            .expect("unknown remote campaign");
        campaign.stats = stats;
        campaign.status = Some(status.to_string());
    }

    pub fn make_unavailable(&self, remote_id: &str) {
        self.state
            .lock()
            .unwrap()
            .unavailable_campaigns
            .insert(remote_id.to_string());
    }

    pub fn set_accounts_snapshot(&self, accounts: Vec<AccountSnapshot>) {
        self.state.lock().unwrap().accounts = accounts;
    }

    /// 第 n 次（从 1 开始）推送失败
    pub fn fail_push_on_batch(&self, batch: Option<usize>) {
        self.state.lock().unwrap().fail_push_on_batch = batch;
    }

    pub fn fail_options(&self, fail: bool) {
        self.state.lock().unwrap().fail_options = fail;
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn remote_count(&self) -> usize {
        self.state.lock().unwrap().campaigns.len()
    }

    pub fn pushed_emails(&self, remote_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .pushed
            .iter()
            .filter(|(id, _)| id == remote_id)
            .flat_map(|(_, leads)| leads.iter().map(|l| l.email.clone()))
            .collect()
    }

    pub fn push_batches(&self) -> Vec<usize> {
        self.state
            .lock()
            .unwrap()
            .pushed
            .iter()
            .map(|(_, leads)| leads.len())
            .collect()
    }

    pub fn options_of(&self, remote_id: &str) -> Option<CampaignOptions> {
        self.state.lock().unwrap().options.get(remote_id).cloned()
    }

    pub fn schedule_of(&self, remote_id: &str) -> Option<SendSchedule> {
        self.state.lock().unwrap().schedules.get(remote_id).cloned()
    }

    pub fn sequences_of(&self, remote_id: &str) -> Option<Vec<SequenceStep>> {
        self.state.lock().unwrap().sequences.get(remote_id).cloned()
    }

    pub fn assigned_of(&self, remote_id: &str) -> Option<Vec<String>> {
        self.state.lock().unwrap().assigned.get(remote_id).cloned()
    }

    pub fn status_of(&self, remote_id: &str) -> Option<RemoteRunState> {
        self.state.lock().unwrap().statuses.get(remote_id).copied()
    }

    fn ensure_known(state: &DeliveryState, remote_id: &str) -> Result<(), GatewayError> {
        if state.campaigns.iter().any(|c| c.id == remote_id) {
            Ok(())
        } else {
            Err(GatewayError::NotFound(remote_id.to_string()))
        }
    }
}

#[async_trait]
impl DeliveryProviderGateway for FakeDeliveryProvider {
    async fn create_campaign(&self, name: &str) -> Result<String, GatewayError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.insert_remote(name))
    }

    async fn get_campaign(&self, remote_id: &str) -> Result<RemoteCampaignSnapshot, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.unavailable_campaigns.contains(remote_id) {
            return Err(GatewayError::Unavailable("503 from provider".to_string()));
        }
        state
            .campaigns
            .iter()
            .find(|c| c.id == remote_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(remote_id.to_string()))
    }

    async fn find_campaigns_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<RemoteCampaignSnapshot>, GatewayError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        // Substring search, like the real provider
        Ok(self
            .state
            .lock()
            .unwrap()
            .campaigns
            .iter()
            .filter(|c| c.name.contains(name))
            .cloned()
            .collect())
    }

    async fn set_accounts(&self, remote_id: &str, addresses: &[String]) -> Result<(), GatewayError> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        Self::ensure_known(&state, remote_id)?;
        state
            .assigned
            .insert(remote_id.to_string(), addresses.to_vec());
        Ok(())
    }

    async fn set_options(
        &self,
        remote_id: &str,
        options: &CampaignOptions,
    ) -> Result<(), GatewayError> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        Self::ensure_known(&state, remote_id)?;
        if state.fail_options {
            return Err(GatewayError::Unavailable("options endpoint down".to_string()));
        }
        state.options.insert(remote_id.to_string(), options.clone());
        Ok(())
    }

    async fn set_schedule(
        &self,
        remote_id: &str,
        schedule: &SendSchedule,
    ) -> Result<(), GatewayError> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        Self::ensure_known(&state, remote_id)?;
        state
            .schedules
            .insert(remote_id.to_string(), schedule.clone());
        Ok(())
    }

    async fn set_sequences(
        &self,
        remote_id: &str,
        steps: &[SequenceStep],
    ) -> Result<(), GatewayError> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        Self::ensure_known(&state, remote_id)?;
        state.sequences.insert(remote_id.to_string(), steps.to_vec());
        Ok(())
    }

    async fn set_status(&self, remote_id: &str, run_state: RemoteRunState) -> Result<(), GatewayError> {
        let delay = *self.status_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        Self::ensure_known(&state, remote_id)?;
        state.statuses.insert(remote_id.to_string(), run_state);
        Ok(())
    }

    async fn add_leads(&self, remote_id: &str, leads: &[RemoteLead]) -> Result<(), GatewayError> {
        let call = self.add_leads_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.lock().unwrap();
        Self::ensure_known(&state, remote_id)?;
        if state.fail_push_on_batch == Some(call) {
            return Err(GatewayError::Unavailable("lead import failed".to_string()));
        }
        state.pushed.push((remote_id.to_string(), leads.to_vec()));
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<AccountSnapshot>, GatewayError> {
        Ok(self.state.lock().unwrap().accounts.clone())
    }
}

/// 开场白生成器替身
///
/// 对 `fail_for` 中的邮箱返回错误，并记录最大并发数
pub struct FakeIcebreakerGenerator {
    fail_for: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FakeIcebreakerGenerator {
    pub fn new() -> Self {
        Self {
            fail_for: Mutex::new(HashSet::new()),
            delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_for(&self, email: &str) {
        self.fail_for.lock().unwrap().insert(email.to_lowercase());
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl IcebreakerGenerator for FakeIcebreakerGenerator {
    async fn generate(
        &self,
        profile: &LeadProfile,
        context: &PersonalizationContext,
    ) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let email = profile.email.clone().unwrap_or_default().to_lowercase();
        if self.fail_for.lock().unwrap().contains(&email) {
            return Err(GatewayError::Unavailable("model overloaded".to_string()));
        }

        Ok(format!(
            "Hi {}, saw what {} is doing. {} helps teams like yours.",
            profile.first_name.clone().unwrap_or_default(),
            profile.company.clone().unwrap_or_default(),
            context.sender_company.clone().unwrap_or_default()
        ))
    }
}
