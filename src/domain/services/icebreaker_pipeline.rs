// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::gateways::icebreaker_generator::IcebreakerGenerator;
use crate::domain::gateways::GatewayError;
use crate::domain::models::lead::{IcebreakerStatus, Lead};
use crate::domain::repositories::lead_repository::LeadRepository;
use crate::domain::repositories::organization_repository::OrganizationRepository;
use crate::infrastructure::metrics::{ICEBREAKERS_FAILED, ICEBREAKERS_GENERATED};
use crate::utils::errors::OrchestrationError;
use futures::stream::{self, StreamExt};
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 单条生成结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IcebreakerOutcome {
    Completed,
    Failed,
    Missing,
}

/// 批量生成的进度事件，每条结果回调一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IcebreakerProgress {
    pub lead_id: Uuid,
    pub outcome: IcebreakerOutcome,
    /// 已处理数
    pub done: usize,
    pub total: usize,
}

/// 批量生成结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IcebreakerReport {
    pub completed: usize,
    pub failed: usize,
    pub missing: usize,
}

impl IcebreakerReport {
    pub fn processed(&self) -> usize {
        self.completed + self.failed + self.missing
    }
}

/// 开场白生成流水线
pub struct IcebreakerPipeline {
    leads: Arc<dyn LeadRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    generator: Arc<dyn IcebreakerGenerator>,
    /// 批量生成时同时进行的调用数
    concurrency: usize,
}

impl IcebreakerPipeline {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        organizations: Arc<dyn OrganizationRepository>,
        generator: Arc<dyn IcebreakerGenerator>,
        concurrency: usize,
    ) -> Self {
        Self {
            leads,
            organizations,
            generator,
            concurrency: concurrency.max(1),
        }
    }

    /// 为单条线索生成开场白
    ///
    /// 先标记为 generating；成功后写入文本并标记 completed，
    /// 失败时标记 failed、不保留文本，并把错误返回给调用者。
    #[instrument(skip(self))]
    pub async fn generate(&self, lead_id: Uuid) -> Result<Lead, OrchestrationError> {
        let lead = self
            .leads
            .find_by_id(lead_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("lead", lead_id))?;
        let organization = self
            .organizations
            .find_by_id(lead.organization_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("organization", lead.organization_id))?;

        self.leads
            .update_icebreaker(lead_id, IcebreakerStatus::Generating, None, None)
            .await?;

        let generated = self
            .generator
            .generate(&lead.profile(), &organization.context())
            .await
            .and_then(|text| {
                let text = text.trim().to_string();
                if text.is_empty() {
                    Err(GatewayError::InvalidResponse(
                        "empty icebreaker text".to_string(),
                    ))
                } else {
                    Ok(text)
                }
            });

        match generated {
            Ok(text) => {
                self.leads
                    .update_icebreaker(lead_id, IcebreakerStatus::Completed, Some(text), None)
                    .await?;
                counter!(ICEBREAKERS_GENERATED).increment(1);
            }
            Err(e) => {
                warn!(error = %e, "Icebreaker generation failed");
                self.leads
                    .update_icebreaker(
                        lead_id,
                        IcebreakerStatus::Failed,
                        None,
                        Some(e.to_string()),
                    )
                    .await?;
                counter!(ICEBREAKERS_FAILED).increment(1);
                return Err(e.into());
            }
        }

        self.leads
            .find_by_id(lead_id)
            .await?
            .ok_or_else(|| OrchestrationError::not_found("lead", lead_id))
    }

    /// 批量生成
    ///
    /// 每条线索独立调用一次生成器，单条失败不会中断整个批次。
    /// `on_progress` 在每条结果产生后立即调用。
    ///
    /// # 参数
    ///
    /// * `lead_ids` - 线索ID列表
    /// * `on_progress` - 进度回调
    #[instrument(skip(self, lead_ids, on_progress), fields(total = lead_ids.len()))]
    pub async fn generate_many<F>(&self, lead_ids: &[Uuid], mut on_progress: F) -> IcebreakerReport
    where
        F: FnMut(IcebreakerProgress),
    {
        let total = lead_ids.len();
        let mut report = IcebreakerReport::default();

        let mut results = stream::iter(lead_ids.iter().copied())
            .map(|lead_id| async move { (lead_id, self.generate(lead_id).await) })
            .buffer_unordered(self.concurrency);

        while let Some((lead_id, result)) = results.next().await {
            let outcome = match result {
                Ok(_) => {
                    report.completed += 1;
                    IcebreakerOutcome::Completed
                }
                Err(OrchestrationError::NotFound(_)) => {
                    report.missing += 1;
                    IcebreakerOutcome::Missing
                }
                Err(_) => {
                    report.failed += 1;
                    IcebreakerOutcome::Failed
                }
            };

            on_progress(IcebreakerProgress {
                lead_id,
                outcome,
                done: report.processed(),
                total,
            });
        }

        info!(?report, "Icebreaker batch finished");
        report
    }
}
