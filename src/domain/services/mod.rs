// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 搜索任务编排（job_orchestrator）：提交、轮询、导入与重新同步
/// - 营销活动同步（campaign_sync）：惰性物化、配置推送、线索推送与重新关联
/// - 开场白流水线（icebreaker_pipeline）：单条与批量生成
/// - 发信账户同步（account_sync）：从投递服务全量同步账户
pub mod account_sync;
pub mod campaign_sync;
pub mod icebreaker_pipeline;
pub mod job_orchestrator;
