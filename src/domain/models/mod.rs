// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 搜索任务（search_job）：一次远程线索搜索及其状态机
/// - 线索（lead）：去重后的联系人与开场白、投递状态
/// - 营销活动（campaign）：本地活动记录与发送配置
/// - 发信账户（outreach_account）：投递服务上的发信身份
/// - 组织（organization）：客户及其个性化上下文
pub mod campaign;
pub mod lead;
pub mod organization;
pub mod outreach_account;
pub mod search_job;
