// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：搜索任务、线索、营销活动、发信账户与组织
/// - 网关契约（gateways）：抓取服务、投递服务与开场白生成器
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：编排器与同步服务
pub mod gateways;
pub mod models;
pub mod repositories;
pub mod services;
