// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 数据库（database）：连接池与实体映射
/// - 网关实现（gateways）：基于 HTTP 的外部服务适配
/// - 指标（metrics）：Prometheus 导出与计数器名称
/// - 仓库实现（repositories）：领域仓库接口的具体实现
pub mod database;
pub mod gateways;
pub mod metrics;
pub mod repositories;
