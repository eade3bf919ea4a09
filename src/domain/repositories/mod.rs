// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供。
pub mod campaign_repository;
pub mod lead_repository;
pub mod organization_repository;
pub mod outreach_account_repository;
pub mod search_job_repository;
