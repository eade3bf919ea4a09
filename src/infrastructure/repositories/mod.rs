// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口基于 SeaORM 的实现
pub mod campaign_repo_impl;
pub mod lead_repo_impl;
pub mod organization_repo_impl;
pub mod outreach_account_repo_impl;
pub mod search_job_repo_impl;
