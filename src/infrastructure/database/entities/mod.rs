// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 使用SeaORM框架进行对象关系映射
pub mod campaign;
pub mod lead;
pub mod organization;
pub mod outreach_account;
pub mod search_job;
