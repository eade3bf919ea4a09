// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::GatewayError;
use crate::domain::models::lead::LeadProfile;
use crate::domain::models::organization::PersonalizationContext;
use async_trait::async_trait;

/// 开场白生成器
///
/// 给定线索画像与组织上下文，返回个性化文本或失败。
#[async_trait]
pub trait IcebreakerGenerator: Send + Sync {
    async fn generate(
        &self,
        profile: &LeadProfile,
        context: &PersonalizationContext,
    ) -> Result<String, GatewayError>;
}
