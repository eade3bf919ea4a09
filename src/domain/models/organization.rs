// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 组织（客户）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub personalization: PersonalizationContext,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 个性化上下文
///
/// 生成开场白时与线索画像一起交给模型。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalizationContext {
    /// 组织名称
    pub sender_company: Option<String>,
    pub company_description: Option<String>,
    pub value_proposition: Option<String>,
    /// 语气，例如 "casual"
    pub tone: Option<String>,
    pub custom_instructions: Option<String>,
}

impl Organization {
    pub fn new(name: impl Into<String>, personalization: PersonalizationContext) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            personalization,
            created_at: now,
            updated_at: now,
        }
    }

    /// 交给生成器的上下文，缺省时以组织名称作为发件公司
    pub fn context(&self) -> PersonalizationContext {
        let mut context = self.personalization.clone();
        if context.sender_company.is_none() {
            context.sender_company = Some(self.name.clone());
        }
        context
    }
}
