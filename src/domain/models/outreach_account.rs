// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 发信账户
///
/// 投递服务上注册的发信身份，以邮箱地址作为远程标识。
/// 组织归属是纯本地数据，同步时不会被覆盖。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachAccount {
    pub id: Uuid,
    /// 远程标识
    pub email: String,
    pub active: bool,
    pub warmup_enabled: bool,
    /// 发信信誉分
    pub reputation_score: Option<f64>,
    pub daily_limit: Option<i32>,
    /// 为空表示在公共池中
    pub organization_id: Option<Uuid>,
    pub last_synced_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// 投递服务上报的账户快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub email: String,
    pub active: bool,
    pub warmup_enabled: bool,
    pub reputation_score: Option<f64>,
    pub daily_limit: Option<i32>,
}

impl OutreachAccount {
    /// 由快照创建新的未分配账户
    pub fn from_snapshot(snapshot: &AccountSnapshot) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: snapshot.email.trim().to_lowercase(),
            active: snapshot.active,
            warmup_enabled: snapshot.warmup_enabled,
            reputation_score: snapshot.reputation_score,
            daily_limit: snapshot.daily_limit,
            organization_id: None,
            last_synced_at: now,
            created_at: now,
        }
    }
}
