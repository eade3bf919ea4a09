// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::ValidateEmail;

/// 线索实体
///
/// 同一组织内以规范化邮箱去重。原始抓取数据保留在 `raw_payload` 中用于审计。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// 来源搜索任务
    pub source_job_id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: String,
    /// 去重键：去除空白并转为小写的邮箱
    pub email_normalized: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub profile_url: Option<String>,
    /// 抓取服务返回的原始记录
    pub raw_payload: Value,
    /// 个性化开场白
    pub icebreaker: Option<String>,
    pub icebreaker_status: IcebreakerStatus,
    /// 最近一次生成失败的原因
    pub icebreaker_error: Option<String>,
    pub campaign_id: Option<Uuid>,
    pub campaign_status: LeadCampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 开场白生成状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IcebreakerStatus {
    #[default]
    Pending,
    Generating,
    Completed,
    Failed,
}

impl fmt::Display for IcebreakerStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IcebreakerStatus::Pending => write!(f, "pending"),
            IcebreakerStatus::Generating => write!(f, "generating"),
            IcebreakerStatus::Completed => write!(f, "completed"),
            IcebreakerStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for IcebreakerStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(IcebreakerStatus::Pending),
            "generating" => Ok(IcebreakerStatus::Generating),
            "completed" => Ok(IcebreakerStatus::Completed),
            "failed" => Ok(IcebreakerStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 线索在营销活动中的投递状态
///
/// 状态只会前进：NotAdded → Queued → Sent → Opened → Replied。
/// Replied 与 Bounced 均为终态：已回复说明邮件已送达，之后的退信事件不再降级。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadCampaignStatus {
    #[default]
    NotAdded,
    Queued,
    Sent,
    Opened,
    Replied,
    Bounced,
}

impl LeadCampaignStatus {
    fn rank(self) -> u8 {
        match self {
            LeadCampaignStatus::NotAdded => 0,
            LeadCampaignStatus::Queued => 1,
            LeadCampaignStatus::Sent => 2,
            LeadCampaignStatus::Opened => 3,
            LeadCampaignStatus::Replied => 4,
            LeadCampaignStatus::Bounced => 5,
        }
    }

    /// 根据投递事件计算新状态
    ///
    /// # 返回值
    ///
    /// * `Some(status)` - 状态需要前进
    /// * `None` - 事件不会改变状态（重复或乱序到达）
    pub fn advance(self, event: DeliveryEvent) -> Option<LeadCampaignStatus> {
        if matches!(
            self,
            LeadCampaignStatus::NotAdded | LeadCampaignStatus::Replied | LeadCampaignStatus::Bounced
        ) {
            return None;
        }
        let target = match event {
            DeliveryEvent::Sent => LeadCampaignStatus::Sent,
            DeliveryEvent::Opened => LeadCampaignStatus::Opened,
            DeliveryEvent::Replied => LeadCampaignStatus::Replied,
            DeliveryEvent::Bounced => LeadCampaignStatus::Bounced,
        };
        (target.rank() > self.rank()).then_some(target)
    }
}

impl fmt::Display for LeadCampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LeadCampaignStatus::NotAdded => write!(f, "not_added"),
            LeadCampaignStatus::Queued => write!(f, "queued"),
            LeadCampaignStatus::Sent => write!(f, "sent"),
            LeadCampaignStatus::Opened => write!(f, "opened"),
            LeadCampaignStatus::Replied => write!(f, "replied"),
            LeadCampaignStatus::Bounced => write!(f, "bounced"),
        }
    }
}

impl FromStr for LeadCampaignStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_added" => Ok(LeadCampaignStatus::NotAdded),
            "queued" => Ok(LeadCampaignStatus::Queued),
            "sent" => Ok(LeadCampaignStatus::Sent),
            "opened" => Ok(LeadCampaignStatus::Opened),
            "replied" => Ok(LeadCampaignStatus::Replied),
            "bounced" => Ok(LeadCampaignStatus::Bounced),
            _ => Err(()),
        }
    }
}

/// 投递服务回传的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryEvent {
    Sent,
    Opened,
    Replied,
    Bounced,
}

/// 线索画像
///
/// 从抓取服务的原始记录中提取的联系人字段，同时作为开场白生成的输入。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub profile_url: Option<String>,
    pub headline: Option<String>,
    pub company_description: Option<String>,
    pub location: Option<String>,
}

fn pick(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

impl LeadProfile {
    /// 从原始抓取记录中解析联系人字段
    ///
    /// 不同抓取 actor 的字段命名不一致，这里按优先级依次尝试。
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        let first_name = pick(raw, &["first_name", "firstName"]);
        let last_name = pick(raw, &["last_name", "lastName"]);
        let full_name = pick(raw, &["full_name", "fullName", "name"]).or_else(|| {
            match (&first_name, &last_name) {
                (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
                (Some(f), None) => Some(f.clone()),
                _ => None,
            }
        });

        Self {
            first_name,
            last_name,
            full_name,
            email: pick(raw, &["email", "personal_email", "work_email"]),
            title: pick(raw, &["job_title", "title", "position"]),
            company: pick(raw, &["company_name", "company", "organization_name"]),
            phone: pick(raw, &["mobile_number", "phone", "phone_number"]),
            profile_url: pick(raw, &["linkedin", "linkedin_url", "profile_url"]),
            headline: pick(raw, &["headline"]),
            company_description: pick(raw, &["company_description"]),
            location: pick(raw, &["city", "location", "country"]),
        }
    }
}

/// 规范化邮箱，语法非法时返回 None
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_lowercase();
    normalized.validate_email().then_some(normalized)
}

impl Lead {
    /// 根据导入结果构造新线索
    ///
    /// # 参数
    ///
    /// * `organization_id` - 所属组织
    /// * `source_job_id` - 来源任务
    /// * `raw` - 原始抓取记录
    ///
    /// # 返回值
    ///
    /// 记录中没有合法邮箱时返回 None
    pub fn from_import(
        organization_id: Uuid,
        source_job_id: Option<Uuid>,
        raw: &Map<String, Value>,
    ) -> Option<Self> {
        let profile = LeadProfile::from_raw(raw);
        let email = profile.email.clone()?;
        let email_normalized = normalize_email(&email)?;
        let now = Utc::now();

        Some(Self {
            id: Uuid::new_v4(),
            organization_id,
            source_job_id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            full_name: profile.full_name,
            email: email.trim().to_string(),
            email_normalized,
            title: profile.title,
            company: profile.company,
            phone: profile.phone,
            profile_url: profile.profile_url,
            raw_payload: Value::Object(raw.clone()),
            icebreaker: None,
            icebreaker_status: IcebreakerStatus::Pending,
            icebreaker_error: None,
            campaign_id: None,
            campaign_status: LeadCampaignStatus::NotAdded,
            created_at: now,
            updated_at: now,
        })
    }

    /// 生成开场白所需的画像，原始记录中的补充字段也会带上
    pub fn profile(&self) -> LeadProfile {
        let enriched = self
            .raw_payload
            .as_object()
            .map(LeadProfile::from_raw)
            .unwrap_or_default();

        LeadProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            full_name: self.full_name.clone(),
            email: Some(self.email.clone()),
            title: self.title.clone(),
            company: self.company.clone(),
            phone: self.phone.clone(),
            profile_url: self.profile_url.clone(),
            headline: enriched.headline,
            company_description: enriched.company_description,
            location: enriched.location,
        }
    }

    /// 是否可以推送到营销活动
    pub fn has_completed_icebreaker(&self) -> bool {
        self.icebreaker_status == IcebreakerStatus::Completed
            && self
                .icebreaker
                .as_deref()
                .is_some_and(|text| !text.trim().is_empty())
    }
}
