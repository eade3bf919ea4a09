// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::search_job::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// 营销活动实体
///
/// 本地拥有的活动记录。`remote_campaign_id` 为空表示草稿尚未在投递服务上物化；
/// 一旦写入即视为远程活动存在，且只写入一次。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// 投递服务上的活动ID
    pub remote_campaign_id: Option<String>,
    pub name: String,
    /// 本地意图状态
    pub status: CampaignStatus,
    /// 投递服务上报的状态（只读镜像）
    pub remote_status: Option<String>,
    pub options: CampaignOptions,
    pub schedule: SendSchedule,
    /// 按顺序排列的邮件步骤
    pub sequences: Vec<SequenceStep>,
    /// 本地记录的发信账户
    pub sending_account_ids: Vec<Uuid>,
    pub stats: CampaignStats,
    /// 最近一次完整配置推送成功的时间
    pub config_synced_at: Option<DateTime<Utc>>,
    /// 最近一次统计同步时间
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 营销活动状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Active => write!(f, "active"),
            CampaignStatus::Paused => write!(f, "paused"),
            CampaignStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "active" => Ok(CampaignStatus::Active),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            _ => Err(()),
        }
    }
}

/// 可以下发到投递服务的运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteRunState {
    Active,
    Paused,
}

impl From<RemoteRunState> for CampaignStatus {
    fn from(state: RemoteRunState) -> Self {
        match state {
            RemoteRunState::Active => CampaignStatus::Active,
            RemoteRunState::Paused => CampaignStatus::Paused,
        }
    }
}

/// 发送选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CampaignOptions {
    /// 每日发送上限
    #[validate(range(min = 1, max = 10000))]
    pub daily_limit: u32,
    /// 收到回复后停止后续步骤
    pub stop_on_reply: bool,
    pub open_tracking: bool,
    pub link_tracking: bool,
}

impl Default for CampaignOptions {
    fn default() -> Self {
        Self {
            daily_limit: 50,
            stop_on_reply: true,
            open_tracking: true,
            link_tracking: false,
        }
    }
}

/// 邮件序列中的一步
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SequenceStep {
    #[validate(length(min = 1, max = 300))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub body: String,
    /// 距上一步的等待天数
    #[validate(range(max = 365))]
    pub delay_days: u32,
}

/// 每周启用的发送日
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weekdays {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
}

impl Weekdays {
    /// 周一到周五
    pub fn business_days() -> Self {
        Self {
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: false,
            sunday: false,
        }
    }

    /// 按周日为 0 的顺序输出
    pub fn as_array(&self) -> [bool; 7] {
        [
            self.sunday,
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
        ]
    }

    pub fn any_enabled(&self) -> bool {
        self.as_array().iter().any(|d| *d)
    }
}

/// 发送时间窗口
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_send_window"))]
pub struct SendSchedule {
    /// 起始小时（含）
    #[validate(range(max = 23))]
    pub start_hour: u8,
    /// 结束小时（不含）
    #[validate(range(min = 1, max = 24))]
    pub end_hour: u8,
    /// IANA 时区名
    #[validate(length(min = 1))]
    pub timezone: String,
    pub days: Weekdays,
}

fn validate_send_window(schedule: &SendSchedule) -> Result<(), ValidationError> {
    if schedule.start_hour >= schedule.end_hour {
        return Err(ValidationError::new("start_hour_after_end_hour"));
    }
    if !schedule.days.any_enabled() {
        return Err(ValidationError::new("no_sending_days"));
    }
    Ok(())
}

impl Default for SendSchedule {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 17,
            timezone: "America/New_York".to_string(),
            days: Weekdays::business_days(),
        }
    }
}

/// 投递统计（以投递服务为准）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStats {
    pub sent: i32,
    pub opened: i32,
    pub replied: i32,
}

fn to_domain_error(e: validator::ValidationErrors) -> DomainError {
    DomainError::ValidationError(e.to_string())
}

/// 校验发送选项
pub fn check_options(options: &CampaignOptions) -> Result<(), DomainError> {
    options.validate().map_err(to_domain_error)
}

/// 校验发送时间窗口
pub fn check_schedule(schedule: &SendSchedule) -> Result<(), DomainError> {
    schedule.validate().map_err(to_domain_error)
}

/// 校验邮件序列
pub fn check_sequences(steps: &[SequenceStep]) -> Result<(), DomainError> {
    for (index, step) in steps.iter().enumerate() {
        step.validate()
            .map_err(|e| DomainError::ValidationError(format!("step {}: {}", index + 1, e)))?;
    }
    Ok(())
}

impl Campaign {
    /// 创建本地草稿
    ///
    /// # 参数
    ///
    /// * `organization_id` - 所属组织
    /// * `name` - 活动名称，也是重新关联时的匹配键
    pub fn new(organization_id: Uuid, name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::ValidationError(
                "campaign name must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            organization_id,
            remote_campaign_id: None,
            name,
            status: CampaignStatus::Draft,
            remote_status: None,
            options: CampaignOptions::default(),
            schedule: SendSchedule::default(),
            sequences: Vec::new(),
            sending_account_ids: Vec::new(),
            stats: CampaignStats::default(),
            config_synced_at: None,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// 是否已经在投递服务上物化
    pub fn is_materialized(&self) -> bool {
        self.remote_campaign_id.is_some()
    }

    /// 远程活动存在但创建后的配置推送尚未成功
    pub fn needs_config_push(&self) -> bool {
        self.is_materialized() && self.config_synced_at.is_none()
    }

    /// 切换运行状态
    ///
    /// 已完成的活动不能再被激活或暂停
    pub fn transition_to(&mut self, state: RemoteRunState) -> Result<(), DomainError> {
        if self.status == CampaignStatus::Completed {
            return Err(DomainError::InvalidStateTransition {
                from: "completed",
                action: match state {
                    RemoteRunState::Active => "activate",
                    RemoteRunState::Paused => "pause",
                },
            });
        }
        self.status = state.into();
        self.updated_at = Utc::now();
        Ok(())
    }
}
