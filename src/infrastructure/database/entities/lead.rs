// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "leads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub source_job_id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: String,
    pub email_normalized: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub profile_url: Option<String>,
    pub raw_payload: Json,
    pub icebreaker: Option<String>,
    pub icebreaker_status: String,
    pub icebreaker_error: Option<String>,
    pub campaign_id: Option<Uuid>,
    pub campaign_status: String,
    pub created_at: ChronoDateTimeWithTimeZone,
    pub updated_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
