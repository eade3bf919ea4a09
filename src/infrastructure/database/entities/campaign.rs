// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub remote_campaign_id: Option<String>,
    pub name: String,
    pub status: String,
    pub remote_status: Option<String>,
    pub options: Json,
    pub schedule: Json,
    pub sequences: Json,
    pub sending_account_ids: Json,
    pub sent_count: i32,
    pub opened_count: i32,
    pub replied_count: i32,
    pub config_synced_at: Option<ChronoDateTimeWithTimeZone>,
    pub last_synced_at: Option<ChronoDateTimeWithTimeZone>,
    pub created_at: ChronoDateTimeWithTimeZone,
    pub updated_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
