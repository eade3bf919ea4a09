// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 营销活动表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(Campaigns::RemoteCampaignId).string())
                    .col(ColumnDef::new(Campaigns::Name).string().not_null())
                    .col(ColumnDef::new(Campaigns::Status).string().not_null())
                    .col(ColumnDef::new(Campaigns::RemoteStatus).string())
                    .col(ColumnDef::new(Campaigns::Options).json().not_null())
                    .col(ColumnDef::new(Campaigns::Schedule).json().not_null())
                    .col(ColumnDef::new(Campaigns::Sequences).json().not_null())
                    .col(ColumnDef::new(Campaigns::SendingAccountIds).json().not_null())
                    .col(
                        ColumnDef::new(Campaigns::SentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::OpenedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::RepliedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Campaigns::ConfigSyncedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Campaigns::LastSyncedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Campaigns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_campaigns_organization")
                    .table(Campaigns::Table)
                    .col(Campaigns::OrganizationId)
                    .to_owned(),
            )
            .await?;

        // NULLs are distinct, so any number of drafts may coexist
        manager
            .create_index(
                Index::create()
                    .name("idx_campaigns_remote_campaign_id")
                    .table(Campaigns::Table)
                    .col(Campaigns::RemoteCampaignId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    OrganizationId,
    RemoteCampaignId,
    Name,
    Status,
    RemoteStatus,
    Options,
    Schedule,
    Sequences,
    SendingAccountIds,
    SentCount,
    OpenedCount,
    RepliedCount,
    ConfigSyncedAt,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
}
