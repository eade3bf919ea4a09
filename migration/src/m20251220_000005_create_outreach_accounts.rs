// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 发信账户表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OutreachAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OutreachAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OutreachAccounts::Email).string().not_null())
                    .col(
                        ColumnDef::new(OutreachAccounts::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(OutreachAccounts::WarmupEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(OutreachAccounts::ReputationScore).double())
                    .col(ColumnDef::new(OutreachAccounts::DailyLimit).integer())
                    .col(ColumnDef::new(OutreachAccounts::OrganizationId).uuid())
                    .col(
                        ColumnDef::new(OutreachAccounts::LastSyncedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(OutreachAccounts::CreatedAt)
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
                    .name("idx_outreach_accounts_email")
                    .table(OutreachAccounts::Table)
                    .col(OutreachAccounts::Email)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OutreachAccounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OutreachAccounts {
    Table,
    Id,
    Email,
    Active,
    WarmupEnabled,
    ReputationScore,
    DailyLimit,
    OrganizationId,
    LastSyncedAt,
    CreatedAt,
}
