// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 线索表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Leads::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Leads::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Leads::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(Leads::SourceJobId).uuid())
                    .col(ColumnDef::new(Leads::FirstName).string())
                    .col(ColumnDef::new(Leads::LastName).string())
                    .col(ColumnDef::new(Leads::FullName).string())
                    .col(ColumnDef::new(Leads::Email).string().not_null())
                    .col(ColumnDef::new(Leads::EmailNormalized).string().not_null())
                    .col(ColumnDef::new(Leads::Title).string())
                    .col(ColumnDef::new(Leads::Company).string())
                    .col(ColumnDef::new(Leads::Phone).string())
                    .col(ColumnDef::new(Leads::ProfileUrl).string())
                    .col(ColumnDef::new(Leads::RawPayload).json().not_null())
                    .col(ColumnDef::new(Leads::Icebreaker).text())
                    .col(ColumnDef::new(Leads::IcebreakerStatus).string().not_null())
                    .col(ColumnDef::new(Leads::IcebreakerError).text())
                    .col(ColumnDef::new(Leads::CampaignId).uuid())
                    .col(ColumnDef::new(Leads::CampaignStatus).string().not_null())
                    .col(
                        ColumnDef::new(Leads::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Leads::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Dedup key for imports
        manager
            .create_index(
                Index::create()
                    .name("idx_leads_org_email")
                    .table(Leads::Table)
                    .col(Leads::OrganizationId)
                    .col(Leads::EmailNormalized)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leads_source_job")
                    .table(Leads::Table)
                    .col(Leads::SourceJobId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leads_campaign")
                    .table(Leads::Table)
                    .col(Leads::CampaignId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Leads::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Leads {
    Table,
    Id,
    OrganizationId,
    SourceJobId,
    FirstName,
    LastName,
    FullName,
    Email,
    EmailNormalized,
    Title,
    Company,
    Phone,
    ProfileUrl,
    RawPayload,
    Icebreaker,
    IcebreakerStatus,
    IcebreakerError,
    CampaignId,
    CampaignStatus,
    CreatedAt,
    UpdatedAt,
}
