// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 线索搜索任务表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SearchJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchJobs::OrganizationId).uuid().not_null())
                    .col(ColumnDef::new(SearchJobs::RemoteRunId).string())
                    .col(ColumnDef::new(SearchJobs::Filters).json().not_null())
                    .col(ColumnDef::new(SearchJobs::Status).string().not_null())
                    .col(ColumnDef::new(SearchJobs::LeadsFound).integer())
                    .col(ColumnDef::new(SearchJobs::LeadsImported).integer())
                    .col(ColumnDef::new(SearchJobs::ErrorReason).text())
                    .col(
                        ColumnDef::new(SearchJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SearchJobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(SearchJobs::CompletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_jobs_org_status")
                    .table(SearchJobs::Table)
                    .col(SearchJobs::OrganizationId)
                    .col(SearchJobs::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SearchJobs {
    Table,
    Id,
    OrganizationId,
    RemoteRunId,
    Filters,
    Status,
    LeadsFound,
    LeadsImported,
    ErrorReason,
    CreatedAt,
    UpdatedAt,
    CompletedAt,
}
