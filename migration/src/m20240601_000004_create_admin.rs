use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum AdminTasks {
    Table,
    Id,
    Title,
    Description,
    Priority,
    Status,
    AssignedTo,
    CreatedBy,
    DueDate,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AdminAlerts {
    Table,
    Id,
    Type,
    Title,
    Message,
    EntityType,
    EntityId,
    Status,
    Severity,
    ResolvedBy,
    ResolvedAt,
    Metadata,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Royalties {
    Table,
    Id,
    Period,
    PeriodType,
    Upc,
    Isrc,
    TrackName,
    SongTitle,
    ArtistName,
    RecordLabel,
    GrossAmountUsd,
    DeductionsPercent,
    DeductionsUsd,
    NetAmountUsd,
    UserId,
    SongId,
    TrackId,
    ArtistId,
    MatchStatus,
    PaymentStatus,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminTasks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AdminTasks::Id).string_len(36).not_null().primary_key())
                    .col(ColumnDef::new(AdminTasks::Title).string_len(255).not_null())
                    .col(ColumnDef::new(AdminTasks::Description).text())
                    .col(ColumnDef::new(AdminTasks::Priority).string_len(20).not_null().default("medium"))
                    .col(ColumnDef::new(AdminTasks::Status).string_len(32).not_null().default("pending"))
                    .col(ColumnDef::new(AdminTasks::AssignedTo).string_len(36))
                    .col(ColumnDef::new(AdminTasks::CreatedBy).string_len(36).not_null())
                    .col(ColumnDef::new(AdminTasks::DueDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(AdminTasks::CompletedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AdminTasks::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(AdminTasks::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AdminAlerts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AdminAlerts::Id).string_len(36).not_null().primary_key())
                    .col(ColumnDef::new(AdminAlerts::Type).string_len(50).not_null())
                    .col(ColumnDef::new(AdminAlerts::Title).string_len(255).not_null())
                    .col(ColumnDef::new(AdminAlerts::Message).text().not_null())
                    .col(ColumnDef::new(AdminAlerts::EntityType).string_len(50))
                    .col(ColumnDef::new(AdminAlerts::EntityId).string_len(36))
                    .col(ColumnDef::new(AdminAlerts::Status).string_len(32).not_null().default("open"))
                    .col(ColumnDef::new(AdminAlerts::Severity).string_len(20).not_null().default("info"))
                    .col(ColumnDef::new(AdminAlerts::ResolvedBy).string_len(36))
                    .col(ColumnDef::new(AdminAlerts::ResolvedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AdminAlerts::Metadata).json())
                    .col(ColumnDef::new(AdminAlerts::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(AdminAlerts::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Royalties::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Royalties::Id).string_len(36).not_null().primary_key())
                    // e.g. "2024-Q1" or "2024-05"
                    .col(ColumnDef::new(Royalties::Period).string_len(32).not_null())
                    .col(ColumnDef::new(Royalties::PeriodType).string_len(20).not_null())
                    .col(ColumnDef::new(Royalties::Upc).string_len(50))
                    .col(ColumnDef::new(Royalties::Isrc).string_len(32))
                    .col(ColumnDef::new(Royalties::TrackName).string_len(255).not_null())
                    .col(ColumnDef::new(Royalties::SongTitle).string_len(255).not_null())
                    .col(ColumnDef::new(Royalties::ArtistName).string_len(255).not_null())
                    .col(ColumnDef::new(Royalties::RecordLabel).string_len(255))
                    .col(ColumnDef::new(Royalties::GrossAmountUsd).double().not_null().default(0.0))
                    .col(ColumnDef::new(Royalties::DeductionsPercent).double().not_null().default(0.0))
                    .col(ColumnDef::new(Royalties::DeductionsUsd).double().not_null().default(0.0))
                    .col(ColumnDef::new(Royalties::NetAmountUsd).double().not_null().default(0.0))
                    .col(ColumnDef::new(Royalties::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(Royalties::SongId).string_len(36))
                    .col(ColumnDef::new(Royalties::TrackId).string_len(36))
                    .col(ColumnDef::new(Royalties::ArtistId).string_len(36))
                    .col(ColumnDef::new(Royalties::MatchStatus).string_len(32).not_null().default("pending"))
                    .col(ColumnDef::new(Royalties::PaymentStatus).string_len(32).not_null().default("unpaid"))
                    .col(ColumnDef::new(Royalties::PaidAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Royalties::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Royalties::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("royalty_user_period_idx")
                    .table(Royalties::Table)
                    .col(Royalties::UserId)
                    .col(Royalties::Period)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Royalties::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminAlerts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminTasks::Table).to_owned())
            .await
    }
}
