use sea_orm_migration::prelude::*;

use super::m20240601_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Uploads {
    Table,
    Id,
    UserId,
    Filename,
    OriginalName,
    MimeType,
    Size,
    Path,
    Url,
    Checksum,
    Status,
    Progress,
    ChunkSize,
    TotalChunks,
    UploadedChunks,
    Metadata,
    CreatedAt,
    UpdatedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum UploadJobs {
    Table,
    Id,
    UserId,
    SongTitle,
    SongType,
    Genre,
    Language,
    Upc,
    ArtistId,
    ArtistName,
    Tracks,
    CopyrightAcknowledged,
    Status,
    CurrentStep,
    Progress,
    CreatedAt,
    UpdatedAt,
    CompletedAt,
    ExpiresAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Uploads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Uploads::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Uploads::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(Uploads::Filename).string_len(255).not_null())
                    .col(ColumnDef::new(Uploads::OriginalName).string_len(255).not_null())
                    .col(ColumnDef::new(Uploads::MimeType).string_len(100).not_null())
                    // Files can be larger than 2GB
                    .col(ColumnDef::new(Uploads::Size).big_integer().not_null())
                    .col(ColumnDef::new(Uploads::Path).text())
                    .col(ColumnDef::new(Uploads::Url).text())
                    .col(ColumnDef::new(Uploads::Checksum).string_len(64))
                    .col(ColumnDef::new(Uploads::Status).string_len(32).not_null().default("pending"))
                    .col(ColumnDef::new(Uploads::Progress).integer().not_null().default(0))
                    .col(ColumnDef::new(Uploads::ChunkSize).integer())
                    .col(ColumnDef::new(Uploads::TotalChunks).integer())
                    .col(ColumnDef::new(Uploads::UploadedChunks).integer().not_null().default(0))
                    .col(ColumnDef::new(Uploads::Metadata).json())
                    .col(ColumnDef::new(Uploads::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Uploads::UpdatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Uploads::CompletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-uploads-user_id")
                            .from(Uploads::Table, Uploads::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UploadJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UploadJobs::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UploadJobs::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(UploadJobs::SongTitle).string_len(255).not_null())
                    .col(ColumnDef::new(UploadJobs::SongType).string_len(100))
                    .col(ColumnDef::new(UploadJobs::Genre).string_len(100))
                    .col(ColumnDef::new(UploadJobs::Language).string_len(50))
                    .col(ColumnDef::new(UploadJobs::Upc).string_len(50))
                    .col(ColumnDef::new(UploadJobs::ArtistId).string_len(36))
                    .col(ColumnDef::new(UploadJobs::ArtistName).string_len(255))
                    .col(ColumnDef::new(UploadJobs::Tracks).json())
                    .col(
                        ColumnDef::new(UploadJobs::CopyrightAcknowledged)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(UploadJobs::Status)
                            .string_len(50)
                            .not_null()
                            .default("in_progress"),
                    )
                    .col(ColumnDef::new(UploadJobs::CurrentStep).string_len(100))
                    .col(ColumnDef::new(UploadJobs::Progress).integer().not_null().default(0))
                    .col(ColumnDef::new(UploadJobs::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(UploadJobs::UpdatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(UploadJobs::CompletedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(UploadJobs::ExpiresAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-upload_jobs-user_id")
                            .from(UploadJobs::Table, UploadJobs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uploads_user_idx")
                    .table(Uploads::Table)
                    .col(Uploads::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("upload_jobs_status_idx")
                    .table(UploadJobs::Table)
                    .col(UploadJobs::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UploadJobs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Uploads::Table).to_owned())
            .await
    }
}
