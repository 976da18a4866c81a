use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240601_000002_create_catalog"
    }
}

#[derive(DeriveIden)]
enum Songs {
    Table,
    Id,
    Title,
    UserId,
    ArtistId,
    ArtistName,
    Type,
    Genre,
    Language,
    Upc,
    Cover,
    Producer,
    Writer,
    RecordLabel,
    Featured,
    NumberOfTracks,
    IsFeatured,
    Plays,
    Duration,
    Status,
    FlagType,
    FlagReason,
    FlaggedAt,
    FlaggedBy,
    ApprovedBy,
    ApprovedAt,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Tracks {
    Table,
    Id,
    SongId,
    TrackNumber,
    Title,
    Mp3,
    Isrc,
    Explicit,
    Lyrics,
    LeadVocal,
    Featured,
    Producer,
    Writer,
    Duration,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    // Songs are the release, tracks the audio files belonging to it
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Songs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Songs::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Songs::Title).string_len(255).not_null().default(""))
                    .col(ColumnDef::new(Songs::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(Songs::ArtistId).string_len(36).not_null())
                    .col(ColumnDef::new(Songs::ArtistName).string_len(255).not_null().default(""))
                    .col(ColumnDef::new(Songs::Type).string_len(50).not_null().default("single"))
                    .col(ColumnDef::new(Songs::Genre).string_len(100))
                    .col(ColumnDef::new(Songs::Language).string_len(50))
                    .col(ColumnDef::new(Songs::Upc).string_len(50))
                    .col(ColumnDef::new(Songs::Cover).text())
                    .col(ColumnDef::new(Songs::Producer).text())
                    .col(ColumnDef::new(Songs::Writer).text())
                    .col(ColumnDef::new(Songs::RecordLabel).string_len(255))
                    .col(ColumnDef::new(Songs::Featured).text())
                    .col(ColumnDef::new(Songs::NumberOfTracks).integer().not_null().default(0))
                    .col(ColumnDef::new(Songs::IsFeatured).boolean().not_null().default(false))
                    .col(ColumnDef::new(Songs::Plays).integer().not_null().default(0))
                    .col(ColumnDef::new(Songs::Duration).integer())
                    .col(ColumnDef::new(Songs::Status).string_len(32).not_null().default("new"))
                    .col(ColumnDef::new(Songs::FlagType).string_len(32))
                    .col(ColumnDef::new(Songs::FlagReason).text())
                    .col(ColumnDef::new(Songs::FlaggedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Songs::FlaggedBy).string_len(36))
                    .col(ColumnDef::new(Songs::ApprovedBy).string_len(36))
                    .col(ColumnDef::new(Songs::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Songs::CreatedBy).string_len(36))
                    .col(ColumnDef::new(Songs::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Songs::UpdatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Songs::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("songs_artist_idx", Songs::ArtistId),
            ("songs_status_idx", Songs::Status),
            ("songs_type_idx", Songs::Type),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(Songs::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        // Can't have a track without a song
        manager
            .create_table(
                Table::create()
                    .table(Tracks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tracks::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tracks::SongId).string_len(36).not_null())
                    .col(ColumnDef::new(Tracks::TrackNumber).integer().not_null().default(1))
                    .col(ColumnDef::new(Tracks::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Tracks::Mp3).text().not_null())
                    .col(ColumnDef::new(Tracks::Isrc).string_len(32))
                    .col(ColumnDef::new(Tracks::Explicit).string_len(10).not_null().default("no"))
                    .col(ColumnDef::new(Tracks::Lyrics).text())
                    .col(ColumnDef::new(Tracks::LeadVocal).string_len(255))
                    .col(ColumnDef::new(Tracks::Featured).text())
                    .col(ColumnDef::new(Tracks::Producer).text())
                    .col(ColumnDef::new(Tracks::Writer).text())
                    .col(ColumnDef::new(Tracks::Duration).integer().not_null().default(0))
                    .col(ColumnDef::new(Tracks::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Tracks::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tracks-song_id")
                            .from(Tracks::Table, Tracks::SongId)
                            .to(Songs::Table, Songs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("tracks_song_idx")
                    .table(Tracks::Table)
                    .col(Tracks::SongId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tracks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Songs::Table).to_owned())
            .await
    }
}
