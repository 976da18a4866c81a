use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation state of a release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "snake_case")]
pub enum SongStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "checking")]
    Checking,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "flagged")]
    Flagged,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(50))")]
#[serde(rename_all = "snake_case")]
pub enum SongType {
    #[default]
    #[sea_orm(string_value = "single")]
    Single,
    #[sea_orm(string_value = "album")]
    Album,
    #[sea_orm(string_value = "medley")]
    Medley,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "songs")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub artist_id: String,
    pub artist_name: String,
    pub r#type: SongType,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub upc: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub cover: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub producer: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub writer: Option<String>,
    pub record_label: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub featured: Option<String>,
    pub number_of_tracks: i32,
    pub is_featured: bool,
    pub plays: i32,
    pub duration: Option<i32>,
    pub status: SongStatus,
    pub flag_type: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub flag_reason: Option<String>,
    pub flagged_at: Option<DateTimeUtc>,
    pub flagged_by: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTimeUtc>,
    pub created_by: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::track::Entity")]
    Track,
}

impl Related<super::track::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Track.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
