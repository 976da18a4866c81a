use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tracks")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub song_id: String,
    pub track_number: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub mp3: String,
    pub isrc: Option<String>,
    pub explicit: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub lyrics: Option<String>,
    pub lead_vocal: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub featured: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub producer: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub writer: Option<String>,
    pub duration: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::song::Entity",
        from = "Column::SongId",
        to = "super::song::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Song,
}

impl Related<super::song::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Song.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
