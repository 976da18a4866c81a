use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Persisted progress of the multi-step upload wizard, kept so an interrupted
/// upload can resume until `expires_at`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "upload_jobs")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub song_title: String,
    pub song_type: Option<String>,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub upc: Option<String>,
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
    pub tracks: Option<Json>,
    pub copyright_acknowledged: bool,
    pub status: String,
    pub current_step: Option<String>,
    pub progress: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
    pub expires_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
