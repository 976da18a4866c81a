use crate::song::{ActiveModel, SongStatus, SongType};
use sea_orm::prelude::DateTimeUtc;
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};

/// Column values of a freshly created release; everything else keeps the
/// table default.
#[derive(PartialEq, Clone, Debug)]
pub struct SongModel {
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub artist_id: String,
    pub artist_name: String,
    pub r#type: SongType,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub upc: Option<String>,
    pub cover: Option<String>,
    pub number_of_tracks: i32,
    pub is_featured: bool,
    pub plays: i32,
    pub duration: Option<i32>,
    pub status: SongStatus,
    pub created_by: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl IntoActiveModel<ActiveModel> for SongModel {
    fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            title: Set(self.title),
            user_id: Set(self.user_id),
            artist_id: Set(self.artist_id),
            artist_name: Set(self.artist_name),
            r#type: Set(self.r#type),
            genre: Set(self.genre),
            language: Set(self.language),
            upc: Set(self.upc),
            cover: Set(self.cover),
            number_of_tracks: Set(self.number_of_tracks),
            is_featured: Set(self.is_featured),
            plays: Set(self.plays),
            duration: Set(self.duration),
            status: Set(self.status),
            created_by: Set(self.created_by),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
            ..<ActiveModel as ActiveModelTrait>::default()
        }
    }
}
