use crate::track::ActiveModel;
use sea_orm::prelude::DateTimeUtc;
use sea_orm::{IntoActiveModel, Set};

/// Every column is set, `None` included, so tracks with different optional
/// fields can share one multi-row insert.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct TrackModel {
    pub id: String,
    pub song_id: String,
    pub track_number: i32,
    pub title: String,
    pub mp3: String,
    pub isrc: Option<String>,
    pub explicit: String,
    pub lyrics: Option<String>,
    pub lead_vocal: Option<String>,
    pub featured: Option<String>,
    pub producer: Option<String>,
    pub writer: Option<String>,
    pub duration: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl IntoActiveModel<ActiveModel> for TrackModel {
    fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            song_id: Set(self.song_id),
            track_number: Set(self.track_number),
            title: Set(self.title),
            mp3: Set(self.mp3),
            isrc: Set(self.isrc),
            explicit: Set(self.explicit),
            lyrics: Set(self.lyrics),
            lead_vocal: Set(self.lead_vocal),
            featured: Set(self.featured),
            producer: Set(self.producer),
            writer: Set(self.writer),
            duration: Set(self.duration),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
        }
    }
}
