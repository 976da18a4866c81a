use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One reported earning line, e.g. a track's streams for "2024-05".
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "royalties")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub period: String,
    pub period_type: String,
    pub upc: Option<String>,
    pub isrc: Option<String>,
    pub track_name: String,
    pub song_title: String,
    pub artist_name: String,
    pub record_label: Option<String>,
    pub gross_amount_usd: f64,
    pub deductions_percent: f64,
    pub deductions_usd: f64,
    pub net_amount_usd: f64,
    pub user_id: String,
    pub song_id: Option<String>,
    pub track_id: Option<String>,
    pub artist_id: Option<String>,
    pub match_status: String,
    pub payment_status: String,
    pub paid_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
