use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};

use entities::royalty;

use crate::Page;

#[derive(Clone, Debug, Default)]
pub struct RoyaltyFilter {
    pub period: Option<String>,
    pub payment_status: Option<String>,
}

/// Whose earnings an inflow report covers. Every given id must match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InflowFilter {
    pub user_id: Option<String>,
    pub artist_id: Option<String>,
    pub song_id: Option<String>,
}

impl InflowFilter {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.artist_id.is_none() && self.song_id.is_none()
    }
}

fn filtered(filter: &RoyaltyFilter) -> Select<royalty::Entity> {
    let mut query = royalty::Entity::find();
    if let Some(period) = &filter.period {
        query = query.filter(royalty::Column::Period.eq(period.as_str()));
    }
    if let Some(status) = &filter.payment_status {
        query = query.filter(royalty::Column::PaymentStatus.eq(status.as_str()));
    }
    query
}

pub async fn list_royalties<C>(
    conn: &C,
    filter: &RoyaltyFilter,
    page: Page,
) -> Result<Vec<royalty::Model>, DbErr>
where
    C: ConnectionTrait,
{
    filtered(filter)
        .order_by_desc(royalty::Column::CreatedAt)
        .limit(page.limit)
        .offset(page.offset)
        .all(conn)
        .await
}

pub async fn count_royalties<C>(conn: &C, filter: &RoyaltyFilter) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    filtered(filter).count(conn).await
}

pub async fn royalties_for<C>(conn: &C, filter: &InflowFilter) -> Result<Vec<royalty::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let mut query = royalty::Entity::find();
    if let Some(id) = &filter.user_id {
        query = query.filter(royalty::Column::UserId.eq(id.as_str()));
    }
    if let Some(id) = &filter.artist_id {
        query = query.filter(royalty::Column::ArtistId.eq(id.as_str()));
    }
    if let Some(id) = &filter.song_id {
        query = query.filter(royalty::Column::SongId.eq(id.as_str()));
    }
    query
        .order_by_desc(royalty::Column::Period)
        .all(conn)
        .await
}
