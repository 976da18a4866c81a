//! Data access shared by the dispatch handlers and the upload endpoints.
//!
//! Every function is generic over [`sea_orm::ConnectionTrait`] so it runs the
//! same against a pool or inside a transaction.

pub mod admin;
pub mod jobs;
pub mod royalties;
pub mod songs;
pub mod uploads;
pub mod users;

/// Window of a paginated listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    pub fn new(page: u64, limit: u64) -> Self {
        Page {
            limit,
            offset: page.saturating_sub(1) * limit,
        }
    }
}
