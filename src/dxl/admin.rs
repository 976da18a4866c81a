use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::info;
use sea_orm::Set;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use entities::song::SongStatus;
use entities::{admin_alert, admin_task};
use queries::royalties::{InflowFilter, RoyaltyFilter};

use crate::dxl::context::Pagination;
use crate::dxl::error::DxlError;
use crate::dxl::songs::parse_status;
use crate::dxl::{DxlRequest, Handler, Reply};
use crate::AppState;

const ALERTS_LIMIT: u64 = 50;

pub struct AdminHandler;

#[derive(Deserialize, Default)]
struct ApproveBody {
    song_id: Option<String>,
    status: Option<String>,
    note: Option<String>,
}

#[derive(Deserialize, Default)]
struct FlagBody {
    song_id: Option<String>,
    flag_type: Option<String>,
    reason: Option<String>,
    details: Option<Value>,
}

#[derive(Deserialize, Default)]
struct TaskBody {
    title: Option<String>,
    description: Option<String>,
    priority: Option<String>,
    assigned_to: Option<String>,
    due_date: Option<String>,
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

/// RFC 3339, or a bare `YYYY-MM-DD` taken as midnight UTC.
fn parse_due_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(moment) = DateTime::parse_from_rfc3339(value) {
        return Some(moment.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
}

fn money(amount: f64) -> String {
    format!("{:.2}", amount)
}

impl AdminHandler {
    async fn approvals(&self, state: &AppState) -> Result<Reply, DxlError> {
        let pending =
            queries::songs::songs_with_status(&state.connection, SongStatus::Checking).await?;
        let items: Vec<Value> = pending
            .iter()
            .map(|song| {
                json!({
                    "id": song.id,
                    "title": song.title,
                    "artist_id": song.artist_id,
                    "artist_name": song.artist_name,
                    "status": song.status,
                    "submitted_at": song.created_at,
                })
            })
            .collect();
        Ok(Reply::new(
            json!({ "total": items.len(), "pending": items }),
            "Pending approvals retrieved",
        ))
    }

    async fn approve(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let body: ApproveBody = request.json()?;
        let (song_id, status) = match (filled(body.song_id), filled(body.status)) {
            (Some(song_id), Some(status)) => (song_id, parse_status(&status)?),
            _ => return Err(DxlError::missing_fields(&["song_id", "status"])),
        };
        let song = queries::songs::get_live_song(&state.connection, &song_id)
            .await?
            .ok_or_else(|| DxlError::not_found("Song not found"))?;

        let song = queries::songs::review_song(
            &state.connection,
            song,
            status,
            request.context.user_id.to_owned(),
        )
        .await?;
        match filled(body.note) {
            Some(note) => info!("Song {} set to {:?}: {}", song.id, song.status, note),
            None => info!("Song {} set to {:?}", song.id, song.status),
        }

        Ok(Reply::new(
            json!({
                "song_id": song.id,
                "status": song.status,
                "approved_at": song.approved_at,
            }),
            "Song approved successfully",
        ))
    }

    async fn flag(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let body: FlagBody = request.json()?;
        let (song_id, flag_type, reason) =
            match (filled(body.song_id), filled(body.flag_type), filled(body.reason)) {
                (Some(song_id), Some(flag_type), Some(reason)) => (song_id, flag_type, reason),
                _ => {
                    return Err(DxlError::missing_fields(&["song_id", "flag_type", "reason"]))
                }
            };
        let song = queries::songs::get_live_song(&state.connection, &song_id)
            .await?
            .ok_or_else(|| DxlError::not_found("Song not found"))?;

        let song = queries::songs::flag_song(
            &state.connection,
            song,
            flag_type,
            reason.to_owned(),
            request.context.user_id.to_owned(),
        )
        .await?;

        let now = Utc::now();
        let alert = admin_alert::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            r#type: Set("flag".to_string()),
            title: Set(format!("Song flagged: {}", song.title)),
            message: Set(reason),
            entity_type: Set(Some("song".to_string())),
            entity_id: Set(Some(song.id.to_owned())),
            status: Set("active".to_string()),
            severity: Set("warning".to_string()),
            resolved_by: Set(None),
            resolved_at: Set(None),
            metadata: Set(Some(body.details.unwrap_or_else(|| json!({})))),
            created_at: Set(now),
            updated_at: Set(now),
        };
        queries::admin::add_alert(&state.connection, alert).await?;
        info!("Song {} flagged", song.id);

        Ok(Reply::new(
            json!({
                "song_id": song.id,
                "status": song.status,
                "flag_type": song.flag_type,
                "flagged_at": song.flagged_at,
            }),
            "Song flagged successfully",
        ))
    }

    async fn dashboard_stats(&self, state: &AppState) -> Result<Reply, DxlError> {
        let conn = &state.connection;
        let songs = json!({
            "total": queries::songs::count_with_status(conn, None).await?,
            "pending": queries::songs::count_with_status(conn, Some(SongStatus::Checking)).await?,
            "approved": queries::songs::count_with_status(conn, Some(SongStatus::Approved)).await?,
            "flagged": queries::songs::count_with_status(conn, Some(SongStatus::Flagged)).await?,
        });
        let tasks = json!({
            "total": queries::admin::count_tasks(conn, None).await?,
            "pending": queries::admin::count_tasks(conn, Some("pending")).await?,
            "in_progress": queries::admin::count_tasks(conn, Some("in_progress")).await?,
            "completed": queries::admin::count_tasks(conn, Some("completed")).await?,
        });
        let alerts = json!({
            "total": queries::admin::count_alerts(conn, None, None).await?,
            "active": queries::admin::count_alerts(conn, Some("active"), None).await?,
            "critical": queries::admin::count_alerts(conn, Some("active"), Some("critical")).await?,
        });
        Ok(Reply::new(
            json!({
                "songs": songs,
                "tasks": tasks,
                "alerts": alerts,
                "timestamp": Utc::now(),
            }),
            "Dashboard stats retrieved",
        ))
    }

    async fn list_tasks(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let pagination = Pagination::from_query(&request.query);
        let items = queries::admin::list_tasks(&state.connection, pagination.window()).await?;
        let total = queries::admin::count_tasks(&state.connection, None).await?;
        Ok(Reply::new(
            json!({
                "total": total,
                "page": pagination.page,
                "limit": pagination.limit,
                "items": items,
            }),
            "Tasks retrieved successfully",
        ))
    }

    async fn create_task(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let user_id = request.user_id()?;
        let body: TaskBody = request.json()?;
        let title = filled(body.title).ok_or_else(|| {
            DxlError::validation("Task title is required", json!({ "field": "title" }))
        })?;
        let due_date = match filled(body.due_date) {
            Some(value) => Some(parse_due_date(&value).ok_or_else(|| {
                DxlError::validation("Invalid due date", json!({ "field": "due_date" }))
            })?),
            None => None,
        };

        let now = Utc::now();
        let task = admin_task::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            title: Set(title),
            description: Set(body.description),
            priority: Set(filled(body.priority).unwrap_or_else(|| "medium".to_string())),
            status: Set("pending".to_string()),
            assigned_to: Set(filled(body.assigned_to)),
            created_by: Set(user_id.to_owned()),
            due_date: Set(due_date),
            completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let task = queries::admin::add_task(&state.connection, task).await?;
        Ok(Reply::new(json!(task), "Task created successfully"))
    }

    async fn list_alerts(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let status = request.param("status").unwrap_or("active");
        let items = queries::admin::list_alerts(&state.connection, status, ALERTS_LIMIT).await?;
        Ok(Reply::new(
            json!({ "total": items.len(), "items": items }),
            "Alerts retrieved successfully",
        ))
    }

    async fn list_royalties(
        &self,
        state: &AppState,
        request: &DxlRequest,
    ) -> Result<Reply, DxlError> {
        let pagination = Pagination::from_query(&request.query);
        let filter = RoyaltyFilter {
            period: request.param("period").map(str::to_owned),
            payment_status: request.param("status").map(str::to_owned),
        };
        let items =
            queries::royalties::list_royalties(&state.connection, &filter, pagination.window())
                .await?;
        let total = queries::royalties::count_royalties(&state.connection, &filter).await?;
        Ok(Reply::new(
            json!({
                "total": total,
                "page": pagination.page,
                "limit": pagination.limit,
                "items": items,
            }),
            "Royalties retrieved successfully",
        ))
    }

    async fn royalty_inflow(
        &self,
        state: &AppState,
        request: &DxlRequest,
    ) -> Result<Reply, DxlError> {
        let filter = InflowFilter {
            user_id: request.param("user_id").map(str::to_owned),
            artist_id: request.param("artist_id").map(str::to_owned),
            song_id: request.param("song_id").map(str::to_owned),
        };
        if filter.is_empty() {
            return Err(DxlError::bad_request(
                "One of user_id, artist_id, or song_id is required",
            ));
        }
        let records = queries::royalties::royalties_for(&state.connection, &filter).await?;
        let gross: f64 = records.iter().map(|r| r.gross_amount_usd).sum();
        let net: f64 = records.iter().map(|r| r.net_amount_usd).sum();
        Ok(Reply::new(
            json!({
                "total_records": records.len(),
                "total_gross_usd": money(gross),
                "total_net_usd": money(net),
                "records": records,
            }),
            "User royalty inflow retrieved successfully",
        ))
    }
}

#[async_trait]
impl Handler for AdminHandler {
    fn module(&self) -> &'static str {
        "admin"
    }

    async fn process(
        &self,
        state: &AppState,
        request: &DxlRequest,
        operation: &str,
    ) -> Result<Reply, DxlError> {
        if !request.context.is_admin() {
            return Err(DxlError::Forbidden("Admin access required".to_string()));
        }
        match operation {
            "approvals" => self.approvals(state).await,
            "approve" => self.approve(state, request).await,
            "flag" => self.flag(state, request).await,
            "dashboard.stats" => self.dashboard_stats(state).await,
            "tasks.list" => self.list_tasks(state, request).await,
            "tasks.create" => self.create_task(state, request).await,
            "alerts.list" => self.list_alerts(state, request).await,
            "royalty.list" => self.list_royalties(state, request).await,
            "royalty.user_inflow" => self.royalty_inflow(state, request).await,
            _ => Err(DxlError::invalid_operation()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_dates_accept_rfc3339_and_plain_days() {
        let moment = parse_due_date("2024-07-01T12:30:00+02:00").unwrap();
        assert_eq!(moment.to_rfc3339(), "2024-07-01T10:30:00+00:00");
        let day = parse_due_date("2024-07-01").unwrap();
        assert_eq!(day.to_rfc3339(), "2024-07-01T00:00:00+00:00");
        assert!(parse_due_date("next friday").is_none());
    }

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(money(0.0), "0.00");
        assert_eq!(money(10.0 / 3.0), "3.33");
        assert_eq!(money(3.0), "3.00");
    }
}
