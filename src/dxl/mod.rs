//! Convention-based dispatch: one endpoint, `?@=module.operation`, routed to a
//! module handler that answers with the uniform envelope.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::dxl::admin::AdminHandler;
use crate::dxl::auth::AuthHandler;
use crate::dxl::context::DxlContext;
use crate::dxl::error::DxlError;
use crate::dxl::songs::SongsHandler;
use crate::dxl::uploads::UploadsHandler;
use crate::responses::envelope::{DxlResponse, Envelope};
use crate::AppState;

pub mod admin;
pub mod auth;
pub mod context;
pub mod error;
pub mod songs;
pub mod uploads;

const SYSTEM_MODULE: &str = "system";
pub const MODULES: [&str; 4] = ["songs", "uploads", "admin", "auth"];

/// Everything a handler may look at, read once by [`dispatch`].
pub struct DxlRequest {
    pub method: Method,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub context: DxlContext,
}

impl DxlRequest {
    /// A non-empty query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DxlError> {
        serde_json::from_slice(&self.body).map_err(|err| {
            DxlError::bad_request_with("Invalid JSON body", json!({ "reason": err.to_string() }))
        })
    }

    pub fn user_id(&self) -> Result<&str, DxlError> {
        self.context.user_id.as_deref().ok_or(DxlError::Unauthorized)
    }
}

/// What a successful operation hands back to the envelope.
pub struct Reply {
    pub data: Value,
    pub message: String,
}

impl Reply {
    pub fn new(data: Value, message: impl Into<String>) -> Self {
        Reply {
            data,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait Handler: Send + Sync {
    fn module(&self) -> &'static str;

    async fn process(
        &self,
        state: &AppState,
        request: &DxlRequest,
        operation: &str,
    ) -> Result<Reply, DxlError>;
}

static SONGS: SongsHandler = SongsHandler;
static UPLOADS: UploadsHandler = UploadsHandler;
static ADMIN: AdminHandler = AdminHandler;
static AUTH: AuthHandler = AuthHandler;

pub fn handler_for(module: &str) -> Option<&'static dyn Handler> {
    match module.to_lowercase().as_str() {
        "songs" => Some(&SONGS),
        "uploads" => Some(&UPLOADS),
        "admin" => Some(&ADMIN),
        "auth" => Some(&AUTH),
        _ => None,
    }
}

/// Splits on the first dot, so `admin.dashboard.stats` is module `admin`,
/// operation `dashboard.stats`.
pub fn parse_action(action: &str) -> Option<(&str, &str)> {
    match action.find('.') {
        Some(index) if index > 0 && index + 1 < action.len() => {
            Some((&action[..index], &action[index + 1..]))
        }
        _ => None,
    }
}

pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> DxlResponse {
    let envelope = Envelope::start(&state.config.vendor);

    let action = match query.get("@").filter(|action| !action.is_empty()) {
        Some(action) => action.to_owned(),
        None => {
            return envelope.failure(
                "unknown",
                SYSTEM_MODULE,
                DxlError::bad_request_with(
                    "Missing @= action parameter. Expected format: ?@=module.operation",
                    json!({
                        "example": "/api/dxl/v3?@=songs.list",
                        "format": "@=module.operation",
                    }),
                ),
            )
        }
    };

    let (module, operation) = match parse_action(&action) {
        Some(parts) => parts,
        None => {
            return envelope.failure(
                &action,
                SYSTEM_MODULE,
                DxlError::bad_request_with(
                    "Invalid action format. Expected format: module.operation",
                    json!({
                        "received": action,
                        "expected": "module.operation",
                        "examples": ["songs.list", "uploads.start", "admin.approvals"],
                    }),
                ),
            )
        }
    };

    let handler = match handler_for(module) {
        Some(handler) => handler,
        None => {
            return envelope.failure(
                &action,
                SYSTEM_MODULE,
                DxlError::not_found_with(
                    format!("Unknown module: {}", module),
                    json!({ "module": module, "available_modules": MODULES }),
                ),
            )
        }
    };

    let context = DxlContext::from_headers(&headers, &state.config.jwt_secret);
    let request = DxlRequest {
        method,
        query,
        headers,
        body,
        context,
    };

    let module = handler.module();
    let action = format!("{}.{}", module, operation);
    info!("{} {}", request.method, action);
    match handler.process(&state, &request, operation).await {
        Ok(reply) => envelope.success(&action, module, reply.data, &reply.message),
        Err(err) => {
            if err.code() >= 500 {
                warn!("{} failed: {}", action, err);
            }
            envelope.failure(&action, module, err)
        }
    }
}
