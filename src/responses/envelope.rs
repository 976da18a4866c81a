use std::time::Instant;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Datelike, SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::config::Vendor;
use crate::dxl::error::DxlError;

pub const MODULE_VERSION: &str = "3.0.0";
pub const API_VERSION_HEADER: &str = "x-api-version";

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Serialize, Clone, Debug)]
pub struct ResponseInfo {
    pub action_requested: String,
    pub response_module: String,
    pub module_version: String,
    pub timestamp: String,
    pub request_id: String,
    pub execution_time_ms: f64,
}

#[derive(Serialize, Clone, Debug)]
pub struct ErrorDetails {
    pub code: u16,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize, Clone, Debug)]
pub struct VendorInfo {
    pub name: String,
    pub url: String,
    pub copyright: String,
}

impl From<&Vendor> for VendorInfo {
    fn from(vendor: &Vendor) -> Self {
        VendorInfo {
            name: vendor.name.to_owned(),
            url: vendor.url.to_owned(),
            copyright: format!("Copyright © {} {}", Utc::now().year(), vendor.name),
        }
    }
}

/// The uniform body of every dispatch response.
#[derive(Serialize, Clone, Debug)]
pub struct DxlResponse {
    pub info: ResponseInfo,
    pub status: bool,
    pub data: Value,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<ErrorDetails>,
    pub vendor: VendorInfo,
}

impl DxlResponse {
    pub fn status_code(&self) -> StatusCode {
        if self.status {
            return StatusCode::OK;
        }
        self.error_details
            .as_ref()
            .and_then(|details| StatusCode::from_u16(details.code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for DxlResponse {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(self)).into_response();
        response.headers_mut().insert(
            HeaderName::from_static(API_VERSION_HEADER),
            HeaderValue::from_static(MODULE_VERSION),
        );
        response
    }
}

/// `req_<unix millis>_<9 base36 chars>`
pub fn request_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("req_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Starts the clock for one request and stamps every envelope built from it
/// with the same request id.
pub struct Envelope {
    started: Instant,
    request_id: String,
    vendor: VendorInfo,
}

impl Envelope {
    pub fn start(vendor: &Vendor) -> Self {
        Envelope {
            started: Instant::now(),
            request_id: request_id(),
            vendor: vendor.into(),
        }
    }

    fn info(&self, action: &str, module: &str) -> ResponseInfo {
        let elapsed = self.started.elapsed().as_secs_f64() * 1000.0;
        ResponseInfo {
            action_requested: action.to_owned(),
            response_module: module.to_owned(),
            module_version: MODULE_VERSION.to_owned(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            request_id: self.request_id.to_owned(),
            execution_time_ms: (elapsed * 100.0).round() / 100.0,
        }
    }

    pub fn success(self, action: &str, module: &str, data: Value, message: &str) -> DxlResponse {
        DxlResponse {
            info: self.info(action, module),
            status: true,
            data,
            message: message.to_owned(),
            error_details: None,
            vendor: self.vendor,
        }
    }

    pub fn failure(self, action: &str, module: &str, error: DxlError) -> DxlResponse {
        let message = error.to_string();
        let error_details = ErrorDetails {
            code: error.code(),
            r#type: error.kind().to_owned(),
            details: error.into_details(),
        };
        DxlResponse {
            info: self.info(action, module),
            status: false,
            data: Value::Null,
            message,
            error_details: Some(error_details),
            vendor: self.vendor,
        }
    }
}
