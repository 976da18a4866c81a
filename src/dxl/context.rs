use std::collections::HashMap;

use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_CLASS: i64 = 5;
pub const ADMIN_API_CLASS: i64 = 50;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

/// Claims of a dispatch bearer token. `user_id` wins over `sub`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_class: Option<i64>,
    pub exp: usize,
}

/// Who is calling and from where.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DxlContext {
    pub user_id: Option<String>,
    pub role: Option<String>,
    pub api_class: i64,
    pub tenant: Option<String>,
    pub platform: String,
    pub api_key: Option<String>,
}

impl Default for DxlContext {
    fn default() -> Self {
        DxlContext {
            user_id: None,
            role: None,
            api_class: DEFAULT_API_CLASS,
            tenant: None,
            platform: "web".to_string(),
            api_key: None,
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

impl DxlContext {
    /// A token that fails verification leaves the caller anonymous, as does
    /// any token when no secret is configured.
    pub fn from_headers(headers: &HeaderMap, jwt_secret: &str) -> Self {
        let mut context = DxlContext {
            tenant: header(headers, "x-tenant").map(str::to_owned),
            platform: header(headers, "x-platform").unwrap_or("web").to_owned(),
            api_key: header(headers, "x-api-key").map(str::to_owned),
            ..Default::default()
        };

        let token = match header(headers, "authorization").and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) => token.trim(),
            None => return context,
        };
        if jwt_secret.is_empty() {
            debug!("No JWT secret configured, ignoring bearer token");
            return context;
        }
        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        ) {
            Ok(data) => {
                let claims = data.claims;
                context.user_id = claims.user_id.or(claims.sub);
                context.role = claims.role;
                context.api_class = claims
                    .api_class
                    .filter(|class| *class != 0)
                    .unwrap_or(DEFAULT_API_CLASS);
            }
            Err(err) => debug!("Ignoring invalid bearer token: {}", err),
        }
        context
    }

    pub fn check_permission(&self, required_class: i64) -> bool {
        self.api_class >= required_class
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin") || self.api_class == ADMIN_API_CLASS
    }

    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_admin() || self.user_id.as_deref() == Some(owner_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let parse = |name: &str| query.get(name).and_then(|v| v.trim().parse::<u64>().ok());
        Pagination {
            page: parse("page").filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE),
            limit: parse("limit")
                .filter(|l| *l >= 1)
                .unwrap_or(DEFAULT_LIMIT)
                .min(MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }

    pub fn window(&self) -> queries::Page {
        queries::Page::new(self.page, self.limit)
    }
}
