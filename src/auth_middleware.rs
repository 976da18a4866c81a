use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::{error, warn};

use entities::user;

use crate::error::ApiError;
use crate::AppState;

pub const USER_HEADER: &str = "x-user-id";

/// The caller of an upload route, resolved from `x-user-id`.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub user::Model);

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = match request
        .headers()
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        Some(user_id) => user_id.to_owned(),
        None => return ApiError::Unauthorized.into_response(),
    };

    let user = match queries::users::find_user(&state.connection, &user_id).await {
        Ok(Some(user)) if user.deleted_at.is_none() => user,
        Ok(_) => {
            warn!("User doesn't exist: {}", user_id);
            return ApiError::Unauthorized.into_response();
        }
        Err(err) => {
            error!("Error resolving user {}", user_id);
            return ApiError::Database(err).into_response();
        }
    };

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}
