use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use entities::user_local_model::UserModel;

use crate::dxl::error::DxlError;
use crate::dxl::{DxlRequest, Handler, Reply};
use crate::AppState;

const REGISTERED_MESSAGE: &str = "Registration successful. You can now login.";

pub struct AuthHandler;

#[derive(Deserialize, Default)]
struct RegisterBody {
    email: Option<String>,
    password: Option<String>,
    firstname: Option<String>,
    lastname: Option<String>,
    username: Option<String>,
    gender: Option<String>,
    ref_code: Option<String>,
}

/// 3 to 20 of `[A-Za-z0-9_-]`.
pub fn valid_username(username: &str) -> bool {
    (3..=20).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn invalid_username() -> DxlError {
    DxlError::validation(
        "Username must be 3-20 characters and contain only letters, numbers, underscores, or hyphens",
        json!({ "field": "username" }),
    )
}

fn hash_password(password: &str) -> Result<String, DxlError> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|err| DxlError::Internal(err.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| DxlError::Internal(err.to_string()))
}

impl AuthHandler {
    async fn check_email(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let email = request.param("email").ok_or_else(|| {
            DxlError::bad_request_with("Email is required", json!({ "field": "email" }))
        })?;
        let available = queries::users::find_by_email(&state.connection, email)
            .await?
            .is_none();
        let message = if available {
            "Email is available"
        } else {
            "Email is already taken"
        };
        Ok(Reply::new(
            json!({ "email": email, "available": available, "message": message }),
            message,
        ))
    }

    async fn check_email_verified(
        &self,
        state: &AppState,
        request: &DxlRequest,
    ) -> Result<Reply, DxlError> {
        let email = request.param("email").ok_or_else(|| {
            DxlError::bad_request_with("Email is required", json!({ "field": "email" }))
        })?;
        let user = queries::users::find_by_email(&state.connection, email).await?;
        let exists = user.is_some();
        let verified = user.map_or(false, |user| user.email_verified);
        let message = match (exists, verified) {
            (false, _) => "Email does not exist",
            (true, true) => "Email is verified",
            (true, false) => "Email is not verified",
        };
        Ok(Reply::new(
            json!({ "email": email, "exists": exists, "verified": verified }),
            message,
        ))
    }

    async fn check_username(
        &self,
        state: &AppState,
        request: &DxlRequest,
    ) -> Result<Reply, DxlError> {
        let username = request.param("username").ok_or_else(|| {
            DxlError::bad_request_with("Username is required", json!({ "field": "username" }))
        })?;
        if !valid_username(username) {
            return Err(invalid_username());
        }
        let available = queries::users::find_by_username(&state.connection, username)
            .await?
            .is_none();
        let message = if available {
            "Username is available"
        } else {
            "Username is already taken"
        };
        Ok(Reply::new(
            json!({ "username": username, "available": available, "message": message }),
            message,
        ))
    }

    async fn register(&self, state: &AppState, request: &DxlRequest) -> Result<Reply, DxlError> {
        let body: RegisterBody = request.json()?;
        let filled = |value: Option<String>| value.filter(|text| !text.trim().is_empty());
        let (email, password, firstname, lastname) = match (
            filled(body.email),
            filled(body.password),
            filled(body.firstname),
            filled(body.lastname),
        ) {
            (Some(email), Some(password), Some(first), Some(last)) => {
                (email.trim().to_lowercase(), password, first, last)
            }
            _ => {
                return Err(DxlError::validation(
                    "Email, password, firstname, and lastname are required",
                    json!({ "required": ["email", "password", "firstname", "lastname"] }),
                ))
            }
        };
        let username = filled(body.username);

        if queries::users::find_by_email(&state.connection, &email)
            .await?
            .is_some()
        {
            return Err(DxlError::validation(
                "Email is already registered",
                json!({ "field": "email" }),
            ));
        }
        if let Some(username) = &username {
            if !valid_username(username) {
                return Err(invalid_username());
            }
            if queries::users::find_by_username(&state.connection, username)
                .await?
                .is_some()
            {
                return Err(DxlError::validation(
                    "Username is already taken",
                    json!({ "field": "username" }),
                ));
            }
        }

        let now = Utc::now();
        let user_id = Uuid::new_v4().to_string();
        let ref_code = filled(body.ref_code);
        let user = UserModel {
            id: user_id.to_owned(),
            email: email.to_owned(),
            username: username.to_owned(),
            name: Some(format!("{} {}", firstname, lastname)),
            first_name: Some(firstname.to_owned()),
            last_name: Some(lastname.to_owned()),
            password_hash: hash_password(&password)?,
            email_verified: state.config.email_verification.verified_on_signup(),
            role: "user".to_string(),
            tenant: state.config.tenant.to_owned(),
            ref_code: ref_code.to_owned(),
            created_at: now,
            updated_at: now,
        };
        queries::users::add_user(&state.connection, user).await?;
        info!("Registered user {}", user_id);

        Ok(Reply::new(
            json!({
                "user_id": user_id,
                "email": email,
                "firstname": firstname,
                "lastname": lastname,
                "username": username,
                "gender": body.gender,
                "ref_code": ref_code,
                "message": REGISTERED_MESSAGE,
            }),
            REGISTERED_MESSAGE,
        ))
    }
}

#[async_trait]
impl Handler for AuthHandler {
    fn module(&self) -> &'static str {
        "auth"
    }

    async fn process(
        &self,
        state: &AppState,
        request: &DxlRequest,
        operation: &str,
    ) -> Result<Reply, DxlError> {
        match operation {
            "check.email" => self.check_email(state, request).await,
            "check.email.verified" => self.check_email_verified(state, request).await,
            "check.username" => self.check_username(state, request).await,
            "register" => self.register(state, request).await,
            _ => Err(DxlError::invalid_operation()),
        }
    }
}
