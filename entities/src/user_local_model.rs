use crate::user::ActiveModel;
use sea_orm::prelude::DateTimeUtc;
use sea_orm::DeriveIntoActiveModel;

#[derive(DeriveIntoActiveModel, PartialEq, Eq, Clone, Debug)]
pub struct UserModel {
    pub id: String,
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: String,
    pub email_verified: bool,
    pub role: String,
    pub tenant: Option<String>,
    pub ref_code: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}
