pub mod admin_alert;
pub mod admin_task;
pub mod royalty;
pub mod song;
pub mod song_local_model;
pub mod track;
pub mod track_local_model;
pub mod upload;
pub mod upload_job;
pub mod user;
pub mod user_local_model;
