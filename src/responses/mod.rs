pub mod envelope;
pub mod upload_response;
