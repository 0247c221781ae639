pub mod showcases;
pub mod storefront;
pub mod type_hints;

use serde::Serialize;

use crate::api::error::ApiError;

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Admin mutations are stamped with the acting user; a blank actor
/// would leave the audit columns useless
pub(crate) fn require_actor(actor: &str) -> Result<(), ApiError> {
    if actor.trim().is_empty() {
        return Err(ApiError::BadRequest("actor must not be empty".to_string()));
    }
    Ok(())
}
