pub mod chat;
pub mod generation;
pub mod health;
pub mod workspace;

use crate::error::ApiError;

/// Rejects blank required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("'{field}' is required")));
    }
    Ok(())
}
