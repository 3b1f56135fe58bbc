use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for storing one linked-account credential.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetCredentialRequest {
    /// External account provider (e.g. "gdrive", "s3").
    #[schema(example = "gdrive")]
    pub provider: String,
    #[schema(example = "refresh_token")]
    pub name: String,
    /// Opaque credential material.
    pub value: String,
}

/// Query parameters for the credential listing.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct CredentialListQuery {
    #[param(example = "gdrive")]
    pub provider: String,
}

/// Credential names linked for a provider. Values are never returned.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct CredentialListResponse {
    pub names: Vec<String>,
}

pub fn validate_set_credential(req: &SetCredentialRequest) -> Result<(), AppError> {
    if req.provider.trim().is_empty() {
        return Err(AppError::Validation("provider is required".into()));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    if req.value.is_empty() {
        return Err(AppError::Validation("value cannot be empty".into()));
    }
    Ok(())
}
