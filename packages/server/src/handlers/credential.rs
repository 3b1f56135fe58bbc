use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthPrincipal;
use crate::extractors::json::AppJson;
use crate::models::credential::*;
use crate::state::AppState;

/// Store a linked-account credential.
#[utoipa::path(
    put,
    path = "/credentials",
    tag = "Credentials",
    operation_id = "setCredential",
    summary = "Store a linked-account credential",
    description = "Inserts or replaces one key-value credential for the calling principal's linked external account. Values are opaque to the server. Requires an admin principal.",
    request_body = SetCredentialRequest,
    responses(
        (status = 204, description = "Credential stored"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("bearer_token" = [])),
)]
#[instrument(skip(state, principal, payload))]
pub async fn set_credential(
    principal: AuthPrincipal,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SetCredentialRequest>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;
    validate_set_credential(&payload)?;

    state
        .credentials
        .set(
            &principal.id,
            payload.provider.trim(),
            payload.name.trim(),
            &payload.value,
        )
        .await?;

    info!(provider = %payload.provider.trim(), name = %payload.name.trim(), "Credential stored");
    Ok(StatusCode::NO_CONTENT)
}

/// List linked credential names for a provider.
#[utoipa::path(
    get,
    path = "/credentials",
    tag = "Credentials",
    operation_id = "listCredentials",
    summary = "List linked credential names",
    description = "Returns the credential names linked for the calling principal and the given provider. Values are never returned. Requires an admin principal.",
    params(CredentialListQuery),
    responses(
        (status = 200, description = "Linked credential names", body = CredentialListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("bearer_token" = [])),
)]
#[instrument(skip(state, principal, query))]
pub async fn list_credentials(
    principal: AuthPrincipal,
    State(state): State<AppState>,
    Query(query): Query<CredentialListQuery>,
) -> Result<Json<CredentialListResponse>, AppError> {
    principal.require_admin()?;

    let names = state
        .credentials
        .list_names(&principal.id, query.provider.trim())
        .await?;

    Ok(Json(CredentialListResponse { names }))
}
