use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{LoginRequest, LoginResponse},
    utils::{verify_password, Password, PasswordHashString, ValidatedJson},
    AppState,
};

/// Exchange admin credentials for a bearer token.
///
/// Unknown email and wrong password give the same 401.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid = || AppError::Unauthorized(anyhow::anyhow!("Invalid email or password"));

    let user = state
        .store
        .find_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(|| {
            tracing::info!("Login attempt for unknown email");
            invalid()
        })?;

    let matches = verify_password(
        &Password::new(payload.password),
        &PasswordHashString::new(user.password_hash.clone()),
    )
    .map_err(AppError::InternalError)?;

    if !matches {
        tracing::info!(user_id = user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    let token = state.jwt.generate_token(user.id, &user.email)?;
    tracing::info!(user_id = user.id, "Admin logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.expiry_seconds(),
    }))
}
