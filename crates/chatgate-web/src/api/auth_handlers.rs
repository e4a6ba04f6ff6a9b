use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chatgate_core::{FailureOutcome, LoginCheck, LoginThrottle};

use crate::auth::users::{CreateUserError, NewUser};
use crate::dto::{AuthResponse, LoginRequest, SignupRequest};
use crate::error::AppError;
use crate::middleware::client_ip::ClientId;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(body) = body?;
    let key = LoginThrottle::key(&client, &body.email);
    let now = state.clock.now_ms();

    if let LoginCheck::Locked { retry_after_secs } = state.login_throttle.check(&key, now) {
        tracing::warn!("Rejected login while locked: {key} ({retry_after_secs}s left)");
        return Err(AppError::Locked {
            retry_after_secs: retry_after_secs.into(),
        });
    }

    let user = state.users.find_by_email(&body.email);

    let hash = user.as_ref().map(|user| user.password_hash.clone());
    let password = body.password;
    let valid = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => crate::auth::password::verify_password(&password, &hash),
        None => crate::auth::password::verify_unknown_account(&password),
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let Some(user) = user.filter(|_| valid) else {
        let outcome = state.login_throttle.record_failure(&key, now);
        tracing::warn!("Failed login attempt: {key} ({outcome:?})");
        return Err(match outcome {
            FailureOutcome::Locked { seconds } => AppError::Locked {
                retry_after_secs: seconds.into(),
            },
            FailureOutcome::Ignored { remaining_seconds } => AppError::Locked {
                retry_after_secs: remaining_seconds.into(),
            },
            FailureOutcome::Retry { attempts_left } => {
                AppError::InvalidCredentials { attempts_left }
            }
        });
    };

    state.login_throttle.record_success(&key);
    tracing::info!("Login succeeded for user: {}", user.email);
    Ok(Json(user.into()))
}

pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(body) = body?;
    let email = body.email.trim().to_string();
    let name = body.name.trim().to_string();

    if email.is_empty() || body.password.is_empty() || name.is_empty() {
        return Err(AppError::Validation(
            "Email, password and name are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    let password = body.password;
    let password_hash =
        tokio::task::spawn_blocking(move || crate::auth::password::hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

    let user = state
        .users
        .create(NewUser {
            email,
            name,
            password_hash,
        })
        .map_err(|e| match e {
            CreateUserError::EmailTaken => {
                AppError::Conflict("Email already registered".to_string())
            }
        })?;

    tracing::info!("Registered user: {}", user.email);
    Ok(Json(user.into()))
}
