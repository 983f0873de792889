use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::otp::{generate_code, otp_attempts_key, otp_key, MAX_OTP_ATTEMPTS};
use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::auth::token::{issue_token, revoked_key};
use crate::auth::uploads::{UploadRule, PICTURE_UPLOAD, RESUME_UPLOAD};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::mailer::Email;
use crate::models::user::{NewUser, Profile, Role, User, UserUpdate};
use crate::state::AppState;
use crate::storage::object_key;

const OTP_SENT_MESSAGE: &str = "If an account exists for this email, a verification code has been sent";
const INVALID_OTP_MESSAGE: &str = "Invalid or expired OTP";

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub profile: Option<Profile>,
}

#[derive(Deserialize)]
pub struct OtpRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn validate_email(email: &str) -> Result<String, AppError> {
    let email = normalize_email(&required("email", email)?);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::Validation(format!(
            "'{email}' is not a valid email address"
        ))),
    }
}

fn token_for(state: &AppState, user: &User) -> Result<String, AppError> {
    issue_token(
        user.id,
        user.role,
        &state.config.jwt_secret,
        chrono::Duration::days(state.config.jwt_ttl_days),
    )
    .map_err(|e| AppError::Internal(e.into()))
}

async fn current_user(state: &AppState, auth: &AuthUser) -> Result<User, AppError> {
    state
        .repo
        .find_user(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Whether `code` is the live OTP for `email`. Each miss counts against the
/// code; once `MAX_OTP_ATTEMPTS` is reached the code is discarded.
async fn otp_matches(state: &AppState, email: &str, code: &str) -> Result<bool, AppError> {
    let Some(stored) = state.cache.get(&otp_key(email)).await? else {
        return Ok(false);
    };
    if stored == code.trim() {
        return Ok(true);
    }

    let ttl = Duration::from_secs(state.config.otp_ttl_secs);
    let misses = state.cache.increment(&otp_attempts_key(email), ttl).await?;
    if misses >= MAX_OTP_ATTEMPTS {
        state.cache.remove(&otp_key(email)).await?;
        state.cache.remove(&otp_attempts_key(email)).await?;
        warn!(misses, "OTP discarded after repeated wrong guesses");
    }
    Ok(false)
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let name = required("name", &req.name)?;
    let email = validate_email(&req.email)?;
    let phone_number = required("phone_number", &req.phone_number)?;
    validate_password(&req.password)?;
    let role: Role = req.role.parse().map_err(AppError::Validation)?;

    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already in use".into()));
    }
    if state.repo.find_user_by_phone(&phone_number).await?.is_some() {
        return Err(AppError::Conflict("Phone number already in use".into()));
    }

    let user = state
        .repo
        .insert_user(NewUser {
            name,
            email,
            phone_number,
            password_hash: hash_password(&req.password)?,
            role,
        })
        .await?;
    let token = token_for(&state, &user)?;

    info!(user_id = %user.id, role = %user.role, "User registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password".into());

    let user = state
        .repo
        .find_user_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&req.password, &user.password_hash) {
        return Err(invalid());
    }

    let token = token_for(&state, &user)?;
    Ok(Json(AuthResponse { user, token }))
}

/// POST /api/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<StatusCode, AppError> {
    let ttl = auth.claims.remaining().max(Duration::from_secs(1));
    state
        .cache
        .put(&revoked_key(auth.claims.jti), "1", ttl)
        .await?;

    info!(user_id = %auth.id, "Token revoked");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<User>, AppError> {
    Ok(Json(current_user(&state, &auth).await?))
}

/// PUT /api/auth/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    let user = current_user(&state, &auth).await?;

    let name = req.name.map(|n| required("name", &n)).transpose()?;
    let phone_number = req
        .phone_number
        .map(|p| required("phone_number", &p))
        .transpose()?;
    // The resume is only ever set through the upload route.
    let profile = req.profile.map(|patch| {
        user.profile.0.clone().merge(Profile {
            resume: None,
            ..patch
        })
    });

    let updated = state
        .repo
        .update_user(
            user.id,
            UserUpdate {
                name,
                phone_number,
                profile,
                profile_picture: None,
            },
        )
        .await?;
    Ok(Json(updated))
}

async fn store_upload(
    state: &AppState,
    user_id: Uuid,
    rule: &UploadRule,
    multipart: Multipart,
) -> Result<String, AppError> {
    let upload = rule.read(multipart).await?;
    let key = object_key(rule.prefix, user_id, upload.extension);
    state
        .files
        .put(&key, upload.body, upload.content_type)
        .await?;
    Ok(key)
}

/// POST /api/auth/profile/resume
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<User>, AppError> {
    auth.require(Role::Applicant)?;
    let user = current_user(&state, &auth).await?;

    let key = store_upload(&state, user.id, &RESUME_UPLOAD, multipart).await?;
    let profile = Profile {
        resume: Some(key),
        ..user.profile.0.clone()
    };

    let updated = state
        .repo
        .update_user(
            user.id,
            UserUpdate {
                profile: Some(profile),
                ..UserUpdate::default()
            },
        )
        .await?;
    info!(user_id = %user.id, "Resume uploaded");
    Ok(Json(updated))
}

/// POST /api/auth/profile/picture
pub async fn handle_upload_picture(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<User>, AppError> {
    let key = store_upload(&state, auth.id, &PICTURE_UPLOAD, multipart).await?;

    let updated = state
        .repo
        .update_user(
            auth.id,
            UserUpdate {
                profile_picture: Some(key),
                ..UserUpdate::default()
            },
        )
        .await?;
    Ok(Json(updated))
}

/// POST /api/auth/request-otp
pub async fn handle_request_otp(
    State(state): State<AppState>,
    Json(req): Json<OtpRequest>,
) -> Result<Json<Value>, AppError> {
    let email = normalize_email(&req.email);

    if let Some(user) = state.repo.find_user_by_email(&email).await? {
        let code = generate_code();
        let ttl = Duration::from_secs(state.config.otp_ttl_secs);
        state.cache.put(&otp_key(&email), &code, ttl).await?;
        state.cache.remove(&otp_attempts_key(&email)).await?;

        state
            .mailer
            .send(Email {
                to: user.email.clone(),
                subject: "Your verification code".into(),
                body: format!(
                    "Hi {},\n\nYour verification code is {code}. It expires in {} minutes.\n\n\
                     If you did not request this code, you can ignore this email.",
                    user.name,
                    ttl.as_secs() / 60
                ),
            })
            .await?;
        info!(user_id = %user.id, "OTP issued");
    }

    Ok(Json(json!({ "message": OTP_SENT_MESSAGE })))
}

/// POST /api/auth/verify-otp
pub async fn handle_verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<Value>, AppError> {
    let email = normalize_email(&req.email);
    if !otp_matches(&state, &email, &req.otp).await? {
        return Err(AppError::Validation(INVALID_OTP_MESSAGE.into()));
    }
    Ok(Json(json!({ "verified": true })))
}

/// POST /api/auth/reset-password
pub async fn handle_reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let email = normalize_email(&req.email);
    validate_password(&req.new_password)?;

    if !otp_matches(&state, &email, &req.otp).await? {
        return Err(AppError::Validation(INVALID_OTP_MESSAGE.into()));
    }
    let user = state
        .repo
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Validation(INVALID_OTP_MESSAGE.into()))?;

    state
        .repo
        .set_password_hash(user.id, &hash_password(&req.new_password)?)
        .await?;
    state.cache.remove(&otp_key(&email)).await?;
    state.cache.remove(&otp_attempts_key(&email)).await?;

    info!(user_id = %user.id, "Password reset");
    Ok(Json(json!({ "message": "Password has been reset" })))
}
